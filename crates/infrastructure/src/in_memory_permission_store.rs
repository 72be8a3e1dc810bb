use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;

use huddle_application::{
    ConfigRepository, MembershipRepository, RoleRepository, SchemeRepository, SystemRepository,
};
use huddle_core::{StoreError, StoreResult, new_id, now_millis};
use huddle_domain::{
    MembershipKey, MembershipRecord, MembershipScope, MembershipUpdate, PostEditSettings, Role,
    RolePermissions, Scheme, SchemeFlags, SystemEntry,
};

mod memberships;
mod roles;
mod schemes;

/// In-memory implementation of every permission store port.
///
/// All state sits behind one lock, so multi-row writes are atomic.
#[derive(Debug, Default)]
pub struct InMemoryPermissionStore {
    state: RwLock<StoreState>,
}

#[derive(Debug, Default)]
struct StoreState {
    roles: BTreeMap<String, Role>,
    schemes: BTreeMap<String, Scheme>,
    system: BTreeMap<String, String>,
    teams: BTreeMap<String, Option<String>>,
    channels: BTreeMap<String, ChannelRow>,
    team_members: BTreeMap<MembershipKey, MemberColumns>,
    channel_members: BTreeMap<MembershipKey, MemberColumns>,
    settings: PostEditSettings,
}

#[derive(Debug, Clone, Default)]
struct ChannelRow {
    team_id: Option<String>,
    scheme_id: Option<String>,
}

#[derive(Debug, Clone, Default)]
struct MemberColumns {
    roles: String,
    flags: SchemeFlags,
}

impl StoreState {
    fn members(&self, scope: MembershipScope) -> &BTreeMap<MembershipKey, MemberColumns> {
        match scope {
            MembershipScope::Team => &self.team_members,
            MembershipScope::Channel => &self.channel_members,
        }
    }

    fn members_mut(&mut self, scope: MembershipScope) -> &mut BTreeMap<MembershipKey, MemberColumns> {
        match scope {
            MembershipScope::Team => &mut self.team_members,
            MembershipScope::Channel => &mut self.channel_members,
        }
    }

    fn role_by_name(&self, name: &str) -> Option<&Role> {
        self.roles.values().find(|role| role.name == name)
    }

    fn live_scheme(&self, scheme_id: Option<&String>) -> Option<&Scheme> {
        scheme_id
            .and_then(|scheme_id| self.schemes.get(scheme_id))
            .filter(|scheme| !scheme.is_deleted())
    }
}

impl InMemoryPermissionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a team, optionally governed by a scheme.
    pub async fn add_team(&self, team_id: &str, scheme_id: Option<&str>) {
        self.state
            .write()
            .await
            .teams
            .insert(team_id.to_owned(), scheme_id.map(str::to_owned));
    }

    /// Registers a channel inside a team, optionally governed by its own scheme.
    pub async fn add_channel(&self, channel_id: &str, team_id: &str, scheme_id: Option<&str>) {
        self.state.write().await.channels.insert(
            channel_id.to_owned(),
            ChannelRow {
                team_id: Some(team_id.to_owned()),
                scheme_id: scheme_id.map(str::to_owned),
            },
        );
    }

    /// Adds or replaces a membership row as it would sit in storage.
    pub async fn add_member(
        &self,
        scope: MembershipScope,
        key: MembershipKey,
        roles: &str,
        flags: SchemeFlags,
    ) {
        self.state.write().await.members_mut(scope).insert(
            key,
            MemberColumns {
                roles: roles.to_owned(),
                flags,
            },
        );
    }

    /// Replaces the post editing settings.
    pub async fn set_post_edit_settings(&self, settings: PostEditSettings) {
        self.state.write().await.settings = settings;
    }
}

#[async_trait]
impl SystemRepository for InMemoryPermissionStore {
    async fn get_by_name(&self, name: &str) -> StoreResult<SystemEntry> {
        self.state
            .read()
            .await
            .system
            .get(name)
            .map(|value| SystemEntry {
                name: name.to_owned(),
                value: value.clone(),
            })
            .ok_or_else(|| StoreError::not_found("System", name))
    }

    async fn save(&self, entry: SystemEntry) -> StoreResult<()> {
        self.state
            .write()
            .await
            .system
            .entry(entry.name)
            .or_insert(entry.value);
        Ok(())
    }
}

#[async_trait]
impl ConfigRepository for InMemoryPermissionStore {
    async fn post_edit_settings(&self) -> StoreResult<PostEditSettings> {
        Ok(self.state.read().await.settings)
    }

    async fn save_post_edit_settings(&self, settings: PostEditSettings) -> StoreResult<()> {
        self.state.write().await.settings = settings;
        Ok(())
    }
}

#[cfg(test)]
mod tests;
