use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::Mutex;

use huddle_core::{StoreError, StoreResult, new_id};
use huddle_domain::{
    MembershipKey, MembershipRecord, MembershipScope, MembershipUpdate, PostEditSettings, Role,
    RolePermissions, Scheme, SystemEntry, make_default_roles,
};

use crate::permission_ports::{
    ConfigRepository, MembershipRepository, RoleRepository, SchemeRepository, SystemRepository,
};

/// One fake standing in for every store port.
#[derive(Default)]
pub(crate) struct FakeStore {
    pub(crate) roles: Mutex<Vec<Role>>,
    pub(crate) schemes: Mutex<Vec<Scheme>>,
    pub(crate) ledger: Mutex<BTreeMap<String, String>>,
    pub(crate) members: Mutex<Vec<MembershipRecord>>,
    pub(crate) settings: Mutex<PostEditSettings>,
    pub(crate) higher_scoped: Mutex<HashMap<String, RolePermissions>>,
    pub(crate) higher_scoped_calls: Mutex<usize>,
    pub(crate) role_saves: Mutex<usize>,
    pub(crate) failing_role_names: Mutex<HashSet<String>>,
    pub(crate) fail_higher_scoped: Mutex<bool>,
    pub(crate) fail_scheme_writes: Mutex<bool>,
}

impl FakeStore {
    pub(crate) async fn seed_default_roles(&self) {
        let mut roles = self.roles.lock().await;
        for mut role in make_default_roles().into_values() {
            role.id = new_id();
            roles.push(role);
        }
    }

    pub(crate) async fn seed_role(&self, mut role: Role) -> Role {
        role.id = new_id();
        self.roles.lock().await.push(role.clone());
        role
    }

    pub(crate) async fn record(&self, key: &str) {
        self.ledger
            .lock()
            .await
            .insert(key.to_owned(), "true".to_owned());
    }

    pub(crate) async fn role_named(&self, name: &str) -> Option<Role> {
        self.roles
            .lock()
            .await
            .iter()
            .find(|role| role.name == name)
            .cloned()
    }

    pub(crate) async fn fail_saves_for(&self, name: &str) {
        self.failing_role_names.lock().await.insert(name.to_owned());
    }

    pub(crate) async fn clear_failures(&self) {
        self.failing_role_names.lock().await.clear();
    }
}

#[async_trait]
impl RoleRepository for FakeStore {
    async fn get(&self, role_id: &str) -> StoreResult<Role> {
        self.roles
            .lock()
            .await
            .iter()
            .find(|role| role.id == role_id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("Role", role_id))
    }

    async fn get_by_name(&self, name: &str) -> StoreResult<Role> {
        self.role_named(name)
            .await
            .ok_or_else(|| StoreError::not_found("Role", name))
    }

    async fn get_by_names(&self, names: &[String]) -> StoreResult<Vec<Role>> {
        Ok(self
            .roles
            .lock()
            .await
            .iter()
            .filter(|role| names.contains(&role.name))
            .cloned()
            .collect())
    }

    async fn get_all(&self) -> StoreResult<Vec<Role>> {
        Ok(self.roles.lock().await.clone())
    }

    async fn save(&self, mut role: Role) -> StoreResult<Role> {
        if self.failing_role_names.lock().await.contains(&role.name) {
            return Err(StoreError::Internal(format!("injected failure for {}", role.name)));
        }

        *self.role_saves.lock().await += 1;
        let mut roles = self.roles.lock().await;

        if role.id.is_empty() {
            if roles.iter().any(|stored| stored.name == role.name) {
                return Err(StoreError::conflict("Role", "role name already exists"));
            }
            role.id = new_id();
            roles.push(role.clone());
            return Ok(role);
        }

        let stored = roles
            .iter_mut()
            .find(|stored| stored.id == role.id)
            .ok_or_else(|| StoreError::not_found("Role", role.id.clone()))?;
        *stored = role.clone();
        Ok(role)
    }

    async fn channel_higher_scoped_permissions(
        &self,
        role_names: &[String],
    ) -> StoreResult<HashMap<String, RolePermissions>> {
        *self.higher_scoped_calls.lock().await += 1;
        if *self.fail_higher_scoped.lock().await {
            return Err(StoreError::Internal("higher scoped lookup failed".to_owned()));
        }

        Ok(self
            .higher_scoped
            .lock()
            .await
            .iter()
            .filter(|(name, _)| role_names.contains(name))
            .map(|(name, permissions)| (name.clone(), permissions.clone()))
            .collect())
    }
}

#[async_trait]
impl SchemeRepository for FakeStore {
    async fn get(&self, scheme_id: &str) -> StoreResult<Scheme> {
        self.schemes
            .lock()
            .await
            .iter()
            .find(|scheme| scheme.id == scheme_id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("Scheme", scheme_id))
    }

    async fn get_by_name(&self, name: &str) -> StoreResult<Scheme> {
        self.schemes
            .lock()
            .await
            .iter()
            .find(|scheme| scheme.name == name)
            .cloned()
            .ok_or_else(|| StoreError::not_found("Scheme", name))
    }

    async fn save_new(&self, mut scheme: Scheme, backing_roles: Vec<Role>) -> StoreResult<Scheme> {
        if *self.fail_scheme_writes.lock().await {
            return Err(StoreError::Internal("scheme write failed".to_owned()));
        }

        let mut roles = self.roles.lock().await;
        for mut role in backing_roles {
            role.id = new_id();
            roles.push(role);
        }

        scheme.id = new_id();
        scheme.create_at = 1;
        scheme.update_at = 1;
        self.schemes.lock().await.push(scheme.clone());
        Ok(scheme)
    }

    async fn save(&self, scheme: Scheme) -> StoreResult<Scheme> {
        if *self.fail_scheme_writes.lock().await {
            return Err(StoreError::Internal("scheme write failed".to_owned()));
        }

        let mut schemes = self.schemes.lock().await;
        let stored = schemes
            .iter_mut()
            .find(|stored| stored.id == scheme.id)
            .ok_or_else(|| StoreError::not_found("Scheme", scheme.id.clone()))?;
        *stored = scheme.clone();
        Ok(scheme)
    }

    async fn delete(&self, scheme_id: &str) -> StoreResult<Scheme> {
        let mut schemes = self.schemes.lock().await;
        let stored = schemes
            .iter_mut()
            .find(|stored| stored.id == scheme_id)
            .ok_or_else(|| StoreError::not_found("Scheme", scheme_id))?;
        stored.delete_at = 2;
        Ok(stored.clone())
    }
}

#[async_trait]
impl SystemRepository for FakeStore {
    async fn get_by_name(&self, name: &str) -> StoreResult<SystemEntry> {
        self.ledger
            .lock()
            .await
            .get(name)
            .map(|value| SystemEntry {
                name: name.to_owned(),
                value: value.clone(),
            })
            .ok_or_else(|| StoreError::not_found("System", name))
    }

    async fn save(&self, entry: SystemEntry) -> StoreResult<()> {
        self.ledger
            .lock()
            .await
            .entry(entry.name)
            .or_insert(entry.value);
        Ok(())
    }
}

#[async_trait]
impl MembershipRepository for FakeStore {
    async fn get_member(
        &self,
        scope: MembershipScope,
        key: &MembershipKey,
    ) -> StoreResult<MembershipRecord> {
        self.members
            .lock()
            .await
            .iter()
            .find(|record| record.scope == scope && record.key == *key)
            .cloned()
            .ok_or_else(|| StoreError::not_found("Member", key.principal_id.clone()))
    }

    async fn list_members_after(
        &self,
        scope: MembershipScope,
        after: Option<&MembershipKey>,
        limit: usize,
    ) -> StoreResult<Vec<MembershipRecord>> {
        let mut records: Vec<MembershipRecord> = self
            .members
            .lock()
            .await
            .iter()
            .filter(|record| record.scope == scope)
            .filter(|record| after.is_none_or(|after| record.key > *after))
            .cloned()
            .collect();
        records.sort_by(|left, right| left.key.cmp(&right.key));
        records.truncate(limit);
        Ok(records)
    }

    async fn update_member(&self, update: MembershipUpdate) -> StoreResult<()> {
        let mut members = self.members.lock().await;
        let record = members
            .iter_mut()
            .find(|record| record.scope == update.scope && record.key == update.key)
            .ok_or_else(|| StoreError::not_found("Member", update.key.principal_id.clone()))?;
        record.roles = update.explicit_roles;
        record.flags = update.flags;
        Ok(())
    }
}

#[async_trait]
impl ConfigRepository for FakeStore {
    async fn post_edit_settings(&self) -> StoreResult<PostEditSettings> {
        Ok(*self.settings.lock().await)
    }

    async fn save_post_edit_settings(&self, settings: PostEditSettings) -> StoreResult<()> {
        *self.settings.lock().await = settings;
        Ok(())
    }
}
