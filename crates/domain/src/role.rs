use std::collections::BTreeSet;

use huddle_core::{AppError, AppResult, is_valid_id};
use serde::{Deserialize, Serialize};

use crate::permission::{Permission, PermissionScope};

/// Built-in system guest role.
pub const SYSTEM_GUEST_ROLE: &str = "system_guest";
/// Built-in system user role.
pub const SYSTEM_USER_ROLE: &str = "system_user";
/// Built-in system admin role.
pub const SYSTEM_ADMIN_ROLE: &str = "system_admin";
/// Built-in role allowing posts in every channel.
pub const SYSTEM_POST_ALL_ROLE: &str = "system_post_all";
/// Built-in role allowing posts in every public channel.
pub const SYSTEM_POST_ALL_PUBLIC_ROLE: &str = "system_post_all_public";
/// Built-in role allowing personal access tokens.
pub const SYSTEM_USER_ACCESS_TOKEN_ROLE: &str = "system_user_access_token";
/// Built-in delegated user manager role.
pub const SYSTEM_USER_MANAGER_ROLE: &str = "system_user_manager";
/// Built-in read-only admin role.
pub const SYSTEM_READ_ONLY_ADMIN_ROLE: &str = "system_read_only_admin";
/// Built-in delegated system manager role.
pub const SYSTEM_MANAGER_ROLE: &str = "system_manager";

/// Built-in team guest role.
pub const TEAM_GUEST_ROLE: &str = "team_guest";
/// Built-in team user role.
pub const TEAM_USER_ROLE: &str = "team_user";
/// Built-in team admin role.
pub const TEAM_ADMIN_ROLE: &str = "team_admin";
/// Built-in role allowing posts in every channel of a team.
pub const TEAM_POST_ALL_ROLE: &str = "team_post_all";
/// Built-in role allowing posts in every public channel of a team.
pub const TEAM_POST_ALL_PUBLIC_ROLE: &str = "team_post_all_public";

/// Built-in channel guest role.
pub const CHANNEL_GUEST_ROLE: &str = "channel_guest";
/// Built-in channel user role.
pub const CHANNEL_USER_ROLE: &str = "channel_user";
/// Built-in channel admin role.
pub const CHANNEL_ADMIN_ROLE: &str = "channel_admin";

/// Maximum role name length.
pub const ROLE_NAME_MAX_LENGTH: usize = 64;
/// Maximum role display name length.
pub const ROLE_DISPLAY_NAME_MAX_LENGTH: usize = 128;
/// Maximum role description length.
pub const ROLE_DESCRIPTION_MAX_LENGTH: usize = 1024;

/// Named bundle of permissions referenced from memberships and schemes by name.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Role {
    /// Store identifier, empty until first saved.
    pub id: String,
    /// Unique stable reference key.
    pub name: String,
    /// Human-friendly label.
    pub display_name: String,
    /// Free-form description.
    pub description: String,
    /// Creation time in epoch milliseconds.
    pub create_at: i64,
    /// Last update time in epoch milliseconds.
    pub update_at: i64,
    /// Soft-delete time in epoch milliseconds, zero while live.
    pub delete_at: i64,
    /// Granted permission ids.
    pub permissions: BTreeSet<String>,
    /// Whether the role backs a scheme slot.
    pub scheme_managed: bool,
    /// Whether the role ships with the server.
    pub built_in: bool,
}

impl Role {
    /// Creates an unsaved role with the given permissions.
    pub fn new<I, P>(name: impl Into<String>, display_name: impl Into<String>, permissions: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        Self {
            name: name.into(),
            display_name: display_name.into(),
            permissions: permissions.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Returns whether the role grants `permission`.
    #[must_use]
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }

    /// Returns whether the persisted shape differs from `other`, ignoring ids and timestamps.
    #[must_use]
    pub fn differs_from(&self, other: &Role) -> bool {
        self.permissions != other.permissions
            || self.display_name != other.display_name
            || self.description != other.description
            || self.scheme_managed != other.scheme_managed
    }

    /// Validates a role about to be inserted.
    pub fn validate_without_id(&self) -> AppResult<()> {
        if !is_valid_role_name(&self.name) {
            return Err(invalid_role("name", &self.name));
        }

        let display_length = self.display_name.chars().count();
        if display_length == 0 || display_length > ROLE_DISPLAY_NAME_MAX_LENGTH {
            return Err(invalid_role("display_name", &self.display_name));
        }

        if self.description.chars().count() > ROLE_DESCRIPTION_MAX_LENGTH {
            return Err(invalid_role("description", &self.description));
        }

        if let Some(unknown) = self
            .permissions
            .iter()
            .find(|permission| Permission::from_id(permission).is_none())
        {
            return Err(invalid_role("permissions", unknown));
        }

        Ok(())
    }

    /// Validates a role that already has a store id.
    pub fn validate(&self) -> AppResult<()> {
        if !is_valid_id(&self.id) {
            return Err(invalid_role("id", &self.id));
        }

        self.validate_without_id()
    }

    /// Recomputes the channel permission surface of a scheme-managed channel
    /// role from the permissions of the same slot one scope higher.
    ///
    /// Admin slots take the higher scope verbatim. For other slots, moderated
    /// permissions survive only when both the role and the higher scope grant
    /// them, and unmoderated permissions follow the higher scope. Permissions
    /// outside the channel scope are left as they are.
    pub fn merge_channel_higher_scoped_permissions(&mut self, higher: &RolePermissions) {
        let mut merged: BTreeSet<String> = self
            .permissions
            .iter()
            .filter(|permission| {
                Permission::from_id(permission)
                    .is_none_or(|known| known.scope() != PermissionScope::Channel)
            })
            .cloned()
            .collect();

        for permission in Permission::in_scope(PermissionScope::Channel) {
            let id = permission.as_str();
            let on_higher = higher.permissions.contains(id);

            let keep = if higher.slot == SchemeRoleSlot::Admin {
                on_higher
            } else if permission.is_moderated() {
                on_higher && self.permissions.contains(id)
            } else {
                on_higher
            };

            if keep {
                merged.insert(id.to_owned());
            }
        }

        self.permissions = merged;
    }
}

fn invalid_role(field: &str, value: &str) -> AppError {
    AppError::invalid_input(
        "Role.IsValid",
        "model.role.is_valid.app_error",
        format!("field '{field}' has invalid value '{value}'"),
    )
}

/// Default-role slot of a scheme at one level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemeRoleSlot {
    /// Guest members.
    Guest,
    /// Regular members.
    User,
    /// Administrators.
    Admin,
}

impl SchemeRoleSlot {
    /// Returns a stable storage value for this slot.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Guest => "guest",
            Self::User => "user",
            Self::Admin => "admin",
        }
    }

    /// Returns every slot in flag order.
    #[must_use]
    pub fn all() -> [Self; 3] {
        [Self::Guest, Self::User, Self::Admin]
    }
}

/// Permissions granted one scope above a channel-scheme role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolePermissions {
    /// Slot the channel-scheme role fills.
    pub slot: SchemeRoleSlot,
    /// Permissions granted by the same slot at the higher scope.
    pub permissions: BTreeSet<String>,
}

/// Returns whether `name` is a syntactically valid role name.
#[must_use]
pub fn is_valid_role_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= ROLE_NAME_MAX_LENGTH
        && name
            .chars()
            .all(|character| character.is_ascii_lowercase() || character.is_ascii_digit() || character == '_')
}

/// Trims role tokens, drops blank ones and rejects malformed names.
pub fn clean_role_names<S: AsRef<str>>(names: &[S]) -> AppResult<Vec<String>> {
    let mut cleaned = Vec::with_capacity(names.len());
    for name in names {
        let name = name.as_ref().trim();
        if name.is_empty() {
            continue;
        }

        if !is_valid_role_name(name) {
            return Err(AppError::invalid_input(
                "CleanRoleNames",
                "model.role.clean_role_names.app_error",
                format!("invalid role name '{name}'"),
            ));
        }

        cleaned.push(name.to_owned());
    }

    Ok(cleaned)
}

/// Splits a space-separated role string into tokens.
pub fn split_role_string(roles: &str) -> Vec<&str> {
    roles.split_whitespace().collect()
}
