use serde::{Deserialize, Serialize};

/// Keys recorded in the system ledger once a boot migration has finished.
pub mod migration_keys {
    /// Seeds the default roles and retires `AllowEditPost`.
    pub const ADVANCED_PERMISSIONS: &str = "AdvancedPermissionsMigrationComplete";
    /// Creates the built-in guest roles.
    pub const GUEST_ROLES_CREATION: &str = "GuestRolesCreationMigrationComplete";
    /// Creates the delegated system console roles.
    pub const SYSTEM_CONSOLE_ROLES_CREATION: &str = "SystemConsoleRolesCreationMigrationComplete";
    /// Moves legacy membership role tokens into scheme flags. Gates scheme management.
    pub const ADVANCED_PERMISSIONS_PHASE_2: &str = "migration_advanced_permissions_phase_2";

    /// Splits `manage_emojis` into create and delete permissions.
    pub const EMOJI_PERMISSIONS_SPLIT: &str = "emoji_permissions_split";
    /// Splits `manage_webhooks` into incoming and outgoing permissions.
    pub const WEBHOOK_PERMISSIONS_SPLIT: &str = "webhook_permissions_split";
    /// Adds list and join permissions for public and private teams.
    pub const LIST_JOIN_PUBLIC_PRIVATE_TEAMS: &str = "list_join_public_private_teams";
    /// Removes `permanent_delete_user` from every role.
    pub const REMOVE_PERMANENT_DELETE_USER: &str = "remove_permanent_delete_user";
    /// Grants bot management to system admins.
    pub const ADD_BOT_PERMISSIONS: &str = "add_bot_permissions";
    /// Copies channel property management from team users to channel users.
    pub const APPLY_CHANNEL_MANAGE_DELETE_TO_CHANNEL_USER: &str =
        "apply_channel_manage_delete_to_channel_user";
    /// Removes channel property management from team users.
    pub const REMOVE_CHANNEL_MANAGE_DELETE_FROM_TEAM_USER: &str =
        "remove_channel_manage_delete_from_team_user";
    /// Grants `view_members`.
    pub const VIEW_MEMBERS_NEW_PERMISSION: &str = "view_members_new_permission";
    /// Grants guest management to system admins.
    pub const ADD_MANAGE_GUESTS_PERMISSIONS: &str = "add_manage_guests_permissions";
    /// Aligns roles with the channel moderation groups.
    pub const CHANNEL_MODERATIONS_PERMISSIONS: &str = "channel_moderations_permissions";
    /// Grants `use_group_mentions` to posting roles.
    pub const ADD_USE_GROUP_MENTIONS_PERMISSION: &str = "add_use_group_mentions_permission";
    /// Grants the system console permissions to system managers.
    pub const ADD_SYSTEM_CONSOLE_PERMISSIONS: &str = "add_system_console_permissions";
    /// Grants channel conversion to team managers.
    pub const ADD_CONVERT_CHANNEL_PERMISSIONS: &str = "add_convert_channel_permissions";
}

/// Value written for a completed migration.
pub const LEDGER_COMPLETED_VALUE: &str = "true";

/// Row of the flat system name/value table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemEntry {
    /// Unique key.
    pub name: String,
    /// Stored value.
    pub value: String,
}

impl SystemEntry {
    /// Creates the completion sentinel for a migration key.
    pub fn completed(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: LEDGER_COMPLETED_VALUE.to_owned(),
        }
    }
}
