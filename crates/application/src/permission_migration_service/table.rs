use huddle_domain::permission_migrations as maps;
use huddle_domain::{GUEST_ROLE_NAMES, SYSTEM_CONSOLE_ROLE_NAMES, migration_keys as keys};

use super::{MigrationEntry, MigrationStep};

/// Builds the boot migration table in execution order.
///
/// The advanced permissions seed always runs first and the phase-2
/// membership migration, which unlocks scheme management, always runs last.
#[must_use]
pub fn default_migration_table() -> Vec<MigrationEntry> {
    use MigrationStep::{AdvancedPermissions, CreateMissingRoles, MembershipSchemeFlags, Permissions};

    vec![
        MigrationEntry::new(keys::ADVANCED_PERMISSIONS, AdvancedPermissions),
        MigrationEntry::new(keys::GUEST_ROLES_CREATION, CreateMissingRoles(&GUEST_ROLE_NAMES)),
        MigrationEntry::new(
            keys::SYSTEM_CONSOLE_ROLES_CREATION,
            CreateMissingRoles(&SYSTEM_CONSOLE_ROLE_NAMES),
        ),
        MigrationEntry::new(
            keys::EMOJI_PERMISSIONS_SPLIT,
            Permissions(maps::emoji_permissions_split),
        ),
        MigrationEntry::new(
            keys::WEBHOOK_PERMISSIONS_SPLIT,
            Permissions(maps::webhook_permissions_split),
        ),
        MigrationEntry::new(
            keys::LIST_JOIN_PUBLIC_PRIVATE_TEAMS,
            Permissions(maps::list_join_public_private_teams),
        ),
        MigrationEntry::new(
            keys::REMOVE_PERMANENT_DELETE_USER,
            Permissions(maps::remove_permanent_delete_user),
        ),
        MigrationEntry::new(keys::ADD_BOT_PERMISSIONS, Permissions(maps::add_bot_permissions)),
        MigrationEntry::new(
            keys::APPLY_CHANNEL_MANAGE_DELETE_TO_CHANNEL_USER,
            Permissions(maps::apply_channel_manage_delete_to_channel_user),
        ),
        MigrationEntry::new(
            keys::REMOVE_CHANNEL_MANAGE_DELETE_FROM_TEAM_USER,
            Permissions(maps::remove_channel_manage_delete_from_team_user),
        ),
        MigrationEntry::new(
            keys::VIEW_MEMBERS_NEW_PERMISSION,
            Permissions(maps::view_members_new_permission),
        ),
        MigrationEntry::new(
            keys::ADD_MANAGE_GUESTS_PERMISSIONS,
            Permissions(maps::add_manage_guests_permissions),
        ),
        MigrationEntry::new(
            keys::CHANNEL_MODERATIONS_PERMISSIONS,
            Permissions(maps::channel_moderations_permissions),
        ),
        MigrationEntry::new(
            keys::ADD_USE_GROUP_MENTIONS_PERMISSION,
            Permissions(maps::add_use_group_mentions_permission),
        ),
        MigrationEntry::new(
            keys::ADD_SYSTEM_CONSOLE_PERMISSIONS,
            Permissions(maps::add_system_console_permissions),
        ),
        MigrationEntry::new(
            keys::ADD_CONVERT_CHANNEL_PERMISSIONS,
            Permissions(maps::add_convert_channel_permissions),
        ),
        MigrationEntry::new(keys::ADVANCED_PERMISSIONS_PHASE_2, MembershipSchemeFlags),
    ]
}
