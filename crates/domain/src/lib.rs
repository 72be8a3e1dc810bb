//! Domain entities and invariants of the permission engine.

#![forbid(unsafe_code)]

mod default_roles;
mod ledger;
mod membership;
mod permission;
pub mod permission_migrations;
mod role;
mod scheme;
mod settings;
mod transformation;

pub use default_roles::{
    GUEST_ROLE_NAMES, SCHEME_DEFAULT_ROLE_NAMES, SYSTEM_CONSOLE_ROLE_NAMES, is_retired,
    make_default_roles, sysconsole_ancillary_permissions,
};
pub use ledger::{LEDGER_COMPLETED_VALUE, SystemEntry, migration_keys};
pub use membership::{
    Membership, MembershipKey, MembershipRecord, MembershipScope, MembershipUpdate,
    ResolutionContext, ResolvedRoles, SchemeDefaults, SchemeFlags, resolve_roles,
};
pub use permission::{
    ModeratedPermission, Permission, PermissionScope, filter_moderated,
    is_channel_scoped_permission, is_moderated_permission,
};
pub use role::{
    CHANNEL_ADMIN_ROLE, CHANNEL_GUEST_ROLE, CHANNEL_USER_ROLE, ROLE_DESCRIPTION_MAX_LENGTH,
    ROLE_DISPLAY_NAME_MAX_LENGTH, ROLE_NAME_MAX_LENGTH, Role, RolePermissions,
    SYSTEM_ADMIN_ROLE, SYSTEM_GUEST_ROLE, SYSTEM_MANAGER_ROLE, SYSTEM_POST_ALL_PUBLIC_ROLE,
    SYSTEM_POST_ALL_ROLE, SYSTEM_READ_ONLY_ADMIN_ROLE, SYSTEM_USER_ACCESS_TOKEN_ROLE,
    SYSTEM_USER_MANAGER_ROLE, SYSTEM_USER_ROLE, SchemeRoleSlot, TEAM_ADMIN_ROLE, TEAM_GUEST_ROLE,
    TEAM_POST_ALL_PUBLIC_ROLE, TEAM_POST_ALL_ROLE, TEAM_USER_ROLE, clean_role_names,
    is_valid_role_name, split_role_string,
};
pub use scheme::{
    SCHEME_DESCRIPTION_MAX_LENGTH, SCHEME_DISPLAY_NAME_MAX_LENGTH, SCHEME_NAME_MAX_LENGTH, Scheme,
    SchemePatch, SchemeScope, is_valid_scheme_name,
};
pub use settings::{AllowEditPost, PostEditSettings, UNLIMITED_POST_EDIT_TIME};
pub use transformation::{
    PermissionTransformation, PermissionsMap, RoleCondition, RolePermissionMap,
    apply_permissions_map,
};
