use std::collections::BTreeMap;

use crate::permission::Permission;
use crate::permission::Permission as P;
use crate::role::{
    CHANNEL_ADMIN_ROLE, CHANNEL_GUEST_ROLE, CHANNEL_USER_ROLE, Role, SYSTEM_ADMIN_ROLE,
    SYSTEM_GUEST_ROLE, SYSTEM_MANAGER_ROLE, SYSTEM_POST_ALL_PUBLIC_ROLE, SYSTEM_POST_ALL_ROLE,
    SYSTEM_READ_ONLY_ADMIN_ROLE, SYSTEM_USER_ACCESS_TOKEN_ROLE, SYSTEM_USER_MANAGER_ROLE,
    SYSTEM_USER_ROLE, TEAM_ADMIN_ROLE, TEAM_GUEST_ROLE, TEAM_POST_ALL_PUBLIC_ROLE,
    TEAM_POST_ALL_ROLE, TEAM_USER_ROLE,
};

/// Guest roles created by the guest roles migration.
pub const GUEST_ROLE_NAMES: [&str; 3] = [CHANNEL_GUEST_ROLE, TEAM_GUEST_ROLE, SYSTEM_GUEST_ROLE];

/// Delegated admin roles created by the system console roles migration.
pub const SYSTEM_CONSOLE_ROLE_NAMES: [&str; 3] = [
    SYSTEM_USER_MANAGER_ROLE,
    SYSTEM_READ_ONLY_ADMIN_ROLE,
    SYSTEM_MANAGER_ROLE,
];

/// System defaults cloned into every new team scheme, in slot order.
pub const SCHEME_DEFAULT_ROLE_NAMES: [&str; 6] = [
    TEAM_ADMIN_ROLE,
    TEAM_USER_ROLE,
    TEAM_GUEST_ROLE,
    CHANNEL_ADMIN_ROLE,
    CHANNEL_USER_ROLE,
    CHANNEL_GUEST_ROLE,
];

const CHANNEL_GUEST_PERMISSIONS: &[Permission] = &[
    P::ReadChannel,
    P::AddReaction,
    P::RemoveReaction,
    P::UploadFile,
    P::EditPost,
    P::CreatePost,
    P::UseChannelMentions,
    P::UseSlashCommands,
];

const CHANNEL_USER_PERMISSIONS: &[Permission] = &[
    P::ReadChannel,
    P::AddReaction,
    P::RemoveReaction,
    P::ManagePublicChannelMembers,
    P::UploadFile,
    P::GetPublicLink,
    P::CreatePost,
    P::UseChannelMentions,
    P::UseSlashCommands,
    P::ManagePublicChannelProperties,
    P::DeletePublicChannel,
    P::ManagePrivateChannelProperties,
    P::DeletePrivateChannel,
    P::ManagePrivateChannelMembers,
    P::DeletePost,
    P::EditPost,
];

const CHANNEL_ADMIN_PERMISSIONS: &[Permission] = &[P::ManageChannelRoles, P::UseGroupMentions];

const TEAM_GUEST_PERMISSIONS: &[Permission] = &[P::ViewTeam];

const TEAM_USER_PERMISSIONS: &[Permission] = &[
    P::ListTeamChannels,
    P::JoinPublicChannels,
    P::ReadPublicChannel,
    P::ViewTeam,
    P::CreatePublicChannel,
    P::CreatePrivateChannel,
    P::InviteUser,
    P::AddUserToTeam,
];

const TEAM_POST_ALL_PERMISSIONS: &[Permission] = &[P::CreatePost, P::UseChannelMentions];

const TEAM_POST_ALL_PUBLIC_PERMISSIONS: &[Permission] =
    &[P::CreatePostPublic, P::UseChannelMentions];

const TEAM_ADMIN_PERMISSIONS: &[Permission] = &[
    P::RemoveUserFromTeam,
    P::ManageTeam,
    P::ImportTeam,
    P::ManageTeamRoles,
    P::ManageChannelRoles,
    P::ManageOthersIncomingWebhooks,
    P::ManageOthersOutgoingWebhooks,
    P::ManageSlashCommands,
    P::ManageOthersSlashCommands,
    P::ManageIncomingWebhooks,
    P::ManageOutgoingWebhooks,
    P::ConvertPublicChannelToPrivate,
    P::ConvertPrivateChannelToPublic,
    P::DeletePost,
    P::DeleteOthersPosts,
];

const SYSTEM_GUEST_PERMISSIONS: &[Permission] = &[P::CreateDirectChannel, P::CreateGroupChannel];

const SYSTEM_USER_PERMISSIONS: &[Permission] = &[
    P::ListPublicTeams,
    P::JoinPublicTeams,
    P::CreateDirectChannel,
    P::CreateGroupChannel,
    P::ViewMembers,
    P::CreateTeam,
    P::CreateEmojis,
    P::DeleteEmojis,
];

const SYSTEM_POST_ALL_PERMISSIONS: &[Permission] = &[P::CreatePost, P::UseChannelMentions];

const SYSTEM_POST_ALL_PUBLIC_PERMISSIONS: &[Permission] =
    &[P::CreatePostPublic, P::UseChannelMentions];

const SYSTEM_USER_ACCESS_TOKEN_PERMISSIONS: &[Permission] = &[
    P::CreateUserAccessToken,
    P::ReadUserAccessToken,
    P::RevokeUserAccessToken,
];

const SYSTEM_USER_MANAGER_PERMISSIONS: &[Permission] = &[
    P::SysconsoleReadUserManagementGroups,
    P::SysconsoleReadUserManagementTeams,
    P::SysconsoleReadUserManagementChannels,
    P::SysconsoleReadUserManagementPermissions,
    P::SysconsoleWriteUserManagementGroups,
    P::SysconsoleWriteUserManagementTeams,
    P::SysconsoleWriteUserManagementChannels,
    P::SysconsoleReadAuthentication,
];

const SYSTEM_MANAGER_PERMISSIONS: &[Permission] = &[
    P::SysconsoleReadAbout,
    P::SysconsoleReadReporting,
    P::SysconsoleReadUserManagementGroups,
    P::SysconsoleReadUserManagementTeams,
    P::SysconsoleReadUserManagementChannels,
    P::SysconsoleReadUserManagementPermissions,
    P::SysconsoleWriteUserManagementGroups,
    P::SysconsoleWriteUserManagementTeams,
    P::SysconsoleWriteUserManagementChannels,
    P::SysconsoleWriteUserManagementPermissions,
    P::SysconsoleReadEnvironment,
    P::SysconsoleWriteEnvironment,
    P::SysconsoleReadSite,
    P::SysconsoleWriteSite,
    P::SysconsoleReadAuthentication,
    P::SysconsoleReadPlugins,
    P::SysconsoleReadIntegrations,
    P::SysconsoleWriteIntegrations,
];

/// Returns the permissions a system console permission implicitly needs.
#[must_use]
pub fn sysconsole_ancillary_permissions(permission: Permission) -> &'static [Permission] {
    match permission {
        P::SysconsoleReadUserManagementChannels => &[P::ReadPublicChannel, P::ReadChannel],
        P::SysconsoleReadUserManagementTeams => &[P::ViewTeam, P::ListPublicTeams, P::ListPrivateTeams],
        P::SysconsoleReadUserManagementUsers => &[P::ListUsersWithoutTeam, P::ViewMembers],
        P::SysconsoleWriteUserManagementChannels => &[
            P::ManagePublicChannelMembers,
            P::ManagePrivateChannelMembers,
            P::ManageChannelRoles,
        ],
        P::SysconsoleWriteUserManagementTeams => &[
            P::ManageTeam,
            P::ManageTeamRoles,
            P::RemoveUserFromTeam,
            P::AddUserToTeam,
        ],
        _ => &[],
    }
}

fn built_in(
    name: &str,
    display_name: &str,
    description: &str,
    permissions: impl IntoIterator<Item = Permission>,
    scheme_managed: bool,
) -> Role {
    let mut role = Role::new(
        name,
        display_name,
        permissions.into_iter().map(|permission| permission.as_str()),
    );
    role.description = description.to_owned();
    role.scheme_managed = scheme_managed;
    role.built_in = true;
    role
}

fn with_ancillary(permissions: &[Permission]) -> Vec<Permission> {
    let mut expanded = permissions.to_vec();
    for permission in permissions {
        expanded.extend_from_slice(sysconsole_ancillary_permissions(*permission));
    }
    expanded
}

fn system_read_only_admin_permissions() -> Vec<Permission> {
    let reads: Vec<Permission> = Permission::all()
        .iter()
        .copied()
        .filter(|permission| permission.as_str().starts_with("sysconsole_read_"))
        .collect();

    with_ancillary(&reads)
}

/// Builds the built-in roles keyed by name.
#[must_use]
pub fn make_default_roles() -> BTreeMap<String, Role> {
    let roles = [
        built_in(
            CHANNEL_GUEST_ROLE,
            "authentication.roles.channel_guest.name",
            "authentication.roles.channel_guest.description",
            CHANNEL_GUEST_PERMISSIONS.iter().copied(),
            true,
        ),
        built_in(
            CHANNEL_USER_ROLE,
            "authentication.roles.channel_user.name",
            "authentication.roles.channel_user.description",
            CHANNEL_USER_PERMISSIONS.iter().copied(),
            true,
        ),
        built_in(
            CHANNEL_ADMIN_ROLE,
            "authentication.roles.channel_admin.name",
            "authentication.roles.channel_admin.description",
            CHANNEL_ADMIN_PERMISSIONS.iter().copied(),
            true,
        ),
        built_in(
            TEAM_GUEST_ROLE,
            "authentication.roles.team_guest.name",
            "authentication.roles.team_guest.description",
            TEAM_GUEST_PERMISSIONS.iter().copied(),
            true,
        ),
        built_in(
            TEAM_USER_ROLE,
            "authentication.roles.team_user.name",
            "authentication.roles.team_user.description",
            TEAM_USER_PERMISSIONS.iter().copied(),
            true,
        ),
        built_in(
            TEAM_POST_ALL_ROLE,
            "authentication.roles.team_post_all.name",
            "authentication.roles.team_post_all.description",
            TEAM_POST_ALL_PERMISSIONS.iter().copied(),
            false,
        ),
        built_in(
            TEAM_POST_ALL_PUBLIC_ROLE,
            "authentication.roles.team_post_all_public.name",
            "authentication.roles.team_post_all_public.description",
            TEAM_POST_ALL_PUBLIC_PERMISSIONS.iter().copied(),
            false,
        ),
        built_in(
            TEAM_ADMIN_ROLE,
            "authentication.roles.team_admin.name",
            "authentication.roles.team_admin.description",
            TEAM_ADMIN_PERMISSIONS.iter().copied(),
            true,
        ),
        built_in(
            SYSTEM_GUEST_ROLE,
            "authentication.roles.global_guest.name",
            "authentication.roles.global_guest.description",
            SYSTEM_GUEST_PERMISSIONS.iter().copied(),
            true,
        ),
        built_in(
            SYSTEM_USER_ROLE,
            "authentication.roles.global_user.name",
            "authentication.roles.global_user.description",
            SYSTEM_USER_PERMISSIONS.iter().copied(),
            true,
        ),
        built_in(
            SYSTEM_POST_ALL_ROLE,
            "authentication.roles.system_post_all.name",
            "authentication.roles.system_post_all.description",
            SYSTEM_POST_ALL_PERMISSIONS.iter().copied(),
            false,
        ),
        built_in(
            SYSTEM_POST_ALL_PUBLIC_ROLE,
            "authentication.roles.system_post_all_public.name",
            "authentication.roles.system_post_all_public.description",
            SYSTEM_POST_ALL_PUBLIC_PERMISSIONS.iter().copied(),
            false,
        ),
        built_in(
            SYSTEM_USER_ACCESS_TOKEN_ROLE,
            "authentication.roles.system_user_access_token.name",
            "authentication.roles.system_user_access_token.description",
            SYSTEM_USER_ACCESS_TOKEN_PERMISSIONS.iter().copied(),
            false,
        ),
        built_in(
            SYSTEM_USER_MANAGER_ROLE,
            "authentication.roles.system_user_manager.name",
            "authentication.roles.system_user_manager.description",
            with_ancillary(SYSTEM_USER_MANAGER_PERMISSIONS),
            false,
        ),
        built_in(
            SYSTEM_READ_ONLY_ADMIN_ROLE,
            "authentication.roles.system_read_only_admin.name",
            "authentication.roles.system_read_only_admin.description",
            system_read_only_admin_permissions(),
            false,
        ),
        built_in(
            SYSTEM_MANAGER_ROLE,
            "authentication.roles.system_manager.name",
            "authentication.roles.system_manager.description",
            with_ancillary(SYSTEM_MANAGER_PERMISSIONS),
            false,
        ),
        built_in(
            SYSTEM_ADMIN_ROLE,
            "authentication.roles.global_admin.name",
            "authentication.roles.global_admin.description",
            Permission::all().iter().copied().filter(|permission| !is_retired(*permission)),
            true,
        ),
    ];

    roles
        .into_iter()
        .map(|role| (role.name.clone(), role))
        .collect()
}

/// Returns whether a permission only survives for migrations to split or remove.
#[must_use]
pub fn is_retired(permission: Permission) -> bool {
    matches!(
        permission,
        P::ManageWebhooks
            | P::ManageOthersWebhooks
            | P::ManageEmojis
            | P::ManageOthersEmojis
            | P::PermanentDeleteUser
    )
}

#[cfg(test)]
mod tests {
    use super::{SCHEME_DEFAULT_ROLE_NAMES, is_retired, make_default_roles};
    use crate::permission::Permission;
    use crate::role::{
        CHANNEL_ADMIN_ROLE, SYSTEM_ADMIN_ROLE, SYSTEM_READ_ONLY_ADMIN_ROLE, TEAM_POST_ALL_ROLE,
    };

    #[test]
    fn every_default_role_is_valid_and_built_in() {
        let roles = make_default_roles();
        assert_eq!(roles.len(), 17);

        for role in roles.values() {
            assert!(role.built_in, "{} should be built in", role.name);
            assert!(role.validate_without_id().is_ok(), "{} is invalid", role.name);
        }
    }

    #[test]
    fn scheme_defaults_exist_and_are_scheme_managed() {
        let roles = make_default_roles();
        for name in SCHEME_DEFAULT_ROLE_NAMES {
            let Some(role) = roles.get(name) else {
                panic!("missing default role {name}");
            };
            assert!(role.scheme_managed);
        }

        assert!(roles.get(TEAM_POST_ALL_ROLE).is_some_and(|role| !role.scheme_managed));
    }

    #[test]
    fn system_admin_holds_every_live_permission() {
        let roles = make_default_roles();
        let Some(admin) = roles.get(SYSTEM_ADMIN_ROLE) else {
            panic!("system admin missing");
        };

        for permission in Permission::all() {
            assert_eq!(
                admin.has_permission(permission.as_str()),
                !is_retired(*permission)
            );
        }
    }

    #[test]
    fn read_only_admin_never_writes() {
        let roles = make_default_roles();
        let Some(role) = roles.get(SYSTEM_READ_ONLY_ADMIN_ROLE) else {
            panic!("read only admin missing");
        };

        assert!(
            role.permissions
                .iter()
                .all(|permission| !permission.starts_with("sysconsole_write_"))
        );
        assert!(role.has_permission("read_public_channel"));
        assert!(
            roles
                .get(CHANNEL_ADMIN_ROLE)
                .is_some_and(|role| role.has_permission("manage_channel_roles"))
        );
    }
}
