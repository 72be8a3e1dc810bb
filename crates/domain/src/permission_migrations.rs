//! Transformations applied by each keyed permission migration.
//!
//! Every map here must be safe to re-run against roles it already migrated.

use crate::permission::Permission as P;
use crate::permission::{ModeratedPermission, Permission};
use crate::role::{
    CHANNEL_ADMIN_ROLE, CHANNEL_GUEST_ROLE, CHANNEL_USER_ROLE, SYSTEM_ADMIN_ROLE,
    SYSTEM_USER_ROLE, TEAM_USER_ROLE,
};
use crate::transformation::{PermissionTransformation, PermissionsMap, RoleCondition};

fn ids(permissions: &[Permission]) -> Vec<&'static str> {
    permissions.iter().map(|permission| permission.as_str()).collect()
}

/// Splits the retired `manage_emojis` permissions.
#[must_use]
pub fn emoji_permissions_split() -> PermissionsMap {
    vec![
        PermissionTransformation::replace(
            RoleCondition::has_permission(P::ManageEmojis.as_str()),
            ids(&[P::CreateEmojis, P::DeleteEmojis]),
            ids(&[P::ManageEmojis]),
        ),
        PermissionTransformation::replace(
            RoleCondition::has_permission(P::ManageOthersEmojis.as_str()),
            ids(&[P::DeleteOthersEmojis]),
            ids(&[P::ManageOthersEmojis]),
        ),
    ]
}

/// Splits the retired `manage_webhooks` permissions.
#[must_use]
pub fn webhook_permissions_split() -> PermissionsMap {
    vec![
        PermissionTransformation::replace(
            RoleCondition::has_permission(P::ManageWebhooks.as_str()),
            ids(&[P::ManageIncomingWebhooks, P::ManageOutgoingWebhooks]),
            ids(&[P::ManageWebhooks]),
        ),
        PermissionTransformation::replace(
            RoleCondition::has_permission(P::ManageOthersWebhooks.as_str()),
            ids(&[P::ManageOthersIncomingWebhooks, P::ManageOthersOutgoingWebhooks]),
            ids(&[P::ManageOthersWebhooks]),
        ),
    ]
}

/// Grants team discovery permissions.
#[must_use]
pub fn list_join_public_private_teams() -> PermissionsMap {
    vec![
        PermissionTransformation::grant(
            RoleCondition::is_role(SYSTEM_ADMIN_ROLE),
            ids(&[P::ListPrivateTeams, P::JoinPrivateTeams]),
        ),
        PermissionTransformation::grant(
            RoleCondition::is_role(SYSTEM_USER_ROLE),
            ids(&[P::ListPublicTeams, P::JoinPublicTeams]),
        ),
    ]
}

/// Drops `permanent_delete_user` everywhere.
#[must_use]
pub fn remove_permanent_delete_user() -> PermissionsMap {
    vec![PermissionTransformation::revoke(
        RoleCondition::has_permission(P::PermanentDeleteUser.as_str()),
        ids(&[P::PermanentDeleteUser]),
    )]
}

/// Grants bot management to system admins.
#[must_use]
pub fn add_bot_permissions() -> PermissionsMap {
    vec![PermissionTransformation::grant(
        RoleCondition::is_role(SYSTEM_ADMIN_ROLE),
        ids(&[
            P::CreateBot,
            P::ReadBots,
            P::ReadOthersBots,
            P::ManageBots,
            P::ManageOthersBots,
        ]),
    )]
}

const CHANNEL_MANAGE_DELETE: [Permission; 4] = [
    P::ManagePublicChannelProperties,
    P::DeletePublicChannel,
    P::ManagePrivateChannelProperties,
    P::DeletePrivateChannel,
];

/// Copies channel property management from `team_user` onto `channel_user`.
#[must_use]
pub fn apply_channel_manage_delete_to_channel_user() -> PermissionsMap {
    CHANNEL_MANAGE_DELETE
        .iter()
        .map(|permission| {
            PermissionTransformation::grant(
                RoleCondition::All(vec![
                    RoleCondition::is_role(CHANNEL_USER_ROLE),
                    RoleCondition::OtherRoleHasPermission {
                        role_name: TEAM_USER_ROLE.to_owned(),
                        permission: permission.as_str().to_owned(),
                    },
                ]),
                [permission.as_str()],
            )
        })
        .collect()
}

/// Removes channel property management from `team_user`.
#[must_use]
pub fn remove_channel_manage_delete_from_team_user() -> PermissionsMap {
    CHANNEL_MANAGE_DELETE
        .iter()
        .map(|permission| {
            PermissionTransformation::revoke(
                RoleCondition::All(vec![
                    RoleCondition::is_role(TEAM_USER_ROLE),
                    RoleCondition::has_permission(permission.as_str()),
                ]),
                [permission.as_str()],
            )
        })
        .collect()
}

/// Grants `view_members` to system users and admins.
#[must_use]
pub fn view_members_new_permission() -> PermissionsMap {
    vec![PermissionTransformation::grant(
        RoleCondition::Any(vec![
            RoleCondition::is_role(SYSTEM_USER_ROLE),
            RoleCondition::is_role(SYSTEM_ADMIN_ROLE),
        ]),
        ids(&[P::ViewMembers]),
    )]
}

/// Grants guest management to system admins.
#[must_use]
pub fn add_manage_guests_permissions() -> PermissionsMap {
    vec![PermissionTransformation::grant(
        RoleCondition::is_role(SYSTEM_ADMIN_ROLE),
        ids(&[P::PromoteGuest, P::DemoteToGuest, P::InviteGuest]),
    )]
}

/// Aligns posting roles and channel admins with the moderation groups.
#[must_use]
pub fn channel_moderations_permissions() -> PermissionsMap {
    let moderated: Vec<&'static str> = ModeratedPermission::all()
        .iter()
        .flat_map(|group| group.permissions())
        .map(|permission| permission.as_str())
        .collect();

    vec![
        PermissionTransformation::grant(
            RoleCondition::Any(vec![
                RoleCondition::has_permission(P::CreatePost.as_str()),
                RoleCondition::has_permission(P::CreatePostPublic.as_str()),
            ]),
            ids(&[P::UseChannelMentions]),
        ),
        PermissionTransformation::grant(RoleCondition::is_role(CHANNEL_ADMIN_ROLE), moderated),
    ]
}

/// Grants `use_group_mentions` to every posting role except guests.
#[must_use]
pub fn add_use_group_mentions_permission() -> PermissionsMap {
    vec![PermissionTransformation::grant(
        RoleCondition::All(vec![
            RoleCondition::negate(RoleCondition::is_role(CHANNEL_GUEST_ROLE)),
            RoleCondition::negate(RoleCondition::DisplayNameContains(
                "Channel Guest Role for Scheme".to_owned(),
            )),
            RoleCondition::Any(vec![
                RoleCondition::has_permission(P::CreatePost.as_str()),
                RoleCondition::has_permission(P::CreatePostPublic.as_str()),
            ]),
        ]),
        ids(&[P::UseGroupMentions]),
    )]
}

/// Grants every system console permission to roles managing the system.
#[must_use]
pub fn add_system_console_permissions() -> PermissionsMap {
    let sysconsole: Vec<&'static str> = Permission::all()
        .iter()
        .map(|permission| permission.as_str())
        .filter(|id| id.starts_with("sysconsole_"))
        .collect();

    vec![PermissionTransformation::grant(
        RoleCondition::has_permission(P::ManageSystem.as_str()),
        sysconsole,
    )]
}

/// Grants channel conversion to roles that manage teams.
#[must_use]
pub fn add_convert_channel_permissions() -> PermissionsMap {
    vec![PermissionTransformation::grant(
        RoleCondition::has_permission(P::ManageTeam.as_str()),
        ids(&[P::ConvertPublicChannelToPrivate, P::ConvertPrivateChannelToPublic]),
    )]
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::{
        add_bot_permissions, add_convert_channel_permissions, add_manage_guests_permissions,
        add_system_console_permissions, add_use_group_mentions_permission,
        apply_channel_manage_delete_to_channel_user, channel_moderations_permissions,
        emoji_permissions_split, list_join_public_private_teams,
        remove_channel_manage_delete_from_team_user, remove_permanent_delete_user,
        view_members_new_permission, webhook_permissions_split,
    };
    use crate::default_roles::make_default_roles;
    use crate::role::Role;
    use crate::transformation::{PermissionsMap, RolePermissionMap, apply_permissions_map};

    fn run(roles: &mut BTreeMap<String, Role>, map: &PermissionsMap) {
        let mut role_map = RolePermissionMap::from_roles(roles.values());
        for role in roles.values_mut() {
            role.permissions = apply_permissions_map(role, &mut role_map, map);
        }
    }

    fn legacy_roles() -> BTreeMap<String, Role> {
        let mut roles = make_default_roles();
        let mut custom = Role::new(
            "legacy_custom",
            "Legacy",
            [
                "manage_emojis",
                "manage_others_webhooks",
                "permanent_delete_user",
                "create_post",
            ],
        );
        custom.id = "legacy".to_owned();
        roles.insert(custom.name.clone(), custom);

        if let Some(team_user) = roles.get_mut("team_user") {
            team_user
                .permissions
                .insert("manage_public_channel_properties".to_owned());
        }
        if let Some(channel_user) = roles.get_mut("channel_user") {
            channel_user
                .permissions
                .remove("manage_public_channel_properties");
        }
        roles
    }

    fn table() -> Vec<PermissionsMap> {
        vec![
            emoji_permissions_split(),
            webhook_permissions_split(),
            list_join_public_private_teams(),
            remove_permanent_delete_user(),
            add_bot_permissions(),
            apply_channel_manage_delete_to_channel_user(),
            remove_channel_manage_delete_from_team_user(),
            view_members_new_permission(),
            add_manage_guests_permissions(),
            channel_moderations_permissions(),
            add_use_group_mentions_permission(),
            add_system_console_permissions(),
            add_convert_channel_permissions(),
        ]
    }

    #[test]
    fn legacy_permissions_are_split_and_removed() {
        let mut roles = legacy_roles();
        for map in table() {
            run(&mut roles, &map);
        }

        let Some(custom) = roles.get("legacy_custom") else {
            panic!("custom role missing");
        };
        assert!(custom.has_permission("create_emojis"));
        assert!(custom.has_permission("delete_emojis"));
        assert!(!custom.has_permission("manage_emojis"));
        assert!(custom.has_permission("manage_others_incoming_webhooks"));
        assert!(!custom.has_permission("permanent_delete_user"));
        assert!(custom.has_permission("use_channel_mentions"));
        assert!(custom.has_permission("use_group_mentions"));
    }

    #[test]
    fn channel_property_management_moves_from_team_user_to_channel_user() {
        let mut roles = legacy_roles();
        for map in table() {
            run(&mut roles, &map);
        }

        assert!(
            roles
                .get("channel_user")
                .is_some_and(|role| role.has_permission("manage_public_channel_properties"))
        );
        assert!(
            roles
                .get("team_user")
                .is_some_and(|role| !role.has_permission("manage_public_channel_properties"))
        );
        assert!(
            roles
                .get("channel_guest")
                .is_some_and(|role| !role.has_permission("use_group_mentions"))
        );
    }

    #[test]
    fn every_migration_is_idempotent() {
        let mut roles = legacy_roles();
        for map in table() {
            run(&mut roles, &map);
            let once = roles.clone();
            run(&mut roles, &map);
            assert_eq!(roles, once);
        }
    }

    #[test]
    fn the_whole_table_is_idempotent() {
        let mut roles = legacy_roles();
        for map in table() {
            run(&mut roles, &map);
        }
        let once = roles.clone();
        for map in table() {
            run(&mut roles, &map);
        }

        assert_eq!(roles, once);
    }
}
