use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use huddle_core::AppError;
use serde::{Deserialize, Serialize};

/// Level of the hierarchy a permission applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionScope {
    /// Server-wide permission.
    System,
    /// Permission evaluated against a team.
    Team,
    /// Permission evaluated against a channel.
    Channel,
}

impl PermissionScope {
    /// Returns a stable storage value for this scope.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system_scope",
            Self::Team => "team_scope",
            Self::Channel => "channel_scope",
        }
    }
}

macro_rules! permission_catalog {
    ($($variant:ident => ($id:literal, $scope:ident)),+ $(,)?) => {
        /// Every permission a role may grant.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum Permission {
            $(
                #[doc = concat!("`", $id, "`")]
                #[serde(rename = $id)]
                $variant,
            )+
        }

        impl Permission {
            /// Returns the stable permission id stored on roles.
            #[must_use]
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $id,)+
                }
            }

            /// Returns the hierarchy level the permission applies to.
            #[must_use]
            pub fn scope(&self) -> PermissionScope {
                match self {
                    $(Self::$variant => PermissionScope::$scope,)+
                }
            }

            /// Looks up a permission by its stored id.
            #[must_use]
            pub fn from_id(value: &str) -> Option<Self> {
                match value {
                    $($id => Some(Self::$variant),)+
                    _ => None,
                }
            }

            /// Returns the full catalog in declaration order.
            #[must_use]
            pub fn all() -> &'static [Self] {
                const ALL: &[Permission] = &[$(Permission::$variant,)+];

                ALL
            }
        }
    };
}

permission_catalog! {
    // system
    ListUsersWithoutTeam => ("list_users_without_team", System),
    ManageSystem => ("manage_system", System),
    CreateTeam => ("create_team", System),
    ListPublicTeams => ("list_public_teams", System),
    JoinPublicTeams => ("join_public_teams", System),
    ListPrivateTeams => ("list_private_teams", System),
    JoinPrivateTeams => ("join_private_teams", System),
    CreateDirectChannel => ("create_direct_channel", System),
    CreateGroupChannel => ("create_group_channel", System),
    PermanentDeleteUser => ("permanent_delete_user", System),
    CreateBot => ("create_bot", System),
    ReadBots => ("read_bots", System),
    ReadOthersBots => ("read_others_bots", System),
    ManageBots => ("manage_bots", System),
    ManageOthersBots => ("manage_others_bots", System),
    PromoteGuest => ("promote_guest", System),
    DemoteToGuest => ("demote_to_guest", System),
    InviteGuest => ("invite_guest", System),
    CreateUserAccessToken => ("create_user_access_token", System),
    ReadUserAccessToken => ("read_user_access_token", System),
    RevokeUserAccessToken => ("revoke_user_access_token", System),
    SysconsoleReadAbout => ("sysconsole_read_about", System),
    SysconsoleWriteAbout => ("sysconsole_write_about", System),
    SysconsoleReadReporting => ("sysconsole_read_reporting", System),
    SysconsoleWriteReporting => ("sysconsole_write_reporting", System),
    SysconsoleReadUserManagementUsers => ("sysconsole_read_user_management_users", System),
    SysconsoleWriteUserManagementUsers => ("sysconsole_write_user_management_users", System),
    SysconsoleReadUserManagementGroups => ("sysconsole_read_user_management_groups", System),
    SysconsoleWriteUserManagementGroups => ("sysconsole_write_user_management_groups", System),
    SysconsoleReadUserManagementTeams => ("sysconsole_read_user_management_teams", System),
    SysconsoleWriteUserManagementTeams => ("sysconsole_write_user_management_teams", System),
    SysconsoleReadUserManagementChannels => ("sysconsole_read_user_management_channels", System),
    SysconsoleWriteUserManagementChannels => ("sysconsole_write_user_management_channels", System),
    SysconsoleReadUserManagementPermissions => ("sysconsole_read_user_management_permissions", System),
    SysconsoleWriteUserManagementPermissions => ("sysconsole_write_user_management_permissions", System),
    SysconsoleReadEnvironment => ("sysconsole_read_environment", System),
    SysconsoleWriteEnvironment => ("sysconsole_write_environment", System),
    SysconsoleReadSite => ("sysconsole_read_site", System),
    SysconsoleWriteSite => ("sysconsole_write_site", System),
    SysconsoleReadAuthentication => ("sysconsole_read_authentication", System),
    SysconsoleWriteAuthentication => ("sysconsole_write_authentication", System),
    SysconsoleReadPlugins => ("sysconsole_read_plugins", System),
    SysconsoleWritePlugins => ("sysconsole_write_plugins", System),
    SysconsoleReadIntegrations => ("sysconsole_read_integrations", System),
    SysconsoleWriteIntegrations => ("sysconsole_write_integrations", System),
    SysconsoleReadExperimental => ("sysconsole_read_experimental", System),
    SysconsoleWriteExperimental => ("sysconsole_write_experimental", System),

    // team
    ViewTeam => ("view_team", Team),
    ListTeamChannels => ("list_team_channels", Team),
    JoinPublicChannels => ("join_public_channels", Team),
    ReadPublicChannel => ("read_public_channel", Team),
    ViewMembers => ("view_members", Team),
    CreatePublicChannel => ("create_public_channel", Team),
    CreatePrivateChannel => ("create_private_channel", Team),
    ManageTeam => ("manage_team", Team),
    ManageTeamRoles => ("manage_team_roles", Team),
    ImportTeam => ("import_team", Team),
    AddUserToTeam => ("add_user_to_team", Team),
    RemoveUserFromTeam => ("remove_user_from_team", Team),
    InviteUser => ("invite_user", Team),
    ManageWebhooks => ("manage_webhooks", Team),
    ManageOthersWebhooks => ("manage_others_webhooks", Team),
    ManageIncomingWebhooks => ("manage_incoming_webhooks", Team),
    ManageOutgoingWebhooks => ("manage_outgoing_webhooks", Team),
    ManageOthersIncomingWebhooks => ("manage_others_incoming_webhooks", Team),
    ManageOthersOutgoingWebhooks => ("manage_others_outgoing_webhooks", Team),
    ManageSlashCommands => ("manage_slash_commands", Team),
    ManageOthersSlashCommands => ("manage_others_slash_commands", Team),
    ManageEmojis => ("manage_emojis", Team),
    ManageOthersEmojis => ("manage_others_emojis", Team),
    CreateEmojis => ("create_emojis", Team),
    DeleteEmojis => ("delete_emojis", Team),
    DeleteOthersEmojis => ("delete_others_emojis", Team),
    ConvertPublicChannelToPrivate => ("convert_public_channel_to_private", Team),
    ConvertPrivateChannelToPublic => ("convert_private_channel_to_public", Team),

    // channel
    ReadChannel => ("read_channel", Channel),
    CreatePost => ("create_post", Channel),
    CreatePostPublic => ("create_post_public", Channel),
    EditPost => ("edit_post", Channel),
    EditOthersPosts => ("edit_others_posts", Channel),
    DeletePost => ("delete_post", Channel),
    DeleteOthersPosts => ("delete_others_posts", Channel),
    AddReaction => ("add_reaction", Channel),
    RemoveReaction => ("remove_reaction", Channel),
    UploadFile => ("upload_file", Channel),
    GetPublicLink => ("get_public_link", Channel),
    UseChannelMentions => ("use_channel_mentions", Channel),
    UseGroupMentions => ("use_group_mentions", Channel),
    UseSlashCommands => ("use_slash_commands", Channel),
    ManagePublicChannelMembers => ("manage_public_channel_members", Channel),
    ManagePrivateChannelMembers => ("manage_private_channel_members", Channel),
    ManagePublicChannelProperties => ("manage_public_channel_properties", Channel),
    ManagePrivateChannelProperties => ("manage_private_channel_properties", Channel),
    DeletePublicChannel => ("delete_public_channel", Channel),
    DeletePrivateChannel => ("delete_private_channel", Channel),
    ManageChannelRoles => ("manage_channel_roles", Channel),
}

impl Permission {
    /// Returns the localizable name key shown in admin tooling.
    #[must_use]
    pub fn name_key(&self) -> String {
        format!("authentication.permissions.{}.name", self.as_str())
    }

    /// Returns the localizable description key shown in admin tooling.
    #[must_use]
    pub fn description_key(&self) -> String {
        format!("authentication.permissions.{}.description", self.as_str())
    }

    /// Returns the moderation group this permission belongs to, if any.
    #[must_use]
    pub fn moderation_group(&self) -> Option<ModeratedPermission> {
        match self {
            Self::CreatePost => Some(ModeratedPermission::CreatePost),
            Self::AddReaction | Self::RemoveReaction => Some(ModeratedPermission::CreateReactions),
            Self::ManagePublicChannelMembers | Self::ManagePrivateChannelMembers => {
                Some(ModeratedPermission::ManageMembers)
            }
            Self::UseChannelMentions => Some(ModeratedPermission::UseChannelMentions),
            _ => None,
        }
    }

    /// Returns whether channel moderation can override this permission.
    #[must_use]
    pub fn is_moderated(&self) -> bool {
        self.moderation_group().is_some()
    }

    /// Returns the catalog entries that belong to one scope.
    pub fn in_scope(scope: PermissionScope) -> impl Iterator<Item = Permission> {
        Self::all()
            .iter()
            .copied()
            .filter(move |permission| permission.scope() == scope)
    }
}

impl Display for Permission {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::from_id(value).ok_or_else(|| {
            AppError::invalid_input(
                "Permission.FromStr",
                "model.permission.unknown.app_error",
                format!("unknown permission value '{value}'"),
            )
        })
    }
}

/// Channel moderation groups exposed to channel admins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeratedPermission {
    /// Posting messages.
    CreatePost,
    /// Adding and removing reactions.
    CreateReactions,
    /// Managing channel membership.
    ManageMembers,
    /// Notifying the whole channel.
    UseChannelMentions,
}

impl ModeratedPermission {
    /// Returns a stable storage value for this group.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CreatePost => "create_post",
            Self::CreateReactions => "create_reactions",
            Self::ManageMembers => "manage_members",
            Self::UseChannelMentions => "use_channel_mentions",
        }
    }

    /// Returns every moderation group.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[ModeratedPermission] = &[
            ModeratedPermission::CreatePost,
            ModeratedPermission::CreateReactions,
            ModeratedPermission::ManageMembers,
            ModeratedPermission::UseChannelMentions,
        ];

        ALL
    }

    /// Returns the permissions governed by this group.
    #[must_use]
    pub fn permissions(self) -> &'static [Permission] {
        match self {
            Self::CreatePost => &[Permission::CreatePost],
            Self::CreateReactions => &[Permission::AddReaction, Permission::RemoveReaction],
            Self::ManageMembers => &[
                Permission::ManagePublicChannelMembers,
                Permission::ManagePrivateChannelMembers,
            ],
            Self::UseChannelMentions => &[Permission::UseChannelMentions],
        }
    }
}

/// Returns whether `permission_id` is on the moderated allow-list.
#[must_use]
pub fn is_moderated_permission(permission_id: &str) -> bool {
    Permission::from_id(permission_id).is_some_and(|permission| permission.is_moderated())
}

/// Returns whether `permission_id` belongs to the channel permission surface.
#[must_use]
pub fn is_channel_scoped_permission(permission_id: &str) -> bool {
    Permission::from_id(permission_id)
        .is_some_and(|permission| permission.scope() == PermissionScope::Channel)
}

/// Keeps only the moderated permissions of a permission set.
pub fn filter_moderated<'a>(permissions: impl IntoIterator<Item = &'a String>) -> BTreeSet<String> {
    permissions
        .into_iter()
        .filter(|permission| is_moderated_permission(permission))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeSet, HashSet};
    use std::str::FromStr;

    use super::{
        ModeratedPermission, Permission, PermissionScope, filter_moderated,
        is_channel_scoped_permission, is_moderated_permission,
    };

    #[test]
    fn permission_ids_are_unique_and_round_trip() {
        let mut seen = HashSet::new();
        for permission in Permission::all() {
            assert!(seen.insert(permission.as_str()));
            assert_eq!(Permission::from_id(permission.as_str()), Some(*permission));
        }
    }

    #[test]
    fn unknown_permission_is_rejected() {
        let result = Permission::from_str("launch_rockets");
        assert!(result.is_err());
    }

    #[test]
    fn moderation_groups_cover_only_channel_permissions() {
        for group in ModeratedPermission::all() {
            for permission in group.permissions() {
                assert_eq!(permission.scope(), PermissionScope::Channel);
                assert_eq!(permission.moderation_group(), Some(*group));
            }
        }

        assert!(is_moderated_permission("add_reaction"));
        assert!(!is_moderated_permission("read_channel"));
        assert!(!is_moderated_permission("not_a_permission"));
        assert!(is_channel_scoped_permission("read_channel"));
        assert!(!is_channel_scoped_permission("view_team"));
    }

    #[test]
    fn filter_moderated_drops_everything_else() {
        let permissions: BTreeSet<String> = ["read_channel", "create_post", "remove_reaction"]
            .into_iter()
            .map(str::to_owned)
            .collect();

        let filtered = filter_moderated(&permissions);

        assert_eq!(
            filtered.into_iter().collect::<Vec<_>>(),
            vec!["create_post".to_owned(), "remove_reaction".to_owned()]
        );
    }

    #[test]
    fn localizable_keys_follow_permission_id() {
        assert_eq!(
            Permission::ViewTeam.name_key(),
            "authentication.permissions.view_team.name"
        );
        assert_eq!(
            Permission::ViewTeam.description_key(),
            "authentication.permissions.view_team.description"
        );
    }
}
