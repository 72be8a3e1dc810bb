use std::str::FromStr;

use huddle_core::{AppError, AppResult, is_valid_id};
use serde::{Deserialize, Serialize};

use crate::permission::filter_moderated;
use crate::role::{
    CHANNEL_ADMIN_ROLE, CHANNEL_GUEST_ROLE, CHANNEL_USER_ROLE, Role, SchemeRoleSlot,
    TEAM_ADMIN_ROLE, TEAM_GUEST_ROLE, TEAM_USER_ROLE, is_valid_role_name,
};

/// Maximum scheme name length.
pub const SCHEME_NAME_MAX_LENGTH: usize = 64;
/// Maximum scheme display name length.
pub const SCHEME_DISPLAY_NAME_MAX_LENGTH: usize = 128;
/// Maximum scheme description length.
pub const SCHEME_DESCRIPTION_MAX_LENGTH: usize = 1024;

/// Level a scheme applies to. Also names the level of a default-role slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemeScope {
    /// Scheme attached to a team, covering the team and its channels.
    Team,
    /// Scheme attached to a single channel.
    Channel,
}

impl SchemeScope {
    /// Returns a stable storage value for this scope.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Team => "team",
            Self::Channel => "channel",
        }
    }

    /// Returns the role levels whose slots a scheme of this scope populates.
    #[must_use]
    pub fn populated_levels(self) -> &'static [SchemeScope] {
        match self {
            Self::Team => &[SchemeScope::Team, SchemeScope::Channel],
            Self::Channel => &[SchemeScope::Channel],
        }
    }

    /// Returns the system default role backing `slot` at this level.
    #[must_use]
    pub fn system_default_role(self, slot: SchemeRoleSlot) -> &'static str {
        match (self, slot) {
            (Self::Team, SchemeRoleSlot::Guest) => TEAM_GUEST_ROLE,
            (Self::Team, SchemeRoleSlot::User) => TEAM_USER_ROLE,
            (Self::Team, SchemeRoleSlot::Admin) => TEAM_ADMIN_ROLE,
            (Self::Channel, SchemeRoleSlot::Guest) => CHANNEL_GUEST_ROLE,
            (Self::Channel, SchemeRoleSlot::User) => CHANNEL_USER_ROLE,
            (Self::Channel, SchemeRoleSlot::Admin) => CHANNEL_ADMIN_ROLE,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Team => "Team",
            Self::Channel => "Channel",
        }
    }
}

impl FromStr for SchemeScope {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "team" => Ok(Self::Team),
            "channel" => Ok(Self::Channel),
            _ => Err(invalid_scheme("scope", value)),
        }
    }
}

/// Named bundle of default-role overrides for a team or channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scheme {
    /// Store identifier.
    pub id: String,
    /// Unique machine name.
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
    /// Level the scheme applies to.
    pub scope: SchemeScope,
    /// Role granted to team admins.
    pub default_team_admin_role: Option<String>,
    /// Role granted to team users.
    pub default_team_user_role: Option<String>,
    /// Role granted to team guests.
    pub default_team_guest_role: Option<String>,
    /// Role granted to channel admins.
    pub default_channel_admin_role: Option<String>,
    /// Role granted to channel users.
    pub default_channel_user_role: Option<String>,
    /// Role granted to channel guests.
    pub default_channel_guest_role: Option<String>,
}

impl Scheme {
    /// Creates an unsaved scheme.
    pub fn new(display_name: impl Into<String>, scope: SchemeScope) -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            display_name: display_name.into(),
            description: String::new(),
            create_at: 0,
            update_at: 0,
            delete_at: 0,
            scope,
            default_team_admin_role: None,
            default_team_user_role: None,
            default_team_guest_role: None,
            default_channel_admin_role: None,
            default_channel_user_role: None,
            default_channel_guest_role: None,
        }
    }

    /// Discards fields that only the server may set.
    pub fn clear_trusted_fields(&mut self) {
        self.id.clear();
        self.create_at = 0;
        self.update_at = 0;
        self.delete_at = 0;
        for level in [SchemeScope::Team, SchemeScope::Channel] {
            for slot in SchemeRoleSlot::all() {
                self.set_default_role(level, slot, None);
            }
        }
    }

    /// Returns the role name stored in one slot.
    #[must_use]
    pub fn default_role(&self, level: SchemeScope, slot: SchemeRoleSlot) -> Option<&str> {
        let value = match (level, slot) {
            (SchemeScope::Team, SchemeRoleSlot::Admin) => &self.default_team_admin_role,
            (SchemeScope::Team, SchemeRoleSlot::User) => &self.default_team_user_role,
            (SchemeScope::Team, SchemeRoleSlot::Guest) => &self.default_team_guest_role,
            (SchemeScope::Channel, SchemeRoleSlot::Admin) => &self.default_channel_admin_role,
            (SchemeScope::Channel, SchemeRoleSlot::User) => &self.default_channel_user_role,
            (SchemeScope::Channel, SchemeRoleSlot::Guest) => &self.default_channel_guest_role,
        };

        value.as_deref().filter(|name| !name.is_empty())
    }

    /// Replaces the role name stored in one slot.
    pub fn set_default_role(&mut self, level: SchemeScope, slot: SchemeRoleSlot, name: Option<String>) {
        let target = match (level, slot) {
            (SchemeScope::Team, SchemeRoleSlot::Admin) => &mut self.default_team_admin_role,
            (SchemeScope::Team, SchemeRoleSlot::User) => &mut self.default_team_user_role,
            (SchemeScope::Team, SchemeRoleSlot::Guest) => &mut self.default_team_guest_role,
            (SchemeScope::Channel, SchemeRoleSlot::Admin) => &mut self.default_channel_admin_role,
            (SchemeScope::Channel, SchemeRoleSlot::User) => &mut self.default_channel_user_role,
            (SchemeScope::Channel, SchemeRoleSlot::Guest) => &mut self.default_channel_guest_role,
        };

        *target = name;
    }

    /// Returns every populated role-name slot.
    #[must_use]
    pub fn role_names(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(6);
        for level in [SchemeScope::Team, SchemeScope::Channel] {
            for slot in SchemeRoleSlot::all() {
                if let Some(name) = self.default_role(level, slot) {
                    names.push(name.to_owned());
                }
            }
        }
        names
    }

    /// Returns whether the scheme has been soft-deleted.
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.delete_at != 0
    }

    /// Validates every field except the store identifier and timestamps.
    pub fn validate_for_create(&self) -> AppResult<()> {
        if !is_valid_scheme_name(&self.name) {
            return Err(invalid_scheme("name", &self.name));
        }

        let display_length = self.display_name.chars().count();
        if display_length == 0 || display_length > SCHEME_DISPLAY_NAME_MAX_LENGTH {
            return Err(invalid_scheme("display_name", &self.display_name));
        }

        if self.description.chars().count() > SCHEME_DESCRIPTION_MAX_LENGTH {
            return Err(invalid_scheme("description", &self.description));
        }

        for level in [SchemeScope::Team, SchemeScope::Channel] {
            let expected = self.scope.populated_levels().contains(&level);
            for slot in SchemeRoleSlot::all() {
                match (expected, self.default_role(level, slot)) {
                    (true, Some(name)) if is_valid_role_name(name) => {}
                    (false, None) => {}
                    (_, value) => {
                        return Err(invalid_scheme(
                            "default_role",
                            &format!("{} {} {}", level.as_str(), slot.as_str(), value.unwrap_or("")),
                        ));
                    }
                }
            }
        }

        Ok(())
    }

    /// Validates a stored scheme before it is updated.
    pub fn validate(&self) -> AppResult<()> {
        if !is_valid_id(&self.id) {
            return Err(invalid_scheme("id", &self.id));
        }

        if self.create_at == 0 {
            return Err(invalid_scheme("create_at", "0"));
        }

        self.validate_for_create()
    }

    /// Clones the system default roles into fresh backing roles, recording
    /// their names in this scheme's slots.
    ///
    /// Channel schemes get an empty admin role and moderation-filtered user and
    /// guest roles.
    pub fn derive_backing_roles(
        &mut self,
        system_defaults: &[Role],
        mut next_role_name: impl FnMut() -> String,
    ) -> AppResult<Vec<Role>> {
        let mut roles = Vec::with_capacity(6);
        for level in self.scope.populated_levels() {
            for slot in [SchemeRoleSlot::Admin, SchemeRoleSlot::User, SchemeRoleSlot::Guest] {
                let source_name = level.system_default_role(slot);
                let source = system_defaults
                    .iter()
                    .find(|role| role.name == source_name)
                    .ok_or_else(|| {
                        AppError::internal(
                            "CreateScheme",
                            "app.scheme.save.retrieving_default_scheme_roles.app_error",
                            format!("default role '{source_name}' is missing"),
                        )
                    })?;

                let permissions = match (self.scope, slot) {
                    (SchemeScope::Channel, SchemeRoleSlot::Admin) => Default::default(),
                    (SchemeScope::Channel, _) => filter_moderated(&source.permissions),
                    (SchemeScope::Team, _) => source.permissions.clone(),
                };

                let mut role = Role::new(
                    next_role_name(),
                    format!(
                        "{} {} Role for Scheme {}",
                        level.label(),
                        slot_label(slot),
                        self.name
                    ),
                    permissions,
                );
                role.scheme_managed = true;

                self.set_default_role(*level, slot, Some(role.name.clone()));
                roles.push(role);
            }
        }

        Ok(roles)
    }
}

fn slot_label(slot: SchemeRoleSlot) -> &'static str {
    match slot {
        SchemeRoleSlot::Guest => "Guest",
        SchemeRoleSlot::User => "User",
        SchemeRoleSlot::Admin => "Admin",
    }
}

fn invalid_scheme(field: &str, value: &str) -> AppError {
    AppError::invalid_input(
        "Scheme.IsValid",
        "model.scheme.is_valid.app_error",
        format!("field '{field}' has invalid value '{value}'"),
    )
}

/// Returns whether `name` is a syntactically valid scheme name.
#[must_use]
pub fn is_valid_scheme_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= SCHEME_NAME_MAX_LENGTH
        && name
            .chars()
            .all(|character| character.is_ascii_lowercase() || character.is_ascii_digit() || character == '_')
}

/// Admin-editable subset of a scheme.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemePatch {
    /// Replacement machine name.
    pub name: Option<String>,
    /// Replacement display name.
    pub display_name: Option<String>,
    /// Replacement description.
    pub description: Option<String>,
}

impl SchemePatch {
    /// Applies the patch onto `scheme`.
    pub fn apply(self, scheme: &mut Scheme) {
        if let Some(name) = self.name {
            scheme.name = name;
        }
        if let Some(display_name) = self.display_name {
            scheme.display_name = display_name;
        }
        if let Some(description) = self.description {
            scheme.description = description;
        }
    }
}
