use serde::{Deserialize, Serialize};

use crate::role::SchemeRoleSlot;
use crate::scheme::{Scheme, SchemeScope};

/// Kind of membership being resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipScope {
    /// Membership of a user in a team.
    Team,
    /// Membership of a user in a channel.
    Channel,
}

impl MembershipScope {
    /// Returns a stable storage value for this scope.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Team => "team",
            Self::Channel => "channel",
        }
    }

    /// Returns the scheme slot level consulted for this membership.
    #[must_use]
    pub fn level(self) -> SchemeScope {
        match self {
            Self::Team => SchemeScope::Team,
            Self::Channel => SchemeScope::Channel,
        }
    }

    /// Returns the hardcoded global role id implied by `slot`.
    #[must_use]
    pub fn global_role(self, slot: SchemeRoleSlot) -> &'static str {
        self.level().system_default_role(slot)
    }
}

/// Default role names one scheme supplies for a membership level.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemeDefaults {
    /// Guest slot.
    pub guest: Option<String>,
    /// User slot.
    pub user: Option<String>,
    /// Admin slot.
    pub admin: Option<String>,
}

impl SchemeDefaults {
    /// Reads the slots of `scheme` relevant to `scope`. No scheme yields no overrides.
    #[must_use]
    pub fn for_scope(scheme: Option<&Scheme>, scope: MembershipScope) -> Self {
        let Some(scheme) = scheme else {
            return Self::default();
        };

        let level = scope.level();
        let slot = |slot| scheme.default_role(level, slot).map(str::to_owned);

        Self {
            guest: slot(SchemeRoleSlot::Guest),
            user: slot(SchemeRoleSlot::User),
            admin: slot(SchemeRoleSlot::Admin),
        }
    }

    /// Returns the non-empty name configured for `slot`.
    #[must_use]
    pub fn get(&self, slot: SchemeRoleSlot) -> Option<&str> {
        let value = match slot {
            SchemeRoleSlot::Guest => &self.guest,
            SchemeRoleSlot::User => &self.user,
            SchemeRoleSlot::Admin => &self.admin,
        };

        value.as_deref().filter(|name| !name.is_empty())
    }
}

/// Scheme-implied role flags of a membership.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SchemeFlags {
    /// Member holds the guest slot.
    pub guest: bool,
    /// Member holds the user slot.
    pub user: bool,
    /// Member holds the admin slot.
    pub admin: bool,
}

impl SchemeFlags {
    /// Returns the flag for `slot`.
    #[must_use]
    pub fn get(self, slot: SchemeRoleSlot) -> bool {
        match slot {
            SchemeRoleSlot::Guest => self.guest,
            SchemeRoleSlot::User => self.user,
            SchemeRoleSlot::Admin => self.admin,
        }
    }

    /// Sets the flag for `slot`.
    pub fn set(&mut self, slot: SchemeRoleSlot) {
        match slot {
            SchemeRoleSlot::Guest => self.guest = true,
            SchemeRoleSlot::User => self.user = true,
            SchemeRoleSlot::Admin => self.admin = true,
        }
    }

    /// Guests cannot also be users or admins.
    #[must_use]
    pub fn is_consistent(self) -> bool {
        !(self.guest && (self.user || self.admin))
    }
}

/// Scheme defaults visible to one membership.
#[derive(Debug, Clone, Copy)]
pub struct ResolutionContext<'a> {
    /// Membership kind.
    pub scope: MembershipScope,
    /// Defaults of the parent team's scheme at the membership level.
    pub team_scheme: &'a SchemeDefaults,
    /// Defaults of the channel's own scheme. Ignored for team memberships.
    pub channel_scheme: &'a SchemeDefaults,
}

impl ResolutionContext<'_> {
    /// Returns the role name implied by `slot`: channel scheme, then team
    /// scheme, then the global default.
    #[must_use]
    pub fn implied_role(&self, slot: SchemeRoleSlot) -> &str {
        let channel = match self.scope {
            MembershipScope::Channel => self.channel_scheme.get(slot),
            MembershipScope::Team => None,
        };

        channel
            .or_else(|| self.team_scheme.get(slot))
            .unwrap_or_else(|| self.scope.global_role(slot))
    }
}

/// Effective role view of a membership.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedRoles {
    /// Explicit roles followed by scheme-implied names.
    pub roles: Vec<String>,
    /// Roles not implied by any flag.
    pub explicit_roles: Vec<String>,
    /// Scheme flags after folding in legacy global tokens.
    pub flags: SchemeFlags,
}

impl ResolvedRoles {
    /// Space-separated effective roles.
    #[must_use]
    pub fn roles_string(&self) -> String {
        self.roles.join(" ")
    }

    /// Space-separated explicit roles.
    #[must_use]
    pub fn explicit_roles_string(&self) -> String {
        self.explicit_roles.join(" ")
    }
}

/// Collapses raw role tokens, scheme flags and scheme defaults into one role view.
///
/// Tokens equal to a global default id for the scope set the matching flag
/// instead of staying explicit, and tokens already implied by a set flag are
/// dropped. Duplicates keep their first position.
pub fn resolve_roles<'t>(
    raw_tokens: impl IntoIterator<Item = &'t str>,
    flags: SchemeFlags,
    context: &ResolutionContext<'_>,
) -> ResolvedRoles {
    let mut flags = flags;
    let mut candidates: Vec<&str> = Vec::new();

    for token in raw_tokens {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }

        match SchemeRoleSlot::all()
            .into_iter()
            .find(|slot| context.scope.global_role(*slot) == token)
        {
            Some(slot) => flags.set(slot),
            None => candidates.push(token),
        }
    }

    let mut explicit_roles: Vec<String> = Vec::new();
    for token in candidates {
        let implied = SchemeRoleSlot::all()
            .into_iter()
            .any(|slot| flags.get(slot) && context.implied_role(slot) == token);

        if !implied && !explicit_roles.iter().any(|role| role == token) {
            explicit_roles.push(token.to_owned());
        }
    }

    let mut roles = explicit_roles.clone();
    for slot in SchemeRoleSlot::all() {
        if !flags.get(slot) {
            continue;
        }

        let implied = context.implied_role(slot);
        if !roles.iter().any(|role| role == implied) {
            roles.push(implied.to_owned());
        }
    }

    ResolvedRoles {
        roles,
        explicit_roles,
        flags,
    }
}

/// Identifies one membership row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MembershipKey {
    /// Team or channel id.
    pub parent_id: String,
    /// User id.
    pub principal_id: String,
}

impl MembershipKey {
    /// Creates a membership key.
    pub fn new(parent_id: impl Into<String>, principal_id: impl Into<String>) -> Self {
        Self {
            parent_id: parent_id.into(),
            principal_id: principal_id.into(),
        }
    }
}

/// Persisted membership row joined with the scheme defaults that apply to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipRecord {
    /// Membership kind.
    pub scope: MembershipScope,
    /// Row identity.
    pub key: MembershipKey,
    /// Stored role column, possibly still holding legacy global ids.
    pub roles: String,
    /// Stored scheme flags.
    pub flags: SchemeFlags,
    /// Parent team's scheme defaults at the membership level.
    pub team_scheme_defaults: SchemeDefaults,
    /// Channel's own scheme defaults. Always empty for team memberships.
    pub channel_scheme_defaults: SchemeDefaults,
}

impl MembershipRecord {
    /// Returns the resolution context for this row.
    #[must_use]
    pub fn context(&self) -> ResolutionContext<'_> {
        ResolutionContext {
            scope: self.scope,
            team_scheme: &self.team_scheme_defaults,
            channel_scheme: &self.channel_scheme_defaults,
        }
    }

    /// Runs the stored columns through [`resolve_roles`].
    #[must_use]
    pub fn resolve(&self) -> ResolvedRoles {
        resolve_roles(self.roles.split_whitespace(), self.flags, &self.context())
    }

    /// Returns the hydrated membership.
    #[must_use]
    pub fn hydrate(&self) -> Membership {
        let resolved = self.resolve();
        Membership {
            scope: self.scope,
            parent_id: self.key.parent_id.clone(),
            principal_id: self.key.principal_id.clone(),
            roles: resolved.roles_string(),
            explicit_roles: resolved.explicit_roles_string(),
            scheme_guest: resolved.flags.guest,
            scheme_user: resolved.flags.user,
            scheme_admin: resolved.flags.admin,
        }
    }
}

/// Hydrated channel or team membership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    /// Membership kind.
    pub scope: MembershipScope,
    /// Team or channel id.
    pub parent_id: String,
    /// User id.
    pub principal_id: String,
    /// Effective roles, derived on every read.
    pub roles: String,
    /// Roles granted outside the scheme flags.
    pub explicit_roles: String,
    /// Member holds the scheme guest slot.
    pub scheme_guest: bool,
    /// Member holds the scheme user slot.
    pub scheme_user: bool,
    /// Member holds the scheme admin slot.
    pub scheme_admin: bool,
}

/// Write model for a membership's role columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipUpdate {
    /// Membership kind.
    pub scope: MembershipScope,
    /// Row identity.
    pub key: MembershipKey,
    /// Explicit roles to persist, never containing scheme-implied names.
    pub explicit_roles: String,
    /// Scheme flags to persist.
    pub flags: SchemeFlags,
}
