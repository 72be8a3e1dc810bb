use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::role::Role;

/// Working permission state of every role during one migration, keyed by role name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RolePermissionMap {
    roles: HashMap<String, BTreeMap<String, bool>>,
}

impl RolePermissionMap {
    /// Snapshots the permissions of `roles`.
    pub fn from_roles<'a>(roles: impl IntoIterator<Item = &'a Role>) -> Self {
        let roles = roles
            .into_iter()
            .map(|role| {
                let permissions = role
                    .permissions
                    .iter()
                    .map(|permission| (permission.clone(), true))
                    .collect();
                (role.name.clone(), permissions)
            })
            .collect();

        Self { roles }
    }

    /// Returns whether `role_name` currently grants `permission`.
    #[must_use]
    pub fn is_set(&self, role_name: &str, permission: &str) -> bool {
        self.roles
            .get(role_name)
            .and_then(|permissions| permissions.get(permission))
            .copied()
            .unwrap_or(false)
    }

    /// Grants or revokes `permission` on `role_name`.
    pub fn set(&mut self, role_name: &str, permission: &str, granted: bool) {
        self.roles
            .entry(role_name.to_owned())
            .or_default()
            .insert(permission.to_owned(), granted);
    }

    /// Returns the permissions currently granted to `role_name`.
    #[must_use]
    pub fn granted(&self, role_name: &str) -> BTreeSet<String> {
        self.roles
            .get(role_name)
            .map(|permissions| {
                permissions
                    .iter()
                    .filter(|(_, granted)| **granted)
                    .map(|(permission, _)| permission.clone())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Predicate deciding whether a transformation applies to a role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum RoleCondition {
    /// Matches every role.
    Always,
    /// Matches the role with this name.
    RoleNameEquals(String),
    /// Matches roles whose display name contains the text.
    DisplayNameContains(String),
    /// Matches roles currently granting the permission.
    PermissionIsSet(String),
    /// Matches scheme-managed roles.
    SchemeManaged,
    /// Matches when another role currently grants a permission.
    OtherRoleHasPermission {
        /// Name of the role to inspect.
        role_name: String,
        /// Permission to look for.
        permission: String,
    },
    /// Matches when every inner condition matches.
    All(Vec<RoleCondition>),
    /// Matches when any inner condition matches.
    Any(Vec<RoleCondition>),
    /// Inverts the inner condition.
    Not(Box<RoleCondition>),
}

impl RoleCondition {
    /// Shorthand for [`RoleCondition::RoleNameEquals`].
    pub fn is_role(name: impl Into<String>) -> Self {
        Self::RoleNameEquals(name.into())
    }

    /// Shorthand for [`RoleCondition::PermissionIsSet`].
    pub fn has_permission(permission: impl Into<String>) -> Self {
        Self::PermissionIsSet(permission.into())
    }

    /// Shorthand for [`RoleCondition::Not`].
    #[must_use]
    pub fn negate(condition: RoleCondition) -> Self {
        Self::Not(Box::new(condition))
    }

    /// Evaluates the condition against a role and the current working state.
    #[must_use]
    pub fn evaluate(&self, role: &Role, role_map: &RolePermissionMap) -> bool {
        match self {
            Self::Always => true,
            Self::RoleNameEquals(name) => role.name == *name,
            Self::DisplayNameContains(text) => role.display_name.contains(text.as_str()),
            Self::PermissionIsSet(permission) => role_map.is_set(&role.name, permission),
            Self::SchemeManaged => role.scheme_managed,
            Self::OtherRoleHasPermission {
                role_name,
                permission,
            } => role_map.is_set(role_name, permission),
            Self::All(conditions) => conditions
                .iter()
                .all(|condition| condition.evaluate(role, role_map)),
            Self::Any(conditions) => conditions
                .iter()
                .any(|condition| condition.evaluate(role, role_map)),
            Self::Not(condition) => !condition.evaluate(role, role_map),
        }
    }
}

/// One conditional edit of a role's permission set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionTransformation {
    /// Roles the edit applies to.
    pub on: RoleCondition,
    /// Permissions granted when the condition matches.
    pub add: Vec<String>,
    /// Permissions revoked when the condition matches.
    pub remove: Vec<String>,
}

impl PermissionTransformation {
    /// Creates a transformation that only grants.
    pub fn grant<I, P>(on: RoleCondition, add: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        Self {
            on,
            add: add.into_iter().map(Into::into).collect(),
            remove: Vec::new(),
        }
    }

    /// Creates a transformation that only revokes.
    pub fn revoke<I, P>(on: RoleCondition, remove: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        Self {
            on,
            add: Vec::new(),
            remove: remove.into_iter().map(Into::into).collect(),
        }
    }

    /// Creates a transformation that replaces permissions.
    pub fn replace<A, R, P>(on: RoleCondition, add: A, remove: R) -> Self
    where
        A: IntoIterator<Item = P>,
        R: IntoIterator<Item = P>,
        P: Into<String>,
    {
        Self {
            on,
            add: add.into_iter().map(Into::into).collect(),
            remove: remove.into_iter().map(Into::into).collect(),
        }
    }
}

/// Ordered transformations making up one migration.
pub type PermissionsMap = Vec<PermissionTransformation>;

/// Applies every transformation of `permissions_map` to `role`, updating the
/// shared working state, and returns the role's resulting permission set.
pub fn apply_permissions_map(
    role: &Role,
    role_map: &mut RolePermissionMap,
    permissions_map: &[PermissionTransformation],
) -> BTreeSet<String> {
    for transformation in permissions_map {
        if !transformation.on.evaluate(role, role_map) {
            continue;
        }

        for permission in &transformation.add {
            role_map.set(&role.name, permission, true);
        }
        for permission in &transformation.remove {
            role_map.set(&role.name, permission, false);
        }
    }

    role_map.granted(&role.name)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use proptest::prelude::*;

    use super::{PermissionTransformation, RoleCondition, RolePermissionMap, apply_permissions_map};
    use crate::role::Role;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|item| (*item).to_owned()).collect()
    }

    #[test]
    fn always_add_and_remove_is_idempotent() {
        let role = Role::new("r", "R", ["a"]);
        let map = vec![PermissionTransformation::replace(
            RoleCondition::Always,
            ["b"],
            ["a"],
        )];

        let mut role_map = RolePermissionMap::from_roles([&role]);
        let first = apply_permissions_map(&role, &mut role_map, &map);
        assert_eq!(first, set(&["b"]));

        let migrated = Role {
            permissions: first.clone(),
            ..role
        };
        let mut role_map = RolePermissionMap::from_roles([&migrated]);
        let second = apply_permissions_map(&migrated, &mut role_map, &map);
        assert_eq!(second, first);
    }

    #[test]
    fn conditions_see_edits_made_earlier_in_the_same_run() {
        let team_user = Role::new("team_user", "Team User", ["manage_public_channel_properties"]);
        let channel_user = Role::new("channel_user", "Channel User", Vec::<String>::new());
        let map = vec![PermissionTransformation::grant(
            RoleCondition::All(vec![
                RoleCondition::is_role("channel_user"),
                RoleCondition::OtherRoleHasPermission {
                    role_name: "team_user".to_owned(),
                    permission: "manage_public_channel_properties".to_owned(),
                },
            ]),
            ["manage_public_channel_properties"],
        )];

        let mut role_map = RolePermissionMap::from_roles([&team_user, &channel_user]);

        assert_eq!(
            apply_permissions_map(&team_user, &mut role_map, &map),
            set(&["manage_public_channel_properties"])
        );
        assert_eq!(
            apply_permissions_map(&channel_user, &mut role_map, &map),
            set(&["manage_public_channel_properties"])
        );
    }

    #[test]
    fn negation_and_display_name_conditions() {
        let mut guest = Role::new("abc", "Channel Guest Role for Scheme s", ["create_post"]);
        guest.scheme_managed = true;
        let user = Role::new("def", "Channel User Role for Scheme s", ["create_post"]);

        let condition = RoleCondition::All(vec![
            RoleCondition::negate(RoleCondition::DisplayNameContains(
                "Channel Guest Role for Scheme".to_owned(),
            )),
            RoleCondition::Any(vec![
                RoleCondition::has_permission("create_post"),
                RoleCondition::has_permission("create_post_public"),
            ]),
        ]);

        let role_map = RolePermissionMap::from_roles([&guest, &user]);
        assert!(!condition.evaluate(&guest, &role_map));
        assert!(condition.evaluate(&user, &role_map));
        assert!(RoleCondition::SchemeManaged.evaluate(&guest, &role_map));
    }

    fn permission() -> impl Strategy<Value = String> {
        prop::sample::select(vec!["a", "b", "c", "d"]).prop_map(str::to_owned)
    }

    fn transformation() -> impl Strategy<Value = PermissionTransformation> {
        (
            prop::option::of(permission()),
            prop::collection::vec(permission(), 0..3),
            prop::collection::vec(permission(), 0..3),
        )
            .prop_map(|(guard, add, remove)| PermissionTransformation {
                on: guard.map_or(RoleCondition::Always, RoleCondition::PermissionIsSet),
                add,
                remove,
            })
    }

    proptest! {
        #[test]
        fn single_transformations_are_idempotent(
            start in prop::collection::btree_set(permission(), 0..4),
            transformation in transformation(),
        ) {
            let map = vec![transformation];
            let role = Role::new("r", "R", start);

            let mut role_map = RolePermissionMap::from_roles([&role]);
            let first = apply_permissions_map(&role, &mut role_map, &map);

            let migrated = Role { permissions: first.clone(), ..role };
            let mut role_map = RolePermissionMap::from_roles([&migrated]);
            let second = apply_permissions_map(&migrated, &mut role_map, &map);

            prop_assert_eq!(second, first);
        }
    }
}
