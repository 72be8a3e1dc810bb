use std::sync::Arc;

use huddle_core::{AppError, AppResult};
use huddle_domain::{
    Membership, MembershipKey, MembershipRecord, MembershipScope, MembershipUpdate, SchemeFlags,
    SchemeRoleSlot, clean_role_names, resolve_roles, split_role_string,
};

use crate::permission_ports::{MembershipRepository, RoleRepository};

/// Application service hydrating and editing team and channel memberships.
#[derive(Clone)]
pub struct MembershipService {
    memberships: Arc<dyn MembershipRepository>,
    roles: Arc<dyn RoleRepository>,
}

impl MembershipService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(memberships: Arc<dyn MembershipRepository>, roles: Arc<dyn RoleRepository>) -> Self {
        Self { memberships, roles }
    }

    /// Returns a membership with its effective roles resolved.
    pub async fn get_member(&self, scope: MembershipScope, key: &MembershipKey) -> AppResult<Membership> {
        Ok(self.load(scope, key, "GetMember").await?.hydrate())
    }

    /// Replaces a membership's roles from a space-separated role string.
    ///
    /// Names matching the membership's effective scheme defaults become
    /// flags. Every other name must be an existing role that no scheme manages.
    pub async fn update_member_roles(
        &self,
        scope: MembershipScope,
        key: &MembershipKey,
        roles: &str,
    ) -> AppResult<Membership> {
        let record = self.load(scope, key, "UpdateMemberRoles").await?;
        let context = record.context();
        let tokens = clean_role_names(&split_role_string(roles))?;

        let mut flags = SchemeFlags::default();
        let mut explicit_roles: Vec<String> = Vec::new();
        for token in tokens {
            let slot = SchemeRoleSlot::all().into_iter().find(|slot| {
                context.implied_role(*slot) == token || scope.global_role(*slot) == token
            });

            match slot {
                Some(slot) => flags.set(slot),
                None if !explicit_roles.contains(&token) => explicit_roles.push(token),
                None => {}
            }
        }

        if !flags.is_consistent() {
            return Err(AppError::invalid_input(
                "UpdateMemberRoles",
                "api.update_member_roles.guest_and_user.app_error",
                "a guest cannot also hold the user or admin scheme role",
            ));
        }

        self.ensure_assignable(&explicit_roles).await?;
        self.persist(record, explicit_roles.join(" "), flags).await
    }

    /// Sets the scheme flags of a membership, keeping its explicit roles.
    pub async fn update_member_scheme_roles(
        &self,
        scope: MembershipScope,
        key: &MembershipKey,
        flags: SchemeFlags,
    ) -> AppResult<Membership> {
        if !flags.is_consistent() {
            return Err(AppError::invalid_input(
                "UpdateMemberSchemeRoles",
                "api.update_member_scheme_roles.guest_and_user.app_error",
                "a guest cannot also hold the user or admin scheme role",
            ));
        }

        let record = self.load(scope, key, "UpdateMemberSchemeRoles").await?;
        let context = record.context();

        // Legacy global tokens must not re-raise flags the caller cleared.
        let explicit = resolve_roles(record.roles.split_whitespace(), SchemeFlags::default(), &context)
            .explicit_roles;
        let resolved = resolve_roles(explicit.iter().map(String::as_str), flags, &context);

        self.persist(record, resolved.explicit_roles_string(), resolved.flags)
            .await
    }

    async fn load(
        &self,
        scope: MembershipScope,
        key: &MembershipKey,
        operation: &'static str,
    ) -> AppResult<MembershipRecord> {
        self.memberships
            .get_member(scope, key)
            .await
            .map_err(|error| AppError::from_store(operation, "app.member.get.app_error", error))
    }

    async fn ensure_assignable(&self, names: &[String]) -> AppResult<()> {
        if names.is_empty() {
            return Ok(());
        }

        let roles = self.roles.get_by_names(names).await.map_err(|error| {
            AppError::from_store("UpdateMemberRoles", "app.role.get_by_names.app_error", error)
        })?;

        for name in names {
            match roles.iter().find(|role| &role.name == name) {
                None => {
                    return Err(AppError::not_found(
                        "UpdateMemberRoles",
                        "app.role.get_by_name.app_error",
                        format!("role '{name}' does not exist"),
                    ));
                }
                Some(role) if role.scheme_managed => {
                    return Err(AppError::invalid_input(
                        "UpdateMemberRoles",
                        "api.update_member_roles.scheme_role.app_error",
                        format!("role '{name}' is managed by a scheme"),
                    ));
                }
                Some(_) => {}
            }
        }

        Ok(())
    }

    async fn persist(
        &self,
        record: MembershipRecord,
        explicit_roles: String,
        flags: SchemeFlags,
    ) -> AppResult<Membership> {
        self.memberships
            .update_member(MembershipUpdate {
                scope: record.scope,
                key: record.key.clone(),
                explicit_roles: explicit_roles.clone(),
                flags,
            })
            .await
            .map_err(|error| {
                AppError::from_store("UpdateMemberRoles", "app.member.update.app_error", error)
            })?;

        Ok(MembershipRecord {
            roles: explicit_roles,
            flags,
            ..record
        }
        .hydrate())
    }
}

#[cfg(test)]
mod tests;
