use std::collections::BTreeSet;

use huddle_domain::Permission;

use super::*;

impl RoleService {
    /// Replaces the permission set of a role.
    ///
    /// Every permission must exist in the catalog. Name and built-in status
    /// never change through a patch.
    pub async fn patch_role(&self, role_id: &str, permissions: Vec<String>) -> AppResult<Role> {
        if let Some(unknown) = permissions
            .iter()
            .find(|permission| Permission::from_id(permission).is_none())
        {
            return Err(AppError::invalid_input(
                "PatchRole",
                "app.role.save.invalid_role.app_error",
                format!("unknown permission '{unknown}'"),
            ));
        }

        let mut role = self
            .repository
            .get(role_id)
            .await
            .map_err(|error| AppError::from_store("PatchRole", "app.role.get.app_error", error))?;

        role.permissions = permissions.into_iter().collect::<BTreeSet<_>>();
        role.validate()?;

        let saved = self
            .repository
            .save(role)
            .await
            .map_err(|error| AppError::from_store("PatchRole", "app.role.save.app_error", error))?;

        self.merged_one(saved).await
    }
}
