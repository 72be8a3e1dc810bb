use huddle_domain::clean_role_names;

use super::*;

impl RoleService {
    /// Returns one role by id with higher-scoped permissions merged in.
    pub async fn get_role(&self, role_id: &str) -> AppResult<Role> {
        let role = self
            .repository
            .get(role_id)
            .await
            .map_err(|error| AppError::from_store("GetRole", "app.role.get.app_error", error))?;

        self.merged_one(role).await
    }

    /// Returns one role by name with higher-scoped permissions merged in.
    pub async fn get_role_by_name(&self, name: &str) -> AppResult<Role> {
        let role = self.repository.get_by_name(name).await.map_err(|error| {
            AppError::from_store("GetRoleByName", "app.role.get_by_name.app_error", error)
        })?;

        self.merged_one(role).await
    }

    /// Returns the listed roles with higher-scoped permissions merged in.
    /// Unknown names are skipped.
    pub async fn get_roles_by_names(&self, names: &[String]) -> AppResult<Vec<Role>> {
        let mut roles = self.repository.get_by_names(names).await.map_err(|error| {
            AppError::from_store("GetRolesByNames", "app.role.get_by_names.app_error", error)
        })?;

        self.merge_channel_higher_scoped_permissions(&mut roles)
            .await?;
        Ok(roles)
    }

    /// Returns every role with higher-scoped permissions merged in.
    pub async fn get_all_roles(&self) -> AppResult<Vec<Role>> {
        let mut roles = self
            .repository
            .get_all()
            .await
            .map_err(|error| AppError::from_store("GetAllRoles", "app.role.get_all.app_error", error))?;

        self.merge_channel_higher_scoped_permissions(&mut roles)
            .await?;
        Ok(roles)
    }

    /// Ensures every listed role name exists.
    pub async fn check_roles_exist<S: AsRef<str>>(&self, names: &[S]) -> AppResult<()> {
        let names = clean_role_names(names)?;
        let roles = self.get_roles_by_names(&names).await?;

        if let Some(missing) = names
            .iter()
            .find(|name| !roles.iter().any(|role| &role.name == *name))
        {
            return Err(AppError::invalid_input(
                "CheckRolesExist",
                "app.role.check_roles_exist.role_not_found",
                format!("role '{missing}' does not exist"),
            ));
        }

        Ok(())
    }

    pub(super) async fn merged_one(&self, role: Role) -> AppResult<Role> {
        let mut roles = vec![role];
        self.merge_channel_higher_scoped_permissions(&mut roles)
            .await?;

        roles.pop().ok_or_else(|| {
            AppError::internal("GetRole", "app.role.get.app_error", "merge dropped the role")
        })
    }
}
