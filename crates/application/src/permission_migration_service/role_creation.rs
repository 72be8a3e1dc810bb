use huddle_domain::make_default_roles;

use super::*;

impl PermissionMigrationService {
    /// Creates the listed built-in roles that do not exist yet.
    pub async fn create_missing_roles(&self, names: &[&str]) -> AppResult<()> {
        let defaults = make_default_roles();

        for name in names {
            match self.roles.get_by_name(name).await {
                Ok(_) => continue,
                Err(StoreError::NotFound { .. }) => {}
                Err(error) => {
                    return Err(AppError::from_store(
                        "CreateMissingRoles",
                        "app.role.get_by_name.app_error",
                        error,
                    ));
                }
            }

            let role = defaults.get(*name).cloned().ok_or_else(|| {
                AppError::internal(
                    "CreateMissingRoles",
                    "app.role.save.invalid_role.app_error",
                    format!("'{name}' is not a built-in role"),
                )
            })?;

            self.roles.save(role).await.map_err(|error| {
                AppError::from_store("CreateMissingRoles", "app.role.save.insert.app_error", error)
            })?;
            info!(role = %name, "created built-in role");
        }

        Ok(())
    }
}
