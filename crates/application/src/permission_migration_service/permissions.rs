use huddle_domain::{PermissionTransformation, RolePermissionMap, apply_permissions_map};

use super::*;

impl PermissionMigrationService {
    /// Applies one permissions map to every stored role.
    ///
    /// Roles are processed in store order against a shared working map, so a
    /// condition observes edits made to roles processed before it. Only roles
    /// whose permission set changed are saved. The first failed save aborts.
    pub async fn do_permissions_migration(
        &self,
        key: &str,
        permissions_map: &[PermissionTransformation],
    ) -> AppResult<()> {
        let roles = self.roles.get_all().await.map_err(|error| {
            AppError::from_store("DoPermissionsMigration", "app.role.get_all.app_error", error)
        })?;

        let mut role_map = RolePermissionMap::from_roles(&roles);
        let mut changed = 0_usize;

        for mut role in roles {
            let permissions = apply_permissions_map(&role, &mut role_map, permissions_map);
            if permissions == role.permissions {
                continue;
            }

            role.permissions = permissions;
            let name = role.name.clone();
            self.roles.save(role).await.map_err(|error| {
                let message_id = match error {
                    StoreError::InvalidInput { .. } => "app.role.save.invalid_role.app_error",
                    _ => "app.role.save.insert.app_error",
                };
                error!(migration = key, role = %name, %error, "failed to save migrated role");
                AppError::from_store("DoPermissionsMigration", message_id, error)
            })?;
            changed += 1;
        }

        info!(migration = key, changed, "permissions map applied");
        Ok(())
    }
}
