use huddle_domain::make_default_roles;
use tracing::warn;

use super::*;

impl PermissionMigrationService {
    /// Seeds the built-in roles, overwriting stored copies that drifted, then
    /// folds `AllowEditPost = always` into an unlimited edit window.
    ///
    /// Every role is attempted even after a failure. The settings change only
    /// happens once all roles are persisted.
    pub async fn do_advanced_permissions_migration(&self) -> AppResult<()> {
        let mut failed_roles: Vec<String> = Vec::new();

        for role in make_default_roles().into_values() {
            let error = match self.roles.save(role.clone()).await {
                Ok(_) => continue,
                Err(error) => error,
            };

            if !matches!(error, StoreError::Conflict { .. }) {
                error!(role = %role.name, %error, "failed to create default role");
                failed_roles.push(role.name);
                continue;
            }

            let existing = match self.roles.get_by_name(&role.name).await {
                Ok(existing) => existing,
                Err(error) => {
                    error!(role = %role.name, %error, "failed to load existing default role");
                    failed_roles.push(role.name);
                    continue;
                }
            };

            if !existing.differs_from(&role) {
                continue;
            }

            let mut refreshed = role;
            refreshed.id = existing.id;
            refreshed.create_at = existing.create_at;
            let name = refreshed.name.clone();
            if let Err(error) = self.roles.save(refreshed).await {
                error!(role = %name, %error, "failed to refresh default role");
                failed_roles.push(name);
            }
        }

        if !failed_roles.is_empty() {
            return Err(AppError::internal(
                "DoAdvancedPermissionsMigration",
                "app.role.save.app_error",
                format!("default roles not persisted: {}", failed_roles.join(", ")),
            ));
        }

        let mut settings = self.config.post_edit_settings().await.map_err(|error| {
            AppError::from_store("DoAdvancedPermissionsMigration", "app.config.get.app_error", error)
        })?;

        if settings.retire_allow_edit_post() {
            if let Err(error) = self.config.save_post_edit_settings(settings).await {
                warn!(%error, "failed to retire AllowEditPost, leaving the old edit limit in place");
            } else {
                info!("replaced AllowEditPost=always with an unlimited PostEditTimeLimit");
            }
        }

        Ok(())
    }
}
