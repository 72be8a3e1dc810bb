use huddle_core::new_id;
use huddle_domain::{SCHEME_DEFAULT_ROLE_NAMES, SchemePatch};

use super::*;

impl SchemeService {
    /// Creates a scheme and clones its backing roles from the system defaults.
    ///
    /// Caller-supplied ids, timestamps and role slots are discarded. The scheme
    /// and all backing roles are written atomically.
    pub async fn create_scheme(&self, scheme: Scheme) -> AppResult<Scheme> {
        self.is_phase_2_migration_completed().await?;

        let mut scheme = scheme;
        scheme.clear_trusted_fields();
        if scheme.name.is_empty() {
            scheme.name = new_id();
        }

        let default_names: Vec<String> = SCHEME_DEFAULT_ROLE_NAMES
            .iter()
            .map(|name| (*name).to_owned())
            .collect();
        let defaults = self.roles.get_by_names(&default_names).await.map_err(|error| {
            AppError::from_store("CreateScheme", "app.role.get_by_names.app_error", error)
        })?;

        if defaults.len() != default_names.len() {
            return Err(AppError::internal(
                "CreateScheme",
                "app.scheme.save.retrieving_default_scheme_roles.app_error",
                format!(
                    "expected {} default roles, found {}",
                    default_names.len(),
                    defaults.len()
                ),
            ));
        }

        let backing_roles = scheme.derive_backing_roles(&defaults, new_id)?;

        scheme.validate_for_create().map_err(|error| {
            AppError::invalid_input(
                "CreateScheme",
                "app.scheme.save.invalid_scheme.app_error",
                error.detail(),
            )
        })?;
        for role in &backing_roles {
            role.validate_without_id().map_err(|error| {
                AppError::invalid_input(
                    "CreateScheme",
                    "app.role.save.invalid_role.app_error",
                    error.detail(),
                )
            })?;
        }

        self.schemes
            .save_new(scheme, backing_roles)
            .await
            .map_err(|error| AppError::from_store("CreateScheme", "app.scheme.save.app_error", error))
    }

    /// Returns one scheme by id.
    pub async fn get_scheme(&self, scheme_id: &str) -> AppResult<Scheme> {
        self.is_phase_2_migration_completed().await?;

        self.schemes
            .get(scheme_id)
            .await
            .map_err(|error| AppError::from_store("GetScheme", "app.scheme.get.app_error", error))
    }

    /// Returns one scheme by name.
    pub async fn get_scheme_by_name(&self, name: &str) -> AppResult<Scheme> {
        self.is_phase_2_migration_completed().await?;

        self.schemes.get_by_name(name).await.map_err(|error| {
            AppError::from_store("GetSchemeByName", "app.scheme.get.app_error", error)
        })
    }

    /// Persists an edited scheme. Role slots are stored as supplied but must
    /// name existing roles.
    pub async fn update_scheme(&self, scheme: Scheme) -> AppResult<Scheme> {
        self.is_phase_2_migration_completed().await?;

        scheme.validate().map_err(|error| {
            AppError::invalid_input(
                "UpdateScheme",
                "app.scheme.save.invalid_scheme.app_error",
                error.detail(),
            )
        })?;

        let existing = self
            .schemes
            .get(&scheme.id)
            .await
            .map_err(|error| AppError::from_store("UpdateScheme", "app.scheme.get.app_error", error))?;

        if existing.scope != scheme.scope {
            return Err(AppError::invalid_input(
                "UpdateScheme",
                "app.scheme.save.invalid_scheme.app_error",
                format!(
                    "scheme scope cannot change from '{}' to '{}'",
                    existing.scope.as_str(),
                    scheme.scope.as_str()
                ),
            ));
        }

        self.ensure_roles_exist(&scheme).await?;

        let mut scheme = scheme;
        scheme.create_at = existing.create_at;

        self.schemes
            .save(scheme)
            .await
            .map_err(|error| AppError::from_store("UpdateScheme", "app.scheme.save.app_error", error))
    }

    /// Applies an admin patch to a stored scheme.
    pub async fn patch_scheme(&self, scheme_id: &str, patch: SchemePatch) -> AppResult<Scheme> {
        let mut scheme = self.get_scheme(scheme_id).await?;
        patch.apply(&mut scheme);
        self.update_scheme(scheme).await
    }

    /// Soft-deletes a scheme and its backing roles.
    pub async fn delete_scheme(&self, scheme_id: &str) -> AppResult<Scheme> {
        self.is_phase_2_migration_completed().await?;

        self.schemes.delete(scheme_id).await.map_err(|error| {
            AppError::from_store("DeleteScheme", "app.scheme.delete.app_error", error)
        })
    }

    async fn ensure_roles_exist(&self, scheme: &Scheme) -> AppResult<()> {
        let names = scheme.role_names();
        let roles = self.roles.get_by_names(&names).await.map_err(|error| {
            AppError::from_store("UpdateScheme", "app.role.get_by_names.app_error", error)
        })?;

        match names
            .iter()
            .find(|name| !roles.iter().any(|role| &role.name == *name))
        {
            Some(missing) => Err(AppError::not_found(
                "UpdateScheme",
                "app.scheme.save.role_not_found.app_error",
                format!("role '{missing}' referenced by scheme '{}' does not exist", scheme.id),
            )),
            None => Ok(()),
        }
    }
}
