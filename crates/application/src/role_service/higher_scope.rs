use super::*;

impl RoleService {
    /// Recomputes the channel permissions of roles backing a live channel
    /// scheme from the scope above them. Other roles are left as stored.
    ///
    /// Issues at most one store lookup. Any store error fails the whole batch.
    pub async fn merge_channel_higher_scoped_permissions(&self, roles: &mut [Role]) -> AppResult<()> {
        let scheme_managed: Vec<String> = roles
            .iter()
            .filter(|role| role.scheme_managed)
            .map(|role| role.name.clone())
            .collect();

        if scheme_managed.is_empty() {
            return Ok(());
        }

        let higher_scoped = self
            .repository
            .channel_higher_scoped_permissions(&scheme_managed)
            .await
            .map_err(|error| {
                AppError::from_store(
                    "MergeChannelHigherScopedPermissions",
                    "app.role.get_by_names.app_error",
                    error,
                )
            })?;

        for role in roles.iter_mut() {
            if let Some(higher) = higher_scoped.get(&role.name) {
                role.merge_channel_higher_scoped_permissions(higher);
            }
        }

        Ok(())
    }
}
