use super::*;

#[async_trait]
impl SchemeRepository for InMemoryPermissionStore {
    async fn get(&self, scheme_id: &str) -> StoreResult<Scheme> {
        self.state
            .read()
            .await
            .schemes
            .get(scheme_id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("Scheme", scheme_id))
    }

    async fn get_by_name(&self, name: &str) -> StoreResult<Scheme> {
        self.state
            .read()
            .await
            .schemes
            .values()
            .find(|scheme| scheme.name == name)
            .cloned()
            .ok_or_else(|| StoreError::not_found("Scheme", name))
    }

    async fn save_new(&self, mut scheme: Scheme, backing_roles: Vec<Role>) -> StoreResult<Scheme> {
        let mut state = self.state.write().await;

        if state.schemes.values().any(|stored| stored.name == scheme.name) {
            return Err(StoreError::conflict(
                "Scheme",
                format!("scheme '{}' already exists", scheme.name),
            ));
        }

        // Roll back on a failed role insert so nothing partial remains.
        let snapshot = state.roles.clone();
        for role in backing_roles {
            if let Err(error) = state.insert_role(role) {
                state.roles = snapshot;
                return Err(error);
            }
        }

        let now = now_millis();
        scheme.id = new_id();
        scheme.create_at = now;
        scheme.update_at = now;
        scheme.delete_at = 0;

        state.schemes.insert(scheme.id.clone(), scheme.clone());
        Ok(scheme)
    }

    async fn save(&self, scheme: Scheme) -> StoreResult<Scheme> {
        let mut state = self.state.write().await;

        if state
            .schemes
            .values()
            .any(|stored| stored.name == scheme.name && stored.id != scheme.id)
        {
            return Err(StoreError::conflict(
                "Scheme",
                format!("scheme '{}' already exists", scheme.name),
            ));
        }

        let stored = state
            .schemes
            .get_mut(&scheme.id)
            .filter(|stored| !stored.is_deleted())
            .ok_or_else(|| StoreError::not_found("Scheme", scheme.id.clone()))?;

        let create_at = stored.create_at;
        *stored = Scheme {
            create_at,
            update_at: now_millis(),
            delete_at: 0,
            ..scheme
        };
        Ok(stored.clone())
    }

    async fn delete(&self, scheme_id: &str) -> StoreResult<Scheme> {
        let mut state = self.state.write().await;
        let now = now_millis();

        let scheme = state
            .schemes
            .get_mut(scheme_id)
            .filter(|stored| !stored.is_deleted())
            .ok_or_else(|| StoreError::not_found("Scheme", scheme_id))?;
        scheme.delete_at = now;
        scheme.update_at = now;
        let scheme = scheme.clone();

        let role_names = scheme.role_names();
        for role in state.roles.values_mut() {
            if role_names.contains(&role.name) {
                role.delete_at = now;
                role.update_at = now;
            }
        }

        for team_scheme in state.teams.values_mut() {
            if team_scheme.as_deref() == Some(scheme_id) {
                *team_scheme = None;
            }
        }
        for channel in state.channels.values_mut() {
            if channel.scheme_id.as_deref() == Some(scheme_id) {
                channel.scheme_id = None;
            }
        }

        Ok(scheme)
    }
}
