use huddle_domain::{SchemeRoleSlot, SchemeScope};

use super::*;

impl StoreState {
    pub(super) fn insert_role(&mut self, mut role: Role) -> StoreResult<Role> {
        role.validate_without_id()
            .map_err(|error| StoreError::invalid_input("Role", "role", error.detail()))?;

        if self.role_by_name(&role.name).is_some() {
            return Err(StoreError::conflict(
                "Role",
                format!("role '{}' already exists", role.name),
            ));
        }

        let now = now_millis();
        role.id = new_id();
        role.create_at = now;
        role.update_at = now;
        role.delete_at = 0;
        self.roles.insert(role.id.clone(), role.clone());
        Ok(role)
    }

    fn higher_scoped_defaults(&self, channel_scheme_id: &str) -> [String; 3] {
        let team_scheme = self
            .channels
            .values()
            .filter(|channel| channel.scheme_id.as_deref() == Some(channel_scheme_id))
            .find_map(|channel| {
                let team_scheme_id = channel
                    .team_id
                    .as_ref()
                    .and_then(|team_id| self.teams.get(team_id))?;
                self.live_scheme(team_scheme_id.as_ref())
            });

        [SchemeRoleSlot::Guest, SchemeRoleSlot::User, SchemeRoleSlot::Admin].map(|slot| {
            team_scheme
                .and_then(|scheme| scheme.default_role(SchemeScope::Channel, slot))
                .unwrap_or_else(|| SchemeScope::Channel.system_default_role(slot))
                .to_owned()
        })
    }
}

#[async_trait]
impl RoleRepository for InMemoryPermissionStore {
    async fn get(&self, role_id: &str) -> StoreResult<Role> {
        self.state
            .read()
            .await
            .roles
            .get(role_id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("Role", role_id))
    }

    async fn get_by_name(&self, name: &str) -> StoreResult<Role> {
        self.state
            .read()
            .await
            .role_by_name(name)
            .cloned()
            .ok_or_else(|| StoreError::not_found("Role", name))
    }

    async fn get_by_names(&self, names: &[String]) -> StoreResult<Vec<Role>> {
        let state = self.state.read().await;
        let mut roles: Vec<Role> = state
            .roles
            .values()
            .filter(|role| names.contains(&role.name))
            .cloned()
            .collect();
        roles.sort_by(|left, right| left.name.cmp(&right.name));
        Ok(roles)
    }

    async fn get_all(&self) -> StoreResult<Vec<Role>> {
        let state = self.state.read().await;
        let mut roles: Vec<Role> = state.roles.values().cloned().collect();
        roles.sort_by(|left, right| left.name.cmp(&right.name));
        Ok(roles)
    }

    async fn save(&self, role: Role) -> StoreResult<Role> {
        let mut state = self.state.write().await;

        if role.id.is_empty() {
            return state.insert_role(role);
        }

        role.validate()
            .map_err(|error| StoreError::invalid_input("Role", "role", error.detail()))?;

        let stored = state
            .roles
            .get_mut(&role.id)
            .ok_or_else(|| StoreError::not_found("Role", role.id.clone()))?;

        stored.display_name = role.display_name;
        stored.description = role.description;
        stored.update_at = now_millis();
        stored.delete_at = role.delete_at;
        stored.permissions = role.permissions;
        stored.scheme_managed = role.scheme_managed;
        stored.built_in = role.built_in;
        Ok(stored.clone())
    }

    async fn channel_higher_scoped_permissions(
        &self,
        role_names: &[String],
    ) -> StoreResult<HashMap<String, RolePermissions>> {
        let state = self.state.read().await;
        let mut higher_scoped = HashMap::new();

        for scheme in state
            .schemes
            .values()
            .filter(|scheme| scheme.scope == SchemeScope::Channel && !scheme.is_deleted())
        {
            let slots = [SchemeRoleSlot::Guest, SchemeRoleSlot::User, SchemeRoleSlot::Admin];
            let names = slots.map(|slot| scheme.default_role(SchemeScope::Channel, slot));
            if !names
                .iter()
                .flatten()
                .any(|name| role_names.iter().any(|wanted| wanted == *name))
            {
                continue;
            }

            let higher_names = state.higher_scoped_defaults(&scheme.id);
            let higher_roles = higher_names
                .iter()
                .map(|name| {
                    state
                        .role_by_name(name)
                        .ok_or_else(|| StoreError::not_found("Role", name.clone()))
                })
                .collect::<StoreResult<Vec<&Role>>>()?;

            for ((slot, name), higher) in slots.into_iter().zip(names).zip(higher_roles) {
                let Some(name) =
                    name.filter(|name| role_names.iter().any(|wanted| wanted == *name))
                else {
                    continue;
                };

                higher_scoped.insert(
                    name.to_owned(),
                    RolePermissions {
                        slot,
                        permissions: higher.permissions.clone(),
                    },
                );
            }
        }

        Ok(higher_scoped)
    }
}
