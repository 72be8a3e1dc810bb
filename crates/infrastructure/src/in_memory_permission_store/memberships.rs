use std::ops::Bound;

use huddle_domain::SchemeDefaults;

use super::*;

impl StoreState {
    fn team_scheme(&self, team_id: Option<&String>) -> Option<&Scheme> {
        let scheme_id = team_id.and_then(|team_id| self.teams.get(team_id))?;
        self.live_scheme(scheme_id.as_ref())
    }

    fn member_record(
        &self,
        scope: MembershipScope,
        key: &MembershipKey,
        columns: &MemberColumns,
    ) -> MembershipRecord {
        let (team_scheme, channel_scheme) = match scope {
            MembershipScope::Team => (self.team_scheme(Some(&key.parent_id)), None),
            MembershipScope::Channel => {
                let channel = self.channels.get(&key.parent_id);
                (
                    self.team_scheme(channel.and_then(|channel| channel.team_id.as_ref())),
                    self.live_scheme(channel.and_then(|channel| channel.scheme_id.as_ref())),
                )
            }
        };

        MembershipRecord {
            scope,
            key: key.clone(),
            roles: columns.roles.clone(),
            flags: columns.flags,
            team_scheme_defaults: SchemeDefaults::for_scope(team_scheme, scope),
            channel_scheme_defaults: SchemeDefaults::for_scope(channel_scheme, scope),
        }
    }
}

#[async_trait]
impl MembershipRepository for InMemoryPermissionStore {
    async fn get_member(
        &self,
        scope: MembershipScope,
        key: &MembershipKey,
    ) -> StoreResult<MembershipRecord> {
        let state = self.state.read().await;

        state
            .members(scope)
            .get(key)
            .map(|columns| state.member_record(scope, key, columns))
            .ok_or_else(|| {
                StoreError::not_found("Member", format!("{}:{}", key.parent_id, key.principal_id))
            })
    }

    async fn list_members_after(
        &self,
        scope: MembershipScope,
        after: Option<&MembershipKey>,
        limit: usize,
    ) -> StoreResult<Vec<MembershipRecord>> {
        let state = self.state.read().await;
        let lower = after.map_or(Bound::Unbounded, Bound::Excluded);

        Ok(state
            .members(scope)
            .range((lower, Bound::Unbounded))
            .take(limit)
            .map(|(key, columns)| state.member_record(scope, key, columns))
            .collect())
    }

    async fn update_member(&self, update: MembershipUpdate) -> StoreResult<()> {
        let mut state = self.state.write().await;

        let columns = state
            .members_mut(update.scope)
            .get_mut(&update.key)
            .ok_or_else(|| {
                StoreError::not_found(
                    "Member",
                    format!("{}:{}", update.key.parent_id, update.key.principal_id),
                )
            })?;

        columns.roles = update.explicit_roles;
        columns.flags = update.flags;
        Ok(())
    }
}
