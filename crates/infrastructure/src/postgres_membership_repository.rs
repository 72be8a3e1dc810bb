use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use huddle_application::MembershipRepository;
use huddle_core::{StoreError, StoreResult};
use huddle_domain::{
    MembershipKey, MembershipRecord, MembershipScope, MembershipUpdate, SchemeDefaults,
    SchemeFlags,
};

use crate::sqlx_errors::{map_read_error, map_write_error};

/// PostgreSQL-backed team and channel membership store.
#[derive(Clone)]
pub struct PostgresMembershipRepository {
    pool: PgPool,
}

impl PostgresMembershipRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct MembershipRow {
    parent_id: String,
    principal_id: String,
    roles: String,
    scheme_guest: bool,
    scheme_user: bool,
    scheme_admin: bool,
    team_guest_role: Option<String>,
    team_user_role: Option<String>,
    team_admin_role: Option<String>,
    channel_guest_role: Option<String>,
    channel_user_role: Option<String>,
    channel_admin_role: Option<String>,
}

impl MembershipRow {
    fn into_record(self, scope: MembershipScope) -> MembershipRecord {
        MembershipRecord {
            scope,
            key: MembershipKey::new(self.parent_id, self.principal_id),
            roles: self.roles,
            flags: SchemeFlags {
                guest: self.scheme_guest,
                user: self.scheme_user,
                admin: self.scheme_admin,
            },
            team_scheme_defaults: SchemeDefaults {
                guest: self.team_guest_role,
                user: self.team_user_role,
                admin: self.team_admin_role,
            },
            channel_scheme_defaults: SchemeDefaults {
                guest: self.channel_guest_role,
                user: self.channel_user_role,
                admin: self.channel_admin_role,
            },
        }
    }
}

const TEAM_MEMBER_SELECT: &str = r#"
    SELECT
        members.team_id AS parent_id,
        members.user_id AS principal_id,
        members.roles,
        members.scheme_guest,
        members.scheme_user,
        members.scheme_admin,
        team_schemes.default_team_guest_role AS team_guest_role,
        team_schemes.default_team_user_role AS team_user_role,
        team_schemes.default_team_admin_role AS team_admin_role,
        NULL::TEXT AS channel_guest_role,
        NULL::TEXT AS channel_user_role,
        NULL::TEXT AS channel_admin_role
    FROM team_members AS members
    INNER JOIN teams
        ON teams.id = members.team_id
    LEFT JOIN schemes AS team_schemes
        ON team_schemes.id = teams.scheme_id
"#;

const CHANNEL_MEMBER_SELECT: &str = r#"
    SELECT
        members.channel_id AS parent_id,
        members.user_id AS principal_id,
        members.roles,
        members.scheme_guest,
        members.scheme_user,
        members.scheme_admin,
        team_schemes.default_channel_guest_role AS team_guest_role,
        team_schemes.default_channel_user_role AS team_user_role,
        team_schemes.default_channel_admin_role AS team_admin_role,
        channel_schemes.default_channel_guest_role AS channel_guest_role,
        channel_schemes.default_channel_user_role AS channel_user_role,
        channel_schemes.default_channel_admin_role AS channel_admin_role
    FROM channel_members AS members
    INNER JOIN channels
        ON channels.id = members.channel_id
    LEFT JOIN teams
        ON teams.id = channels.team_id
    LEFT JOIN schemes AS team_schemes
        ON team_schemes.id = teams.scheme_id
    LEFT JOIN schemes AS channel_schemes
        ON channel_schemes.id = channels.scheme_id
"#;

fn member_select(scope: MembershipScope) -> (&'static str, &'static str) {
    match scope {
        MembershipScope::Team => (TEAM_MEMBER_SELECT, "members.team_id"),
        MembershipScope::Channel => (CHANNEL_MEMBER_SELECT, "members.channel_id"),
    }
}

fn member_table(scope: MembershipScope) -> (&'static str, &'static str) {
    match scope {
        MembershipScope::Team => ("team_members", "team_id"),
        MembershipScope::Channel => ("channel_members", "channel_id"),
    }
}

#[async_trait]
impl MembershipRepository for PostgresMembershipRepository {
    async fn get_member(
        &self,
        scope: MembershipScope,
        key: &MembershipKey,
    ) -> StoreResult<MembershipRecord> {
        let (select, parent_column) = member_select(scope);

        sqlx::query_as::<_, MembershipRow>(&format!(
            "{select} WHERE {parent_column} = $1 AND members.user_id = $2"
        ))
        .bind(&key.parent_id)
        .bind(&key.principal_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| map_read_error(error, "failed to load membership"))?
        .map(|row| row.into_record(scope))
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
        let (select, parent_column) = member_select(scope);
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let rows = sqlx::query_as::<_, MembershipRow>(&format!(
            r#"
            {select}
            WHERE $1::TEXT IS NULL
                OR ({parent_column}, members.user_id) > ($1, $2)
            ORDER BY {parent_column}, members.user_id
            LIMIT $3
            "#
        ))
        .bind(after.map(|key| key.parent_id.as_str()))
        .bind(after.map(|key| key.principal_id.as_str()))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| map_read_error(error, "failed to list memberships"))?;

        Ok(rows.into_iter().map(|row| row.into_record(scope)).collect())
    }

    async fn update_member(&self, update: MembershipUpdate) -> StoreResult<()> {
        let (table, parent_column) = member_table(update.scope);

        let rows_affected = sqlx::query(&format!(
            r#"
            UPDATE {table}
            SET roles = $3,
                scheme_guest = $4,
                scheme_user = $5,
                scheme_admin = $6
            WHERE {parent_column} = $1
                AND user_id = $2
            "#
        ))
        .bind(&update.key.parent_id)
        .bind(&update.key.principal_id)
        .bind(&update.explicit_roles)
        .bind(update.flags.guest)
        .bind(update.flags.user)
        .bind(update.flags.admin)
        .execute(&self.pool)
        .await
        .map_err(|error| map_write_error(error, "Member", "failed to update membership"))?
        .rows_affected();

        if rows_affected == 0 {
            return Err(StoreError::not_found(
                "Member",
                format!("{}:{}", update.key.parent_id, update.key.principal_id),
            ));
        }

        Ok(())
    }
}
