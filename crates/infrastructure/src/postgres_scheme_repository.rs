use std::str::FromStr;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use tracing::debug;

use huddle_application::SchemeRepository;
use huddle_core::{StoreError, StoreResult, new_id, now_millis};
use huddle_domain::{Role, Scheme, SchemeScope};

use crate::postgres_role_repository::insert_role;
use crate::sqlx_errors::{map_read_error, map_write_error};

/// PostgreSQL-backed scheme store.
#[derive(Clone)]
pub struct PostgresSchemeRepository {
    pool: PgPool,
}

impl PostgresSchemeRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct SchemeRow {
    id: String,
    name: String,
    display_name: String,
    description: String,
    create_at: i64,
    update_at: i64,
    delete_at: i64,
    scope: String,
    default_team_admin_role: Option<String>,
    default_team_user_role: Option<String>,
    default_team_guest_role: Option<String>,
    default_channel_admin_role: Option<String>,
    default_channel_user_role: Option<String>,
    default_channel_guest_role: Option<String>,
}

impl TryFrom<SchemeRow> for Scheme {
    type Error = StoreError;

    fn try_from(row: SchemeRow) -> Result<Self, Self::Error> {
        let scope = SchemeScope::from_str(&row.scope)
            .map_err(|_| StoreError::invalid_input("Scheme", "scope", row.scope.clone()))?;

        Ok(Self {
            id: row.id,
            name: row.name,
            display_name: row.display_name,
            description: row.description,
            create_at: row.create_at,
            update_at: row.update_at,
            delete_at: row.delete_at,
            scope,
            default_team_admin_role: row.default_team_admin_role,
            default_team_user_role: row.default_team_user_role,
            default_team_guest_role: row.default_team_guest_role,
            default_channel_admin_role: row.default_channel_admin_role,
            default_channel_user_role: row.default_channel_user_role,
            default_channel_guest_role: row.default_channel_guest_role,
        })
    }
}

const SCHEME_COLUMNS: &str = "id, name, display_name, description, create_at, update_at, delete_at, \
     scope, default_team_admin_role, default_team_user_role, default_team_guest_role, \
     default_channel_admin_role, default_channel_user_role, default_channel_guest_role";

#[async_trait]
impl SchemeRepository for PostgresSchemeRepository {
    async fn get(&self, scheme_id: &str) -> StoreResult<Scheme> {
        sqlx::query_as::<_, SchemeRow>(&format!(
            "SELECT {SCHEME_COLUMNS} FROM schemes WHERE id = $1"
        ))
        .bind(scheme_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| map_read_error(error, "failed to load scheme"))?
        .ok_or_else(|| StoreError::not_found("Scheme", scheme_id))
        .and_then(Scheme::try_from)
    }

    async fn get_by_name(&self, name: &str) -> StoreResult<Scheme> {
        sqlx::query_as::<_, SchemeRow>(&format!(
            "SELECT {SCHEME_COLUMNS} FROM schemes WHERE name = $1"
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| map_read_error(error, "failed to load scheme by name"))?
        .ok_or_else(|| StoreError::not_found("Scheme", name))
        .and_then(Scheme::try_from)
    }

    async fn save_new(&self, mut scheme: Scheme, backing_roles: Vec<Role>) -> StoreResult<Scheme> {
        let mut transaction = self
            .pool
            .begin()
            .await
            .map_err(|error| map_read_error(error, "failed to begin transaction"))?;

        for role in backing_roles {
            insert_role(&mut *transaction, role).await?;
        }

        let now = now_millis();
        scheme.id = new_id();
        scheme.create_at = now;
        scheme.update_at = now;
        scheme.delete_at = 0;

        sqlx::query(
            r#"
            INSERT INTO schemes (
                id, name, display_name, description, create_at, update_at, delete_at, scope,
                default_team_admin_role, default_team_user_role, default_team_guest_role,
                default_channel_admin_role, default_channel_user_role, default_channel_guest_role
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(&scheme.id)
        .bind(&scheme.name)
        .bind(&scheme.display_name)
        .bind(&scheme.description)
        .bind(scheme.create_at)
        .bind(scheme.update_at)
        .bind(scheme.delete_at)
        .bind(scheme.scope.as_str())
        .bind(&scheme.default_team_admin_role)
        .bind(&scheme.default_team_user_role)
        .bind(&scheme.default_team_guest_role)
        .bind(&scheme.default_channel_admin_role)
        .bind(&scheme.default_channel_user_role)
        .bind(&scheme.default_channel_guest_role)
        .execute(&mut *transaction)
        .await
        .map_err(|error| map_write_error(error, "Scheme", "failed to insert scheme"))?;

        transaction
            .commit()
            .await
            .map_err(|error| map_read_error(error, "failed to commit transaction"))?;

        Ok(scheme)
    }

    async fn save(&self, scheme: Scheme) -> StoreResult<Scheme> {
        let row = sqlx::query_as::<_, SchemeRow>(&format!(
            r#"
            UPDATE schemes
            SET name = $2,
                display_name = $3,
                description = $4,
                update_at = $5,
                default_team_admin_role = $6,
                default_team_user_role = $7,
                default_team_guest_role = $8,
                default_channel_admin_role = $9,
                default_channel_user_role = $10,
                default_channel_guest_role = $11
            WHERE id = $1
                AND delete_at = 0
            RETURNING {SCHEME_COLUMNS}
            "#
        ))
        .bind(&scheme.id)
        .bind(&scheme.name)
        .bind(&scheme.display_name)
        .bind(&scheme.description)
        .bind(now_millis())
        .bind(&scheme.default_team_admin_role)
        .bind(&scheme.default_team_user_role)
        .bind(&scheme.default_team_guest_role)
        .bind(&scheme.default_channel_admin_role)
        .bind(&scheme.default_channel_user_role)
        .bind(&scheme.default_channel_guest_role)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| map_write_error(error, "Scheme", "failed to update scheme"))?;

        row.ok_or_else(|| StoreError::not_found("Scheme", scheme.id))
            .and_then(Scheme::try_from)
    }

    async fn delete(&self, scheme_id: &str) -> StoreResult<Scheme> {
        let mut transaction = self
            .pool
            .begin()
            .await
            .map_err(|error| map_read_error(error, "failed to begin transaction"))?;
        let now = now_millis();

        let scheme = sqlx::query_as::<_, SchemeRow>(&format!(
            r#"
            UPDATE schemes
            SET delete_at = $2,
                update_at = $2
            WHERE id = $1
                AND delete_at = 0
            RETURNING {SCHEME_COLUMNS}
            "#
        ))
        .bind(scheme_id)
        .bind(now)
        .fetch_optional(&mut *transaction)
        .await
        .map_err(|error| map_write_error(error, "Scheme", "failed to delete scheme"))?
        .ok_or_else(|| StoreError::not_found("Scheme", scheme_id))
        .and_then(Scheme::try_from)?;

        sqlx::query(
            r#"
            UPDATE roles
            SET delete_at = $2,
                update_at = $2
            WHERE name = ANY($1)
            "#,
        )
        .bind(scheme.role_names())
        .bind(now)
        .execute(&mut *transaction)
        .await
        .map_err(|error| map_write_error(error, "Role", "failed to delete scheme roles"))?;

        let detached_teams = sqlx::query("UPDATE teams SET scheme_id = NULL WHERE scheme_id = $1")
            .bind(scheme_id)
            .execute(&mut *transaction)
            .await
            .map_err(|error| map_write_error(error, "Team", "failed to detach teams"))?
            .rows_affected();

        let detached_channels =
            sqlx::query("UPDATE channels SET scheme_id = NULL WHERE scheme_id = $1")
                .bind(scheme_id)
                .execute(&mut *transaction)
                .await
                .map_err(|error| map_write_error(error, "Channel", "failed to detach channels"))?
                .rows_affected();

        transaction
            .commit()
            .await
            .map_err(|error| map_read_error(error, "failed to commit transaction"))?;

        debug!(scheme_id, detached_teams, detached_channels, "scheme deleted");
        Ok(scheme)
    }
}

#[cfg(test)]
mod tests;
