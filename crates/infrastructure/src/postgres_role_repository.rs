use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use huddle_application::RoleRepository;
use huddle_core::{StoreError, StoreResult, new_id, now_millis};
use huddle_domain::{Role, RolePermissions};

use crate::sqlx_errors::{map_read_error, map_write_error};

mod higher_scope;

/// PostgreSQL-backed role store.
#[derive(Clone)]
pub struct PostgresRoleRepository {
    pool: PgPool,
}

impl PostgresRoleRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct RoleRow {
    id: String,
    name: String,
    display_name: String,
    description: String,
    create_at: i64,
    update_at: i64,
    delete_at: i64,
    permissions: Vec<String>,
    scheme_managed: bool,
    built_in: bool,
}

impl From<RoleRow> for Role {
    fn from(row: RoleRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            display_name: row.display_name,
            description: row.description,
            create_at: row.create_at,
            update_at: row.update_at,
            delete_at: row.delete_at,
            permissions: row.permissions.into_iter().collect(),
            scheme_managed: row.scheme_managed,
            built_in: row.built_in,
        }
    }
}

const ROLE_COLUMNS: &str = "id, name, display_name, description, create_at, update_at, delete_at, \
     permissions, scheme_managed, built_in";

/// Inserts a role inside an open transaction or on the pool.
pub(crate) async fn insert_role<'e, E>(executor: E, mut role: Role) -> StoreResult<Role>
where
    E: sqlx::PgExecutor<'e>,
{
    role.validate_without_id()
        .map_err(|error| StoreError::invalid_input("Role", "role", error.detail()))?;

    let now = now_millis();
    role.id = new_id();
    role.create_at = now;
    role.update_at = now;
    role.delete_at = 0;

    sqlx::query(
        r#"
        INSERT INTO roles (
            id, name, display_name, description, create_at, update_at, delete_at,
            permissions, scheme_managed, built_in
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        "#,
    )
    .bind(&role.id)
    .bind(&role.name)
    .bind(&role.display_name)
    .bind(&role.description)
    .bind(role.create_at)
    .bind(role.update_at)
    .bind(role.delete_at)
    .bind(role.permissions.iter().cloned().collect::<Vec<String>>())
    .bind(role.scheme_managed)
    .bind(role.built_in)
    .execute(executor)
    .await
    .map_err(|error| map_write_error(error, "Role", "failed to insert role"))?;

    Ok(role)
}

#[async_trait]
impl RoleRepository for PostgresRoleRepository {
    async fn get(&self, role_id: &str) -> StoreResult<Role> {
        sqlx::query_as::<_, RoleRow>(&format!("SELECT {ROLE_COLUMNS} FROM roles WHERE id = $1"))
            .bind(role_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|error| map_read_error(error, "failed to load role"))?
            .map(Role::from)
            .ok_or_else(|| StoreError::not_found("Role", role_id))
    }

    async fn get_by_name(&self, name: &str) -> StoreResult<Role> {
        sqlx::query_as::<_, RoleRow>(&format!("SELECT {ROLE_COLUMNS} FROM roles WHERE name = $1"))
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|error| map_read_error(error, "failed to load role by name"))?
            .map(Role::from)
            .ok_or_else(|| StoreError::not_found("Role", name))
    }

    async fn get_by_names(&self, names: &[String]) -> StoreResult<Vec<Role>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, RoleRow>(&format!(
            "SELECT {ROLE_COLUMNS} FROM roles WHERE name = ANY($1) ORDER BY name"
        ))
        .bind(names)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| map_read_error(error, "failed to load roles by name"))?;

        Ok(rows.into_iter().map(Role::from).collect())
    }

    async fn get_all(&self) -> StoreResult<Vec<Role>> {
        let rows = sqlx::query_as::<_, RoleRow>(&format!(
            "SELECT {ROLE_COLUMNS} FROM roles ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| map_read_error(error, "failed to list roles"))?;

        Ok(rows.into_iter().map(Role::from).collect())
    }

    async fn save(&self, role: Role) -> StoreResult<Role> {
        if role.id.is_empty() {
            return insert_role(&self.pool, role).await;
        }

        role.validate()
            .map_err(|error| StoreError::invalid_input("Role", "role", error.detail()))?;

        let row = sqlx::query_as::<_, RoleRow>(&format!(
            r#"
            UPDATE roles
            SET display_name = $2,
                description = $3,
                update_at = $4,
                delete_at = $5,
                permissions = $6,
                scheme_managed = $7,
                built_in = $8
            WHERE id = $1
            RETURNING {ROLE_COLUMNS}
            "#
        ))
        .bind(&role.id)
        .bind(&role.display_name)
        .bind(&role.description)
        .bind(now_millis())
        .bind(role.delete_at)
        .bind(role.permissions.iter().cloned().collect::<Vec<String>>())
        .bind(role.scheme_managed)
        .bind(role.built_in)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| map_write_error(error, "Role", "failed to update role"))?;

        row.map(Role::from)
            .ok_or_else(|| StoreError::not_found("Role", role.id))
    }

    async fn channel_higher_scoped_permissions(
        &self,
        role_names: &[String],
    ) -> StoreResult<HashMap<String, RolePermissions>> {
        self.channel_higher_scoped_permissions_impl(role_names).await
    }
}
