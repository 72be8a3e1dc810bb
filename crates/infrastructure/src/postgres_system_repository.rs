use async_trait::async_trait;
use sqlx::PgPool;

use huddle_application::SystemRepository;
use huddle_core::{StoreError, StoreResult};
use huddle_domain::SystemEntry;

use crate::sqlx_errors::{map_read_error, map_write_error};

/// PostgreSQL-backed system ledger.
#[derive(Clone)]
pub struct PostgresSystemRepository {
    pool: PgPool,
}

impl PostgresSystemRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SystemRepository for PostgresSystemRepository {
    async fn get_by_name(&self, name: &str) -> StoreResult<SystemEntry> {
        let value = sqlx::query_scalar::<_, String>("SELECT value FROM systems WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|error| map_read_error(error, "failed to load system entry"))?
            .ok_or_else(|| StoreError::not_found("System", name))?;

        Ok(SystemEntry {
            name: name.to_owned(),
            value,
        })
    }

    async fn save(&self, entry: SystemEntry) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO systems (name, value)
            VALUES ($1, $2)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(&entry.name)
        .bind(&entry.value)
        .execute(&self.pool)
        .await
        .map_err(|error| map_write_error(error, "System", "failed to save system entry"))?;

        Ok(())
    }
}
