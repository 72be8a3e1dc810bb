use std::str::FromStr;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use huddle_application::ConfigRepository;
use huddle_core::{StoreError, StoreResult};
use huddle_domain::{AllowEditPost, PostEditSettings};

use crate::sqlx_errors::{map_read_error, map_write_error};

/// PostgreSQL-backed store for the server settings migrations touch.
#[derive(Clone)]
pub struct PostgresConfigRepository {
    pool: PgPool,
}

impl PostgresConfigRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct PostEditSettingsRow {
    allow_edit_post: Option<String>,
    post_edit_time_limit: i64,
}

#[async_trait]
impl ConfigRepository for PostgresConfigRepository {
    async fn post_edit_settings(&self) -> StoreResult<PostEditSettings> {
        let row = sqlx::query_as::<_, PostEditSettingsRow>(
            "SELECT allow_edit_post, post_edit_time_limit FROM server_settings WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| map_read_error(error, "failed to load server settings"))?;

        let Some(row) = row else {
            return Ok(PostEditSettings::default());
        };

        let allow_edit_post = row
            .allow_edit_post
            .as_deref()
            .map(AllowEditPost::from_str)
            .transpose()
            .map_err(|error| {
                StoreError::invalid_input("ServerSettings", "allow_edit_post", error.detail())
            })?;

        Ok(PostEditSettings {
            allow_edit_post,
            post_edit_time_limit: row.post_edit_time_limit,
        })
    }

    async fn save_post_edit_settings(&self, settings: PostEditSettings) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO server_settings (id, allow_edit_post, post_edit_time_limit)
            VALUES (1, $1, $2)
            ON CONFLICT (id) DO UPDATE
            SET allow_edit_post = EXCLUDED.allow_edit_post,
                post_edit_time_limit = EXCLUDED.post_edit_time_limit
            "#,
        )
        .bind(settings.allow_edit_post.map(AllowEditPost::as_str))
        .bind(settings.post_edit_time_limit)
        .execute(&self.pool)
        .await
        .map_err(|error| map_write_error(error, "ServerSettings", "failed to save server settings"))?;

        Ok(())
    }
}
