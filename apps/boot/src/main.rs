//! Boot-time runner for the permission engine: schema migrations, then the
//! permission migration table.

#![forbid(unsafe_code)]

mod boot_config;

use std::sync::Arc;

use huddle_application::{
    ConfigRepository, MembershipRepository, MigrationReport, PermissionMigrationService,
    RoleRepository, RoleService, SchemeRepository, SchemeService, SystemRepository,
};
use huddle_core::{AppError, AppResult};
use huddle_infrastructure::{
    InMemoryPermissionStore, PostgresConfigRepository, PostgresMembershipRepository,
    PostgresRoleRepository, PostgresSchemeRepository, PostgresSystemRepository,
};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::boot_config::{BootConfig, StoreBackend};

struct Stores {
    roles: Arc<dyn RoleRepository>,
    schemes: Arc<dyn SchemeRepository>,
    system: Arc<dyn SystemRepository>,
    config: Arc<dyn ConfigRepository>,
    memberships: Arc<dyn MembershipRepository>,
}

impl Stores {
    fn postgres(pool: &PgPool) -> Self {
        Self {
            roles: Arc::new(PostgresRoleRepository::new(pool.clone())),
            schemes: Arc::new(PostgresSchemeRepository::new(pool.clone())),
            system: Arc::new(PostgresSystemRepository::new(pool.clone())),
            config: Arc::new(PostgresConfigRepository::new(pool.clone())),
            memberships: Arc::new(PostgresMembershipRepository::new(pool.clone())),
        }
    }

    fn in_memory() -> Self {
        let store = Arc::new(InMemoryPermissionStore::new());
        Self {
            roles: store.clone(),
            schemes: store.clone(),
            system: store.clone(),
            config: store.clone(),
            memberships: store,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = BootConfig::load()?;

    let stores = match &config.store_backend {
        StoreBackend::Postgres { database_url } => {
            let pool = connect_pool(database_url, config.database_max_connections).await?;

            sqlx::migrate!("../../crates/infrastructure/migrations")
                .run(&pool)
                .await
                .map_err(|error| boot_error(format!("failed to run migrations: {error}")))?;

            if config.migrate_only {
                info!("database migrations applied successfully");
                return Ok(());
            }

            Stores::postgres(&pool)
        }
        StoreBackend::Memory => {
            warn!("using the in-memory permission store; nothing is persisted");
            Stores::in_memory()
        }
    };

    let migrations = PermissionMigrationService::new(
        stores.roles.clone(),
        stores.system.clone(),
        stores.config.clone(),
        stores.memberships.clone(),
    )
    .with_membership_batch_size(config.membership_batch_size);

    let report = migrations.run_all().await;
    log_report(&report);
    if let Some(failure) = report.failed {
        return Err(failure.error);
    }

    let schemes = SchemeService::new(stores.schemes, stores.roles.clone(), stores.system);
    schemes.is_phase_2_migration_completed().await?;

    let roles = RoleService::new(stores.roles).get_all_roles().await?;
    info!(
        role_count = roles.len(),
        "permission engine ready, scheme management enabled"
    );

    Ok(())
}

async fn connect_pool(database_url: &str, max_connections: u32) -> AppResult<PgPool> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
        .map_err(|error| boot_error(format!("failed to connect to database: {error}")))
}

fn log_report(report: &MigrationReport) {
    info!(
        applied = report.applied.len(),
        skipped = report.skipped.len(),
        "permission migrations finished"
    );

    if let Some(failure) = &report.failed {
        warn!(
            migration = failure.key,
            error = %failure.error,
            "permission migrations stopped; the failed entry retries on next boot"
        );
    }
}

fn boot_error(detail: String) -> AppError {
    AppError::internal("Boot", "boot.app_error", detail)
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}
