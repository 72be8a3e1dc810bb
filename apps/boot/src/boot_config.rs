use std::env;
use std::str::FromStr;

use huddle_application::DEFAULT_MEMBERSHIP_BATCH_SIZE;
use huddle_core::AppError;

const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Where the permission store lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres { database_url: String },
    Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BackendKind {
    Postgres,
    Memory,
}

impl FromStr for BackendKind {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "postgres" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            other => Err(invalid_config(format!(
                "STORE_BACKEND must be 'postgres' or 'memory', got '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BootConfig {
    pub migrate_only: bool,
    pub store_backend: StoreBackend,
    pub database_max_connections: u32,
    pub membership_batch_size: usize,
}

impl BootConfig {
    pub fn load() -> Result<Self, AppError> {
        let migrate_only = env::args().nth(1).as_deref() == Some("migrate");

        let store_backend = match env::var("STORE_BACKEND")
            .unwrap_or_default()
            .parse::<BackendKind>()?
        {
            BackendKind::Postgres => StoreBackend::Postgres {
                database_url: required_env("DATABASE_URL")?,
            },
            BackendKind::Memory => StoreBackend::Memory,
        };

        let database_max_connections =
            parse_env_or("DATABASE_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?;
        let membership_batch_size =
            parse_env_or("MIGRATION_BATCH_SIZE", DEFAULT_MEMBERSHIP_BATCH_SIZE)?;
        if database_max_connections == 0 || membership_batch_size == 0 {
            return Err(invalid_config(
                "DATABASE_MAX_CONNECTIONS and MIGRATION_BATCH_SIZE must be positive",
            ));
        }

        Ok(Self {
            migrate_only,
            store_backend,
            database_max_connections,
            membership_batch_size,
        })
    }
}

fn required_env(name: &str) -> Result<String, AppError> {
    env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| invalid_config(format!("{name} is required")))
}

fn parse_env_or<T: FromStr>(name: &str, default: T) -> Result<T, AppError> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => parse_value(name, &value),
        _ => Ok(default),
    }
}

fn parse_value<T: FromStr>(name: &str, value: &str) -> Result<T, AppError> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| invalid_config(format!("{name} has invalid value '{value}'")))
}

fn invalid_config(detail: impl Into<String>) -> AppError {
    AppError::invalid_input("BootConfig.Load", "boot.config.invalid.app_error", detail)
}
