//! Infrastructure adapters for the permission store ports.

#![forbid(unsafe_code)]

mod in_memory_permission_store;
mod postgres_config_repository;
mod postgres_membership_repository;
mod postgres_role_repository;
mod postgres_scheme_repository;
mod postgres_system_repository;
mod sqlx_errors;

pub use in_memory_permission_store::InMemoryPermissionStore;
pub use postgres_config_repository::PostgresConfigRepository;
pub use postgres_membership_repository::PostgresMembershipRepository;
pub use postgres_role_repository::PostgresRoleRepository;
pub use postgres_scheme_repository::PostgresSchemeRepository;
pub use postgres_system_repository::PostgresSystemRepository;
