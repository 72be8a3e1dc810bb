//! Application services and ports of the permission engine.

#![forbid(unsafe_code)]

mod membership_service;
mod permission_migration_service;
mod permission_ports;
mod role_service;
mod scheme_service;

#[cfg(test)]
mod test_support;

pub use membership_service::MembershipService;
pub use permission_migration_service::{
    DEFAULT_MEMBERSHIP_BATCH_SIZE, MigrationEntry, MigrationFailure, MigrationReport,
    MigrationStep, PermissionMigrationService, default_migration_table,
};
pub use permission_ports::{
    ConfigRepository, MembershipRepository, RoleRepository, SchemeRepository, SystemRepository,
};
pub use role_service::RoleService;
pub use scheme_service::SchemeService;
