use std::sync::Arc;

use huddle_core::{AppError, AppResult, StoreError};
use huddle_domain::{PermissionsMap, SystemEntry};
use tracing::{error, info};

use crate::permission_ports::{
    ConfigRepository, MembershipRepository, RoleRepository, SystemRepository,
};

mod advanced;
mod membership_flags;
mod permissions;
mod role_creation;
mod table;

pub use table::default_migration_table;

/// Memberships read per page by the phase-2 migration.
pub const DEFAULT_MEMBERSHIP_BATCH_SIZE: usize = 100;

/// Work performed by one boot migration.
#[derive(Debug, Clone, Copy)]
pub enum MigrationStep {
    /// Seeds or refreshes every default role and retires `AllowEditPost`.
    AdvancedPermissions,
    /// Creates the listed built-in roles when missing.
    CreateMissingRoles(&'static [&'static str]),
    /// Applies a permissions map to every role.
    Permissions(fn() -> PermissionsMap),
    /// Folds legacy membership role tokens into scheme flags.
    MembershipSchemeFlags,
}

/// One keyed entry of the boot migration table.
#[derive(Debug, Clone, Copy)]
pub struct MigrationEntry {
    /// Ledger key recorded once the step succeeds.
    pub key: &'static str,
    /// Work to perform.
    pub step: MigrationStep,
}

impl MigrationEntry {
    /// Creates a table entry.
    #[must_use]
    pub const fn new(key: &'static str, step: MigrationStep) -> Self {
        Self { key, step }
    }
}

/// Failed table entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationFailure {
    /// Key of the entry that failed.
    pub key: &'static str,
    /// Cause reported by the step.
    pub error: AppError,
}

/// Outcome of [`PermissionMigrationService::run_all`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Keys applied during this run, in order.
    pub applied: Vec<&'static str>,
    /// Keys already recorded in the ledger.
    pub skipped: Vec<&'static str>,
    /// Entry that stopped the run.
    pub failed: Option<MigrationFailure>,
}

impl MigrationReport {
    /// Returns whether every entry is now recorded.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_none()
    }
}

/// Boot-time runner for the ordered permission migration table.
#[derive(Clone)]
pub struct PermissionMigrationService {
    roles: Arc<dyn RoleRepository>,
    ledger: Arc<dyn SystemRepository>,
    config: Arc<dyn ConfigRepository>,
    memberships: Arc<dyn MembershipRepository>,
    table: Arc<[MigrationEntry]>,
    membership_batch_size: usize,
}

impl PermissionMigrationService {
    /// Creates a runner over the default migration table.
    #[must_use]
    pub fn new(
        roles: Arc<dyn RoleRepository>,
        ledger: Arc<dyn SystemRepository>,
        config: Arc<dyn ConfigRepository>,
        memberships: Arc<dyn MembershipRepository>,
    ) -> Self {
        Self {
            roles,
            ledger,
            config,
            memberships,
            table: default_migration_table().into(),
            membership_batch_size: DEFAULT_MEMBERSHIP_BATCH_SIZE,
        }
    }

    /// Replaces the migration table.
    #[must_use]
    pub fn with_table(mut self, table: Vec<MigrationEntry>) -> Self {
        self.table = table.into();
        self
    }

    /// Overrides the membership page size used by the phase-2 migration.
    #[must_use]
    pub fn with_membership_batch_size(mut self, batch_size: usize) -> Self {
        self.membership_batch_size = batch_size.max(1);
        self
    }

    /// Returns the table in execution order.
    #[must_use]
    pub fn table(&self) -> &[MigrationEntry] {
        &self.table
    }

    /// Runs every pending entry in table order, stopping at the first failure.
    ///
    /// Failed entries are not recorded and run again in full on the next boot.
    pub async fn run_all(&self) -> MigrationReport {
        let mut report = MigrationReport::default();

        for entry in self.table.iter() {
            match self.run_entry(entry).await {
                Ok(true) => {
                    info!(migration = entry.key, "permission migration applied");
                    report.applied.push(entry.key);
                }
                Ok(false) => report.skipped.push(entry.key),
                Err(error) => {
                    error!(migration = entry.key, %error, "permission migration failed");
                    report.failed = Some(MigrationFailure {
                        key: entry.key,
                        error,
                    });
                    break;
                }
            }
        }

        report
    }

    /// Runs one entry unless the ledger already records it. Returns whether it ran.
    pub async fn run_entry(&self, entry: &MigrationEntry) -> AppResult<bool> {
        if self.is_recorded(entry.key).await? {
            return Ok(false);
        }

        match entry.step {
            MigrationStep::AdvancedPermissions => self.do_advanced_permissions_migration().await?,
            MigrationStep::CreateMissingRoles(names) => self.create_missing_roles(names).await?,
            MigrationStep::Permissions(factory) => {
                self.do_permissions_migration(entry.key, &factory()).await?
            }
            MigrationStep::MembershipSchemeFlags => self.migrate_membership_scheme_flags().await?,
        }

        self.ledger
            .save(SystemEntry::completed(entry.key))
            .await
            .map_err(|error| AppError::from_store("DoAppMigrations", "app.system.save.app_error", error))?;

        Ok(true)
    }

    async fn is_recorded(&self, key: &str) -> AppResult<bool> {
        match self.ledger.get_by_name(key).await {
            Ok(_) => Ok(true),
            Err(StoreError::NotFound { .. }) => Ok(false),
            Err(error) => Err(AppError::from_store(
                "DoAppMigrations",
                "app.system.get_by_name.app_error",
                error,
            )),
        }
    }
}
