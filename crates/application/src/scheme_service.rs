use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use huddle_core::{AppError, AppResult, StoreError};
use huddle_domain::{Scheme, migration_keys};

use crate::permission_ports::{RoleRepository, SchemeRepository, SystemRepository};

mod manage;

/// Application service for team and channel schemes.
///
/// Every operation is refused until the phase-2 membership migration has
/// completed.
#[derive(Clone)]
pub struct SchemeService {
    schemes: Arc<dyn SchemeRepository>,
    roles: Arc<dyn RoleRepository>,
    ledger: Arc<dyn SystemRepository>,
    phase_2_completed: Arc<AtomicBool>,
}

impl SchemeService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        schemes: Arc<dyn SchemeRepository>,
        roles: Arc<dyn RoleRepository>,
        ledger: Arc<dyn SystemRepository>,
    ) -> Self {
        Self {
            schemes,
            roles,
            ledger,
            phase_2_completed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Returns an error until the phase-2 sentinel exists. A positive answer is cached.
    pub async fn is_phase_2_migration_completed(&self) -> AppResult<()> {
        if self.phase_2_completed.load(Ordering::Acquire) {
            return Ok(());
        }

        match self
            .ledger
            .get_by_name(migration_keys::ADVANCED_PERMISSIONS_PHASE_2)
            .await
        {
            Ok(_) => {
                self.phase_2_completed.store(true, Ordering::Release);
                Ok(())
            }
            Err(StoreError::NotFound { .. }) => Err(AppError::migration_not_completed(
                "App.IsPhase2MigrationCompleted",
                "app.schemes.is_phase_2_migration_completed.not_completed.app_error",
                "the advanced permissions phase 2 migration has not completed",
            )),
            Err(error) => Err(AppError::from_store(
                "App.IsPhase2MigrationCompleted",
                "app.system.get_by_name.app_error",
                error,
            )),
        }
    }
}
