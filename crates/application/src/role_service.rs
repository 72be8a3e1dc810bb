use std::sync::Arc;

use huddle_core::{AppError, AppResult};
use huddle_domain::Role;

use crate::permission_ports::RoleRepository;

mod higher_scope;
mod lookup;
mod patch;

/// Application service for reading and editing roles.
#[derive(Clone)]
pub struct RoleService {
    repository: Arc<dyn RoleRepository>,
}

impl RoleService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(repository: Arc<dyn RoleRepository>) -> Self {
        Self { repository }
    }
}
