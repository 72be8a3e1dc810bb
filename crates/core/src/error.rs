use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type returned by application services.
pub type AppResult<T> = Result<T, AppError>;

/// Result type returned by store adapters.
pub type StoreResult<T> = Result<T, StoreError>;

/// Typed failures raised by persistence adapters.
///
/// Services inspect the variant instead of matching on messages and wrap it in
/// an [`AppError`] with [`AppError::from_store`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The requested row does not exist.
    #[error("resource: {entity} id: {id}")]
    NotFound {
        /// Stored entity kind.
        entity: &'static str,
        /// Identifier or name used for the lookup.
        id: String,
    },

    /// The row failed validation before being written.
    #[error("invalid input: entity: {entity} field: {field} value: {value}")]
    InvalidInput {
        /// Stored entity kind.
        entity: &'static str,
        /// Offending field.
        field: &'static str,
        /// Offending value rendered for diagnostics.
        value: String,
    },

    /// A unique constraint rejected the write.
    #[error("conflict: entity: {entity}: {detail}")]
    Conflict {
        /// Stored entity kind.
        entity: &'static str,
        /// Constraint detail.
        detail: String,
    },

    /// Unclassified driver or I/O failure.
    #[error("store failure: {0}")]
    Internal(String),
}

impl StoreError {
    /// Creates a not-found error.
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Creates an invalid-input error.
    pub fn invalid_input(
        entity: &'static str,
        field: &'static str,
        value: impl Into<String>,
    ) -> Self {
        Self::InvalidInput {
            entity,
            field,
            value: value.into(),
        }
    }

    /// Creates a unique-constraint conflict error.
    pub fn conflict(entity: &'static str, detail: impl Into<String>) -> Self {
        Self::Conflict {
            entity,
            detail: detail.into(),
        }
    }

    /// Returns the error category used when wrapping into an [`AppError`].
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::InvalidInput { .. } => ErrorKind::InvalidInput,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Returns whether the lookup found nothing.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Common application error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Requested resource does not exist.
    NotFound,
    /// Invalid input or violated invariant.
    InvalidInput,
    /// Write operation conflicts with existing state.
    Conflict,
    /// Scheme operation attempted before the phase-2 migration completed.
    MigrationNotCompleted,
    /// Internal unexpected error.
    Internal,
}

impl ErrorKind {
    /// Returns the HTTP status class reported to transport layers.
    #[must_use]
    pub fn status_code(self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::InvalidInput => 400,
            Self::Conflict => 409,
            Self::MigrationNotCompleted => 501,
            Self::Internal => 500,
        }
    }

    /// Returns a stable storage value for this kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::InvalidInput => "invalid_input",
            Self::Conflict => "conflict",
            Self::MigrationNotCompleted => "migration_not_completed",
            Self::Internal => "internal",
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Uniform error returned by every application service.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{operation}: {message_id}, {detail}")]
pub struct AppError {
    operation: &'static str,
    kind: ErrorKind,
    message_id: &'static str,
    detail: String,
}

impl AppError {
    /// Creates an application error.
    pub fn new(
        operation: &'static str,
        kind: ErrorKind,
        message_id: &'static str,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            operation,
            kind,
            message_id,
            detail: detail.into(),
        }
    }

    /// Creates a not-found error.
    pub fn not_found(
        operation: &'static str,
        message_id: &'static str,
        detail: impl Into<String>,
    ) -> Self {
        Self::new(operation, ErrorKind::NotFound, message_id, detail)
    }

    /// Creates an invalid-input error.
    pub fn invalid_input(
        operation: &'static str,
        message_id: &'static str,
        detail: impl Into<String>,
    ) -> Self {
        Self::new(operation, ErrorKind::InvalidInput, message_id, detail)
    }

    /// Creates an internal error.
    pub fn internal(
        operation: &'static str,
        message_id: &'static str,
        detail: impl Into<String>,
    ) -> Self {
        Self::new(operation, ErrorKind::Internal, message_id, detail)
    }

    /// Creates the error returned while the phase-2 migration is pending.
    pub fn migration_not_completed(
        operation: &'static str,
        message_id: &'static str,
        detail: impl Into<String>,
    ) -> Self {
        Self::new(operation, ErrorKind::MigrationNotCompleted, message_id, detail)
    }

    /// Wraps a typed store failure, keeping its category.
    #[must_use]
    pub fn from_store(operation: &'static str, message_id: &'static str, error: StoreError) -> Self {
        Self::new(operation, error.kind(), message_id, error.to_string())
    }

    /// Returns the internal operation identifier.
    #[must_use]
    pub fn operation(&self) -> &'static str {
        self.operation
    }

    /// Returns the error category.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the stable localizable message key.
    #[must_use]
    pub fn message_id(&self) -> &'static str {
        self.message_id
    }

    /// Returns the underlying cause.
    #[must_use]
    pub fn detail(&self) -> &str {
        self.detail.as_str()
    }

    /// Returns the HTTP status class for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        self.kind.status_code()
    }
}
