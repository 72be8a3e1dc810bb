//! Shared primitives for all Rust crates in Huddle.

#![forbid(unsafe_code)]

/// Error types shared by stores and application services.
pub mod error;
/// Identifier and clock helpers.
pub mod ids;

pub use error::{AppError, AppResult, ErrorKind, StoreError, StoreResult};
pub use ids::{is_valid_id, new_id, now_millis};
