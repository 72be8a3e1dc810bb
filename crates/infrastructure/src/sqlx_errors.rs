use huddle_core::StoreError;

const UNIQUE_VIOLATION: &str = "23505";

/// Maps a driver error to a store error, turning unique violations into conflicts.
pub(crate) fn map_write_error(error: sqlx::Error, entity: &'static str, context: &str) -> StoreError {
    if let sqlx::Error::Database(database_error) = &error
        && database_error.code().as_deref() == Some(UNIQUE_VIOLATION)
    {
        return StoreError::conflict(entity, format!("{context}: {database_error}"));
    }

    StoreError::Internal(format!("{context}: {error}"))
}

/// Maps a driver error raised by a read.
pub(crate) fn map_read_error(error: sqlx::Error, context: &str) -> StoreError {
    StoreError::Internal(format!("{context}: {error}"))
}
