//! Error handling for responder-store
//!
//! Wraps responder-core CoreError with store-specific helpers

use responder_core::errors::{CoreError, CoreErrorKind};

/// Result type alias using CoreError
pub type Result<T> = std::result::Result<T, CoreError>;

/// Create a migration error
pub fn migration_error(migration_id: &str, reason: &str) -> CoreError {
    CoreError::new(CoreErrorKind::Persistence)
        .with_op("migration")
        .with_message(format!("Migration {} failed: {}", migration_id, reason))
}

/// Create a checksum mismatch error
pub fn checksum_mismatch(migration_id: &str, expected: &str, actual: &str) -> CoreError {
    CoreError::new(CoreErrorKind::Persistence)
        .with_op("migration_checksum")
        .with_message(format!(
            "Checksum mismatch for migration {}: expected {}, got {}",
            migration_id, expected, actual
        ))
}

/// Create a database error from rusqlite::Error
pub fn from_rusqlite(err: rusqlite::Error) -> CoreError {
    CoreError::new(CoreErrorKind::Persistence)
        .with_op("sqlite")
        .with_message(err.to_string())
}

/// Create an error for a poisoned connection lock
pub fn lock_poisoned(op: &str) -> CoreError {
    CoreError::new(CoreErrorKind::Internal)
        .with_op(op.to_string())
        .with_message("connection lock poisoned")
}
