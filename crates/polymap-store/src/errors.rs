//! Error handling for polymap-store
//!
//! Wraps polymap-core ExError with store-specific helpers

use polymap_core::errors::{ExError, ExErrorKind};

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

/// Create a migration error
pub fn migration_error(migration_id: &str, reason: &str) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("migration")
        .with_message(format!("Migration {} failed: {}", migration_id, reason))
}

/// Create a checksum mismatch error
pub fn checksum_mismatch(migration_id: &str, expected: &str, actual: &str) -> ExError {
    ExError::new(ExErrorKind::ConstraintViolation)
        .with_op("migration_checksum")
        .with_message(format!(
            "Checksum mismatch for migration {}: recorded {}, mapped layout gives {}",
            migration_id, expected, actual
        ))
}

/// Create a fixture validation error
pub fn seed_validation(reason: impl Into<String>) -> ExError {
    ExError::new(ExErrorKind::InvalidInput)
        .with_op("fixture_parse")
        .with_message(reason)
}

/// Create a stored-value decoding error
pub fn decode_error(table: &str, column: &str, value: &str) -> ExError {
    ExError::new(ExErrorKind::Serialization)
        .with_op("decode_row")
        .with_table(table)
        .with_message(format!("Column {} holds non-UUID value {:?}", column, value))
}

/// Create a serialization error
pub fn serialization_error(operation: &str, reason: &str) -> ExError {
    ExError::new(ExErrorKind::Serialization)
        .with_op(operation.to_string())
        .with_message(reason.to_string())
}

/// Create a database error from rusqlite::Error
///
/// Constraint failures (foreign key, unique, not null, primary key) are
/// classified separately from other storage failures.
pub fn from_rusqlite(err: rusqlite::Error) -> ExError {
    let kind = match &err {
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            ExErrorKind::ConstraintViolation
        }
        _ => ExErrorKind::Persistence,
    };
    ExError::new(kind)
        .with_op("sqlite")
        .with_message(err.to_string())
}

/// Create an IO error
pub fn io_error(operation: &str, err: std::io::Error) -> ExError {
    ExError::new(ExErrorKind::Io)
        .with_op(operation.to_string())
        .with_message(err.to_string())
}
