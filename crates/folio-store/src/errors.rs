//! Store error constructors
//!
//! Store operations return the core `ExError`; these helpers pick the kind
//! and tag the failing operation.

use folio_core::errors::{ExError, ExErrorKind};
use rusqlite::ErrorCode;

pub type Result<T> = std::result::Result<T, ExError>;

/// Map a rusqlite error onto the error taxonomy
///
/// Constraint failures (duplicate route name, dangling parent) become
/// `ConstraintViolation`; a busy or locked database becomes `Concurrency`
/// so callers can retry a publication.
pub fn from_rusqlite(err: rusqlite::Error) -> ExError {
    let kind = match &err {
        rusqlite::Error::SqliteFailure(e, _) => match e.code {
            ErrorCode::ConstraintViolation => ExErrorKind::ConstraintViolation,
            ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked => ExErrorKind::Concurrency,
            _ => ExErrorKind::Persistence,
        },
        rusqlite::Error::QueryReturnedNoRows => ExErrorKind::NotFound,
        _ => ExErrorKind::Persistence,
    };
    ExError::new(kind).with_op("sqlite").with_message(err.to_string())
}

pub fn migration_error(migration_id: &str, reason: &str) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("migration")
        .with_entity_id(migration_id)
        .with_message(format!("migration {} failed: {}", migration_id, reason))
}

pub fn checksum_mismatch(migration_id: &str, expected: &str, actual: &str) -> ExError {
    ExError::new(ExErrorKind::ConstraintViolation)
        .with_op("migration_checksum")
        .with_entity_id(migration_id)
        .with_message(format!(
            "migration {} was edited after being applied (recorded {}, found {})",
            migration_id, expected, actual
        ))
}

pub fn seed_validation(reason: &str) -> ExError {
    ExError::new(ExErrorKind::InvalidInput)
        .with_op("seed_parse")
        .with_message(reason.to_string())
}

pub fn io_error(op: &str, err: std::io::Error) -> ExError {
    ExError::new(ExErrorKind::Io).with_op(op).with_message(err.to_string())
}

/// Page content or block settings that failed to encode as JSON
pub fn serialization_error(op: &str, err: impl std::fmt::Display) -> ExError {
    ExError::new(ExErrorKind::Serialization)
        .with_op(op)
        .with_message(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_rows_is_not_found() {
        let err = from_rusqlite(rusqlite::Error::QueryReturnedNoRows);
        assert_eq!(err.kind(), ExErrorKind::NotFound);
    }

    #[test]
    fn test_unique_violation_maps_to_constraint() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (id TEXT PRIMARY KEY); INSERT INTO t VALUES ('a');")
            .unwrap();
        let err = conn
            .execute("INSERT INTO t VALUES ('a')", [])
            .map_err(from_rusqlite)
            .unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::ConstraintViolation);
    }
}
