//! SQLite storage gateway, connection bootstrap and schema migrations.
//!
//! # Responsibility
//! - Open and configure SQLite connections for the forum store.
//! - Apply schema migrations in deterministic order.
//! - Provide the scoped unit-of-work ([`Gateway::with_transaction`]) every
//!   durable state change runs inside.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - Core code must not read/write forum data before migrations succeed.
//! - Exactly one commit or one rollback happens per gateway scope.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod gateway;
pub mod migrations;
mod open;

pub use gateway::Gateway;
pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// SQL expression yielding the store clock as Unix epoch milliseconds.
///
/// All `created` / `last_edit` stamps come from this expression so that
/// timestamps share one clock source.
pub(crate) const NOW_EPOCH_MS_SQL: &str =
    "CAST((julianday('now') - 2440587.5) * 86400000.0 AS INTEGER)";

/// Store-level failure: the SQLite driver or an incompatible schema.
#[derive(Debug)]
pub enum DbError {
    /// Statement, transaction or connection failure reported by SQLite.
    Sqlite(rusqlite::Error),
    /// The file was written by a newer binary.
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "forum store failure: {err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "forum store is at schema version {db_version}, this build understands up to {latest_supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        if let Self::Sqlite(err) = self {
            return Some(err);
        }
        None
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

#[cfg(test)]
mod tests {
    use super::DbError;
    use std::error::Error;

    #[test]
    fn sqlite_failures_keep_driver_error_as_source() {
        let err = DbError::from(rusqlite::Error::InvalidQuery);
        assert!(err.to_string().starts_with("forum store failure:"));
        assert!(err.source().is_some());

        let newer = DbError::UnsupportedSchemaVersion {
            db_version: 9,
            latest_supported: 2,
        };
        assert!(newer.source().is_none());
        assert!(newer.to_string().contains("schema version 9"));
    }
}
