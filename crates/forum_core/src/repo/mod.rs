//! Repository layer contracts and SQLite implementations.
//!
//! # Responsibility
//! - Provide typed CRUD primitives for categories, posts and comments.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Repositories operate on a caller-provided connection or transaction;
//!   they never open, commit or roll back scopes themselves.
//! - Read paths reject undecodable persisted state instead of masking it.
//! - Repository APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.

use crate::db::DbError;
use crate::model::{EntityKind, ValidationError};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod category_repo;
pub mod comment_repo;
pub mod post_repo;
pub mod query;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for forum persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    Db(DbError),
    /// Referenced entity does not exist.
    NotFound { kind: EntityKind, id: Uuid },
    /// Filter combines an entity with a parent predicate it cannot have.
    UnsupportedFilter {
        kind: EntityKind,
        predicate: &'static str,
    },
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { kind, id } => write!(f, "no {} {id} in database", kind.label()),
            Self::UnsupportedFilter { kind, predicate } => write!(
                f,
                "filter `{predicate}` is not supported for {} queries",
                kind.label()
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted forum data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound { .. } => None,
            Self::UnsupportedFilter { .. } => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

pub(crate) fn parse_uuid(value: &str, column: &'static str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

pub(crate) fn is_foreign_key_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY
    )
}
