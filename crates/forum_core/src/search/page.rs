//! Pagination arguments and page envelopes.
//!
//! # Invariants
//! - `limit` and `offset` are both mandatory and non-negative.
//! - `Page::total` counts every match, independent of the window.

use crate::model::ValidationError;
use serde::Serialize;

/// Validated offset-based window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    limit: i64,
    offset: i64,
}

impl Pagination {
    /// Validates scalar pagination arguments.
    pub fn new(limit: Option<i64>, offset: Option<i64>) -> Result<Self, ValidationError> {
        Ok(Self {
            limit: checked_value("limit", limit)?,
            offset: checked_value("offset", offset)?,
        })
    }

    /// Validates raw query-string pagination arguments.
    pub fn from_params(
        limit: Option<&str>,
        offset: Option<&str>,
    ) -> Result<Self, ValidationError> {
        Self::new(
            parse_param("limit", limit)?,
            parse_param("offset", offset)?,
        )
    }

    pub fn limit(&self) -> u64 {
        self.limit.unsigned_abs()
    }

    pub fn offset(&self) -> u64 {
        self.offset.unsigned_abs()
    }

    /// `(limit, offset)` as bound to SQLite `LIMIT ? OFFSET ?`.
    pub(crate) fn sql_window(&self) -> (i64, i64) {
        (self.limit, self.offset)
    }
}

/// One window of results plus the total number of matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
}

/// Strips single quotes from a search term; the remainder must be non-empty.
pub fn sanitize_search_term(raw: &str) -> Result<String, ValidationError> {
    let cleaned = raw.replace('\'', "");
    if cleaned.is_empty() {
        return Err(ValidationError::EmptySearchTerm);
    }
    Ok(cleaned)
}

fn checked_value(field: &'static str, value: Option<i64>) -> Result<i64, ValidationError> {
    match value {
        None => Err(ValidationError::MissingPagination(field)),
        Some(value) if value < 0 => Err(ValidationError::InvalidPagination {
            field,
            value: value.to_string(),
        }),
        Some(value) => Ok(value),
    }
}

fn parse_param(field: &'static str, raw: Option<&str>) -> Result<Option<i64>, ValidationError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<i64>()
        .map(Some)
        .map_err(|_| ValidationError::InvalidPagination {
            field,
            value: raw.to_string(),
        })
}
