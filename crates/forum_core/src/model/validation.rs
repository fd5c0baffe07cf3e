//! Validation errors and shared field checks.

use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Input rejected before it reaches persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Required text field is missing or blank.
    EmptyField(&'static str),
    /// Update supplied no field that differs from the stored value.
    NothingToChange,
    /// Required pagination argument was not supplied.
    MissingPagination(&'static str),
    /// Pagination argument is not a non-negative integer.
    InvalidPagination { field: &'static str, value: String },
    /// Search substring is empty after sanitizing.
    EmptySearchTerm,
    /// Parent comment exists but is attached to another post.
    ParentOnOtherPost {
        parent_comment_id: Uuid,
        post_id: Uuid,
    },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyField(field) => write!(f, "parameter `{field}` has not been filled"),
            Self::NothingToChange => write!(f, "nothing to change"),
            Self::MissingPagination(field) => {
                write!(f, "`{field}` is a mandatory pagination parameter")
            }
            Self::InvalidPagination { field, value } => write!(
                f,
                "`{field}` must be a non-negative integer, got `{value}`"
            ),
            Self::EmptySearchTerm => write!(f, "search term has not been filled"),
            Self::ParentOnOtherPost {
                parent_comment_id,
                post_id,
            } => write!(
                f,
                "parent comment {parent_comment_id} does not belong to post {post_id}"
            ),
        }
    }
}

impl Error for ValidationError {}

/// Fails with [`ValidationError::EmptyField`] when `value` is blank.
pub(crate) fn require_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    Ok(())
}

/// Returns the supplied value when it is non-blank and differs from `current`.
///
/// Blank supplied values count as "not supplied".
pub(crate) fn changed_value(supplied: Option<&str>, current: &str) -> Option<String> {
    match supplied {
        Some(value) if !value.trim().is_empty() && value != current => Some(value.to_string()),
        _ => None,
    }
}
