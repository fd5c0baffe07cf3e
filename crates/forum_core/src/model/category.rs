//! Category model.
//!
//! # Invariants
//! - `title` and `summary` are never blank.
//! - A category owns its posts; deleting it deletes them.

use super::validation::{changed_value, require_text, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of a category.
pub type CategoryId = Uuid;

/// Persisted category record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub category_id: CategoryId,
    pub title: String,
    pub summary: String,
    /// Unix epoch milliseconds.
    pub created: i64,
    /// Unix epoch milliseconds of the latest update, `None` until edited.
    pub last_edit: Option<i64>,
}

/// Validated input for category creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCategory {
    pub title: String,
    pub summary: String,
}

impl NewCategory {
    /// Validates and builds a creation draft.
    pub fn new(
        title: impl Into<String>,
        summary: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let draft = Self {
            title: title.into(),
            summary: summary.into(),
        };
        require_text("title", &draft.title)?;
        require_text("summary", &draft.summary)?;
        Ok(draft)
    }
}

/// Requested category edit. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryPatch {
    pub title: Option<String>,
    pub summary: Option<String>,
}

impl CategoryPatch {
    /// Reduces this patch to the fields that actually differ from `current`.
    ///
    /// Each field is compared independently; fails with
    /// [`ValidationError::NothingToChange`] when no field differs.
    pub fn diff(&self, current: &Category) -> Result<Self, ValidationError> {
        let diff = Self {
            title: changed_value(self.title.as_deref(), &current.title),
            summary: changed_value(self.summary.as_deref(), &current.summary),
        };
        if diff.title.is_none() && diff.summary.is_none() {
            return Err(ValidationError::NothingToChange);
        }
        Ok(diff)
    }
}
