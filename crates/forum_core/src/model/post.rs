//! Post model and the title/body patch shared with comments.

use super::category::CategoryId;
use super::validation::{changed_value, require_text, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of a post.
pub type PostId = Uuid;

/// Persisted post record. `category_id` always resolves to a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub post_id: PostId,
    pub category_id: CategoryId,
    pub title: String,
    pub body: String,
    pub created: i64,
    pub last_edit: Option<i64>,
}

/// Validated input for post creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub category_id: CategoryId,
    pub title: String,
    pub body: String,
}

impl NewPost {
    pub fn new(
        category_id: CategoryId,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let draft = Self {
            category_id,
            title: title.into(),
            body: body.into(),
        };
        require_text("title", &draft.title)?;
        require_text("body", &draft.body)?;
        Ok(draft)
    }
}

/// Requested title/body edit for posts and comments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentPatch {
    pub title: Option<String>,
    pub body: Option<String>,
}

impl ContentPatch {
    /// Reduces this patch to the fields that differ from the current values.
    pub fn diff(&self, current_title: &str, current_body: &str) -> Result<Self, ValidationError> {
        let diff = Self {
            title: changed_value(self.title.as_deref(), current_title),
            body: changed_value(self.body.as_deref(), current_body),
        };
        if diff.title.is_none() && diff.body.is_none() {
            return Err(ValidationError::NothingToChange);
        }
        Ok(diff)
    }
}
