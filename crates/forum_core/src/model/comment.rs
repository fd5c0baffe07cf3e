//! Comment model.
//!
//! # Invariants
//! - `post_id` resolves to a post at creation time.
//! - `parent_comment_id`, when set, points at a comment on the same post and
//!   never changes after creation, so comment trees stay acyclic.

use super::post::PostId;
use super::validation::{require_text, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of a comment.
pub type CommentId = Uuid;

/// Persisted comment record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub comment_id: CommentId,
    pub post_id: PostId,
    /// `None` attaches the comment directly to the post.
    pub parent_comment_id: Option<CommentId>,
    pub title: String,
    pub body: String,
    pub created: i64,
    pub last_edit: Option<i64>,
}

impl Comment {
    /// Whether this comment hangs directly off its post.
    pub fn is_top_level(&self) -> bool {
        self.parent_comment_id.is_none()
    }
}

/// Validated input for comment creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub post_id: PostId,
    pub parent_comment_id: Option<CommentId>,
    pub title: String,
    pub body: String,
}

impl NewComment {
    pub fn new(
        post_id: PostId,
        title: impl Into<String>,
        body: impl Into<String>,
        parent_comment_id: Option<CommentId>,
    ) -> Result<Self, ValidationError> {
        let draft = Self {
            post_id,
            parent_comment_id,
            title: title.into(),
            body: body.into(),
        };
        require_text("title", &draft.title)?;
        require_text("body", &draft.body)?;
        Ok(draft)
    }
}
