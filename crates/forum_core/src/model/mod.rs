//! Forum domain model: categories, posts and nested comments.
//!
//! # Responsibility
//! - Define the canonical records shared by repository and service layers.
//! - Own field-level validation for create drafts and update patches.
//!
//! # Invariants
//! - Every entity is identified by a stable, generated UUID.
//! - `created` is immutable; `last_edit` is `None` until the first update.
//! - Payload field names match the serving layer contract (`category_id`,
//!   `post_id`, `comment_id`, `parent_comment_id`, `created`, `last_edit`).

pub mod category;
pub mod comment;
pub mod post;
pub mod validation;

pub use category::{Category, CategoryId, CategoryPatch, NewCategory};
pub use comment::{Comment, CommentId, NewComment};
pub use post::{ContentPatch, NewPost, Post, PostId};
pub use validation::ValidationError;

/// Entity family, used for error reporting and query dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Category,
    Post,
    Comment,
}

impl EntityKind {
    /// Singular lowercase label used in messages and log lines.
    pub fn label(self) -> &'static str {
        match self {
            Self::Category => "category",
            Self::Post => "post",
            Self::Comment => "comment",
        }
    }
}
