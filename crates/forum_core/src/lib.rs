//! Core domain logic for the forum backend.
//! This crate is the single source of truth for forum invariants; serving
//! layers call into [`ForumService`] and encode its serde payloads.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod search;
pub mod service;
pub mod tree;

pub use config::ForumConfig;
pub use db::{open_db, open_db_in_memory, DbError, Gateway};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::{
    Category, CategoryId, Comment, CommentId, EntityKind, Post, PostId, ValidationError,
};
pub use repo::{RepoError, RepoResult};
pub use search::listing::{CategorySummary, PostSummary, SearchError};
pub use search::page::{Page, Pagination};
pub use service::forum_service::{
    DeleteReport, ErrorKind, ForumService, ServiceError, ServiceResult,
};
pub use tree::navigator::{CommentSummary, CommentWithNested, PostWithComments};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
