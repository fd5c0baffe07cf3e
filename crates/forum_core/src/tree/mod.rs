//! Post/comment hierarchy navigation.
//!
//! # Responsibility
//! - Expand one level of the hierarchy (post → comments, comment → replies)
//!   with counts and pagination.
//! - Collect whole comment subtrees for cascading deletes.
//!
//! # Invariants
//! - Comment trees are acyclic: a parent must exist before its reply is
//!   inserted and `parent_comment_id` is never updated.

pub mod navigator;
