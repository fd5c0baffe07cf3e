//! Pagination and substring search over forum entities.
//!
//! # Responsibility
//! - Validate pagination arguments and search terms.
//! - Shape bounded pages that carry child counts and a total match count.

pub mod listing;
pub mod page;
