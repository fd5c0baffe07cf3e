//! Paginated listings and title substring search.
//!
//! # Responsibility
//! - List categories and per-category posts in insertion order.
//! - Search categories and posts by title substring.
//! - Attach immediate child counts and the total match count.
//!
//! # Invariants
//! - An empty match set is reported as `SearchError::NoResults`, never as an
//!   empty page.
//! - Search terms are sanitized (single quotes stripped) before matching.

use crate::db::DbError;
use crate::model::{Category, CategoryId, EntityKind, Post, ValidationError};
use crate::repo::category_repo::{CategoryRepository, SqliteCategoryRepository};
use crate::repo::post_repo::{PostRepository, SqlitePostRepository};
use crate::repo::query::{self, EntityFilter, ParentFilter};
use crate::repo::RepoError;
use crate::search::page::{sanitize_search_term, Page, Pagination};
use rusqlite::Connection;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type SearchResult<T> = Result<T, SearchError>;

/// Listing/search error.
#[derive(Debug)]
pub enum SearchError {
    Validation(ValidationError),
    /// The (filtered) set is empty.
    NoResults(EntityKind),
    Repo(RepoError),
}

impl Display for SearchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NoResults(EntityKind::Category) => write!(f, "no categories were found"),
            Self::NoResults(EntityKind::Post) => write!(f, "no posts were found"),
            Self::NoResults(EntityKind::Comment) => write!(f, "no comments were found"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SearchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::NoResults(_) => None,
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<ValidationError> for SearchError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for SearchError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<DbError> for SearchError {
    fn from(value: DbError) -> Self {
        Self::Repo(RepoError::Db(value))
    }
}

/// Category listing row with its post count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySummary {
    #[serde(flatten)]
    pub category: Category,
    pub posts_count: u64,
}

/// Post listing row with its comment count (all depths).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostSummary {
    #[serde(flatten)]
    pub post: Post,
    pub comments_count: u64,
}

/// Lists all categories.
pub fn list_categories(
    conn: &Connection,
    page: &Pagination,
) -> SearchResult<Page<CategorySummary>> {
    category_page(conn, &EntityFilter::all(), page)
}

/// Lists the posts of one category.
///
/// A missing category and a category without posts both yield `NoResults`.
pub fn list_posts(
    conn: &Connection,
    category_id: CategoryId,
    page: &Pagination,
) -> SearchResult<Page<PostSummary>> {
    post_page(
        conn,
        &EntityFilter::by_parent(ParentFilter::Category(category_id)),
        page,
    )
}

/// Searches categories whose title contains `term`.
pub fn search_categories(
    conn: &Connection,
    term: &str,
    page: &Pagination,
) -> SearchResult<Page<CategorySummary>> {
    let term = sanitize_search_term(term)?;
    category_page(conn, &EntityFilter::title_contains(term), page)
}

/// Searches posts whose title contains `term`.
pub fn search_posts(
    conn: &Connection,
    term: &str,
    page: &Pagination,
) -> SearchResult<Page<PostSummary>> {
    let term = sanitize_search_term(term)?;
    post_page(conn, &EntityFilter::title_contains(term), page)
}

fn category_page(
    conn: &Connection,
    filter: &EntityFilter,
    page: &Pagination,
) -> SearchResult<Page<CategorySummary>> {
    let repo = SqliteCategoryRepository::new(conn);
    let total = repo.count_categories(filter)?;
    if total == 0 {
        return Err(SearchError::NoResults(EntityKind::Category));
    }

    let items = repo
        .list_categories(filter, Some(page))?
        .into_iter()
        .map(|category| {
            let posts_count = query::count(
                conn,
                EntityKind::Post,
                &EntityFilter::by_parent(ParentFilter::Category(category.category_id)),
            )?;
            Ok(CategorySummary {
                category,
                posts_count,
            })
        })
        .collect::<Result<Vec<_>, RepoError>>()?;

    Ok(Page { items, total })
}

fn post_page(
    conn: &Connection,
    filter: &EntityFilter,
    page: &Pagination,
) -> SearchResult<Page<PostSummary>> {
    let repo = SqlitePostRepository::new(conn);
    let total = repo.count_posts(filter)?;
    if total == 0 {
        return Err(SearchError::NoResults(EntityKind::Post));
    }

    let items = repo
        .list_posts(filter, Some(page))?
        .into_iter()
        .map(|post| {
            let comments_count = query::count(
                conn,
                EntityKind::Comment,
                &EntityFilter::by_parent(ParentFilter::Post(post.post_id)),
            )?;
            Ok(PostSummary {
                post,
                comments_count,
            })
        })
        .collect::<Result<Vec<_>, RepoError>>()?;

    Ok(Page { items, total })
}
