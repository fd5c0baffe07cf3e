//! Typed filter/count/page primitives shared by all entity repositories.
//!
//! # Responsibility
//! - Enumerate every supported predicate (`by_id`, `by_parent`,
//!   `title_contains`) so the query surface is statically known.
//! - Assemble SQL only from those predicates, with bound parameters.
//!
//! # Invariants
//! - Listing order is insertion order (`rowid ASC`).
//! - `title_contains` is a literal, case-sensitive substring match.

use crate::model::{CategoryId, CommentId, EntityKind, PostId};
use crate::repo::{parse_uuid, RepoError, RepoResult};
use crate::search::page::Pagination;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Row};
use uuid::Uuid;

/// Parent predicate. Which one applies depends on the queried entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentFilter {
    /// Posts owned by a category.
    Category(CategoryId),
    /// Comments attached to a post, at any nesting depth.
    Post(PostId),
    /// Direct replies to a comment.
    Comment(CommentId),
}

impl ParentFilter {
    fn predicate_name(self) -> &'static str {
        match self {
            Self::Category(_) => "by_parent(category)",
            Self::Post(_) => "by_parent(post)",
            Self::Comment(_) => "by_parent(comment)",
        }
    }

    fn id(self) -> Uuid {
        match self {
            Self::Category(id) | Self::Post(id) | Self::Comment(id) => id,
        }
    }
}

/// Conjunction of optional predicates over one entity table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityFilter {
    pub by_id: Option<Uuid>,
    pub by_parent: Option<ParentFilter>,
    pub title_contains: Option<String>,
}

impl EntityFilter {
    /// Matches every row.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_id(id: Uuid) -> Self {
        Self {
            by_id: Some(id),
            ..Self::default()
        }
    }

    pub fn by_parent(parent: ParentFilter) -> Self {
        Self {
            by_parent: Some(parent),
            ..Self::default()
        }
    }

    pub fn title_contains(text: impl Into<String>) -> Self {
        Self {
            title_contains: Some(text.into()),
            ..Self::default()
        }
    }
}

pub(crate) struct SqlFilter {
    pub(crate) clause: String,
    pub(crate) binds: Vec<Value>,
}

pub(crate) fn table_name(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Category => "categories",
        EntityKind::Post => "posts",
        EntityKind::Comment => "comments",
    }
}

pub(crate) fn id_column(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Category => "category_id",
        EntityKind::Post => "post_id",
        EntityKind::Comment => "comment_id",
    }
}

fn parent_column(kind: EntityKind, parent: ParentFilter) -> RepoResult<&'static str> {
    match (kind, parent) {
        (EntityKind::Post, ParentFilter::Category(_)) => Ok("category_id"),
        (EntityKind::Comment, ParentFilter::Post(_)) => Ok("post_id"),
        (EntityKind::Comment, ParentFilter::Comment(_)) => Ok("parent_comment_id"),
        (kind, parent) => Err(RepoError::UnsupportedFilter {
            kind,
            predicate: parent.predicate_name(),
        }),
    }
}

pub(crate) fn build_filter(kind: EntityKind, filter: &EntityFilter) -> RepoResult<SqlFilter> {
    let mut clause = String::from(" WHERE 1 = 1");
    let mut binds = Vec::new();

    if let Some(id) = filter.by_id {
        clause.push_str(&format!(" AND {} = ?", id_column(kind)));
        binds.push(Value::Text(id.to_string()));
    }

    if let Some(parent) = filter.by_parent {
        clause.push_str(&format!(" AND {} = ?", parent_column(kind, parent)?));
        binds.push(Value::Text(parent.id().to_string()));
    }

    if let Some(text) = filter.title_contains.as_ref() {
        clause.push_str(" AND instr(title, ?) > 0");
        binds.push(Value::Text(text.clone()));
    }

    Ok(SqlFilter { clause, binds })
}

/// Counts rows of `kind` matching `filter`.
pub fn count(conn: &Connection, kind: EntityKind, filter: &EntityFilter) -> RepoResult<u64> {
    let SqlFilter { clause, binds } = build_filter(kind, filter)?;
    let sql = format!("SELECT COUNT(*) FROM {}{clause};", table_name(kind));
    let total: i64 = conn.query_row(&sql, params_from_iter(binds), |row| row.get(0))?;
    u64::try_from(total)
        .map_err(|_| RepoError::InvalidData(format!("negative row count {total}")))
}

/// Returns whether a row of `kind` with primary key `id` exists.
pub fn exists(conn: &Connection, kind: EntityKind, id: Uuid) -> RepoResult<bool> {
    let sql = format!(
        "SELECT EXISTS(SELECT 1 FROM {} WHERE {} = ?1);",
        table_name(kind),
        id_column(kind)
    );
    let found: i64 = conn.query_row(&sql, [id.to_string()], |row| row.get(0))?;
    Ok(found == 1)
}

/// Lists primary keys of matching rows in insertion order.
pub fn select_ids(
    conn: &Connection,
    kind: EntityKind,
    filter: &EntityFilter,
    page: Option<&Pagination>,
) -> RepoResult<Vec<Uuid>> {
    let column = id_column(kind);
    let select_sql = format!("SELECT {column} FROM {}", table_name(kind));
    select_rows(conn, kind, &select_sql, filter, page, |row| {
        let value: String = row.get(0)?;
        parse_uuid(&value, column)
    })
}

/// Deletes rows by primary key in the given order; returns rows removed.
pub fn delete_ids(conn: &Connection, kind: EntityKind, ids: &[Uuid]) -> RepoResult<usize> {
    let sql = format!(
        "DELETE FROM {} WHERE {} = ?1;",
        table_name(kind),
        id_column(kind)
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut removed = 0;
    for id in ids {
        removed += stmt.execute([id.to_string()])?;
    }
    Ok(removed)
}

/// Runs `select_sql` with the filter, insertion ordering and optional window.
pub(crate) fn select_rows<T, F>(
    conn: &Connection,
    kind: EntityKind,
    select_sql: &str,
    filter: &EntityFilter,
    page: Option<&Pagination>,
    parse: F,
) -> RepoResult<Vec<T>>
where
    F: Fn(&Row<'_>) -> RepoResult<T>,
{
    let SqlFilter { clause, mut binds } = build_filter(kind, filter)?;
    let mut sql = format!("{select_sql}{clause} ORDER BY rowid ASC");
    if let Some(page) = page {
        sql.push_str(" LIMIT ? OFFSET ?");
        let (limit, offset) = page.sql_window();
        binds.push(Value::Integer(limit));
        binds.push(Value::Integer(offset));
    }

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params_from_iter(binds))?;
    let mut items = Vec::new();
    while let Some(row) = rows.next()? {
        items.push(parse(row)?);
    }
    Ok(items)
}
