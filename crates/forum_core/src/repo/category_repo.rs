//! Category repository contract and SQLite implementation.
//!
//! # Invariants
//! - Inserts stamp `created` from the store clock and leave `last_edit` NULL.
//! - Updates stamp `last_edit` and only touch the supplied fields.
//! - Row deletion here is not cascading; owned posts are removed by the
//!   service layer first.

use crate::db::NOW_EPOCH_MS_SQL;
use crate::model::{Category, CategoryId, CategoryPatch, EntityKind, NewCategory};
use crate::repo::query::{self, EntityFilter};
use crate::repo::{parse_uuid, RepoError, RepoResult};
use crate::search::page::Pagination;
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

const CATEGORY_SELECT_SQL: &str = "SELECT
    category_id,
    title,
    summary,
    created,
    last_edit
FROM categories";

/// Repository interface for category persistence.
pub trait CategoryRepository {
    fn create_category(&self, draft: &NewCategory) -> RepoResult<Category>;
    fn get_category(&self, id: CategoryId) -> RepoResult<Option<Category>>;
    /// Applies the `Some` fields of `patch` and stamps `last_edit`.
    fn update_category(&self, id: CategoryId, patch: &CategoryPatch) -> RepoResult<Category>;
    fn list_categories(
        &self,
        filter: &EntityFilter,
        page: Option<&Pagination>,
    ) -> RepoResult<Vec<Category>>;
    fn count_categories(&self, filter: &EntityFilter) -> RepoResult<u64>;
    /// Deletes the category row only.
    fn delete_category(&self, id: CategoryId) -> RepoResult<()>;
}

/// SQLite-backed category repository bound to one connection or transaction.
pub struct SqliteCategoryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCategoryRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl CategoryRepository for SqliteCategoryRepository<'_> {
    fn create_category(&self, draft: &NewCategory) -> RepoResult<Category> {
        let category_id = Uuid::new_v4();
        self.conn.execute(
            &format!(
                "INSERT INTO categories (category_id, title, summary, created, last_edit)
                 VALUES (?1, ?2, ?3, {NOW_EPOCH_MS_SQL}, NULL);"
            ),
            params![
                category_id.to_string(),
                draft.title.as_str(),
                draft.summary.as_str()
            ],
        )?;
        load_required_category(self.conn, category_id)
    }

    fn get_category(&self, id: CategoryId) -> RepoResult<Option<Category>> {
        let mut rows = self.list_categories(&EntityFilter::by_id(id), None)?;
        Ok(rows.pop())
    }

    fn update_category(&self, id: CategoryId, patch: &CategoryPatch) -> RepoResult<Category> {
        let changed = self.conn.execute(
            &format!(
                "UPDATE categories
                 SET
                    title = COALESCE(?2, title),
                    summary = COALESCE(?3, summary),
                    last_edit = MAX(COALESCE(last_edit, created), {NOW_EPOCH_MS_SQL})
                 WHERE category_id = ?1;"
            ),
            params![
                id.to_string(),
                patch.title.as_deref(),
                patch.summary.as_deref()
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                kind: EntityKind::Category,
                id,
            });
        }

        load_required_category(self.conn, id)
    }

    fn list_categories(
        &self,
        filter: &EntityFilter,
        page: Option<&Pagination>,
    ) -> RepoResult<Vec<Category>> {
        query::select_rows(
            self.conn,
            EntityKind::Category,
            CATEGORY_SELECT_SQL,
            filter,
            page,
            parse_category_row,
        )
    }

    fn count_categories(&self, filter: &EntityFilter) -> RepoResult<u64> {
        query::count(self.conn, EntityKind::Category, filter)
    }

    fn delete_category(&self, id: CategoryId) -> RepoResult<()> {
        let removed = query::delete_ids(self.conn, EntityKind::Category, &[id])?;
        if removed == 0 {
            return Err(RepoError::NotFound {
                kind: EntityKind::Category,
                id,
            });
        }
        Ok(())
    }
}

fn load_required_category(conn: &Connection, id: CategoryId) -> RepoResult<Category> {
    SqliteCategoryRepository::new(conn)
        .get_category(id)?
        .ok_or(RepoError::NotFound {
            kind: EntityKind::Category,
            id,
        })
}

fn parse_category_row(row: &Row<'_>) -> RepoResult<Category> {
    let id_text: String = row.get("category_id")?;
    Ok(Category {
        category_id: parse_uuid(&id_text, "categories.category_id")?,
        title: row.get("title")?,
        summary: row.get("summary")?,
        created: row.get("created")?,
        last_edit: row.get("last_edit")?,
    })
}
