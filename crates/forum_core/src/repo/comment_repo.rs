//! Comment repository contract and SQLite implementation.
//!
//! # Invariants
//! - `post_id` and `parent_comment_id` are backed by foreign keys; a
//!   violation is reported as `NotFound` for whichever reference is missing.
//! - `parent_comment_id` is never rewritten by updates.

use crate::db::NOW_EPOCH_MS_SQL;
use crate::model::{Comment, CommentId, ContentPatch, EntityKind, NewComment};
use crate::repo::query::{self, EntityFilter};
use crate::repo::{is_foreign_key_violation, parse_uuid, RepoError, RepoResult};
use crate::search::page::Pagination;
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

const COMMENT_SELECT_SQL: &str = "SELECT
    comment_id,
    post_id,
    parent_comment_id,
    title,
    body,
    created,
    last_edit
FROM comments";

/// Repository interface for comment persistence.
pub trait CommentRepository {
    fn create_comment(&self, draft: &NewComment) -> RepoResult<Comment>;
    fn get_comment(&self, id: CommentId) -> RepoResult<Option<Comment>>;
    fn update_comment(&self, id: CommentId, patch: &ContentPatch) -> RepoResult<Comment>;
    fn list_comments(
        &self,
        filter: &EntityFilter,
        page: Option<&Pagination>,
    ) -> RepoResult<Vec<Comment>>;
    fn count_comments(&self, filter: &EntityFilter) -> RepoResult<u64>;
    /// Deletes comment rows in the given order; callers pass leaves first.
    fn delete_comments(&self, ids: &[CommentId]) -> RepoResult<usize>;
}

/// SQLite-backed comment repository.
pub struct SqliteCommentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCommentRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn missing_reference(&self, draft: &NewComment) -> RepoResult<RepoError> {
        if !query::exists(self.conn, EntityKind::Post, draft.post_id)? {
            return Ok(RepoError::NotFound {
                kind: EntityKind::Post,
                id: draft.post_id,
            });
        }
        match draft.parent_comment_id {
            Some(parent_id) => Ok(RepoError::NotFound {
                kind: EntityKind::Comment,
                id: parent_id,
            }),
            None => Ok(RepoError::InvalidData(
                "comment insert violated a foreign key with no missing reference".to_string(),
            )),
        }
    }
}

impl CommentRepository for SqliteCommentRepository<'_> {
    fn create_comment(&self, draft: &NewComment) -> RepoResult<Comment> {
        let comment_id = Uuid::new_v4();
        let inserted = self.conn.execute(
            &format!(
                "INSERT INTO comments (
                    comment_id,
                    post_id,
                    parent_comment_id,
                    title,
                    body,
                    created,
                    last_edit
                ) VALUES (?1, ?2, ?3, ?4, ?5, {NOW_EPOCH_MS_SQL}, NULL);"
            ),
            params![
                comment_id.to_string(),
                draft.post_id.to_string(),
                draft.parent_comment_id.map(|value| value.to_string()),
                draft.title.as_str(),
                draft.body.as_str(),
            ],
        );

        match inserted {
            Ok(_) => load_required_comment(self.conn, comment_id),
            Err(err) if is_foreign_key_violation(&err) => Err(self.missing_reference(draft)?),
            Err(err) => Err(err.into()),
        }
    }

    fn get_comment(&self, id: CommentId) -> RepoResult<Option<Comment>> {
        let mut rows = self.list_comments(&EntityFilter::by_id(id), None)?;
        Ok(rows.pop())
    }

    fn update_comment(&self, id: CommentId, patch: &ContentPatch) -> RepoResult<Comment> {
        let changed = self.conn.execute(
            &format!(
                "UPDATE comments
                 SET
                    title = COALESCE(?2, title),
                    body = COALESCE(?3, body),
                    last_edit = MAX(COALESCE(last_edit, created), {NOW_EPOCH_MS_SQL})
                 WHERE comment_id = ?1;"
            ),
            params![id.to_string(), patch.title.as_deref(), patch.body.as_deref()],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                kind: EntityKind::Comment,
                id,
            });
        }

        load_required_comment(self.conn, id)
    }

    fn list_comments(
        &self,
        filter: &EntityFilter,
        page: Option<&Pagination>,
    ) -> RepoResult<Vec<Comment>> {
        query::select_rows(
            self.conn,
            EntityKind::Comment,
            COMMENT_SELECT_SQL,
            filter,
            page,
            parse_comment_row,
        )
    }

    fn count_comments(&self, filter: &EntityFilter) -> RepoResult<u64> {
        query::count(self.conn, EntityKind::Comment, filter)
    }

    fn delete_comments(&self, ids: &[CommentId]) -> RepoResult<usize> {
        query::delete_ids(self.conn, EntityKind::Comment, ids)
    }
}

fn load_required_comment(conn: &Connection, id: CommentId) -> RepoResult<Comment> {
    SqliteCommentRepository::new(conn)
        .get_comment(id)?
        .ok_or(RepoError::NotFound {
            kind: EntityKind::Comment,
            id,
        })
}

fn parse_comment_row(row: &Row<'_>) -> RepoResult<Comment> {
    let comment_id: String = row.get("comment_id")?;
    let post_id: String = row.get("post_id")?;
    let parent_comment_id = row
        .get::<_, Option<String>>("parent_comment_id")?
        .map(|value| parse_uuid(&value, "comments.parent_comment_id"))
        .transpose()?;

    Ok(Comment {
        comment_id: parse_uuid(&comment_id, "comments.comment_id")?,
        post_id: parse_uuid(&post_id, "comments.post_id")?,
        parent_comment_id,
        title: row.get("title")?,
        body: row.get("body")?,
        created: row.get("created")?,
        last_edit: row.get("last_edit")?,
    })
}

#[cfg(test)]
mod tests {
    use super::{CommentRepository, SqliteCommentRepository};
    use crate::db::open_db_in_memory;
    use crate::model::{EntityKind, NewCategory, NewComment, NewPost};
    use crate::repo::category_repo::{CategoryRepository, SqliteCategoryRepository};
    use crate::repo::post_repo::{PostRepository, SqlitePostRepository};
    use crate::repo::query::EntityFilter;
    use crate::repo::RepoError;
    use rusqlite::Connection;
    use uuid::Uuid;

    fn seeded_post(conn: &Connection) -> Uuid {
        let category = SqliteCategoryRepository::new(conn)
            .create_category(&NewCategory::new("Tech", "About tech").unwrap())
            .unwrap();
        SqlitePostRepository::new(conn)
            .create_post(&NewPost::new(category.category_id, "Intro", "Body").unwrap())
            .unwrap()
            .post_id
    }

    #[test]
    fn insert_under_missing_post_reports_the_post() {
        let conn = open_db_in_memory().unwrap();
        let ghost = Uuid::new_v4();
        let draft = NewComment::new(ghost, "Nice", "Thanks!", Some(Uuid::new_v4())).unwrap();

        let err = SqliteCommentRepository::new(&conn)
            .create_comment(&draft)
            .unwrap_err();
        assert!(matches!(
            err,
            RepoError::NotFound { kind: EntityKind::Post, id } if id == ghost
        ));
    }

    #[test]
    fn insert_under_missing_parent_reports_the_parent() {
        let conn = open_db_in_memory().unwrap();
        let post_id = seeded_post(&conn);
        let ghost_parent = Uuid::new_v4();
        let draft = NewComment::new(post_id, "Reply", "Re:", Some(ghost_parent)).unwrap();

        let repo = SqliteCommentRepository::new(&conn);
        let err = repo.create_comment(&draft).unwrap_err();
        assert!(matches!(
            err,
            RepoError::NotFound { kind: EntityKind::Comment, id } if id == ghost_parent
        ));
        assert!(repo
            .list_comments(&EntityFilter::all(), None)
            .unwrap()
            .is_empty());
    }
}
