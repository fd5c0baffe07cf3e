//! Post repository contract and SQLite implementation.
//!
//! # Invariants
//! - An insert referencing a missing category fails with `NotFound`, either
//!   from the caller's pre-check or from the `posts.category_id` foreign key.

use crate::db::NOW_EPOCH_MS_SQL;
use crate::model::{ContentPatch, EntityKind, NewPost, Post, PostId};
use crate::repo::query::{self, EntityFilter};
use crate::repo::{is_foreign_key_violation, parse_uuid, RepoError, RepoResult};
use crate::search::page::Pagination;
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

const POST_SELECT_SQL: &str = "SELECT
    post_id,
    category_id,
    title,
    body,
    created,
    last_edit
FROM posts";

/// Repository interface for post persistence.
pub trait PostRepository {
    fn create_post(&self, draft: &NewPost) -> RepoResult<Post>;
    fn get_post(&self, id: PostId) -> RepoResult<Option<Post>>;
    fn update_post(&self, id: PostId, patch: &ContentPatch) -> RepoResult<Post>;
    fn list_posts(&self, filter: &EntityFilter, page: Option<&Pagination>)
        -> RepoResult<Vec<Post>>;
    fn count_posts(&self, filter: &EntityFilter) -> RepoResult<u64>;
    /// Deletes the post row only.
    fn delete_post(&self, id: PostId) -> RepoResult<()>;
}

/// SQLite-backed post repository.
pub struct SqlitePostRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePostRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl PostRepository for SqlitePostRepository<'_> {
    fn create_post(&self, draft: &NewPost) -> RepoResult<Post> {
        let post_id = Uuid::new_v4();
        let inserted = self.conn.execute(
            &format!(
                "INSERT INTO posts (post_id, category_id, title, body, created, last_edit)
                 VALUES (?1, ?2, ?3, ?4, {NOW_EPOCH_MS_SQL}, NULL);"
            ),
            params![
                post_id.to_string(),
                draft.category_id.to_string(),
                draft.title.as_str(),
                draft.body.as_str(),
            ],
        );

        match inserted {
            Ok(_) => load_required_post(self.conn, post_id),
            Err(err) if is_foreign_key_violation(&err) => Err(RepoError::NotFound {
                kind: EntityKind::Category,
                id: draft.category_id,
            }),
            Err(err) => Err(err.into()),
        }
    }

    fn get_post(&self, id: PostId) -> RepoResult<Option<Post>> {
        let mut rows = self.list_posts(&EntityFilter::by_id(id), None)?;
        Ok(rows.pop())
    }

    fn update_post(&self, id: PostId, patch: &ContentPatch) -> RepoResult<Post> {
        let changed = self.conn.execute(
            &format!(
                "UPDATE posts
                 SET
                    title = COALESCE(?2, title),
                    body = COALESCE(?3, body),
                    last_edit = MAX(COALESCE(last_edit, created), {NOW_EPOCH_MS_SQL})
                 WHERE post_id = ?1;"
            ),
            params![id.to_string(), patch.title.as_deref(), patch.body.as_deref()],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                kind: EntityKind::Post,
                id,
            });
        }

        load_required_post(self.conn, id)
    }

    fn list_posts(
        &self,
        filter: &EntityFilter,
        page: Option<&Pagination>,
    ) -> RepoResult<Vec<Post>> {
        query::select_rows(
            self.conn,
            EntityKind::Post,
            POST_SELECT_SQL,
            filter,
            page,
            parse_post_row,
        )
    }

    fn count_posts(&self, filter: &EntityFilter) -> RepoResult<u64> {
        query::count(self.conn, EntityKind::Post, filter)
    }

    fn delete_post(&self, id: PostId) -> RepoResult<()> {
        if query::delete_ids(self.conn, EntityKind::Post, &[id])? == 0 {
            return Err(RepoError::NotFound {
                kind: EntityKind::Post,
                id,
            });
        }
        Ok(())
    }
}

fn load_required_post(conn: &Connection, id: PostId) -> RepoResult<Post> {
    SqlitePostRepository::new(conn)
        .get_post(id)?
        .ok_or(RepoError::NotFound {
            kind: EntityKind::Post,
            id,
        })
}

fn parse_post_row(row: &Row<'_>) -> RepoResult<Post> {
    let post_id: String = row.get("post_id")?;
    let category_id: String = row.get("category_id")?;
    Ok(Post {
        post_id: parse_uuid(&post_id, "posts.post_id")?,
        category_id: parse_uuid(&category_id, "posts.category_id")?,
        title: row.get("title")?,
        body: row.get("body")?,
        created: row.get("created")?,
        last_edit: row.get("last_edit")?,
    })
}
