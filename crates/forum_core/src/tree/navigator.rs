//! Single-level expansion and subtree collection.

use crate::model::{CategoryId, Comment, CommentId, EntityKind, PostId};
use crate::repo::comment_repo::{CommentRepository, SqliteCommentRepository};
use crate::repo::post_repo::{PostRepository, SqlitePostRepository};
use crate::repo::query::{self, EntityFilter, ParentFilter};
use crate::repo::{parse_uuid, RepoError, RepoResult};
use crate::search::listing::PostSummary;
use crate::search::page::Pagination;
use rusqlite::Connection;
use serde::Serialize;

/// Comment with the number of its direct replies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentSummary {
    #[serde(flatten)]
    pub comment: Comment,
    pub comments_count: u64,
}

/// A post expanded with one page of its comments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostWithComments {
    pub post: PostSummary,
    pub comments: Vec<CommentSummary>,
}

/// A comment expanded with one page of its direct replies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentWithNested {
    pub comment: CommentSummary,
    pub nested_comments: Vec<Comment>,
}

/// Where a comment subtree walk starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubtreeRoot {
    /// One comment and all of its descendants.
    Comment(CommentId),
    /// Every comment attached to a post.
    Post(PostId),
    /// Every comment attached to any post of a category.
    Category(CategoryId),
}

/// Loads a post with one page of its comments.
///
/// The page covers every comment carrying `post_id`, nested replies
/// included; `post.comments_count` counts the same set.
pub fn get_post_with_comments(
    conn: &Connection,
    post_id: PostId,
    page: &Pagination,
) -> RepoResult<PostWithComments> {
    let post = SqlitePostRepository::new(conn)
        .get_post(post_id)?
        .ok_or(RepoError::NotFound {
            kind: EntityKind::Post,
            id: post_id,
        })?;

    let filter = EntityFilter::by_parent(ParentFilter::Post(post_id));
    let comments_repo = SqliteCommentRepository::new(conn);
    let comments_count = comments_repo.count_comments(&filter)?;
    let comments = comments_repo
        .list_comments(&filter, Some(page))?
        .into_iter()
        .map(|comment| summarize(conn, comment))
        .collect::<RepoResult<Vec<_>>>()?;

    Ok(PostWithComments {
        post: PostSummary {
            post,
            comments_count,
        },
        comments,
    })
}

/// Loads a comment with one page of its direct replies.
pub fn get_comment_with_nested(
    conn: &Connection,
    comment_id: CommentId,
    page: &Pagination,
) -> RepoResult<CommentWithNested> {
    let repo = SqliteCommentRepository::new(conn);
    let comment = repo.get_comment(comment_id)?.ok_or(RepoError::NotFound {
        kind: EntityKind::Comment,
        id: comment_id,
    })?;

    let nested_comments = repo.list_comments(
        &EntityFilter::by_parent(ParentFilter::Comment(comment_id)),
        Some(page),
    )?;

    Ok(CommentWithNested {
        comment: summarize(conn, comment)?,
        nested_comments,
    })
}

/// Collects comment ids of the subtree(s) under `root`, deepest first.
///
/// Deleting in the returned order never removes a parent before one of its
/// replies.
pub fn collect_comment_subtree(
    conn: &Connection,
    root: SubtreeRoot,
) -> RepoResult<Vec<CommentId>> {
    let (root_predicate, root_id) = match root {
        SubtreeRoot::Comment(id) => ("comment_id = ?1", id),
        SubtreeRoot::Post(id) => ("post_id = ?1", id),
        SubtreeRoot::Category(id) => (
            "post_id IN (SELECT post_id FROM posts WHERE category_id = ?1)",
            id,
        ),
    };

    let mut stmt = conn.prepare(&format!(
        "WITH RECURSIVE subtree(comment_id, depth) AS (
            SELECT comment_id, 0
            FROM comments
            WHERE {root_predicate}
            UNION ALL
            SELECT child.comment_id, parent.depth + 1
            FROM comments child
            INNER JOIN subtree parent ON child.parent_comment_id = parent.comment_id
        )
        SELECT comment_id, MAX(depth) AS max_depth
        FROM subtree
        GROUP BY comment_id
        ORDER BY max_depth DESC, comment_id ASC;"
    ))?;

    let mut rows = stmt.query([root_id.to_string()])?;
    let mut ids = Vec::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        ids.push(parse_uuid(&value, "comments.comment_id")?);
    }
    Ok(ids)
}

fn summarize(conn: &Connection, comment: Comment) -> RepoResult<CommentSummary> {
    let comments_count = query::count(
        conn,
        EntityKind::Comment,
        &EntityFilter::by_parent(ParentFilter::Comment(comment.comment_id)),
    )?;
    Ok(CommentSummary {
        comment,
        comments_count,
    })
}
