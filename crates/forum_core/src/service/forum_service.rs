//! Forum use-case service.
//!
//! # Responsibility
//! - Expose one operation per entity/action to the serving layer.
//! - Run every operation inside exactly one gateway scope.
//! - Classify failures into validation, not-found and internal errors.
//!
//! # Invariants
//! - Parent existence checks and the dependent write share one IMMEDIATE
//!   transaction.
//! - A parent comment must live on the same post as its reply.
//! - Deletes remove the whole owned subtree, deepest comments first.
//! - Log lines carry ids, codes and timings only, never titles or bodies.

use crate::config::ForumConfig;
use crate::db::{DbError, Gateway};
use crate::logging::{init_logging, normalize_level};
use crate::model::{
    Category, CategoryId, CategoryPatch, Comment, CommentId, ContentPatch, EntityKind,
    NewCategory, NewComment, NewPost, Post, PostId, ValidationError,
};
use crate::repo::category_repo::{CategoryRepository, SqliteCategoryRepository};
use crate::repo::comment_repo::{CommentRepository, SqliteCommentRepository};
use crate::repo::post_repo::{PostRepository, SqlitePostRepository};
use crate::repo::query::{self, EntityFilter, ParentFilter};
use crate::repo::RepoError;
use crate::search::listing::{self, CategorySummary, PostSummary, SearchError};
use crate::search::page::{Page, Pagination};
use crate::tree::navigator::{
    self, collect_comment_subtree, CommentWithNested, PostWithComments, SubtreeRoot,
};
use log::{error, info, warn};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;
use uuid::Uuid;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Coarse error class for the serving layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller supplied invalid input.
    Validation,
    /// A referenced entity, or any listing match, is missing.
    NotFound,
    /// Store or configuration failure.
    Internal,
}

/// Errors from forum service operations.
#[derive(Debug)]
pub enum ServiceError {
    Validation(ValidationError),
    /// Referenced entity does not exist.
    NotFound { kind: EntityKind, id: Uuid },
    /// A listing or search matched nothing.
    NoResults(EntityKind),
    /// Logging or store configuration could not be applied.
    Config(String),
    /// Store failure or undecodable persisted data.
    Repo(RepoError),
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound { .. } | Self::NoResults(_) => ErrorKind::NotFound,
            Self::Config(_) | Self::Repo(_) => ErrorKind::Internal,
        }
    }

    /// Stable snake_case identifier for log lines and error payloads.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(ValidationError::EmptyField(_)) => "empty_field",
            Self::Validation(ValidationError::NothingToChange) => "nothing_to_change",
            Self::Validation(ValidationError::MissingPagination(_)) => "missing_pagination",
            Self::Validation(ValidationError::InvalidPagination { .. }) => "invalid_pagination",
            Self::Validation(ValidationError::EmptySearchTerm) => "empty_search_term",
            Self::Validation(ValidationError::ParentOnOtherPost { .. }) => "parent_on_other_post",
            Self::NotFound { .. } => "not_found",
            Self::NoResults(_) => "no_results",
            Self::Config(_) => "config_error",
            Self::Repo(RepoError::Db(_)) => "db_error",
            Self::Repo(RepoError::InvalidData(_)) => "invalid_data",
            Self::Repo(_) => "repo_error",
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound { kind, id } => write!(f, "no {} {id} in database", kind.label()),
            Self::NoResults(kind) => write!(f, "no {} matched", kind.label()),
            Self::Config(message) => write!(f, "invalid forum configuration: {message}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            RepoError::NotFound { kind, id } => Self::NotFound { kind, id },
            other => Self::Repo(other),
        }
    }
}

impl From<SearchError> for ServiceError {
    fn from(value: SearchError) -> Self {
        match value {
            SearchError::Validation(err) => Self::Validation(err),
            SearchError::NoResults(kind) => Self::NoResults(kind),
            SearchError::Repo(err) => err.into(),
        }
    }
}

impl From<DbError> for ServiceError {
    fn from(value: DbError) -> Self {
        Self::Repo(RepoError::Db(value))
    }
}

/// Rows removed by one cascading delete, per table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeleteReport {
    pub categories: usize,
    pub posts: usize,
    pub comments: usize,
}

impl DeleteReport {
    pub fn total(&self) -> usize {
        self.categories + self.posts + self.comments
    }
}

/// Forum service facade over one explicit gateway.
pub struct ForumService {
    gateway: Gateway,
}

impl ForumService {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    /// Applies `config` (logging first) and opens the configured store.
    ///
    /// # Errors
    /// - [`ServiceError::Config`] for an unsupported log level or a logging
    ///   directory that cannot be used.
    /// - [`ServiceError::Repo`] when the store cannot be opened or migrated.
    pub fn open(config: &ForumConfig) -> ServiceResult<Self> {
        let level = normalize_level(&config.log_level).map_err(ServiceError::Config)?;
        if let Some(log_dir) = &config.log_dir {
            let log_dir = log_dir.to_str().ok_or_else(|| {
                ServiceError::Config(format!(
                    "log_dir `{}` is not valid UTF-8",
                    log_dir.display()
                ))
            })?;
            init_logging(level, log_dir).map_err(ServiceError::Config)?;
        }

        let gateway = match &config.db_path {
            Some(path) => Gateway::open(path)?,
            None => Gateway::open_in_memory()?,
        };
        info!(
            "event=service_open module=service status=ok store={}",
            if config.db_path.is_some() { "file" } else { "memory" }
        );
        Ok(Self::new(gateway))
    }

    /// Shortcut for an in-memory store without touching logging.
    pub fn open_in_memory() -> ServiceResult<Self> {
        Ok(Self::new(Gateway::open_in_memory()?))
    }

    /// Read-only access to the gateway, e.g. for diagnostics.
    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    /// Releases the store connection.
    pub fn close(self) -> ServiceResult<()> {
        self.gateway.close()?;
        info!("event=service_close module=service status=ok");
        Ok(())
    }

    pub fn create_category(&mut self, title: &str, summary: &str) -> ServiceResult<Category> {
        let started_at = Instant::now();
        let result = NewCategory::new(title, summary)
            .map_err(ServiceError::from)
            .and_then(|draft| {
                self.gateway.with_transaction(|tx| {
                    SqliteCategoryRepository::new(tx)
                        .create_category(&draft)
                        .map_err(ServiceError::from)
                })
            });
        finish("category_create", started_at, result)
    }

    pub fn create_post(
        &mut self,
        category_id: CategoryId,
        title: &str,
        body: &str,
    ) -> ServiceResult<Post> {
        let started_at = Instant::now();
        let result = NewPost::new(category_id, title, body)
            .map_err(ServiceError::from)
            .and_then(|draft| {
                self.gateway.with_transaction(|tx| {
                    ensure_exists(tx, EntityKind::Category, category_id)?;
                    SqlitePostRepository::new(tx)
                        .create_post(&draft)
                        .map_err(ServiceError::from)
                })
            });
        finish("post_create", started_at, result)
    }

    /// Creates a comment on `post_id`, nested under `parent_comment_id` when
    /// given.
    pub fn create_comment(
        &mut self,
        post_id: PostId,
        title: &str,
        body: &str,
        parent_comment_id: Option<CommentId>,
    ) -> ServiceResult<Comment> {
        let started_at = Instant::now();
        let result = NewComment::new(post_id, title, body, parent_comment_id)
            .map_err(ServiceError::from)
            .and_then(|draft| {
                self.gateway.with_transaction(|tx| {
                    ensure_exists(tx, EntityKind::Post, post_id)?;
                    let repo = SqliteCommentRepository::new(tx);
                    if let Some(parent_id) = draft.parent_comment_id {
                        let parent = repo.get_comment(parent_id)?.ok_or(ServiceError::NotFound {
                            kind: EntityKind::Comment,
                            id: parent_id,
                        })?;
                        if parent.post_id != post_id {
                            return Err(ServiceError::Validation(
                                ValidationError::ParentOnOtherPost {
                                    parent_comment_id: parent_id,
                                    post_id,
                                },
                            ));
                        }
                    }
                    repo.create_comment(&draft).map_err(ServiceError::from)
                })
            });
        finish("comment_create", started_at, result)
    }

    pub fn get_category(&mut self, category_id: CategoryId) -> ServiceResult<Category> {
        self.gateway.with_read_transaction(|tx| {
            SqliteCategoryRepository::new(tx)
                .get_category(category_id)?
                .ok_or(ServiceError::NotFound {
                    kind: EntityKind::Category,
                    id: category_id,
                })
        })
    }

    pub fn get_post(&mut self, post_id: PostId) -> ServiceResult<Post> {
        self.gateway.with_read_transaction(|tx| {
            SqlitePostRepository::new(tx)
                .get_post(post_id)?
                .ok_or(ServiceError::NotFound {
                    kind: EntityKind::Post,
                    id: post_id,
                })
        })
    }

    pub fn get_comment(&mut self, comment_id: CommentId) -> ServiceResult<Comment> {
        self.gateway.with_read_transaction(|tx| {
            SqliteCommentRepository::new(tx)
                .get_comment(comment_id)?
                .ok_or(ServiceError::NotFound {
                    kind: EntityKind::Comment,
                    id: comment_id,
                })
        })
    }

    /// Updates the supplied category fields that differ from stored values.
    ///
    /// Blank values count as not supplied. Fails with `NothingToChange` when
    /// no supplied field differs.
    pub fn update_category(
        &mut self,
        category_id: CategoryId,
        title: Option<&str>,
        summary: Option<&str>,
    ) -> ServiceResult<Category> {
        let started_at = Instant::now();
        let patch = CategoryPatch {
            title: title.map(str::to_owned),
            summary: summary.map(str::to_owned),
        };
        let result = self.gateway.with_transaction(|tx| {
            let repo = SqliteCategoryRepository::new(tx);
            let current = repo.get_category(category_id)?.ok_or(ServiceError::NotFound {
                kind: EntityKind::Category,
                id: category_id,
            })?;
            let diff = patch.diff(&current)?;
            repo.update_category(category_id, &diff)
                .map_err(ServiceError::from)
        });
        finish("category_update", started_at, result)
    }

    pub fn update_post(
        &mut self,
        post_id: PostId,
        title: Option<&str>,
        body: Option<&str>,
    ) -> ServiceResult<Post> {
        let started_at = Instant::now();
        let patch = content_patch(title, body);
        let result = self.gateway.with_transaction(|tx| {
            let repo = SqlitePostRepository::new(tx);
            let current = repo.get_post(post_id)?.ok_or(ServiceError::NotFound {
                kind: EntityKind::Post,
                id: post_id,
            })?;
            let diff = patch.diff(&current.title, &current.body)?;
            repo.update_post(post_id, &diff).map_err(ServiceError::from)
        });
        finish("post_update", started_at, result)
    }

    pub fn update_comment(
        &mut self,
        comment_id: CommentId,
        title: Option<&str>,
        body: Option<&str>,
    ) -> ServiceResult<Comment> {
        let started_at = Instant::now();
        let patch = content_patch(title, body);
        let result = self.gateway.with_transaction(|tx| {
            let repo = SqliteCommentRepository::new(tx);
            let current = repo.get_comment(comment_id)?.ok_or(ServiceError::NotFound {
                kind: EntityKind::Comment,
                id: comment_id,
            })?;
            let diff = patch.diff(&current.title, &current.body)?;
            repo.update_comment(comment_id, &diff)
                .map_err(ServiceError::from)
        });
        finish("comment_update", started_at, result)
    }

    /// Deletes a category with all of its posts and their comments.
    pub fn delete_category(&mut self, category_id: CategoryId) -> ServiceResult<DeleteReport> {
        let started_at = Instant::now();
        let result: ServiceResult<DeleteReport> = self.gateway.with_transaction(|tx| {
            ensure_exists(tx, EntityKind::Category, category_id)?;

            let comment_ids = collect_comment_subtree(tx, SubtreeRoot::Category(category_id))?;
            let comments = SqliteCommentRepository::new(tx).delete_comments(&comment_ids)?;

            let post_ids = query::select_ids(
                tx,
                EntityKind::Post,
                &EntityFilter::by_parent(ParentFilter::Category(category_id)),
                None,
            )?;
            let posts = query::delete_ids(tx, EntityKind::Post, &post_ids)?;

            SqliteCategoryRepository::new(tx).delete_category(category_id)?;
            Ok(DeleteReport {
                categories: 1,
                posts,
                comments,
            })
        });
        finish_delete("category_delete", started_at, result)
    }

    /// Deletes a post with every comment attached to it.
    pub fn delete_post(&mut self, post_id: PostId) -> ServiceResult<DeleteReport> {
        let started_at = Instant::now();
        let result: ServiceResult<DeleteReport> = self.gateway.with_transaction(|tx| {
            ensure_exists(tx, EntityKind::Post, post_id)?;

            let comment_ids = collect_comment_subtree(tx, SubtreeRoot::Post(post_id))?;
            let comments = SqliteCommentRepository::new(tx).delete_comments(&comment_ids)?;
            SqlitePostRepository::new(tx).delete_post(post_id)?;
            Ok(DeleteReport {
                categories: 0,
                posts: 1,
                comments,
            })
        });
        finish_delete("post_delete", started_at, result)
    }

    /// Deletes a comment and every reply below it.
    pub fn delete_comment(&mut self, comment_id: CommentId) -> ServiceResult<DeleteReport> {
        let started_at = Instant::now();
        let result: ServiceResult<DeleteReport> = self.gateway.with_transaction(|tx| {
            ensure_exists(tx, EntityKind::Comment, comment_id)?;

            let comment_ids = collect_comment_subtree(tx, SubtreeRoot::Comment(comment_id))?;
            let comments = SqliteCommentRepository::new(tx).delete_comments(&comment_ids)?;
            Ok(DeleteReport {
                categories: 0,
                posts: 0,
                comments,
            })
        });
        finish_delete("comment_delete", started_at, result)
    }

    pub fn list_categories(
        &mut self,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> ServiceResult<Page<CategorySummary>> {
        let started_at = Instant::now();
        let result = Pagination::new(limit, offset)
            .map_err(ServiceError::from)
            .and_then(|page| {
                self.gateway
                    .with_read_transaction(|tx| listing::list_categories(tx, &page))
                    .map_err(ServiceError::from)
            });
        finish("category_list", started_at, result)
    }

    pub fn list_posts(
        &mut self,
        category_id: CategoryId,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> ServiceResult<Page<PostSummary>> {
        let started_at = Instant::now();
        let result = Pagination::new(limit, offset)
            .map_err(ServiceError::from)
            .and_then(|page| {
                self.gateway
                    .with_read_transaction(|tx| listing::list_posts(tx, category_id, &page))
                    .map_err(ServiceError::from)
            });
        finish("post_list", started_at, result)
    }

    /// Categories whose title contains `term` (case-sensitive, literal).
    pub fn search_categories(
        &mut self,
        term: &str,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> ServiceResult<Page<CategorySummary>> {
        let started_at = Instant::now();
        let result = Pagination::new(limit, offset)
            .map_err(ServiceError::from)
            .and_then(|page| {
                self.gateway
                    .with_read_transaction(|tx| listing::search_categories(tx, term, &page))
                    .map_err(ServiceError::from)
            });
        finish("category_search", started_at, result)
    }

    /// Posts whose title contains `term` (case-sensitive, literal).
    pub fn search_posts(
        &mut self,
        term: &str,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> ServiceResult<Page<PostSummary>> {
        let started_at = Instant::now();
        let result = Pagination::new(limit, offset)
            .map_err(ServiceError::from)
            .and_then(|page| {
                self.gateway
                    .with_read_transaction(|tx| listing::search_posts(tx, term, &page))
                    .map_err(ServiceError::from)
            });
        finish("post_search", started_at, result)
    }

    pub fn get_post_with_comments(
        &mut self,
        post_id: PostId,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> ServiceResult<PostWithComments> {
        let started_at = Instant::now();
        let result = Pagination::new(limit, offset)
            .map_err(ServiceError::from)
            .and_then(|page| {
                self.gateway.with_read_transaction(|tx| {
                    navigator::get_post_with_comments(tx, post_id, &page)
                        .map_err(ServiceError::from)
                })
            });
        finish("post_expand", started_at, result)
    }

    pub fn get_comment_with_nested(
        &mut self,
        comment_id: CommentId,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> ServiceResult<CommentWithNested> {
        let started_at = Instant::now();
        let result = Pagination::new(limit, offset)
            .map_err(ServiceError::from)
            .and_then(|page| {
                self.gateway.with_read_transaction(|tx| {
                    navigator::get_comment_with_nested(tx, comment_id, &page)
                        .map_err(ServiceError::from)
                })
            });
        finish("comment_expand", started_at, result)
    }
}

fn ensure_exists(conn: &rusqlite::Connection, kind: EntityKind, id: Uuid) -> ServiceResult<()> {
    if query::exists(conn, kind, id)? {
        Ok(())
    } else {
        Err(ServiceError::NotFound { kind, id })
    }
}

fn content_patch(title: Option<&str>, body: Option<&str>) -> ContentPatch {
    ContentPatch {
        title: title.map(str::to_owned),
        body: body.map(str::to_owned),
    }
}

fn finish<T>(event: &'static str, started_at: Instant, result: ServiceResult<T>) -> ServiceResult<T> {
    match &result {
        Ok(_) => info!(
            "event={event} module=service status=ok duration_ms={}",
            started_at.elapsed().as_millis()
        ),
        Err(err) => log_failure(event, started_at, err),
    }
    result
}

fn finish_delete(
    event: &'static str,
    started_at: Instant,
    result: ServiceResult<DeleteReport>,
) -> ServiceResult<DeleteReport> {
    match &result {
        Ok(report) => info!(
            "event={event} module=service status=ok categories={} posts={} comments={} duration_ms={}",
            report.categories,
            report.posts,
            report.comments,
            started_at.elapsed().as_millis()
        ),
        Err(err) => log_failure(event, started_at, err),
    }
    result
}

fn log_failure(event: &'static str, started_at: Instant, err: &ServiceError) {
    let duration_ms = started_at.elapsed().as_millis();
    match err.kind() {
        ErrorKind::Internal => error!(
            "event={event} module=service status=error error_code={} duration_ms={duration_ms} error={err}",
            err.code()
        ),
        ErrorKind::Validation | ErrorKind::NotFound => warn!(
            "event={event} module=service status=rejected error_code={} duration_ms={duration_ms}",
            err.code()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorKind, ForumService, ServiceError};
    use crate::model::{EntityKind, ValidationError};
    use crate::repo::RepoError;
    use uuid::Uuid;

    fn service() -> ForumService {
        ForumService::open_in_memory().unwrap()
    }

    #[test]
    fn error_kinds_and_codes_are_stable() {
        let validation = ServiceError::from(ValidationError::NothingToChange);
        assert_eq!(validation.kind(), ErrorKind::Validation);
        assert_eq!(validation.code(), "nothing_to_change");

        let missing = ServiceError::from(RepoError::NotFound {
            kind: EntityKind::Post,
            id: Uuid::nil(),
        });
        assert_eq!(missing.kind(), ErrorKind::NotFound);
        assert_eq!(missing.code(), "not_found");

        let internal = ServiceError::from(RepoError::InvalidData("bad uuid".to_string()));
        assert_eq!(internal.kind(), ErrorKind::Internal);
        assert_eq!(internal.code(), "invalid_data");
    }

    #[test]
    fn create_comment_rejects_parent_from_another_post() {
        let mut service = service();
        let category = service.create_category("Tech", "About tech").unwrap();
        let first = service.create_post(category.category_id, "A", "a").unwrap();
        let second = service.create_post(category.category_id, "B", "b").unwrap();
        let parent = service
            .create_comment(first.post_id, "Nice", "Thanks!", None)
            .unwrap();

        let err = service
            .create_comment(second.post_id, "Reply", "Re:", Some(parent.comment_id))
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Validation(ValidationError::ParentOnOtherPost { .. })
        ));
    }

    #[test]
    fn create_comment_with_unknown_parent_is_not_found() {
        let mut service = service();
        let category = service.create_category("Tech", "About tech").unwrap();
        let post = service.create_post(category.category_id, "A", "a").unwrap();
        let ghost = Uuid::new_v4();

        let err = service
            .create_comment(post.post_id, "Reply", "Re:", Some(ghost))
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::NotFound { kind: EntityKind::Comment, id } if id == ghost
        ));
    }

    #[test]
    fn update_of_missing_entity_is_not_found_before_diffing() {
        let mut service = service();
        let err = service
            .update_category(Uuid::new_v4(), None, None)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn listing_validates_pagination_before_touching_the_store() {
        let mut service = service();
        let err = service.list_categories(None, Some(0)).unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Validation(ValidationError::MissingPagination("limit"))
        ));
    }
}
