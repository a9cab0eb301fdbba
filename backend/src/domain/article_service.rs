//! Article domain service.
//!
//! Implements the read and mutation driving ports on top of an
//! [`ArticleRepository`]. Mutations follow a read, conditional write, re-read
//! sequence; only the upvote write itself is atomic.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::domain::ports::{
    ArticleCommand, ArticleQuery, ArticleRepository, ArticleRepositoryError, ArticleView,
    CommentRequest,
};
use crate::domain::{AccessMode, Article, ArticleName, Comment, Error, Identity};

/// Article service implementing [`ArticleQuery`] and [`ArticleCommand`].
pub struct ArticleService<R> {
    repository: Arc<R>,
    mode: AccessMode,
}

impl<R> Clone for ArticleService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            mode: self.mode,
        }
    }
}

impl<R> ArticleService<R> {
    /// Create a new service over the given repository.
    pub fn new(repository: Arc<R>, mode: AccessMode) -> Self {
        Self { repository, mode }
    }

    fn can_upvote(&self, article: &Article, identity: &Identity) -> bool {
        match self.mode {
            AccessMode::Anonymous => true,
            AccessMode::Authenticated => identity
                .uid()
                .is_some_and(|uid| !article.has_upvoted(uid.as_ref())),
        }
    }
}

impl<R> ArticleService<R>
where
    R: ArticleRepository,
{
    fn map_repository_error(error: ArticleRepositoryError) -> Error {
        match error {
            ArticleRepositoryError::Connection { message } => {
                warn!(%message, "article store unreachable");
                Error::service_unavailable("article store unavailable")
            }
            ArticleRepositoryError::Query { message } => {
                Error::internal(format!("article store error: {message}"))
            }
            ArticleRepositoryError::Decode { message } => {
                Error::internal(format!("article document invalid: {message}"))
            }
        }
    }

    async fn find(&self, name: &ArticleName) -> Result<Option<Article>, Error> {
        self.repository
            .find_by_name(name)
            .await
            .map_err(Self::map_repository_error)
    }
}

#[async_trait]
impl<R> ArticleQuery for ArticleService<R>
where
    R: ArticleRepository,
{
    async fn fetch_article(
        &self,
        name: &ArticleName,
        identity: &Identity,
    ) -> Result<ArticleView, Error> {
        let article = self.find(name).await?.ok_or_else(|| {
            Error::not_found("article not found").with_details(json!({ "name": name.as_ref() }))
        })?;
        let can_upvote = self.can_upvote(&article, identity);
        Ok(ArticleView {
            article,
            can_upvote,
        })
    }
}

#[async_trait]
impl<R> ArticleCommand for ArticleService<R>
where
    R: ArticleRepository,
{
    async fn upvote(
        &self,
        name: &ArticleName,
        identity: &Identity,
    ) -> Result<Option<Article>, Error> {
        let Some(article) = self.find(name).await? else {
            return Ok(None);
        };

        match (self.mode, identity.uid()) {
            (AccessMode::Anonymous, _) => {
                self.repository
                    .increment_upvotes(name)
                    .await
                    .map_err(Self::map_repository_error)?;
            }
            (AccessMode::Authenticated, Some(uid)) if !article.has_upvoted(uid.as_ref()) => {
                let updated = self
                    .repository
                    .record_upvote(name, uid)
                    .await
                    .map_err(Self::map_repository_error)?;
                if !updated {
                    debug!(article = %name, "upvote raced with a duplicate; left unchanged");
                }
            }
            (AccessMode::Authenticated, _) => {
                debug!(article = %name, "requester not eligible to upvote");
            }
        }

        self.find(name).await
    }

    async fn add_comment(&self, request: CommentRequest) -> Result<Option<Article>, Error> {
        let CommentRequest {
            name,
            identity,
            posted_by,
            text,
        } = request;
        let posted_by = match self.mode {
            AccessMode::Anonymous => posted_by,
            AccessMode::Authenticated => identity.email().map(Value::from),
        };
        let comment = Comment::new(posted_by, text);

        let matched = self
            .repository
            .append_comment(&name, &comment)
            .await
            .map_err(Self::map_repository_error)?;
        if !matched {
            debug!(article = %name, "comment targeted a missing article");
        }

        self.find(&name).await
    }
}

#[cfg(test)]
#[path = "article_service_tests.rs"]
mod tests;
