//! Driving port for article mutations.
//!
//! Both commands report a missing article as `Ok(None)` rather than an
//! error; the HTTP adapter renders that as a plain-text notice.

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::{Article, ArticleName, Error, Identity};

/// Request to append a comment.
#[derive(Debug, Clone, PartialEq)]
pub struct CommentRequest {
    pub name: ArticleName,
    pub identity: Identity,
    /// Author supplied in the request body. Only honoured in anonymous mode.
    pub posted_by: Option<Value>,
    pub text: Option<Value>,
}

/// Domain use-case port for upvotes and comments.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ArticleCommand: Send + Sync {
    /// Record an upvote and return the article as stored afterwards.
    async fn upvote(
        &self,
        name: &ArticleName,
        identity: &Identity,
    ) -> Result<Option<Article>, Error>;

    /// Append a comment and return the article as stored afterwards.
    async fn add_comment(&self, request: CommentRequest) -> Result<Option<Article>, Error>;
}
