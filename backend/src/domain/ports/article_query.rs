//! Driving port for article reads.

use async_trait::async_trait;

use crate::domain::{Article, ArticleName, Error, Identity};

/// Article decorated for a specific requester.
#[derive(Debug, Clone, PartialEq)]
pub struct ArticleView {
    pub article: Article,
    /// Whether the requester may still upvote this article. Never persisted.
    pub can_upvote: bool,
}

/// Domain use-case port for fetching one article.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ArticleQuery: Send + Sync {
    /// Fetch an article by name.
    ///
    /// Returns an [`crate::domain::ErrorCode::NotFound`] error for unknown
    /// names.
    async fn fetch_article(
        &self,
        name: &ArticleName,
        identity: &Identity,
    ) -> Result<ArticleView, Error>;
}
