//! Driven port for article persistence.
//!
//! Adapters own a single collection of article documents keyed by `name`.
//! Mutations report whether a document matched so callers can distinguish a
//! missing article from an ineligible update.

use async_trait::async_trait;

use crate::domain::{Article, ArticleName, Comment, UserId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by article repository adapters.
    pub enum ArticleRepositoryError {
        /// The store could not be reached.
        Connection { message: String } => "article store connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "article store query failed: {message}",
        /// A stored document could not be mapped to an article.
        Decode { message: String } => "article document could not be decoded: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ArticleRepository: Send + Sync {
    /// Fetch an article by name.
    async fn find_by_name(&self, name: &ArticleName)
    -> Result<Option<Article>, ArticleRepositoryError>;

    /// Atomically increment `upvotes` and append `uid` to `upvoteIds`, but
    /// only when `uid` is not already listed.
    ///
    /// Returns `true` when a document was updated.
    async fn record_upvote(
        &self,
        name: &ArticleName,
        uid: &UserId,
    ) -> Result<bool, ArticleRepositoryError>;

    /// Increment `upvotes` without tracking the voter.
    ///
    /// Returns `true` when a document was updated.
    async fn increment_upvotes(&self, name: &ArticleName) -> Result<bool, ArticleRepositoryError>;

    /// Append a comment to the end of `comments`.
    ///
    /// Returns `true` when a document was updated.
    async fn append_comment(
        &self,
        name: &ArticleName,
        comment: &Comment,
    ) -> Result<bool, ArticleRepositoryError>;

    /// Round-trip to the store to confirm it is reachable.
    async fn ping(&self) -> Result<(), ArticleRepositoryError>;
}
