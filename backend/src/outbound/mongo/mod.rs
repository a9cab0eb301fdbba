//! Document store outbound adapter.
//!
//! Connects to the configured database once at startup and implements the
//! `ArticleRepository` port over the `articles` collection.

mod article_repository;
mod connection;
mod documents;

pub use article_repository::{ARTICLES_COLLECTION, MongoArticleRepository};
pub use connection::{StoreConfig, StoreEndpoint, StoreError, connect};
