//! Document-store implementation of [`ArticleRepository`].

use async_trait::async_trait;
use mongodb::bson::{Document, doc};
use mongodb::error::{Error as DriverError, ErrorKind};
use mongodb::{Collection, Database};
use tracing::debug;

use super::documents::{
    COMMENTS, NAME, UPVOTE_IDS, UPVOTES, article_from_document, comment_document,
};
use crate::domain::ports::{ArticleRepository, ArticleRepositoryError};
use crate::domain::{Article, ArticleName, Comment, UserId};

/// Collection holding article documents.
pub const ARTICLES_COLLECTION: &str = "articles";

/// Article repository backed by the `articles` collection.
#[derive(Clone)]
pub struct MongoArticleRepository {
    database: Database,
    articles: Collection<Document>,
}

impl MongoArticleRepository {
    /// Create a repository over an already connected database handle.
    pub fn new(database: Database) -> Self {
        let articles = database.collection::<Document>(ARTICLES_COLLECTION);
        Self { database, articles }
    }
}

fn map_driver_error(error: DriverError) -> ArticleRepositoryError {
    match *error.kind {
        ErrorKind::ServerSelection { .. }
        | ErrorKind::Io(_)
        | ErrorKind::ConnectionPoolCleared { .. }
        | ErrorKind::DnsResolve { .. } => ArticleRepositoryError::connection(error.to_string()),
        _ => ArticleRepositoryError::query(error.to_string()),
    }
}

#[async_trait]
impl ArticleRepository for MongoArticleRepository {
    async fn find_by_name(
        &self,
        name: &ArticleName,
    ) -> Result<Option<Article>, ArticleRepositoryError> {
        let document = self
            .articles
            .find_one(doc! { NAME: name.as_ref() })
            .await
            .map_err(map_driver_error)?;
        document.map(article_from_document).transpose()
    }

    async fn record_upvote(
        &self,
        name: &ArticleName,
        uid: &UserId,
    ) -> Result<bool, ArticleRepositoryError> {
        // The `$ne` guard keeps concurrent duplicates from double counting.
        let filter = doc! { NAME: name.as_ref(), UPVOTE_IDS: { "$ne": uid.as_ref() } };
        let update = doc! {
            "$inc": { UPVOTES: 1 },
            "$push": { UPVOTE_IDS: uid.as_ref() },
        };
        let result = self
            .articles
            .update_one(filter, update)
            .await
            .map_err(map_driver_error)?;
        debug!(article = %name, matched = result.matched_count, "recorded upvote");
        Ok(result.modified_count > 0)
    }

    async fn increment_upvotes(&self, name: &ArticleName) -> Result<bool, ArticleRepositoryError> {
        let result = self
            .articles
            .update_one(doc! { NAME: name.as_ref() }, doc! { "$inc": { UPVOTES: 1 } })
            .await
            .map_err(map_driver_error)?;
        Ok(result.matched_count > 0)
    }

    async fn append_comment(
        &self,
        name: &ArticleName,
        comment: &Comment,
    ) -> Result<bool, ArticleRepositoryError> {
        let update = doc! { "$push": { COMMENTS: comment_document(comment)? } };
        let result = self
            .articles
            .update_one(doc! { NAME: name.as_ref() }, update)
            .await
            .map_err(map_driver_error)?;
        Ok(result.matched_count > 0)
    }

    async fn ping(&self) -> Result<(), ArticleRepositoryError> {
        self.database
            .run_command(doc! { "ping": 1 })
            .await
            .map(|_| ())
            .map_err(map_driver_error)
    }
}
