//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod article_command;
mod article_query;
mod article_repository;
mod token_verifier;

#[cfg(test)]
pub use article_command::MockArticleCommand;
pub use article_command::{ArticleCommand, CommentRequest};
#[cfg(test)]
pub use article_query::MockArticleQuery;
pub use article_query::{ArticleQuery, ArticleView};
#[cfg(test)]
pub use article_repository::MockArticleRepository;
pub use article_repository::{ArticleRepository, ArticleRepositoryError};
#[cfg(test)]
pub use token_verifier::MockTokenVerifier;
pub use token_verifier::{TokenVerificationError, TokenVerifier};
