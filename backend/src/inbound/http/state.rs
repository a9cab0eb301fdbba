//! Shared HTTP adapter state.
//!
//! Handlers accept this state via `actix_web::web::Data` so they only depend
//! on domain ports and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{ArticleCommand, ArticleQuery};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub articles: Arc<dyn ArticleQuery>,
    pub article_commands: Arc<dyn ArticleCommand>,
}

impl HttpState {
    /// Bundle the article ports.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    /// use blog_backend::domain::{AccessMode, ArticleService};
    /// use blog_backend::inbound::http::state::HttpState;
    /// use blog_backend::test_support::InMemoryArticleRepository;
    ///
    /// let service = Arc::new(ArticleService::new(
    ///     Arc::new(InMemoryArticleRepository::default()),
    ///     AccessMode::Authenticated,
    /// ));
    /// let _state = HttpState::new(service.clone(), service);
    /// ```
    pub fn new(articles: Arc<dyn ArticleQuery>, article_commands: Arc<dyn ArticleCommand>) -> Self {
        Self {
            articles,
            article_commands,
        }
    }
}
