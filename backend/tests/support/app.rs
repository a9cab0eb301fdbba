//! Full application over in-memory adapters for integration suites.

use std::sync::Arc;

use actix_web::web;
use blog_backend::domain::{AccessMode, ArticleService};
use blog_backend::inbound::http::health::HealthState;
use blog_backend::inbound::http::identity::IdentityResolver;
use blog_backend::inbound::http::state::HttpState;
use blog_backend::server::AppDependencies;
use blog_backend::test_support::{InMemoryArticleRepository, StaticTokenVerifier};

pub const READER_TOKEN: &str = "reader-token";
pub const READER_UID: &str = "reader-1";
pub const READER_EMAIL: &str = "reader@example.com";
pub const SECOND_READER_TOKEN: &str = "second-reader-token";
pub const SECOND_READER_UID: &str = "reader-2";

/// Verifier knowing two readers; the second has no email on file.
pub fn readers() -> StaticTokenVerifier {
    StaticTokenVerifier::default()
        .with_user(READER_TOKEN, READER_UID, Some(READER_EMAIL))
        .with_user(SECOND_READER_TOKEN, SECOND_READER_UID, None)
}

/// Wire the article service, identity resolver, and health state.
///
/// `verifier` is ignored in [`AccessMode::Anonymous`], matching the
/// production wiring where authentication is switched off.
pub fn dependencies(
    repository: Arc<InMemoryArticleRepository>,
    mode: AccessMode,
    verifier: StaticTokenVerifier,
) -> AppDependencies {
    let service = Arc::new(ArticleService::new(repository.clone(), mode));
    let identity = match mode {
        AccessMode::Authenticated => IdentityResolver::new(Arc::new(verifier)),
        AccessMode::Anonymous => IdentityResolver::disabled(),
    };
    let health = HealthState::new(repository);
    health.mark_ready();
    AppDependencies {
        health_state: web::Data::new(health),
        http_state: web::Data::new(HttpState::new(service.clone(), service)),
        mode,
        identity,
        cors: None,
        static_site: None,
    }
}
