//! Test doubles and fixtures shared by unit tests (in `src/`) and
//! integration tests (in `tests/`).
//!
//! Compiled for `cfg(test)` and behind the `test-support` feature.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use cap_std::{ambient_authority, fs::Dir};
use serde_json::json;

use crate::domain::ports::{
    ArticleRepository, ArticleRepositoryError, TokenVerificationError, TokenVerifier,
};
use crate::domain::{Article, ArticleName, Comment, IdToken, UserId, VerifiedUser};
use crate::inbound::http::spa::StaticSite;

/// Build an article with a title and body so pass-through fields are visible.
///
/// # Panics
/// Panics when `name` is empty.
pub fn sample_article(name: &str) -> Article {
    let mut article = Article::new(ArticleName::new(name).expect("non-empty article name"));
    article.content.insert("title".into(), json!(format!("About {name}")));
    article
        .content
        .insert("content".into(), json!(["First paragraph.", "Second paragraph."]));
    article
}

/// Article repository backed by a map, mirroring the store's atomic updates.
#[derive(Debug, Default)]
pub struct InMemoryArticleRepository {
    articles: Mutex<BTreeMap<String, Article>>,
    failure: Mutex<Option<ArticleRepositoryError>>,
}

impl InMemoryArticleRepository {
    /// Seed the repository with `articles`.
    pub fn with_articles(articles: impl IntoIterator<Item = Article>) -> Self {
        let repository = Self::default();
        for article in articles {
            repository.insert(article);
        }
        repository
    }

    /// Insert or replace an article keyed by name.
    pub fn insert(&self, article: Article) {
        let mut guard = self.articles.lock().unwrap_or_else(|e| e.into_inner());
        guard.insert(article.name.as_ref().to_owned(), article);
    }

    /// Snapshot of the stored article.
    pub fn get(&self, name: &str) -> Option<Article> {
        let guard = self.articles.lock().unwrap_or_else(|e| e.into_inner());
        guard.get(name).cloned()
    }

    /// Make every subsequent call fail with `error` until
    /// [`Self::recover`] is called.
    pub fn fail_with(&self, error: ArticleRepositoryError) {
        *self.failure.lock().unwrap_or_else(|e| e.into_inner()) = Some(error);
    }

    pub fn recover(&self) {
        *self.failure.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }

    fn check_failure(&self) -> Result<(), ArticleRepositoryError> {
        match self.failure.lock() {
            Ok(guard) => guard.clone().map_or(Ok(()), Err),
            Err(_) => Err(ArticleRepositoryError::query("failure flag lock poisoned")),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<String, Article>>, ArticleRepositoryError> {
        self.check_failure()?;
        self.articles
            .lock()
            .map_err(|_| ArticleRepositoryError::query("article map lock poisoned"))
    }

    fn update(
        &self,
        name: &ArticleName,
        apply: impl FnOnce(&mut Article) -> bool,
    ) -> Result<bool, ArticleRepositoryError> {
        let mut guard = self.lock()?;
        Ok(guard.get_mut(name.as_ref()).is_some_and(apply))
    }
}

#[async_trait]
impl ArticleRepository for InMemoryArticleRepository {
    async fn find_by_name(
        &self,
        name: &ArticleName,
    ) -> Result<Option<Article>, ArticleRepositoryError> {
        Ok(self.lock()?.get(name.as_ref()).cloned())
    }

    async fn record_upvote(
        &self,
        name: &ArticleName,
        uid: &UserId,
    ) -> Result<bool, ArticleRepositoryError> {
        self.update(name, |article| {
            if article.has_upvoted(uid.as_ref()) {
                return false;
            }
            article.upvotes += 1;
            article.upvote_ids.push(uid.as_ref().to_owned());
            true
        })
    }

    async fn increment_upvotes(&self, name: &ArticleName) -> Result<bool, ArticleRepositoryError> {
        self.update(name, |article| {
            article.upvotes += 1;
            true
        })
    }

    async fn append_comment(
        &self,
        name: &ArticleName,
        comment: &Comment,
    ) -> Result<bool, ArticleRepositoryError> {
        self.update(name, |article| {
            article.comments.push(comment.clone());
            true
        })
    }

    async fn ping(&self) -> Result<(), ArticleRepositoryError> {
        self.lock().map(|_| ())
    }
}

/// Token verifier answering from a fixed token table.
///
/// Unknown tokens are rejected. [`StaticTokenVerifier::unavailable`] builds
/// a verifier that simulates an outage for every token.
#[derive(Debug, Default, Clone)]
pub struct StaticTokenVerifier {
    users: HashMap<String, VerifiedUser>,
    unavailable: bool,
}

impl StaticTokenVerifier {
    /// Accept `token` as the user `uid`.
    ///
    /// # Panics
    /// Panics when `uid` is not a valid user identifier.
    #[must_use]
    pub fn with_user(mut self, token: &str, uid: &str, email: Option<&str>) -> Self {
        self.users.insert(
            token.to_owned(),
            VerifiedUser {
                uid: UserId::new(uid).expect("valid uid"),
                email: email.map(str::to_owned),
            },
        );
        self
    }

    pub fn unavailable() -> Self {
        Self {
            users: HashMap::new(),
            unavailable: true,
        }
    }
}

#[async_trait]
impl TokenVerifier for StaticTokenVerifier {
    async fn verify(&self, token: &IdToken) -> Result<VerifiedUser, TokenVerificationError> {
        if self.unavailable {
            return Err(TokenVerificationError::unavailable("verifier offline"));
        }
        self.users
            .get(token.expose())
            .cloned()
            .ok_or_else(|| TokenVerificationError::rejected("INVALID_ID_TOKEN"))
    }
}

/// Contents of `assets/app.js` in [`static_site_fixture`].
pub const FIXTURE_SCRIPT: &str = "console.log('blog');";

/// Write a minimal frontend bundle into a temporary directory.
///
/// Keep the returned [`tempfile::TempDir`] alive for as long as the site is
/// served.
///
/// # Panics
/// Panics when the temporary directory cannot be prepared.
pub fn static_site_fixture() -> (tempfile::TempDir, StaticSite) {
    let dir = tempfile::tempdir().expect("create temp dir");
    write_bundle(dir.path()).expect("write frontend bundle");
    let site = StaticSite::open(dir.path()).expect("open static site");
    (dir, site)
}

fn write_bundle(path: &Path) -> std::io::Result<()> {
    let root = Dir::open_ambient_dir(path, ambient_authority())?;
    root.write(
        "index.html",
        "<!doctype html><html><body><div id=\"root\"></div></body></html>",
    )?;
    root.create_dir("assets")?;
    root.write("assets/my font.woff2", b"wOF2")?;
    root.write("assets/app.js", FIXTURE_SCRIPT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn record_upvote_is_idempotent_per_user() {
        let repository = InMemoryArticleRepository::with_articles([sample_article("learn-node")]);
        let name = ArticleName::new("learn-node").expect("name");
        let uid = UserId::new("u1").expect("uid");

        assert!(repository.record_upvote(&name, &uid).await.expect("first"));
        assert!(!repository.record_upvote(&name, &uid).await.expect("second"));

        let stored = repository.get("learn-node").expect("stored");
        assert_eq!(stored.upvotes, 1);
        assert_eq!(stored.upvote_ids, vec!["u1".to_owned()]);
    }

    #[tokio::test]
    async fn injected_failures_surface_until_recovered() {
        let repository = InMemoryArticleRepository::default();
        repository.fail_with(ArticleRepositoryError::connection("down"));
        assert!(repository.ping().await.is_err());
        repository.recover();
        assert!(repository.ping().await.is_ok());
    }

    #[tokio::test]
    async fn static_verifier_rejects_unknown_tokens() {
        let verifier = StaticTokenVerifier::default().with_user("t1", "u1", None);
        let known = verifier.verify(&IdToken::new("t1").expect("token")).await;
        assert_eq!(known.map(|user| user.uid), Ok(UserId::new("u1").expect("uid")));
        let unknown = verifier.verify(&IdToken::new("t2").expect("token")).await;
        assert!(matches!(unknown, Err(TokenVerificationError::Rejected { .. })));
    }
}
