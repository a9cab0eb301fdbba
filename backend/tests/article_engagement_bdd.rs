//! Behaviour tests for upvoting and commenting through the HTTP surface.

#[expect(
    dead_code,
    reason = "Shared helpers include reader constants used only by other suites."
)]
#[path = "support/app.rs"]
mod app;

use std::cell::{Cell, RefCell};
use std::sync::Arc;

use actix_web::test as actix_test;
use app::{READER_EMAIL, READER_TOKEN, SECOND_READER_TOKEN, dependencies, readers};
use blog_backend::domain::AccessMode;
use blog_backend::server::build_app;
use blog_backend::test_support::{InMemoryArticleRepository, sample_article};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::Value;

struct EngagementWorld {
    repository: Arc<InMemoryArticleRepository>,
    mode: Cell<AccessMode>,
    last_status: Cell<Option<u16>>,
    last_body: RefCell<Vec<u8>>,
}

impl EngagementWorld {
    fn new() -> Self {
        Self {
            repository: Arc::new(InMemoryArticleRepository::default()),
            mode: Cell::new(AccessMode::Authenticated),
            last_status: Cell::new(None),
            last_body: RefCell::new(Vec::new()),
        }
    }

    fn perform(&self, req: actix_test::TestRequest) {
        let deps = dependencies(self.repository.clone(), self.mode.get(), readers());
        let (status, body) = actix_rt::System::new().block_on(async move {
            let app = actix_test::init_service(build_app(deps)).await;
            let res = actix_test::call_service(&app, req.to_request()).await;
            let status = res.status().as_u16();
            (status, actix_test::read_body(res).await.to_vec())
        });
        self.last_status.set(Some(status));
        *self.last_body.borrow_mut() = body;
    }

    fn upvote(&self, name: &str, token: Option<&str>) {
        let mut req = actix_test::TestRequest::put().uri(&format!("/api/articles/{name}/upvote"));
        if let Some(token) = token {
            req = req.insert_header(("authtoken", token));
        }
        self.perform(req);
    }

    fn last_json(&self) -> Value {
        serde_json::from_slice(&self.last_body.borrow()).expect("JSON body")
    }
}

#[fixture]
fn world() -> EngagementWorld {
    EngagementWorld::new()
}

#[given("an article named {name}")]
fn an_article_named(world: &EngagementWorld, name: String) {
    world.repository.insert(sample_article(&name));
}

#[given("authentication is switched off")]
fn authentication_is_switched_off(world: &EngagementWorld) {
    world.mode.set(AccessMode::Anonymous);
}

#[when("the reader upvotes {name}")]
fn the_reader_upvotes(world: &EngagementWorld, name: String) {
    world.upvote(&name, Some(READER_TOKEN));
}

#[when("a second reader upvotes {name}")]
fn a_second_reader_upvotes(world: &EngagementWorld, name: String) {
    world.upvote(&name, Some(SECOND_READER_TOKEN));
}

#[when("an anonymous visitor upvotes {name}")]
fn an_anonymous_visitor_upvotes(world: &EngagementWorld, name: String) {
    world.upvote(&name, None);
}

#[when("the reader comments {text} on {name}")]
fn the_reader_comments(world: &EngagementWorld, text: String, name: String) {
    world.perform(
        actix_test::TestRequest::post()
            .uri(&format!("/api/articles/{name}/comments"))
            .insert_header(("authtoken", READER_TOKEN))
            .set_json(serde_json::json!({ "text": text })),
    );
}

#[when("the reader opens {name}")]
fn the_reader_opens(world: &EngagementWorld, name: String) {
    world.perform(
        actix_test::TestRequest::get()
            .uri(&format!("/api/articles/{name}"))
            .insert_header(("authtoken", READER_TOKEN)),
    );
}

#[then("the upvote count of {name} is {count}")]
fn the_upvote_count_is(world: &EngagementWorld, name: String, count: i64) {
    let article = world.repository.get(&name).expect("article stored");
    assert_eq!(article.upvotes, count);
}

#[then("the reader may no longer upvote")]
fn the_reader_may_no_longer_upvote(world: &EngagementWorld) {
    assert_eq!(world.last_json()["canUpvote"], Value::Bool(false));
}

#[then("the response status is {status}")]
fn the_response_status_is(world: &EngagementWorld, status: u16) {
    assert_eq!(world.last_status.get(), Some(status));
}

#[then("the response text is {text}")]
fn the_response_text_is(world: &EngagementWorld, text: String) {
    let body = world.last_body.borrow();
    assert_eq!(std::str::from_utf8(&body).expect("UTF-8 body"), text);
}

#[then("the comments on {name} read {texts}")]
fn the_comments_read(world: &EngagementWorld, name: String, texts: String) {
    let article = world.repository.get(&name).expect("article stored");
    let stored: Vec<_> = article
        .comments
        .iter()
        .filter_map(|comment| comment.text_str().map(str::to_owned))
        .collect();
    let expected: Vec<_> = texts.split(',').map(str::to_owned).collect();
    assert_eq!(stored, expected);
}

#[then("every comment on {name} is signed by the reader")]
fn every_comment_is_signed(world: &EngagementWorld, name: String) {
    let article = world.repository.get(&name).expect("article stored");
    assert!(
        article
            .comments
            .iter()
            .all(|comment| comment.posted_by_str() == Some(READER_EMAIL))
    );
}

#[scenario(
    path = "tests/features/article_engagement.feature",
    name = "A reader's repeated upvotes count once"
)]
fn repeated_upvotes_count_once(world: EngagementWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/article_engagement.feature",
    name = "Anonymous visitors cannot upvote while authentication is on"
)]
fn anonymous_visitors_cannot_upvote(world: EngagementWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/article_engagement.feature",
    name = "Comments are kept in submission order"
)]
fn comments_are_kept_in_submission_order(world: EngagementWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/article_engagement.feature",
    name = "Upvotes are plain increments when authentication is off"
)]
fn upvotes_are_plain_increments_without_authentication(world: EngagementWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/article_engagement.feature",
    name = "Engaging with a missing article leaves a notice"
)]
fn missing_article_leaves_a_notice(world: EngagementWorld) {
    drop(world);
}
