//! End-to-end coverage of the article routes over in-memory adapters.

#[expect(
    dead_code,
    reason = "Shared helpers include reader constants used only by other suites."
)]
#[path = "support/app.rs"]
mod app;

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::http::header::CONTENT_TYPE;
use actix_web::test as actix_test;
use app::{READER_EMAIL, READER_TOKEN, READER_UID, SECOND_READER_TOKEN, dependencies, readers};
use blog_backend::domain::AccessMode;
use blog_backend::domain::ports::ArticleRepositoryError;
use blog_backend::server::build_app;
use blog_backend::test_support::{InMemoryArticleRepository, StaticTokenVerifier, sample_article};
use rstest::{fixture, rstest};
use serde_json::{Value, json};

const ARTICLE: &str = "learn-react";

#[fixture]
fn repository() -> Arc<InMemoryArticleRepository> {
    Arc::new(InMemoryArticleRepository::with_articles([sample_article(
        ARTICLE,
    )]))
}

struct Reply {
    status: StatusCode,
    content_type: Option<String>,
    trace_id: Option<String>,
    body: Vec<u8>,
}

impl Reply {
    fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("JSON body")
    }

    fn text(&self) -> String {
        String::from_utf8(self.body.clone()).expect("UTF-8 body")
    }
}

async fn send(
    repository: &Arc<InMemoryArticleRepository>,
    mode: AccessMode,
    verifier: StaticTokenVerifier,
    req: actix_test::TestRequest,
) -> Reply {
    let app = actix_test::init_service(build_app(dependencies(
        repository.clone(),
        mode,
        verifier,
    )))
    .await;
    let res = actix_test::call_service(&app, req.to_request()).await;
    let header = |name: &str| {
        res.headers()
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned)
    };
    let status = res.status();
    let content_type = header(CONTENT_TYPE.as_str());
    let trace_id = header("trace-id");
    let body = actix_test::read_body(res).await.to_vec();
    Reply {
        status,
        content_type,
        trace_id,
        body,
    }
}

async fn send_authenticated(
    repository: &Arc<InMemoryArticleRepository>,
    req: actix_test::TestRequest,
) -> Reply {
    send(repository, AccessMode::Authenticated, readers(), req).await
}

fn upvote(token: Option<&str>) -> actix_test::TestRequest {
    let req = actix_test::TestRequest::put().uri(&format!("/api/articles/{ARTICLE}/upvote"));
    match token {
        Some(token) => req.insert_header(("authtoken", token)),
        None => req,
    }
}

fn comment(token: Option<&str>, body: &str) -> actix_test::TestRequest {
    let req = actix_test::TestRequest::post()
        .uri(&format!("/api/articles/{ARTICLE}/comments"))
        .insert_header((CONTENT_TYPE, "application/json"))
        .set_payload(body.to_owned());
    match token {
        Some(token) => req.insert_header(("authtoken", token)),
        None => req,
    }
}

#[rstest]
#[actix_web::test]
async fn unknown_article_is_a_json_404(repository: Arc<InMemoryArticleRepository>) {
    let reply = send_authenticated(
        &repository,
        actix_test::TestRequest::get().uri("/api/articles/missing"),
    )
    .await;

    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    let body = reply.json();
    assert_eq!(body["code"], json!("not_found"));
    assert_eq!(body["details"]["name"], json!("missing"));
    assert_eq!(body["traceId"].as_str(), reply.trace_id.as_deref());
}

#[rstest]
#[case(None, false)]
#[case(Some(READER_TOKEN), true)]
#[actix_web::test]
async fn can_upvote_reflects_the_caller(
    repository: Arc<InMemoryArticleRepository>,
    #[case] token: Option<&'static str>,
    #[case] expected: bool,
) {
    let mut req = actix_test::TestRequest::get().uri(&format!("/api/articles/{ARTICLE}"));
    if let Some(token) = token {
        req = req.insert_header(("authtoken", token));
    }
    let reply = send_authenticated(&repository, req).await;

    assert_eq!(reply.status, StatusCode::OK);
    let body = reply.json();
    assert_eq!(body["canUpvote"], json!(expected));
    assert_eq!(body["name"], json!(ARTICLE));
    assert_eq!(body["title"], json!("About learn-react"));
}

#[rstest]
#[actix_web::test]
async fn upvotes_count_once_per_reader(repository: Arc<InMemoryArticleRepository>) {
    let first = send_authenticated(&repository, upvote(Some(READER_TOKEN))).await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.json()["upvotes"], json!(1));

    let second = send_authenticated(&repository, upvote(Some(READER_TOKEN))).await;
    assert_eq!(second.status, StatusCode::OK);
    assert_eq!(second.json()["upvotes"], json!(1));
    assert_eq!(second.json()["upvoteIds"], json!([READER_UID]));

    let other = send_authenticated(&repository, upvote(Some(SECOND_READER_TOKEN))).await;
    assert_eq!(other.json()["upvotes"], json!(2));

    let read = send_authenticated(
        &repository,
        actix_test::TestRequest::get()
            .uri(&format!("/api/articles/{ARTICLE}"))
            .insert_header(("authtoken", READER_TOKEN)),
    )
    .await;
    assert_eq!(read.json()["canUpvote"], json!(false));
}

#[rstest]
#[case(None)]
#[case(Some("   "))]
#[actix_web::test]
async fn mutations_require_an_identity(
    repository: Arc<InMemoryArticleRepository>,
    #[case] token: Option<&'static str>,
) {
    let reply = send_authenticated(&repository, upvote(token)).await;

    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.json()["code"], json!("unauthorized"));
    assert_eq!(repository.get(ARTICLE).map(|a| a.upvotes), Some(0));
}

#[rstest]
#[actix_web::test]
async fn rejected_tokens_are_bad_requests(repository: Arc<InMemoryArticleRepository>) {
    let reply = send_authenticated(&repository, upvote(Some("forged"))).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.json()["code"], json!("invalid_request"));
}

#[rstest]
#[actix_web::test]
async fn verifier_outage_is_service_unavailable(repository: Arc<InMemoryArticleRepository>) {
    let reply = send(
        &repository,
        AccessMode::Authenticated,
        StaticTokenVerifier::unavailable(),
        actix_test::TestRequest::get()
            .uri(&format!("/api/articles/{ARTICLE}"))
            .insert_header(("authtoken", READER_TOKEN)),
    )
    .await;
    assert_eq!(reply.status, StatusCode::SERVICE_UNAVAILABLE);
}

#[rstest]
#[actix_web::test]
async fn missing_articles_get_a_text_notice_on_mutation(
    repository: Arc<InMemoryArticleRepository>,
) {
    let reply = send_authenticated(
        &repository,
        actix_test::TestRequest::put()
            .uri("/api/articles/missing/upvote")
            .insert_header(("authtoken", READER_TOKEN)),
    )
    .await;

    assert_eq!(reply.status, StatusCode::OK);
    assert!(
        reply
            .content_type
            .as_deref()
            .is_some_and(|value| value.starts_with("text/plain"))
    );
    assert_eq!(reply.text(), "That article doesn't exist");
}

#[rstest]
#[actix_web::test]
async fn comments_are_attributed_to_the_verified_email(
    repository: Arc<InMemoryArticleRepository>,
) {
    let reply = send_authenticated(
        &repository,
        comment(
            Some(READER_TOKEN),
            r#"{"text":"Great article!","postedBy":"someone-else"}"#,
        ),
    )
    .await;

    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(
        reply.json()["comments"],
        json!([{ "postedBy": READER_EMAIL, "text": "Great article!" }])
    );
}

#[rstest]
#[actix_web::test]
async fn comments_keep_submission_order(repository: Arc<InMemoryArticleRepository>) {
    for text in ["first", "second", "third"] {
        let body = json!({ "text": text }).to_string();
        let reply = send_authenticated(&repository, comment(Some(READER_TOKEN), &body)).await;
        assert_eq!(reply.status, StatusCode::OK);
    }
    let stored = repository.get(ARTICLE).expect("article");
    let texts: Vec<_> = stored
        .comments
        .iter()
        .filter_map(|c| c.text_str())
        .collect();
    assert_eq!(texts, ["first", "second", "third"]);
}

#[rstest]
#[actix_web::test]
async fn malformed_comment_bodies_are_rejected(repository: Arc<InMemoryArticleRepository>) {
    let reply = send_authenticated(&repository, comment(Some(READER_TOKEN), "{not json")).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert!(repository.get(ARTICLE).expect("article").comments.is_empty());
}

#[rstest]
#[actix_web::test]
async fn comment_text_is_stored_whatever_its_type(repository: Arc<InMemoryArticleRepository>) {
    let reply = send_authenticated(
        &repository,
        comment(Some(READER_TOKEN), r#"{"text":5}"#),
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.json()["comments"][0]["text"], json!(5));

    let stored = repository.get(ARTICLE).expect("article");
    assert_eq!(stored.comments[0].text, Some(json!(5)));
    assert_eq!(stored.comments[0].posted_by_str(), Some(READER_EMAIL));
}

#[rstest]
#[actix_web::test]
async fn anonymous_mode_counts_every_upvote(repository: Arc<InMemoryArticleRepository>) {
    for expected in [1, 2] {
        let reply = send(
            &repository,
            AccessMode::Anonymous,
            readers(),
            upvote(None),
        )
        .await;
        assert_eq!(reply.json()["upvotes"], json!(expected));
    }

    let read = send(
        &repository,
        AccessMode::Anonymous,
        readers(),
        actix_test::TestRequest::get().uri(&format!("/api/articles/{ARTICLE}")),
    )
    .await;
    assert_eq!(read.json()["canUpvote"], json!(true));
    assert_eq!(read.json()["upvoteIds"], json!([]));
}

#[rstest]
#[actix_web::test]
async fn anonymous_mode_takes_author_from_body(repository: Arc<InMemoryArticleRepository>) {
    let reply = send(
        &repository,
        AccessMode::Anonymous,
        readers(),
        comment(None, r#"{"postedBy":"Ann","text":"Hi"}"#),
    )
    .await;
    assert_eq!(
        reply.json()["comments"],
        json!([{ "postedBy": "Ann", "text": "Hi" }])
    );
}

#[rstest]
#[case(StoreFailure::Connection, StatusCode::SERVICE_UNAVAILABLE, "service_unavailable")]
#[case(StoreFailure::Query, StatusCode::INTERNAL_SERVER_ERROR, "internal_error")]
#[actix_web::test]
async fn store_failures_map_to_status_codes(
    repository: Arc<InMemoryArticleRepository>,
    #[case] failure: StoreFailure,
    #[case] status: StatusCode,
    #[case] code: &'static str,
) {
    repository.fail_with(failure.into_error());
    let reply = send_authenticated(
        &repository,
        actix_test::TestRequest::get().uri(&format!("/api/articles/{ARTICLE}")),
    )
    .await;
    assert_eq!(reply.status, status);
    let body = reply.json();
    assert_eq!(body["code"], json!(code));
    let message = body["message"].as_str().expect("message");
    assert!(!message.contains("secret-host"), "leaked: {message}");
}

#[derive(Debug, Clone, Copy)]
enum StoreFailure {
    Connection,
    Query,
}

impl StoreFailure {
    fn into_error(self) -> ArticleRepositoryError {
        match self {
            Self::Connection => ArticleRepositoryError::connection("secret-host refused"),
            Self::Query => ArticleRepositoryError::query("secret-host cursor died"),
        }
    }
}
