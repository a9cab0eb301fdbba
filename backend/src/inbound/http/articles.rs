//! Article API handlers.
//!
//! ```text
//! GET  /api/articles/{name}
//! PUT  /api/articles/{name}/upvote
//! POST /api/articles/{name}/comments {"text":"Great article!"}
//! ```
//!
//! Upvote and comment routes answer a missing article with a `200` plain
//! text notice rather than an error status; existing clients depend on it.

use actix_web::http::header::ContentType;
use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use utoipa::ToSchema;

use crate::domain::ports::{ArticleView, CommentRequest};
use crate::domain::{AccessMode, Article, ArticleName, Comment, Error};
use crate::inbound::http::ApiResult;
use crate::inbound::http::identity::{AccessFilter, RequestIdentity};
use crate::inbound::http::schemas::{ArticleSchema, ErrorSchema};
use crate::inbound::http::state::HttpState;

/// Body returned by the upvote and comment routes for unknown articles.
pub const ARTICLE_NOT_FOUND_TEXT: &str = "That article doesn't exist";

/// Article payload as rendered to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleResponse {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub upvotes: i64,
    pub upvote_ids: Vec<String>,
    pub comments: Vec<Comment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_upvote: Option<bool>,
    #[serde(flatten)]
    pub content: Map<String, Value>,
}

impl From<Article> for ArticleResponse {
    fn from(article: Article) -> Self {
        Self {
            id: article.id,
            name: article.name.into(),
            upvotes: article.upvotes,
            upvote_ids: article.upvote_ids,
            comments: article.comments,
            can_upvote: None,
            content: article.content,
        }
    }
}

impl From<ArticleView> for ArticleResponse {
    fn from(view: ArticleView) -> Self {
        Self {
            can_upvote: Some(view.can_upvote),
            ..Self::from(view.article)
        }
    }
}

/// Comment request body for `POST /api/articles/{name}/comments`.
///
/// `postedBy` is only honoured when authentication is disabled. Field values
/// are not type-checked and are stored as sent.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentBody {
    #[serde(default)]
    #[schema(value_type = Option<String>, example = "Great article!")]
    pub text: Option<Value>,
    #[serde(default)]
    #[schema(value_type = Option<String>, example = "ann@example.com")]
    pub posted_by: Option<Value>,
}

fn parse_name(raw: String) -> Result<ArticleName, Error> {
    ArticleName::new(raw).map_err(|err| {
        Error::invalid_request(err.to_string()).with_details(json!({ "field": "name" }))
    })
}

/// Empty bodies are read as `{}`.
fn parse_comment_body(bytes: &[u8]) -> Result<CommentBody, Error> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(CommentBody::default());
    }
    let invalid = |reason: String| {
        Error::invalid_request("request body must be a JSON object")
            .with_details(json!({ "reason": reason }))
    };
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(mut fields)) => Ok(CommentBody {
            text: fields.remove("text"),
            posted_by: fields.remove("postedBy"),
        }),
        Ok(other) => Err(invalid(format!("expected an object, got {other}"))),
        Err(err) => Err(invalid(err.to_string())),
    }
}

fn article_or_notice(article: Option<Article>) -> HttpResponse {
    match article {
        Some(article) => HttpResponse::Ok().json(ArticleResponse::from(article)),
        None => HttpResponse::Ok()
            .content_type(ContentType::plaintext())
            .body(ARTICLE_NOT_FOUND_TEXT),
    }
}

/// Fetch one article, decorated with `canUpvote` for the requester.
#[utoipa::path(
    get,
    path = "/api/articles/{name}",
    params(("name" = String, Path, description = "Article slug")),
    responses(
        (status = 200, description = "Article", body = ArticleSchema),
        (status = 400, description = "Invalid authentication token", body = ErrorSchema),
        (status = 404, description = "Article not found", body = ErrorSchema),
        (status = 503, description = "Dependency unavailable", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["articles"],
    operation_id = "getArticle",
    security([], ("AuthToken" = []))
)]
pub async fn get_article(
    state: web::Data<HttpState>,
    identity: RequestIdentity,
    path: web::Path<String>,
) -> ApiResult<web::Json<ArticleResponse>> {
    let name = parse_name(path.into_inner())?;
    let view = state
        .articles
        .fetch_article(&name, &identity.into_inner())
        .await?;
    Ok(web::Json(ArticleResponse::from(view)))
}

/// Upvote an article once per user.
#[utoipa::path(
    put,
    path = "/api/articles/{name}/upvote",
    params(("name" = String, Path, description = "Article slug")),
    responses(
        (status = 200, description = "Article after the upvote, or a plain-text notice when it does not exist", body = ArticleSchema),
        (status = 400, description = "Invalid authentication token", body = ErrorSchema),
        (status = 401, description = "Authentication required", body = ErrorSchema),
        (status = 503, description = "Dependency unavailable", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["articles"],
    operation_id = "upvoteArticle",
    security(("AuthToken" = []))
)]
pub async fn upvote_article(
    state: web::Data<HttpState>,
    identity: RequestIdentity,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let name = parse_name(path.into_inner())?;
    let article = state
        .article_commands
        .upvote(&name, &identity.into_inner())
        .await?;
    Ok(article_or_notice(article))
}

/// Append a comment to an article.
#[utoipa::path(
    post,
    path = "/api/articles/{name}/comments",
    params(("name" = String, Path, description = "Article slug")),
    request_body = CommentBody,
    responses(
        (status = 200, description = "Article after the comment, or a plain-text notice when it does not exist", body = ArticleSchema),
        (status = 400, description = "Malformed body or invalid authentication token", body = ErrorSchema),
        (status = 401, description = "Authentication required", body = ErrorSchema),
        (status = 503, description = "Dependency unavailable", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["articles"],
    operation_id = "addComment",
    security(("AuthToken" = []))
)]
pub async fn add_comment(
    state: web::Data<HttpState>,
    identity: RequestIdentity,
    path: web::Path<String>,
    body: web::Bytes,
) -> ApiResult<HttpResponse> {
    let name = parse_name(path.into_inner())?;
    let CommentBody { text, posted_by } = parse_comment_body(&body)?;
    let article = state
        .article_commands
        .add_comment(CommentRequest {
            name,
            identity: identity.into_inner(),
            posted_by,
            text,
        })
        .await?;
    Ok(article_or_notice(article))
}

/// Register the article routes. Mutating routes sit behind [`AccessFilter`].
pub fn configure(cfg: &mut web::ServiceConfig, mode: AccessMode) {
    cfg.service(web::resource("/articles/{name}").route(web::get().to(get_article)))
        .service(
            web::resource("/articles/{name}/upvote")
                .wrap(AccessFilter::new(mode))
                .route(web::put().to(upvote_article)),
        )
        .service(
            web::resource("/articles/{name}/comments")
                .wrap(AccessFilter::new(mode))
                .route(web::post().to(add_comment)),
        );
}
