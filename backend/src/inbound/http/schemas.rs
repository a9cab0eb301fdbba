//! OpenAPI schema definitions for domain types.
//!
//! Domain types stay framework-agnostic by not deriving `ToSchema`. The
//! wrappers here mirror their JSON shape for the generated document.

use utoipa::ToSchema;

/// OpenAPI schema for [`crate::domain::ErrorCode`].
#[derive(ToSchema)]
#[schema(as = ErrorCode)]
pub enum ErrorCodeSchema {
    /// The request is malformed or fails validation.
    #[schema(rename = "invalid_request")]
    InvalidRequest,
    /// Authentication failed or is missing.
    #[schema(rename = "unauthorized")]
    Unauthorized,
    /// Authenticated but not permitted to perform this action.
    #[schema(rename = "forbidden")]
    Forbidden,
    /// The requested resource does not exist.
    #[schema(rename = "not_found")]
    NotFound,
    /// A dependency is unreachable.
    #[schema(rename = "service_unavailable")]
    ServiceUnavailable,
    /// An unexpected error occurred on the server.
    #[schema(rename = "internal_error")]
    InternalError,
}

/// OpenAPI schema for [`crate::domain::Error`].
#[derive(ToSchema)]
#[schema(as = Error, rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct ErrorSchema {
    /// Stable machine-readable error code.
    #[schema(example = "not_found")]
    code: ErrorCodeSchema,
    /// Human-readable message returned to clients.
    #[schema(example = "article not found")]
    message: String,
    /// Correlation identifier for tracing this error across systems.
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    trace_id: Option<String>,
    /// Supplementary error details for clients.
    details: Option<serde_json::Value>,
}

/// OpenAPI schema for [`crate::domain::Comment`].
#[derive(ToSchema)]
#[schema(as = Comment, rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct CommentSchema {
    /// Author email, absent for anonymous comments.
    #[schema(example = "ann@example.com")]
    posted_by: Option<String>,
    /// Comment text as submitted.
    #[schema(example = "Great article!")]
    text: Option<String>,
}

/// OpenAPI schema for the article payload returned by the article routes.
///
/// Stored content fields (title, body, ...) are passed through alongside
/// the listed properties.
#[derive(ToSchema)]
#[schema(as = Article, rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct ArticleSchema {
    /// Store identifier as a hex string.
    #[schema(rename = "_id", example = "65f1c0ffee00000000000001")]
    id: Option<String>,
    /// Unique article slug.
    #[schema(example = "learn-react")]
    name: String,
    /// Upvote counter.
    upvotes: i64,
    /// Identifiers of users who upvoted.
    upvote_ids: Vec<String>,
    /// Comments in submission order.
    comments: Vec<CommentSchema>,
    /// Whether the requester may upvote. Only present on reads.
    can_upvote: Option<bool>,
}
