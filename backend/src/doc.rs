//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers the article routes, the health checks, and the
//! schema wrappers from [`crate::inbound::http::schemas`]. Swagger UI serves
//! it under `/docs` in debug builds and `openapi-dump` prints it as JSON.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::inbound::http::articles::CommentBody;
use crate::inbound::http::identity::AUTH_TOKEN_HEADER;
use crate::inbound::http::schemas::{ArticleSchema, CommentSchema, ErrorCodeSchema, ErrorSchema};

/// Enrich the generated document with the identity token header scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "AuthToken",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                AUTH_TOKEN_HEADER,
                "Identity token issued by the sign-in provider.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Blog backend API",
        description = "Articles, upvotes, and reader comments.",
        license(name = "MIT", url = "https://opensource.org/license/mit")
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::articles::get_article,
        crate::inbound::http::articles::upvote_article,
        crate::inbound::http::articles::add_comment,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        ArticleSchema,
        CommentSchema,
        CommentBody,
        ErrorSchema,
        ErrorCodeSchema
    )),
    tags(
        (name = "articles", description = "Reading, upvoting, and commenting on articles"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
