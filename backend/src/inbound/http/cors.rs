//! Origin allow-list for cross-origin browser requests.
//!
//! Installed in development mode, where the frontend dev server runs on a
//! different origin. Negotiation is delegated to `actix-cors`; this module
//! owns the allow-list and how origins are compared.

use std::collections::HashSet;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::dev::RequestHead;
use actix_web::http::header::HeaderValue;
use tracing::warn;
use url::Url;

const ALLOWED_METHODS: [&str; 6] = ["GET", "HEAD", "PUT", "PATCH", "POST", "DELETE"];
const PREFLIGHT_MAX_AGE_SECS: usize = 3600;

/// Normalise an origin to `scheme://host[:port]`. Opaque origins yield `None`.
fn normalise_origin(raw: &str) -> Option<String> {
    let origin = Url::parse(raw).ok()?.origin();
    origin.is_tuple().then(|| origin.ascii_serialization())
}

/// Static set of origins accepted by the development CORS layer.
///
/// # Examples
/// ```
/// use actix_web::App;
/// use blog_backend::inbound::http::cors::CorsAllowList;
///
/// let cors = CorsAllowList::new(["http://localhost:5173"]).expect("valid origins");
/// let _app = App::new().wrap(cors.middleware());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CorsAllowList {
    origins: Arc<HashSet<String>>,
}

impl CorsAllowList {
    /// Build an allow-list from absolute origins.
    ///
    /// # Errors
    ///
    /// Returns [`url::ParseError`] when an entry is not an absolute URL.
    pub fn new<I, S>(origins: I) -> Result<Self, url::ParseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let origins = origins
            .into_iter()
            .map(|raw| Url::parse(raw.as_ref()).map(|url| url.origin().ascii_serialization()))
            .collect::<Result<HashSet<_>, _>>()?;
        Ok(Self {
            origins: Arc::new(origins),
        })
    }

    /// Whether the raw `Origin` header value names an allowed origin.
    pub fn allows(&self, header: &HeaderValue) -> bool {
        let allowed = header
            .to_str()
            .ok()
            .and_then(normalise_origin)
            .is_some_and(|origin| self.origins.contains(&origin));
        if !allowed {
            warn!(origin = ?header, "rejected cross-origin request");
        }
        allowed
    }

    /// CORS middleware accepting exactly this allow-list.
    ///
    /// Requests without an `Origin` header pass untouched. Disallowed or
    /// unparsable origins are answered with 400 before reaching a handler.
    pub fn middleware(&self) -> Cors {
        let allow_list = self.clone();
        Cors::default()
            .allowed_origin_fn(move |origin: &HeaderValue, _head: &RequestHead| {
                allow_list.allows(origin)
            })
            .allowed_methods(ALLOWED_METHODS)
            .allow_any_header()
            .max_age(PREFLIGHT_MAX_AGE_SECS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::Method;
    use actix_web::http::StatusCode;
    use actix_web::http::header::{
        ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
        ACCESS_CONTROL_REQUEST_HEADERS, ACCESS_CONTROL_REQUEST_METHOD, ORIGIN, VARY,
    };
    use actix_web::{App, HttpResponse, test as actix_test, web};
    use rstest::rstest;

    fn allow_list() -> CorsAllowList {
        CorsAllowList::new(["http://localhost:5173", "https://blog.example/"])
            .expect("valid origins")
    }

    async fn call(
        req: actix_test::TestRequest,
    ) -> (StatusCode, actix_web::http::header::HeaderMap) {
        let app = actix_test::init_service(
            App::new()
                .wrap(allow_list().middleware())
                .route("/api/ping", web::get().to(HttpResponse::Ok)),
        )
        .await;
        let res = actix_test::call_service(&app, req.to_request()).await;
        (res.status(), res.headers().clone())
    }

    fn header_text(
        headers: &actix_web::http::header::HeaderMap,
        name: impl actix_web::http::header::AsHeaderName,
    ) -> String {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase()
    }

    #[rstest]
    #[case("http://localhost:5173", Some("http://localhost:5173".to_owned()))]
    #[case("https://blog.example:443", Some("https://blog.example".to_owned()))]
    #[case("null", None)]
    #[case("file:///etc/passwd", None)]
    fn normalises_origins(#[case] raw: &str, #[case] expected: Option<String>) {
        assert_eq!(normalise_origin(raw), expected);
    }

    #[rstest]
    #[case("http://localhost:5173", true)]
    #[case("https://blog.example:443", true)]
    #[case("https://evil.example", false)]
    #[case("not a url", false)]
    fn allow_list_matches_normalised_origins(#[case] raw: &'static str, #[case] allowed: bool) {
        assert_eq!(allow_list().allows(&HeaderValue::from_static(raw)), allowed);
    }

    #[actix_web::test]
    async fn requests_without_origin_pass_untouched() {
        let (status, headers) = call(actix_test::TestRequest::get().uri("/api/ping")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(headers.get(ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    }

    #[actix_web::test]
    async fn allowed_origins_are_echoed() {
        let (status, headers) = call(
            actix_test::TestRequest::get()
                .uri("/api/ping")
                .insert_header((ORIGIN, "http://localhost:5173")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            headers.get(ACCESS_CONTROL_ALLOW_ORIGIN),
            Some(&HeaderValue::from_static("http://localhost:5173"))
        );
        assert!(header_text(&headers, VARY).contains("origin"));
    }

    #[rstest]
    #[case("https://evil.example")]
    #[case("not a url")]
    #[actix_web::test]
    async fn other_origins_are_rejected(#[case] origin: &'static str) {
        let (status, headers) = call(
            actix_test::TestRequest::get()
                .uri("/api/ping")
                .insert_header((ORIGIN, origin)),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(headers.get(ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    }

    #[actix_web::test]
    async fn preflight_is_answered_directly() {
        let (status, headers) = call(
            actix_test::TestRequest::default()
                .method(Method::OPTIONS)
                .uri("/api/articles/x/upvote")
                .insert_header((ORIGIN, "https://blog.example"))
                .insert_header((ACCESS_CONTROL_REQUEST_METHOD, "PUT"))
                .insert_header((ACCESS_CONTROL_REQUEST_HEADERS, "authtoken")),
        )
        .await;
        assert!(status.is_success());
        assert_eq!(
            headers.get(ACCESS_CONTROL_ALLOW_ORIGIN),
            Some(&HeaderValue::from_static("https://blog.example"))
        );
        assert!(header_text(&headers, ACCESS_CONTROL_ALLOW_METHODS).contains("put"));
        assert!(header_text(&headers, ACCESS_CONTROL_ALLOW_HEADERS).contains("authtoken"));
    }

    #[test]
    fn rejects_relative_allow_list_entries() {
        assert!(CorsAllowList::new(["/relative"]).is_err());
    }
}
