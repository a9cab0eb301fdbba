//! Static hosting for the bundled frontend with single-page-app fallback.
//!
//! Registered as the application's default service. `GET`/`HEAD` requests
//! outside `/api` are served from the static directory: existing files as
//! themselves, everything else as `index.html` so client-side routing works.
//! Unmatched API paths and other methods receive a JSON 404.

use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use actix_web::http::Method;
use actix_web::{HttpRequest, HttpResponse, web};
use cap_std::{ambient_authority, fs::Dir};
use percent_encoding::percent_decode_str;
use serde_json::json;
use tracing::{debug, error};

use crate::domain::Error;
use crate::inbound::http::ApiResult;

const INDEX_DOCUMENT: &str = "index.html";
const API_PREFIX: &str = "/api";

/// Capability-scoped handle on the frontend build directory.
#[derive(Clone)]
pub struct StaticSite {
    root: Arc<Dir>,
}

/// Loaded file ready to be written to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticAsset {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
}

impl StaticSite {
    /// Open `path` and confirm it contains `index.html`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the directory cannot be opened or has no
    /// entry document.
    pub fn open(path: &Path) -> io::Result<Self> {
        let root = Dir::open_ambient_dir(path, ambient_authority())?;
        if !root.metadata(INDEX_DOCUMENT)?.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{INDEX_DOCUMENT} is not a regular file"),
            ));
        }
        Ok(Self {
            root: Arc::new(root),
        })
    }

    /// Load the asset at `request_path`, falling back to `index.html`.
    ///
    /// Blocking; call through [`web::block`].
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the entry document cannot be read.
    pub fn load(&self, request_path: &str) -> io::Result<StaticAsset> {
        let existing = relative_asset_path(request_path).filter(|relative| {
            self.root
                .metadata(relative)
                .is_ok_and(|meta| meta.is_file())
        });
        if let Some(relative) = existing {
            let bytes = self.root.read(&relative)?;
            return Ok(StaticAsset {
                bytes,
                content_type: content_type_for(&relative),
            });
        }

        let bytes = self.root.read(INDEX_DOCUMENT)?;
        Ok(StaticAsset {
            bytes,
            content_type: content_type_for(Path::new(INDEX_DOCUMENT)),
        })
    }
}

/// Map a percent-encoded URL path onto a relative file path. Returns `None`
/// for the site root, for undecodable segments, and for paths that try to
/// climb out of it.
fn relative_asset_path(request_path: &str) -> Option<PathBuf> {
    let mut relative = PathBuf::new();
    for raw in request_path.split('/') {
        let segment = percent_decode_str(raw).decode_utf8().ok()?;
        match segment.as_ref() {
            "" | "." => {}
            ".." => return None,
            s if s.contains(['/', '\\', '\0']) => return None,
            s => relative.push(s),
        }
    }
    (!relative.as_os_str().is_empty()).then_some(relative)
}

fn content_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(OsStr::to_str)
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("js" | "mjs") => "text/javascript; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("json" | "map") => "application/json",
        Some("txt") => "text/plain; charset=utf-8",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("ico") => "image/x-icon",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("wasm") => "application/wasm",
        _ => "application/octet-stream",
    }
}

fn is_api_path(path: &str) -> bool {
    path.starts_with(API_PREFIX)
}

fn no_route(path: &str) -> Error {
    Error::not_found("no route matches this path").with_details(json!({ "path": path }))
}

/// Default service: serve the frontend or answer with a JSON 404.
pub async fn spa_fallback(
    req: HttpRequest,
    site: Option<web::Data<StaticSite>>,
) -> ApiResult<HttpResponse> {
    let path = req.path().to_owned();
    let servable = matches!(*req.method(), Method::GET | Method::HEAD) && !is_api_path(&path);
    let Some(site) = site.filter(|_| servable) else {
        debug!(%path, method = %req.method(), "no route matched");
        return Err(no_route(&path));
    };

    let request_path = path.clone();
    let asset = web::block(move || site.load(&request_path))
        .await
        .map_err(|err| Error::internal(format!("static file task failed: {err}")))?
        .map_err(|err| {
            error!(%path, error = %err, "failed to read frontend bundle");
            Error::internal(format!("failed to read frontend bundle: {err}"))
        })?;

    Ok(HttpResponse::Ok()
        .content_type(asset.content_type)
        .body(asset.bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::static_site_fixture;
    use actix_web::http::StatusCode;
    use actix_web::{App, test as actix_test};
    use rstest::rstest;

    #[rstest]
    #[case("/", None)]
    #[case("/about", Some("about"))]
    #[case("/assets/./app.js", Some("assets/app.js"))]
    #[case("//assets//app.js", Some("assets/app.js"))]
    #[case("/../secret", None)]
    #[case("/a\\b", None)]
    #[case("/assets/my%20font.woff2", Some("assets/my font.woff2"))]
    #[case("/%2e%2e/secret", None)]
    #[case("/assets%2F..%2Fsecret", None)]
    #[case("/a%5Cb", None)]
    #[case("/a%00b", None)]
    #[case("/%FF", None)]
    fn maps_request_paths(#[case] raw: &str, #[case] expected: Option<&str>) {
        assert_eq!(relative_asset_path(raw), expected.map(PathBuf::from));
    }

    #[rstest]
    #[case("index.html", "text/html; charset=utf-8")]
    #[case("app.JS", "text/javascript; charset=utf-8")]
    #[case("logo.svg", "image/svg+xml")]
    #[case("blob", "application/octet-stream")]
    fn guesses_content_types(#[case] file: &str, #[case] expected: &str) {
        assert_eq!(content_type_for(Path::new(file)), expected);
    }

    #[rstest]
    #[case("/api", false)]
    #[case("/api/articles/x", false)]
    #[case("/apiary", false)]
    #[case("/articles/learn-react", true)]
    fn only_non_api_paths_are_servable(#[case] path: &str, #[case] servable: bool) {
        assert_eq!(!is_api_path(path), servable);
    }

    #[test]
    fn open_requires_index_document() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(StaticSite::open(dir.path()).is_err());
    }

    #[test]
    fn load_serves_files_and_falls_back_to_index() {
        let (_dir, site) = static_site_fixture();
        let asset = site.load("/assets/app.js").expect("asset");
        assert_eq!(asset.content_type, "text/javascript; charset=utf-8");
        assert_eq!(asset.bytes, b"console.log('blog');".to_vec());

        let fallback = site.load("/articles/learn-react").expect("index");
        assert_eq!(fallback.content_type, "text/html; charset=utf-8");
        assert!(String::from_utf8_lossy(&fallback.bytes).contains("<div id=\"root\">"));

        let directory = site.load("/assets").expect("index");
        assert_eq!(directory.content_type, "text/html; charset=utf-8");
    }

    #[test]
    fn load_decodes_escaped_file_names() {
        let (_dir, site) = static_site_fixture();
        let font = site.load("/assets/my%20font.woff2").expect("font");
        assert_eq!(font.content_type, "font/woff2");
        assert_eq!(font.bytes, b"wOF2".to_vec());
    }

    async fn status_for(site: Option<StaticSite>, req: actix_test::TestRequest) -> StatusCode {
        let mut app = App::new().default_service(web::to(spa_fallback));
        if let Some(site) = site {
            app = app.app_data(web::Data::new(site));
        }
        let app = actix_test::init_service(app).await;
        actix_test::call_service(&app, req.to_request()).await.status()
    }

    #[actix_web::test]
    async fn api_paths_and_mutations_get_json_404() {
        let (_dir, site) = static_site_fixture();
        let api = status_for(
            Some(site.clone()),
            actix_test::TestRequest::get().uri("/api/unknown"),
        )
        .await;
        assert_eq!(api, StatusCode::NOT_FOUND);

        let post = status_for(Some(site), actix_test::TestRequest::post().uri("/about")).await;
        assert_eq!(post, StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn hosting_disabled_without_static_dir() {
        let status = status_for(None, actix_test::TestRequest::get().uri("/about")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn client_routes_receive_index() {
        let (_dir, site) = static_site_fixture();
        let status = status_for(Some(site), actix_test::TestRequest::get().uri("/articles/x")).await;
        assert_eq!(status, StatusCode::OK);
    }
}
