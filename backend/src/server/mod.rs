//! Server construction and middleware wiring.

mod config;

pub use config::ServerConfig;

use actix_web::body::MessageBody;
use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::middleware::Condition;
use actix_web::{App, HttpServer, web};
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

use crate::Trace;
#[cfg(debug_assertions)]
use crate::doc::ApiDoc;
use crate::domain::AccessMode;
use crate::inbound::http::articles;
use crate::inbound::http::cors::CorsAllowList;
use crate::inbound::http::health::{HealthState, live, ready};
use crate::inbound::http::identity::IdentityResolver;
use crate::inbound::http::spa::{StaticSite, spa_fallback};
use crate::inbound::http::state::HttpState;

/// Everything a single worker's [`App`] needs.
#[derive(Clone)]
pub struct AppDependencies {
    pub health_state: web::Data<HealthState>,
    pub http_state: web::Data<HttpState>,
    pub mode: AccessMode,
    pub identity: IdentityResolver,
    pub cors: Option<CorsAllowList>,
    pub static_site: Option<web::Data<StaticSite>>,
}

/// Assemble the application.
///
/// Article routes live under `/api` and health checks sit at the root.
/// Anything unmatched falls through to the frontend bundle when one is
/// configured. Every request passes the identity resolver after CORS, so a
/// forged token is rejected on public routes too. Every response carries a
/// `trace-id`.
pub fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
        mode,
        identity,
        cors,
        static_site,
    } = deps;

    let api = web::scope("/api").configure(|cfg| articles::configure(cfg, mode));

    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .service(api)
        .service(ready)
        .service(live);

    let app = match static_site {
        Some(site) => app.app_data(site),
        None => app,
    };

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    let cors_enabled = cors.is_some();
    let cors = cors.unwrap_or_default().middleware();
    app.default_service(web::to(spa_fallback))
        .wrap(identity)
        .wrap(Condition::new(cors_enabled, cors))
        .wrap(Trace)
}

/// Construct an Actix HTTP server from prepared state and configuration.
///
/// The readiness flag flips once the listener is bound.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let ServerConfig {
        bind_addr,
        mode,
        identity,
        cors,
        static_site,
        #[cfg(feature = "metrics")]
        prometheus,
    } = config;

    #[cfg(feature = "metrics")]
    let (metrics_enabled, metrics) = metrics_layer(prometheus)?;

    let deps = AppDependencies {
        health_state: health_state.clone(),
        http_state,
        mode,
        identity,
        cors,
        static_site: static_site.map(web::Data::new),
    };

    let server = HttpServer::new(move || {
        let app = build_app(deps.clone());

        #[cfg(feature = "metrics")]
        let app = app.wrap(Condition::new(metrics_enabled, metrics.clone()));

        app
    })
    .bind(bind_addr)?
    .run();

    health_state.mark_ready();
    Ok(server)
}

/// Resolve the optional metrics middleware to a value `Condition` can wrap.
#[cfg(feature = "metrics")]
fn metrics_layer(
    prometheus: Option<actix_web_prom::PrometheusMetrics>,
) -> std::io::Result<(bool, actix_web_prom::PrometheusMetrics)> {
    match prometheus {
        Some(metrics) => Ok((true, metrics)),
        None => actix_web_prom::PrometheusMetricsBuilder::new("blog")
            .build()
            .map(|metrics| (false, metrics))
            .map_err(|error| std::io::Error::other(format!("metrics setup failed: {error}"))),
    }
}
