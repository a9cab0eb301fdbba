//! Backend entry-point: loads settings, connects the article store, and
//! serves the REST API alongside the bundled frontend.

use std::sync::Arc;

use actix_web::web;
use color_eyre::eyre::{Result, WrapErr, eyre};
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use blog_backend::domain::ArticleService;
use blog_backend::inbound::http::cors::CorsAllowList;
use blog_backend::inbound::http::health::HealthState;
use blog_backend::inbound::http::identity::IdentityResolver;
use blog_backend::inbound::http::spa::StaticSite;
use blog_backend::inbound::http::state::HttpState;
use blog_backend::outbound::identity_toolkit::IdentityToolkitVerifier;
use blog_backend::outbound::mongo::{MongoArticleRepository, connect};
use blog_backend::server::{ServerConfig, create_server};
use blog_backend::settings::BlogSettings;

#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let mut settings = BlogSettings::load_from_iter(std::env::args_os())
        .map_err(|error| eyre!("failed to load settings: {error}"))?;

    let store_config = settings.take_store_config()?;
    let database = connect(&store_config)
        .await
        .wrap_err("failed to connect to the article store")?;
    let repository = Arc::new(MongoArticleRepository::new(database));

    let mode = settings.access_mode();
    let service = Arc::new(ArticleService::new(repository.clone(), mode));
    let http_state = web::Data::new(HttpState::new(service.clone(), service));
    let health_state = web::Data::new(HealthState::new(repository));

    let mut config = ServerConfig::new(settings.bind_address(), mode)
        .with_identity(identity_resolver(&settings)?);

    if settings.development_mode() {
        let origins = settings.cors_allowed_origins();
        info!(?origins, "development mode: enforcing CORS allow-list");
        config = config.with_cors(
            CorsAllowList::new(&origins).wrap_err("invalid CORS allowed origin")?,
        );
    }

    if let Some(dir) = settings.static_dir() {
        let site = StaticSite::open(dir)
            .wrap_err_with(|| format!("failed to open frontend bundle at {}", dir.display()))?;
        config = config.with_static_site(site);
    }

    #[cfg(feature = "metrics")]
    let config = config.with_metrics(Some(make_metrics()?));

    let (host, port) = config.bind_addr();
    info!(%host, port, ?mode, "starting HTTP server");
    actix_web::rt::spawn(fail_liveness_on_shutdown(health_state.clone()));
    let server = create_server(health_state, http_state, config)?;
    server.await?;
    Ok(())
}

/// Fail liveness checks once a stop signal arrives, while actix drains
/// in-flight requests.
async fn fail_liveness_on_shutdown(health: web::Data<HealthState>) {
    match shutdown_signal().await {
        Ok(()) => {
            info!("shutdown signal received; failing liveness checks");
            health.mark_unhealthy();
        }
        Err(error) => warn!(%error, "failed to listen for shutdown signals"),
    }
}

#[cfg(unix)]
async fn shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result,
        _ = terminate.recv() => Ok(()),
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}

fn identity_resolver(settings: &BlogSettings) -> Result<IdentityResolver> {
    let Some(verifier) = settings.verifier_config()? else {
        info!("authentication disabled; every caller is anonymous");
        return Ok(IdentityResolver::disabled());
    };
    let verifier =
        IdentityToolkitVerifier::new(verifier.endpoint, &verifier.api_key, verifier.timeout)
            .wrap_err("failed to build token verifier client")?;
    Ok(IdentityResolver::new(Arc::new(verifier)))
}

#[cfg(feature = "metrics")]
fn make_metrics() -> Result<actix_web_prom::PrometheusMetrics> {
    actix_web_prom::PrometheusMetricsBuilder::new("blog")
        .endpoint("/metrics")
        .build()
        .map_err(|error| eyre!("failed to configure Prometheus metrics: {error}"))
}
