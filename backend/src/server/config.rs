//! HTTP server configuration object and helpers.

#[cfg(feature = "metrics")]
use actix_web_prom::PrometheusMetrics;

use crate::domain::AccessMode;
use crate::inbound::http::cors::CorsAllowList;
use crate::inbound::http::identity::IdentityResolver;
use crate::inbound::http::spa::StaticSite;

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: (String, u16),
    pub(crate) mode: AccessMode,
    pub(crate) identity: IdentityResolver,
    pub(crate) cors: Option<CorsAllowList>,
    pub(crate) static_site: Option<StaticSite>,
    #[cfg(feature = "metrics")]
    pub(crate) prometheus: Option<PrometheusMetrics>,
}

impl ServerConfig {
    /// Start from a bind address, anonymous identity resolution, and no
    /// optional layers.
    #[must_use]
    pub fn new(bind_addr: (String, u16), mode: AccessMode) -> Self {
        Self {
            bind_addr,
            mode,
            identity: IdentityResolver::disabled(),
            cors: None,
            static_site: None,
            #[cfg(feature = "metrics")]
            prometheus: None,
        }
    }

    /// Resolve `authtoken` headers with the given resolver.
    #[must_use]
    pub fn with_identity(mut self, identity: IdentityResolver) -> Self {
        self.identity = identity;
        self
    }

    /// Enforce a cross-origin allow-list.
    #[must_use]
    pub fn with_cors(mut self, cors: CorsAllowList) -> Self {
        self.cors = Some(cors);
        self
    }

    /// Serve the bundled frontend for unmatched non-API paths.
    #[must_use]
    pub fn with_static_site(mut self, site: StaticSite) -> Self {
        self.static_site = Some(site);
        self
    }

    /// Return the host and port the server will bind to.
    #[must_use]
    pub fn bind_addr(&self) -> (&str, u16) {
        (self.bind_addr.0.as_str(), self.bind_addr.1)
    }

    #[cfg(feature = "metrics")]
    /// Attach Prometheus middleware to the configuration.
    #[must_use]
    pub fn with_metrics(mut self, prometheus: Option<PrometheusMetrics>) -> Self {
        self.prometheus = prometheus;
        self
    }
}
