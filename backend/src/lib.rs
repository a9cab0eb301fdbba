//! Blog backend library modules.
//!
//! The crate follows a hexagonal layout: [`domain`] holds the article
//! aggregate, its ports, and the service implementing them; [`inbound`]
//! adapts HTTP to those ports; [`outbound`] implements them against the
//! document store and the identity provider.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod server;
pub mod settings;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use domain::TraceId;
pub use middleware::Trace;
