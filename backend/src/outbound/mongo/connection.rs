//! Document store connection setup.
//!
//! Builds the driver client for either the local development endpoint or a
//! credentialed cluster, then pings the database so startup fails before the
//! HTTP listener binds.
//!
//! # Example
//!
//! ```ignore
//! let config = StoreConfig::new(StoreEndpoint::local("mongodb://127.0.0.1:27017"), "react-blog-db")
//!     .with_timeout(Some(Duration::from_secs(5)));
//! let store = connect(&config).await?;
//! ```

use std::fmt;
use std::time::Duration;

use mongodb::bson::doc;
use mongodb::options::ClientOptions;
use mongodb::{Client, Database};
use tracing::info;
use url::Url;
use zeroize::Zeroizing;

/// Errors raised while establishing the store connection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The connection string could not be assembled or parsed.
    #[error("invalid document store address: {message}")]
    Address { message: String },

    /// The store did not answer the startup ping.
    #[error("document store unreachable: {message}")]
    Unreachable { message: String },
}

impl StoreError {
    pub fn address(message: impl Into<String>) -> Self {
        Self::Address {
            message: message.into(),
        }
    }

    pub fn unreachable(message: impl Into<String>) -> Self {
        Self::Unreachable {
            message: message.into(),
        }
    }
}

/// Where the document store lives.
#[derive(Clone)]
pub enum StoreEndpoint {
    /// Unauthenticated endpoint, used in development mode.
    Local { uri: String },
    /// Remote cluster reached through an SRV record with credentials.
    Cluster {
        host: String,
        username: String,
        password: Zeroizing<String>,
    },
}

impl StoreEndpoint {
    pub fn local(uri: impl Into<String>) -> Self {
        Self::Local { uri: uri.into() }
    }

    pub fn cluster(
        host: impl Into<String>,
        username: impl Into<String>,
        password: Zeroizing<String>,
    ) -> Self {
        Self::Cluster {
            host: host.into(),
            username: username.into(),
            password,
        }
    }

    /// Full connection string. Credentials are percent-encoded.
    pub fn connection_uri(&self) -> Result<Zeroizing<String>, StoreError> {
        match self {
            Self::Local { uri } => Ok(Zeroizing::new(uri.clone())),
            Self::Cluster {
                host,
                username,
                password,
            } => {
                let mut url = Url::parse(&format!(
                    "mongodb+srv://{host}/?retryWrites=true&w=majority"
                ))
                .map_err(|err| StoreError::address(format!("cluster host {host:?}: {err}")))?;
                url.set_username(username)
                    .map_err(|()| StoreError::address("cluster username rejected"))?;
                url.set_password(Some(password.as_str()))
                    .map_err(|()| StoreError::address("cluster password rejected"))?;
                Ok(Zeroizing::new(String::from(url)))
            }
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::Local { uri } => uri.clone(),
            Self::Cluster { host, .. } => format!("mongodb+srv://{host}"),
        }
    }
}

impl fmt::Debug for StoreEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local { uri } => f.debug_struct("Local").field("uri", uri).finish(),
            Self::Cluster { host, username, .. } => f
                .debug_struct("Cluster")
                .field("host", host)
                .field("username", username)
                .finish_non_exhaustive(),
        }
    }
}

/// Connection settings for the document store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    endpoint: StoreEndpoint,
    database: String,
    timeout: Option<Duration>,
}

impl StoreConfig {
    pub fn new(endpoint: StoreEndpoint, database: impl Into<String>) -> Self {
        Self {
            endpoint,
            database: database.into(),
            timeout: None,
        }
    }

    /// Bound server selection and connection establishment. `None` keeps the
    /// driver defaults.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn endpoint(&self) -> &StoreEndpoint {
        &self.endpoint
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

/// Connect to the configured database and confirm it answers a ping.
///
/// # Errors
///
/// Returns [`StoreError::Address`] for malformed endpoints and
/// [`StoreError::Unreachable`] when the ping fails.
pub async fn connect(config: &StoreConfig) -> Result<Database, StoreError> {
    let uri = config.endpoint.connection_uri()?;
    let mut options = ClientOptions::parse(uri.as_str())
        .await
        .map_err(|err| StoreError::address(err.to_string()))?;
    options.app_name = Some(env!("CARGO_PKG_NAME").to_owned());
    if let Some(timeout) = config.timeout {
        options.server_selection_timeout = Some(timeout);
        options.connect_timeout = Some(timeout);
    }

    let client =
        Client::with_options(options).map_err(|err| StoreError::address(err.to_string()))?;
    let database = client.database(&config.database);
    database
        .run_command(doc! { "ping": 1 })
        .await
        .map_err(|err| StoreError::unreachable(err.to_string()))?;

    info!(
        endpoint = %config.endpoint.describe(),
        database = %config.database,
        "connected to document store"
    );
    Ok(database)
}
