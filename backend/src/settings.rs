//! Blog backend configuration loaded via OrthoConfig.
//!
//! Values come from CLI flags, `BLOG_*` environment variables, and optional
//! configuration files. Optional fields fall back to defaults through the
//! accessor methods so the raw struct mirrors exactly what was supplied.
//!
//! The two mode toggles are read from the environment and files only. A
//! clap `SetTrue` flag always reports `false` when absent, which would mask
//! `BLOG_DEVELOPMENT_MODE=1` and the authentication default.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::de::{self, Deserializer, SeqAccess, Visitor};
use serde::Deserialize;
use url::Url;
use zeroize::Zeroizing;

use crate::domain::AccessMode;
use crate::outbound::identity_toolkit::DEFAULT_LOOKUP_URL;
use crate::outbound::mongo::{StoreConfig, StoreEndpoint};

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_LOCAL_DB_URI: &str = "mongodb://127.0.0.1:27017";
const DEFAULT_DB_NAME: &str = "react-blog-db";
const DEFAULT_VERIFIER_TIMEOUT_SECS: u64 = 10;
const DEFAULT_CORS_ALLOWED_ORIGINS: &str = "http://localhost:5173,http://localhost:8000";

/// Errors raised when settings are incomplete or malformed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    /// A value required by the selected mode was not supplied.
    #[error("missing required setting `{key}`")]
    Missing { key: &'static str },

    /// A supplied value could not be interpreted.
    #[error("invalid setting `{key}`: {message}")]
    Invalid { key: &'static str, message: String },
}

/// Token verifier connection details.
#[derive(Clone)]
pub struct VerifierConfig {
    pub endpoint: Url,
    pub api_key: Zeroizing<String>,
    pub timeout: Duration,
}

impl std::fmt::Debug for VerifierConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerifierConfig")
            .field("endpoint", &self.endpoint.as_str())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Runtime configuration for the blog backend.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "BLOG")]
pub struct BlogSettings {
    /// Use the local store and enable the CORS allow-list.
    #[ortho_config(skip_cli)]
    #[serde(default, deserialize_with = "deserialize_toggle")]
    pub development_mode: Option<bool>,
    /// Interface the HTTP listener binds to.
    pub host: Option<String>,
    /// Port the HTTP listener binds to.
    pub port: Option<u16>,
    /// Store URI used in development mode.
    pub local_db_uri: Option<String>,
    /// Cluster host used outside development mode.
    pub db_cluster_host: Option<String>,
    /// Cluster username used outside development mode.
    pub db_username: Option<String>,
    /// Cluster password used outside development mode.
    pub db_password: Option<String>,
    /// Database holding the `articles` collection.
    pub db_name: Option<String>,
    /// Server selection and connect timeout in milliseconds.
    pub db_timeout_ms: Option<u64>,
    /// Resolve `authtoken` headers and gate mutations behind an identity.
    #[ortho_config(skip_cli)]
    #[serde(default, deserialize_with = "deserialize_toggle")]
    pub auth_enabled: Option<bool>,
    /// Token verification endpoint.
    pub token_verifier_url: Option<String>,
    /// API key appended to token verification requests.
    pub token_verifier_api_key: Option<String>,
    /// Token verification request timeout in seconds.
    pub token_verifier_timeout_secs: Option<u64>,
    /// Origins accepted in development mode, as a list or a comma-separated
    /// string.
    #[serde(default, deserialize_with = "deserialize_origins")]
    pub cors_allowed_origins: Option<Vec<String>>,
    /// Directory holding the prebuilt frontend bundle.
    pub static_dir: Option<PathBuf>,
}

impl BlogSettings {
    /// Host and port for the HTTP listener.
    pub fn bind_address(&self) -> (String, u16) {
        (
            self.host.clone().unwrap_or_else(|| DEFAULT_HOST.to_owned()),
            self.port.unwrap_or(DEFAULT_PORT),
        )
    }

    /// Database name, falling back to `react-blog-db`.
    pub fn db_name(&self) -> &str {
        self.db_name.as_deref().unwrap_or(DEFAULT_DB_NAME)
    }

    /// Whether development mode is on. Defaults to off.
    pub fn development_mode(&self) -> bool {
        self.development_mode.unwrap_or(false)
    }

    /// Whether authentication is on. Defaults to on.
    pub fn auth_enabled(&self) -> bool {
        self.auth_enabled.unwrap_or(true)
    }

    pub fn access_mode(&self) -> AccessMode {
        if self.auth_enabled() {
            AccessMode::Authenticated
        } else {
            AccessMode::Anonymous
        }
    }

    /// Origins accepted by the development CORS allow-list.
    pub fn cors_allowed_origins(&self) -> Vec<String> {
        match &self.cors_allowed_origins {
            Some(origins) => origins
                .iter()
                .map(|origin| origin.trim())
                .filter(|origin| !origin.is_empty())
                .map(str::to_owned)
                .collect(),
            None => split_origins(DEFAULT_CORS_ALLOWED_ORIGINS),
        }
    }

    pub fn static_dir(&self) -> Option<&Path> {
        self.static_dir.as_deref()
    }

    /// Build the store configuration for the active mode.
    ///
    /// The cluster password is moved out of the settings into a zeroising
    /// buffer, so a second call outside development mode reports it missing.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Missing`] when cluster credentials are
    /// absent outside development mode.
    pub fn take_store_config(&mut self) -> Result<StoreConfig, SettingsError> {
        let endpoint = if self.development_mode() {
            StoreEndpoint::local(
                self.local_db_uri
                    .clone()
                    .unwrap_or_else(|| DEFAULT_LOCAL_DB_URI.to_owned()),
            )
        } else {
            let host = self
                .db_cluster_host
                .clone()
                .ok_or(SettingsError::Missing {
                    key: "db_cluster_host",
                })?;
            let username = self
                .db_username
                .clone()
                .ok_or(SettingsError::Missing { key: "db_username" })?;
            let password = self
                .db_password
                .take()
                .map(Zeroizing::new)
                .ok_or(SettingsError::Missing { key: "db_password" })?;
            StoreEndpoint::cluster(host, username, password)
        };

        Ok(StoreConfig::new(endpoint, self.db_name())
            .with_timeout(self.db_timeout_ms.map(Duration::from_millis)))
    }

    /// Token verifier configuration, or `None` when authentication is off.
    ///
    /// # Errors
    ///
    /// Returns an error when authentication is enabled without an API key or
    /// with an unparsable verifier URL.
    pub fn verifier_config(&self) -> Result<Option<VerifierConfig>, SettingsError> {
        if !self.auth_enabled() {
            return Ok(None);
        }
        let api_key = self
            .token_verifier_api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .map(Zeroizing::new)
            .ok_or(SettingsError::Missing {
                key: "token_verifier_api_key",
            })?;
        let raw_url = self
            .token_verifier_url
            .as_deref()
            .unwrap_or(DEFAULT_LOOKUP_URL);
        let endpoint = Url::parse(raw_url).map_err(|err| SettingsError::Invalid {
            key: "token_verifier_url",
            message: err.to_string(),
        })?;
        let timeout = Duration::from_secs(
            self.token_verifier_timeout_secs
                .unwrap_or(DEFAULT_VERIFIER_TIMEOUT_SECS),
        );
        Ok(Some(VerifierConfig {
            endpoint,
            api_key,
            timeout,
        }))
    }
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_owned)
        .collect()
}

const TOGGLE_EXPECTED: &str = "one of 1|0|true|false|yes|no|y|n";

fn parse_toggle(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" => Some(true),
        "0" | "false" | "no" | "n" => Some(false),
        _ => None,
    }
}

struct ToggleVisitor;

impl Visitor<'_> for ToggleVisitor {
    type Value = bool;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(TOGGLE_EXPECTED)
    }

    fn visit_bool<E: de::Error>(self, value: bool) -> Result<bool, E> {
        Ok(value)
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<bool, E> {
        match value {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err(E::invalid_value(de::Unexpected::Unsigned(value), &self)),
        }
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<bool, E> {
        match u64::try_from(value) {
            Ok(value) => self.visit_u64(value),
            Err(_) => Err(E::invalid_value(de::Unexpected::Signed(value), &self)),
        }
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<bool, E> {
        parse_toggle(value).ok_or_else(|| E::invalid_value(de::Unexpected::Str(value), &self))
    }
}

fn deserialize_toggle<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(ToggleVisitor).map(Some)
}

struct OriginsVisitor;

impl<'de> Visitor<'de> for OriginsVisitor {
    type Value = Vec<String>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a comma-separated string or a list of origins")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Vec<String>, E> {
        Ok(split_origins(value))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Vec<String>, A::Error> {
        let mut origins = Vec::new();
        while let Some(origin) = seq.next_element::<String>()? {
            origins.push(origin);
        }
        Ok(origins)
    }
}

fn deserialize_origins<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(OriginsVisitor).map(Some)
}
