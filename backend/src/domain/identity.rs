//! Per-request caller identity.
//!
//! An [`Identity`] is resolved once per request from the `authtoken` header
//! and never persisted. Anonymous callers carry no subject identifier.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Length of a token fingerprint in bytes before hex encoding.
const FINGERPRINT_BYTES: usize = 8;

/// Validation errors for identity primitives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityValidationError {
    EmptyUserId,
    PaddedUserId,
    EmptyToken,
}

impl fmt::Display for IdentityValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyUserId => write!(f, "user id must not be empty"),
            Self::PaddedUserId => write!(f, "user id must not contain surrounding whitespace"),
            Self::EmptyToken => write!(f, "identity token must not be empty"),
        }
    }
}

impl std::error::Error for IdentityValidationError {}

/// Subject identifier issued by the token verification service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// Validate and construct a [`UserId`].
    pub fn new(id: impl Into<String>) -> Result<Self, IdentityValidationError> {
        let id = id.into();
        if id.is_empty() {
            return Err(IdentityValidationError::EmptyUserId);
        }
        if id.trim() != id {
            return Err(IdentityValidationError::PaddedUserId);
        }
        Ok(Self(id))
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        value.0
    }
}

impl TryFrom<String> for UserId {
    type Error = IdentityValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Caller confirmed by the token verification service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedUser {
    pub uid: UserId,
    pub email: Option<String>,
}

/// Resolved identity attached to every request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Identity {
    #[default]
    Anonymous,
    Authenticated(VerifiedUser),
}

impl Identity {
    /// Subject identifier when authenticated.
    pub fn uid(&self) -> Option<&UserId> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated(user) => Some(&user.uid),
        }
    }

    /// Email address when authenticated and known.
    pub fn email(&self) -> Option<&str> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated(user) => user.email.as_deref(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }
}

impl From<VerifiedUser> for Identity {
    fn from(value: VerifiedUser) -> Self {
        Self::Authenticated(value)
    }
}

/// Opaque identity token presented by a client.
///
/// `Debug` never prints the token; use [`IdToken::fingerprint`] to correlate
/// tokens in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct IdToken(String);

impl IdToken {
    /// Wrap a raw token, rejecting blank input.
    pub fn new(token: impl Into<String>) -> Result<Self, IdentityValidationError> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(IdentityValidationError::EmptyToken);
        }
        Ok(Self(token))
    }

    /// Raw token for forwarding to the verification service.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }

    /// Truncated SHA-256 fingerprint as 16 hex characters.
    ///
    /// # Examples
    /// ```
    /// use blog_backend::domain::IdToken;
    ///
    /// let token = IdToken::new("eyJhbGciOi").expect("token");
    /// let fp = token.fingerprint();
    /// assert_eq!(fp.len(), 16);
    /// assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
    /// ```
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.0.as_bytes());
        hex::encode(&digest[..FINGERPRINT_BYTES])
    }
}

impl fmt::Debug for IdToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("IdToken").field(&self.fingerprint()).finish()
    }
}

/// How the service treats callers.
///
/// In [`AccessMode::Authenticated`] upvotes are de-duplicated per user and
/// comment authors come from the verified identity. In
/// [`AccessMode::Anonymous`] no identity is resolved, upvotes are plain
/// increments, and comment authors are taken from the request body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AccessMode {
    Anonymous,
    #[default]
    Authenticated,
}
