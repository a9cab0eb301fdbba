//! Reqwest-backed token verifier.
//!
//! Owns transport details only: request serialisation, timeout and HTTP
//! status mapping, and JSON decoding into a [`VerifiedUser`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use tracing::{debug, warn};

use super::dto::{ErrorEnvelopeDto, LookupRequestDto, LookupResponseDto};
use crate::domain::ports::{TokenVerificationError, TokenVerifier};
use crate::domain::{IdToken, VerifiedUser};

/// Default Identity Toolkit lookup endpoint.
pub const DEFAULT_LOOKUP_URL: &str = "https://identitytoolkit.googleapis.com/v1/accounts:lookup";

/// Token verifier that resolves ID tokens through Identity Toolkit.
pub struct IdentityToolkitVerifier {
    client: Client,
    endpoint: Url,
}

impl IdentityToolkitVerifier {
    /// Build a verifier posting to `endpoint` with the project API key.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(mut endpoint: Url, api_key: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        endpoint.query_pairs_mut().append_pair("key", api_key);
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl TokenVerifier for IdentityToolkitVerifier {
    async fn verify(&self, token: &IdToken) -> Result<VerifiedUser, TokenVerificationError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&LookupRequestDto {
                id_token: token.expose(),
            })
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            let error = map_status_error(status, body.as_ref());
            warn!(
                token = %token.fingerprint(),
                status = status.as_u16(),
                %error,
                "token verification failed"
            );
            return Err(error);
        }

        let user = parse_user(body.as_ref())?;
        debug!(token = %token.fingerprint(), uid = %user.uid, "token verified");
        Ok(user)
    }
}

fn parse_user(body: &[u8]) -> Result<VerifiedUser, TokenVerificationError> {
    let decoded: LookupResponseDto = serde_json::from_slice(body).map_err(|error| {
        TokenVerificationError::unavailable(format!("invalid lookup payload: {error}"))
    })?;
    decoded
        .into_verified_user()
        .map_err(TokenVerificationError::rejected)
}

fn map_transport_error(error: reqwest::Error) -> TokenVerificationError {
    if error.is_timeout() {
        TokenVerificationError::unavailable(format!("verifier timed out: {error}"))
    } else {
        TokenVerificationError::unavailable(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> TokenVerificationError {
    let reason = serde_json::from_slice::<ErrorEnvelopeDto>(body)
        .ok()
        .map(|envelope| envelope.message().to_owned())
        .filter(|message| !message.is_empty());
    let message = match reason {
        Some(reason) => format!("status {}: {reason}", status.as_u16()),
        None => format!("status {}", status.as_u16()),
    };

    match status {
        StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS => {
            TokenVerificationError::unavailable(message)
        }
        _ if status.is_client_error() => TokenVerificationError::rejected(message),
        _ => TokenVerificationError::unavailable(message),
    }
}
