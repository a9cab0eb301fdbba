//! Wire types for the `accounts:lookup` endpoint.

use serde::{Deserialize, Serialize};

use crate::domain::{UserId, VerifiedUser};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct LookupRequestDto<'a> {
    pub id_token: &'a str,
}

#[derive(Debug, Deserialize)]
pub(super) struct LookupResponseDto {
    #[serde(default)]
    users: Vec<LookupUserDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupUserDto {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ErrorEnvelopeDto {
    error: ErrorBodyDto,
}

#[derive(Debug, Deserialize)]
struct ErrorBodyDto {
    #[serde(default)]
    message: String,
}

impl ErrorEnvelopeDto {
    pub fn message(&self) -> &str {
        self.error.message.as_str()
    }
}

impl LookupResponseDto {
    /// First user in the response, if it carries a usable identifier.
    pub fn into_verified_user(self) -> Result<VerifiedUser, String> {
        let user = self
            .users
            .into_iter()
            .next()
            .ok_or_else(|| "lookup returned no users".to_owned())?;
        let uid = UserId::new(user.local_id).map_err(|err| err.to_string())?;
        let email = user.email.filter(|email| !email.trim().is_empty());
        Ok(VerifiedUser { uid, email })
    }
}
