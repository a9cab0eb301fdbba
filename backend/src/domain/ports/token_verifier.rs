//! Driven port for identity token verification.

use async_trait::async_trait;

use crate::domain::{IdToken, VerifiedUser};

use super::define_port_error;

define_port_error! {
    /// Failures raised while verifying a client identity token.
    pub enum TokenVerificationError {
        /// The verification service refused the token.
        Rejected { message: String } => "identity token rejected: {message}",
        /// The verification service could not be reached or failed.
        Unavailable { message: String } => "token verification unavailable: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// Resolve a token to the user it was issued for.
    async fn verify(&self, token: &IdToken) -> Result<VerifiedUser, TokenVerificationError>;
}
