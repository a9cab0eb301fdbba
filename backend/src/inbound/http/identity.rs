//! Identity resolution and access filtering middleware.
//!
//! [`IdentityResolver`] runs once per request. It reads the `authtoken`
//! header, verifies it through the [`TokenVerifier`] port, and inserts the
//! resulting [`Identity`] into the request extensions. Handlers read it back
//! with the [`RequestIdentity`] extractor.
//!
//! [`AccessFilter`] wraps individual resources and rejects requests whose
//! identity carries no subject id.

use std::future::{Ready, ready};
use std::rc::Rc;
use std::sync::Arc;
use std::task::{Context, Poll};

use actix_web::body::EitherBody;
use actix_web::dev::{Payload, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{FromRequest, HttpMessage, HttpRequest, ResponseError};
use futures_util::future::LocalBoxFuture;
use tracing::warn;

use crate::domain::ports::{TokenVerificationError, TokenVerifier};
use crate::domain::{AccessMode, Error, IdToken, Identity};

/// Request header carrying the client identity token.
pub const AUTH_TOKEN_HEADER: &str = "authtoken";

/// Middleware resolving the `authtoken` header to an [`Identity`].
///
/// # Examples
/// ```
/// use actix_web::App;
/// use blog_backend::inbound::http::identity::IdentityResolver;
///
/// let app = App::new().wrap(IdentityResolver::disabled());
/// ```
#[derive(Clone)]
pub struct IdentityResolver {
    verifier: Option<Arc<dyn TokenVerifier>>,
}

impl IdentityResolver {
    /// Resolve tokens through `verifier`.
    pub fn new(verifier: Arc<dyn TokenVerifier>) -> Self {
        Self {
            verifier: Some(verifier),
        }
    }

    /// Treat every request as anonymous without inspecting headers.
    pub fn disabled() -> Self {
        Self { verifier: None }
    }
}

impl<S, B> Transform<S, ServiceRequest> for IdentityResolver
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = actix_web::Error;
    type InitError = ();
    type Transform = IdentityResolverMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(IdentityResolverMiddleware {
            service: Rc::new(service),
            verifier: self.verifier.clone(),
        }))
    }
}

/// Service wrapper produced by [`IdentityResolver`].
pub struct IdentityResolverMiddleware<S> {
    service: Rc<S>,
    verifier: Option<Arc<dyn TokenVerifier>>,
}

fn read_token(req: &ServiceRequest) -> Result<Option<IdToken>, Error> {
    let Some(raw) = req.headers().get(AUTH_TOKEN_HEADER) else {
        return Ok(None);
    };
    let raw = raw
        .to_str()
        .map_err(|_| Error::invalid_request("authtoken header must be visible ASCII"))?;
    // Blank headers are sent by clients that are not signed in.
    Ok(IdToken::new(raw).ok())
}

fn map_verification_error(token: &IdToken, error: TokenVerificationError) -> Error {
    warn!(token = %token.fingerprint(), %error, "identity token not accepted");
    match error {
        TokenVerificationError::Rejected { .. } => {
            Error::invalid_request("invalid authentication token")
        }
        TokenVerificationError::Unavailable { .. } => {
            Error::service_unavailable("token verification is unavailable")
        }
    }
}

impl<S, B> Service<ServiceRequest> for IdentityResolverMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let verifier = self.verifier.clone();
        Box::pin(async move {
            let identity = match verifier {
                None => Identity::Anonymous,
                Some(verifier) => match read_token(&req) {
                    Err(error) => {
                        return Ok(req
                            .into_response(error.error_response())
                            .map_into_right_body());
                    }
                    Ok(None) => Identity::Anonymous,
                    Ok(Some(token)) => match verifier.verify(&token).await {
                        Ok(user) => Identity::from(user),
                        Err(error) => {
                            let error = map_verification_error(&token, error);
                            return Ok(req
                                .into_response(error.error_response())
                                .map_into_right_body());
                        }
                    },
                },
            };
            req.extensions_mut().insert(identity);
            let res = service.call(req).await?;
            Ok(res.map_into_left_body())
        })
    }
}

/// Extractor yielding the identity inserted by [`IdentityResolver`].
///
/// Requests that bypassed the resolver are treated as anonymous.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestIdentity(pub Identity);

impl RequestIdentity {
    pub fn into_inner(self) -> Identity {
        self.0
    }
}

impl FromRequest for RequestIdentity {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let identity = req.extensions().get::<Identity>().cloned();
        ready(Ok(Self(identity.unwrap_or_default())))
    }
}

/// Middleware gating a resource behind an authenticated identity.
///
/// In [`AccessMode::Anonymous`] every request passes.
#[derive(Debug, Clone, Copy)]
pub struct AccessFilter {
    mode: AccessMode,
}

impl AccessFilter {
    pub fn new(mode: AccessMode) -> Self {
        Self { mode }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AccessFilter
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = actix_web::Error;
    type InitError = ();
    type Transform = AccessFilterMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AccessFilterMiddleware {
            service,
            mode: self.mode,
        }))
    }
}

/// Service wrapper produced by [`AccessFilter`].
pub struct AccessFilterMiddleware<S> {
    service: S,
    mode: AccessMode,
}

impl<S, B> Service<ServiceRequest> for AccessFilterMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let permitted = match self.mode {
            AccessMode::Anonymous => true,
            AccessMode::Authenticated => req
                .extensions()
                .get::<Identity>()
                .and_then(Identity::uid)
                .is_some(),
        };
        if !permitted {
            let error = Error::unauthorized("authentication required");
            return Box::pin(async move {
                Ok(req
                    .into_response(error.error_response())
                    .map_into_right_body())
            });
        }

        let fut = self.service.call(req);
        Box::pin(async move { Ok(fut.await?.map_into_left_body()) })
    }
}
