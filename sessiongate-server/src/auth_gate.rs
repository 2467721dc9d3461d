//! Cookie authentication in front of protected routes

use crate::BoxBody;
use bytes::Bytes;
use cookie::Cookie;
use http_body_util::Full;
use hyper::header::COOKIE;
use hyper::{Request, Response, StatusCode};
use sessiongate_core::auth::SessionTokens;
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

/// Default name of the cookie carrying the session token
pub const DEFAULT_COOKIE_NAME: &str = "authToken";

/// Token that authenticated the request, stored next to its
/// [`DecodedClaims`](sessiongate_core::auth::DecodedClaims) in the extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken(pub String);

/// Admits a request only when its auth cookie holds a valid session token.
#[derive(Debug, Clone)]
pub struct AuthGate {
    tokens: Arc<SessionTokens>,
    cookie_name: String,
}

impl AuthGate {
    pub fn new(tokens: Arc<SessionTokens>, cookie_name: impl Into<String>) -> Self {
        AuthGate {
            tokens,
            cookie_name: cookie_name.into(),
        }
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    pub fn tokens(&self) -> &SessionTokens {
        &self.tokens
    }

    /// Raw value of the auth cookie, if the request carries one
    pub fn token_from<B>(&self, req: &Request<B>) -> Option<String> {
        req.headers()
            .get_all(COOKIE)
            .iter()
            .filter_map(|header| header.to_str().ok())
            .flat_map(Cookie::split_parse)
            .filter_map(|cookie| cookie.ok())
            .find(|cookie| cookie.name() == self.cookie_name)
            .map(|cookie| cookie.value().to_string())
    }

    /// Verify the auth cookie and attach the decoded claims to `req`.
    ///
    /// On failure the returned response is a bare 401; the reason is only
    /// logged.
    pub fn check<B>(&self, req: &mut Request<B>) -> Result<(), Response<BoxBody>> {
        let Some(token) = self.token_from(req) else {
            debug!(cookie = %self.cookie_name, "Rejected request without auth cookie");
            return Err(unauthorized());
        };

        match self.tokens.payload_from_jwt(&token) {
            Ok(claims) => {
                req.extensions_mut().insert(claims);
                req.extensions_mut().insert(SessionToken(token));
                Ok(())
            }
            Err(e) => {
                debug!(kind = e.kind(), error = %e, "Rejected request with invalid session token");
                Err(unauthorized())
            }
        }
    }

    /// Run `next` once if the request passes [`check`](Self::check).
    pub async fn call<B, F, Fut>(&self, mut req: Request<B>, next: F) -> Response<BoxBody>
    where
        F: FnOnce(Request<B>) -> Fut,
        Fut: Future<Output = Response<BoxBody>>,
    {
        match self.check(&mut req) {
            Ok(()) => next(req).await,
            Err(response) => response,
        }
    }
}

fn unauthorized() -> Response<BoxBody> {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = StatusCode::UNAUTHORIZED;
    response
}
