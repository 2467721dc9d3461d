//! HTTP request handlers for the sessiongate server

use crate::auth_gate::SessionToken;
use crate::server::AppState;
use crate::BoxBody;
use bytes::Bytes;
use cookie::{time::Duration as CookieDuration, Cookie, SameSite};
use http_body_util::Full;
use hyper::header::{HeaderValue, CONTENT_TYPE, SET_COOKIE};
use hyper::{Method, Request, Response, StatusCode};
use serde_json::{json, Value};
use sessiongate_core::auth::{DecodedClaims, RefreshOptions};
use std::convert::Infallible;
use std::future::ready;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Main request handler
pub async fn route<B>(req: Request<B>, state: Arc<AppState>) -> Result<Response<BoxBody>, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    debug!("Handling {} {}", method, path);

    let response = match (&method, path.as_str()) {
        (&Method::GET, "/health") => handle_health(),
        (&Method::GET, "/api/names") => handle_list_names(&state),
        (&Method::GET, "/api/me") => state.gate.call(req, |req| ready(handle_me(&req))).await,
        (&Method::POST, "/api/session/refresh") => {
            state.gate.call(req, |req| ready(handle_refresh(&req, &state))).await
        }
        _ => json_response(StatusCode::NOT_FOUND, json!({"error": "Not found"})),
    };

    info!("{} {} -> {}", method, path, response.status());
    Ok(response)
}

/// Health check handler
fn handle_health() -> Response<BoxBody> {
    json_response(
        StatusCode::OK,
        json!({
            "status": "healthy",
            "service": "sessiongate",
            "version": env!("CARGO_PKG_VERSION"),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        }),
    )
}

fn handle_list_names(state: &AppState) -> Response<BoxBody> {
    match state.names.list() {
        Ok(records) => match serde_json::to_value(records) {
            Ok(body) => json_response(StatusCode::OK, body),
            Err(e) => internal_error("serialize names", &e),
        },
        Err(e) => internal_error("list names", &e),
    }
}

/// Claims of the authenticated caller
fn handle_me<B>(req: &Request<B>) -> Response<BoxBody> {
    match req.extensions().get::<DecodedClaims>() {
        Some(claims) => json_response(StatusCode::OK, Value::from(claims.clone())),
        None => internal_error("read claims", &"auth gate did not attach claims"),
    }
}

/// Swap the caller's session token for a fresh one with a new `jti`
fn handle_refresh<B>(req: &Request<B>, state: &AppState) -> Response<BoxBody> {
    let Some(SessionToken(token)) = req.extensions().get::<SessionToken>() else {
        return internal_error("read session token", &"auth gate did not attach token");
    };

    let jwtid = ulid::Ulid::new().to_string();
    let refreshed = match state
        .gate
        .tokens()
        .generator()
        .refresh(token, &RefreshOptions::new().jwtid(jwtid.clone()))
    {
        Ok(refreshed) => refreshed,
        Err(e) => return internal_error("refresh session token", &e),
    };

    let cookie = Cookie::build((state.gate.cookie_name().to_string(), refreshed))
        .http_only(true)
        .path("/")
        .same_site(SameSite::Lax)
        .max_age(CookieDuration::hours(24))
        .build();

    let header = match HeaderValue::from_str(&cookie.to_string()) {
        Ok(header) => header,
        Err(e) => return internal_error("encode session cookie", &e),
    };

    debug!(jti = %jwtid, "Session token refreshed");

    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = StatusCode::NO_CONTENT;
    response.headers_mut().insert(SET_COOKIE, header);
    response
}

/// JSON response builder
pub fn json_response(status: StatusCode, body: Value) -> Response<BoxBody> {
    let mut response = Response::new(Full::new(Bytes::from(body.to_string())));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

fn internal_error(action: &str, e: &dyn std::fmt::Display) -> Response<BoxBody> {
    error!("Failed to {}: {}", action, e);
    json_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({"error": "Internal server error"}),
    )
}
