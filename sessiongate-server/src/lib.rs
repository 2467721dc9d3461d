//! HTTP front end for sessiongate: routing, the cookie auth gate and startup
//! configuration.

pub mod auth_gate;
pub mod config;
pub mod handlers;
pub mod observability;
pub mod server;

pub use auth_gate::{AuthGate, SessionToken, DEFAULT_COOKIE_NAME};
pub use server::{AppState, SessionGateServer};

/// Body type of every response
pub type BoxBody = http_body_util::Full<bytes::Bytes>;
