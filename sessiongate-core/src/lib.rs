//! Core data models, errors and the token lifecycle for sessiongate

pub mod auth;
pub mod error;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use error::*;
pub use types::*;

/// Result type alias for sessiongate operations
pub type Result<T> = std::result::Result<T, SessionGateError>;
