//! Error types for sessiongate

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionGateError {
    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Signature error: {0}")]
    Signature(String),

    #[error("Token expired at {expired_at}")]
    Expired { expired_at: i64 },

    #[error("Claim constraint failed: {0}")]
    ClaimConstraint(String),

    #[error("JWT is valid but did not contain a payload.")]
    EmptyPayload,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid name: {0}")]
    InvalidName(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SessionGateError {
    /// True for every failure a token can produce while being signed or verified.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            SessionGateError::Signing(_)
                | SessionGateError::InvalidToken(_)
                | SessionGateError::Signature(_)
                | SessionGateError::Expired { .. }
                | SessionGateError::ClaimConstraint(_)
                | SessionGateError::EmptyPayload
        )
    }

    /// Short stable label, used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            SessionGateError::Signing(_) => "signing",
            SessionGateError::InvalidToken(_) => "invalid_token",
            SessionGateError::Signature(_) => "signature",
            SessionGateError::Expired { .. } => "expired",
            SessionGateError::ClaimConstraint(_) => "claim_constraint",
            SessionGateError::EmptyPayload => "empty_payload",
            SessionGateError::Storage(_) => "storage",
            SessionGateError::InvalidName(_) => "invalid_name",
            SessionGateError::Serialization(_) => "serialization",
            SessionGateError::Io(_) => "io",
            SessionGateError::Internal(_) => "internal",
        }
    }
}
