//! Session token binding used by the authentication cookie

use super::claims::DecodedClaims;
use super::generator::TokenGenerator;
use super::keys::SecretKey;
use super::options::{SignOptions, TimeSpan};
use crate::Result;
use serde::Serialize;
use tracing::{info, warn};

/// Environment variable holding the session secret
pub const SESSION_KEY_VAR: &str = "JWT_KEY";

/// Lifetime of session tokens unless a caller asks otherwise
pub const SESSION_TOKEN_TTL: TimeSpan = TimeSpan::hours(24);

/// HMAC generator keyed by the session secret, with a 24h expiry default.
///
/// A missing secret is not rejected here: signing then fails with
/// [`SessionGateError::Signing`](crate::SessionGateError::Signing) and
/// verification with [`SessionGateError::Signature`](crate::SessionGateError::Signature).
#[derive(Debug, Clone)]
pub struct SessionTokens {
    generator: TokenGenerator,
    // Same secret, no defaults: `create_jwt` picks its own expiry.
    direct: TokenGenerator,
}

impl SessionTokens {
    /// An empty secret counts as absent.
    pub fn new(secret: Option<&str>) -> Self {
        let secret = secret.filter(|s| !s.is_empty());

        match secret {
            Some(secret) => info!(
                key_fingerprint = %SecretKey::new(secret).fingerprint(),
                "Session signing key loaded"
            ),
            None => warn!(
                "{} is not set; session tokens can be neither issued nor verified",
                SESSION_KEY_VAR
            ),
        }

        let secret = secret.map(str::as_bytes);
        SessionTokens {
            generator: TokenGenerator::hmac(secret, SignOptions::new().expires_in(SESSION_TOKEN_TTL)),
            direct: TokenGenerator::hmac(secret, SignOptions::default()),
        }
    }

    /// Read the secret from `JWT_KEY`
    pub fn from_env() -> Self {
        let secret = std::env::var(SESSION_KEY_VAR).ok();
        Self::new(secret.as_deref())
    }

    /// The cookie generator, for `sign`, `verify` and `refresh`
    pub fn generator(&self) -> &TokenGenerator {
        &self.generator
    }

    /// Sign `payload` expiring after `expires_in`, 24h when `None`.
    pub fn create_jwt<P: Serialize + ?Sized>(&self, payload: &P, expires_in: Option<TimeSpan>) -> Result<String> {
        let options = SignOptions::new().expires_in(expires_in.unwrap_or(SESSION_TOKEN_TTL));
        self.direct.sign(payload, &options)
    }

    /// Verify `token` and return its payload; an empty payload is an error.
    pub fn payload_from_jwt(&self, token: &str) -> Result<DecodedClaims> {
        self.direct.verify(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SessionGateError;
    use serde_json::json;

    #[test]
    fn test_create_jwt_honours_expiry_argument() {
        let tokens = SessionTokens::new(Some("session-secret"));

        let token = tokens.create_jwt(&json!({"iat": 1000, "username": "bob"}), Some(TimeSpan::hours(1)));
        let claims = tokens
            .generator()
            .verify_with(
                &token.unwrap(),
                &crate::auth::VerifyOptions::new().clock_timestamp(1500),
            )
            .unwrap();
        assert_eq!(claims.expires_at(), Some(1000 + 3600));

        let token = tokens.create_jwt(&json!({"username": "bob"}), None).unwrap();
        let claims = tokens.payload_from_jwt(&token).unwrap();
        assert_eq!(claims.expires_at().unwrap() - claims.issued_at().unwrap(), 86_400);
        assert_eq!(claims.get("username"), Some(&json!("bob")));
    }

    #[test]
    fn test_generator_uses_day_long_default() {
        let tokens = SessionTokens::new(Some("session-secret"));
        let token = tokens
            .generator()
            .sign(&json!({"userId": "1"}), &SignOptions::new().expires_in(TimeSpan::minutes(5)))
            .unwrap();

        let claims = tokens.payload_from_jwt(&token).unwrap();
        assert_eq!(claims.expires_at().unwrap() - claims.issued_at().unwrap(), 86_400);
    }

    #[test]
    fn test_empty_secret_counts_as_missing() {
        let tokens = SessionTokens::new(Some(""));

        assert!(matches!(
            tokens.create_jwt(&json!({"a": 1}), None),
            Err(SessionGateError::Signing(_))
        ));
        assert!(matches!(
            tokens.payload_from_jwt("a.b.c"),
            Err(SessionGateError::InvalidToken(_)) | Err(SessionGateError::Signature(_))
        ));
    }
}
