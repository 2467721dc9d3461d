//! Reusable token generator
//!
//! A [`TokenGenerator`] owns one signing key, one verification key and a set
//! of default signing options. Both keys are the same secret for HMAC
//! generators and differ for Ed25519 ones.

use super::claims::{DecodedClaims, Payload};
use super::codec;
use super::keys::{KeyPair, SecretKey, SigningKey, VerificationKey};
use super::options::{RefreshOptions, SignOptions, VerifyOptions};
use crate::{Result, SessionGateError};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

/// Signs, verifies and refreshes tokens with a fixed key pair and defaults.
#[derive(Debug, Clone)]
pub struct TokenGenerator {
    signing_key: Option<SigningKey>,
    verification_key: Option<VerificationKey>,
    options: SignOptions,
}

impl TokenGenerator {
    /// Either key may be absent; the matching operation then fails.
    pub fn new(
        signing_key: Option<SigningKey>,
        verification_key: Option<VerificationKey>,
        options: SignOptions,
    ) -> Self {
        TokenGenerator {
            signing_key,
            verification_key,
            options,
        }
    }

    /// Symmetric generator: the same secret signs and verifies
    pub fn hmac(secret: Option<&[u8]>, options: SignOptions) -> Self {
        let secret = secret.map(SecretKey::new);
        Self::new(
            secret.clone().map(SigningKey::from),
            secret.map(VerificationKey::from),
            options,
        )
    }

    pub fn ed25519(key_pair: KeyPair, options: SignOptions) -> Self {
        let public_key = key_pair.public_key();
        Self::new(
            Some(SigningKey::from(key_pair)),
            Some(VerificationKey::from(public_key)),
            options,
        )
    }

    /// Default signing options, applied on every `sign` and `refresh`
    pub fn options(&self) -> &SignOptions {
        &self.options
    }

    /// Sign `payload`, which must serialize to a JSON object.
    ///
    /// The generator defaults take precedence over `options` wherever both
    /// set a field.
    pub fn sign<P: Serialize + ?Sized>(&self, payload: &P, options: &SignOptions) -> Result<String> {
        let payload = match serde_json::to_value(payload)? {
            Value::Object(map) => map,
            other => {
                return Err(SessionGateError::Signing(format!(
                    "payload must be a JSON object, got {}",
                    json_kind(&other)
                )))
            }
        };

        let merged = options.overridden_by(&self.options);
        self.sign_payload(payload, &merged)
    }

    /// Check signature and expiry, returning the non-empty payload.
    pub fn verify(&self, token: &str) -> Result<DecodedClaims> {
        self.verify_with(token, &VerifyOptions::default())
    }

    /// Verify with explicit constraints
    pub fn verify_with(&self, token: &str, options: &VerifyOptions) -> Result<DecodedClaims> {
        let claims = codec::decode(token, self.verification_key.as_ref(), options)?;
        if claims.is_empty() {
            return Err(SessionGateError::EmptyPayload);
        }
        Ok(claims)
    }

    /// Re-sign the payload of a valid token under fresh time claims.
    ///
    /// `iat`, `exp`, `nbf` and `jti` are dropped from the old payload. The new
    /// token carries `options.jwtid` as its `jti`, or none at all. The old
    /// token is left untouched and stays valid until its own expiry.
    pub fn refresh(&self, token: &str, options: &RefreshOptions) -> Result<String> {
        let claims = self.verify_with(token, &options.verify)?;
        let previous_id = claims.jwt_id().map(str::to_owned);
        let payload = claims.into_refreshable();

        let merged = SignOptions {
            jwtid: options.jwtid.clone(),
            ..self.options.clone()
        };

        debug!(
            previous_jti = previous_id.as_deref().unwrap_or("-"),
            jti = merged.jwtid.as_deref().unwrap_or("-"),
            "Refreshing token"
        );

        self.sign_payload(payload, &merged)
    }

    fn sign_payload(&self, payload: Payload, options: &SignOptions) -> Result<String> {
        codec::encode(payload, self.signing_key.as_ref(), options)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
