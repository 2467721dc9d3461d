//! Compact signed token codec
//!
//! HMAC tokens are assembled and tagged here with `hmac`/`sha2`; EdDSA tokens
//! are produced with jwt-simple. Decoding parses the three segments itself so
//! every failure maps onto a distinct [`SessionGateError`] kind: structure,
//! signature, expiry and claim constraints are checked in that order.

use super::claims::{as_timestamp, DecodedClaims, Payload};
use super::keys::{SigningKey, VerificationKey};
use super::options::{Algorithm, SignOptions, VerifyOptions};
use crate::{Result, SessionGateError};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use jwt_simple::prelude::{Claims, EdDSAKeyPairLike, Ed25519KeyPair};
use serde_json::{Map, Value};
use sha2::{Sha256, Sha384, Sha512};
use std::time::{SystemTime, UNIX_EPOCH};
use subtle::ConstantTimeEq;

/// Seconds since the epoch
pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Serialize `payload` plus the claims derived from `options` and sign it.
pub fn encode(payload: Payload, key: Option<&SigningKey>, options: &SignOptions) -> Result<String> {
    let missing_key = || SessionGateError::Signing("secretOrPrivateKey must have a value".to_string());
    let key = key.ok_or_else(missing_key)?;
    let algorithm = signing_algorithm(key, options.algorithm)?;
    let claims = build_claims(payload, options, unix_now())?;
    let keyid = options.keyid.as_deref();

    match (key, algorithm) {
        (SigningKey::Secret(secret), algorithm) if algorithm.is_hmac() => {
            if secret.as_bytes().is_empty() {
                return Err(missing_key());
            }
            sign_hmac(secret.as_bytes(), algorithm, keyid, &claims)
        }
        (SigningKey::Ed25519(pair), Algorithm::EdDSA) => {
            // Every claim already lives in the payload map; jwt-simple's own
            // time fields stay empty so nothing is emitted twice.
            let mut jwt_claims = Claims::with_custom_claims(claims, jwt_simple::prelude::Duration::from_secs(0));
            jwt_claims.issued_at = None;
            jwt_claims.expires_at = None;
            jwt_claims.invalid_before = None;

            let mut jwt_key = Ed25519KeyPair::from_bytes(&pair.keypair_bytes()).map_err(|e| {
                SessionGateError::Signing(format!("key conversion failed: {}", e))
            })?;
            if let Some(kid) = keyid {
                jwt_key = jwt_key.with_key_id(kid);
            }
            jwt_key
                .sign(jwt_claims)
                .map_err(|e| SessionGateError::Signing(format!("signing failed: {}", e)))
        }
        (_, algorithm) => Err(unsupported_for_key(algorithm)),
    }
}

fn sign_hmac(secret: &[u8], algorithm: Algorithm, keyid: Option<&str>, claims: &Payload) -> Result<String> {
    let mut header = Map::new();
    header.insert("alg".to_string(), Value::from(algorithm.as_str()));
    header.insert("typ".to_string(), Value::from("JWT"));
    if let Some(kid) = keyid {
        header.insert("kid".to_string(), Value::from(kid));
    }

    let signing_input = format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header)?),
        URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims)?)
    );
    let tag = hmac_tag(secret, algorithm, &signing_input)
        .ok_or_else(|| SessionGateError::Signing(format!("signing failed: no MAC for {}", algorithm)))?;
    Ok(format!("{}.{}", signing_input, URL_SAFE_NO_PAD.encode(tag)))
}

/// Check structure, signature, time claims and `options`, returning the payload.
pub fn decode(token: &str, key: Option<&VerificationKey>, options: &VerifyOptions) -> Result<DecodedClaims> {
    if token.is_empty() {
        return Err(SessionGateError::InvalidToken("jwt must be provided".to_string()));
    }

    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return Err(SessionGateError::InvalidToken("jwt malformed".to_string()));
    }
    let (header_segment, payload_segment, signature_segment) = (segments[0], segments[1], segments[2]);

    let header = match decode_json(header_segment)? {
        Value::Object(header) => header,
        _ => return Err(SessionGateError::InvalidToken("invalid token".to_string())),
    };
    let payload = decode_json(payload_segment)?;

    if signature_segment.is_empty() {
        return Err(SessionGateError::Signature("jwt signature is required".to_string()));
    }

    let key = key.ok_or_else(|| {
        SessionGateError::Signature("secret or public key must be provided".to_string())
    })?;

    let algorithm: Algorithm = header
        .get("alg")
        .and_then(Value::as_str)
        .and_then(|alg| alg.parse().ok())
        .ok_or_else(|| SessionGateError::InvalidToken("invalid algorithm".to_string()))?;
    if !accepts(key, algorithm) {
        return Err(SessionGateError::InvalidToken("invalid algorithm".to_string()));
    }

    let signing_input = &token[..header_segment.len() + 1 + payload_segment.len()];
    let signature = URL_SAFE_NO_PAD
        .decode(signature_segment)
        .map_err(|_| SessionGateError::Signature("invalid signature".to_string()))?;
    verify_signature(key, algorithm, signing_input, &signature)?;

    let claims = match payload {
        Value::Object(claims) => DecodedClaims::new(claims),
        _ => return Err(SessionGateError::InvalidToken("jwt payload must be a JSON object".to_string())),
    };

    check_claims(&claims, options)?;
    Ok(claims)
}

fn signing_algorithm(key: &SigningKey, requested: Option<Algorithm>) -> Result<Algorithm> {
    let algorithm = match (key, requested) {
        (_, Some(algorithm)) => algorithm,
        (SigningKey::Secret(_), None) => Algorithm::HS256,
        (SigningKey::Ed25519(_), None) => Algorithm::EdDSA,
    };
    let compatible = match key {
        SigningKey::Secret(_) => algorithm.is_hmac(),
        SigningKey::Ed25519(_) => !algorithm.is_hmac(),
    };
    if compatible {
        Ok(algorithm)
    } else {
        Err(unsupported_for_key(algorithm))
    }
}

fn unsupported_for_key(algorithm: Algorithm) -> SessionGateError {
    SessionGateError::Signing(format!("algorithm {} is not supported for this key", algorithm))
}

fn accepts(key: &VerificationKey, algorithm: Algorithm) -> bool {
    match key {
        VerificationKey::Secret(_) => algorithm.is_hmac(),
        VerificationKey::Ed25519(_) => algorithm == Algorithm::EdDSA,
    }
}

/// Merge `options` into the payload the way they end up on the wire.
fn build_claims(mut payload: Payload, options: &SignOptions, now: i64) -> Result<Payload> {
    for name in ["iat", "exp", "nbf"] {
        if payload.get(name).is_some_and(|value| !value.is_number()) {
            return Err(SessionGateError::Signing(format!(
                "\"{}\" should be a number of seconds",
                name
            )));
        }
    }

    if options.expires_in.is_some() && payload.contains_key("exp") {
        return Err(SessionGateError::Signing(
            "Bad \"options.expiresIn\" option the payload already has an \"exp\" property.".to_string(),
        ));
    }
    if options.not_before.is_some() && payload.contains_key("nbf") {
        return Err(SessionGateError::Signing(
            "Bad \"options.notBefore\" option the payload already has an \"nbf\" property.".to_string(),
        ));
    }

    let timestamp = payload.get("iat").and_then(as_timestamp).unwrap_or(now);

    if options.no_timestamp == Some(true) {
        payload.remove("iat");
    } else {
        payload.insert("iat".to_string(), timestamp.into());
    }

    if let Some(span) = options.not_before {
        payload.insert("nbf".to_string(), span.after(timestamp).into());
    }
    if let Some(span) = options.expires_in {
        payload.insert("exp".to_string(), span.after(timestamp).into());
    }

    let identity = [
        ("audience", "aud", &options.audience),
        ("issuer", "iss", &options.issuer),
        ("subject", "sub", &options.subject),
        ("jwtid", "jti", &options.jwtid),
    ];
    for (option, claim, value) in identity {
        let Some(value) = value else { continue };
        if payload.contains_key(claim) {
            return Err(SessionGateError::Signing(format!(
                "Bad \"options.{}\" option. The payload already has an \"{}\" property.",
                option, claim
            )));
        }
        payload.insert(claim.to_string(), Value::String(value.clone()));
    }

    Ok(payload)
}

fn decode_json(segment: &str) -> Result<Value> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| SessionGateError::InvalidToken("invalid token".to_string()))?;
    serde_json::from_slice(&bytes)
        .map_err(|_| SessionGateError::InvalidToken("invalid token".to_string()))
}

fn verify_signature(key: &VerificationKey, algorithm: Algorithm, signing_input: &str, signature: &[u8]) -> Result<()> {
    let expected = match (key, algorithm) {
        (VerificationKey::Secret(secret), algorithm) if algorithm.is_hmac() => {
            hmac_tag(secret.as_bytes(), algorithm, signing_input)
                .ok_or_else(|| SessionGateError::Signature("invalid secret".to_string()))?
        }
        (VerificationKey::Ed25519(public_key), Algorithm::EdDSA) => {
            return public_key.verify(signing_input.as_bytes(), signature);
        }
        _ => return Err(SessionGateError::InvalidToken("invalid algorithm".to_string())),
    };

    if bool::from(expected.as_slice().ct_eq(signature)) {
        Ok(())
    } else {
        Err(SessionGateError::Signature("invalid signature".to_string()))
    }
}

/// HMAC tag over `signing_input`; `None` for non-HMAC algorithms.
fn hmac_tag(secret: &[u8], algorithm: Algorithm, signing_input: &str) -> Option<Vec<u8>> {
    match algorithm {
        Algorithm::HS256 => mac::<Hmac<Sha256>>(secret, signing_input),
        Algorithm::HS384 => mac::<Hmac<Sha384>>(secret, signing_input),
        Algorithm::HS512 => mac::<Hmac<Sha512>>(secret, signing_input),
        Algorithm::EdDSA => None,
    }
}

fn mac<M: Mac + KeyInit>(secret: &[u8], signing_input: &str) -> Option<Vec<u8>> {
    let mut mac = <M as KeyInit>::new_from_slice(secret).ok()?;
    mac.update(signing_input.as_bytes());
    Some(mac.finalize().into_bytes().to_vec())
}

fn check_claims(claims: &DecodedClaims, options: &VerifyOptions) -> Result<()> {
    let now = options.clock_timestamp.unwrap_or_else(unix_now);
    let tolerance = options.clock_tolerance;

    if let Some(nbf) = claims.get("nbf") {
        if !options.ignore_not_before {
            let nbf = as_timestamp(nbf)
                .ok_or_else(|| SessionGateError::ClaimConstraint("invalid nbf value".to_string()))?;
            if nbf > now.saturating_add(tolerance) {
                return Err(SessionGateError::ClaimConstraint(format!("jwt not active until {}", nbf)));
            }
        }
    }

    if let Some(exp) = claims.get("exp") {
        if !options.ignore_expiration {
            let exp = as_timestamp(exp)
                .ok_or_else(|| SessionGateError::InvalidToken("invalid exp value".to_string()))?;
            if now >= exp.saturating_add(tolerance) {
                return Err(SessionGateError::Expired { expired_at: exp });
            }
        }
    }

    if !options.audience.is_empty() {
        let audiences = claims.audiences();
        if !options.audience.iter().any(|expected| audiences.contains(&expected.as_str())) {
            return Err(SessionGateError::ClaimConstraint(format!(
                "jwt audience invalid. expected: {}",
                options.audience.join(" or ")
            )));
        }
    }

    if !options.issuer.is_empty() {
        let issuer = claims.issuer();
        if !options.issuer.iter().any(|expected| Some(expected.as_str()) == issuer) {
            return Err(SessionGateError::ClaimConstraint(format!(
                "jwt issuer invalid. expected: {}",
                options.issuer.join(",")
            )));
        }
    }

    if let Some(expected) = &options.subject {
        if claims.subject() != Some(expected.as_str()) {
            return Err(SessionGateError::ClaimConstraint(format!("jwt subject invalid. expected: {}", expected)));
        }
    }

    if let Some(expected) = &options.jwtid {
        if claims.jwt_id() != Some(expected.as_str()) {
            return Err(SessionGateError::ClaimConstraint(format!("jwt jwtid invalid. expected: {}", expected)));
        }
    }

    if let Some(max_age) = options.max_age {
        let iat = claims
            .issued_at()
            .ok_or_else(|| SessionGateError::ClaimConstraint("iat required when maxAge is specified".to_string()))?;
        let max_age_timestamp = max_age.after(iat);
        if now >= max_age_timestamp.saturating_add(tolerance) {
            return Err(SessionGateError::Expired { expired_at: max_age_timestamp });
        }
    }

    Ok(())
}
