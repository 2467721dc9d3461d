//! Verified token contents

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Claims regenerated on every refresh; never carried over from an old token.
pub const RESERVED_CLAIMS: [&str; 4] = ["iat", "exp", "nbf", "jti"];

/// Application payload: an open JSON object
pub type Payload = Map<String, Value>;

/// Payload of a token whose signature and time claims have been checked.
///
/// Holds the application fields next to the registered claims exactly as
/// they appear on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DecodedClaims(Payload);

impl DecodedClaims {
    pub fn new(claims: Payload) -> Self {
        DecodedClaims(claims)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Issued-at, seconds since the epoch
    pub fn issued_at(&self) -> Option<i64> {
        self.numeric("iat")
    }

    /// Expiry, seconds since the epoch
    pub fn expires_at(&self) -> Option<i64> {
        self.numeric("exp")
    }

    pub fn not_before(&self) -> Option<i64> {
        self.numeric("nbf")
    }

    pub fn jwt_id(&self) -> Option<&str> {
        self.0.get("jti").and_then(Value::as_str)
    }

    pub fn issuer(&self) -> Option<&str> {
        self.0.get("iss").and_then(Value::as_str)
    }

    pub fn subject(&self) -> Option<&str> {
        self.0.get("sub").and_then(Value::as_str)
    }

    /// Audiences, whether the token carries a single string or an array
    pub fn audiences(&self) -> Vec<&str> {
        match self.0.get("aud") {
            Some(Value::String(aud)) => vec![aud.as_str()],
            Some(Value::Array(auds)) => auds.iter().filter_map(Value::as_str).collect(),
            _ => Vec::new(),
        }
    }

    /// The payload minus [`RESERVED_CLAIMS`]
    pub fn into_refreshable(mut self) -> Payload {
        for claim in RESERVED_CLAIMS {
            self.0.remove(claim);
        }
        self.0
    }

    fn numeric(&self, name: &str) -> Option<i64> {
        self.0.get(name).and_then(as_timestamp)
    }
}

impl From<DecodedClaims> for Value {
    fn from(claims: DecodedClaims) -> Value {
        Value::Object(claims.0)
    }
}

/// NumericDate as whole seconds; fractional values are floored
pub(crate) fn as_timestamp(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().map(|f| f.floor() as i64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn claims(value: Value) -> DecodedClaims {
        match value {
            Value::Object(map) => DecodedClaims::new(map),
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn test_refreshable_strips_exactly_the_reserved_claims() {
        let decoded = claims(json!({
            "userId": "user123",
            "role": "admin",
            "iat": 1624546789,
            "exp": 1624550389,
            "nbf": 1624546789,
            "jti": "original-token-id",
            "aud": "app-users",
            "iss": "test-issuer",
        }));

        let payload = decoded.into_refreshable();

        assert_eq!(
            Value::Object(payload),
            json!({"userId": "user123", "role": "admin", "aud": "app-users", "iss": "test-issuer"})
        );
    }

    #[test]
    fn test_accessors() {
        let decoded = claims(json!({
            "iat": 100,
            "exp": 200.7,
            "jti": "id-1",
            "aud": ["a", "b", 3],
            "sub": "user",
        }));

        assert_eq!(decoded.issued_at(), Some(100));
        assert_eq!(decoded.expires_at(), Some(200));
        assert_eq!(decoded.not_before(), None);
        assert_eq!(decoded.jwt_id(), Some("id-1"));
        assert_eq!(decoded.audiences(), vec!["a", "b"]);
        assert_eq!(decoded.subject(), Some("user"));
        assert_eq!(decoded.issuer(), None);
        assert!(!decoded.is_empty());
        assert!(DecodedClaims::default().is_empty());
    }
}
