//! Property-based tests for the token lifecycle

use proptest::prelude::*;
use serde_json::{json, Map, Value};
use sessiongate_core::auth::*;
use sessiongate_core::test_utils::*;
use sessiongate_core::SessionGateError;

fn custom_claim() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        "[a-zA-Z0-9 _-]{0,24}".prop_map(Value::from),
        prop::collection::vec("[a-z]{1,8}", 0..4).prop_map(|v| json!(v)),
    ]
}

fn custom_payload() -> impl Strategy<Value = Map<String, Value>> {
    prop::collection::btree_map("[a-z][a-zA-Z0-9]{0,11}", custom_claim(), 1..8).prop_map(|claims| {
        claims
            .into_iter()
            .filter(|(name, _)| !["iat", "exp", "nbf", "jti", "aud", "iss", "sub"].contains(&name.as_str()))
            .collect()
    })
}

proptest! {
    #[test]
    fn props_sign_then_verify_returns_payload(payload in custom_payload()) {
        prop_assume!(!payload.is_empty());
        let generator = hmac_generator();

        let token = generator.sign(&payload, &SignOptions::new()).unwrap();
        let claims = generator.verify(&token).unwrap();

        for (name, value) in &payload {
            prop_assert_eq!(claims.get(name), Some(value));
        }
        prop_assert!(claims.expires_at().unwrap() > claims.issued_at().unwrap());
    }

    #[test]
    fn props_refresh_preserves_custom_claims(payload in custom_payload(), jti in "[a-z0-9]{1,16}") {
        prop_assume!(!payload.is_empty());
        let generator = hmac_generator();

        let token = generator.sign(&payload, &SignOptions::new().jwtid("first")).unwrap();
        let refreshed = generator.refresh(&token, &RefreshOptions::new().jwtid(jti.clone())).unwrap();
        let claims = generator.verify(&refreshed).unwrap();

        prop_assert_eq!(claims.jwt_id(), Some(jti.as_str()));
        prop_assert_eq!(claims.into_refreshable(), payload);
    }

    #[test]
    fn props_any_flipped_signature_is_rejected(payload in custom_payload()) {
        prop_assume!(!payload.is_empty());
        let generator = hmac_generator();
        let token = generator.sign(&payload, &SignOptions::new()).unwrap();

        let result = generator.verify(&tamper_signature(&token));
        prop_assert!(matches!(result, Err(SessionGateError::Signature(_))));
    }

    #[test]
    fn props_time_span_seconds_round_trip(secs in -1_000_000i64..1_000_000) {
        let span: TimeSpan = format!("{}s", secs).parse().unwrap();
        prop_assert_eq!(span, TimeSpan::from_secs(secs));
        prop_assert_eq!(span.after(0), secs);
    }
}
