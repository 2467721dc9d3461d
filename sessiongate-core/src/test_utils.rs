//! Test fixtures for sessiongate token tests

use crate::auth::{Payload, SignOptions, TimeSpan, TokenGenerator};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::Value;
use std::time::{Duration, Instant};

/// Secret shared by the HMAC fixtures
pub const TEST_SECRET: &str = "test-secret-key";

/// HMAC generator with the one-hour defaults most tests use
pub fn hmac_generator() -> TokenGenerator {
    TokenGenerator::hmac(
        Some(TEST_SECRET.as_bytes()),
        SignOptions::new().expires_in(TimeSpan::hours(1)),
    )
}

/// Unverified header and payload of `token`
pub fn segments(token: &str) -> (Value, Value) {
    let mut parts = token.split('.');
    let mut next = || {
        let segment = parts.next().unwrap_or_default();
        let bytes = URL_SAFE_NO_PAD.decode(segment).unwrap_or_default();
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    let header = next();
    let payload = next();
    (header, payload)
}

/// Flip one bit of the signature segment
pub fn tamper_signature(token: &str) -> String {
    let (signed, signature) = token.rsplit_once('.').unwrap_or((token, ""));
    let mut bytes = URL_SAFE_NO_PAD.decode(signature).unwrap_or_default();
    if let Some(first) = bytes.first_mut() {
        *first ^= 0x01;
    }
    format!("{}.{}", signed, URL_SAFE_NO_PAD.encode(bytes))
}

/// Replace the payload segment, keeping the original signature
pub fn tamper_payload(token: &str, payload: &Payload) -> String {
    let parts: Vec<&str> = token.split('.').collect();
    let body = serde_json::to_vec(payload).unwrap_or_default();
    format!(
        "{}.{}.{}",
        parts.first().copied().unwrap_or_default(),
        URL_SAFE_NO_PAD.encode(body),
        parts.get(2).copied().unwrap_or_default()
    )
}

/// Latency samples with percentile assertions
#[derive(Default)]
pub struct PerfAssert {
    samples: Vec<Duration>,
}

impl PerfAssert {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_operation<F, R>(&mut self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let start = Instant::now();
        let result = f();
        self.samples.push(start.elapsed());
        result
    }

    pub fn percentile(&mut self, p: f64) -> Duration {
        assert!((0.0..=100.0).contains(&p), "Percentile must be between 0 and 100");
        assert!(!self.samples.is_empty(), "No samples recorded");

        self.samples.sort();
        let index = ((p / 100.0) * (self.samples.len() - 1) as f64).round() as usize;
        self.samples[index]
    }

    pub fn assert_p95_under_ms(&mut self, max_ms: u64) {
        let p95 = self.percentile(95.0);
        assert!(
            p95 <= Duration::from_millis(max_ms),
            "p95 latency {} ms exceeds maximum {} ms",
            p95.as_millis(),
            max_ms
        );
    }
}
