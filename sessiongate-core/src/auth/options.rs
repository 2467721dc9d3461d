//! Signing, verification and refresh options

use crate::{Result, SessionGateError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported JWS algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Algorithm {
    HS256,
    HS384,
    HS512,
    EdDSA,
}

impl Algorithm {
    /// Name carried in the `alg` header
    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::HS256 => "HS256",
            Algorithm::HS384 => "HS384",
            Algorithm::HS512 => "HS512",
            Algorithm::EdDSA => "EdDSA",
        }
    }

    pub fn is_hmac(&self) -> bool {
        !matches!(self, Algorithm::EdDSA)
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = SessionGateError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "HS256" => Ok(Algorithm::HS256),
            "HS384" => Ok(Algorithm::HS384),
            "HS512" => Ok(Algorithm::HS512),
            "EdDSA" => Ok(Algorithm::EdDSA),
            other => Err(SessionGateError::InvalidToken(format!("unsupported algorithm '{}'", other))),
        }
    }
}

/// Signed duration in milliseconds.
///
/// Parsed from integer seconds or from the `ms` notation: `"24h"`, `"2 days"`,
/// `"-1s"`, `"1.5h"`. A bare numeric string counts milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TimeSpanRepr", into = "i64")]
pub struct TimeSpan {
    millis: i64,
}

impl TimeSpan {
    pub const fn from_millis(millis: i64) -> Self {
        TimeSpan { millis }
    }

    pub const fn from_secs(secs: i64) -> Self {
        TimeSpan { millis: secs * 1000 }
    }

    pub const fn minutes(minutes: i64) -> Self {
        Self::from_secs(minutes * 60)
    }

    pub const fn hours(hours: i64) -> Self {
        Self::from_secs(hours * 3600)
    }

    pub fn as_millis(&self) -> i64 {
        self.millis
    }

    /// `floor(timestamp + millis / 1000)`
    pub fn after(&self, timestamp: i64) -> i64 {
        (timestamp as f64 + self.millis as f64 / 1000.0).floor() as i64
    }
}

impl FromStr for TimeSpan {
    type Err = SessionGateError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || SessionGateError::Signing(format!("invalid time span '{}'", s));
        let text = s.trim();
        if text.is_empty() || text.len() > 100 {
            return Err(invalid());
        }

        let number_end = text
            .char_indices()
            .find(|&(i, c)| !(c.is_ascii_digit() || c == '.' || (c == '-' && i == 0)))
            .map(|(i, _)| i)
            .unwrap_or(text.len());
        let (number, unit) = text.split_at(number_end);
        let value: f64 = number.parse().map_err(|_| invalid())?;

        let scale = match unit.trim_start().to_ascii_lowercase().as_str() {
            "" | "ms" | "msec" | "msecs" | "millisecond" | "milliseconds" => 1.0,
            "s" | "sec" | "secs" | "second" | "seconds" => 1_000.0,
            "m" | "min" | "mins" | "minute" | "minutes" => 60_000.0,
            "h" | "hr" | "hrs" | "hour" | "hours" => 3_600_000.0,
            "d" | "day" | "days" => 86_400_000.0,
            "w" | "week" | "weeks" => 604_800_000.0,
            "y" | "yr" | "yrs" | "year" | "years" => 31_557_600_000.0,
            _ => return Err(invalid()),
        };

        Ok(TimeSpan::from_millis((value * scale).round() as i64))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TimeSpanRepr {
    Seconds(i64),
    Text(String),
}

impl TryFrom<TimeSpanRepr> for TimeSpan {
    type Error = SessionGateError;

    fn try_from(repr: TimeSpanRepr) -> Result<Self> {
        match repr {
            TimeSpanRepr::Seconds(secs) => secs
                .checked_mul(1000)
                .map(TimeSpan::from_millis)
                .ok_or_else(|| SessionGateError::Signing(format!("invalid time span {}", secs))),
            TimeSpanRepr::Text(text) => text.parse(),
        }
    }
}

impl From<TimeSpan> for i64 {
    fn from(span: TimeSpan) -> i64 {
        span.millis / 1000
    }
}

/// Options applied when a token is signed.
///
/// Every field is optional; see [`SignOptions::overridden_by`] for how two
/// option sets combine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SignOptions {
    pub algorithm: Option<Algorithm>,
    pub expires_in: Option<TimeSpan>,
    pub not_before: Option<TimeSpan>,
    pub audience: Option<String>,
    pub issuer: Option<String>,
    pub subject: Option<String>,
    pub jwtid: Option<String>,
    pub keyid: Option<String>,
    pub no_timestamp: Option<bool>,
}

impl SignOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = Some(algorithm);
        self
    }

    pub fn expires_in(mut self, span: TimeSpan) -> Self {
        self.expires_in = Some(span);
        self
    }

    pub fn not_before(mut self, span: TimeSpan) -> Self {
        self.not_before = Some(span);
        self
    }

    pub fn audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    pub fn issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn jwtid(mut self, jwtid: impl Into<String>) -> Self {
        self.jwtid = Some(jwtid.into());
        self
    }

    pub fn keyid(mut self, keyid: impl Into<String>) -> Self {
        self.keyid = Some(keyid.into());
        self
    }

    pub fn no_timestamp(mut self, no_timestamp: bool) -> Self {
        self.no_timestamp = Some(no_timestamp);
        self
    }

    /// Field-by-field overlay: every field set in `top` replaces the one in `self`.
    pub fn overridden_by(&self, top: &SignOptions) -> SignOptions {
        SignOptions {
            algorithm: top.algorithm.or(self.algorithm),
            expires_in: top.expires_in.or(self.expires_in),
            not_before: top.not_before.or(self.not_before),
            audience: top.audience.clone().or_else(|| self.audience.clone()),
            issuer: top.issuer.clone().or_else(|| self.issuer.clone()),
            subject: top.subject.clone().or_else(|| self.subject.clone()),
            jwtid: top.jwtid.clone().or_else(|| self.jwtid.clone()),
            keyid: top.keyid.clone().or_else(|| self.keyid.clone()),
            no_timestamp: top.no_timestamp.or(self.no_timestamp),
        }
    }
}

/// Constraints checked when a token is decoded
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VerifyOptions {
    /// Accepted audiences; the token must carry at least one of them
    pub audience: Vec<String>,
    /// Accepted issuers
    pub issuer: Vec<String>,
    pub subject: Option<String>,
    pub jwtid: Option<String>,
    /// Seconds of slack applied to `exp`, `nbf` and `maxAge`
    pub clock_tolerance: i64,
    pub max_age: Option<TimeSpan>,
    /// Overrides the wall clock, in seconds since the epoch
    pub clock_timestamp: Option<i64>,
    pub ignore_expiration: bool,
    pub ignore_not_before: bool,
}

impl VerifyOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn audience(mut self, audience: impl Into<String>) -> Self {
        self.audience.push(audience.into());
        self
    }

    pub fn issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer.push(issuer.into());
        self
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn jwtid(mut self, jwtid: impl Into<String>) -> Self {
        self.jwtid = Some(jwtid.into());
        self
    }

    pub fn clock_tolerance(mut self, seconds: i64) -> Self {
        self.clock_tolerance = seconds;
        self
    }

    pub fn max_age(mut self, span: TimeSpan) -> Self {
        self.max_age = Some(span);
        self
    }

    pub fn clock_timestamp(mut self, timestamp: i64) -> Self {
        self.clock_timestamp = Some(timestamp);
        self
    }

    pub fn ignore_expiration(mut self, ignore: bool) -> Self {
        self.ignore_expiration = ignore;
        self
    }

    pub fn ignore_not_before(mut self, ignore: bool) -> Self {
        self.ignore_not_before = ignore;
        self
    }
}

/// Options for [`TokenGenerator::refresh`](super::TokenGenerator::refresh)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RefreshOptions {
    /// Constraints the old token must satisfy
    pub verify: VerifyOptions,
    /// `jti` of the new token; `None` issues it without one
    pub jwtid: Option<String>,
}

impl RefreshOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn verify(mut self, verify: VerifyOptions) -> Self {
        self.verify = verify;
        self
    }

    pub fn jwtid(mut self, jwtid: impl Into<String>) -> Self {
        self.jwtid = Some(jwtid.into());
        self
    }
}
