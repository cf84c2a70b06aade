//! Unverified JWT header and claim extraction
//!
//! Splits a bearer token into its three segments and decodes the JSON header
//! and payload. The signature is never checked: the result is only as
//! trustworthy as the channel the token came from. Use it on tokens received
//! directly from the token endpoint, never on user-supplied tokens that gate
//! access.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{AuthError, AuthResult};

const LENIENT: GeneralPurposeConfig = GeneralPurposeConfig::new()
    .with_decode_padding_mode(DecodePaddingMode::Indifferent)
    .with_decode_allow_trailing_bits(true);

const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT);
const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT);

/// JOSE header of a token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenHeader {
    pub alg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
}

/// Claims read from the payload segment.
///
/// Claims not named here are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// User key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,

    /// Client key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cid: Option<String>,

    /// Expiry, seconds since the Unix epoch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub c_hash: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s_hash: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub at_hash: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TokenClaims {
    /// The user key (`uid`).
    pub fn user_key(&self) -> Option<&str> {
        self.uid.as_deref()
    }

    /// The client key (`cid`).
    pub fn client_key(&self) -> Option<&str> {
        self.cid.as_deref()
    }

    /// Expiry as a UTC timestamp.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|exp| DateTime::from_timestamp(exp, 0))
    }

    /// Seconds from `now` until expiry; negative once expired.
    ///
    /// Saturates for `exp` values near the `i64` limits.
    pub fn seconds_remaining(&self, now: DateTime<Utc>) -> Option<i64> {
        self.exp.map(|exp| exp.saturating_sub(now.timestamp()))
    }
}

/// Header and claims of a token.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedToken {
    pub header: TokenHeader,
    pub claims: TokenClaims,
}

/// Extracts the claims from the payload segment of `access_token`.
///
/// # Errors
///
/// [`AuthError::MalformedToken`] unless the token has exactly three
/// dot-separated segments and the middle one is base64-encoded JSON.
///
/// # Examples
///
/// ```
/// use tokenflow::auth::claims::extract_claims;
///
/// assert!(extract_claims("abc.def").is_err());
/// ```
pub fn extract_claims(access_token: &str) -> AuthResult<TokenClaims> {
    let [_, payload, _] = split_segments(access_token)?;
    decode_json(payload, "payload")
}

/// Decodes both the header and the payload of `token`.
///
/// # Errors
///
/// [`AuthError::MalformedToken`] when either segment does not decode.
pub fn decode_token(token: &str) -> AuthResult<DecodedToken> {
    let [header, payload, _] = split_segments(token)?;
    Ok(DecodedToken {
        header: decode_json(header, "header")?,
        claims: decode_json(payload, "payload")?,
    })
}

/// Splits a token into header, payload and signature segments.
pub fn split_segments(token: &str) -> AuthResult<[&str; 3]> {
    let segments: Vec<&str> = token.trim().split('.').collect();
    match segments.as_slice() {
        [header, payload, signature] => Ok([*header, *payload, *signature]),
        other => Err(AuthError::MalformedToken(format!(
            "expected 3 segments, found {}",
            other.len()
        ))),
    }
}

/// Decodes one segment, accepting either base64 alphabet with or without
/// padding.
pub fn decode_segment(segment: &str) -> AuthResult<Vec<u8>> {
    let engine = if segment.contains(['+', '/']) {
        &STANDARD_LENIENT
    } else {
        &URL_SAFE_LENIENT
    };
    engine
        .decode(segment)
        .map_err(|e| AuthError::MalformedToken(format!("invalid base64: {e}")))
}

fn decode_json<T: DeserializeOwned>(segment: &str, what: &str) -> AuthResult<T> {
    let bytes = decode_segment(segment)?;
    serde_json::from_slice(&bytes)
        .map_err(|e| AuthError::MalformedToken(format!("invalid {what}: {e}")))
}
