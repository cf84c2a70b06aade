//! The `state` envelope carried through the provider redirect
//!
//! The envelope is the JSON object `{"data": <payload>, "csrf": <token>}`,
//! base64-encoded with the standard alphabet. The encoder does not
//! percent-encode; [`crate::auth::authorize`] does that when it builds the URL.

use base64::Engine as _;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AuthError, AuthResult};

/// Decoded contents of a `state` parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateEnvelope {
    /// Caller payload, returned unchanged after the redirect
    #[serde(default)]
    pub data: Value,
    /// Copy of the session's CSRF token
    pub csrf: String,
}

/// Packs `csrf` and `payload` into a `state` value.
///
/// # Errors
///
/// [`AuthError::MalformedState`] when `payload` cannot be serialized to JSON
/// (for example a map with non-string keys).
///
/// # Examples
///
/// ```
/// use tokenflow::auth::state;
///
/// let raw = state::encode("abc", &"[Something to remember]").unwrap();
/// let envelope = state::decode(&raw).unwrap();
/// assert_eq!(envelope.csrf, "abc");
/// assert_eq!(envelope.data, "[Something to remember]");
/// ```
pub fn encode<T>(csrf: &str, payload: &T) -> AuthResult<String>
where
    T: Serialize + ?Sized,
{
    let data = serde_json::to_value(payload)
        .map_err(|e| AuthError::MalformedState(format!("payload is not serializable: {e}")))?;
    let envelope = StateEnvelope {
        data,
        csrf: csrf.to_string(),
    };
    let json = serde_json::to_vec(&envelope)
        .map_err(|e| AuthError::MalformedState(format!("envelope is not serializable: {e}")))?;
    Ok(base64::engine::general_purpose::STANDARD.encode(json))
}

/// Unpacks a `state` value received on the callback.
///
/// Nothing is returned unless both the base64 and the JSON layer decode and
/// the object carries a string `csrf` field.
///
/// # Errors
///
/// [`AuthError::MalformedState`] on any decoding failure.
pub fn decode(raw: &str) -> AuthResult<StateEnvelope> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(raw.trim())
        .map_err(|e| AuthError::MalformedState(format!("invalid base64: {e}")))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| AuthError::MalformedState(format!("invalid envelope: {e}")))
}
