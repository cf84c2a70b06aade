//! CSRF check of the callback `state`
//!
//! Binds the provider's redirect to the browser session that started it. The
//! check must pass before any token request is made; [`crate::auth::flow`]
//! runs it before touching the token endpoint.

use serde_json::Value;

use crate::auth::state;
use crate::error::{AuthError, AuthResult};

/// Tracing target for rejected callbacks.
pub const SECURITY_TARGET: &str = "tokenflow::security";

/// A callback whose `state` carried the session's CSRF token.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedState {
    /// The caller payload round-tripped through the redirect
    pub data: Value,
}

/// Validates the received `state` against the session's CSRF token.
///
/// Checks run in order: state present, session token present, state
/// decodes, tokens equal. The comparison is exact.
///
/// # Errors
///
/// - [`AuthError::MissingState`] when `received_state` is `None`
/// - [`AuthError::MissingSession`] when `expected_csrf` is `None`
/// - [`AuthError::MalformedState`] when the state does not decode
/// - [`AuthError::CsrfMismatch`] when the tokens differ
///
/// Every failure is also logged at `warn` on [`SECURITY_TARGET`].
///
/// # Examples
///
/// ```
/// use tokenflow::auth::{csrf, state};
///
/// let raw = state::encode("abc", "payload").unwrap();
/// assert!(csrf::validate(Some("abc"), Some(&raw)).is_ok());
/// assert!(csrf::validate(Some("abd"), Some(&raw)).is_err());
/// ```
pub fn validate(
    expected_csrf: Option<&str>,
    received_state: Option<&str>,
) -> AuthResult<ValidatedState> {
    check(expected_csrf, received_state).map_err(|err| {
        tracing::warn!(target: SECURITY_TARGET, error = %err, "Rejected authorization callback");
        err
    })
}

fn check(expected_csrf: Option<&str>, received_state: Option<&str>) -> AuthResult<ValidatedState> {
    let received_state = received_state.ok_or(AuthError::MissingState)?;
    let expected_csrf = expected_csrf.ok_or(AuthError::MissingSession)?;
    let envelope = state::decode(received_state)?;

    if envelope.csrf != expected_csrf {
        return Err(AuthError::CsrfMismatch);
    }

    Ok(ValidatedState {
        data: envelope.data,
    })
}
