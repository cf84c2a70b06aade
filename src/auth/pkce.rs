//! PKCE S256 verifier and challenge
//!
//! This module implements the Proof Key for Code Exchange (PKCE) extension
//! to OAuth 2.0 as defined in RFC 7636, using the `S256` challenge method.
//!
//! # How PKCE works
//!
//! 1. The client generates a high-entropy random string called the `code_verifier`.
//! 2. The client computes a SHA-256 hash of the verifier and base64url-encodes
//!    it to produce the `code_challenge`.
//! 3. The authorization request includes `code_challenge` and
//!    `code_challenge_method=S256`.
//! 4. The token exchange request includes the original `code_verifier`.
//! 5. The authorization server recomputes the challenge and compares it to
//!    the value sent in step 3, proving possession of the verifier.
//!
//! # References
//!
//! - RFC 7636 <https://www.rfc-editor.org/rfc/rfc7636>

use base64::Engine as _;
use sha2::{Digest, Sha256};

use crate::auth::random;
use crate::error::{AuthError, AuthResult};

/// The only challenge method this crate emits.
pub const CHALLENGE_METHOD: &str = "S256";

/// Minimum verifier length (RFC 7636 section 4.1).
pub const MIN_VERIFIER_LEN: usize = 43;

/// Maximum verifier length (RFC 7636 section 4.1).
pub const MAX_VERIFIER_LEN: usize = 128;

/// Length of verifiers produced by [`PkceVerifier::generate`].
pub const DEFAULT_VERIFIER_LEN: usize = 100;

// ---------------------------------------------------------------------------
// PkceVerifier
// ---------------------------------------------------------------------------

/// A validated PKCE code verifier.
///
/// Holding a `PkceVerifier` guarantees 43 to 128 characters from
/// `[A-Za-z0-9-._~]`.
///
/// # Examples
///
/// ```
/// use tokenflow::auth::pkce::PkceVerifier;
///
/// let verifier = PkceVerifier::new("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk").unwrap();
/// assert_eq!(verifier.challenge(), "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct PkceVerifier(String);

impl PkceVerifier {
    /// Validates and wraps an existing verifier string.
    ///
    /// # Errors
    ///
    /// [`AuthError::InvalidVerifier`] when the length or alphabet is wrong.
    pub fn new(verifier: impl Into<String>) -> AuthResult<Self> {
        let verifier = verifier.into();
        validate_verifier(&verifier)?;
        Ok(Self(verifier))
    }

    /// Generates a fresh verifier of [`DEFAULT_VERIFIER_LEN`] characters.
    ///
    /// # Errors
    ///
    /// [`AuthError::InsufficientEntropy`] when the secure random source fails.
    pub fn generate() -> AuthResult<Self> {
        let verifier = random::generate(random::UNRESERVED, DEFAULT_VERIFIER_LEN)?;
        Ok(Self(verifier))
    }

    /// Returns the verifier string sent as `code_verifier`.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Computes the `S256` code challenge for this verifier.
    pub fn challenge(&self) -> String {
        s256(&self.0)
    }
}

impl std::fmt::Debug for PkceVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PkceVerifier(<redacted>)")
    }
}

// ---------------------------------------------------------------------------
// Public functions
// ---------------------------------------------------------------------------

/// Derives the `S256` code challenge from a verifier string.
///
/// The challenge is the base64url encoding, without padding, of the SHA-256
/// digest of the verifier's bytes (RFC 7636 section 4.2).
///
/// # Errors
///
/// [`AuthError::InvalidVerifier`] when `verifier` is not 43 to 128 unreserved
/// characters.
///
/// # Examples
///
/// ```
/// use tokenflow::auth::pkce::derive_challenge;
///
/// let challenge = derive_challenge("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk").unwrap();
/// assert_eq!(challenge, "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM");
/// assert!(derive_challenge("too-short").is_err());
/// ```
pub fn derive_challenge(verifier: &str) -> AuthResult<String> {
    validate_verifier(verifier)?;
    Ok(s256(verifier))
}

fn s256(verifier: &str) -> String {
    let digest = Sha256::digest(verifier.as_bytes());
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(digest.as_slice())
}

fn validate_verifier(verifier: &str) -> AuthResult<()> {
    let len = verifier.len();
    if !(MIN_VERIFIER_LEN..=MAX_VERIFIER_LEN).contains(&len) {
        return Err(AuthError::InvalidVerifier(format!(
            "length {len} outside {MIN_VERIFIER_LEN}..={MAX_VERIFIER_LEN}"
        )));
    }
    if let Some(bad) = verifier
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | '~')))
    {
        return Err(AuthError::InvalidVerifier(format!(
            "character {bad:?} is not unreserved"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
