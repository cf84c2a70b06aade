//! OIDC `c_hash` / `s_hash` / `at_hash` validation
//!
//! Each hash claim is the base64url encoding (no padding) of the left-most
//! half of a digest of the plaintext value. The digest is chosen by the
//! numeric suffix of the token's JOSE `alg` (`RS256` -> SHA-256, `HS512` ->
//! SHA-512). A missing claim is an expected outcome, for example on refreshed
//! tokens, and is reported as [`HashOutcome::NotApplicable`].

use base64::Engine as _;
use sha1::Sha1;
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};

use crate::auth::claims::TokenClaims;
use crate::error::{AuthError, AuthResult};

/// Which plaintext a hash claim binds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashKind {
    /// Authorization code, claim `c_hash`
    Code,
    /// `state` value, claim `s_hash`
    State,
    /// Access token, claim `at_hash`
    AccessToken,
}

impl HashKind {
    /// Name of the claim carrying this hash.
    pub fn claim_name(&self) -> &'static str {
        match self {
            HashKind::Code => "c_hash",
            HashKind::State => "s_hash",
            HashKind::AccessToken => "at_hash",
        }
    }

    fn claim<'c>(&self, claims: &'c TokenClaims) -> Option<&'c str> {
        match self {
            HashKind::Code => claims.c_hash.as_deref(),
            HashKind::State => claims.s_hash.as_deref(),
            HashKind::AccessToken => claims.at_hash.as_deref(),
        }
    }
}

impl std::fmt::Display for HashKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.claim_name())
    }
}

/// Result of comparing a hash claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashOutcome {
    Match,
    /// The token must not be trusted
    Mismatch,
    /// The token carries no such claim
    NotApplicable,
}

/// Digest named by a JOSE `alg`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestAlgorithm {
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

impl DigestAlgorithm {
    /// Maps a JOSE `alg` to `sha<N>` using everything after its two-letter
    /// family prefix.
    ///
    /// # Errors
    ///
    /// [`AuthError::UnsupportedAlgorithm`] when `sha<N>` is not a known digest.
    pub fn from_jws_alg(alg: &str) -> AuthResult<Self> {
        match alg.get(2..) {
            Some("1") => Ok(DigestAlgorithm::Sha1),
            Some("224") => Ok(DigestAlgorithm::Sha224),
            Some("256") => Ok(DigestAlgorithm::Sha256),
            Some("384") => Ok(DigestAlgorithm::Sha384),
            Some("512") => Ok(DigestAlgorithm::Sha512),
            _ => Err(AuthError::UnsupportedAlgorithm(alg.to_string())),
        }
    }

    /// Digest of `input`.
    pub fn digest(&self, input: &[u8]) -> Vec<u8> {
        match self {
            DigestAlgorithm::Sha1 => Sha1::digest(input).to_vec(),
            DigestAlgorithm::Sha224 => Sha224::digest(input).to_vec(),
            DigestAlgorithm::Sha256 => Sha256::digest(input).to_vec(),
            DigestAlgorithm::Sha384 => Sha384::digest(input).to_vec(),
            DigestAlgorithm::Sha512 => Sha512::digest(input).to_vec(),
        }
    }
}

/// Computes the half-digest hash of `plaintext` for the given JOSE `alg`.
///
/// # Errors
///
/// [`AuthError::UnsupportedAlgorithm`] for an unknown `alg`.
///
/// # Examples
///
/// ```
/// use tokenflow::auth::oidc::half_hash;
///
/// assert_eq!(half_hash("RS256", "Hallo").unwrap(), "dTaS7DattMeUyXOUXrKpnA");
/// ```
pub fn half_hash(header_alg: &str, plaintext: &str) -> AuthResult<String> {
    let digest = DigestAlgorithm::from_jws_alg(header_alg)?.digest(plaintext.as_bytes());
    let half = &digest[..digest.len() / 2];
    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(half))
}

/// Checks one hash claim of `claims` against `plaintext`.
///
/// The claim is looked up first: when it is absent the outcome is
/// [`HashOutcome::NotApplicable`] whatever `header_alg` says. The comparison
/// is case-sensitive.
///
/// # Errors
///
/// [`AuthError::UnsupportedAlgorithm`] when the claim is present and
/// `header_alg` does not map to a digest.
pub fn validate_hash(
    kind: HashKind,
    plaintext: &str,
    claims: &TokenClaims,
    header_alg: &str,
) -> AuthResult<HashOutcome> {
    let Some(expected) = kind.claim(claims) else {
        tracing::debug!(claim = kind.claim_name(), "Hash claim not present in token");
        return Ok(HashOutcome::NotApplicable);
    };

    let computed = half_hash(header_alg, plaintext)?;
    if computed == expected {
        Ok(HashOutcome::Match)
    } else {
        tracing::warn!(
            claim = kind.claim_name(),
            "Hash claim does not match the supplied value; the token must not be trusted"
        );
        Ok(HashOutcome::Mismatch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CODE: &str = "Bvi-SeI5dAR74VM1H75EbSVBci8";
    const STATE: &str = "Hallo";
    const ID_TOKEN: &str = "g-CVJPstFF5SFdEEkERztkTB65M";

    fn sample_claims() -> TokenClaims {
        TokenClaims {
            c_hash: Some("1Susy4VHuKunksBJpDqbnQ".to_string()),
            s_hash: Some("dTaS7DattMeUyXOUXrKpnA".to_string()),
            at_hash: Some("vPD1HacxWyRGdFPc4pSYCQ".to_string()),
            ..TokenClaims::default()
        }
    }

    #[test]
    fn test_sample_hashes_match() {
        let claims = sample_claims();
        assert_eq!(
            validate_hash(HashKind::Code, CODE, &claims, "RS256").unwrap(),
            HashOutcome::Match
        );
        assert_eq!(
            validate_hash(HashKind::State, STATE, &claims, "RS256").unwrap(),
            HashOutcome::Match
        );
        assert_eq!(
            validate_hash(HashKind::AccessToken, ID_TOKEN, &claims, "RS256").unwrap(),
            HashOutcome::Match
        );
    }

    #[test]
    fn test_absent_claim_is_not_applicable() {
        let claims = TokenClaims::default();
        assert_eq!(
            validate_hash(HashKind::Code, CODE, &claims, "RS256").unwrap(),
            HashOutcome::NotApplicable
        );
    }

    #[test]
    fn test_absent_claim_wins_over_unsupported_alg() {
        let claims = TokenClaims::default();
        assert_eq!(
            validate_hash(HashKind::State, STATE, &claims, "EdDSA").unwrap(),
            HashOutcome::NotApplicable
        );
    }

    #[test]
    fn test_wrong_plaintext_is_mismatch() {
        let claims = sample_claims();
        assert_eq!(
            validate_hash(HashKind::State, "hallo", &claims, "RS256").unwrap(),
            HashOutcome::Mismatch
        );
    }

    #[test]
    fn test_comparison_is_case_sensitive() {
        let mut claims = sample_claims();
        claims.s_hash = Some("dtas7dattmeuyxouxrkpna".to_string());
        assert_eq!(
            validate_hash(HashKind::State, STATE, &claims, "RS256").unwrap(),
            HashOutcome::Mismatch
        );
    }

    #[test]
    fn test_different_digest_is_mismatch() {
        let claims = sample_claims();
        assert_eq!(
            validate_hash(HashKind::Code, CODE, &claims, "HS512").unwrap(),
            HashOutcome::Mismatch
        );
    }

    #[test]
    fn test_unsupported_algorithms() {
        let claims = sample_claims();
        for alg in ["EdDSA", "none", "RS2", "HS128", "", "R"] {
            assert!(
                matches!(
                    validate_hash(HashKind::Code, CODE, &claims, alg),
                    Err(AuthError::UnsupportedAlgorithm(_))
                ),
                "{alg:?} should be unsupported"
            );
        }
    }

    #[test]
    fn test_algorithm_mapping() {
        assert_eq!(DigestAlgorithm::from_jws_alg("RS256").unwrap(), DigestAlgorithm::Sha256);
        assert_eq!(DigestAlgorithm::from_jws_alg("PS384").unwrap(), DigestAlgorithm::Sha384);
        assert_eq!(DigestAlgorithm::from_jws_alg("ES512").unwrap(), DigestAlgorithm::Sha512);
        assert_eq!(DigestAlgorithm::from_jws_alg("HS224").unwrap(), DigestAlgorithm::Sha224);
        assert_eq!(DigestAlgorithm::from_jws_alg("RS1").unwrap(), DigestAlgorithm::Sha1);
    }

    #[test]
    fn test_half_hash_lengths() {
        // 16, 24 and 32 bytes of digest half -> unpadded base64url lengths
        assert_eq!(half_hash("RS256", "x").unwrap().len(), 22);
        assert_eq!(half_hash("RS384", "x").unwrap().len(), 32);
        assert_eq!(half_hash("RS512", "x").unwrap().len(), 43);
        // 14 bytes for SHA-224
        assert_eq!(half_hash("HS224", "x").unwrap().len(), 19);
    }

    #[test]
    fn test_sha1_half_hash() {
        // SHA-1("abc") = a9993e364706816aba3e25717850c26c9cd0d89d
        assert_eq!(half_hash("RS1", "abc").unwrap(), "qZk-NkcGgWq6Pg");
    }

    #[test]
    fn test_claim_names() {
        assert_eq!(HashKind::Code.to_string(), "c_hash");
        assert_eq!(HashKind::State.claim_name(), "s_hash");
        assert_eq!(HashKind::AccessToken.claim_name(), "at_hash");
    }
}
