//! Cryptographically secure random tokens
//!
//! Used for CSRF tokens (hex of random bytes) and PKCE verifiers (characters
//! drawn from the RFC 3986 unreserved alphabet). The entropy source is
//! injected so callers and tests can supply their own; failure of the source
//! is reported as [`AuthError::InsufficientEntropy`] and never replaced by a
//! non-cryptographic generator.

use rand::{TryCryptoRng, TryRngCore};

use crate::error::{AuthError, AuthResult};

/// Alphabet value that selects hex output.
pub const HEX: &str = "";

/// RFC 3986 unreserved characters, the alphabet of PKCE verifiers.
pub const UNRESERVED: &str =
    "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-._~";

/// Random bytes in a CSRF token (48 hex characters).
pub const CSRF_TOKEN_BYTES: usize = 24;

/// Generates a token from the operating system's secure random source.
///
/// With an empty `alphabet` the result is `length` random bytes hex-encoded
/// (`2 * length` characters); otherwise it is `length` characters drawn
/// uniformly from `alphabet`.
///
/// # Errors
///
/// [`AuthError::InsufficientEntropy`] when the OS source fails or `length`
/// is zero.
///
/// # Examples
///
/// ```
/// use tokenflow::auth::random::{generate, HEX, UNRESERVED};
///
/// let csrf = generate(HEX, 24).unwrap();
/// assert_eq!(csrf.len(), 48);
///
/// let verifier = generate(UNRESERVED, 100).unwrap();
/// assert_eq!(verifier.chars().count(), 100);
/// ```
pub fn generate(alphabet: &str, length: usize) -> AuthResult<String> {
    let mut rng = rand::rngs::OsRng;
    generate_with(&mut rng, alphabet, length)
}

/// Generates a token from the given secure random source.
///
/// See [`generate`] for the output format.
pub fn generate_with<R>(rng: &mut R, alphabet: &str, length: usize) -> AuthResult<String>
where
    R: TryCryptoRng + ?Sized,
{
    if length == 0 {
        return Err(AuthError::InsufficientEntropy(
            "token length must be positive".to_string(),
        ));
    }

    if alphabet.is_empty() {
        let mut bytes = vec![0u8; length];
        rng.try_fill_bytes(&mut bytes)
            .map_err(|e| AuthError::InsufficientEntropy(e.to_string()))?;
        return Ok(hex::encode(bytes));
    }

    let symbols: Vec<char> = alphabet.chars().collect();
    let mut out = String::with_capacity(length);
    for _ in 0..length {
        let idx = uniform_index(rng, symbols.len())?;
        out.push(symbols[idx]);
    }
    Ok(out)
}

/// Draws an index in `0..n` without modulo bias.
///
/// Values at or above the largest multiple of `n` that fits in a `u32` are
/// redrawn, so every index has the same probability.
fn uniform_index<R>(rng: &mut R, n: usize) -> AuthResult<usize>
where
    R: TryCryptoRng + ?Sized,
{
    let n = u32::try_from(n).map_err(|_| {
        AuthError::InsufficientEntropy("alphabet larger than u32::MAX symbols".to_string())
    })?;
    let zone = (u32::MAX / n) * n;
    loop {
        let v = rng
            .try_next_u32()
            .map_err(|e| AuthError::InsufficientEntropy(e.to_string()))?;
        if v < zone {
            return Ok((v % n) as usize);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    struct BrokenSource;

    impl TryRngCore for BrokenSource {
        type Error = std::io::Error;

        fn try_next_u32(&mut self) -> Result<u32, Self::Error> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "entropy source unavailable"))
        }

        fn try_next_u64(&mut self) -> Result<u64, Self::Error> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "entropy source unavailable"))
        }

        fn try_fill_bytes(&mut self, _dst: &mut [u8]) -> Result<(), Self::Error> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "entropy source unavailable"))
        }
    }

    impl TryCryptoRng for BrokenSource {}

    #[test]
    fn test_hex_output_has_double_length() {
        for len in [1, 16, 24, 64] {
            let token = generate(HEX, len).unwrap();
            assert_eq!(token.len(), len * 2);
            assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        }
    }

    #[test]
    fn test_alphabet_output_uses_only_alphabet() {
        let allowed: HashSet<char> = UNRESERVED.chars().collect();
        for len in [1, 43, 100, 128] {
            let token = generate(UNRESERVED, len).unwrap();
            assert_eq!(token.chars().count(), len);
            assert!(token.chars().all(|c| allowed.contains(&c)), "{token}");
        }
    }

    #[test]
    fn test_single_symbol_alphabet() {
        assert_eq!(generate("z", 5).unwrap(), "zzzzz");
    }

    #[test]
    fn test_multibyte_alphabet_counts_characters() {
        let token = generate("äöü", 10).unwrap();
        assert_eq!(token.chars().count(), 10);
        assert!(token.chars().all(|c| "äöü".contains(c)));
    }

    #[test]
    fn test_successive_tokens_differ() {
        let a = generate(HEX, CSRF_TOKEN_BYTES).unwrap();
        let b = generate(HEX, CSRF_TOKEN_BYTES).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_zero_length_is_rejected() {
        assert!(matches!(
            generate(HEX, 0),
            Err(AuthError::InsufficientEntropy(_))
        ));
        assert!(matches!(
            generate(UNRESERVED, 0),
            Err(AuthError::InsufficientEntropy(_))
        ));
    }

    #[test]
    fn test_broken_source_fails_for_hex() {
        let err = generate_with(&mut BrokenSource, HEX, 24).unwrap_err();
        assert!(matches!(err, AuthError::InsufficientEntropy(ref m) if m.contains("unavailable")));
    }

    #[test]
    fn test_broken_source_fails_for_alphabet() {
        let err = generate_with(&mut BrokenSource, UNRESERVED, 43).unwrap_err();
        assert!(matches!(err, AuthError::InsufficientEntropy(_)));
    }

    #[test]
    fn test_thread_rng_is_accepted_as_source() {
        let mut rng = rand::rng();
        let token = generate_with(&mut rng, "ab", 32).unwrap();
        assert_eq!(token.len(), 32);
    }

    #[test]
    fn test_every_symbol_eventually_appears() {
        let token = generate("abcd", 400).unwrap();
        for c in ['a', 'b', 'c', 'd'] {
            assert!(token.contains(c));
        }
    }
}
