//! Claim extraction and hash validation on a real ID token

mod common;

use chrono::{DateTime, Utc};

use tokenflow::auth::claims::{decode_token, extract_claims};
use tokenflow::auth::oidc::{validate_hash, HashKind, HashOutcome};
use tokenflow::error::AuthError;

#[test]
fn test_sample_token_header() {
    let decoded = decode_token(common::SAMPLE_ID_TOKEN).unwrap();
    assert_eq!(decoded.header.alg, "RS256");
    assert_eq!(decoded.header.typ.as_deref(), Some("JWT"));
    assert_eq!(
        decoded.header.kid.as_deref(),
        Some("gUTAkxb/zUE869S1q7C8lWS+rRk=")
    );
}

#[test]
fn test_sample_token_claims() {
    let claims = extract_claims(common::SAMPLE_ID_TOKEN).unwrap();
    assert_eq!(claims.user_key(), Some("rR0MGwwmrnqcYPSfFBbo3g=="));
    assert_eq!(claims.client_key(), Some("u|lyt94PkOAxpDM0NtBqgw=="));
    assert_eq!(claims.exp, Some(1_679_648_051));
    assert_eq!(
        claims.expires_at().unwrap().to_rfc3339(),
        "2023-03-24T08:54:11+00:00"
    );
    assert_eq!(claims.extra["tokenName"], "id_token");

    let now: DateTime<Utc> = DateTime::from_timestamp(1_679_648_061, 0).unwrap();
    assert_eq!(claims.seconds_remaining(now), Some(-10));
}

#[test]
fn test_sample_token_hashes_match() {
    let decoded = decode_token(common::SAMPLE_ID_TOKEN).unwrap();
    let alg = decoded.header.alg.as_str();

    for (kind, plaintext) in [
        (HashKind::Code, common::SAMPLE_CODE),
        (HashKind::State, common::SAMPLE_STATE),
        (HashKind::AccessToken, common::SAMPLE_ACCESS_TOKEN),
    ] {
        assert_eq!(
            validate_hash(kind, plaintext, &decoded.claims, alg).unwrap(),
            HashOutcome::Match,
            "{kind}"
        );
    }
}

#[test]
fn test_sample_token_hashes_reject_other_values() {
    let decoded = decode_token(common::SAMPLE_ID_TOKEN).unwrap();
    let alg = decoded.header.alg.as_str();

    assert_eq!(
        validate_hash(HashKind::Code, common::SAMPLE_STATE, &decoded.claims, alg).unwrap(),
        HashOutcome::Mismatch
    );
    assert_eq!(
        validate_hash(HashKind::State, "Hallo ", &decoded.claims, alg).unwrap(),
        HashOutcome::Mismatch
    );
}

#[test]
fn test_truncated_token_is_malformed() {
    let mut segments = common::SAMPLE_ID_TOKEN.split('.');
    let two = format!(
        "{}.{}",
        segments.next().unwrap(),
        segments.next().unwrap()
    );
    assert!(matches!(
        extract_claims(&two),
        Err(AuthError::MalformedToken(_))
    ));
}
