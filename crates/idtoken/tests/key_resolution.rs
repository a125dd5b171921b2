//! Key selection scenarios against multi-key JWK Sets
//!
//! Tests cover:
//! - Rotation: several RSA keys, token names one by kid
//! - Kid-less tokens and kid-less keys
//! - Keys published for a different algorithm or for encryption
//! - The loose legacy matching rule and how it differs from the strict one

mod common;

use common::{
    oidc_claims, other_signing_key, public_jwk, sign_token, signing_key, standard_token,
};
use idtoken::{
    IdentityToken, JwkSet, KeyMatching, TokenError, Verifier, VerifierConfig, resolve,
};
use pretty_assertions::assert_eq;
use serde_json::json;

fn strict() -> Verifier {
    Verifier::new(VerifierConfig::default().with_key_matching(KeyMatching::Strict))
}

fn compatible() -> Verifier {
    Verifier::new(VerifierConfig::default().with_key_matching(KeyMatching::Compatible))
}

/// Provider-style JWKS document with the signing key in second position
fn rotated_jwks_document() -> String {
    let previous = public_jwk(other_signing_key())
        .with_kid("2023-key")
        .with_alg("RS256")
        .with_use("sig");
    let current = public_jwk(signing_key())
        .with_kid("test-key")
        .with_alg("RS256")
        .with_use("sig");
    serde_json::to_string(&json!({
        "keys": [
            {"kty": "EC", "kid": "ec-key", "crv": "P-256", "x": "eA", "y": "eQ", "alg": "ES256"},
            previous,
            current,
        ]
    }))
    .unwrap()
}

#[test]
fn test_rotation_selects_key_by_kid() {
    // GIVEN: A JWKS with an EC key, a retired RSA key and the current RSA key
    let keys = JwkSet::from_json(&rotated_jwks_document()).unwrap();
    let token = IdentityToken::parse(&standard_token(&oidc_claims(4_000_000_000))).unwrap();

    // WHEN: The token names the current key
    let selected = resolve(&keys.keys, token.algorithm(), token.key_id()).unwrap();

    // THEN: The current key is chosen and verifies under either rule
    assert_eq!(selected.kid.as_deref(), Some("test-key"));
    assert!(strict().verify(&token, &keys).unwrap());
    assert!(compatible().verify(&token, &keys).unwrap());
}

#[test]
fn test_token_without_kid_uses_first_rsa_key() {
    let keys = JwkSet::from_json(&rotated_jwks_document()).unwrap();
    let raw = sign_token(
        other_signing_key(),
        &json!({"alg": "RS256"}),
        &oidc_claims(4_000_000_000),
    );
    let token = IdentityToken::parse(&raw).unwrap();

    // The EC key is skipped and the first RSA key happens to be the signer
    assert!(strict().verify(&token, &keys).unwrap());
    assert!(compatible().verify(&token, &keys).unwrap());
}

#[test]
fn test_kidless_key_first_in_set() {
    // GIVEN: An unrelated kid-less key ahead of the real signing key
    let keys = JwkSet::from(vec![
        public_jwk(other_signing_key()),
        public_jwk(signing_key()).with_kid("test-key"),
    ]);
    let token = IdentityToken::parse(&standard_token(&oidc_claims(4_000_000_000))).unwrap();

    // WHEN / THEN: Strict matching skips the kid-less key and verifies
    assert!(strict().verify(&token, &keys).unwrap());

    // AND: The loose rule grabs the kid-less key first, so the signature
    // does not verify even though the right key is present
    assert!(!compatible().verify(&token, &keys).unwrap());
}

#[test]
fn test_key_published_for_other_algorithm() {
    // GIVEN: The signing key is only published with alg RS512
    let keys = JwkSet::from(vec![
        public_jwk(signing_key()).with_kid("test-key").with_alg("RS512"),
    ]);
    let token = IdentityToken::parse(&standard_token(&oidc_claims(4_000_000_000))).unwrap();

    // WHEN / THEN: Strict matching refuses to use it for an RS256 token
    match strict().verify(&token, &keys) {
        Err(TokenError::KeyNotFound { kid, algorithm }) => {
            assert_eq!(kid.as_deref(), Some("test-key"));
            assert_eq!(algorithm, "RS256");
        }
        other => panic!("expected KeyNotFound, got {other:?}"),
    }

    // AND: The loose rule ignores the key's alg
    assert!(compatible().verify(&token, &keys).unwrap());
}

#[test]
fn test_encryption_key_is_not_used_for_signatures() {
    let keys = JwkSet::from(vec![
        public_jwk(signing_key()).with_kid("test-key").with_use("enc"),
    ]);
    let token = IdentityToken::parse(&standard_token(&oidc_claims(4_000_000_000))).unwrap();

    assert!(matches!(
        strict().verify(&token, &keys),
        Err(TokenError::KeyNotFound { .. })
    ));
}

#[test]
fn test_only_non_rsa_keys() {
    let keys = JwkSet::from_json(
        r#"{"keys": [{"kty": "EC", "kid": "test-key", "alg": "ES256", "crv": "P-256", "x": "eA", "y": "eQ"}]}"#,
    )
    .unwrap();
    let token = IdentityToken::parse(&standard_token(&oidc_claims(4_000_000_000))).unwrap();

    for verifier in [strict(), compatible()] {
        assert!(matches!(
            verifier.verify(&token, &keys),
            Err(TokenError::KeyNotFound { .. })
        ));
    }
}

#[test]
fn test_empty_jwks() {
    let keys = JwkSet::from_json(r#"{"keys": []}"#).unwrap();
    let token = IdentityToken::parse(&standard_token(&oidc_claims(4_000_000_000))).unwrap();
    let err = strict().verify(&token, &keys).unwrap_err();
    assert_eq!(err.category(), "key_not_found");
    assert!(!err.is_malformed_input());
}
