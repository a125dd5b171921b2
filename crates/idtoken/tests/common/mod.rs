//! Common test utilities for integration tests
//!
//! RSA key generation is slow, so each test binary generates its key pairs
//! once and shares them. Tokens are signed directly with the `rsa` crate so
//! the verifier is checked against an independent signing path.

#![allow(dead_code)]

use std::sync::OnceLock;

use idtoken::{Jwk, JwkSet, SignatureAlgorithm, base64url};
use rsa::RsaPrivateKey;
use rsa::traits::PublicKeyParts;
use serde_json::{Value, json};

/// Primary 2048-bit signing key
pub fn signing_key() -> &'static RsaPrivateKey {
    static KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
    KEY.get_or_init(|| generate_key(2048))
}

/// A second, unrelated 2048-bit key
pub fn other_signing_key() -> &'static RsaPrivateKey {
    static KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
    KEY.get_or_init(|| generate_key(2048))
}

/// A 1024-bit key, below the default minimum modulus size
pub fn weak_signing_key() -> &'static RsaPrivateKey {
    static KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
    KEY.get_or_init(|| generate_key(1024))
}

fn generate_key(bits: usize) -> RsaPrivateKey {
    let mut rng = rand::thread_rng();
    RsaPrivateKey::new(&mut rng, bits).expect("Failed to generate RSA key")
}

/// Public JWK for a private key, without kid/alg/use
pub fn public_jwk(key: &RsaPrivateKey) -> Jwk {
    Jwk::rsa(&key.n().to_bytes_be(), &key.e().to_bytes_be())
}

/// JWKS holding the given keys in order
pub fn jwks(keys: Vec<Jwk>) -> JwkSet {
    JwkSet::from(keys)
}

/// base64url(JSON) of a value
pub fn encode_segment(value: &Value) -> String {
    base64url::encode(serde_json::to_vec(value).expect("Failed to serialize segment"))
}

/// Sign `header.claims` with PKCS#1 v1.5 using the algorithm named in the
/// header's `alg`
pub fn sign_token(key: &RsaPrivateKey, header: &Value, claims: &Value) -> String {
    let algorithm: SignatureAlgorithm = header["alg"]
        .as_str()
        .expect("Test header needs an alg")
        .parse()
        .expect("Test header alg must be RS256/RS384/RS512");
    let signing_input = format!("{}.{}", encode_segment(header), encode_segment(claims));
    let signature = sign_input(key, algorithm, signing_input.as_bytes());
    format!("{signing_input}.{}", base64url::encode(signature))
}

/// Raw PKCS#1 v1.5 signature over arbitrary bytes
pub fn sign_input(key: &RsaPrivateKey, algorithm: SignatureAlgorithm, input: &[u8]) -> Vec<u8> {
    key.sign(algorithm.padding(), &algorithm.digest(input))
        .expect("Failed to sign test token")
}

/// RS256 token for the primary key with kid `test-key`
pub fn standard_token(claims: &Value) -> String {
    sign_token(
        signing_key(),
        &json!({"alg": "RS256", "typ": "JWT", "kid": "test-key"}),
        claims,
    )
}

/// Typical OIDC claim set
pub fn oidc_claims(exp: i64) -> Value {
    json!({
        "iss": "https://accounts.example.com",
        "sub": "alice",
        "aud": "client-123",
        "iat": exp - 3600,
        "exp": exp,
        "scope": "openid, profile, email",
    })
}

/// Replace the signature segment of a compact token
pub fn with_signature(token: &str, signature: &[u8]) -> String {
    let (signing_input, _) = token.rsplit_once('.').expect("Token must have a signature");
    format!("{signing_input}.{}", base64url::encode(signature))
}

/// Decoded signature segment of a compact token
pub fn signature_of(token: &str) -> Vec<u8> {
    let (_, signature) = token.rsplit_once('.').expect("Token must have a signature");
    base64url::decode(signature).expect("Signature must be base64url")
}
