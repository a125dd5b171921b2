//! Verification policy configuration
//!
//! The core never reads files or the environment itself; callers build a
//! [`VerifierConfig`] in code or deserialize it from whatever configuration
//! source they use (the `idtoken` CLI layers a file and `IDTOKEN_*`
//! environment variables on top of the defaults).

use serde::{Deserialize, Serialize};

use crate::verify::SignatureAlgorithm;

/// How the resolver picks a JWK for a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyMatching {
    /// An RSA key must agree with the token on `alg` (when the key declares
    /// one), must be a signing key (when it declares `use`), and must carry
    /// the exact `kid` whenever the token names one
    #[default]
    Strict,
    /// Loose legacy rule: the first RSA key is accepted when the token has
    /// no `kid`, when the key has no `kid`, or when the two are equal, with
    /// no regard for the key's `alg`
    Compatible,
}

/// Signature verification policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifierConfig {
    /// Key selection rule
    #[serde(default)]
    pub key_matching: KeyMatching,
    /// Algorithms a token may declare (default: RS256, RS384, RS512)
    #[serde(default = "default_allowed_algorithms")]
    pub allowed_algorithms: Vec<SignatureAlgorithm>,
    /// Smallest accepted RSA modulus in bits (default: 2048)
    #[serde(default = "default_min_rsa_key_bits")]
    pub min_rsa_key_bits: usize,
}

fn default_allowed_algorithms() -> Vec<SignatureAlgorithm> {
    SignatureAlgorithm::ALL.to_vec()
}

fn default_min_rsa_key_bits() -> usize {
    2048
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            key_matching: KeyMatching::default(),
            allowed_algorithms: default_allowed_algorithms(),
            min_rsa_key_bits: default_min_rsa_key_bits(),
        }
    }
}

impl VerifierConfig {
    /// Set the key selection rule
    pub fn with_key_matching(mut self, key_matching: KeyMatching) -> Self {
        self.key_matching = key_matching;
        self
    }

    /// Restrict the algorithms a token may declare
    pub fn with_allowed_algorithms(mut self, algorithms: Vec<SignatureAlgorithm>) -> Self {
        self.allowed_algorithms = algorithms;
        self
    }

    /// Set the smallest accepted RSA modulus size
    pub fn with_min_rsa_key_bits(mut self, bits: usize) -> Self {
        self.min_rsa_key_bits = bits;
        self
    }

    /// Whether `algorithm` is on the allow-list
    pub fn allows(&self, algorithm: SignatureAlgorithm) -> bool {
        self.allowed_algorithms.contains(&algorithm)
    }
}
