//! RSA PKCS#1 v1.5 signature verification (RS256 / RS384 / RS512)
//!
//! The verifier maps the token's `alg` to a hash, selects a JWK through the
//! resolver, rebuilds the RSA public key from its `n`/`e` members and checks
//! the signature over the token's signing input. A signature that does not
//! verify is a normal `Ok(false)` outcome; only malformed inputs, unsupported
//! algorithms and unusable key sets are errors.

use std::fmt;
use std::str::FromStr;

use rsa::traits::PublicKeyParts;
use rsa::{Pkcs1v15Sign, RsaPublicKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha384, Sha512};
use tracing::{debug, warn};

use crate::config::VerifierConfig;
use crate::error::{Result, TokenError};
use crate::jwk::{Jwk, JwkSet, resolve_with};
use crate::token::IdentityToken;

/// Supported JWS algorithms (RFC 7518 §3.3)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignatureAlgorithm {
    /// RSASSA-PKCS1-v1_5 using SHA-256
    #[serde(rename = "RS256")]
    Rs256,
    /// RSASSA-PKCS1-v1_5 using SHA-384
    #[serde(rename = "RS384")]
    Rs384,
    /// RSASSA-PKCS1-v1_5 using SHA-512
    #[serde(rename = "RS512")]
    Rs512,
}

impl SignatureAlgorithm {
    /// Every supported algorithm
    pub const ALL: [SignatureAlgorithm; 3] = [Self::Rs256, Self::Rs384, Self::Rs512];

    /// Get the algorithm name as specified in RFC 7518
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rs256 => "RS256",
            Self::Rs384 => "RS384",
            Self::Rs512 => "RS512",
        }
    }

    /// Hash `message` with this algorithm's digest
    pub fn digest(self, message: &[u8]) -> Vec<u8> {
        match self {
            Self::Rs256 => Sha256::digest(message).to_vec(),
            Self::Rs384 => Sha384::digest(message).to_vec(),
            Self::Rs512 => Sha512::digest(message).to_vec(),
        }
    }

    /// PKCS#1 v1.5 padding scheme carrying this algorithm's DigestInfo prefix
    pub fn padding(self) -> Pkcs1v15Sign {
        match self {
            Self::Rs256 => Pkcs1v15Sign::new::<Sha256>(),
            Self::Rs384 => Pkcs1v15Sign::new::<Sha384>(),
            Self::Rs512 => Pkcs1v15Sign::new::<Sha512>(),
        }
    }
}

impl fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignatureAlgorithm {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "RS256" => Ok(Self::Rs256),
            "RS384" => Ok(Self::Rs384),
            "RS512" => Ok(Self::Rs512),
            other => Err(TokenError::UnsupportedAlgorithm(other.to_string())),
        }
    }
}

/// Signature verifier bound to a [`VerifierConfig`]
///
/// Stateless apart from its configuration; share one instance freely across
/// threads.
///
/// # Example
///
/// ```rust,no_run
/// use idtoken::{IdentityToken, JwkSet, Verifier, VerifierConfig};
///
/// # fn run(raw: &str, jwks_json: &str) -> idtoken::Result<()> {
/// let token = IdentityToken::parse(raw)?;
/// let keys = JwkSet::from_json(jwks_json)?;
///
/// let verifier = Verifier::new(VerifierConfig::default());
/// if verifier.verify(&token, &keys)? && !token.is_expired() {
///     println!("authenticated {:?}", token.claims().subject()?);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct Verifier {
    config: VerifierConfig,
}

impl Verifier {
    /// Create a verifier with the given policy
    pub fn new(config: VerifierConfig) -> Self {
        Self { config }
    }

    /// The active policy
    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Map the token's `alg` header to an allowed algorithm
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::UnsupportedAlgorithm`] for anything other than
    /// an allowed RS256/RS384/RS512.
    pub fn algorithm_for(&self, token: &IdentityToken) -> Result<SignatureAlgorithm> {
        let algorithm: SignatureAlgorithm = token.algorithm().parse()?;
        if !self.config.allows(algorithm) {
            return Err(TokenError::UnsupportedAlgorithm(format!(
                "{algorithm} is not in the allowed algorithm list"
            )));
        }
        Ok(algorithm)
    }

    /// Verify the token's signature against `keys`
    ///
    /// Returns `Ok(true)` only for a cryptographically valid signature over
    /// the unmodified signing input, and `Ok(false)` for any mismatch.
    ///
    /// # Errors
    ///
    /// - [`TokenError::UnsupportedAlgorithm`] if `alg` is not an allowed RS*
    /// - [`TokenError::KeyNotFound`] if no key matches the token
    /// - [`TokenError::InvalidKey`] if the selected key lacks `n`/`e`, cannot
    ///   be decoded, or is smaller than the configured minimum
    pub fn verify(&self, token: &IdentityToken, keys: impl AsRef<[Jwk]>) -> Result<bool> {
        let algorithm = self.algorithm_for(token)?;
        let jwk = resolve_with(
            keys.as_ref(),
            algorithm.as_str(),
            token.key_id(),
            self.config.key_matching,
        )?;
        let public_key = self.public_key(jwk)?;

        let hashed = algorithm.digest(token.signing_input());
        match public_key.verify(algorithm.padding(), &hashed, token.signature()) {
            Ok(()) => {
                debug!(
                    algorithm = %algorithm,
                    key_id = ?jwk.kid,
                    "Token signature verified"
                );
                Ok(true)
            }
            Err(e) => {
                warn!(
                    algorithm = %algorithm,
                    key_id = ?jwk.kid,
                    signature_len = token.signature().len(),
                    error = %e,
                    "Token signature rejected"
                );
                Ok(false)
            }
        }
    }

    /// Parse a `{"keys": [...]}` document and verify against it
    ///
    /// # Errors
    ///
    /// [`TokenError::InvalidJwks`] for an unparseable document, otherwise as
    /// [`Verifier::verify`].
    pub fn verify_jwks_document(&self, token: &IdentityToken, document: &str) -> Result<bool> {
        let keys = JwkSet::from_json(document)?;
        self.verify(token, &keys)
    }

    fn public_key(&self, jwk: &Jwk) -> Result<RsaPublicKey> {
        let public_key = jwk.rsa_public_key()?;
        let bits = public_key.n().bits();
        if bits < self.config.min_rsa_key_bits {
            warn!(
                key_id = ?jwk.kid,
                bits,
                min_bits = self.config.min_rsa_key_bits,
                "Rejecting undersized RSA key"
            );
            return Err(TokenError::invalid_key(format!(
                "RSA modulus is {bits} bits, minimum is {}",
                self.config.min_rsa_key_bits
            )));
        }
        Ok(public_key)
    }
}

/// Verify `token` against `keys` with the default policy
///
/// # Errors
///
/// See [`Verifier::verify`].
pub fn verify(token: &IdentityToken, keys: impl AsRef<[Jwk]>) -> Result<bool> {
    Verifier::default().verify(token, keys)
}
