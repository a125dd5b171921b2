//! JSON Web Keys (RFC 7517) and key selection
//!
//! A JWK Set is supplied by the caller for every verification and is never
//! cached here. Key selection walks the set in document order and returns the
//! first key accepted by the configured [`KeyMatching`] rule.

use std::str::FromStr;

use rsa::{BigUint, RsaPublicKey};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::base64url;
use crate::config::KeyMatching;
use crate::error::{Result, TokenError};

/// JSON Web Key
///
/// Only the members key selection and RSA verification read are kept;
/// anything else in the document (`crv`, `x`, `x5c`, ...) is dropped on
/// deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwk {
    /// Key family; only `RSA` keys can verify
    pub kty: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,

    /// Declared purpose, `sig` or `enc`
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "use")]
    pub key_use: Option<String>,

    /// Declared JWS algorithm
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,

    /// Modulus, big-endian base64url
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<String>,

    /// Public exponent, big-endian base64url
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub e: Option<String>,
}

impl Jwk {
    /// RSA public key from big-endian modulus and exponent bytes
    pub fn rsa(n: &[u8], e: &[u8]) -> Self {
        Self {
            kty: "RSA".to_string(),
            kid: None,
            key_use: None,
            alg: None,
            n: Some(base64url::encode(n)),
            e: Some(base64url::encode(e)),
        }
    }

    /// Set the key ID
    pub fn with_kid(mut self, kid: impl Into<String>) -> Self {
        self.kid = Some(kid.into());
        self
    }

    /// Set the intended algorithm
    pub fn with_alg(mut self, alg: impl Into<String>) -> Self {
        self.alg = Some(alg.into());
        self
    }

    /// Set the intended use (`sig` or `enc`)
    pub fn with_use(mut self, key_use: impl Into<String>) -> Self {
        self.key_use = Some(key_use.into());
        self
    }

    /// Whether this is an RSA key
    pub fn is_rsa(&self) -> bool {
        self.kty == "RSA"
    }

    /// Whether this key may serve `algorithm` for a token carrying `key_id`
    pub fn matches(&self, algorithm: &str, key_id: Option<&str>, matching: KeyMatching) -> bool {
        if !self.is_rsa() {
            // Other families only match on an exact alg + kid pairing
            return self.alg.as_deref() == Some(algorithm) && self.kid.as_deref() == key_id;
        }

        match matching {
            KeyMatching::Compatible => {
                key_id.is_none() || self.kid.is_none() || self.kid.as_deref() == key_id
            }
            KeyMatching::Strict => {
                let alg_ok = self.alg.as_deref().is_none_or(|alg| alg == algorithm);
                let use_ok = self.key_use.as_deref().is_none_or(|u| u == "sig");
                let kid_ok = match key_id {
                    Some(wanted) => self.kid.as_deref() == Some(wanted),
                    None => true,
                };
                alg_ok && use_ok && kid_ok
            }
        }
    }

    /// Build the RSA public key described by `n` and `e`
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::InvalidKey`] if `n` or `e` is missing, is not
    /// valid base64url, or describes a key the RSA primitive rejects
    /// (for example an exponent below 2 or a modulus above 4096 bits).
    pub fn rsa_public_key(&self) -> Result<RsaPublicKey> {
        let n = self
            .n
            .as_deref()
            .ok_or_else(|| TokenError::invalid_key("RSA key missing 'n' parameter"))?;
        let e = self
            .e
            .as_deref()
            .ok_or_else(|| TokenError::invalid_key("RSA key missing 'e' parameter"))?;

        let n = base64url::decode(n)
            .map_err(|err| TokenError::invalid_key(format!("RSA modulus 'n': {err}")))?;
        let e = base64url::decode(e)
            .map_err(|err| TokenError::invalid_key(format!("RSA exponent 'e': {err}")))?;

        RsaPublicKey::new(BigUint::from_bytes_be(&n), BigUint::from_bytes_be(&e))
            .map_err(|err| TokenError::invalid_key(format!("Failed to create RSA key: {err}")))
    }
}

/// Select the first key in `keys` that may serve `algorithm` for a token
/// carrying `key_id`, using [`KeyMatching::default`]
///
/// # Errors
///
/// Returns [`TokenError::KeyNotFound`] if no key matches.
pub fn resolve<'a>(keys: &'a [Jwk], algorithm: &str, key_id: Option<&str>) -> Result<&'a Jwk> {
    resolve_with(keys, algorithm, key_id, KeyMatching::default())
}

/// Select the first key in `keys` that may serve `algorithm` for a token
/// carrying `key_id` under the given matching rule
///
/// # Errors
///
/// Returns [`TokenError::KeyNotFound`] if no key matches.
pub fn resolve_with<'a>(
    keys: &'a [Jwk],
    algorithm: &str,
    key_id: Option<&str>,
    matching: KeyMatching,
) -> Result<&'a Jwk> {
    match keys
        .iter()
        .enumerate()
        .find(|(_, key)| key.matches(algorithm, key_id, matching))
    {
        Some((index, key)) => {
            debug!(
                index,
                key_id = ?key.kid,
                requested_kid = ?key_id,
                algorithm,
                matching = ?matching,
                "Selected JWK"
            );
            Ok(key)
        }
        None => {
            warn!(
                requested_kid = ?key_id,
                algorithm,
                key_count = keys.len(),
                matching = ?matching,
                "No JWK matches token"
            );
            Err(TokenError::KeyNotFound {
                kid: key_id.map(str::to_string),
                algorithm: algorithm.to_string(),
            })
        }
    }
}

/// JSON Web Key Set (`{"keys": [...]}`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwkSet {
    /// Keys in document order
    pub keys: Vec<Jwk>,
}

impl JwkSet {
    /// Parse a JWKS document
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::InvalidJwks`] if the document is not a JSON
    /// object with a `keys` array of JWKs.
    pub fn from_json(document: &str) -> Result<Self> {
        Self::from_slice(document.as_bytes())
    }

    /// Parse a JWKS document from raw bytes
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::InvalidJwks`] if the document is not a JSON
    /// object with a `keys` array of JWKs.
    pub fn from_slice(document: &[u8]) -> Result<Self> {
        let set: JwkSet = serde_json::from_slice(document)
            .map_err(|e| TokenError::InvalidJwks(e.to_string()))?;
        debug!(key_count = set.keys.len(), "Parsed JWKS document");
        Ok(set)
    }

    /// Find a key by exact key ID
    pub fn find(&self, kid: &str) -> Option<&Jwk> {
        self.keys.iter().find(|key| key.kid.as_deref() == Some(kid))
    }

    /// Select a key for `algorithm` / `key_id`; see [`resolve_with`]
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::KeyNotFound`] if no key matches.
    pub fn resolve(
        &self,
        algorithm: &str,
        key_id: Option<&str>,
        matching: KeyMatching,
    ) -> Result<&Jwk> {
        resolve_with(&self.keys, algorithm, key_id, matching)
    }

    /// Number of keys
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the set holds no keys
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Iterate over the keys in document order
    pub fn iter(&self) -> std::slice::Iter<'_, Jwk> {
        self.keys.iter()
    }
}

impl From<Vec<Jwk>> for JwkSet {
    fn from(keys: Vec<Jwk>) -> Self {
        Self { keys }
    }
}

impl FromStr for JwkSet {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_json(s)
    }
}

impl AsRef<[Jwk]> for JwkSet {
    fn as_ref(&self) -> &[Jwk] {
        &self.keys
    }
}

impl<'a> IntoIterator for &'a JwkSet {
    type Item = &'a Jwk;
    type IntoIter = std::slice::Iter<'a, Jwk>;

    fn into_iter(self) -> Self::IntoIter {
        self.keys.iter()
    }
}
