//! Error types for identity token parsing and verification

use thiserror::Error;

/// Result type for token operations
pub type Result<T> = std::result::Result<T, TokenError>;

/// Every way parsing, key selection or verification can fail
///
/// A cryptographically invalid signature on an otherwise well-formed token is
/// *not* an error: [`crate::Verifier::verify`] reports it as `Ok(false)`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// The compact token violates the three-segment grammar, carries invalid
    /// base64url or JSON, has a non-object header/payload, lacks `alg`, or has
    /// an empty signature
    #[error("Malformed token: {0}")]
    MalformedToken(String),

    /// Input is not valid base64url
    #[error("Malformed base64url encoding: {0}")]
    MalformedEncoding(String),

    /// The `alg` header names something other than an allowed RS* algorithm
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// The selected JWK cannot be turned into an RSA public key
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// No JWK in the supplied set satisfies the matching rule
    #[error("{}", key_not_found_message(.kid.as_deref(), .algorithm))]
    KeyNotFound {
        /// The `kid` the token asked for, if any
        kid: Option<String>,
        /// The algorithm the key had to serve
        algorithm: String,
    },

    /// A JWKS document could not be parsed
    #[error("Invalid JWKS document: {0}")]
    InvalidJwks(String),

    /// A claim exists but has the wrong JSON type for the requested accessor
    #[error("Claim '{claim}' is not {expected}")]
    ClaimType {
        /// Claim name
        claim: String,
        /// Human-readable description of the expected type
        expected: &'static str,
    },
}

fn key_not_found_message(kid: Option<&str>, algorithm: &str) -> String {
    match kid {
        Some(kid) => format!("Key not found: no JWK with kid '{kid}' for {algorithm}"),
        None => format!("Key not found: no JWK matches algorithm {algorithm}"),
    }
}

impl TokenError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedToken(reason.into())
    }

    pub(crate) fn invalid_key(reason: impl Into<String>) -> Self {
        Self::InvalidKey(reason.into())
    }

    pub(crate) fn claim_type(claim: &str, expected: &'static str) -> Self {
        Self::ClaimType {
            claim: claim.to_string(),
            expected,
        }
    }

    /// Whether the failure was caused by the presented token rather than by
    /// the key set or configuration
    ///
    /// Callers typically answer these with a plain authentication rejection,
    /// while key-side failures may warrant refreshing the JWKS.
    pub fn is_malformed_input(&self) -> bool {
        matches!(
            self,
            TokenError::MalformedToken(_)
                | TokenError::MalformedEncoding(_)
                | TokenError::UnsupportedAlgorithm(_)
                | TokenError::ClaimType { .. }
        )
    }

    /// Get error category for metrics and logging
    pub fn category(&self) -> &'static str {
        match self {
            TokenError::MalformedToken(_) => "malformed_token",
            TokenError::MalformedEncoding(_) => "malformed_encoding",
            TokenError::UnsupportedAlgorithm(_) => "unsupported_algorithm",
            TokenError::InvalidKey(_) => "invalid_key",
            TokenError::KeyNotFound { .. } => "key_not_found",
            TokenError::InvalidJwks(_) => "invalid_jwks",
            TokenError::ClaimType { .. } => "claim_type",
        }
    }
}

impl From<base64::DecodeError> for TokenError {
    fn from(error: base64::DecodeError) -> Self {
        TokenError::MalformedEncoding(error.to_string())
    }
}
