//! Compact JWT parsing
//!
//! Parsing validates structure only: the three-segment base64url grammar,
//! JSON objects in the header and payload, a non-empty `alg`, and a
//! non-empty signature. No cryptographic check happens here; see
//! [`crate::Verifier`].

use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};
use tracing::debug;

use crate::base64url;
use crate::claims::{Claims, Header};
use crate::error::{Result, TokenError};

/// A parsed, immutable OpenID Connect identity token
///
/// Constructed once by [`IdentityToken::parse`]; every accessor hands out
/// shared references, so the decoded header and claims cannot drift from the
/// bytes the signature covers.
#[derive(Clone, PartialEq)]
pub struct IdentityToken {
    raw: String,
    /// Byte length of `header_segment.payload_segment` within `raw`
    signing_input_len: usize,
    header: Header,
    claims: Claims,
    signature: Vec<u8>,
}

impl IdentityToken {
    /// Parse a compact JWT (`header.payload.signature`)
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::MalformedToken`] if the input is not exactly
    /// three non-empty base64url segments, the signature decodes to nothing,
    /// the header or payload is not a base64url-encoded JSON object, or the
    /// header lacks a non-empty string `alg`.
    pub fn parse(raw: &str) -> Result<Self> {
        let segments: Vec<&str> = raw.split('.').collect();
        if segments.len() != 3 {
            return Err(TokenError::malformed(format!(
                "expected 3 dot-separated segments, found {}",
                segments.len()
            )));
        }
        if let Some(index) = segments.iter().position(|segment| segment.is_empty()) {
            return Err(TokenError::malformed(format!("segment {} is empty", index + 1)));
        }
        if let Some(offset) = raw
            .bytes()
            .position(|c| c != b'.' && !base64url::is_segment_char(c))
        {
            return Err(TokenError::malformed(format!(
                "invalid base64url character at offset {offset}"
            )));
        }

        let (header_segment, payload_segment, signature_segment) =
            (segments[0], segments[1], segments[2]);

        let signature = base64url::decode(signature_segment)
            .map_err(|e| TokenError::malformed(format!("signature: {e}")))?;
        if signature.is_empty() {
            return Err(TokenError::malformed("signature is empty"));
        }

        let header = Header::from_map(decode_object(header_segment, "header")?)?;
        let signing_input_len = header_segment.len() + 1 + payload_segment.len();
        let claims = Claims::from(decode_object(payload_segment, "claims")?);

        debug!(
            alg = header.alg(),
            kid = header.kid(),
            claim_count = claims.len(),
            signature_len = signature.len(),
            "Parsed identity token"
        );

        Ok(Self {
            raw: raw.to_string(),
            signing_input_len,
            header,
            claims,
            signature,
        })
    }

    /// The original compact serialization
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Decoded JOSE header
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Decoded claim set
    pub fn claims(&self) -> &Claims {
        &self.claims
    }

    /// The bytes the signature was computed over: the first two segments
    /// joined by `.`, exactly as they appear in [`IdentityToken::raw`]
    pub fn signing_input(&self) -> &[u8] {
        &self.raw.as_bytes()[..self.signing_input_len]
    }

    /// Decoded signature bytes (never empty)
    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// The header's `alg`
    pub fn algorithm(&self) -> &str {
        self.header.alg()
    }

    /// The header's `kid`, if present as a string
    pub fn key_id(&self) -> Option<&str> {
        self.header.kid()
    }

    /// See [`Claims::is_expired_at`]
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.claims.is_expired_at(now)
    }

    /// See [`Claims::is_expired`]
    pub fn is_expired(&self) -> bool {
        self.claims.is_expired()
    }

    /// See [`Claims::scope_contains`]
    pub fn scope_contains(&self, identifier: &str) -> bool {
        self.claims.scope_contains(identifier)
    }
}

fn decode_object(segment: &str, part: &str) -> Result<Map<String, Value>> {
    let bytes =
        base64url::decode(segment).map_err(|e| TokenError::malformed(format!("{part}: {e}")))?;
    match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(TokenError::malformed(format!("{part} is not a JSON object"))),
        Err(e) => Err(TokenError::malformed(format!("{part} is not valid JSON: {e}"))),
    }
}

// Tokens are bearer credentials: keep the raw form and signature out of logs.
impl fmt::Debug for IdentityToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityToken")
            .field("header", &self.header)
            .field("claims", &self.claims)
            .field("raw", &"<redacted>")
            .field("signature", &format_args!("<{} bytes>", self.signature.len()))
            .finish()
    }
}

impl fmt::Display for IdentityToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IdentityToken(alg={}", self.algorithm())?;
        if let Some(kid) = self.key_id() {
            write!(f, ", kid={kid}")?;
        }
        f.write_str(")")
    }
}

impl FromStr for IdentityToken {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for IdentityToken {
    type Error = TokenError;

    fn try_from(raw: &str) -> Result<Self> {
        Self::parse(raw)
    }
}
