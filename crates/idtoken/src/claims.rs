//! Read-only views over the decoded JOSE header and claim set
//!
//! Both are open-ended JSON objects. The views hand out shared references
//! only, so a token's contents cannot change after its signature has been
//! checked. Typed accessors return `Ok(None)` for an absent member and
//! [`TokenError::ClaimType`] when the member exists with the wrong JSON type;
//! nothing is coerced.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::{Result, TokenError};

/// Decoded JOSE header (first token segment)
///
/// Construction guarantees `alg` is a non-empty string.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Header {
    fields: Map<String, Value>,
}

impl Header {
    /// Wrap a decoded header object, requiring a non-empty string `alg`
    pub(crate) fn from_map(fields: Map<String, Value>) -> Result<Self> {
        match fields.get("alg") {
            Some(Value::String(alg)) if !alg.is_empty() => Ok(Self { fields }),
            Some(Value::String(_)) => Err(TokenError::malformed("header 'alg' is empty")),
            Some(_) => Err(TokenError::malformed("header 'alg' is not a string")),
            None => Err(TokenError::malformed("header is missing 'alg'")),
        }
    }

    /// Signing algorithm named by the header
    pub fn alg(&self) -> &str {
        // Checked in from_map
        self.fields
            .get("alg")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    /// Key ID, when present as a string
    pub fn kid(&self) -> Option<&str> {
        self.fields.get("kid").and_then(Value::as_str)
    }

    /// Token type (`typ`), when present as a string
    pub fn typ(&self) -> Option<&str> {
        self.fields.get("typ").and_then(Value::as_str)
    }

    /// Raw header member
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// The whole header object
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.fields
    }
}

/// Decoded claim set (second token segment)
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Claims {
    fields: Map<String, Value>,
}

impl From<Map<String, Value>> for Claims {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}

impl Claims {
    /// Raw claim value
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Whether the claim is present (with any value, including `null`)
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Iterate over all claims in document order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of claims
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the claim set is empty
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The whole claim object
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Owned copy of the claim set as a JSON object value
    pub fn to_value(&self) -> Value {
        Value::Object(self.fields.clone())
    }

    /// String claim
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::ClaimType`] if the claim is not a string.
    pub fn string(&self, name: &str) -> Result<Option<&str>> {
        match self.fields.get(name) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(_) => Err(TokenError::claim_type(name, "a string")),
        }
    }

    /// Numeric claim as `f64`
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::ClaimType`] if the claim is not a JSON number.
    pub fn number(&self, name: &str) -> Result<Option<f64>> {
        match self.fields.get(name) {
            None => Ok(None),
            Some(Value::Number(n)) => n
                .as_f64()
                .map(Some)
                .ok_or_else(|| TokenError::claim_type(name, "a finite number")),
            Some(_) => Err(TokenError::claim_type(name, "a number")),
        }
    }

    /// Integral claim as `i64`
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::ClaimType`] if the claim is not an integer that
    /// fits in `i64`.
    pub fn integer(&self, name: &str) -> Result<Option<i64>> {
        match self.fields.get(name) {
            None => Ok(None),
            Some(Value::Number(n)) => n
                .as_i64()
                .map(Some)
                .ok_or_else(|| TokenError::claim_type(name, "a 64-bit integer")),
            Some(_) => Err(TokenError::claim_type(name, "an integer")),
        }
    }

    /// NumericDate claim (RFC 7519 §2: seconds since the Unix epoch) as a UTC
    /// timestamp; fractional seconds are kept to millisecond precision
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::ClaimType`] if the claim is not a number or is
    /// outside the representable date range.
    pub fn timestamp(&self, name: &str) -> Result<Option<DateTime<Utc>>> {
        let Some(secs) = self.number(name)? else {
            return Ok(None);
        };
        let millis = (secs * 1000.0).floor();
        if !millis.is_finite() || millis.abs() > i64::MAX as f64 {
            return Err(TokenError::claim_type(name, "a representable timestamp"));
        }
        DateTime::from_timestamp_millis(millis as i64)
            .map(Some)
            .ok_or_else(|| TokenError::claim_type(name, "a representable timestamp"))
    }

    /// Subject (`sub`)
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::ClaimType`] if `sub` is not a string.
    pub fn subject(&self) -> Result<Option<&str>> {
        self.string("sub")
    }

    /// Issuer (`iss`)
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::ClaimType`] if `iss` is not a string.
    pub fn issuer(&self) -> Result<Option<&str>> {
        self.string("iss")
    }

    /// Audience (`aud`), which RFC 7519 allows as a single string or an
    /// array of strings; absent yields an empty list
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::ClaimType`] for any other shape.
    pub fn audience(&self) -> Result<Vec<&str>> {
        match self.fields.get("aud") {
            None => Ok(Vec::new()),
            Some(Value::String(aud)) => Ok(vec![aud.as_str()]),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str()
                        .ok_or_else(|| TokenError::claim_type("aud", "a string or array of strings"))
                })
                .collect(),
            Some(_) => Err(TokenError::claim_type("aud", "a string or array of strings")),
        }
    }

    /// Expiration time (`exp`)
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::ClaimType`] if `exp` is not a usable NumericDate.
    pub fn expires_at(&self) -> Result<Option<DateTime<Utc>>> {
        self.timestamp("exp")
    }

    /// Issued-at time (`iat`)
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::ClaimType`] if `iat` is not a usable NumericDate.
    pub fn issued_at(&self) -> Result<Option<DateTime<Utc>>> {
        self.timestamp("iat")
    }

    /// Not-before time (`nbf`)
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::ClaimType`] if `nbf` is not a usable NumericDate.
    pub fn not_before(&self) -> Result<Option<DateTime<Utc>>> {
        self.timestamp("nbf")
    }

    /// Whether the token is expired at `now` (Unix seconds)
    ///
    /// True only when a numeric `exp` exists and `now >= exp`. A token
    /// without `exp` never expires. A non-numeric `exp` is treated as absent
    /// here; use [`Claims::expires_at`] to surface it as an error.
    pub fn is_expired_at(&self, now: i64) -> bool {
        match self.fields.get("exp") {
            None => false,
            Some(Value::Number(exp)) => match exp.as_i64() {
                Some(exp) => now >= exp,
                None => exp.as_f64().is_some_and(|exp| now as f64 >= exp),
            },
            Some(other) => {
                warn!(exp_type = json_type_name(other), "Ignoring non-numeric 'exp' claim");
                false
            }
        }
    }

    /// Whether the token is expired according to the system clock
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now().timestamp())
    }

    /// Entries of the comma-separated `scope` claim, trimmed, empties skipped
    ///
    /// A missing or non-string `scope` yields nothing.
    pub fn scopes(&self) -> impl Iterator<Item = &str> {
        self.fields
            .get("scope")
            .and_then(Value::as_str)
            .into_iter()
            .flat_map(|scope| scope.split(','))
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
    }

    /// Whether the comma-separated `scope` claim lists `identifier`
    /// (case-sensitive, surrounding whitespace ignored)
    pub fn scope_contains(&self, identifier: &str) -> bool {
        self.scopes().any(|entry| entry == identifier)
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
