//! Command implementations

use std::io::Read;
use std::path::Path;

use anyhow::{Context, bail};
use chrono::Utc;
use idtoken::{IdentityToken, JwkSet, Verifier, VerifierConfig};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::cli::{InspectArgs, VerifyArgs};

/// Result of a command that ran to completion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Token accepted (or merely inspected)
    Accepted,
    /// Token well-formed but rejected: bad signature, expired, or a scope missing
    Rejected,
}

impl Outcome {
    /// Process exit code for this outcome
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Accepted => 0,
            Self::Rejected => 2,
        }
    }
}

/// Everything `verify` decided about a token
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationReport {
    pub valid: bool,
    pub signature_valid: bool,
    pub expired: bool,
    pub checked_at: i64,
    pub algorithm: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
    pub missing_scopes: Vec<String>,
}

impl VerificationReport {
    /// Combine a signature result with the expiry and scope checks at `now`
    pub fn new(
        token: &IdentityToken,
        signature_valid: bool,
        now: i64,
        required_scopes: &[String],
    ) -> Self {
        let claims = token.claims();
        let expired = token.is_expired_at(now);
        let missing_scopes: Vec<String> = required_scopes
            .iter()
            .filter(|scope| !token.scope_contains(scope))
            .cloned()
            .collect();

        Self {
            valid: signature_valid && !expired && missing_scopes.is_empty(),
            signature_valid,
            expired,
            checked_at: now,
            algorithm: token.algorithm().to_string(),
            key_id: token.key_id().map(str::to_string),
            subject: claims.subject().ok().flatten().map(str::to_string),
            expires_at: claims
                .expires_at()
                .ok()
                .flatten()
                .map(|exp| exp.to_rfc3339()),
            missing_scopes,
        }
    }

    pub fn outcome(&self) -> Outcome {
        if self.valid {
            Outcome::Accepted
        } else {
            Outcome::Rejected
        }
    }
}

/// Read the token argument; `-` means standard input
///
/// # Errors
///
/// Fails if stdin cannot be read or the token is blank.
pub fn read_token(arg: &str) -> anyhow::Result<String> {
    let token = if arg == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read token from stdin")?;
        buf
    } else {
        arg.to_string()
    };

    let token = token.trim();
    if token.is_empty() {
        bail!("No token given");
    }
    Ok(token.to_string())
}

/// Decoded header and claims, unverified
pub fn inspect_report(token: &IdentityToken) -> Value {
    json!({
        "header": token.header(),
        "claims": token.claims(),
        "signature_bytes": token.signature().len(),
    })
}

/// `idtoken inspect`
///
/// # Errors
///
/// Fails if the token cannot be read or parsed.
pub fn inspect(args: &InspectArgs) -> anyhow::Result<(Value, Outcome)> {
    let raw = read_token(&args.token)?;
    let token = IdentityToken::parse(&raw).context("Failed to parse token")?;
    Ok((inspect_report(&token), Outcome::Accepted))
}

/// Load a JWK Set document from disk
///
/// # Errors
///
/// Fails if the file cannot be read or is not a JWKS document.
pub fn load_jwks(path: &Path) -> anyhow::Result<JwkSet> {
    let document = std::fs::read(path)
        .with_context(|| format!("Failed to read JWKS file {}", path.display()))?;
    let keys = JwkSet::from_slice(&document)
        .with_context(|| format!("Failed to load JWKS file {}", path.display()))?;
    debug!(path = %path.display(), keys = keys.len(), "Loaded JWKS");
    Ok(keys)
}

/// `idtoken verify`
///
/// A rejected token is `Ok` with [`Outcome::Rejected`].
///
/// # Errors
///
/// Fails on unreadable input, a malformed token, an unsupported algorithm or
/// an unusable key set.
pub fn verify(args: &VerifyArgs, config: VerifierConfig) -> anyhow::Result<(Value, Outcome)> {
    let raw = read_token(&args.token)?;
    let token = IdentityToken::parse(&raw).context("Failed to parse token")?;
    let keys = load_jwks(&args.jwks)?;

    let signature_valid = Verifier::new(config)
        .verify(&token, &keys)
        .context("Verification failed")?;
    let now = args.now.unwrap_or_else(|| Utc::now().timestamp());
    let report = VerificationReport::new(&token, signature_valid, now, &args.scopes);

    info!(
        valid = report.valid,
        signature_valid = report.signature_valid,
        expired = report.expired,
        missing_scopes = report.missing_scopes.len(),
        "Token checked"
    );
    let outcome = report.outcome();
    Ok((serde_json::to_value(report)?, outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use idtoken::base64url;
    use pretty_assertions::assert_eq;

    fn token(claims: Value) -> IdentityToken {
        let raw = format!(
            "{}.{}.{}",
            base64url::encode(br#"{"alg":"RS256","kid":"k1"}"#),
            base64url::encode(serde_json::to_vec(&claims).unwrap()),
            base64url::encode(b"sig"),
        );
        IdentityToken::parse(&raw).unwrap()
    }

    #[test]
    fn test_report_accepts_valid_token() {
        let token = token(json!({"sub": "alice", "exp": 2000, "scope": "openid, email"}));
        let report = VerificationReport::new(&token, true, 1000, &["openid".to_string()]);

        assert_eq!(
            report,
            VerificationReport {
                valid: true,
                signature_valid: true,
                expired: false,
                checked_at: 1000,
                algorithm: "RS256".to_string(),
                key_id: Some("k1".to_string()),
                subject: Some("alice".to_string()),
                expires_at: Some("1970-01-01T00:33:20+00:00".to_string()),
                missing_scopes: Vec::new(),
            }
        );
        assert_eq!(report.outcome(), Outcome::Accepted);
        assert_eq!(report.outcome().exit_code(), 0);
    }

    #[test]
    fn test_report_rejections() {
        let token = token(json!({"exp": 1000, "scope": "read"}));

        let bad_signature = VerificationReport::new(&token, false, 10, &[]);
        assert!(!bad_signature.valid);
        assert_eq!(bad_signature.outcome().exit_code(), 2);

        let expired = VerificationReport::new(&token, true, 1000, &[]);
        assert!(expired.expired);
        assert!(!expired.valid);

        let missing = VerificationReport::new(
            &token,
            true,
            10,
            &["read".to_string(), "write".to_string()],
        );
        assert_eq!(missing.missing_scopes, vec!["write"]);
        assert_eq!(missing.outcome(), Outcome::Rejected);
    }

    #[test]
    fn test_report_tolerates_odd_claim_types() {
        let token = token(json!({"sub": 7, "exp": "soon"}));
        let report = VerificationReport::new(&token, true, 10, &[]);
        assert!(report.valid);
        assert_eq!(report.subject, None);
        assert_eq!(report.expires_at, None);
    }

    #[test]
    fn test_inspect_report() {
        let report = inspect_report(&token(json!({"sub": "alice"})));
        assert_eq!(report["header"]["kid"], "k1");
        assert_eq!(report["claims"]["sub"], "alice");
        assert_eq!(report["signature_bytes"], 3);
    }

    #[test]
    fn test_read_token_trims() {
        assert_eq!(read_token("  a.b.c\n").unwrap(), "a.b.c");
        assert!(read_token("   ").is_err());
    }

    #[test]
    fn test_load_jwks_errors() {
        let dir = tempfile::tempdir().unwrap();

        let missing = dir.path().join("missing.json");
        assert!(load_jwks(&missing).is_err());

        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "{\"keys\": 5}").unwrap();
        let err = load_jwks(&broken).unwrap_err();
        assert!(format!("{err:#}").contains("Invalid JWKS document"));

        let empty = dir.path().join("empty.json");
        std::fs::write(&empty, "{\"keys\": []}").unwrap();
        assert!(load_jwks(&empty).unwrap().is_empty());
    }

    #[test]
    fn test_verify_reports_key_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let jwks = dir.path().join("jwks.json");
        std::fs::write(&jwks, "{\"keys\": []}").unwrap();

        let raw = format!(
            "{}.{}.{}",
            base64url::encode(br#"{"alg":"RS256"}"#),
            base64url::encode(br#"{"sub":"alice"}"#),
            base64url::encode(b"sig"),
        );
        let args = VerifyArgs {
            jwks,
            scopes: Vec::new(),
            now: Some(0),
            token: raw,
        };
        let err = verify(&args, VerifierConfig::default()).unwrap_err();
        assert!(format!("{err:#}").contains("Key not found"));
    }
}
