//! # idtoken - OpenID Connect identity token verification
//!
//! Parses compact JWTs, selects a signing key from a caller-supplied JSON Web
//! Key Set, verifies RSA PKCS#1 v1.5 signatures (RS256, RS384, RS512) and
//! answers claim queries such as expiry and scope membership.
//!
//! Everything here is synchronous and free of I/O. Fetching discovery
//! documents and JWKS, caching keys and deciding what a failure means for a
//! request are the caller's business.
//!
//! ## Architecture
//!
//! - [`base64url`] - URL-safe base64 codec shared by token segments and JWKs
//! - [`token`] - [`IdentityToken`] parsing and structural validation
//! - [`claims`] - read-only [`Header`] and [`Claims`] views with typed accessors
//! - [`jwk`] - [`Jwk`] / [`JwkSet`] and key selection
//! - [`verify`] - [`Verifier`] and [`SignatureAlgorithm`]
//! - [`config`] - [`VerifierConfig`] verification policy
//! - [`error`] - [`TokenError`]
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use idtoken::{IdentityToken, JwkSet};
//!
//! # fn run(raw: &str, jwks_json: &str) -> idtoken::Result<()> {
//! let token = IdentityToken::parse(raw)?;
//! let keys = JwkSet::from_json(jwks_json)?;
//!
//! if idtoken::verify(&token, &keys)?
//!     && !token.is_expired()
//!     && token.scope_contains("profile")
//! {
//!     println!("welcome {:?}", token.claims().subject()?);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Key selection
//!
//! [`KeyMatching::Strict`] (the default) only hands out an RSA key whose
//! declared `alg` and `use` fit the token and whose `kid` equals the token's
//! `kid` when one is given. [`KeyMatching::Compatible`] reproduces the loose
//! legacy rule, which can pick a kid-less or differently-intended key; enable
//! it only when an existing deployment depends on it.

pub mod base64url;
pub mod claims;
pub mod config;
pub mod error;
pub mod jwk;
pub mod token;
pub mod verify;

pub use claims::{Claims, Header};
pub use config::{KeyMatching, VerifierConfig};
pub use error::{Result, TokenError};
pub use jwk::{Jwk, JwkSet, resolve, resolve_with};
pub use token::IdentityToken;
pub use verify::{SignatureAlgorithm, Verifier, verify};
