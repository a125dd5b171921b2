//! CLI argument parsing

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Main CLI application structure
#[derive(Parser, Debug)]
#[command(
    name = "idtoken",
    version,
    about = "Inspect and verify OpenID Connect identity tokens",
    long_about = "Parses compact RS256/RS384/RS512 identity tokens, verifies their signatures\n\
                  against a JWK Set document, and checks expiry and scopes.\n\n\
                  Pass '-' as TOKEN to read the token from standard input so it does not\n\
                  end up in shell history.\n\n\
                  Verification policy is read from --config (TOML, YAML or JSON) and can be\n\
                  overridden with IDTOKEN_* environment variables, e.g.\n\
                  IDTOKEN_KEY_MATCHING=compatible or IDTOKEN_MIN_RSA_KEY_BITS=3072."
)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,

    /// Verification policy file
    #[arg(long, short = 'c', global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable debug logging on stderr
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub json: bool,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Decode a token and print its header and claims without verifying it
    Inspect(InspectArgs),

    /// Verify a token's signature, expiry and scopes
    Verify(VerifyArgs),
}

/// Arguments for `inspect`
#[derive(Args, Debug, Clone)]
pub struct InspectArgs {
    /// Compact token, or '-' to read it from stdin
    #[arg(value_name = "TOKEN")]
    pub token: String,
}

/// Arguments for `verify`
#[derive(Args, Debug, Clone)]
pub struct VerifyArgs {
    /// JWK Set document to verify against
    #[arg(long, value_name = "FILE")]
    pub jwks: PathBuf,

    /// Scope the token must grant (repeatable)
    #[arg(long = "scope", value_name = "ID")]
    pub scopes: Vec<String>,

    /// Evaluate expiry at this Unix time instead of the system clock
    #[arg(long, value_name = "SECS")]
    pub now: Option<i64>,

    /// Compact token, or '-' to read it from stdin
    #[arg(value_name = "TOKEN")]
    pub token: String,
}
