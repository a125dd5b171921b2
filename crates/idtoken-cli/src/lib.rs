//! # idtoken CLI
//!
//! Command-line front end for the [`idtoken`] crate.
//!
//! ## Usage
//!
//! ```bash
//! # Show the header and claims of a token
//! idtoken inspect --json eyJhbGciOiJSUzI1NiJ9.eyJzdWIiOiJhbGljZSJ9.c2ln
//!
//! # Verify signature, expiry and scopes; exit code 2 if the token is rejected
//! idtoken verify --jwks jwks.json --scope openid --scope email - < token.txt
//!
//! # Loosen key selection for an older identity provider
//! IDTOKEN_KEY_MATCHING=compatible idtoken verify --jwks jwks.json "$TOKEN"
//! ```
//!
//! Exit codes: `0` accepted, `1` error (unreadable input, malformed token,
//! no usable key), `2` token rejected.

pub mod cli;
pub mod commands;
pub mod config;
pub mod output;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub use cli::{Cli, Commands};
pub use commands::{Outcome, VerificationReport};

/// Install the stderr log subscriber; `RUST_LOG` wins over `verbose`
pub fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "idtoken=debug,idtoken_cli=debug"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    // Ignore the error from a second initialization
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
}

/// Run the CLI application
///
/// # Errors
///
/// Any failure that prevents a verdict: unreadable input, malformed token,
/// bad configuration, unusable key set.
pub fn run() -> anyhow::Result<Outcome> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    execute(&cli)
}

/// Dispatch a parsed command line and print its result
///
/// # Errors
///
/// See [`run`].
pub fn execute(cli: &Cli) -> anyhow::Result<Outcome> {
    let (report, outcome) = match &cli.command {
        Commands::Inspect(args) => commands::inspect(args)?,
        Commands::Verify(args) => {
            let policy = config::load(cli.config.as_deref())?;
            commands::verify(args, policy)?
        }
    };
    output::display(&report, cli.json);
    Ok(outcome)
}
