//! Verification policy loading
//!
//! Defaults, then an optional file, then `IDTOKEN_*` environment variables.

use std::path::Path;

use anyhow::{Context, bail};
use config::{Config, Environment, File, FileFormat};
use idtoken::VerifierConfig;
use tracing::debug;

/// Prefix for environment overrides (`IDTOKEN_KEY_MATCHING`, ...)
pub const ENV_PREFIX: &str = "IDTOKEN";

/// Load the verifier policy from `path` (if given) and the process environment
///
/// # Errors
///
/// Fails if the file is missing, has an unknown extension, or any source
/// holds a value that does not fit [`VerifierConfig`].
pub fn load(path: Option<&Path>) -> anyhow::Result<VerifierConfig> {
    load_with_env(path, environment(ENV_PREFIX))
}

/// Environment source for `prefix`
///
/// Top-level keys follow a single `_` (`IDTOKEN_KEY_MATCHING`); `__`
/// separates nested keys. `allowed_algorithms` accepts a comma-separated
/// list.
pub fn environment(prefix: &str) -> Environment {
    Environment::with_prefix(prefix)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("allowed_algorithms")
}

/// Load the verifier policy with an explicit environment source
///
/// # Errors
///
/// See [`load`].
pub fn load_with_env(path: Option<&Path>, env: Environment) -> anyhow::Result<VerifierConfig> {
    let mut builder = Config::builder();

    if let Some(path) = path {
        if !path.exists() {
            bail!("Configuration file not found: {}", path.display());
        }
        let format = match path.extension().and_then(|s| s.to_str()) {
            Some("toml") => FileFormat::Toml,
            Some("yaml") | Some("yml") => FileFormat::Yaml,
            Some("json") => FileFormat::Json,
            _ => bail!(
                "Unsupported configuration format (expected .toml, .yaml or .json): {}",
                path.display()
            ),
        };
        let name = path
            .to_str()
            .with_context(|| format!("Configuration path is not UTF-8: {}", path.display()))?;
        builder = builder.add_source(File::new(name, format));
    }

    let config: VerifierConfig = builder
        .add_source(env)
        .build()
        .context("Failed to read configuration")?
        .try_deserialize()
        .context("Invalid verification policy")?;

    debug!(
        key_matching = ?config.key_matching,
        allowed_algorithms = ?config.allowed_algorithms,
        min_rsa_key_bits = config.min_rsa_key_bits,
        "Loaded verification policy"
    );
    Ok(config)
}
