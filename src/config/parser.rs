use crate::config::types::Config;
use crate::config::validation::{validate, validate_seed};
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use mailsweep::config::load_config;
///
/// let config = load_config(Path::new("mailsweep.toml")).unwrap();
/// println!("Max pages per site: {}", config.crawler.max_pages);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration from a TOML string
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so two batch runs can be tied to the same settings.
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

/// Loads the seed list from a text file
///
/// One URL per line. Blank lines and lines starting with `#` are skipped,
/// trailing slashes are stripped and duplicates are dropped (first one wins,
/// order is kept). Only a read failure is an error; see [`parse_seeds`].
pub fn load_seeds(path: &Path) -> Result<Vec<String>, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    Ok(parse_seeds(&content))
}

/// Parses a seed list from text; see [`load_seeds`]
///
/// Malformed lines are logged and kept. The batch reports them as `Failed`
/// sites so one bad line never costs the rest of the list.
pub fn parse_seeds(content: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut seeds = Vec::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let seed = line.trim_end_matches('/');
        if let Err(e) = validate_seed(seed) {
            tracing::warn!("Seed will fail: {}", e);
        }

        if seen.insert(seed.to_string()) {
            seeds.push(seed.to_string());
        }
    }

    seeds
}
