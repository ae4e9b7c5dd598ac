//! Configuration loading.
//!
//! Resolves the configuration path (default XDG location or the directory
//! given with `--config`), creates a default file on first run and parses and
//! validates existing files.

use anyhow::{Context, Result, bail};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use super::Config;
use super::builder::create_default_config;
use super::validation::validate_config;
use crate::constants::{CONFIG_DIR_NAME, CONFIG_FILE_NAME};

/// Configuration directory chosen on the command line, set once at startup.
static CONFIG_DIR: OnceLock<Option<PathBuf>> = OnceLock::new();

/// Set the configuration directory for the current process.
///
/// Can only be called once; later calls return an error.
pub fn set_config_dir(dir: Option<String>) -> Result<()> {
    CONFIG_DIR
        .set(dir.map(PathBuf::from))
        .map_err(|_| anyhow::anyhow!("Configuration directory already set"))
}

/// The directory given with `--config`, if any.
pub fn get_custom_config_dir() -> Option<PathBuf> {
    CONFIG_DIR.get().and_then(|d| d.clone())
}

/// Path of the configuration file.
pub fn get_config_path() -> Result<PathBuf> {
    if let Some(custom_dir) = get_custom_config_dir() {
        return Ok(custom_dir.join(CONFIG_FILE_NAME));
    }

    let config_dir = dirs::config_dir().context("Could not determine config directory")?;
    Ok(config_dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Load the configuration from its default location.
///
/// A missing file is replaced by a commented default, and the call fails so
/// the daemon does not start driving shutters with placeholder devices.
pub fn load() -> Result<(Config, PathBuf)> {
    let config_path = get_config_path()?;

    if !config_path.exists() {
        create_default_config(&config_path)
            .context("Failed to create default configuration")?;
        bail!(
            "No configuration found; a default was written to {}. Edit it and start again.",
            config_path.display()
        );
    }

    let config = load_from_path(&config_path)?;
    Ok((config, config_path))
}

/// Load and validate the configuration at `path`.
///
/// Never creates a file.
pub fn load_from_path(path: &Path) -> Result<Config> {
    if !path.exists() {
        bail!("Configuration file not found: {}", path.display());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {}", path.display()))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config from {}", path.display()))?;

    validate_config(&config)
        .with_context(|| format!("Invalid configuration in {}", path.display()))?;

    Ok(config)
}
