//! Config and data directory resolution.

use std::path::PathBuf;

use anyhow::{Context, Result};

/// Application directory name under `~/.config` and `~/.local/share`.
const APP_DIR: &str = "cinescope";

/// Resolves the config file path.
///
/// - If `dir` is `Some`, returns `{dir}/config.toml`.
/// - Otherwise returns `~/.config/cinescope/config.toml`.
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined (when `dir` is `None`).
pub fn resolve_config_path(dir: Option<&PathBuf>) -> Result<PathBuf> {
    if let Some(d) = dir {
        return Ok(d.join("config.toml"));
    }

    Ok(home_dir()?
        .join(".config")
        .join(APP_DIR)
        .join("config.toml"))
}

/// Resolves the data directory holding the session file.
///
/// - If `dir` is `Some`, returns `dir`.
/// - Otherwise returns `~/.local/share/cinescope`.
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined (when `dir` is `None`).
pub fn resolve_data_dir(dir: Option<&PathBuf>) -> Result<PathBuf> {
    if let Some(d) = dir {
        return Ok(d.clone());
    }

    Ok(home_dir()?.join(".local").join("share").join(APP_DIR))
}

fn home_dir() -> Result<PathBuf> {
    std::env::var("HOME")
        .map(PathBuf::from)
        .context("HOME environment variable is not set")
}
