//! Configuration file loading.
//!
//! Loads toolgate configuration from TOML files at XDG-compliant locations.

use crate::config::types::ToolgateConfig;
use crate::error::{ToolgateError, ToolgateErrorKind};
use std::path::{Path, PathBuf};

/// Project-local config file name.
const LOCAL_CONFIG_NAME: &str = "toolgate.toml";

/// Config file name within the XDG config directory.
const XDG_CONFIG_NAME: &str = "config.toml";

/// Application name for XDG directory lookup.
const APP_NAME: &str = "toolgate";

/// Loads configuration from the default search paths.
///
/// Search order:
/// 1. `./toolgate.toml` (project-local)
/// 2. `~/.config/toolgate/config.toml` (XDG config)
///
/// Returns an empty configuration if no config file is found.
///
/// # Errors
///
/// Returns an error if a config file exists but cannot be read, parsed or
/// validated.
pub fn load() -> Result<ToolgateConfig, ToolgateError> {
    match search_paths().into_iter().find(|path| path.exists()) {
        Some(path) => {
            tracing::debug!(path = %path.display(), "Loading configuration");
            from_path(&path)
        }
        None => Ok(ToolgateConfig::default()),
    }
}

/// Loads configuration from a specific file path.
///
/// # Errors
///
/// Returns an error if:
/// - The file cannot be read
/// - The file contains invalid TOML
/// - The TOML doesn't match the expected schema
/// - A budget limit is negative
pub fn from_path(path: &Path) -> Result<ToolgateConfig, ToolgateError> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        ToolgateError::configuration(
            "config_file",
            format!("failed to read '{}': {}", path.display(), e),
        )
    })?;

    // Keep the failing field; only add which file it came from.
    from_str(&contents).map_err(|e| match e.kind {
        ToolgateErrorKind::Configuration { field, reason } => {
            ToolgateError::configuration(field, format!("{reason} (in '{}')", path.display()))
        }
        kind => ToolgateError::new(kind),
    })
}

/// Parses configuration from a TOML string.
///
/// # Errors
///
/// Returns an error if the TOML is invalid, doesn't match the schema, or
/// fails [`ToolgateConfig::validate`].
///
/// # Example
///
/// ```rust,ignore
/// use toolgate::config::from_str;
///
/// let config = from_str(r#"
/// [budget]
/// global_daily_usd = 5.0
/// "#)?;
/// assert!(config.cost_ledger().is_some());
/// ```
pub fn from_str(toml_str: &str) -> Result<ToolgateConfig, ToolgateError> {
    let config: ToolgateConfig = toml::from_str(toml_str)
        .map_err(|e| ToolgateError::configuration("config", format!("invalid TOML: {e}")))?;
    config.validate()?;
    Ok(config)
}

/// Returns the paths that would be searched for configuration files.
///
/// This is useful for diagnostics and user guidance.
#[must_use]
pub fn search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(LOCAL_CONFIG_NAME)];
    if let Some(dir) = xdg_config_dir() {
        paths.push(dir.join(XDG_CONFIG_NAME));
    }
    paths
}

/// Returns the XDG config directory for toolgate.
///
/// This is `~/.config/toolgate` on most systems.
#[must_use]
pub fn xdg_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join(APP_NAME))
}
