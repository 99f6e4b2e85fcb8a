//! Cross-Platform Path Utilities
//!
//! Resolves where the settings file lives. The platform config directory
//! (`~/.config/ads-copilot` on Linux) is preferred, with `~/.ads-copilot` as
//! the fallback when no config directory is known.

use std::path::{Path, PathBuf};

use crate::utils::error::{AppError, AppResult};

const APP_DIR_NAME: &str = "ads-copilot";
const SETTINGS_FILE_NAME: &str = "settings.toml";

/// Get the user's home directory
pub fn home_dir() -> AppResult<PathBuf> {
    dirs::home_dir().ok_or_else(|| AppError::config("Could not determine home directory"))
}

/// Directory holding the settings file.
pub fn app_config_dir() -> AppResult<PathBuf> {
    match dirs::config_dir() {
        Some(dir) => Ok(dir.join(APP_DIR_NAME)),
        None => Ok(home_dir()?.join(format!(".{APP_DIR_NAME}"))),
    }
}

/// Default settings file path.
pub fn settings_path() -> AppResult<PathBuf> {
    Ok(app_config_dir()?.join(SETTINGS_FILE_NAME))
}

/// Ensure a directory exists, creating it if necessary
pub fn ensure_dir(path: &Path) -> AppResult<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}
