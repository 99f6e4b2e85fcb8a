//! TOML Configuration Management
//!
//! Loads pipeline settings from an explicit path or the platform config
//! directory, then applies environment overrides for credentials and model
//! selection.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::models::settings::PipelineSettings;
use crate::utils::error::{AppError, AppResult};
use crate::utils::paths::{ensure_dir, settings_path};

pub const ENV_API_KEY: &str = "ADS_COPILOT_API_KEY";
pub const ENV_MODEL: &str = "ADS_COPILOT_MODEL";
pub const ENV_BASE_URL: &str = "ADS_COPILOT_BASE_URL";

/// Configuration service for pipeline settings
#[derive(Debug)]
pub struct ConfigService {
    config_path: PathBuf,
    settings: PipelineSettings,
}

impl ConfigService {
    /// Load settings.
    ///
    /// An explicit path must exist. Without one, the default settings file is
    /// read when present and built-in defaults are used otherwise.
    pub fn load(explicit: Option<&Path>) -> AppResult<Self> {
        let (config_path, mut settings) = match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(AppError::not_found(format!(
                        "settings file {}",
                        path.display()
                    )));
                }
                (path.to_path_buf(), Self::load_from_file(path)?)
            }
            None => {
                let path = settings_path()?;
                let settings = if path.exists() {
                    Self::load_from_file(&path)?
                } else {
                    debug!(path = %path.display(), "config: no settings file, using defaults");
                    PipelineSettings::default()
                };
                (path, settings)
            }
        };

        apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
        settings.validate().map_err(AppError::validation)?;

        info!(
            path = %config_path.display(),
            model = %settings.llm.model,
            api_key_set = settings.llm.api_key.is_some(),
            "config: settings loaded"
        );

        Ok(Self {
            config_path,
            settings,
        })
    }

    /// Load configuration from a file
    fn load_from_file(path: &Path) -> AppResult<PipelineSettings> {
        let content = fs::read_to_string(path)?;
        let settings: PipelineSettings = toml::from_str(&content)?;
        settings.validate().map_err(AppError::validation)?;
        Ok(settings)
    }

    /// Save settings to a file. The API key is never written.
    pub fn save_to_file(path: &Path, settings: &PipelineSettings) -> AppResult<()> {
        settings.validate().map_err(AppError::validation)?;
        let content = toml::to_string_pretty(settings)
            .map_err(|e| AppError::config(format!("failed to encode settings: {e}")))?;
        if let Some(parent) = path.parent() {
            ensure_dir(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }

    /// Get the current settings
    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }
}

/// Apply `ADS_COPILOT_*` overrides. Empty values are ignored.
pub fn apply_env_overrides<F>(settings: &mut PipelineSettings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(key) = non_empty(ENV_API_KEY) {
        settings.llm.api_key = Some(key);
    }
    if let Some(model) = non_empty(ENV_MODEL) {
        settings.llm.model = model;
    }
    if let Some(url) = non_empty(ENV_BASE_URL) {
        settings.llm.base_url = Some(url);
    }
}
