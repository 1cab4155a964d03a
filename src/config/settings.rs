//! TOML-based configuration for strata.
//!
//! Supports a config file (strata.toml) next to the model.
//!
//! Example configuration:
//! ```toml
//! [model]
//! default_namespace = "Acme.Sales"
//!
//! [resolution]
//! memoize_complete = true
//! narrow_entity_references = true
//!
//! [logging]
//! level = "debug"
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::semantic::ResolveOptions;

/// File name looked up by [`Settings::discover`].
pub const CONFIG_FILE_NAME: &str = "strata.toml";

/// Environment variable pointing at an explicit config file.
pub const CONFIG_ENV_VAR: &str = "STRATA_CONFIG";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Model defaults.
    pub model: ModelSettings,

    /// Resolution behaviour.
    pub resolution: ResolutionSettings,

    /// Logging configuration.
    pub logging: LoggingSettings,
}

/// Model defaults.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ModelSettings {
    /// Namespace used when the model declares none.
    pub default_namespace: Option<String>,
}

/// Resolution behaviour.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ResolutionSettings {
    /// Memoize complete entities inside a built schema.
    pub memoize_complete: bool,

    /// Re-point inherited entity references at a derived entity.
    pub narrow_entity_references: bool,
}

impl Default for ResolutionSettings {
    fn default() -> Self {
        Self {
            memoize_complete: true,
            narrow_entity_references: true,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter level when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        content.parse()
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `STRATA_CONFIG`
    /// 2. `<dir>/strata.toml`
    ///
    /// Returns defaults if neither exists.
    pub fn discover<P: AsRef<Path>>(dir: P) -> Result<Self, SettingsError> {
        if let Ok(path) = env::var(CONFIG_ENV_VAR) {
            return Self::load(&path);
        }

        let local_config = dir.as_ref().join(CONFIG_FILE_NAME);
        if local_config.exists() {
            return Self::load(&local_config);
        }

        Ok(Settings::default())
    }

    /// Options handed to the resolution engine.
    pub fn resolve_options(&self) -> ResolveOptions {
        ResolveOptions {
            narrow_entity_references: self.resolution.narrow_entity_references,
        }
    }

    fn validate(&self) -> Result<(), SettingsError> {
        let level = self.logging.level.to_ascii_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(SettingsError::InvalidConfig(format!(
                "unknown logging level '{}', expected one of {}",
                self.logging.level,
                LOG_LEVELS.join(", ")
            )));
        }
        if self
            .model
            .default_namespace
            .as_deref()
            .is_some_and(|ns| ns.trim().is_empty())
        {
            return Err(SettingsError::InvalidConfig(
                "default_namespace must not be blank".to_string(),
            ));
        }
        Ok(())
    }
}

impl FromStr for Settings {
    type Err = SettingsError;

    fn from_str(content: &str) -> Result<Self, Self::Err> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }
}
