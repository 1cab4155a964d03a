//! Configuration module for strata.
//!
//! Handles the optional `strata.toml` settings file.

mod settings;

pub use settings::{
    LoggingSettings, ModelSettings, ResolutionSettings, Settings, SettingsError, CONFIG_ENV_VAR,
    CONFIG_FILE_NAME,
};
