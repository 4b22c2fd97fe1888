//! Configuration module for hydrate.
//!
//! Handles the TOML settings file: engine tunables, database location,
//! logging, entity metadata and visibility rules.

mod settings;

pub use settings::{
    expand_env_vars, parse_duration, DatabaseSettings, EngineSection, LogFormat, LoggingSettings,
    Settings, SettingsError,
};
