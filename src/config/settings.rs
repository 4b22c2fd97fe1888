//! TOML-based configuration for hydrate.
//!
//! Supports a config file (hydrate.toml) with environment variable expansion
//! in the database path.
//!
//! Example configuration:
//! ```toml
//! [engine]
//! max_per_page = 500
//! dialect = "sqlite"
//! query_timeout = "2s"
//!
//! [database]
//! path = "${HOME}/data/houses.sqlite"
//!
//! [logging]
//! level = "debug"
//! format = "json"
//!
//! [entities.users]
//! attributes = [{ name = "email", type = "string" }]
//! relations = [{ name = "houses", kind = "has_many", target = "houses" }]
//!
//! [entities.houses]
//! id_kind = "uuid"
//! attributes = [
//!   { name = "street", type = "string" },
//!   { name = "user_id", type = "integer" },
//! ]
//! relations = [{ name = "user", kind = "belongs_to", target = "users" }]
//!
//! [visibility.houses]
//! owner_column = "user_id"
//! bypass_roles = ["admin"]
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::engine::{EngineSettings, DEFAULT_MAX_PER_PAGE};
use crate::schema::{EntityDef, SchemaError, SchemaGraph};
use crate::sql::Dialect;
use crate::visibility::{RuleVisibility, VisibilityRule};

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid duration format: {0}")]
    InvalidDuration(String),

    #[error("Invalid schema: {0}")]
    Schema(#[from] SchemaError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub engine: EngineSection,

    pub database: DatabaseSettings,

    pub logging: LoggingSettings,

    /// Entity metadata keyed by entity name.
    pub entities: BTreeMap<String, EntityDef>,

    /// Visibility rules keyed by entity name.
    pub visibility: BTreeMap<String, VisibilityRule>,
}

/// `[engine]` section.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineSection {
    /// Largest page a request may ask for.
    pub max_per_page: u64,

    /// SQL dialect used for rendering.
    pub dialect: Dialect,

    /// Per-request timeout (e.g., "500ms", "5s", "1m").
    pub query_timeout: String,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            max_per_page: DEFAULT_MAX_PER_PAGE,
            dialect: Dialect::Sqlite,
            query_timeout: "5s".to_string(),
        }
    }
}

impl EngineSection {
    pub fn to_engine_settings(&self) -> Result<EngineSettings, SettingsError> {
        if self.max_per_page == 0 {
            return Err(SettingsError::InvalidConfig(
                "engine.max_per_page must be at least 1".to_string(),
            ));
        }
        Ok(EngineSettings {
            max_per_page: self.max_per_page,
            dialect: self.dialect,
            query_timeout: parse_duration(&self.query_timeout)?,
        })
    }
}

/// `[database]` section.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// SQLite database file (supports ${ENV_VAR} expansion).
    pub path: Option<String>,
}

impl DatabaseSettings {
    /// Get the database path with environment variables expanded.
    pub fn resolved_path(&self) -> Result<Option<PathBuf>, SettingsError> {
        self.path
            .as_deref()
            .map(|p| expand_env_vars(p).map(PathBuf::from))
            .transpose()
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// `[logging]` section.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter directive when `HYDRATE_LOG` is unset.
    pub level: String,

    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, SettingsError> {
        Ok(toml::from_str(content)?)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `HYDRATE_CONFIG`
    /// 2. `./hydrate.toml`
    /// 3. `~/.config/hydrate/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("HYDRATE_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("hydrate.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("hydrate").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }

    /// Build the schema graph from `[entities.*]`.
    pub fn schema(&self) -> Result<SchemaGraph, SettingsError> {
        Ok(SchemaGraph::builder().entities(&self.entities).build()?)
    }

    /// Build the rule visibility provider from `[visibility.*]`.
    pub fn visibility(&self, schema: &SchemaGraph) -> Result<RuleVisibility, SettingsError> {
        let rules = self
            .visibility
            .iter()
            .map(|(entity, rule)| (entity.clone(), rule.clone()));
        Ok(RuleVisibility::new(rules, schema)?)
    }
}

/// Parse a duration such as `250ms`, `5s`, `2m` or `1h`. A bare number is
/// seconds.
pub fn parse_duration(s: &str) -> Result<Duration, SettingsError> {
    let s = s.trim();
    let invalid = || SettingsError::InvalidDuration(s.to_string());

    let split = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    let (digits, unit) = s.split_at(split);
    let value: u64 = digits.parse().map_err(|_| invalid())?;

    match unit.trim() {
        "ms" => Ok(Duration::from_millis(value)),
        "" | "s" => Ok(Duration::from_secs(value)),
        "m" => value.checked_mul(60).map(Duration::from_secs).ok_or_else(invalid),
        "h" => value.checked_mul(3600).map(Duration::from_secs).ok_or_else(invalid),
        _ => Err(invalid()),
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        let var_name: String = if chars.next_if_eq(&'{').is_some() {
            chars.by_ref().take_while(|&ch| ch != '}').collect()
        } else {
            let mut name = String::new();
            while let Some(ch) = chars.next_if(|ch| ch.is_alphanumeric() || *ch == '_') {
                name.push(ch);
            }
            if name.is_empty() {
                // Just a lone $, keep it
                result.push('$');
                continue;
            }
            name
        };

        let value =
            env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
        result.push_str(&value);
    }

    Ok(result)
}
