//! Core configuration.
//!
//! Loaded from an optional TOML file, then overridden by `CORKBOARD_*`
//! environment variables. A missing file yields defaults.

use crate::import::DEFAULT_NAME_MATCH_MIN_CONFIDENCE;
use crate::logging::default_log_level;
use log::debug;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const ENV_DB_PATH: &str = "CORKBOARD_DB_PATH";
const ENV_LOG_LEVEL: &str = "CORKBOARD_LOG_LEVEL";
const ENV_LOG_DIR: &str = "CORKBOARD_LOG_DIR";
const ENV_NAME_MATCH: &str = "CORKBOARD_NAME_MATCH_MIN_CONFIDENCE";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// SQLite database file.
    pub db_path: PathBuf,
    pub log_level: String,
    /// Absolute log directory; file logging is off when unset.
    pub log_dir: Option<PathBuf>,
    /// Dice coefficient (0..=1) import matching requires.
    pub name_match_min_confidence: f64,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("corkboard.db"),
            log_level: default_log_level().to_string(),
            log_dir: None,
            name_match_min_confidence: DEFAULT_NAME_MATCH_MIN_CONFIDENCE,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    /// A field or environment override holds an unusable value.
    InvalidValue { key: &'static str, value: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to read config: {err}"),
            Self::Parse(err) => write!(f, "invalid config file: {err}"),
            Self::InvalidValue { key, value } => write!(f, "invalid value `{value}` for {key}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
            Self::InvalidValue { .. } => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::Parse(value)
    }
}

impl CoreConfig {
    /// Parses TOML text; absent keys keep their defaults.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Applies `CORKBOARD_*` overrides read through `lookup`.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_DB_PATH) {
            self.db_path = PathBuf::from(value);
        }
        if let Some(value) = lookup(ENV_LOG_LEVEL) {
            self.log_level = value;
        }
        if let Some(value) = lookup(ENV_LOG_DIR) {
            self.log_dir = Some(PathBuf::from(value)).filter(|dir| !dir.as_os_str().is_empty());
        }
        if let Some(value) = lookup(ENV_NAME_MATCH) {
            self.name_match_min_confidence =
                value.trim().parse().map_err(|_| ConfigError::InvalidValue {
                    key: ENV_NAME_MATCH,
                    value: value.clone(),
                })?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.name_match_min_confidence) {
            return Err(ConfigError::InvalidValue {
                key: "name_match_min_confidence",
                value: self.name_match_min_confidence.to_string(),
            });
        }
        if self.db_path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "db_path",
                value: String::new(),
            });
        }
        Ok(())
    }
}

/// Loads `path` (defaults when it does not exist) and applies environment
/// overrides.
pub fn load_config(path: &Path) -> Result<CoreConfig, ConfigError> {
    let config = if path.exists() {
        let content = std::fs::read_to_string(path)?;
        debug!("event=config_load module=config status=ok source=file");
        CoreConfig::from_toml(&content)?
    } else {
        debug!("event=config_load module=config status=ok source=defaults");
        CoreConfig::default()
    };
    config.with_overrides(|key| std::env::var(key).ok())
}

#[cfg(test)]
mod tests {
    use super::{load_config, ConfigError, CoreConfig};
    use std::collections::HashMap;
    use std::path::PathBuf;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.name_match_min_confidence, 0.7);
        assert_eq!(config.log_dir, None);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = CoreConfig::from_toml(
            r#"
            db_path = "/var/lib/corkboard/board.db"
            name_match_min_confidence = 0.8
            "#,
        )
        .unwrap();
        assert_eq!(config.db_path, PathBuf::from("/var/lib/corkboard/board.db"));
        assert_eq!(config.name_match_min_confidence, 0.8);
        assert_eq!(config.log_level, CoreConfig::default().log_level);
    }

    #[test]
    fn invalid_toml_is_a_parse_error() {
        let err = CoreConfig::from_toml("db_path = [").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn out_of_range_confidence_is_rejected() {
        let err = CoreConfig::from_toml("name_match_min_confidence = 1.5").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                key: "name_match_min_confidence",
                ..
            }
        ));
    }

    #[test]
    fn environment_overrides_file_values() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("CORKBOARD_DB_PATH", "/tmp/other.db"),
            ("CORKBOARD_LOG_DIR", "/tmp/corkboard-logs"),
            ("CORKBOARD_NAME_MATCH_MIN_CONFIDENCE", "0.5"),
        ]);
        let config = CoreConfig::default()
            .with_overrides(|key| env.get(key).map(|value| value.to_string()))
            .unwrap();
        assert_eq!(config.db_path, PathBuf::from("/tmp/other.db"));
        assert_eq!(config.log_dir, Some(PathBuf::from("/tmp/corkboard-logs")));
        assert_eq!(config.name_match_min_confidence, 0.5);
    }

    #[test]
    fn unparsable_override_names_the_variable() {
        let err = CoreConfig::default()
            .with_overrides(|key| {
                (key == "CORKBOARD_NAME_MATCH_MIN_CONFIDENCE").then(|| "high".to_string())
            })
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid value `high` for CORKBOARD_NAME_MATCH_MIN_CONFIDENCE"
        );
    }
}
