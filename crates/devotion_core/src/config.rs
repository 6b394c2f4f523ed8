//! Site configuration.
//!
//! Resolution order: built-in defaults, then an optional TOML file, then
//! `DEVOTIONS_*` environment variables.

use crate::logging::{LogLevel, LoggingError};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const ENV_DB_PATH: &str = "DEVOTIONS_DB_PATH";
pub const ENV_LOG_DIR: &str = "DEVOTIONS_LOG_DIR";
pub const ENV_LOG_LEVEL: &str = "DEVOTIONS_LOG_LEVEL";
pub const ENV_BASE_URL: &str = "DEVOTIONS_BASE_URL";

const DEFAULT_DB_FILE_NAME: &str = "devotions.sqlite3";
const DEFAULT_BASE_URL: &str = "http://localhost:5173";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config `{path}`: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config `{path}`: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid log level in config: {0}")]
    LogLevel(#[from] LoggingError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteConfig {
    pub db_path: PathBuf,
    /// Rolling log directory; file logging is off when unset.
    pub log_dir: Option<PathBuf>,
    pub log_level: LogLevel,
    /// Public origin used for share links.
    pub base_url: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_FILE_NAME),
            log_dir: None,
            log_level: LogLevel::build_default(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

/// On-disk shape; every key optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    db_path: Option<PathBuf>,
    log_dir: Option<PathBuf>,
    log_level: Option<String>,
    base_url: Option<String>,
}

impl SiteConfig {
    /// Loads defaults, `path` (when given) and process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(path) = path {
            config.apply_file(path)?;
        }
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Parses TOML text on top of the current values.
    pub fn apply_toml(&mut self, text: &str, origin: &Path) -> Result<(), ConfigError> {
        let file: ConfigFile = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;

        if let Some(db_path) = file.db_path {
            self.db_path = db_path;
        }
        if let Some(log_dir) = file.log_dir {
            self.log_dir = Some(log_dir);
        }
        if let Some(level) = file.log_level {
            self.log_level = LogLevel::parse(&level)?;
        }
        if let Some(base_url) = file.base_url {
            self.base_url = base_url;
        }
        Ok(())
    }

    /// Applies overrides from `lookup`; empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(db_path) = get(ENV_DB_PATH) {
            self.db_path = PathBuf::from(db_path);
        }
        if let Some(log_dir) = get(ENV_LOG_DIR) {
            self.log_dir = Some(PathBuf::from(log_dir));
        }
        if let Some(level) = get(ENV_LOG_LEVEL) {
            self.log_level = LogLevel::parse(&level)?;
        }
        if let Some(base_url) = get(ENV_BASE_URL) {
            self.base_url = base_url;
        }
        Ok(())
    }

    fn apply_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        self.apply_toml(&text, path)
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, SiteConfig, ENV_BASE_URL, ENV_LOG_LEVEL};
    use crate::logging::LogLevel;
    use std::collections::HashMap;
    use std::io::Write;
    use std::path::{Path, PathBuf};

    #[test]
    fn toml_values_override_defaults() {
        let mut config = SiteConfig::default();
        config
            .apply_toml(
                "db_path = \"/srv/devotions.db\"\nlog_level = \"warn\"\n",
                Path::new("site.toml"),
            )
            .unwrap();
        assert_eq!(config.db_path, PathBuf::from("/srv/devotions.db"));
        assert_eq!(config.log_level, LogLevel::Warn);
        assert_eq!(config.log_dir, None);
    }

    #[test]
    fn env_overrides_win_and_blank_values_are_ignored() {
        let env: HashMap<&str, &str> =
            HashMap::from([(ENV_BASE_URL, "https://devotions.example"), (ENV_LOG_LEVEL, " ")]);
        let mut config = SiteConfig::default();
        let before = config.log_level;
        config
            .apply_env(|key| env.get(key).map(|value| value.to_string()))
            .unwrap();
        assert_eq!(config.base_url, "https://devotions.example");
        assert_eq!(config.log_level, before);
    }

    #[test]
    fn unknown_keys_and_bad_levels_are_rejected() {
        let mut config = SiteConfig::default();
        let err = config
            .apply_toml("colour = \"blue\"", Path::new("site.toml"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));

        let err = config
            .apply_toml("log_level = \"loud\"", Path::new("site.toml"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::LogLevel(_)));
    }

    #[test]
    fn load_reads_file_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "base_url = \"https://from-file.example\"").unwrap();

        let config = SiteConfig::load(Some(file.path())).unwrap();
        // DEVOTIONS_BASE_URL in the test environment would take precedence.
        if std::env::var(ENV_BASE_URL).is_err() {
            assert_eq!(config.base_url, "https://from-file.example");
        }
    }
}
