use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;
use crate::scheduler::SchedulerConfig;
use crate::storage::Backend;

/// Runtime settings, read from `config.toml` with environment overrides.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    /// Path of the task database.
    pub database: Option<PathBuf>,
    /// Storage backend. Inferred from the database extension when unset.
    pub backend: Option<Backend>,
    /// `tracing` filter used when `RUST_LOG` is not set.
    pub log_filter: Option<String>,
    pub scheduler: SchedulerConfig,
}

impl Config {
    /// Loads the config file (if any) and applies environment overrides.
    ///
    /// The file is `TASKSLOT_CONFIG` if set, else
    /// `~/.config/taskslot/config.toml` (on Linux). A missing file yields
    /// the defaults.
    pub fn load() -> Result<Config, ConfigError> {
        let path = std::env::var("TASKSLOT_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_config_path());
        let mut config = if path.exists() {
            Config::from_file(&path)?
        } else {
            Config::default()
        };
        if let Ok(db) = std::env::var("TASKSLOT_DB") {
            config.database = Some(PathBuf::from(db));
            config.backend = None;
        }
        config.scheduler.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Config, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Config::from_toml(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn from_toml(raw: &str) -> Result<Config, toml::de::Error> {
        toml::from_str(raw)
    }

    /// The database path, or the default location.
    pub fn database_path(&self) -> PathBuf {
        self.database.clone().unwrap_or_else(default_db_path)
    }

    /// The configured backend, or the one implied by the database path.
    pub fn backend(&self) -> Backend {
        self.backend
            .unwrap_or_else(|| Backend::for_path(&self.database_path()))
    }
}

/// Returns the default path of the config file.
fn default_config_path() -> PathBuf {
    let mut p = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    p.push("taskslot");
    p.push("config.toml");
    p
}

/// Returns the default path of the task database.
///
/// `~/.local/share/taskslot/tasks.db` on Linux, `./tasks.db` if no data
/// directory is known.
fn default_db_path() -> PathBuf {
    let mut p = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    p.push("taskslot");
    p.push("tasks.db");
    p
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.scheduler, SchedulerConfig::default());
        assert!(config.database.is_none());
        assert_eq!(config.backend(), Backend::Sqlite);
    }

    #[test]
    fn test_scheduler_section() {
        let config = Config::from_toml(
            r#"
            database = "/tmp/tasks.json"

            [scheduler]
            day_start = "09:00"
            day_end = "17:30"
            step_minutes = 15
            "#,
        )
        .unwrap();
        assert_eq!(config.scheduler.day_start, 9 * 60);
        assert_eq!(config.scheduler.day_end, 17 * 60 + 30);
        assert_eq!(config.scheduler.step_minutes, 15);
        assert_eq!(config.scheduler.max_candidates, 6);
        assert_eq!(config.backend(), Backend::Json);
    }

    #[test]
    fn test_inverted_window_rejected() {
        let config = Config::from_toml(
            r#"
            [scheduler]
            day_start = "18:00"
            day_end = "08:00"
            "#,
        )
        .unwrap();
        assert!(config.scheduler.validate().is_err());
    }
}
