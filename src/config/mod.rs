use serde::{Deserialize, Serialize};
use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use crate::{
    errors::SchedulerError,
    notifications::{ReminderPolicy, DEFAULT_LOOKAHEAD_DAYS},
    utils::paths,
};

const TMP_SUFFIX: &str = "tmp";

/// User-tunable scheduler settings persisted as `config.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "SchedulerConfig::default_lookahead_days")]
    pub reminder_lookahead_days: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Directory holding the JSON stores. Defaults to the application data directory.
    pub data_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_filter: Option<String>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            reminder_lookahead_days: Self::default_lookahead_days(),
            data_dir: None,
            log_filter: None,
        }
    }
}

impl SchedulerConfig {
    pub fn default_lookahead_days() -> i64 {
        DEFAULT_LOOKAHEAD_DAYS
    }

    pub fn reminder_policy(&self) -> ReminderPolicy {
        ReminderPolicy {
            lookahead_days: self.reminder_lookahead_days.max(0),
        }
    }

    pub fn resolve_data_dir(&self, base: &Path) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(|| paths::data_dir_in(base))
    }
}

pub struct ConfigManager {
    base: PathBuf,
    path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self, SchedulerError> {
        Self::with_base_dir(paths::app_data_dir())
    }

    pub fn with_base_dir(base: PathBuf) -> Result<Self, SchedulerError> {
        fs::create_dir_all(&base).map_err(config_error)?;
        Ok(Self {
            path: paths::config_file_in(&base),
            base,
        })
    }

    pub fn load(&self) -> Result<SchedulerConfig, SchedulerError> {
        if !self.path.exists() {
            return Ok(SchedulerConfig::default());
        }
        let data = fs::read_to_string(&self.path).map_err(config_error)?;
        serde_json::from_str(&data).map_err(config_error)
    }

    pub fn save(&self, config: &SchedulerConfig) -> Result<(), SchedulerError> {
        let json = serde_json::to_string_pretty(config).map_err(config_error)?;
        let tmp = self.path.with_extension(format!("json.{}", TMP_SUFFIX));
        write_atomic(&tmp, &json).map_err(config_error)?;
        fs::rename(&tmp, &self.path).map_err(config_error)?;
        Ok(())
    }

    pub fn base_dir(&self) -> &Path {
        &self.base
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn write_atomic(path: &Path, data: &str) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    Ok(())
}

fn config_error(err: impl std::fmt::Display) -> SchedulerError {
    SchedulerError::ConfigError(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_loads_defaults() {
        let temp = tempfile::tempdir().unwrap();
        let manager = ConfigManager::with_base_dir(temp.path().to_path_buf()).unwrap();
        let config = manager.load().unwrap();
        assert_eq!(config, SchedulerConfig::default());
        assert_eq!(config.reminder_policy().lookahead_days, 3);
        assert_eq!(
            config.resolve_data_dir(manager.base_dir()),
            temp.path().join("data")
        );
    }

    #[test]
    fn save_then_load_preserves_overrides() {
        let temp = tempfile::tempdir().unwrap();
        let manager = ConfigManager::with_base_dir(temp.path().to_path_buf()).unwrap();
        let config = SchedulerConfig {
            reminder_lookahead_days: 5,
            data_dir: Some(temp.path().join("elsewhere")),
            log_filter: Some("recurring_core=debug".into()),
        };
        manager.save(&config).unwrap();
        assert_eq!(manager.load().unwrap(), config);
    }

    #[test]
    fn partial_file_fills_defaults_and_negative_lookahead_clamps() {
        let temp = tempfile::tempdir().unwrap();
        let manager = ConfigManager::with_base_dir(temp.path().to_path_buf()).unwrap();
        fs::write(manager.path(), r#"{"reminder_lookahead_days": -2}"#).unwrap();
        let config = manager.load().unwrap();
        assert_eq!(config.data_dir, None);
        assert_eq!(config.reminder_policy().lookahead_days, 0);
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let temp = tempfile::tempdir().unwrap();
        let manager = ConfigManager::with_base_dir(temp.path().to_path_buf()).unwrap();
        fs::write(manager.path(), "{ not json").unwrap();
        assert!(matches!(
            manager.load(),
            Err(SchedulerError::ConfigError(_))
        ));
    }
}
