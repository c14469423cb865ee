use crate::core::calculator::status::Thresholds;
use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub mod prefs;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_database")]
    pub database: String,
    #[serde(default = "default_num_bays")]
    pub num_bays: u32,
    #[serde(default = "default_warning_seconds")]
    pub warning_seconds: u64,
    #[serde(default = "default_overtime_seconds")]
    pub overtime_seconds: u64,
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    #[serde(default = "default_recent_limit")]
    pub recent_limit: usize,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_database() -> String {
    Config::database_file().to_string_lossy().to_string()
}
fn default_num_bays() -> u32 {
    7
}
fn default_warning_seconds() -> u64 {
    2700
}
fn default_overtime_seconds() -> u64 {
    3600
}
fn default_tick_ms() -> u64 {
    1000
}
fn default_recent_limit() -> usize {
    5
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: default_database(),
            num_bays: default_num_bays(),
            warning_seconds: default_warning_seconds(),
            overtime_seconds: default_overtime_seconds(),
            tick_ms: default_tick_ms(),
            recent_limit: default_recent_limit(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Return the standard configuration directory depending on the platform
    pub fn config_dir() -> PathBuf {
        if cfg!(target_os = "windows") {
            dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("baytracker")
        } else {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".baytracker")
        }
    }

    /// Return the full path of the config file
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("baytracker.conf")
    }

    /// Return the full path of the SQLite database
    pub fn database_file() -> PathBuf {
        Self::config_dir().join("baytracker.sqlite")
    }

    /// Load configuration from file, or return defaults if not found
    pub fn load() -> AppResult<Self> {
        Self::load_from(&Self::config_file())
    }

    pub fn load_from(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|_| AppError::ConfigLoad)?;
        let cfg: Config = serde_yaml::from_str(&content)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let yaml = serde_yaml::to_string(self)?;
        fs::write(path, yaml).map_err(|_| AppError::ConfigSave)
    }

    fn validate(&self) -> AppResult<()> {
        if self.num_bays == 0 {
            return Err(AppError::Config("num_bays must be at least 1".into()));
        }
        if self.tick_ms == 0 {
            return Err(AppError::Config("tick_ms must be positive".into()));
        }
        Ok(())
    }

    /// Initialize configuration and database files
    pub fn init_all(custom_db: Option<&str>) -> AppResult<(PathBuf, PathBuf)> {
        let dir = Self::config_dir();
        fs::create_dir_all(&dir)?;

        let db_path = match custom_db {
            Some(name) => {
                let p = Path::new(name);
                if p.is_absolute() {
                    p.to_path_buf()
                } else {
                    dir.join(p)
                }
            }
            None => Self::database_file(),
        };

        let config = Config {
            database: db_path.to_string_lossy().to_string(),
            ..Config::default()
        };
        let conf_path = Self::config_file();
        config.save_to(&conf_path)?;

        if !db_path.exists() {
            if let Some(parent) = db_path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::File::create(&db_path)?;
        }

        Ok((conf_path, db_path))
    }

    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            warning_seconds: self.warning_seconds,
            overtime_seconds: self.overtime_seconds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let cfg: Config = serde_yaml::from_str("num_bays: 3\n").unwrap();
        assert_eq!(cfg.num_bays, 3);
        assert_eq!(cfg.warning_seconds, 2700);
        assert_eq!(cfg.overtime_seconds, 3600);
        assert_eq!(cfg.tick_ms, 1000);
        assert_eq!(cfg.recent_limit, 5);
        assert_eq!(cfg.log_level, "warn");
    }

    #[test]
    fn absent_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_from(&dir.path().join("nope.conf")).unwrap();
        assert_eq!(cfg.num_bays, 7);
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("baytracker.conf");
        let cfg = Config {
            num_bays: 4,
            warning_seconds: 60,
            ..Config::default()
        };
        cfg.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), cfg);
    }

    #[test]
    fn zero_bays_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.conf");
        fs::write(&path, "num_bays: 0\n").unwrap();
        assert!(matches!(Config::load_from(&path), Err(AppError::Config(_))));
    }

    #[test]
    fn thresholds_follow_config() {
        let cfg = Config {
            warning_seconds: 10,
            overtime_seconds: 20,
            ..Config::default()
        };
        let t = cfg.thresholds();
        assert_eq!((t.warning_seconds, t.overtime_seconds), (10, 20));
    }
}
