//! Local display preferences, kept apart from the YAML config so the
//! board can flip its theme without rewriting the main settings.

use super::Config;
use crate::errors::AppResult;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub dark_mode: bool,
}

impl Preferences {
    pub fn file() -> PathBuf {
        Config::config_dir().join("preferences.json")
    }

    pub fn load() -> Self {
        Self::load_from(&Self::file())
    }

    /// Missing or unreadable preferences fall back to light mode.
    pub fn load_from(path: &Path) -> Self {
        let Ok(raw) = fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "ignoring malformed preferences");
            Self::default()
        })
    }

    pub fn save(&self) -> AppResult<()> {
        self.save_to(&Self::file())
    }

    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn toggled(self) -> Self {
        Self {
            dark_mode: !self.dark_mode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_light_mode() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!Preferences::load_from(&dir.path().join("p.json")).dark_mode);
    }

    #[test]
    fn toggle_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("p.json");
        Preferences::default().toggled().save_to(&path).unwrap();
        assert!(Preferences::load_from(&path).dark_mode);
    }

    #[test]
    fn garbage_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("p.json");
        fs::write(&path, "{not json").unwrap();
        assert_eq!(Preferences::load_from(&path), Preferences::default());
    }
}
