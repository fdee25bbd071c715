//! Runtime settings.
//!
//! Values come from built-in defaults, then an optional TOML settings file,
//! then command-line flags (which clap also fills from the environment). The
//! settings file is looked up in the platform config directory unless a path
//! is given explicitly.

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::Deserialize;
use tracing::debug;

use crate::error::ConfigError;
use crate::stats::DEFAULT_TOP_AUTHORS;

/// Default library file, relative to the working directory.
pub const DEFAULT_DATA_FILE: &str = "library.json";
/// Latest publication year accepted unless configured otherwise.
pub const DEFAULT_MAX_YEAR: i32 = 2100;
pub const DEFAULT_BIND: &str = "127.0.0.1:8501";
/// Name of the settings file inside the config directory.
const SETTINGS_FILE_NAME: &str = "settings.toml";

/// Validation and reporting limits shared by both front ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rules {
    /// Inclusive upper bound for publication years.
    pub max_year: i32,
    /// Number of authors in the statistics ranking.
    pub top_authors: usize,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            max_year: DEFAULT_MAX_YEAR,
            top_authors: DEFAULT_TOP_AUTHORS,
        }
    }
}

/// Fully resolved settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub data_file: PathBuf,
    pub max_year: i32,
    pub top_authors: usize,
    /// Address the web front end listens on.
    pub bind: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            max_year: DEFAULT_MAX_YEAR,
            top_authors: DEFAULT_TOP_AUTHORS,
            bind: DEFAULT_BIND.to_string(),
        }
    }
}

impl Settings {
    /// Load settings from `explicit` if given, otherwise from the default
    /// location. A missing default file is fine; a missing explicit file is
    /// an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let settings = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match default_settings_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let settings: Settings = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "settings file loaded");
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_year < 1 {
            return Err(ConfigError::Invalid {
                field: "max_year",
                reason: format!("must be at least 1, got {}", self.max_year),
            });
        }
        if self.top_authors == 0 {
            return Err(ConfigError::Invalid {
                field: "top_authors",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.data_file.as_os_str().is_empty() {
            return Err(ConfigError::Invalid {
                field: "data_file",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    pub fn rules(&self) -> Rules {
        Rules {
            max_year: self.max_year,
            top_authors: self.top_authors,
        }
    }
}

/// `<config dir>/personal-library/settings.toml`, when the platform has a
/// config directory at all.
pub fn default_settings_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "personal-library")
        .map(|dirs| dirs.config_dir().join(SETTINGS_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.rules(), Rules::default());
        assert_eq!(settings.data_file, PathBuf::from("library.json"));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("settings.toml");
        fs::write(&path, "max_year = 2030\ntop_authors = 3\n").expect("write");

        let settings = Settings::load(Some(&path)).expect("load");
        assert_eq!(settings.max_year, 2030);
        assert_eq!(settings.top_authors, 3);
        assert_eq!(settings.bind, DEFAULT_BIND);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("settings.toml");
        fs::write(&path, "max_yaer = 2030\n").expect("write");

        assert!(matches!(
            Settings::load(Some(&path)),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("settings.toml");
        fs::write(&path, "top_authors = 0\n").expect("write");

        assert!(matches!(
            Settings::load(Some(&path)),
            Err(ConfigError::Invalid {
                field: "top_authors",
                ..
            })
        ));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("absent.toml");
        assert!(matches!(
            Settings::load(Some(&path)),
            Err(ConfigError::Read { .. })
        ));
    }
}
