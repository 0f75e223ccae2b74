//! Persistent user settings for Powercut
//!
//! Settings are stored in a TOML configuration file at:
//! - Linux: `~/.config/powercut/powercut_config.toml`
//! - macOS: `~/Library/Application Support/powercut/powercut_config.toml`
//! - Windows: `%APPDATA%\powercut\powercut_config.toml`
//!
//! # Example Configuration
//!
//! ```toml
//! [copy]
//! block_size = "1M"
//! delay_ms = 200
//! poll_interval_ms = 500
//!
//! [crash_window]
//! lower_percent = 40.0
//! upper_percent = 60.0
//! countdown_secs = 30
//!
//! [generator]
//! chunk_size = "10M"
//!
//! [checksum]
//! algorithm = "md5"
//! block_size = "4M"
//!
//! [paths]
//! results_dir = "fs_test_results"
//!
//! [behavior]
//! skip_confirmation = false
//! ```

use crate::checksum::{ChecksumAlgorithm, ChecksumConfig};
use crate::config::DEFAULT_RESULTS_DIR;
use crate::copier::{CopyConfig, CrashWindow};
use crate::generator::GeneratorConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration file name
const CONFIG_FILE_NAME: &str = "powercut_config.toml";

/// Application name for config directory
const APP_NAME: &str = "powercut";

/// User settings loaded from configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Monitored copy settings
    pub copy: CopySettings,

    /// Crash window settings
    pub crash_window: CrashWindowSettings,

    /// Artifact generation settings
    pub generator: GeneratorSettings,

    /// Checksum settings
    pub checksum: ChecksumSettings,

    /// Output locations
    pub paths: PathSettings,

    /// Behavior settings
    pub behavior: BehaviorSettings,
}

/// Settings for the monitored copy
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CopySettings {
    /// Block size (e.g., "1M", "512K")
    pub block_size: String,

    /// Sleep after each block in milliseconds when the delay is enabled
    pub delay_ms: u64,

    /// Destination sampling interval in milliseconds
    pub poll_interval_ms: u64,
}

/// Settings for the crash window
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CrashWindowSettings {
    /// Progress percentage at which the window opens
    pub lower_percent: f64,

    /// Progress percentage after which the window no longer opens
    pub upper_percent: f64,

    /// Seconds the operator is given to cut power
    pub countdown_secs: u64,
}

/// Settings for artifact generation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GeneratorSettings {
    /// Size of each random chunk (e.g., "10M")
    pub chunk_size: String,
}

/// Settings for checksum operations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChecksumSettings {
    /// Baseline checksum algorithm
    pub algorithm: String,

    /// Read block size while hashing (e.g., "4M")
    pub block_size: String,
}

/// Output locations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PathSettings {
    /// Name of the results directory under the working directory
    pub results_dir: String,
}

/// General behavior settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BehaviorSettings {
    /// Whether to skip the "press Enter" prompt before the copy
    pub skip_confirmation: bool,
}

impl Default for CopySettings {
    fn default() -> Self {
        Self {
            block_size: "1M".to_string(),
            delay_ms: 200,
            poll_interval_ms: 500,
        }
    }
}

impl Default for CrashWindowSettings {
    fn default() -> Self {
        Self {
            lower_percent: 40.0,
            upper_percent: 60.0,
            countdown_secs: 30,
        }
    }
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            chunk_size: "10M".to_string(),
        }
    }
}

impl Default for ChecksumSettings {
    fn default() -> Self {
        Self {
            algorithm: "md5".to_string(),
            block_size: "4M".to_string(),
        }
    }
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            results_dir: DEFAULT_RESULTS_DIR.to_string(),
        }
    }
}

impl Settings {
    /// Load settings from the configuration file
    ///
    /// Returns default settings if the file doesn't exist or can't be parsed
    pub fn load() -> Self {
        Self::load_from_path(Self::config_path())
    }

    /// Load settings from a specific path
    pub fn load_from_path(path: Option<PathBuf>) -> Self {
        let Some(path) = path else {
            tracing::debug!("No config path available, using defaults");
            return Self::default();
        };

        if !path.exists() {
            tracing::debug!("Config file not found at {:?}, using defaults", path);
            return Self::default();
        }

        match std::fs::read_to_string(&path) {
            Ok(contents) => match Self::from_toml_str(&contents) {
                Ok(settings) => {
                    tracing::debug!("Loaded settings from {:?}", path);
                    settings
                }
                Err(e) => {
                    tracing::warn!("Failed to parse config file {:?}: {}", path, e);
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read config file {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    /// Parse settings from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self, SettingsError> {
        toml::from_str(contents).map_err(SettingsError::Deserialize)
    }

    /// Save settings to the configuration file
    pub fn save(&self) -> Result<PathBuf, SettingsError> {
        self.save_to_path(Self::config_path())
    }

    /// Save settings to a specific path
    pub fn save_to_path(&self, path: Option<PathBuf>) -> Result<PathBuf, SettingsError> {
        let path = path.ok_or(SettingsError::NoConfigDir)?;

        // Create parent directory if needed
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| SettingsError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let contents = toml::to_string_pretty(self).map_err(SettingsError::Serialize)?;

        std::fs::write(&path, contents).map_err(|e| SettingsError::Io {
            path: path.clone(),
            source: e,
        })?;

        tracing::info!("Saved settings to {:?}", path);
        Ok(path)
    }

    /// Get the path to the configuration file
    pub fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join(CONFIG_FILE_NAME))
    }

    /// Get the path to the configuration directory
    pub fn config_dir() -> Option<PathBuf> {
        dirs_next::config_dir().map(|p| p.join(APP_NAME))
    }

    /// Check if a configuration file exists
    pub fn config_exists() -> bool {
        Self::config_path().is_some_and(|p| p.exists())
    }

    /// Generate a default configuration file content as a string
    pub fn default_config_string() -> String {
        let default = Self::default();
        toml::to_string_pretty(&default)
            .unwrap_or_else(|_| String::from("# Failed to generate default config"))
    }

    /// Monitored copy configuration described by these settings
    pub fn copy_config(&self) -> Result<CopyConfig, SettingsError> {
        let block_size = parse_size("copy.block_size", &self.copy.block_size)?;
        Ok(CopyConfig::new()
            .block_size(block_size)
            .block_delay(Duration::from_millis(self.copy.delay_ms))
            .poll_interval(Duration::from_millis(self.copy.poll_interval_ms))
            .algorithm(self.checksum_algorithm()?)
            .checksum(self.checksum_config()?))
    }

    /// Crash window described by these settings
    pub fn crash_window(&self) -> Result<CrashWindow, SettingsError> {
        let w = &self.crash_window;
        for (key, value) in [
            ("crash_window.lower_percent", w.lower_percent),
            ("crash_window.upper_percent", w.upper_percent),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(SettingsError::InvalidValue {
                    key,
                    value: value.to_string(),
                });
            }
        }
        if w.lower_percent > w.upper_percent {
            return Err(SettingsError::InvalidValue {
                key: "crash_window.lower_percent",
                value: format!("{} (above upper_percent {})", w.lower_percent, w.upper_percent),
            });
        }

        Ok(CrashWindow::new()
            .range(w.lower_percent / 100.0, w.upper_percent / 100.0)
            .countdown(Duration::from_secs(w.countdown_secs)))
    }

    /// Generator configuration described by these settings
    pub fn generator_config(&self) -> Result<GeneratorConfig, SettingsError> {
        let chunk = parse_size("generator.chunk_size", &self.generator.chunk_size)?;
        Ok(GeneratorConfig::new().chunk_size(chunk))
    }

    /// Checksum configuration described by these settings
    pub fn checksum_config(&self) -> Result<ChecksumConfig, SettingsError> {
        let block = parse_size("checksum.block_size", &self.checksum.block_size)?;
        Ok(ChecksumConfig::new().block_size(block))
    }

    /// Baseline checksum algorithm
    pub fn checksum_algorithm(&self) -> Result<ChecksumAlgorithm, SettingsError> {
        self.checksum
            .algorithm
            .parse()
            .map_err(|_| SettingsError::InvalidValue {
                key: "checksum.algorithm",
                value: self.checksum.algorithm.clone(),
            })
    }
}

/// Parse a size string like "1M", "512K", "4096" into bytes
pub fn parse_size(key: &'static str, s: &str) -> Result<usize, SettingsError> {
    let invalid = || SettingsError::InvalidValue {
        key,
        value: s.to_string(),
    };

    let trimmed = s.trim();
    let split_pos = trimmed
        .find(|c: char| c.is_ascii_alphabetic())
        .unwrap_or(trimmed.len());
    let (num_str, suffix) = trimmed.split_at(split_pos);

    let num: usize = num_str.trim().parse().map_err(|_| invalid())?;
    let multiplier: usize = match suffix.to_ascii_uppercase().as_str() {
        "" | "B" => 1,
        "K" | "KB" => 1024,
        "M" | "MB" => 1024 * 1024,
        "G" | "GB" => 1024 * 1024 * 1024,
        _ => return Err(invalid()),
    };

    match num.checked_mul(multiplier) {
        Some(0) | None => Err(invalid()),
        Some(bytes) => Ok(bytes),
    }
}

/// Errors that can occur when working with settings
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// No configuration directory available
    #[error("Could not determine configuration directory")]
    NoConfigDir,

    /// Failed to read or write config file
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path that caused the error
        path: PathBuf,
        /// The underlying error
        source: std::io::Error,
    },

    /// Failed to serialize settings
    #[error("Failed to serialize settings: {0}")]
    Serialize(toml::ser::Error),

    /// Failed to deserialize settings
    #[error("Failed to parse settings: {0}")]
    Deserialize(toml::de::Error),

    /// A setting holds a value that cannot be used
    #[error("Invalid value for {key}: {value}")]
    InvalidValue {
        /// Dotted key of the setting
        key: &'static str,
        /// The rejected value
        value: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::copier::{DEFAULT_BLOCK_DELAY, DEFAULT_COPY_BLOCK_SIZE, DEFAULT_POLL_INTERVAL};
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.copy.block_size, "1M");
        assert_eq!(settings.copy.delay_ms, 200);
        assert_eq!(settings.copy.poll_interval_ms, 500);
        assert_eq!(settings.crash_window.lower_percent, 40.0);
        assert_eq!(settings.crash_window.upper_percent, 60.0);
        assert_eq!(settings.crash_window.countdown_secs, 30);
        assert_eq!(settings.generator.chunk_size, "10M");
        assert_eq!(settings.checksum.algorithm, "md5");
        assert_eq!(settings.paths.results_dir, "fs_test_results");
        assert!(!settings.behavior.skip_confirmation);
    }

    #[test]
    fn test_defaults_match_builders() {
        let settings = Settings::default();

        let copy = settings.copy_config().unwrap();
        assert_eq!(copy.block_size, DEFAULT_COPY_BLOCK_SIZE);
        assert_eq!(copy.block_delay, Some(DEFAULT_BLOCK_DELAY));
        assert_eq!(copy.poll_interval, DEFAULT_POLL_INTERVAL);
        assert_eq!(copy.algorithm, ChecksumAlgorithm::Md5);

        let window = settings.crash_window().unwrap();
        assert_eq!(window.lower(), 0.40);
        assert_eq!(window.upper(), 0.60);
        assert_eq!(window.countdown_duration(), Duration::from_secs(30));

        assert_eq!(
            settings.generator_config().unwrap().chunk_size,
            GeneratorConfig::default().chunk_size
        );
        assert_eq!(
            settings.checksum_config().unwrap().block_size,
            ChecksumConfig::default().block_size
        );
    }

    #[test]
    fn test_settings_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("powercut_config.toml");

        let settings = Settings {
            copy: CopySettings {
                block_size: "256K".to_string(),
                delay_ms: 50,
                poll_interval_ms: 100,
            },
            crash_window: CrashWindowSettings {
                lower_percent: 20.0,
                upper_percent: 80.0,
                countdown_secs: 10,
            },
            generator: GeneratorSettings {
                chunk_size: "4M".to_string(),
            },
            checksum: ChecksumSettings {
                algorithm: "sha256".to_string(),
                block_size: "1M".to_string(),
            },
            paths: PathSettings {
                results_dir: "results".to_string(),
            },
            behavior: BehaviorSettings {
                skip_confirmation: true,
            },
        };

        settings.save_to_path(Some(config_path.clone())).unwrap();
        assert!(config_path.exists());

        let loaded = Settings::load_from_path(Some(config_path));
        assert_eq!(settings, loaded);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let settings =
            Settings::load_from_path(Some(PathBuf::from("/nonexistent/powercut_config.toml")));
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_load_no_path() {
        assert_eq!(Settings::load_from_path(None), Settings::default());
    }

    #[test]
    fn test_partial_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("powercut_config.toml");
        std::fs::write(&config_path, "[crash_window]\ncountdown_secs = 5\n").unwrap();

        let settings = Settings::load_from_path(Some(config_path));

        assert_eq!(settings.crash_window.countdown_secs, 5);
        assert_eq!(settings.crash_window.lower_percent, 40.0);
        assert_eq!(settings.copy.block_size, "1M");
    }

    #[test]
    fn test_load_invalid_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("powercut_config.toml");
        std::fs::write(&config_path, "this is not valid toml {{{{").unwrap();

        let settings = Settings::load_from_path(Some(config_path));
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_from_toml_str_error() {
        assert!(matches!(
            Settings::from_toml_str("[copy]\ndelay_ms = \"fast\""),
            Err(SettingsError::Deserialize(_))
        ));
    }

    #[test]
    fn test_save_to_none_path() {
        let result = Settings::default().save_to_path(None);
        assert!(matches!(result, Err(SettingsError::NoConfigDir)));
    }

    #[test]
    fn test_default_config_string() {
        let config_str = Settings::default_config_string();
        for section in [
            "[copy]",
            "[crash_window]",
            "[generator]",
            "[checksum]",
            "[paths]",
            "[behavior]",
        ] {
            assert!(config_str.contains(section), "missing {}", section);
        }
        assert!(config_str.contains("countdown_secs"));
    }

    #[test]
    fn test_config_path() {
        if let Some(p) = Settings::config_path() {
            assert!(p.to_string_lossy().contains("powercut"));
            assert!(p.ends_with("powercut_config.toml"));
        }
        if let Some(d) = Settings::config_dir() {
            assert!(!d.to_string_lossy().contains("powercut_config.toml"));
        }
        let _ = Settings::config_exists();
    }

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("k", "4096").unwrap(), 4096);
        assert_eq!(parse_size("k", "512K").unwrap(), 512 * 1024);
        assert_eq!(parse_size("k", "1m").unwrap(), 1024 * 1024);
        assert_eq!(parse_size("k", " 10MB ").unwrap(), 10 * 1024 * 1024);
        assert_eq!(parse_size("k", "1G").unwrap(), 1024 * 1024 * 1024);
        assert!(parse_size("k", "").is_err());
        assert!(parse_size("k", "0M").is_err());
        assert!(parse_size("k", "M").is_err());
        assert!(parse_size("k", "10X").is_err());
        assert!(parse_size("k", "-1M").is_err());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut settings = Settings::default();
        settings.checksum.algorithm = "blake3".to_string();
        assert!(matches!(
            settings.checksum_algorithm(),
            Err(SettingsError::InvalidValue { key: "checksum.algorithm", .. })
        ));
        assert!(settings.copy_config().is_err());

        let mut settings = Settings::default();
        settings.crash_window.lower_percent = 70.0;
        assert!(settings.crash_window().is_err());

        let mut settings = Settings::default();
        settings.crash_window.upper_percent = 150.0;
        assert!(settings.crash_window().is_err());

        let mut settings = Settings::default();
        settings.generator.chunk_size = "lots".to_string();
        assert!(settings.generator_config().is_err());
    }

    #[test]
    fn test_settings_error_display() {
        let err = SettingsError::NoConfigDir;
        assert!(err.to_string().contains("configuration directory"));

        let io_err = SettingsError::Io {
            path: PathBuf::from("/test/path"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        assert!(io_err.to_string().contains("/test/path"));

        let err = SettingsError::InvalidValue {
            key: "copy.block_size",
            value: "huge".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid value for copy.block_size: huge");
    }
}
