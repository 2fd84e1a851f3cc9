//! Settings loaded from TOML configuration files.
//!
//! Every key is optional; missing keys keep their defaults.
//!
//! # Configuration File Format
//!
//! ```toml
//! [report]
//! file_name = "project_summary.txt"
//!
//! [sort]
//! preserve_timestamps = true
//!
//! [prompt]
//! assume_yes = false
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::extension_sorter::SortOptions;
use crate::serializer::DEFAULT_REPORT_NAME;

/// Name of the per-directory configuration file.
pub const LOCAL_CONFIG_NAME: &str = ".dirsnaprc.toml";

/// Errors that can occur during configuration loading.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or structure, or a value that fails validation.
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),
    /// IO error while reading configuration.
    #[error("IO error reading configuration: {0}")]
    IoError(String),
}

/// Top-level settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub report: ReportSettings,

    #[serde(default)]
    pub sort: SortSettings,

    #[serde(default)]
    pub prompt: PromptSettings,
}

/// Settings for the single-file report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSettings {
    /// File name of the report inside the chosen output directory.
    #[serde(default = "default_report_file_name")]
    pub file_name: String,
}

fn default_report_file_name() -> String {
    DEFAULT_REPORT_NAME.to_string()
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            file_name: default_report_file_name(),
        }
    }
}

/// Settings for sorting by extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSettings {
    /// Carry access and modification times onto copies. Defaults to true.
    #[serde(default = "default_preserve_timestamps")]
    pub preserve_timestamps: bool,
}

fn default_preserve_timestamps() -> bool {
    true
}

impl Default for SortSettings {
    fn default() -> Self {
        Self {
            preserve_timestamps: default_preserve_timestamps(),
        }
    }
}

impl From<&SortSettings> for SortOptions {
    fn from(settings: &SortSettings) -> Self {
        SortOptions {
            preserve_timestamps: settings.preserve_timestamps,
        }
    }
}

/// Settings for interactive confirmation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptSettings {
    /// Answer "yes" to the nested-output warning without asking.
    #[serde(default)]
    pub assume_yes: bool,
}

impl Settings {
    /// Load settings from a file, with fallback to defaults.
    ///
    /// Attempts to load configuration in the following order:
    /// 1. If `config_path` is provided, load from that file
    /// 2. Look for `.dirsnaprc.toml` in the current directory
    /// 3. Look for `~/.config/dirsnap/config.toml` in home directory
    /// 4. Fall back to default settings
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file is explicitly provided but
    /// cannot be read, or if any file found is invalid.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(LOCAL_CONFIG_NAME);
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("dirsnap")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    /// Load settings from a specific file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ConfigNotFound` if file does not exist.
    /// Returns `ConfigError::ConfigInvalid` if TOML parsing or validation fails.
    /// Returns `ConfigError::IoError` if file cannot be read.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Self::from_toml(&content)
    }

    /// Parse and validate settings from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let settings: Self =
            toml::from_str(content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check values that TOML types alone cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let name = self.report.file_name.as_str();
        let is_bare_name = Path::new(name).file_name().and_then(|n| n.to_str()) == Some(name);

        if name.is_empty() || !is_bare_name {
            return Err(ConfigError::ConfigInvalid(format!(
                "report.file_name must be a plain file name, got '{}'",
                name
            )));
        }

        Ok(())
    }

    pub fn sort_options(&self) -> SortOptions {
        SortOptions::from(&self.sort)
    }
}
