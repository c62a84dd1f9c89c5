//! Configuration for the decomposer.
//!
//! Supports both environment variables and YAML config file.
//! Environment variables take precedence over config file values.

use crate::error::{DecomposeError, Result};
use crate::layout::is_illegal_name_char;
use crate::persistence::RecordFormat;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

/// Title marker of the first outline entry kept by the filter.
pub const DEFAULT_ANCHOR: &str = "ВВЕДЕНИЕ";

/// Outline filtering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutlineConfig {
    /// Substring (compared case-folded) that marks the anchor entry.
    /// An empty anchor keeps the whole outline.
    pub anchor: String,
}

impl Default for OutlineConfig {
    fn default() -> Self {
        Self {
            anchor: DEFAULT_ANCHOR.to_string(),
        }
    }
}

/// Directory layout settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Maximum length, in characters, of a sanitized directory/file name.
    #[serde(default = "default_max_name_len")]
    pub max_name_len: usize,

    /// Replacement for runs of whitespace in titles.
    #[serde(default = "default_separator")]
    pub separator: char,
}

fn default_max_name_len() -> usize {
    50
}

fn default_separator() -> char {
    '_'
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            max_name_len: default_max_name_len(),
            separator: default_separator(),
        }
    }
}

/// Record file settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordConfig {
    #[serde(default)]
    pub format: RecordFormat,
}

/// Full application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub outline: OutlineConfig,
    pub layout: LayoutConfig,
    pub record: RecordConfig,
}

/// Configuration file structure (YAML format).
#[derive(Debug, Deserialize)]
struct ConfigFile {
    outline: Option<OutlineFileSection>,
    layout: Option<LayoutFileSection>,
    record: Option<RecordFileSection>,
}

#[derive(Debug, Deserialize)]
struct OutlineFileSection {
    anchor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LayoutFileSection {
    max_name_len: Option<usize>,
    separator: Option<char>,
}

#[derive(Debug, Deserialize)]
struct RecordFileSection {
    format: Option<RecordFormat>,
}

impl Config {
    /// Load configuration from environment variables and optional config file.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (TOC_DECOMPOSER_ANCHOR, TOC_DECOMPOSER_MAX_NAME_LEN, ...)
    /// 2. Config file (~/.config/toc-decomposer/config.yaml)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        let mut config = Config::default();

        if let Some(config_path) = Self::config_file_path() {
            if config_path.exists() {
                config = Self::load_from_file(&config_path)?;
            }
        }

        config.apply_env()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| DecomposeError::io(path, e))?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML text, filling gaps with defaults.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let file_config: ConfigFile = serde_yaml::from_str(content)
            .map_err(|e| DecomposeError::Config(format!("Failed to parse config file: {}", e)))?;

        let mut config = Config::default();

        if let Some(outline) = file_config.outline {
            if let Some(anchor) = outline.anchor {
                config.outline.anchor = anchor;
            }
        }
        if let Some(layout) = file_config.layout {
            if let Some(max_name_len) = layout.max_name_len {
                config.layout.max_name_len = max_name_len;
            }
            if let Some(separator) = layout.separator {
                config.layout.separator = separator;
            }
        }
        if let Some(record) = file_config.record {
            if let Some(format) = record.format {
                config.record.format = format;
            }
        }

        Ok(config)
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(anchor) = env::var("TOC_DECOMPOSER_ANCHOR") {
            self.outline.anchor = anchor;
        }

        if let Ok(max_name_len) = env::var("TOC_DECOMPOSER_MAX_NAME_LEN") {
            if let Ok(len) = max_name_len.parse() {
                self.layout.max_name_len = len;
            }
        }

        if let Ok(separator) = env::var("TOC_DECOMPOSER_SEPARATOR") {
            if let Some(c) = separator.chars().next() {
                self.layout.separator = c;
            }
        }

        if let Ok(format) = env::var("TOC_DECOMPOSER_RECORD_FORMAT") {
            self.record.format = format.parse()?;
        }

        Ok(())
    }

    /// Get the default config file path.
    pub fn config_file_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "toc-decomposer")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Validate the configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.layout.max_name_len == 0 {
            return Err(DecomposeError::InvalidConfig(
                "layout.max_name_len must be greater than zero".to_string(),
            ));
        }

        if self.layout.separator.is_whitespace() || is_illegal_name_char(self.layout.separator) {
            return Err(DecomposeError::InvalidConfig(format!(
                "layout.separator '{}' cannot be used in file names",
                self.layout.separator
            )));
        }

        Ok(())
    }

    /// Create a config with a specific anchor (useful for testing).
    pub fn with_anchor(anchor: impl Into<String>) -> Self {
        Self {
            outline: OutlineConfig {
                anchor: anchor.into(),
            },
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.outline.anchor, "ВВЕДЕНИЕ");
        assert_eq!(config.layout.max_name_len, 50);
        assert_eq!(config.layout.separator, '_');
        assert_eq!(config.record.format, RecordFormat::Json);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_yaml_partial() {
        let config = Config::from_yaml("outline:\n  anchor: INTRODUCTION\n").unwrap();
        assert_eq!(config.outline.anchor, "INTRODUCTION");
        assert_eq!(config.layout.max_name_len, 50);
    }

    #[test]
    fn test_from_yaml_full() {
        let yaml = "outline:\n  anchor: Preface\nlayout:\n  max_name_len: 20\n  separator: '-'\nrecord:\n  format: bincode\n";
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.outline.anchor, "Preface");
        assert_eq!(config.layout.max_name_len, 20);
        assert_eq!(config.layout.separator, '-');
        assert_eq!(config.record.format, RecordFormat::Bincode);
    }

    #[test]
    fn test_from_yaml_invalid() {
        assert!(Config::from_yaml("layout: [1, 2").is_err());
    }

    #[test]
    fn test_validate_rejects_bad_layout() {
        let mut config = Config::default();
        config.layout.max_name_len = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.layout.separator = '/';
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_with_anchor() {
        let config = Config::with_anchor("Chapter");
        assert_eq!(config.outline.anchor, "Chapter");
        assert_eq!(config.layout.max_name_len, 50);
    }
}
