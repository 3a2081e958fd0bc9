/// Configuration management for qrev
///
/// qrev stores configuration in ~/.qrev/config.toml

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::line_reader::DEFAULT_CAPACITY;

const DEFAULT_CONFIG: &str = r#"# qrev Configuration File
# Generated by 'qrev --init-config'

[processing]
# Line buffer capacity in bytes (default: 65536)
# A line longer than this fails its file; raise it for long-line data.
#buffer_capacity = 65536

[logging]
# Log debug output to the qrev log file (default: false)
#debug = false
"#;

/// qrev configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Processing settings
    #[serde(default)]
    pub processing: ProcessingConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessingConfig {
    /// Line buffer capacity in bytes
    #[serde(default)]
    pub buffer_capacity: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log debug output to the qrev log file
    #[serde(default)]
    pub debug: Option<bool>,
}

impl Config {
    /// Load the configuration file, falling back to defaults when absent
    pub fn load() -> Result<Config> {
        let path = Self::config_path()?;
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        Ok(config)
    }

    /// Write a commented default config file; refuses to overwrite
    pub fn init_default_file() -> Result<PathBuf> {
        let path = Self::config_path()?;
        if path.exists() {
            bail!("Config file already exists: {}", path.display());
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }
        fs::write(&path, DEFAULT_CONFIG)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(path)
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .context("Cannot determine home directory")?;
        Ok(home.join(".qrev").join("config.toml"))
    }

    /// Effective buffer capacity after defaulting
    pub fn buffer_capacity(&self) -> usize {
        self.processing.buffer_capacity.unwrap_or(DEFAULT_CAPACITY)
    }

    /// Effective debug-logging switch after defaulting
    pub fn debug_logging(&self) -> bool {
        self.logging.debug.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_sections_absent() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.buffer_capacity(), DEFAULT_CAPACITY);
        assert!(!config.debug_logging());
    }

    #[test]
    fn test_partial_config_parses() {
        let config: Config = toml::from_str("[processing]\nbuffer_capacity = 1024\n").unwrap();
        assert_eq!(config.buffer_capacity(), 1024);
        assert!(!config.debug_logging());
    }

    #[test]
    fn test_default_config_text_parses_to_defaults() {
        let config: Config = toml::from_str(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.buffer_capacity(), DEFAULT_CAPACITY);
        assert!(!config.debug_logging());
    }

    #[test]
    fn test_logging_section_round_trips() {
        let config: Config = toml::from_str("[logging]\ndebug = true\n").unwrap();
        assert!(config.debug_logging());
        let rendered = toml::to_string(&config).unwrap();
        let reparsed: Config = toml::from_str(&rendered).unwrap();
        assert!(reparsed.debug_logging());
    }
}
