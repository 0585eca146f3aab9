//! Add-in configuration (addins.toml)
//!
//! ```toml
//! [[addin]]
//! name = "Printer"
//! path = "lib/libprinter.so"
//! components = ["Receipt", "Label"]
//!
//! [callbacks]
//! capacity = 256
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::component::ComponentOptions;
use crate::error::AddinResult;
use crate::library::AddinLibrary;

/// Errors that can occur while loading a configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the file
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Structurally valid but inconsistent
    #[error("Invalid config: {0}")]
    Validation(String),
}

/// Root of the configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AddinConfig {
    /// Libraries to load
    #[serde(default, rename = "addin")]
    pub addins: Vec<AddinEntry>,

    /// Callback delivery settings
    #[serde(default)]
    pub callbacks: CallbackConfig,
}

/// One add-in library
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AddinEntry {
    /// Name the library is registered under (`AddIn.<name>.*`)
    pub name: String,

    /// Shared library path, relative to the config file
    pub path: PathBuf,

    /// Components the library provides
    #[serde(default)]
    pub components: Vec<String>,
}

/// `[callbacks]` table
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CallbackConfig {
    /// Per-instance queue bound; unbounded when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<usize>,
}

impl AddinConfig {
    /// Load and validate a config file. Relative library paths are
    /// resolved against the file's directory.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_str(&content)?;

        if let Some(base) = path.parent() {
            for entry in &mut config.addins {
                if entry.path.is_relative() {
                    entry.path = base.join(&entry.path);
                }
            }
        }
        Ok(config)
    }

    /// Parse and validate config text
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: AddinConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check names and component lists
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for entry in &self.addins {
            if entry.name.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "add-in name cannot be empty".to_string(),
                ));
            }
            if !entry
                .name
                .chars()
                .all(|c| c.is_alphanumeric() || c == '_')
            {
                return Err(ConfigError::Validation(format!(
                    "add-in name '{}' may only contain letters, digits and '_'",
                    entry.name
                )));
            }
            if !seen.insert(entry.name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate add-in name '{}'",
                    entry.name
                )));
            }
            if entry.components.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "add-in '{}' lists no components",
                    entry.name
                )));
            }
            if entry.components.iter().any(|c| c.trim().is_empty()) {
                return Err(ConfigError::Validation(format!(
                    "add-in '{}' has an empty component name",
                    entry.name
                )));
            }
        }

        if self.callbacks.capacity == Some(0) {
            return Err(ConfigError::Validation(
                "callbacks.capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Find an add-in by name
    pub fn addin(&self, name: &str) -> Option<&AddinEntry> {
        self.addins.iter().find(|entry| entry.name == name)
    }

    /// Options every component created under this config gets
    pub fn component_options(&self) -> ComponentOptions {
        ComponentOptions {
            callback_capacity: self.callbacks.capacity,
        }
    }
}

impl AddinEntry {
    /// Load this entry's library
    pub fn open(&self) -> AddinResult<AddinLibrary> {
        AddinLibrary::open(self.name.clone(), &self.path)
    }
}
