//! @module "Configuration"
//! @summary "Collection settings loading and defaults"
//! @layer config
//!
//! Collection configuration loading and defaults.

use std::path::Path;

use glob::Pattern;
use serde::{Deserialize, Serialize};

use crate::error::{MetaError, Result};

/// Default configuration file name, looked up in the working directory
pub const CONFIG_FILE: &str = ".docmeta.json";

/// Settings for a collection run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Source file extension, without the dot
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Paths to skip, as globs relative to the collection root
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,

    /// Descend into symlinked directories and read symlinked files
    #[serde(default)]
    pub follow_symlinks: bool,

    /// Upper bound on concurrently open files and directories
    #[serde(default = "default_max_open_files")]
    pub max_open_files: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            extension: default_extension(),
            exclude: default_exclude(),
            follow_symlinks: false,
            max_open_files: default_max_open_files(),
        }
    }
}

impl Config {
    /// Load config from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save config to a file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load from [`CONFIG_FILE`] or fall back to defaults
    pub fn load_or_default() -> Self {
        Self::load(CONFIG_FILE).unwrap_or_default()
    }

    /// Compile the exclude globs.
    pub fn exclude_patterns(&self) -> Result<Vec<Pattern>> {
        self.exclude
            .iter()
            .map(|p| {
                Pattern::new(p).map_err(|e| MetaError::InvalidPattern {
                    pattern: p.clone(),
                    message: e.msg.to_string(),
                })
            })
            .collect()
    }
}

fn default_extension() -> String {
    "js".to_string()
}

fn default_exclude() -> Vec<String> {
    vec![
        "**/node_modules".to_string(),
        "**/.git".to_string(),
        "**/dist".to_string(),
        "**/target".to_string(),
    ]
}

fn default_max_open_files() -> usize {
    64
}
