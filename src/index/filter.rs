//! @module "File Filter"
//! @summary "File eligibility and exclude patterns"
//! @layer service
//!
//! File eligibility for collection.

use std::path::Path;

use glob::{MatchOptions, Pattern};

use crate::config::Config;
use crate::error::Result;

/// Decides which entries a traversal parses or descends into.
pub trait FileFilter: Send + Sync {
    /// Whether a regular file should be scanned
    fn is_eligible(&self, path: &Path) -> bool;

    /// Whether an entry (file or directory), given relative to the
    /// collection root, is skipped entirely
    fn is_excluded(&self, relative: &Path) -> bool {
        let _ = relative;
        false
    }
}

impl<F> FileFilter for F
where
    F: Fn(&Path) -> bool + Send + Sync,
{
    fn is_eligible(&self, path: &Path) -> bool {
        self(path)
    }
}

/// Extension match plus glob excludes, built from [`Config`].
#[derive(Debug, Clone)]
pub struct SourceFilter {
    extension: String,
    exclude: Vec<Pattern>,
}

impl SourceFilter {
    pub fn new(extension: impl Into<String>) -> Self {
        Self {
            extension: extension.into().trim_start_matches('.').to_string(),
            exclude: Vec::new(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            exclude: config.exclude_patterns()?,
            ..Self::new(config.extension.as_str())
        })
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }
}

impl FileFilter for SourceFilter {
    fn is_eligible(&self, path: &Path) -> bool {
        path.extension()
            .is_some_and(|ext| ext.to_string_lossy() == self.extension)
    }

    fn is_excluded(&self, relative: &Path) -> bool {
        let match_opts = MatchOptions {
            case_sensitive: true,
            require_literal_separator: false,
            require_literal_leading_dot: false,
        };
        self.exclude
            .iter()
            .any(|p| p.matches_path_with(relative, match_opts))
    }
}
