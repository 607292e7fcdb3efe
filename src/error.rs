//! @module "Errors"
//! @summary "Error types and crate Result alias"
//! @layer model
//!
//! Error types for annotation parsing, file scanning and tree collection.
//!
//! Parse-level errors are recovered where they occur (a bad phrase is
//! skipped, an unterminated comment ends one file's scan). I/O errors are
//! reported per branch and never abort sibling branches.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors produced while extracting metadata.
#[derive(Debug, Error)]
pub enum MetaError {
    /// A comment line looked like an annotation but had no `@name`.
    #[error("malformed annotation: {0:?}")]
    MalformedAnnotation(String),

    /// A `/**` opener without a matching `*/`.
    #[error("unterminated comment opened at line {line} (byte {offset})")]
    UnterminatedComment { offset: usize, line: usize },

    /// Directory listing failed.
    #[error("failed to read directory {}: {source}", path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// File content could not be read.
    #[error("failed to read file {}: {source}", path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Entry type could not be determined.
    #[error("failed to stat {}: {source}", path.display())]
    Stat {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A scan inside one file stopped early.
    #[error("{namespace}: {source}")]
    InFile {
        namespace: String,
        #[source]
        source: Box<MetaError>,
    },

    /// Two files mapped to the same namespace; the first one is kept.
    #[error("namespace collision: {0}")]
    NamespaceCollision(String),

    /// `collect` was called on a collector that already ran.
    #[error("collector already started")]
    AlreadyStarted,

    /// An exclude pattern in the configuration is not a valid glob.
    #[error("invalid pattern {pattern:?}: {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl MetaError {
    pub fn read_dir(path: &Path, source: io::Error) -> Self {
        Self::ReadDir {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn read_file(path: &Path, source: io::Error) -> Self {
        Self::ReadFile {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn stat(path: &Path, source: io::Error) -> Self {
        Self::Stat {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Attach the namespace of the file a scan error came from.
    pub fn in_file(namespace: impl Into<String>, source: MetaError) -> Self {
        Self::InFile {
            namespace: namespace.into(),
            source: Box::new(source),
        }
    }

    /// True for errors that come from the filesystem rather than from text.
    pub fn is_io(&self) -> bool {
        matches!(
            self,
            Self::ReadDir { .. } | Self::ReadFile { .. } | Self::Stat { .. } | Self::Io(_)
        )
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, MetaError>;
