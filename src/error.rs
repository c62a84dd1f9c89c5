//! Error types for the decomposer.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our custom error.
pub type Result<T> = std::result::Result<T, DecomposeError>;

/// Errors that can occur while decomposing a document.
#[derive(Error, Debug)]
pub enum DecomposeError {
    /// Error reading or writing files.
    #[error("I/O error for path '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error during serialization/deserialization.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The document path does not exist.
    #[error("Document not found at '{0}'")]
    DocumentNotFound(PathBuf),

    /// The PDF backend failed to read or write a document.
    #[error("PDF error: {0}")]
    Pdf(String),

    /// The document carries no outline at all.
    #[error("Document at '{0}' has no outline")]
    MissingOutline(PathBuf),

    /// The record file does not exist.
    #[error("Record file not found at '{0}'")]
    RecordNotFound(PathBuf),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A page range that does not fit the document.
    #[error("Invalid page range {start}-{end} for a document of {page_count} pages")]
    InvalidPageRange {
        start: usize,
        end: usize,
        page_count: usize,
    },

    /// Commit was requested before a document was loaded.
    #[error("No hierarchy loaded; load a document first")]
    NotLoaded,

    /// Commit was requested before an output directory was chosen.
    #[error("No output directory selected")]
    NoOutputSelected,
}

impl DecomposeError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<lopdf::Error> for DecomposeError {
    fn from(err: lopdf::Error) -> Self {
        DecomposeError::Pdf(err.to_string())
    }
}

impl From<serde_json::Error> for DecomposeError {
    fn from(err: serde_json::Error) -> Self {
        DecomposeError::Serialization(err.to_string())
    }
}
