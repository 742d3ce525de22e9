//! Process-level errors for the registry validator.
//!
//! Per-entry failures never surface here; they become diagnostics. These
//! variants cover the inputs and outputs of a run as a whole.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors that prevent a validation run from completing.
#[derive(Debug, Error)]
pub enum ValidatorError {
    /// The catalog file could not be read.
    #[error("failed to read catalog {path}: {source}")]
    CatalogRead {
        /// Path of the catalog file.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The catalog file is not a JSON array of entries.
    #[error("invalid catalog {path}: {reason}")]
    CatalogParse {
        /// Path of the catalog file.
        path: Utf8PathBuf,
        /// Description of the parse error.
        reason: String,
    },

    /// The configuration file could not be read.
    #[error("failed to read configuration {path}: {source}")]
    ConfigRead {
        /// Path of the configuration file.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for this tool.
    #[error("invalid configuration {path}: {reason}")]
    ConfigParse {
        /// Path of the configuration file.
        path: Utf8PathBuf,
        /// Description of the parse error.
        reason: String,
    },

    /// A configuration value is well-formed TOML but unusable.
    #[error("invalid configuration value for {key}: {reason}")]
    InvalidConfig {
        /// The offending key.
        key: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// Failed to write the report.
    #[error("failed to write report")]
    WriteFailed {
        /// The underlying error that caused the write to fail.
        #[source]
        source: std::io::Error,
    },
}

/// Result type for validator operations.
pub type Result<T> = std::result::Result<T, ValidatorError>;
