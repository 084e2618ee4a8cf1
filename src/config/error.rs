use std::{
    fmt, io,
    path::{Path, PathBuf},
    result,
};

use thiserror::Error;

/// Failure to load or validate the configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration field has an unusable value
    #[error("invalid config field '{field}' in {component}: {reason}")]
    InvalidField {
        /// The field that is invalid
        field: String,
        /// Section containing the field
        component: String,
        /// Reason why the field is invalid
        reason: String,
    },

    /// I/O operation error
    #[error("I/O error on '{path}': {details}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// I/O error details
        details: String,
    },

    /// TOML parsing error with location context
    #[error("failed to parse TOML at '{location}': {details}")]
    TomlParse {
        /// File path, or "string" for in-memory content
        location: String,
        /// Parse error details
        details: String,
    },

    /// Configuration directory could not be determined
    #[error("cannot locate configuration directory: {0}")]
    NoConfigDir(#[from] io::Error),
}

/// Result of configuration operations.
pub type Result<T> = result::Result<T, ConfigError>;

impl ConfigError {
    /// Creates a TOML parsing error with optional file path context.
    pub fn toml_parse(error: impl fmt::Display, path: Option<&Path>) -> Self {
        let location = match path {
            Some(p) => p.to_string_lossy().to_string(),
            None => "string".to_string(),
        };

        ConfigError::TomlParse {
            location,
            details: error.to_string(),
        }
    }

    pub(crate) fn io(error: &io::Error, path: &Path) -> Self {
        ConfigError::Io {
            path: path.to_path_buf(),
            details: error.to_string(),
        }
    }
}
