use std::path::PathBuf;
use thiserror::Error;

use crate::types::TypeError;

/// Build error types
///
/// `InvalidPattern`, `Discovery` and `CreateDirFailed` are fatal for a run;
/// every other variant is scoped to a single source file.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Invalid source pattern '{pattern}'")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("Failed to read sources matching '{pattern}'")]
    Discovery {
        pattern: String,
        #[source]
        source: glob::GlobError,
    },

    #[error("Failed to create directory: {path}")]
    CreateDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Source path has no file name: {path}")]
    InvalidSource { path: PathBuf },

    #[error("Failed to read {path}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to render {path}: {message}")]
    Render { path: PathBuf, message: String },

    #[error("Failed to derive variable types for {path}")]
    Types {
        path: PathBuf,
        #[source]
        source: TypeError,
    },

    #[error("Failed to postprocess {path}: {message}")]
    Transform { path: PathBuf, message: String },

    #[error("Failed to serialize variables for {path}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write {path}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No space left on device for {path}")]
    DiskFull { path: PathBuf },
}

impl BuildError {
    /// Whether this error aborts the whole run rather than a single file
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            BuildError::InvalidPattern { .. }
                | BuildError::Discovery { .. }
                | BuildError::CreateDirFailed { .. }
        )
    }
}

/// Render an error with its full `source()` chain on one line
pub fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut current = err.source();
    while let Some(cause) = current {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        current = cause.source();
    }
    message
}
