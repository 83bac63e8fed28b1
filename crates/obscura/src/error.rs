//! Error types for obscura.
//!
//! Only the edges of the system are fallible: settings persistence,
//! configuration loading and document snapshot loading. Selector resolution,
//! highlighting and effect application never fail; they skip what they
//! cannot act on.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for obscura operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Settings Persistence Errors ===
    /// Failed to read the settings blob.
    #[error("failed to read settings from {path}: {source}")]
    SettingsRead {
        /// Path to the settings file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write the settings blob.
    #[error("failed to write settings to {path}: {source}")]
    SettingsWrite {
        /// Path to the settings file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The stored settings blob could not be decoded.
    #[error("invalid settings blob: {message}")]
    SettingsDecode {
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Document Errors ===
    /// A document snapshot could not be loaded.
    #[error("failed to load document {path}: {message}")]
    DocumentLoad {
        /// Path to the snapshot file.
        path: PathBuf,
        /// Description of what went wrong.
        message: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for obscura operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a settings decode error.
    #[must_use]
    pub fn settings_decode(message: impl Into<String>) -> Self {
        Self::SettingsDecode {
            message: message.into(),
        }
    }

    /// Create a document load error.
    #[must_use]
    pub fn document_load(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::DocumentLoad {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Check if this error came from the settings persistence transport.
    #[must_use]
    pub fn is_persistence_error(&self) -> bool {
        matches!(
            self,
            Self::SettingsRead { .. }
                | Self::SettingsWrite { .. }
                | Self::SettingsDecode { .. }
                | Self::DirectoryCreate { .. }
        )
    }
}
