//! Error types for waymark.
//!
//! This module defines all error types used throughout the waymark crate,
//! providing detailed context for debugging and user-friendly error messages.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for waymark operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Store Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
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

    // === Backup Errors ===
    /// A backup document failed validation; nothing was applied.
    #[error("backup rejected: {reason}")]
    BackupValidation {
        /// Why the document was rejected.
        reason: String,
    },

    // === Location Source Errors ===
    /// A location source failed to start.
    #[error("failed to start location source '{name}': {message}")]
    SourceStart {
        /// Name of the location source.
        name: &'static str,
        /// Description of what went wrong.
        message: String,
    },

    /// A location source failed to stop.
    #[error("failed to stop location source '{name}': {message}")]
    SourceStop {
        /// Name of the location source.
        name: &'static str,
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

/// A specialized Result type for waymark operations.
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

    /// Create a backup validation error.
    #[must_use]
    pub fn backup_validation(reason: impl Into<String>) -> Self {
        Self::BackupValidation {
            reason: reason.into(),
        }
    }

    /// Create a location source start error.
    #[must_use]
    pub fn source_start(name: &'static str, message: impl Into<String>) -> Self {
        Self::SourceStart {
            name,
            message: message.into(),
        }
    }

    /// Create a location source stop error.
    #[must_use]
    pub fn source_stop(name: &'static str, message: impl Into<String>) -> Self {
        Self::SourceStop {
            name,
            message: message.into(),
        }
    }

    /// Check if this error is a backup validation rejection.
    #[must_use]
    pub fn is_backup_validation(&self) -> bool {
        matches!(self, Self::BackupValidation { .. })
    }
}
