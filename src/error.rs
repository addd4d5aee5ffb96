//! Error handling for the scanning helper
//!
//! Provides structured error types with contextual information for:
//! - Configuration errors (invalid settings, missing files)
//! - Report generation errors (filesystem faults)
//! - Analysis errors (missing API key, HTTP failures)
//! - Network errors (peer resolution, connectivity demo)
//!
//! The scan executor itself never surfaces errors through this type: its
//! contract is to collapse every failure into diagnostic text.

use std::io;
use thiserror::Error;

/// Main result type used throughout the application
pub type Result<T> = std::result::Result<T, GhostVenomError>;

/// Error enum covering all application error scenarios
#[derive(Error, Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum GhostVenomError {
    /// Configuration related errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Validation errors for user input
    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    /// Report generation and file write errors
    #[error("Report error: {path} - {message}")]
    Report { path: String, message: String },

    /// LLM analysis errors
    #[error("Analysis error: {message}")]
    Analysis { message: String },

    /// Network and peer resolution errors
    #[error("Network error: {message}")]
    Network { message: String },

    /// File I/O errors
    #[error("IO error: {operation} - {message}")]
    Io { operation: String, message: String },

    /// Generic internal errors with context
    #[error("Internal error: {context} - {message}")]
    Internal { context: String, message: String },
}

impl GhostVenomError {
    /// Create a configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a validation error
    pub fn validation<F: Into<String>, M: Into<String>>(field: F, message: M) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a report error
    pub fn report<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::Report {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an analysis error
    pub fn analysis<S: Into<String>>(message: S) -> Self {
        Self::Analysis {
            message: message.into(),
        }
    }

    /// Create a network error
    pub fn network<S: Into<String>>(message: S) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create an IO error
    pub fn io<O: Into<String>, M: Into<String>>(operation: O, message: M) -> Self {
        Self::Io {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal<C: Into<String>, M: Into<String>>(context: C, message: M) -> Self {
        Self::Internal {
            context: context.into(),
            message: message.into(),
        }
    }

    /// Check if error is a configuration issue
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::Configuration { .. } | Self::Validation { .. })
    }

    /// Check if error is non-fatal to the scan pipeline
    ///
    /// Report writes and analysis are best-effort: the scan result is still
    /// surfaced to the user when either of them fails.
    pub fn is_non_fatal(&self) -> bool {
        matches!(self, Self::Report { .. } | Self::Analysis { .. })
    }
}

// Implement conversions from common error types
impl From<io::Error> for GhostVenomError {
    fn from(error: io::Error) -> Self {
        Self::io("IO operation", error.to_string())
    }
}

impl From<serde_json::Error> for GhostVenomError {
    fn from(error: serde_json::Error) -> Self {
        Self::internal("JSON", error.to_string())
    }
}

impl From<config::ConfigError> for GhostVenomError {
    fn from(error: config::ConfigError) -> Self {
        Self::config(error.to_string())
    }
}

impl From<reqwest::Error> for GhostVenomError {
    fn from(error: reqwest::Error) -> Self {
        Self::analysis(error.to_string())
    }
}

impl From<anyhow::Error> for GhostVenomError {
    fn from(error: anyhow::Error) -> Self {
        Self::internal("anyhow", error.to_string())
    }
}
