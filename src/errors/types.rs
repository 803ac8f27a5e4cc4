//! Error type definitions for the catalog pipeline
//!
//! This module defines all error types used throughout the application,
//! providing a hierarchical error system that keeps source-level failures
//! distinguishable from fatal configuration problems.

use thiserror::Error;

/// Top-level application error type
///
/// Uses `thiserror` for automatic error trait implementations and proper
/// error chaining. Only `Configuration` is ever fatal for a run; source
/// errors are isolated per source by the orchestrator.
#[derive(Error, Debug)]
pub enum AppError {
    /// Source handling errors
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Configuration errors (missing sources, unreadable config file)
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Validation errors
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Filesystem errors (config file, catalog sink)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Catalog/config serialization failures
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Source handling specific errors
#[derive(Error, Debug)]
pub enum SourceError {
    /// Network connection timeouts
    #[error("Connection timeout: {url}")]
    Timeout { url: String },

    /// Fetch failed after all retry attempts
    #[error("Fetch failed for {url} after {attempts} attempts: {message}")]
    FetchFailed {
        url: String,
        attempts: u32,
        message: String,
    },

    /// Payload did not have the expected shape
    #[error("Malformed payload from {url}: {message}")]
    MalformedPayload { url: String, message: String },
}

impl AppError {
    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        AppError::Configuration {
            message: message.into(),
        }
    }

    /// Create a validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        AppError::Validation {
            message: message.into(),
        }
    }
}

impl SourceError {
    /// Create a malformed-payload error
    pub fn malformed<U: Into<String>, M: Into<String>>(url: U, message: M) -> Self {
        SourceError::MalformedPayload {
            url: url.into(),
            message: message.into(),
        }
    }
}
