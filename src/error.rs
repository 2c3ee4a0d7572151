// src/error.rs

//! Unified error handling for the watcher.

use std::fmt;

use thiserror::Error;

use crate::utils::redact_endpoint;

/// Result type alias for watcher operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Link pattern failed to compile
    #[error("Invalid link pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// Embedded store failed
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// Configuration source could not be read
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Listing page could not be fetched
    #[error("Fetch error for {url}: {message}")]
    Fetch { url: String, message: String },

    /// A single webhook delivery failed
    #[error("Delivery error for {endpoint}: {message}")]
    Delivery { endpoint: String, message: String },
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a fetch error for the listing page.
    pub fn fetch(url: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Fetch {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Create a delivery error. The endpoint is redacted since webhook URLs carry secrets.
    pub fn delivery(endpoint: &str, message: impl fmt::Display) -> Self {
        Self::Delivery {
            endpoint: redact_endpoint(endpoint),
            message: message.to_string(),
        }
    }

    /// Whether this error came from the listing fetch.
    pub fn is_fetch(&self) -> bool {
        matches!(self, Self::Fetch { .. })
    }
}
