// src/error.rs

//! Unified error handling for the job crawler.

use std::fmt;

use thiserror::Error;

/// Result type alias for crawler operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed outside the fetcher (remote store, client setup)
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

    /// Local SQLite store failed
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A page fetch failed
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchFailure),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Remote store unreachable or misconfigured
    #[error("Remote store error: {0}")]
    RemoteStore(String),

    /// Local store misuse (poisoned lock, bad schema)
    #[error("Storage error: {0}")]
    Storage(String),
}

impl AppError {
    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a remote store error.
    pub fn remote(message: impl fmt::Display) -> Self {
        Self::RemoteStore(message.to_string())
    }

    /// Create a local storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }
}

/// Why a page could not be fetched.
///
/// Every call site treats a failure as "no content for this page" and moves on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    /// The request exceeded the configured timeout
    #[error("request timed out")]
    Timeout,

    /// The server answered with a non-2xx status
    #[error("unexpected status {0}")]
    Status(u16),

    /// The connection (or TLS handshake) could not be established
    #[error("connection failed: {0}")]
    Connect(String),

    /// The response body could not be read
    #[error("failed to read body: {0}")]
    Body(String),

    /// Any other request failure
    #[error("request failed: {0}")]
    Request(String),
}

impl From<reqwest::Error> for FetchFailure {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else if error.is_connect() {
            Self::Connect(error.to_string())
        } else if let Some(status) = error.status() {
            Self::Status(status.as_u16())
        } else if error.is_body() || error.is_decode() {
            Self::Body(error.to_string())
        } else {
            Self::Request(error.to_string())
        }
    }
}
