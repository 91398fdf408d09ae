// src/error.rs

//! Unified error handling for the statement resolver.

use std::fmt;

use thiserror::Error;

/// Result type alias for resolver operations.
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

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Problem id missing or empty after sanitization
    #[error("Missing or invalid problem ID: {0:?}")]
    InvalidId(String),

    /// A single upstream attempt failed (status, transport or content check)
    #[error("Upstream unavailable for {context}: {message}")]
    Upstream { context: String, message: String },

    /// JSON-RPC envelope carried an error
    #[error("RPC error in {method}: {message}")]
    Rpc { method: String, message: String },

    /// Every tier and language was exhausted
    #[error("Problem content not found: {id}")]
    ContentNotFound { id: String },
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

    /// Create an upstream error with context.
    pub fn upstream(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Upstream {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Create a JSON-RPC error for a `module/method` path.
    pub fn rpc(method: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Rpc {
            method: method.into(),
            message: message.to_string(),
        }
    }

    /// True when the error means "nothing to show", not "something broke".
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ContentNotFound { .. })
    }

    /// True when the caller sent a bad request.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidId(_))
    }
}
