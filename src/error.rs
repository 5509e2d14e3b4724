// src/error.rs

//! Unified error handling for the rotator.

use std::fmt;

use thiserror::Error;

/// Result type alias for rotator operations.
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

    /// Regular expression failed to compile
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Configuration error (fatal)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Listing or detail page could not be fetched or parsed
    #[error("Fetch error for {context}: {message}")]
    Fetch { context: String, message: String },

    /// Publishing failed
    #[error("Publish error: {0}")]
    Publish(#[from] PublishError),
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

    /// Create a fetch error with context.
    pub fn fetch(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Fetch {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Whether this error must abort the process.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Config(_) | Self::Validation(_))
    }
}

/// Failure reported by a publisher.
#[derive(Error, Debug)]
pub enum PublishError {
    /// Rate limited or temporarily unavailable; worth trying in a later run
    #[error("retry later (HTTP {status}): {reason}")]
    RetryLater {
        status: u16,
        reason: String,
        /// Unix seconds at which the rate limit window resets, if reported
        reset_at: Option<i64>,
    },

    /// The platform refused this post
    #[error("rejected (HTTP {status}): {reason}")]
    Rejected { status: u16, reason: String },

    /// Request never completed
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    /// Success status without a usable post id
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl PublishError {
    /// Whether the failure is transient on the platform side.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RetryLater { .. } | Self::Transport(_))
    }
}
