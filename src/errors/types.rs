//! Error type definitions for the vidbridge application
//!
//! This module defines all error types used throughout the application,
//! providing a hierarchical error system that makes debugging and error
//! handling more straightforward.

use thiserror::Error;

/// Top-level application error type
///
/// This enum represents all possible errors that can occur in the application.
/// It uses `thiserror` to provide automatic error trait implementations and
/// proper error chaining.
#[derive(Error, Debug)]
pub enum AppError {
    /// Page fetching errors
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Embed resolution errors
    #[error("Extract error: {0}")]
    Extract(#[from] ExtractError),

    /// Web layer errors
    #[error("Web error: {0}")]
    Web(#[from] WebError),

    /// Validation errors
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Resource not found errors
    #[error("Not found: {resource} with id {id}")]
    NotFound { resource: String, id: String },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Generic internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Page fetching specific errors
///
/// Transient network failures are retried inside the fetcher; only the
/// terminal outcome after exhausting retries surfaces as one of these.
#[derive(Error, Debug)]
pub enum FetchError {
    /// All retry attempts exhausted
    #[error("Failed to fetch {url} after {attempts} attempts")]
    RetriesExhausted { url: String, attempts: u32 },

    /// Request timed out
    #[error("Connection timeout: {url}")]
    Timeout { url: String },

    /// Upstream returned a non-success status
    #[error("HTTP status {status} from {url}")]
    Status { url: String, status: u16 },

    /// Transport-level failure for a single attempt
    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },
}

/// Embed resolution specific errors
///
/// A pattern mismatch is not fatal anywhere in resolution: callers treat it
/// as "no result" and fall through to the next strategy or to an
/// external-only fallback entry.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// An expected page structure or script pattern was absent
    #[error("Pattern mismatch on {host}: {detail}")]
    PatternMismatch { host: String, detail: String },
}

/// Web layer specific errors
#[derive(Error, Debug)]
pub enum WebError {
    /// Invalid request format
    #[error("Invalid request: {field} - {message}")]
    InvalidRequest { field: String, message: String },

    /// Proxy target rejected by the SSRF guard
    #[error("Forbidden proxy target: {url}")]
    ForbiddenTarget { url: String },

    /// Upstream fetch for the proxy relay failed
    #[error("Upstream request failed: {message}")]
    UpstreamFailed { message: String },

    /// JSON parsing errors
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

/// Convenience methods for creating common error types
impl AppError {
    /// Create a validation error with a custom message
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a not found error for a specific resource
    pub fn not_found<R: Into<String>, I: Into<String>>(resource: R, id: I) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: id.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl FetchError {
    /// Create a retries exhausted error
    pub fn retries_exhausted<U: Into<String>>(url: U, attempts: u32) -> Self {
        Self::RetriesExhausted {
            url: url.into(),
            attempts,
        }
    }

    /// Create a timeout error
    pub fn timeout<U: Into<String>>(url: U) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Create a transport error
    pub fn transport<U: Into<String>, M: Into<String>>(url: U, message: M) -> Self {
        Self::Transport {
            url: url.into(),
            message: message.into(),
        }
    }
}

impl ExtractError {
    /// Create a pattern mismatch error
    pub fn pattern_mismatch<H: Into<String>, D: Into<String>>(host: H, detail: D) -> Self {
        Self::PatternMismatch {
            host: host.into(),
            detail: detail.into(),
        }
    }
}

impl WebError {
    /// Create an invalid request error
    pub fn invalid_request<F: Into<String>, M: Into<String>>(field: F, message: M) -> Self {
        Self::InvalidRequest {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a forbidden target error
    pub fn forbidden_target<U: Into<String>>(url: U) -> Self {
        Self::ForbiddenTarget { url: url.into() }
    }

    /// Create an upstream failed error
    pub fn upstream_failed<M: Into<String>>(message: M) -> Self {
        Self::UpstreamFailed {
            message: message.into(),
        }
    }
}
