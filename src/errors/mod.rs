//! Centralized error handling for the vidbridge application
//!
//! This module provides a unified error system across all application layers
//! with consistent reporting and conversion between layer-specific errors.
//!
//! # Error Categories
//!
//! - **Fetch Errors**: outbound page retrieval failures (network, timeout, status)
//! - **Extract Errors**: embed-resolution pattern mismatches
//! - **Web Errors**: bad relay requests, refused proxy targets, upstream failures
//! - **Validation Errors**: malformed inputs rejected at the application boundary
//!
//! # Usage
//!
//! ```rust
//! use vidbridge::errors::{AppError, AppResult};
//!
//! async fn example_function() -> AppResult<String> {
//!     // Function can return any error type that converts to AppError
//!     Ok("success".to_string())
//! }
//! ```

pub mod types;

pub use types::*;

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Convenience type alias for Fetch Results
pub type FetchResult<T> = Result<T, FetchError>;

/// Convenience type alias for Extract Results
pub type ExtractResult<T> = Result<T, ExtractError>;

/// Convenience type alias for Web Results
pub type WebResult<T> = Result<T, WebError>;
