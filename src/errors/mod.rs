//! Centralized error handling for the catalog pipeline
//!
//! # Error Categories
//!
//! - **Source Errors**: external catalog connectivity and payload parsing
//! - **Configuration Errors**: missing sources or credentials (the only fatal class)
//! - **Validation Errors**: input validation and business rule violations
//!
//! # Usage
//!
//! ```rust
//! use stream_catalog::errors::{AppError, AppResult};
//!
//! fn example_function() -> AppResult<String> {
//!     Ok("success".to_string())
//! }
//! ```

pub mod types;

pub use types::*;

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;
