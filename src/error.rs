//! Error types for Excavar
//!
//! This module defines the error types used throughout the library.
//!
//! Parse failures are deliberately absent: fuzzy text parsing (diff stats,
//! ticket ids in commit messages) degrades to "no data" instead of erroring,
//! see [`crate::vcs::parse`].

use thiserror::Error;

/// Result type alias for Excavar operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during Excavar operations
#[derive(Error, Debug)]
pub enum Error {
    /// The release/ticket tracker cannot be reached or returned a
    /// malformed payload. Fatal to the run, never retried.
    #[error("tracker source error: {0}")]
    Source(String),

    /// A version-control operation (checkout, log, read) failed.
    /// Callers working per-unit log these and fall back to zero metrics.
    #[error("vcs error: {0}")]
    Vcs(String),

    /// Dataset construction error
    #[error("data error: {0}")]
    Data(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Configuration(String),

    /// I/O error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
