//! Error types for the labelcheck library.

use std::io;
use thiserror::Error;

/// Result type alias for labelcheck operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during label verification.
///
/// "Field not found on the label" is never an error: extraction returns
/// empty/false field data and the verifier turns that into a normal fail
/// status. Only adapter-boundary and pre-flight failures are represented
/// here.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading image or application files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The extraction provider returned a response that could not be parsed.
    ///
    /// Not retryable: the provider answered, it just answered garbage.
    /// Callers substitute all-empty sentinel fields and let verification
    /// produce fail statuses.
    #[error("Malformed extraction response: {0}")]
    MalformedResponse(String),

    /// The extraction provider rejected the request due to rate limiting.
    ///
    /// Retryable with backoff. `retry_after` carries the provider's
    /// Retry-After hint in seconds when one was supplied.
    #[error("Extraction provider rate limit hit")]
    RateLimited {
        /// Provider-supplied wait hint, in seconds.
        retry_after: Option<f64>,
    },

    /// A transient extraction provider failure (HTTP 5xx, transport error).
    #[error("Extraction provider error: {0}")]
    Provider(String),

    /// A batch task exhausted its retry budget.
    ///
    /// Caught at wave settlement and sanitized to an error-status result;
    /// never propagated past the batch controller.
    #[error("Verification task failed after {attempts} attempts")]
    TaskFailed {
        /// Number of attempts consumed before giving up.
        attempts: u32,
    },

    /// Invalid caller input, surfaced before any extraction work begins.
    #[error("Validation error: {0}")]
    Validation(String),
}

impl Error {
    /// Whether the batch controller should retry the attempt that produced
    /// this error.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::RateLimited { .. } | Error::Provider(_))
    }

    /// The provider's Retry-After hint in seconds, if any.
    pub fn retry_after(&self) -> Option<f64> {
        match self {
            Error::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}
