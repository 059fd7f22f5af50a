//! Error taxonomy for the time series data model.

use thiserror::Error;

/// Errors raised by time series construction and transforms.
///
/// Validation errors are raised immediately at the point of mutation,
/// never deferred to a later query.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SeriesError {
    /// Time trace is not sorted ascending (constructor or setter).
    #[error("Time trace out of order: {0}")]
    Order(String),

    /// Sample or channel array size mismatched with the time trace length.
    #[error("Shape mismatch: {0}")]
    Shape(String),

    /// Invalid clip/query bounds.
    #[error("Invalid range: {0}")]
    Range(String),

    /// Persisted record's declared kind does not match the loader.
    #[error("Format mismatch: {0}")]
    Format(String),
}

/// Result type for time series operations.
pub type Result<T> = core::result::Result<T, SeriesError>;
