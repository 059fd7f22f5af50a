//! Error taxonomy for the network composition engine.

use spikeflow_timeseries::SeriesError;
use thiserror::Error;

/// Errors raised by layer construction and network evolution.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NetworkError {
    /// Cycle or unresolvable dependency in the network graph, or an
    /// otherwise invalid connection (unknown layer, kind mismatch).
    #[error("Topology error: {0}")]
    Topology(String),

    /// Evolution duration is not an integer multiple of every layer's
    /// timestep within tolerance. Names every offending layer.
    #[error("Timing error: duration {duration} is not a timestep multiple for layer(s) {offenders:?}")]
    Timing {
        offenders: Vec<String>,
        duration: f64,
    },

    /// A layer's internal time diverges from network time.
    #[error("Sync error: {0}")]
    Sync(String),

    /// Weight matrix or state vector mismatched with declared layer sizes.
    #[error("Shape error: {0}")]
    Shape(String),

    /// Invalid layer parameter (e.g. non-positive timestep).
    #[error("Parameter error: {0}")]
    Parameter(String),

    /// Propagated time series failure.
    #[error(transparent)]
    Series(#[from] SeriesError),
}

/// Result type for network operations.
pub type NetResult<T> = core::result::Result<T, NetworkError>;
