//! # spikeflow-timeseries
//!
//! Time series data model underlying all signal exchange between
//! spikeflow network layers:
//! - **`ContinuousSeries`**: interpolation-based sampled signals with
//!   clipping, resampling, merging, and NaN-aware arithmetic.
//! - **`EventSeries`**: discrete (time, channel) event streams with
//!   rasterization, windowed queries, delayed merging, and channel
//!   concatenation.
//! - **`Series` / `SeriesKind`**: the closed tagged variant layers use to
//!   exchange either kind and check connection compatibility.
//! - **`SeriesRecord`**: the persisted snapshot format (JSON via serde).

mod base;
mod continuous;
mod error;
mod event;
mod interpolate;
mod kind;
mod snapshot;

pub use base::TimeBase;
pub use continuous::{BinOp, ContinuousSeries};
pub use error::{Result, SeriesError};
pub use event::EventSeries;
pub use interpolate::InterpKind;
pub use kind::{Series, SeriesKind};
pub use snapshot::SeriesRecord;
