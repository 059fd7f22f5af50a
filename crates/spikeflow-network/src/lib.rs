//! # spikeflow-network
//!
//! The layer contract and network composition engine:
//! - **`Layer`**: the minimal trait every network node satisfies (sizes,
//!   timestep, clock, state, weights, `evolve`).
//! - **`LayerBase`**: shared plumbing concrete neuron models build on.
//! - **`Network`**: a directed acyclic graph of layers kept in temporal
//!   lock-step and evolved batch-wise, with a synchronous training
//!   callback loop.
//!
//! Concrete neuron models live outside this crate; they implement
//! [`Layer`] and exchange `spikeflow_timeseries::Series` values.

mod error;
mod layer;
mod network;

pub use error::{NetResult, NetworkError};
pub use layer::{is_timestep_multiple, Layer, LayerBase, TIMESTEP_REL_TOL};
pub use network::{LayerOutputs, Network, SYNC_REL_TOL};
