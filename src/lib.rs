//! # spikeflow
//!
//! Simulation of spiking / continuous-value neuron layers composed into
//! directed acyclic graphs, built on a time-series abstraction for all
//! signal exchange between layers.
//!
//! This umbrella crate re-exports the workspace members:
//! - [`timeseries`] — `ContinuousSeries`, `EventSeries`, the `Series`
//!   tagged variant, and the persisted snapshot format.
//! - [`network`] — the `Layer` contract and the `Network`
//!   composition/evolution engine with its training-callback loop.
//!
//! Concrete neuron models are external collaborators: they implement
//! [`Layer`] and exchange [`Series`] values through a [`Network`].
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use spikeflow::{ContinuousSeries, InterpKind, Network, Series};
//!
//! let input = ContinuousSeries::new(
//!     vec![0.0, 0.1],
//!     ndarray::Array2::ones((2, 1)),
//!     InterpKind::Linear,
//!     "stimulus",
//! ).unwrap();
//!
//! let mut net = Network::new();
//! // net.add_layer(Box::new(my_model), true);
//! let outputs = net.evolve(&Series::Continuous(input), None).unwrap();
//! ```

pub use spikeflow_network as network;
pub use spikeflow_timeseries as timeseries;

pub use spikeflow_network::{
    is_timestep_multiple, Layer, LayerBase, LayerOutputs, NetResult, Network, NetworkError,
};
pub use spikeflow_timeseries::{
    BinOp, ContinuousSeries, EventSeries, InterpKind, Series, SeriesError, SeriesKind,
    SeriesRecord, TimeBase,
};
