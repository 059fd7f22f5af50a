//! The minimal contract every network node satisfies, plus the shared
//! plumbing concrete neuron models build on.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use spikeflow_timeseries::{Series, SeriesKind};

use crate::error::{NetResult, NetworkError};

/// Relative tolerance for the "duration is a timestep multiple" check.
pub const TIMESTEP_REL_TOL: f64 = 1e-5;

/// A network node: a stateful transformer from an input series to an
/// output series, advancing an internal clock in steps of `dt`.
///
/// Concrete neuron models (integrate-and-fire variants, rate models,
/// hardware-mapped layers) implement this trait; the composition engine
/// only ever talks to it.
pub trait Layer {
    fn name(&self) -> &str;

    /// Renames the layer. The network uses this to resolve name
    /// collisions on insertion; user code normally has no reason to call
    /// it on an owned layer.
    fn set_name(&mut self, name: String);

    /// Output dimension (number of units / output channels).
    fn size(&self) -> usize;

    /// Input dimension.
    fn size_in(&self) -> usize;

    /// Simulation timestep; strictly positive.
    fn dt(&self) -> f64;

    /// Current internal time. Starts at 0 and is non-decreasing under
    /// `evolve`.
    fn t(&self) -> f64;

    fn state(&self) -> ArrayView1<'_, f64>;

    fn weights(&self) -> ArrayView2<'_, f64>;

    /// Replaces the weight matrix; the shape must stay `size_in x size`.
    fn set_weights(&mut self, weights: Array2<f64>) -> NetResult<()>;

    /// Kind of series this layer consumes.
    fn input_kind(&self) -> SeriesKind;

    /// Kind of series this layer produces.
    fn output_kind(&self) -> SeriesKind;

    /// Advances the layer by `duration`, consuming `input` (if any) and
    /// producing the layer's output over that span. Must advance `t` by
    /// exactly `duration`.
    fn evolve(&mut self, input: Option<&Series>, duration: f64) -> NetResult<Series>;

    /// Reverts the state vector without touching the clock.
    fn reset_state(&mut self);

    /// Rewinds the clock to 0 without touching the state.
    fn reset_time(&mut self);

    fn reset_all(&mut self) {
        self.reset_state();
        self.reset_time();
    }
}

/// Common plumbing for concrete layers: weight matrix, timestep, noise
/// amplitude, clock, and state vector.
///
/// `size_in`/`size` are fixed by the weight matrix shape at construction;
/// resizing requires constructing a new layer.
#[derive(Clone, Debug)]
pub struct LayerBase {
    name: String,
    weights: Array2<f64>,
    dt: f64,
    noise_std: f64,
    t: f64,
    state: Array1<f64>,
}

impl LayerBase {
    /// Creates the shared plumbing from a `size_in x size` weight matrix.
    ///
    /// # Errors
    /// * `NetworkError::Parameter` if `dt` is not strictly positive or
    ///   not finite.
    pub fn new(
        weights: Array2<f64>,
        dt: f64,
        noise_std: f64,
        name: impl Into<String>,
    ) -> NetResult<Self> {
        if !(dt > 0.0) || !dt.is_finite() {
            return Err(NetworkError::Parameter(format!(
                "layer timestep must be a positive finite value, got {}",
                dt
            )));
        }
        let size = weights.ncols();
        Ok(LayerBase {
            name: name.into(),
            weights,
            dt,
            noise_std,
            t: 0.0,
            state: Array1::zeros(size),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub fn size(&self) -> usize {
        self.weights.ncols()
    }

    pub fn size_in(&self) -> usize {
        self.weights.nrows()
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn noise_std(&self) -> f64 {
        self.noise_std
    }

    pub fn t(&self) -> f64 {
        self.t
    }

    pub fn state(&self) -> ArrayView1<'_, f64> {
        self.state.view()
    }

    /// Overwrites the state vector; its length must equal `size`.
    pub fn set_state(&mut self, state: Array1<f64>) -> NetResult<()> {
        if state.len() != self.size() {
            return Err(NetworkError::Shape(format!(
                "state vector of length {} for layer '{}' of size {}",
                state.len(),
                self.name,
                self.size()
            )));
        }
        self.state = state;
        Ok(())
    }

    pub fn weights(&self) -> ArrayView2<'_, f64> {
        self.weights.view()
    }

    /// Replaces the weight matrix, keeping the declared shape.
    ///
    /// # Errors
    /// * `NetworkError::Shape` if the replacement is not `size_in x size`.
    pub fn set_weights(&mut self, weights: Array2<f64>) -> NetResult<()> {
        if weights.dim() != self.weights.dim() {
            return Err(NetworkError::Shape(format!(
                "weight matrix {:?} for layer '{}' declared as {:?}",
                weights.dim(),
                self.name,
                self.weights.dim()
            )));
        }
        self.weights = weights;
        Ok(())
    }

    /// Number of whole timesteps covering `duration`.
    ///
    /// # Errors
    /// * `NetworkError::Timing` if `duration` is not an integer multiple
    ///   of `dt` within a relative tolerance of [`TIMESTEP_REL_TOL`].
    pub fn timesteps(&self, duration: f64) -> NetResult<usize> {
        if !is_timestep_multiple(duration, self.dt) {
            return Err(NetworkError::Timing {
                offenders: vec![self.name.clone()],
                duration,
            });
        }
        Ok((duration / self.dt).round() as usize)
    }

    /// Bumps the clock by `duration`.
    pub fn advance(&mut self, duration: f64) {
        self.t += duration;
    }

    pub fn reset_state(&mut self) {
        self.state.fill(0.0);
    }

    pub fn reset_time(&mut self) {
        self.t = 0.0;
    }

    pub fn reset_all(&mut self) {
        self.reset_state();
        self.reset_time();
    }
}

/// Whether `duration` is an integer multiple of `dt` within the relative
/// tolerance.
pub fn is_timestep_multiple(duration: f64, dt: f64) -> bool {
    let ratio = duration / dt;
    (ratio - ratio.round()).abs() <= TIMESTEP_REL_TOL * ratio.abs().max(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn non_positive_timestep_is_rejected() {
        let w = Array2::zeros((2, 3));
        assert!(LayerBase::new(w.clone(), 0.0, 0.0, "l").is_err());
        assert!(LayerBase::new(w, -0.1, 0.0, "l").is_err());
    }

    #[test]
    fn sizes_come_from_the_weight_matrix() {
        let base = LayerBase::new(Array2::zeros((2, 3)), 0.01, 0.0, "l").unwrap();
        assert_eq!(base.size_in(), 2);
        assert_eq!(base.size(), 3);
        assert_eq!(base.state().len(), 3);
    }

    #[test]
    fn timestep_multiple_check_uses_relative_tolerance() {
        let base = LayerBase::new(Array2::zeros((1, 1)), 0.01, 0.0, "l").unwrap();
        assert_eq!(base.timesteps(0.1).unwrap(), 10);
        assert!(base.timesteps(0.105).is_err());
        // 1e-9 absolute slack on ten steps is well within 1e-5 relative.
        assert_eq!(base.timesteps(0.1 + 1e-9).unwrap(), 10);
    }

    #[test]
    fn weight_replacement_must_keep_shape() {
        let mut base = LayerBase::new(Array2::zeros((2, 3)), 0.01, 0.0, "l").unwrap();
        assert!(base.set_weights(Array2::zeros((3, 2))).is_err());
        assert!(base.set_weights(Array2::ones((2, 3))).is_ok());
    }
}
