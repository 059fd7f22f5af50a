//! Network composition and evolution engine.
//!
//! A `Network` owns a set of layers connected by directed input edges and
//! keeps them in temporal lock-step: outside of an in-progress `evolve`
//! call every layer's clock equals the network clock (the sync
//! invariant). Topology mutations atomically recompute the evolution
//! order or roll back.

use ahash::{AHashMap, AHashSet};
use spikeflow_timeseries::Series;
use tracing::{debug, info, warn};

use crate::error::{NetResult, NetworkError};
use crate::layer::{is_timestep_multiple, Layer};

/// Tolerance for the sync invariant, relative to the magnitude of the
/// expected time (with a floor of 1).
pub const SYNC_REL_TOL: f64 = 1e-9;

/// Per-evolve mapping from layer name to its output series.
pub type LayerOutputs = AHashMap<String, Series>;

/// A directed acyclic graph of layers evolved in temporal lock-step.
#[derive(Default)]
pub struct Network {
    layers: AHashMap<String, Box<dyn Layer>>,
    /// Layer names in insertion order; the tie-break for the evolution
    /// order and the iteration order for resets and timing checks.
    insertion_order: Vec<String>,
    /// Directed input edges, keyed by target name. A layer has at most
    /// one declared input layer.
    input_edges: AHashMap<String, String>,
    /// Layers fed by the external input series during `evolve`.
    external_inputs: AHashSet<String>,
    evolution_order: Vec<String>,
    t: f64,
}

impl Network {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current network time.
    pub fn t(&self) -> f64 {
        self.t
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Layer names in insertion order.
    pub fn layer_names(&self) -> &[String] {
        &self.insertion_order
    }

    /// The cached evolution order.
    pub fn evolution_order(&self) -> &[String] {
        &self.evolution_order
    }

    pub fn layer(&self, name: &str) -> Option<&dyn Layer> {
        self.layers.get(name).map(|l| l.as_ref())
    }

    pub fn layer_mut(&mut self, name: &str) -> Option<&mut dyn Layer> {
        self.layers.get_mut(name).map(|l| &mut **l as &mut dyn Layer)
    }

    /// Name of the declared input layer of `target`, if connected.
    pub fn input_layer(&self, target: &str) -> Option<&str> {
        self.input_edges.get(target).map(String::as_str)
    }

    /// Whether `name` is fed by the external input during `evolve`.
    pub fn receives_external_input(&self, name: &str) -> bool {
        self.external_inputs.contains(name)
    }

    /// Inserts a layer and returns its final (possibly suffixed) name.
    ///
    /// A name collision is auto-resolved by appending `_0`, `_1`, ... to
    /// the requested name. A fresh layer has no edges, so it is appended
    /// to the evolution order directly; the order stays valid.
    pub fn add_layer(&mut self, mut layer: Box<dyn Layer>, receives_external_input: bool) -> String {
        let requested = layer.name().to_string();
        let mut name = requested.clone();
        let mut suffix = 0usize;
        while self.layers.contains_key(&name) {
            name = format!("{}_{}", requested, suffix);
            suffix += 1;
        }
        if name != requested {
            debug!(
                target: "spikeflow-network",
                "layer name '{}' taken; inserting as '{}'",
                requested,
                name
            );
            layer.set_name(name.clone());
        }
        if receives_external_input {
            self.external_inputs.insert(name.clone());
        }
        self.insertion_order.push(name.clone());
        self.evolution_order.push(name.clone());
        self.layers.insert(name.clone(), layer);
        name
    }

    /// Removes a layer along with every edge touching it.
    ///
    /// # Errors
    /// * `NetworkError::Topology` if no layer of that name exists.
    pub fn remove_layer(&mut self, name: &str) -> NetResult<Box<dyn Layer>> {
        let layer = self
            .layers
            .remove(name)
            .ok_or_else(|| NetworkError::Topology(format!("unknown layer '{}'", name)))?;
        self.insertion_order.retain(|n| n != name);
        self.external_inputs.remove(name);
        self.input_edges.remove(name);
        self.input_edges.retain(|_, source| source != name);
        // Removing a node from a valid DAG cannot introduce a cycle.
        self.evolution_order = self.compute_evolution_order()?;
        Ok(layer)
    }

    /// Connects `source -> target`, declaring `source` as the input layer
    /// of `target`.
    ///
    /// On a `Topology` failure (cycle) the edge is rolled back and the
    /// prior evolution order kept; the network is left in its pre-call
    /// state.
    ///
    /// # Errors
    /// * `NetworkError::Topology` if a layer is unknown, the series kinds
    ///   are incompatible, or the edge would create a cycle.
    /// * `NetworkError::Shape` if `source.size != target.size_in`.
    pub fn connect(&mut self, source: &str, target: &str) -> NetResult<()> {
        let src = self
            .layers
            .get(source)
            .ok_or_else(|| NetworkError::Topology(format!("unknown source layer '{}'", source)))?;
        let tgt = self
            .layers
            .get(target)
            .ok_or_else(|| NetworkError::Topology(format!("unknown target layer '{}'", target)))?;
        if src.size() != tgt.size_in() {
            return Err(NetworkError::Shape(format!(
                "cannot connect '{}' (size {}) to '{}' (size_in {})",
                source,
                src.size(),
                target,
                tgt.size_in()
            )));
        }
        if src.output_kind() != tgt.input_kind() {
            return Err(NetworkError::Topology(format!(
                "cannot connect '{}' ({} output) to '{}' ({} input)",
                source,
                src.output_kind(),
                target,
                tgt.input_kind()
            )));
        }
        let previous = self.input_edges.insert(target.to_string(), source.to_string());
        match self.compute_evolution_order() {
            Ok(order) => {
                self.evolution_order = order;
                debug!(
                    target: "spikeflow-network",
                    "connected '{}' -> '{}'; evolution order {:?}",
                    source,
                    target,
                    self.evolution_order
                );
                Ok(())
            }
            Err(e) => {
                // Roll back: restore the pre-call edge state and order.
                match previous {
                    Some(prev) => {
                        self.input_edges.insert(target.to_string(), prev);
                    }
                    None => {
                        self.input_edges.remove(target);
                    }
                }
                Err(e)
            }
        }
    }

    /// Removes the declared input edge of `target`, if any.
    pub fn disconnect(&mut self, target: &str) -> NetResult<()> {
        if self.input_edges.remove(target).is_some() {
            self.evolution_order = self.compute_evolution_order()?;
        }
        Ok(())
    }

    /// Greedy topological sort over the depends-on relation.
    ///
    /// A layer is eligible once its declared input layer (if any) has
    /// been scheduled. Ties among simultaneously eligible layers break by
    /// insertion order, so the result is deterministic.
    ///
    /// # Errors
    /// * `NetworkError::Topology` if no eligible layer remains while
    ///   candidates do (a cycle or unresolved dependency).
    fn compute_evolution_order(&self) -> NetResult<Vec<String>> {
        let mut remaining: Vec<String> = self.insertion_order.clone();
        let mut order = Vec::with_capacity(remaining.len());
        while !remaining.is_empty() {
            let eligible = remaining.iter().position(|name| {
                self.input_edges
                    .get(name)
                    .map_or(true, |source| !remaining.contains(source))
            });
            match eligible {
                Some(idx) => order.push(remaining.remove(idx)),
                None => {
                    return Err(NetworkError::Topology(format!(
                        "cannot resolve evolution order; unschedulable layers: {:?}",
                        remaining
                    )));
                }
            }
        }
        Ok(order)
    }

    /// Layers whose clock diverges from `expected`.
    fn sync_offenders(&self, expected: f64) -> Vec<String> {
        let tol = SYNC_REL_TOL * expected.abs().max(1.0);
        self.insertion_order
            .iter()
            .filter(|name| {
                self.layers
                    .get(name.as_str())
                    .map(|l| (l.t() - expected).abs() > tol)
                    .unwrap_or(false)
            })
            .cloned()
            .collect()
    }

    /// Evolves every layer by `duration` (defaulting to the external
    /// input's own span) in evolution order.
    ///
    /// Each layer receives the external series if it is flagged for
    /// external input, otherwise the already-computed output of its
    /// declared input layer, otherwise no input. Network time advances by
    /// `duration` only after all layers complete; on any error the
    /// partial per-layer outputs are discarded.
    ///
    /// # Errors
    /// * `NetworkError::Timing` naming every layer whose `dt` does not
    ///   evenly divide `duration`.
    /// * `NetworkError::Sync` if a layer clock disagrees with network
    ///   time before evolution (after a warning) or after it (fatal).
    pub fn evolve(
        &mut self,
        external_input: &Series,
        duration: Option<f64>,
    ) -> NetResult<LayerOutputs> {
        let duration = duration.unwrap_or_else(|| external_input.duration());
        let offenders: Vec<String> = self
            .insertion_order
            .iter()
            .filter(|name| {
                self.layers
                    .get(name.as_str())
                    .map(|l| !is_timestep_multiple(duration, l.dt()))
                    .unwrap_or(false)
            })
            .cloned()
            .collect();
        if !offenders.is_empty() {
            return Err(NetworkError::Timing { offenders, duration });
        }

        let drifted = self.sync_offenders(self.t);
        if !drifted.is_empty() {
            warn!(
                target: "spikeflow-network",
                "layer clock(s) {:?} diverged from network time {} before evolve",
                drifted,
                self.t
            );
            return Err(NetworkError::Sync(format!(
                "layer(s) {:?} out of sync with network time {} before evolution",
                drifted, self.t
            )));
        }

        let mut outputs = LayerOutputs::default();
        for name in self.evolution_order.clone() {
            let input: Option<&Series> = if self.external_inputs.contains(name.as_str()) {
                Some(external_input)
            } else if let Some(source) = self.input_edges.get(name.as_str()) {
                outputs.get(source.as_str())
            } else {
                None
            };
            let layer = self
                .layers
                .get_mut(name.as_str())
                .ok_or_else(|| NetworkError::Topology(format!("unknown layer '{}'", name)))?;
            let output = layer.evolve(input, duration)?;
            outputs.insert(name, output);
        }

        let expected = self.t + duration;
        let desynced = self.sync_offenders(expected);
        if !desynced.is_empty() {
            return Err(NetworkError::Sync(format!(
                "layer(s) {:?} out of sync with network time {} after evolution",
                desynced, expected
            )));
        }
        self.t = expected;
        info!(
            target: "spikeflow-network",
            "evolved {} layer(s) by {}; network time now {}",
            outputs.len(),
            duration,
            self.t
        );
        Ok(outputs)
    }

    /// Evolves in strictly sequential batches, invoking `trainer` after
    /// each batch.
    ///
    /// The total duration splits into batches of `batch_duration`
    /// (default: one batch covering everything); for each batch the
    /// external input is clipped to the batch window, `evolve` runs, and
    /// `trainer(network, batch_outputs, is_first, is_last)` is invoked
    /// synchronously. Layer state carries across batches, so batches are
    /// never reordered or overlapped.
    pub fn train<F>(
        &mut self,
        mut trainer: F,
        external_input: &Series,
        duration: Option<f64>,
        batch_duration: Option<f64>,
    ) -> NetResult<()>
    where
        F: FnMut(&mut Network, &LayerOutputs, bool, bool),
    {
        let total = duration.unwrap_or_else(|| external_input.duration());
        let batch = match batch_duration {
            Some(b) if !(b > 0.0) => {
                return Err(NetworkError::Parameter(format!(
                    "batch duration must be positive, got {}",
                    b
                )));
            }
            Some(b) => b.min(total),
            None => total,
        };
        let num_batches = if batch > 0.0 {
            (total / batch).ceil() as usize
        } else {
            1
        };
        let t0 = external_input.t_start();
        for i in 0..num_batches {
            let b_start = t0 + i as f64 * batch;
            let b_stop = (b_start + batch).min(t0 + total);
            let batch_input = external_input.clip(b_start, b_stop)?;
            let outputs = self.evolve(&batch_input, Some(b_stop - b_start))?;
            trainer(self, &outputs, i == 0, i + 1 == num_batches);
        }
        Ok(())
    }

    /// Resets every layer's state vector; clocks are untouched.
    pub fn reset_state(&mut self) {
        for layer in self.layers.values_mut() {
            layer.reset_state();
        }
    }

    /// Rewinds every layer's clock and the network clock to 0.
    pub fn reset_time(&mut self) {
        for layer in self.layers.values_mut() {
            layer.reset_time();
        }
        self.t = 0.0;
    }

    /// Resets all layer state and all clocks.
    pub fn reset_all(&mut self) {
        for layer in self.layers.values_mut() {
            layer.reset_all();
        }
        self.t = 0.0;
    }
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Network(t={}, {} layer(s))", self.t, self.layers.len())?;
        for name in &self.insertion_order {
            if let Some(layer) = self.layers.get(name) {
                let feed = if self.external_inputs.contains(name) {
                    " <- external".to_string()
                } else if let Some(source) = self.input_edges.get(name) {
                    format!(" <- {}", source)
                } else {
                    String::new()
                };
                writeln!(
                    f,
                    "  {}: {} -> {} [{} in, {} out]{}",
                    name,
                    layer.size_in(),
                    layer.size(),
                    layer.input_kind(),
                    layer.output_kind(),
                    feed
                )?;
            }
        }
        Ok(())
    }
}
