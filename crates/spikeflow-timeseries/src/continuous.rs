//! Continuous (interpolation-based) sampled signal.

use ndarray::{concatenate, Array2, Axis};
use tracing::debug;

use crate::base::TimeBase;
use crate::error::{Result, SeriesError};
use crate::interpolate::{evaluate, InterpKind};

/// Element-wise binary operation over continuous series samples.
///
/// `Add`/`Sub` treat a NaN operand as `0.0` unless both operands are NaN
/// at that position (then the result stays NaN). The multiplicative
/// operations propagate NaN unconditionally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Pow,
}

impl BinOp {
    fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            BinOp::Add | BinOp::Sub => {
                if a.is_nan() && b.is_nan() {
                    return f64::NAN;
                }
                let a = if a.is_nan() { 0.0 } else { a };
                let b = if b.is_nan() { 0.0 } else { b };
                if self == BinOp::Add {
                    a + b
                } else {
                    a - b
                }
            }
            BinOp::Mul => a * b,
            BinOp::Div => a / b,
            BinOp::FloorDiv => (a / b).floor(),
            BinOp::Pow => a.powf(b),
        }
    }
}

/// A sampled multi-channel signal with an interpolation policy.
///
/// The sample table always has one row per time point
/// (`samples.nrows() == times.len()`); every mutation path re-validates
/// this, so a mismatched state is only observable as a returned
/// `SeriesError::Shape`.
///
/// # Examples
/// ```
/// use ndarray::array;
/// use spikeflow_timeseries::{ContinuousSeries, InterpKind};
///
/// let series = ContinuousSeries::new(
///     vec![0.0, 1.0, 2.0],
///     array![[0.0], [10.0], [20.0]],
///     InterpKind::Linear,
///     "ramp",
/// ).unwrap();
/// let values = series.at(&[0.5]);
/// assert_eq!(values[[0, 0]], 5.0);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct ContinuousSeries {
    base: TimeBase,
    samples: Array2<f64>,
    interp_kind: InterpKind,
}

impl ContinuousSeries {
    /// Creates a non-periodic series with bounds defaulting to the trace
    /// extremes.
    pub fn new(
        times: Vec<f64>,
        samples: Array2<f64>,
        interp_kind: InterpKind,
        name: impl Into<String>,
    ) -> Result<Self> {
        Self::with_options(times, samples, None, None, false, interp_kind, name)
    }

    /// Creates a series with explicit bounds and periodicity.
    ///
    /// # Errors
    /// * `SeriesError::Shape` if `samples.nrows() != times.len()`.
    /// * `SeriesError::Order` / `SeriesError::Range` per [`TimeBase::new`].
    pub fn with_options(
        times: Vec<f64>,
        samples: Array2<f64>,
        t_start: Option<f64>,
        t_stop: Option<f64>,
        periodic: bool,
        interp_kind: InterpKind,
        name: impl Into<String>,
    ) -> Result<Self> {
        if samples.nrows() != times.len() {
            return Err(SeriesError::Shape(format!(
                "sample table has {} rows but the time trace has {} points",
                samples.nrows(),
                times.len()
            )));
        }
        let base = TimeBase::new(times, t_start, t_stop, periodic, name)?;
        Ok(ContinuousSeries {
            base,
            samples,
            interp_kind,
        })
    }

    //region Accessors

    pub fn times(&self) -> &[f64] {
        self.base.times()
    }

    pub fn samples(&self) -> &Array2<f64> {
        &self.samples
    }

    pub fn num_channels(&self) -> usize {
        self.samples.ncols()
    }

    pub fn len(&self) -> usize {
        self.base.len()
    }

    pub fn is_empty(&self) -> bool {
        self.base.is_empty()
    }

    pub fn t_start(&self) -> f64 {
        self.base.t_start()
    }

    pub fn t_stop(&self) -> f64 {
        self.base.t_stop()
    }

    pub fn duration(&self) -> f64 {
        self.base.duration()
    }

    pub fn periodic(&self) -> bool {
        self.base.periodic()
    }

    pub fn set_periodic(&mut self, periodic: bool) {
        self.base.set_periodic(periodic);
    }

    pub fn name(&self) -> &str {
        self.base.name()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.base.set_name(name);
    }

    pub fn interp_kind(&self) -> InterpKind {
        self.interp_kind
    }

    pub fn set_interp_kind(&mut self, kind: InterpKind) {
        self.interp_kind = kind;
    }

    pub fn set_t_start(&mut self, t_start: f64) -> Result<()> {
        self.base.set_t_start(t_start)
    }

    pub fn set_t_stop(&mut self, t_stop: f64) -> Result<()> {
        self.base.set_t_stop(t_stop)
    }

    /// Replaces the sample table.
    ///
    /// # Errors
    /// * `SeriesError::Shape` if the row count differs from the trace
    ///   length.
    pub fn set_samples(&mut self, samples: Array2<f64>) -> Result<()> {
        if samples.nrows() != self.base.len() {
            return Err(SeriesError::Shape(format!(
                "sample table has {} rows but the time trace has {} points",
                samples.nrows(),
                self.base.len()
            )));
        }
        self.samples = samples;
        Ok(())
    }

    /// Replaces the time trace; its length must match the sample rows.
    pub fn set_times(&mut self, times: Vec<f64>) -> Result<()> {
        if times.len() != self.samples.nrows() {
            return Err(SeriesError::Shape(format!(
                "new time trace has {} points but the sample table has {} rows",
                times.len(),
                self.samples.nrows()
            )));
        }
        self.base.set_times(times)
    }

    //endregion

    /// Interpolates the series at the query times.
    ///
    /// Returns a `(query.len(), num_channels)` table. Out-of-domain,
    /// non-periodic queries are all-NaN; periodic queries fold modulo
    /// `duration` into `[t_start, t_stop)` first.
    pub fn at(&self, query: &[f64]) -> Array2<f64> {
        evaluate(&self.base, &self.samples, self.interp_kind, query)
    }

    /// Returns a copy shifted by `offset` in time.
    pub fn delay(&self, offset: f64) -> Self {
        let mut out = self.clone();
        out.delay_in_place(offset);
        out
    }

    pub fn delay_in_place(&mut self, offset: f64) {
        self.base.delay_in_place(offset);
    }

    /// Restricts the series to `[t_start, t_stop)` with default options:
    /// all channels, stop excluded, endpoint samples ensured.
    pub fn clip(&self, t_start: f64, t_stop: f64) -> Result<Self> {
        self.clip_with(t_start, t_stop, None, false, true)
    }

    /// Restricts the series to the requested window.
    ///
    /// For a periodic series whose window exceeds one period, the stored
    /// trace is tiled with period offsets before clipping so periodic
    /// content outside the stored window is represented. With
    /// `ensure_endpoint_samples`, a sample is guaranteed at exactly
    /// `t_start` (and at `t_stop` when `include_stop`) by interpolation.
    ///
    /// # Errors
    /// * `SeriesError::Range` if `t_start > t_stop`.
    pub fn clip_with(
        &self,
        t_start: f64,
        t_stop: f64,
        channels: Option<&[usize]>,
        include_stop: bool,
        ensure_endpoint_samples: bool,
    ) -> Result<Self> {
        if t_start > t_stop {
            return Err(SeriesError::Range(format!(
                "clip window start ({}) exceeds stop ({})",
                t_start, t_stop
            )));
        }
        let in_window = |t: f64| t >= t_start && (t < t_stop || (include_stop && t <= t_stop));

        // (time, stored row index) pairs inside the window.
        let mut picks: Vec<(f64, usize)> = Vec::new();
        let period = self.duration();
        if self.periodic() && period > 0.0 && !self.is_empty() {
            let times = self.times();
            let first = times[0];
            let last = times[times.len() - 1];
            let k_min = ((t_start - last) / period).floor() as i64;
            let k_max = ((t_stop - first) / period).ceil() as i64;
            for k in k_min..=k_max {
                let offset = k as f64 * period;
                for (i, &t) in times.iter().enumerate() {
                    if in_window(t + offset) {
                        picks.push((t + offset, i));
                    }
                }
            }
            picks.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        } else {
            for (i, &t) in self.times().iter().enumerate() {
                if in_window(t) {
                    picks.push((t, i));
                }
            }
        }

        let selected: Vec<usize> = match channels {
            Some(chs) => chs.to_vec(),
            None => (0..self.num_channels()).collect(),
        };
        let mut new_times: Vec<f64> = picks.iter().map(|(t, _)| *t).collect();
        let mut rows: Vec<Vec<f64>> = picks
            .iter()
            .map(|&(_, i)| selected.iter().map(|&c| self.samples[[i, c]]).collect())
            .collect();

        if ensure_endpoint_samples {
            if new_times.first() != Some(&t_start) {
                let row = self.at(&[t_start]);
                new_times.insert(0, t_start);
                rows.insert(0, selected.iter().map(|&c| row[[0, c]]).collect());
            }
            if include_stop && new_times.last() != Some(&t_stop) {
                let row = self.at(&[t_stop]);
                new_times.push(t_stop);
                rows.push(selected.iter().map(|&c| row[[0, c]]).collect());
            }
        }

        let samples = rows_to_table(&rows, selected.len());
        Self::with_options(
            new_times,
            samples,
            Some(t_start),
            Some(t_stop),
            self.periodic(),
            self.interp_kind,
            self.name(),
        )
    }

    pub fn clip_in_place(
        &mut self,
        t_start: f64,
        t_stop: f64,
        channels: Option<&[usize]>,
        include_stop: bool,
        ensure_endpoint_samples: bool,
    ) -> Result<()> {
        *self = self.clip_with(t_start, t_stop, channels, include_stop, ensure_endpoint_samples)?;
        Ok(())
    }

    /// Produces a new non-periodic series sampled at `new_times`.
    ///
    /// The samples are exactly `self.at(new_times)`, so resampling twice
    /// onto the same trace is idempotent.
    pub fn resample(&self, new_times: &[f64]) -> Result<Self> {
        let samples = self.at(new_times);
        Self::with_options(
            new_times.to_vec(),
            samples,
            None,
            None,
            false,
            self.interp_kind,
            self.name(),
        )
    }

    pub fn resample_in_place(&mut self, new_times: &[f64]) -> Result<()> {
        *self = self.resample(new_times)?;
        Ok(())
    }

    /// Unions the time bases of `self` and `other`.
    ///
    /// With `remove_duplicates`, timestamps of `other` equal (at stored
    /// f64 precision) to an existing timestamp of `self` are dropped
    /// before concatenation. The result is sorted with a stable sort, so
    /// retained duplicate timestamps keep self-before-other order.
    ///
    /// # Errors
    /// * `SeriesError::Shape` if the channel counts differ.
    pub fn merge(&self, other: &Self, remove_duplicates: bool) -> Result<Self> {
        if other.num_channels() != self.num_channels() {
            return Err(SeriesError::Shape(format!(
                "cannot merge series with {} channels into series with {} channels",
                other.num_channels(),
                self.num_channels()
            )));
        }
        let mut entries: Vec<(f64, Vec<f64>)> = Vec::with_capacity(self.len() + other.len());
        for (i, &t) in self.times().iter().enumerate() {
            entries.push((t, self.samples.row(i).to_vec()));
        }
        let own_times = self.times();
        for (i, &t) in other.times().iter().enumerate() {
            if remove_duplicates && own_times.binary_search_by(|x| cmp_f64(*x, t)).is_ok() {
                continue;
            }
            entries.push((t, other.samples.row(i).to_vec()));
        }
        entries.sort_by(|a, b| cmp_f64(a.0, b.0)); // stable: ties keep insertion order

        let new_times: Vec<f64> = entries.iter().map(|(t, _)| *t).collect();
        let rows: Vec<Vec<f64>> = entries.into_iter().map(|(_, r)| r).collect();
        let samples = rows_to_table(&rows, self.num_channels());
        Self::with_options(
            new_times,
            samples,
            Some(self.t_start().min(other.t_start())),
            Some(self.t_stop().max(other.t_stop())),
            self.periodic(),
            self.interp_kind,
            self.name(),
        )
    }

    pub fn merge_in_place(&mut self, other: &Self, remove_duplicates: bool) -> Result<()> {
        *self = self.merge(other, remove_duplicates)?;
        Ok(())
    }

    /// Delays `other` so it starts at `self.t_stop + offset`, then merges
    /// without duplicate removal. `offset` defaults to the median
    /// inter-sample spacing of `self`.
    pub fn append_in_time(&self, other: &Self, offset: Option<f64>) -> Result<Self> {
        let offset = offset.unwrap_or_else(|| self.base.median_timestep());
        let delayed = other.delay(self.t_stop() + offset - other.t_start());
        self.merge(&delayed, false)
    }

    /// Resamples `other` onto this series' time base and concatenates its
    /// channels to the right of this series' channels.
    pub fn append_in_channels(&self, other: &Self) -> Result<Self> {
        let other_samples = other.at(self.times());
        let samples = concatenate(Axis(1), &[self.samples.view(), other_samples.view()])
            .map_err(|e| SeriesError::Shape(format!("channel concatenation failed: {}", e)))?;
        debug!(
            target: "spikeflow-timeseries",
            "append_in_channels: {} + {} -> {} channels",
            self.num_channels(),
            other.num_channels(),
            samples.ncols()
        );
        let mut out = self.clone();
        out.samples = samples;
        Ok(out)
    }

    //region Arithmetic

    /// Applies `op` against another series, interpolated onto this series'
    /// time base first.
    ///
    /// # Errors
    /// * `SeriesError::Shape` if the channel counts differ.
    pub fn zip_with_series(&self, other: &Self, op: BinOp) -> Result<Self> {
        if other.num_channels() != self.num_channels() {
            return Err(SeriesError::Shape(format!(
                "operand has {} channels, expected {}",
                other.num_channels(),
                self.num_channels()
            )));
        }
        let rhs = other.at(self.times());
        self.zip_with_samples(&rhs, op)
    }

    /// Applies `op` against a raw sample table, either matching this
    /// series' shape exactly or a single row broadcast across all rows.
    pub fn zip_with_samples(&self, rhs: &Array2<f64>, op: BinOp) -> Result<Self> {
        if rhs.ncols() != self.num_channels() || (rhs.nrows() != self.len() && rhs.nrows() != 1) {
            return Err(SeriesError::Shape(format!(
                "operand shape ({}, {}) incompatible with series shape ({}, {})",
                rhs.nrows(),
                rhs.ncols(),
                self.len(),
                self.num_channels()
            )));
        }
        let broadcast_row = rhs.nrows() == 1;
        let mut out = self.clone();
        for ((r, c), v) in out.samples.indexed_iter_mut() {
            let b = if broadcast_row { rhs[[0, c]] } else { rhs[[r, c]] };
            *v = op.apply(*v, b);
        }
        Ok(out)
    }

    /// Applies `op` against a scalar broadcast over every element.
    pub fn zip_with_scalar(&self, rhs: f64, op: BinOp) -> Self {
        let mut out = self.clone();
        out.samples.mapv_inplace(|a| op.apply(a, rhs));
        out
    }

    /// Element-wise absolute value.
    pub fn abs(&self) -> Self {
        let mut out = self.clone();
        out.samples.mapv_inplace(f64::abs);
        out
    }

    /// Element-wise power with a scalar exponent; NaN propagates.
    pub fn powf(&self, exponent: f64) -> Self {
        self.zip_with_scalar(exponent, BinOp::Pow)
    }

    /// Element-wise floor division by a scalar; NaN propagates.
    pub fn floor_div_scalar(&self, divisor: f64) -> Self {
        self.zip_with_scalar(divisor, BinOp::FloorDiv)
    }

    //endregion
}

impl std::ops::Add<f64> for &ContinuousSeries {
    type Output = ContinuousSeries;
    fn add(self, rhs: f64) -> ContinuousSeries {
        self.zip_with_scalar(rhs, BinOp::Add)
    }
}

impl std::ops::Sub<f64> for &ContinuousSeries {
    type Output = ContinuousSeries;
    fn sub(self, rhs: f64) -> ContinuousSeries {
        self.zip_with_scalar(rhs, BinOp::Sub)
    }
}

impl std::ops::Mul<f64> for &ContinuousSeries {
    type Output = ContinuousSeries;
    fn mul(self, rhs: f64) -> ContinuousSeries {
        self.zip_with_scalar(rhs, BinOp::Mul)
    }
}

impl std::ops::Div<f64> for &ContinuousSeries {
    type Output = ContinuousSeries;
    fn div(self, rhs: f64) -> ContinuousSeries {
        self.zip_with_scalar(rhs, BinOp::Div)
    }
}

impl std::ops::Neg for &ContinuousSeries {
    type Output = ContinuousSeries;
    fn neg(self) -> ContinuousSeries {
        let mut out = self.clone();
        out.samples.mapv_inplace(|a| -a);
        out
    }
}

/// Total order over f64 used for time sorting; NaN times are rejected at
/// construction so the fallback never fires on valid data.
fn cmp_f64(a: f64, b: f64) -> std::cmp::Ordering {
    a.partial_cmp(&b).unwrap_or(std::cmp::Ordering::Equal)
}

fn rows_to_table(rows: &[Vec<f64>], channels: usize) -> Array2<f64> {
    let mut table = Array2::zeros((rows.len(), channels));
    for (r, row) in rows.iter().enumerate() {
        for (c, &v) in row.iter().enumerate() {
            table[[r, c]] = v;
        }
    }
    table
}
