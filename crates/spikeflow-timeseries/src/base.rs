//! Shared time-trace state for both series kinds.
//!
//! `TimeBase` owns the ordered time trace plus the `[t_start, t_stop]`
//! domain bounds, the periodicity flag, and the series label. Both
//! `ContinuousSeries` and `EventSeries` embed one and route every mutation
//! of the trace through its validated setters, so an out-of-order trace is
//! unrepresentable outside of a returned `SeriesError::Order`.

use crate::error::{Result, SeriesError};

/// Ordered time trace with domain bounds and periodicity.
///
/// Invariants:
/// - `times` is sorted ascending (non-decreasing) and finite.
/// - `t_start <= times[0]` and `t_stop >= times[last]` when non-empty.
/// - `t_start <= t_stop`.
#[derive(Clone, Debug, PartialEq)]
pub struct TimeBase {
    times: Vec<f64>,
    t_start: f64,
    t_stop: f64,
    periodic: bool,
    name: String,
}

impl TimeBase {
    /// Creates a new time base from a trace and optional explicit bounds.
    ///
    /// Bounds default to the first/last trace entries (or `0.0` for an
    /// empty trace).
    ///
    /// # Errors
    /// * `SeriesError::Order` if the trace is not sorted ascending or
    ///   contains non-finite entries.
    /// * `SeriesError::Range` if explicit bounds exclude part of the trace
    ///   or `t_start > t_stop`.
    pub fn new(
        times: Vec<f64>,
        t_start: Option<f64>,
        t_stop: Option<f64>,
        periodic: bool,
        name: impl Into<String>,
    ) -> Result<Self> {
        check_sorted(&times)?;
        let t_start = t_start.unwrap_or_else(|| times.first().copied().unwrap_or(0.0));
        let t_stop = t_stop.unwrap_or_else(|| times.last().copied().unwrap_or(t_start));
        let base = TimeBase {
            times,
            t_start,
            t_stop,
            periodic,
            name: name.into(),
        };
        base.check_bounds()?;
        Ok(base)
    }

    fn check_bounds(&self) -> Result<()> {
        if self.t_start > self.t_stop {
            return Err(SeriesError::Range(format!(
                "t_start ({}) must not exceed t_stop ({})",
                self.t_start, self.t_stop
            )));
        }
        if let (Some(&first), Some(&last)) = (self.times.first(), self.times.last()) {
            if self.t_start > first || self.t_stop < last {
                return Err(SeriesError::Range(format!(
                    "bounds [{}, {}] exclude part of the time trace [{}, {}]",
                    self.t_start, self.t_stop, first, last
                )));
            }
        }
        Ok(())
    }

    /// The ordered time trace.
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// Number of time points in the trace.
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// Whether the trace holds no time points.
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn t_start(&self) -> f64 {
        self.t_start
    }

    pub fn t_stop(&self) -> f64 {
        self.t_stop
    }

    /// `t_stop - t_start`; the fold period for periodic series.
    pub fn duration(&self) -> f64 {
        self.t_stop - self.t_start
    }

    pub fn periodic(&self) -> bool {
        self.periodic
    }

    pub fn set_periodic(&mut self, periodic: bool) {
        self.periodic = periodic;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Replaces the time trace, widening the domain bounds outward if the
    /// new trace extends past them.
    ///
    /// # Errors
    /// * `SeriesError::Order` if the new trace is not sorted ascending.
    pub fn set_times(&mut self, times: Vec<f64>) -> Result<()> {
        check_sorted(&times)?;
        if let (Some(&first), Some(&last)) = (times.first(), times.last()) {
            self.t_start = self.t_start.min(first);
            self.t_stop = self.t_stop.max(last);
        }
        self.times = times;
        Ok(())
    }

    /// Moves `t_start`, rejecting bounds that would exclude stored samples.
    pub fn set_t_start(&mut self, t_start: f64) -> Result<()> {
        if let Some(&first) = self.times.first() {
            if t_start > first {
                return Err(SeriesError::Range(format!(
                    "t_start ({}) would exclude the first time point ({})",
                    t_start, first
                )));
            }
        }
        if t_start > self.t_stop {
            return Err(SeriesError::Range(format!(
                "t_start ({}) must not exceed t_stop ({})",
                t_start, self.t_stop
            )));
        }
        self.t_start = t_start;
        Ok(())
    }

    /// Moves `t_stop`, rejecting bounds that would exclude stored samples.
    pub fn set_t_stop(&mut self, t_stop: f64) -> Result<()> {
        if let Some(&last) = self.times.last() {
            if t_stop < last {
                return Err(SeriesError::Range(format!(
                    "t_stop ({}) would exclude the last time point ({})",
                    t_stop, last
                )));
            }
        }
        if t_stop < self.t_start {
            return Err(SeriesError::Range(format!(
                "t_stop ({}) must not fall below t_start ({})",
                t_stop, self.t_start
            )));
        }
        self.t_stop = t_stop;
        Ok(())
    }

    /// Shifts the trace and both bounds by `offset`.
    pub fn delay_in_place(&mut self, offset: f64) {
        for t in &mut self.times {
            *t += offset;
        }
        self.t_start += offset;
        self.t_stop += offset;
    }

    /// Folds a query time into `[t_start, t_stop)` when periodic.
    ///
    /// Non-periodic bases (and zero-duration ones) return the time
    /// unchanged. A time at exactly `t_stop` folds to `t_start`: the
    /// periodic domain is half-open.
    pub fn fold(&self, t: f64) -> f64 {
        let period = self.duration();
        if !self.periodic || period <= 0.0 {
            return t;
        }
        self.t_start + (t - self.t_start).rem_euclid(period)
    }

    /// Whether `t` lies inside the closed domain `[t_start, t_stop]`.
    pub fn contains(&self, t: f64) -> bool {
        t >= self.t_start && t <= self.t_stop
    }

    /// Median inter-sample spacing of the trace; `0.0` with fewer than two
    /// time points. Used as the default `append_in_time` gap.
    pub fn median_timestep(&self) -> f64 {
        if self.times.len() < 2 {
            return 0.0;
        }
        let mut diffs: Vec<f64> = self.times.windows(2).map(|w| w[1] - w[0]).collect();
        diffs.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let mid = diffs.len() / 2;
        if diffs.len() % 2 == 1 {
            diffs[mid]
        } else {
            0.5 * (diffs[mid - 1] + diffs[mid])
        }
    }
}

/// Validates that a candidate trace is sorted ascending and finite.
pub(crate) fn check_sorted(times: &[f64]) -> Result<()> {
    for (i, t) in times.iter().enumerate() {
        if !t.is_finite() {
            return Err(SeriesError::Order(format!(
                "time point {} is not finite ({})",
                i, t
            )));
        }
    }
    if let Some(w) = times.windows(2).find(|w| w[1] < w[0]) {
        return Err(SeriesError::Order(format!(
            "time trace decreases from {} to {}",
            w[0], w[1]
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsorted_trace_is_rejected() {
        let err = TimeBase::new(vec![0.0, 2.0, 1.0], None, None, false, "bad").unwrap_err();
        assert!(matches!(err, SeriesError::Order(_)));
    }

    #[test]
    fn bounds_default_to_trace_extremes() {
        let base = TimeBase::new(vec![0.5, 1.0, 2.5], None, None, false, "tb").unwrap();
        assert_eq!(base.t_start(), 0.5);
        assert_eq!(base.t_stop(), 2.5);
        assert_eq!(base.duration(), 2.0);
    }

    #[test]
    fn fold_wraps_half_open() {
        let base = TimeBase::new(vec![0.0, 1.0], Some(0.0), Some(2.0), true, "p").unwrap();
        assert_eq!(base.fold(2.0), 0.0);
        assert_eq!(base.fold(3.5), 1.5);
        assert_eq!(base.fold(-0.5), 1.5);
    }

    #[test]
    fn narrowing_bounds_past_samples_fails() {
        let mut base = TimeBase::new(vec![0.0, 1.0, 2.0], None, None, false, "tb").unwrap();
        assert!(base.set_t_start(0.5).is_err());
        assert!(base.set_t_stop(1.5).is_err());
        assert!(base.set_t_start(-1.0).is_ok());
    }

    #[test]
    fn median_timestep_of_irregular_trace() {
        let base = TimeBase::new(vec![0.0, 1.0, 2.0, 4.0], None, None, false, "tb").unwrap();
        assert_eq!(base.median_timestep(), 1.0);
    }
}
