//! Interpolation kernel for continuous series.
//!
//! There is no cached interpolator object: every evaluation reads the live
//! `(times, samples, interp_kind, periodic)` state, so a stale interpolator
//! is unrepresentable no matter how the series is mutated.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::base::TimeBase;

/// Interpolation policy for a continuous series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterpKind {
    /// Linear interpolation between neighbouring samples.
    #[default]
    Linear,
    /// Hold the most recent sample (zero-order hold).
    Previous,
    /// Take the nearest sample in time.
    Nearest,
}

/// Evaluates `samples` over `base` at the given query times.
///
/// Returns a `(query.len(), channels)` table. Non-periodic queries outside
/// `[t_start, t_stop]` yield NaN per channel; periodic queries fold into
/// `[t_start, t_stop)` first and wrap across the period seam. Queries
/// inside the domain but outside the sampled span clamp to the edge
/// sample, so clipping to the domain bounds never manufactures NaN.
pub(crate) fn evaluate(
    base: &TimeBase,
    samples: &Array2<f64>,
    kind: InterpKind,
    query: &[f64],
) -> Array2<f64> {
    let channels = samples.ncols();
    let mut out = Array2::from_elem((query.len(), channels), f64::NAN);
    if base.is_empty() || channels == 0 {
        return out;
    }
    for (qi, &t_raw) in query.iter().enumerate() {
        let mut row = out.row_mut(qi);
        if !base.periodic() && !base.contains(t_raw) {
            continue; // stays NaN
        }
        let t = base.fold(t_raw);
        let values = eval_one(base, samples, kind, t);
        for (c, v) in values.into_iter().enumerate() {
            row[c] = v;
        }
    }
    out
}

/// Evaluates a single folded, in-domain query time.
fn eval_one(base: &TimeBase, samples: &Array2<f64>, kind: InterpKind, t: f64) -> Vec<f64> {
    let times = base.times();
    let n = times.len();
    let first = times[0];
    let last = times[n - 1];
    let period = base.duration();

    if t < first {
        if base.periodic() && period > 0.0 {
            // Seam segment: previous neighbour is the last sample, one
            // period earlier.
            return blend(samples, kind, n - 1, last - period, 0, first, t);
        }
        return samples.row(0).to_vec();
    }
    if t > last {
        if base.periodic() && period > 0.0 {
            // Seam segment: next neighbour is the first sample, one
            // period later.
            return blend(samples, kind, n - 1, last, 0, first + period, t);
        }
        return samples.row(n - 1).to_vec();
    }

    // partition_point: first index whose time exceeds t.
    let right = times.partition_point(|&x| x <= t);
    let left = right - 1; // safe: t >= times[0]
    if times[left] == t || right == n {
        return samples.row(left).to_vec();
    }
    blend(samples, kind, left, times[left], right, times[right], t)
}

/// Combines the two neighbouring sample rows per the interpolation policy.
fn blend(
    samples: &Array2<f64>,
    kind: InterpKind,
    left: usize,
    t_left: f64,
    right: usize,
    t_right: f64,
    t: f64,
) -> Vec<f64> {
    let lrow = samples.row(left);
    let rrow = samples.row(right);
    match kind {
        InterpKind::Previous => lrow.to_vec(),
        InterpKind::Nearest => {
            if (t - t_left).abs() <= (t_right - t).abs() {
                lrow.to_vec()
            } else {
                rrow.to_vec()
            }
        }
        InterpKind::Linear => {
            let span = t_right - t_left;
            if span <= 0.0 {
                return lrow.to_vec();
            }
            let frac = (t - t_left) / span;
            lrow.iter()
                .zip(rrow.iter())
                .map(|(&a, &b)| a + frac * (b - a))
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn base(times: Vec<f64>, periodic: bool) -> TimeBase {
        TimeBase::new(times, None, None, periodic, "t").unwrap()
    }

    #[test]
    fn linear_hits_samples_exactly() {
        let b = base(vec![0.0, 1.0, 2.0], false);
        let s = array![[0.0], [10.0], [20.0]];
        let out = evaluate(&b, &s, InterpKind::Linear, &[0.0, 0.5, 1.0, 1.75]);
        assert_eq!(out[[0, 0]], 0.0);
        assert_eq!(out[[1, 0]], 5.0);
        assert_eq!(out[[2, 0]], 10.0);
        assert!((out[[3, 0]] - 17.5).abs() < 1e-12);
    }

    #[test]
    fn previous_holds_last_sample() {
        let b = base(vec![0.0, 1.0], false);
        let s = array![[1.0], [2.0]];
        let out = evaluate(&b, &s, InterpKind::Previous, &[0.9, 1.0]);
        assert_eq!(out[[0, 0]], 1.0);
        assert_eq!(out[[1, 0]], 2.0);
    }

    #[test]
    fn out_of_domain_is_nan_when_not_periodic() {
        let b = base(vec![0.0, 1.0], false);
        let s = array![[1.0], [2.0]];
        let out = evaluate(&b, &s, InterpKind::Linear, &[-0.1, 1.1]);
        assert!(out[[0, 0]].is_nan());
        assert!(out[[1, 0]].is_nan());
    }

    #[test]
    fn periodic_wraps_across_seam() {
        let b = TimeBase::new(vec![0.0, 1.0], Some(0.0), Some(2.0), true, "p").unwrap();
        let s = array![[0.0], [10.0]];
        // t=1.5 sits halfway between the last sample (t=1) and the first
        // sample one period later (t=2).
        let out = evaluate(&b, &s, InterpKind::Linear, &[1.5, 2.5]);
        assert!((out[[0, 0]] - 5.0).abs() < 1e-12);
        assert!((out[[1, 0]] - 5.0).abs() < 1e-12);
    }
}
