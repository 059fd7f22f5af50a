use ndarray::{array, Array2};
use spikeflow_timeseries::{BinOp, ContinuousSeries, InterpKind, SeriesError};

fn ramp(kind: InterpKind) -> ContinuousSeries {
    // 11 samples on an integer grid, 2 channels.
    let times: Vec<f64> = (0..=10).map(|i| i as f64).collect();
    let mut samples = Array2::zeros((11, 2));
    for i in 0..11 {
        samples[[i, 0]] = i as f64;
        samples[[i, 1]] = 100.0 - i as f64;
    }
    ContinuousSeries::new(times, samples, kind, "ramp").unwrap()
}

#[test]
fn out_of_domain_queries_are_all_nan_when_not_periodic() {
    let s = ramp(InterpKind::Linear);
    let out = s.at(&[-1.0, 10.5, 42.0]);
    assert!(out.iter().all(|v| v.is_nan()));
}

#[test]
fn in_domain_queries_are_never_nan() {
    let s = ramp(InterpKind::Linear);
    let out = s.at(&[0.0, 3.25, 10.0]);
    assert!(out.iter().all(|v| v.is_finite()));
}

#[test]
fn clip_round_trip_law_holds_for_every_interp_kind() {
    for kind in [InterpKind::Linear, InterpKind::Previous, InterpKind::Nearest] {
        let s = ramp(kind);
        let ab = s.clip(1.0, 4.0).unwrap();
        let bc = s.clip(4.0, 7.0).unwrap();
        let merged = ab.merge(&bc, true).unwrap();
        let whole = s.clip(1.0, 7.0).unwrap();
        assert_eq!(merged.times(), whole.times());
        for (m, w) in merged.samples().iter().zip(whole.samples().iter()) {
            assert!((m - w).abs() < 1e-12);
        }
    }
}

#[test]
fn clip_ensures_endpoint_sample_by_interpolation() {
    let s = ramp(InterpKind::Linear);
    let clipped = s.clip(1.5, 4.0).unwrap();
    assert_eq!(clipped.times()[0], 1.5);
    assert!((clipped.samples()[[0, 0]] - 1.5).abs() < 1e-12);
    assert_eq!(clipped.t_start(), 1.5);
    assert_eq!(clipped.t_stop(), 4.0);
}

#[test]
fn clip_include_stop_adds_the_stop_sample() {
    let s = ramp(InterpKind::Linear);
    let clipped = s.clip_with(1.0, 3.5, None, true, true).unwrap();
    assert_eq!(*clipped.times().last().unwrap(), 3.5);
    assert!((clipped.samples()[[clipped.len() - 1, 0]] - 3.5).abs() < 1e-12);
}

#[test]
fn clip_selects_channels() {
    let s = ramp(InterpKind::Linear);
    let clipped = s.clip_with(0.0, 5.0, Some(&[1]), false, true).unwrap();
    assert_eq!(clipped.num_channels(), 1);
    assert_eq!(clipped.samples()[[0, 0]], 100.0);
}

#[test]
fn clip_of_periodic_series_tiles_past_the_stored_window() {
    let s = ContinuousSeries::with_options(
        vec![0.0, 0.5],
        array![[1.0], [2.0]],
        Some(0.0),
        Some(1.0),
        true,
        InterpKind::Previous,
        "per",
    )
    .unwrap();
    // Window spans two periods; the stored content must repeat.
    let clipped = s.clip(0.0, 2.0).unwrap();
    assert_eq!(clipped.times(), &[0.0, 0.5, 1.0, 1.5]);
    assert_eq!(clipped.samples().column(0).to_vec(), vec![1.0, 2.0, 1.0, 2.0]);
}

#[test]
fn periodic_query_at_exact_period_boundary_folds_to_start() {
    let s = ContinuousSeries::with_options(
        vec![0.0, 0.5],
        array![[1.0], [2.0]],
        Some(0.0),
        Some(1.0),
        true,
        InterpKind::Previous,
        "per",
    )
    .unwrap();
    let out = s.at(&[1.0, 2.0, -1.0]);
    assert_eq!(out[[0, 0]], 1.0);
    assert_eq!(out[[1, 0]], 1.0);
    assert_eq!(out[[2, 0]], 1.0);
}

#[test]
fn resample_is_idempotent() {
    let s = ramp(InterpKind::Linear);
    let grid: Vec<f64> = vec![-0.5, 0.25, 1.0, 2.75, 9.5, 10.0, 12.0];
    let once = s.resample(&grid).unwrap();
    let twice = once.resample(&grid).unwrap();
    assert_eq!(once.times(), twice.times());
    for (a, b) in once.samples().iter().zip(twice.samples().iter()) {
        // Out-of-domain grid points hold NaN in both; NaN != NaN, so
        // compare bitwise-equivalently.
        assert!(a == b || (a.is_nan() && b.is_nan()));
    }
}

#[test]
fn resample_result_is_non_periodic() {
    let s = ContinuousSeries::with_options(
        vec![0.0, 0.5],
        array![[1.0], [2.0]],
        Some(0.0),
        Some(1.0),
        true,
        InterpKind::Linear,
        "per",
    )
    .unwrap();
    let r = s.resample(&[0.0, 0.25, 0.5]).unwrap();
    assert!(!r.periodic());
}

#[test]
fn merge_with_duplicate_removal_is_idempotent() {
    let s = ramp(InterpKind::Linear);
    let merged = s.merge(&s, true).unwrap();
    assert_eq!(merged, s);
}

#[test]
fn merge_without_duplicate_removal_keeps_both_in_stable_order() {
    let a = ContinuousSeries::new(vec![0.0, 1.0], array![[1.0], [2.0]], InterpKind::Linear, "a")
        .unwrap();
    let b = ContinuousSeries::new(vec![1.0, 2.0], array![[20.0], [30.0]], InterpKind::Linear, "b")
        .unwrap();
    let merged = a.merge(&b, false).unwrap();
    assert_eq!(merged.times(), &[0.0, 1.0, 1.0, 2.0]);
    // At the tied timestamp, self's row comes before other's.
    assert_eq!(merged.samples()[[1, 0]], 2.0);
    assert_eq!(merged.samples()[[2, 0]], 20.0);
}

#[test]
fn merge_rejects_mismatched_channel_counts() {
    let a = ContinuousSeries::new(vec![0.0], array![[1.0]], InterpKind::Linear, "a").unwrap();
    let b = ContinuousSeries::new(vec![0.0], array![[1.0, 2.0]], InterpKind::Linear, "b").unwrap();
    assert!(matches!(a.merge(&b, false), Err(SeriesError::Shape(_))));
}

#[test]
fn append_in_time_uses_median_spacing_by_default() {
    let a = ContinuousSeries::new(
        vec![0.0, 1.0, 2.0],
        array![[1.0], [2.0], [3.0]],
        InterpKind::Linear,
        "a",
    )
    .unwrap();
    let b = ContinuousSeries::new(vec![0.0, 1.0], array![[4.0], [5.0]], InterpKind::Linear, "b")
        .unwrap();
    let out = a.append_in_time(&b, None).unwrap();
    // b lands at a.t_stop (2.0) + median spacing (1.0) = 3.0.
    assert_eq!(out.times(), &[0.0, 1.0, 2.0, 3.0, 4.0]);
    assert_eq!(out.samples().column(0).to_vec(), vec![1.0, 2.0, 3.0, 4.0, 5.0]);
    assert_eq!(out.t_stop(), 4.0);
}

#[test]
fn append_in_channels_sums_channel_counts() {
    let a = ramp(InterpKind::Linear);
    let b = ContinuousSeries::new(
        vec![0.0, 10.0],
        array![[7.0], [7.0]],
        InterpKind::Linear,
        "b",
    )
    .unwrap();
    let out = a.append_in_channels(&b).unwrap();
    assert_eq!(out.num_channels(), a.num_channels() + b.num_channels());
    assert_eq!(out.len(), a.len());
    assert_eq!(out.samples()[[3, 2]], 7.0);
}

#[test]
fn series_addition_interpolates_the_operand_and_zeroes_lone_nan() {
    let a = ContinuousSeries::new(
        vec![0.0, 1.0, 2.0],
        array![[1.0], [2.0], [3.0]],
        InterpKind::Linear,
        "a",
    )
    .unwrap();
    // b only covers [0.5, 1.5]; outside that, its interpolation is NaN and
    // must act as zero under addition.
    let b = ContinuousSeries::new(vec![0.5, 1.5], array![[10.0], [10.0]], InterpKind::Linear, "b")
        .unwrap();
    let out = a.zip_with_series(&b, BinOp::Add).unwrap();
    assert_eq!(out.samples()[[0, 0]], 1.0);
    assert_eq!(out.samples()[[1, 0]], 12.0);
    assert_eq!(out.samples()[[2, 0]], 3.0);
}

#[test]
fn series_multiplication_propagates_operand_nan() {
    let a = ContinuousSeries::new(
        vec![0.0, 1.0, 2.0],
        array![[1.0], [2.0], [3.0]],
        InterpKind::Linear,
        "a",
    )
    .unwrap();
    let b = ContinuousSeries::new(vec![0.5, 1.5], array![[10.0], [10.0]], InterpKind::Linear, "b")
        .unwrap();
    let out = a.zip_with_series(&b, BinOp::Mul).unwrap();
    assert!(out.samples()[[0, 0]].is_nan());
    assert_eq!(out.samples()[[1, 0]], 20.0);
    assert!(out.samples()[[2, 0]].is_nan());
}

#[test]
fn scalar_operators_and_negation() {
    let a = ContinuousSeries::new(vec![0.0, 1.0], array![[1.0], [-2.0]], InterpKind::Linear, "a")
        .unwrap();
    let sum = &a + 1.0;
    assert_eq!(sum.samples().column(0).to_vec(), vec![2.0, -1.0]);
    let neg = -&a;
    assert_eq!(neg.samples().column(0).to_vec(), vec![-1.0, 2.0]);
    let scaled = &a * 3.0;
    assert_eq!(scaled.samples().column(0).to_vec(), vec![3.0, -6.0]);
    assert_eq!(a.abs().samples().column(0).to_vec(), vec![1.0, 2.0]);
    assert_eq!(
        a.floor_div_scalar(2.0).samples().column(0).to_vec(),
        vec![0.0, -1.0]
    );
    assert_eq!(a.powf(2.0).samples().column(0).to_vec(), vec![1.0, 4.0]);
}

#[test]
fn transforms_return_deep_copies() {
    let a = ramp(InterpKind::Linear);
    let mut delayed = a.delay(1.0);
    delayed.set_name("other");
    delayed.clip_in_place(2.0, 4.0, None, false, true).unwrap();
    // The original is untouched.
    assert_eq!(a.name(), "ramp");
    assert_eq!(a.t_start(), 0.0);
    assert_eq!(a.len(), 11);
}
