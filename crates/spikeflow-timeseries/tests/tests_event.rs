use ndarray::Array2;
use spikeflow_timeseries::{EventSeries, SeriesError};

fn spikes() -> EventSeries {
    EventSeries::new(
        vec![0.05, 0.15, 0.15, 0.25, 0.85],
        vec![0, 1, 0, 2, 1],
        Some(3),
        "spikes",
    )
    .unwrap()
}

#[test]
fn empty_series_rasters_to_all_false() {
    let empty = EventSeries::new(vec![], vec![], Some(3), "empty").unwrap();
    let raster = empty
        .raster(0.25, Some(0.0), Some(1.0), None, None)
        .unwrap();
    assert_eq!(raster.dim(), (4, 3));
    assert!(raster.iter().all(|&b| !b));
    let counts = empty
        .raster_counts(0.25, Some(0.0), Some(1.0), None, None)
        .unwrap();
    assert_eq!(counts, Array2::<u32>::zeros((4, 3)));
}

#[test]
fn events_between_grid_points_land_in_the_preceding_bin() {
    let s = spikes();
    let raster = s.raster(0.1, Some(0.0), Some(1.0), None, None).unwrap();
    assert_eq!(raster.dim(), (10, 3));
    assert!(raster[[0, 0]]); // 0.05 -> bin 0
    assert!(raster[[1, 0]]); // 0.15 -> bin 1
    assert!(raster[[1, 1]]);
    assert!(raster[[2, 2]]); // 0.25 -> bin 2
    assert!(raster[[8, 1]]); // 0.85 -> bin 8
    assert_eq!(raster.iter().filter(|&&b| b).count(), 5);
}

#[test]
fn raster_counts_accumulate_same_cell_events() {
    let s = EventSeries::new(vec![0.01, 0.02, 0.03], vec![0, 0, 0], Some(1), "burst").unwrap();
    let counts = s
        .raster_counts(0.1, Some(0.0), Some(0.2), None, None)
        .unwrap();
    assert_eq!(counts[[0, 0]], 3);
    assert_eq!(counts[[1, 0]], 0);
    // Boolean mode collapses the collision (surfaced as a warning).
    let raster = s.raster(0.1, Some(0.0), Some(0.2), None, None).unwrap();
    assert!(raster[[0, 0]]);
}

#[test]
fn raster_num_timesteps_overrides_the_stop_bound() {
    let s = spikes();
    let raster = s
        .raster(0.1, Some(0.0), Some(1.0), Some(3), None)
        .unwrap();
    assert_eq!(raster.dim(), (3, 3));
}

#[test]
fn raster_partitions_across_adjacent_windows() {
    let s = spikes();
    let whole = s
        .raster_counts(0.1, Some(0.0), Some(1.0), None, None)
        .unwrap();
    let first = s
        .raster_counts(0.1, Some(0.0), Some(0.5), None, None)
        .unwrap();
    let second = s
        .raster_counts(0.1, Some(0.5), Some(1.0), None, None)
        .unwrap();
    assert_eq!(first.nrows() + second.nrows(), whole.nrows());
    for r in 0..first.nrows() {
        assert_eq!(first.row(r), whole.row(r));
    }
    for r in 0..second.nrows() {
        assert_eq!(second.row(r), whole.row(first.nrows() + r));
    }
}

#[test]
fn raster_channel_selection_orders_columns_by_request() {
    let s = spikes();
    let raster = s
        .raster(0.1, Some(0.0), Some(1.0), None, Some(&[2, 0]))
        .unwrap();
    assert_eq!(raster.dim(), (10, 2));
    assert!(raster[[2, 0]]); // channel 2 in column 0
    assert!(raster[[0, 1]]); // channel 0 in column 1
}

#[test]
fn periodic_query_replicates_events_across_the_span() {
    let s = EventSeries::with_options(
        vec![0.25],
        vec![0],
        Some(1),
        Some(0.0),
        Some(1.0),
        true,
        "tick",
    )
    .unwrap();
    let (times, channels) = s.query(0.0, 3.0, None, false).unwrap();
    assert_eq!(times, vec![0.25, 1.25, 2.25]);
    assert_eq!(channels, vec![0, 0, 0]);
}

#[test]
fn merge_applies_per_source_delays_without_renumbering() {
    let a = EventSeries::new(vec![0.1], vec![0], Some(2), "a").unwrap();
    let b = EventSeries::new(vec![0.1], vec![3], Some(4), "b").unwrap();
    let merged = a.merge(&[&b], &[1.0], false).unwrap();
    assert_eq!(merged.times(), &[0.1, 1.1]);
    assert_eq!(merged.channels(), &[0, 3]);
    assert_eq!(merged.num_channels(), 4);
    assert_eq!(merged.t_stop(), 1.1);
}

#[test]
fn merge_missing_delays_default_to_zero() {
    let a = EventSeries::new(vec![0.1], vec![0], Some(1), "a").unwrap();
    let b = EventSeries::new(vec![0.3], vec![0], Some(1), "b").unwrap();
    // One series, zero delays supplied: non-fatal, delay treated as 0.
    let merged = a.merge(&[&b], &[], false).unwrap();
    assert_eq!(merged.times(), &[0.1, 0.3]);
}

#[test]
fn merge_can_drop_identical_events() {
    let a = EventSeries::new(vec![0.1, 0.2], vec![0, 1], Some(2), "a").unwrap();
    let merged = a.merge(&[&a], &[0.0], true).unwrap();
    assert_eq!(merged.times(), &[0.1, 0.2]);
    assert_eq!(merged.channels(), &[0, 1]);
}

#[test]
fn append_in_time_chains_offsets() {
    let a = EventSeries::with_options(
        vec![0.1],
        vec![0],
        Some(1),
        Some(0.0),
        Some(1.0),
        false,
        "a",
    )
    .unwrap();
    let b = EventSeries::with_options(
        vec![0.5],
        vec![0],
        Some(1),
        Some(0.0),
        Some(1.0),
        false,
        "b",
    )
    .unwrap();
    let c = EventSeries::with_options(
        vec![0.5],
        vec![0],
        Some(1),
        Some(0.0),
        Some(1.0),
        false,
        "c",
    )
    .unwrap();
    let out = a.append_in_time(&[&b, &c], &[0.25, 0.25], false).unwrap();
    // b starts at 1.25 (a stops at 1.0 + 0.25); b stops at 2.25;
    // c starts at 2.5 and its event lands at 3.0.
    assert_eq!(out.times(), &[0.1, 1.75, 3.0]);
    assert_eq!(out.t_stop(), 3.5);
}

#[test]
fn append_in_channels_shifts_ids_and_sums_counts() {
    let a = EventSeries::new(vec![0.3], vec![1], Some(2), "a").unwrap();
    let b = EventSeries::new(vec![0.1], vec![0], Some(3), "b").unwrap();
    let c = EventSeries::new(vec![0.2], vec![1], Some(2), "c").unwrap();
    let out = a.append_in_channels(&[&b, &c]).unwrap();
    assert_eq!(out.num_channels(), 7);
    // Pooled and globally time-sorted.
    assert_eq!(out.times(), &[0.1, 0.2, 0.3]);
    assert_eq!(out.channels(), &[2, 6, 1]);
}

#[test]
fn clip_keeps_original_ids_unless_compressed() {
    let s = spikes();
    let clipped = s.clip(0.1, 0.3).unwrap();
    assert_eq!(clipped.channels(), &[1, 0, 2]);
    assert_eq!(clipped.num_channels(), 3);
    assert_eq!(clipped.t_start(), 0.1);
    assert_eq!(clipped.t_stop(), 0.3);
}

#[test]
fn clip_with_channel_filter_and_compression() {
    let s = spikes();
    let clipped = s
        .clip_with(0.0, 1.0, Some(&[1, 2]), false, true)
        .unwrap();
    // Surviving channels 1 and 2 remap to 0 and 1.
    assert_eq!(clipped.channels(), &[0, 1, 0]);
    assert_eq!(clipped.num_channels(), 2);
}

#[test]
fn query_rejects_inverted_window() {
    let s = spikes();
    assert!(matches!(
        s.query(1.0, 0.0, None, false),
        Err(SeriesError::Range(_))
    ));
}

#[test]
fn narrowing_num_channels_below_observed_fails() {
    let mut s = spikes();
    assert!(matches!(
        s.set_num_channels(2),
        Err(SeriesError::Shape(_))
    ));
    assert!(s.set_num_channels(8).is_ok());
}
