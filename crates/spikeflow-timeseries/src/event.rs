//! Discrete (time, channel) event stream.

use std::collections::HashSet;

use ndarray::Array2;
use tracing::{debug, warn};

use crate::base::TimeBase;
use crate::error::{Result, SeriesError};

/// A stream of timestamped events on integer channels.
///
/// `channels` holds one channel index per time point
/// (`channels.len() == times.len()`, every index `< num_channels`).
///
/// # Examples
/// ```
/// use spikeflow_timeseries::EventSeries;
///
/// let spikes = EventSeries::new(vec![0.1, 0.4, 0.4], vec![0, 1, 0], None, "spikes").unwrap();
/// assert_eq!(spikes.num_channels(), 2);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct EventSeries {
    base: TimeBase,
    channels: Vec<usize>,
    num_channels: usize,
}

impl EventSeries {
    /// Creates a non-periodic event series; `num_channels` is inferred as
    /// `max(channels) + 1` when not given.
    pub fn new(
        times: Vec<f64>,
        channels: Vec<usize>,
        num_channels: Option<usize>,
        name: impl Into<String>,
    ) -> Result<Self> {
        Self::with_options(times, channels, num_channels, None, None, false, name)
    }

    /// Creates an event series with explicit bounds and periodicity.
    ///
    /// # Errors
    /// * `SeriesError::Shape` if `channels.len() != times.len()`, or an
    ///   explicit `num_channels` is below `max(channels) + 1`.
    pub fn with_options(
        times: Vec<f64>,
        channels: Vec<usize>,
        num_channels: Option<usize>,
        t_start: Option<f64>,
        t_stop: Option<f64>,
        periodic: bool,
        name: impl Into<String>,
    ) -> Result<Self> {
        if channels.len() != times.len() {
            return Err(SeriesError::Shape(format!(
                "{} channel entries for {} time points",
                channels.len(),
                times.len()
            )));
        }
        let observed = channels.iter().max().map(|&c| c + 1).unwrap_or(0);
        let num_channels = match num_channels {
            Some(n) if n < observed => {
                return Err(SeriesError::Shape(format!(
                    "num_channels ({}) is below the observed maximum channel + 1 ({})",
                    n, observed
                )));
            }
            Some(n) => n,
            None => observed,
        };
        let base = TimeBase::new(times, t_start, t_stop, periodic, name)?;
        Ok(EventSeries {
            base,
            channels,
            num_channels,
        })
    }

    //region Accessors

    pub fn times(&self) -> &[f64] {
        self.base.times()
    }

    pub fn channels(&self) -> &[usize] {
        &self.channels
    }

    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    /// Widens (or narrows, down to the observed maximum) the channel count.
    pub fn set_num_channels(&mut self, num_channels: usize) -> Result<()> {
        let observed = self.channels.iter().max().map(|&c| c + 1).unwrap_or(0);
        if num_channels < observed {
            return Err(SeriesError::Shape(format!(
                "num_channels ({}) is below the observed maximum channel + 1 ({})",
                num_channels, observed
            )));
        }
        self.num_channels = num_channels;
        Ok(())
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

    pub fn set_t_start(&mut self, t_start: f64) -> Result<()> {
        self.base.set_t_start(t_start)
    }

    pub fn set_t_stop(&mut self, t_stop: f64) -> Result<()> {
        self.base.set_t_stop(t_stop)
    }

    //endregion

    pub fn delay(&self, offset: f64) -> Self {
        let mut out = self.clone();
        out.delay_in_place(offset);
        out
    }

    pub fn delay_in_place(&mut self, offset: f64) {
        self.base.delay_in_place(offset);
    }

    /// Returns the events inside `[t_start, t_stop)` (closed at the stop
    /// when `include_stop`), optionally restricted to a channel set.
    /// Periodic series logically replicate their events across the
    /// queried span first.
    ///
    /// # Errors
    /// * `SeriesError::Range` if `t_start > t_stop`.
    pub fn query(
        &self,
        t_start: f64,
        t_stop: f64,
        channels: Option<&[usize]>,
        include_stop: bool,
    ) -> Result<(Vec<f64>, Vec<usize>)> {
        if t_start > t_stop {
            return Err(SeriesError::Range(format!(
                "query window start ({}) exceeds stop ({})",
                t_start, t_stop
            )));
        }
        let in_window = |t: f64| t >= t_start && (t < t_stop || (include_stop && t <= t_stop));
        let wanted = |c: usize| channels.map(|set| set.contains(&c)).unwrap_or(true);

        let mut events: Vec<(f64, usize)> = Vec::new();
        let period = self.duration();
        if self.periodic() && period > 0.0 && !self.is_empty() {
            let times = self.times();
            let first = times[0];
            let last = times[times.len() - 1];
            let k_min = ((t_start - last) / period).floor() as i64;
            let k_max = ((t_stop - first) / period).ceil() as i64;
            for k in k_min..=k_max {
                let offset = k as f64 * period;
                for (&t, &c) in times.iter().zip(self.channels.iter()) {
                    if in_window(t + offset) && wanted(c) {
                        events.push((t + offset, c));
                    }
                }
            }
            events.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        } else {
            for (&t, &c) in self.times().iter().zip(self.channels.iter()) {
                if in_window(t) && wanted(c) {
                    events.push((t, c));
                }
            }
        }
        Ok(events.into_iter().unzip())
    }

    /// Bins events into a boolean raster of fixed-width `dt` steps.
    ///
    /// An event at time `t` lands in bin `floor((t - t_start) / dt)`;
    /// events strictly between grid points go to the preceding bin.
    /// Multiple events collapsing into the same (bin, channel) cell are
    /// reported through a warning-level diagnostic, not an error. An
    /// empty series rasters to an all-`false` matrix of the requested
    /// shape.
    pub fn raster(
        &self,
        dt: f64,
        t_start: Option<f64>,
        t_stop: Option<f64>,
        num_timesteps: Option<usize>,
        channels: Option<&[usize]>,
    ) -> Result<Array2<bool>> {
        let counts = self.bin_events(dt, t_start, t_stop, num_timesteps, channels)?;
        let collisions = counts.iter().filter(|&&c| c > 1).count();
        if collisions > 0 {
            warn!(
                target: "spikeflow-timeseries",
                "raster of '{}': {} cell(s) held multiple events and were collapsed to single spikes",
                self.name(),
                collisions
            );
        }
        Ok(counts.mapv(|c| c > 0))
    }

    /// As [`EventSeries::raster`], but cells accumulate event counts.
    pub fn raster_counts(
        &self,
        dt: f64,
        t_start: Option<f64>,
        t_stop: Option<f64>,
        num_timesteps: Option<usize>,
        channels: Option<&[usize]>,
    ) -> Result<Array2<u32>> {
        self.bin_events(dt, t_start, t_stop, num_timesteps, channels)
    }

    fn bin_events(
        &self,
        dt: f64,
        t_start: Option<f64>,
        t_stop: Option<f64>,
        num_timesteps: Option<usize>,
        channels: Option<&[usize]>,
    ) -> Result<Array2<u32>> {
        if !(dt > 0.0) {
            return Err(SeriesError::Range(format!(
                "raster timestep must be positive, got {}",
                dt
            )));
        }
        let t0 = t_start.unwrap_or_else(|| self.t_start());
        let steps = match num_timesteps {
            Some(n) => n,
            None => {
                let t1 = t_stop.unwrap_or_else(|| self.t_stop());
                if t1 < t0 {
                    return Err(SeriesError::Range(format!(
                        "raster window start ({}) exceeds stop ({})",
                        t0, t1
                    )));
                }
                ((t1 - t0) / dt).ceil() as usize
            }
        };
        let selected: Vec<usize> = match channels {
            Some(chs) => chs.to_vec(),
            None => (0..self.num_channels).collect(),
        };
        let mut counts = Array2::zeros((steps, selected.len()));
        let t_end = t0 + steps as f64 * dt;
        let (times, chans) = self.query(t0, t_end, channels, false)?;
        for (t, c) in times.into_iter().zip(chans) {
            let bin = ((t - t0) / dt).floor() as usize;
            if bin >= steps {
                continue; // float edge at the window end
            }
            if let Some(col) = selected.iter().position(|&s| s == c) {
                counts[[bin, col]] += 1;
            }
        }
        Ok(counts)
    }

    /// Time-shifts each series by its delay (`self` at delay 0),
    /// concatenates, and globally time-sorts with a stable sort.
    ///
    /// `num_channels` of the result is the maximum across inputs; channels
    /// are not renumbered. A mismatched delay count is non-fatal: missing
    /// delays default to 0, extras are ignored, both with a warning.
    /// `remove_duplicates` drops events with identical (time, channel)
    /// pairs, keeping the first occurrence.
    pub fn merge(
        &self,
        others: &[&EventSeries],
        delays: &[f64],
        remove_duplicates: bool,
    ) -> Result<Self> {
        if delays.len() != others.len() {
            warn!(
                target: "spikeflow-timeseries",
                "merge of '{}': {} delays supplied for {} series; missing delays default to 0",
                self.name(),
                delays.len(),
                others.len()
            );
        }
        let mut events: Vec<(f64, usize)> = self
            .times()
            .iter()
            .zip(self.channels.iter())
            .map(|(&t, &c)| (t, c))
            .collect();
        let mut t_start = self.t_start();
        let mut t_stop = self.t_stop();
        let mut num_channels = self.num_channels;
        for (i, other) in others.iter().enumerate() {
            let delay = delays.get(i).copied().unwrap_or(0.0);
            for (&t, &c) in other.times().iter().zip(other.channels.iter()) {
                events.push((t + delay, c));
            }
            t_start = t_start.min(other.t_start() + delay);
            t_stop = t_stop.max(other.t_stop() + delay);
            num_channels = num_channels.max(other.num_channels);
        }
        events.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        if remove_duplicates {
            let mut seen: HashSet<(u64, usize)> = HashSet::with_capacity(events.len());
            events.retain(|&(t, c)| seen.insert((t.to_bits(), c)));
        }
        let (times, channels): (Vec<f64>, Vec<usize>) = events.into_iter().unzip();
        Self::with_options(
            times,
            channels,
            Some(num_channels),
            Some(t_start),
            Some(t_stop),
            self.periodic(),
            self.name(),
        )
    }

    /// Appends each series end-to-end in time, then merges.
    ///
    /// The first appended series starts at `self.t_stop + offsets[0]`;
    /// each subsequent series starts where the previous one (after its
    /// own delay) stopped, plus its own offset.
    pub fn append_in_time(
        &self,
        others: &[&EventSeries],
        offsets: &[f64],
        remove_duplicates: bool,
    ) -> Result<Self> {
        if offsets.len() != others.len() {
            warn!(
                target: "spikeflow-timeseries",
                "append_in_time of '{}': {} offsets supplied for {} series; missing offsets default to 0",
                self.name(),
                offsets.len(),
                others.len()
            );
        }
        let mut delays = Vec::with_capacity(others.len());
        let mut cursor = self.t_stop();
        for (i, other) in others.iter().enumerate() {
            let offset = offsets.get(i).copied().unwrap_or(0.0);
            let delay = cursor + offset - other.t_start();
            cursor = other.t_stop() + delay;
            delays.push(delay);
        }
        self.merge(others, &delays, remove_duplicates)
    }

    /// Concatenates channel spaces: each subsequent series' channel IDs
    /// are shifted by the cumulative channel count of all prior series;
    /// times are pooled and globally sorted. `num_channels` becomes the
    /// sum across all inputs.
    pub fn append_in_channels(&self, others: &[&EventSeries]) -> Result<Self> {
        let mut events: Vec<(f64, usize)> = self
            .times()
            .iter()
            .zip(self.channels.iter())
            .map(|(&t, &c)| (t, c))
            .collect();
        let mut shift = self.num_channels;
        let mut t_start = self.t_start();
        let mut t_stop = self.t_stop();
        for other in others {
            for (&t, &c) in other.times().iter().zip(other.channels.iter()) {
                events.push((t, c + shift));
            }
            shift += other.num_channels;
            t_start = t_start.min(other.t_start());
            t_stop = t_stop.max(other.t_stop());
        }
        events.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        debug!(
            target: "spikeflow-timeseries",
            "append_in_channels of '{}': {} channels total",
            self.name(),
            shift
        );
        let (times, channels): (Vec<f64>, Vec<usize>) = events.into_iter().unzip();
        Self::with_options(
            times,
            channels,
            Some(shift),
            Some(t_start),
            Some(t_stop),
            self.periodic(),
            self.name(),
        )
    }

    /// Restricts the series to `[t_start, t_stop)` with default options.
    pub fn clip(&self, t_start: f64, t_stop: f64) -> Result<Self> {
        self.clip_with(t_start, t_stop, None, false, false)
    }

    /// Restricts the series to the requested window.
    ///
    /// With `compress_channels`, the surviving channel IDs are remapped to
    /// a dense `0..k` range in ascending original order and
    /// `num_channels` becomes `k`; otherwise the original IDs and channel
    /// count are kept.
    pub fn clip_with(
        &self,
        t_start: f64,
        t_stop: f64,
        channels: Option<&[usize]>,
        include_stop: bool,
        compress_channels: bool,
    ) -> Result<Self> {
        let (times, mut chans) = self.query(t_start, t_stop, channels, include_stop)?;
        let num_channels = if compress_channels {
            let mut surviving: Vec<usize> = chans.clone();
            surviving.sort_unstable();
            surviving.dedup();
            for c in &mut chans {
                *c = surviving.binary_search(c).unwrap_or(0);
            }
            surviving.len()
        } else {
            self.num_channels
        };
        Self::with_options(
            times,
            chans,
            Some(num_channels),
            Some(t_start),
            Some(t_stop),
            self.periodic(),
            self.name(),
        )
    }

    pub fn clip_in_place(
        &mut self,
        t_start: f64,
        t_stop: f64,
        channels: Option<&[usize]>,
        include_stop: bool,
        compress_channels: bool,
    ) -> Result<()> {
        *self = self.clip_with(t_start, t_stop, channels, include_stop, compress_channels)?;
        Ok(())
    }
}
