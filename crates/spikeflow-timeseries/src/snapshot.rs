//! Persisted snapshot format for time series.
//!
//! A [`SeriesRecord`] is a structured, kind-tagged record that round-trips
//! through serde_json. Loading a record through the wrong kind's
//! constructor fails with `SeriesError::Format`.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::continuous::ContinuousSeries;
use crate::error::{Result, SeriesError};
use crate::event::EventSeries;
use crate::interpolate::InterpKind;
use crate::kind::{Series, SeriesKind};

/// Structured snapshot of a time series of either kind.
///
/// `kind_tag` selects the reconstruction path; the kind-specific fields
/// (`samples`/`interp_kind` for continuous, `channels`/`num_channels` for
/// event) are optional in the serialized form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesRecord {
    pub kind_tag: SeriesKind,
    pub name: String,
    pub t_start: f64,
    pub t_stop: f64,
    pub periodic: bool,
    pub times: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub samples: Option<Vec<Vec<f64>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interp_kind: Option<InterpKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channels: Option<Vec<usize>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_channels: Option<usize>,
}

impl SeriesRecord {
    /// Serializes the record to JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| SeriesError::Format(format!("snapshot serialization failed: {}", e)))
    }

    /// Parses a record from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| SeriesError::Format(format!("snapshot parse failed: {}", e)))
    }
}

impl ContinuousSeries {
    /// Captures this series as a persistable record.
    pub fn to_record(&self) -> SeriesRecord {
        SeriesRecord {
            kind_tag: SeriesKind::Continuous,
            name: self.name().to_string(),
            t_start: self.t_start(),
            t_stop: self.t_stop(),
            periodic: self.periodic(),
            times: self.times().to_vec(),
            samples: Some(self.samples().outer_iter().map(|r| r.to_vec()).collect()),
            interp_kind: Some(self.interp_kind()),
            channels: None,
            num_channels: None,
        }
    }

    /// Reconstructs a continuous series from a record.
    ///
    /// # Errors
    /// * `SeriesError::Format` if the record is tagged as another kind or
    ///   lacks the sample table.
    pub fn from_record(record: &SeriesRecord) -> Result<Self> {
        if record.kind_tag != SeriesKind::Continuous {
            return Err(SeriesError::Format(format!(
                "record '{}' is tagged '{}', expected 'continuous'",
                record.name, record.kind_tag
            )));
        }
        let rows = record.samples.as_ref().ok_or_else(|| {
            SeriesError::Format(format!(
                "continuous record '{}' is missing its sample table",
                record.name
            ))
        })?;
        let channels = rows.first().map(Vec::len).unwrap_or(0);
        let mut samples = Array2::zeros((rows.len(), channels));
        for (r, row) in rows.iter().enumerate() {
            if row.len() != channels {
                return Err(SeriesError::Format(format!(
                    "continuous record '{}' has a ragged sample table",
                    record.name
                )));
            }
            for (c, &v) in row.iter().enumerate() {
                samples[[r, c]] = v;
            }
        }
        ContinuousSeries::with_options(
            record.times.clone(),
            samples,
            Some(record.t_start),
            Some(record.t_stop),
            record.periodic,
            record.interp_kind.unwrap_or_default(),
            record.name.clone(),
        )
    }
}

impl EventSeries {
    /// Captures this series as a persistable record.
    pub fn to_record(&self) -> SeriesRecord {
        SeriesRecord {
            kind_tag: SeriesKind::Event,
            name: self.name().to_string(),
            t_start: self.t_start(),
            t_stop: self.t_stop(),
            periodic: self.periodic(),
            times: self.times().to_vec(),
            samples: None,
            interp_kind: None,
            channels: Some(self.channels().to_vec()),
            num_channels: Some(self.num_channels()),
        }
    }

    /// Reconstructs an event series from a record.
    ///
    /// # Errors
    /// * `SeriesError::Format` if the record is tagged as another kind or
    ///   lacks the channel trace.
    pub fn from_record(record: &SeriesRecord) -> Result<Self> {
        if record.kind_tag != SeriesKind::Event {
            return Err(SeriesError::Format(format!(
                "record '{}' is tagged '{}', expected 'event'",
                record.name, record.kind_tag
            )));
        }
        let channels = record.channels.as_ref().ok_or_else(|| {
            SeriesError::Format(format!(
                "event record '{}' is missing its channel trace",
                record.name
            ))
        })?;
        EventSeries::with_options(
            record.times.clone(),
            channels.clone(),
            record.num_channels,
            Some(record.t_start),
            Some(record.t_stop),
            record.periodic,
            record.name.clone(),
        )
    }
}

impl Series {
    /// Captures either kind as a persistable record.
    pub fn to_record(&self) -> SeriesRecord {
        match self {
            Series::Continuous(s) => s.to_record(),
            Series::Event(s) => s.to_record(),
        }
    }

    /// Reconstructs a series of the kind declared by the record's tag.
    pub fn from_record(record: &SeriesRecord) -> Result<Self> {
        match record.kind_tag {
            SeriesKind::Continuous => Ok(Series::Continuous(ContinuousSeries::from_record(record)?)),
            SeriesKind::Event => Ok(Series::Event(EventSeries::from_record(record)?)),
        }
    }
}
