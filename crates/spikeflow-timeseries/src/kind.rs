//! Closed series-kind tag and the tagged variant wrapper.
//!
//! Compatibility checks between producers and consumers (e.g. layer
//! connections) compare [`SeriesKind`] tags, never concrete types.

use serde::{Deserialize, Serialize};

use crate::continuous::ContinuousSeries;
use crate::error::{Result, SeriesError};
use crate::event::EventSeries;

/// The two series kinds exchanged between network layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesKind {
    Continuous,
    Event,
}

impl std::fmt::Display for SeriesKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SeriesKind::Continuous => write!(f, "continuous"),
            SeriesKind::Event => write!(f, "event"),
        }
    }
}

/// A time series of either kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Series {
    Continuous(ContinuousSeries),
    Event(EventSeries),
}

impl Series {
    pub fn kind(&self) -> SeriesKind {
        match self {
            Series::Continuous(_) => SeriesKind::Continuous,
            Series::Event(_) => SeriesKind::Event,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Series::Continuous(s) => s.name(),
            Series::Event(s) => s.name(),
        }
    }

    pub fn t_start(&self) -> f64 {
        match self {
            Series::Continuous(s) => s.t_start(),
            Series::Event(s) => s.t_start(),
        }
    }

    pub fn t_stop(&self) -> f64 {
        match self {
            Series::Continuous(s) => s.t_stop(),
            Series::Event(s) => s.t_stop(),
        }
    }

    pub fn duration(&self) -> f64 {
        self.t_stop() - self.t_start()
    }

    /// Clips either kind to `[t_start, t_stop)` with default options.
    pub fn clip(&self, t_start: f64, t_stop: f64) -> Result<Series> {
        match self {
            Series::Continuous(s) => Ok(Series::Continuous(s.clip(t_start, t_stop)?)),
            Series::Event(s) => Ok(Series::Event(s.clip(t_start, t_stop)?)),
        }
    }

    /// Shifts either kind by `offset` in time.
    pub fn delay(&self, offset: f64) -> Series {
        match self {
            Series::Continuous(s) => Series::Continuous(s.delay(offset)),
            Series::Event(s) => Series::Event(s.delay(offset)),
        }
    }

    pub fn as_continuous(&self) -> Option<&ContinuousSeries> {
        match self {
            Series::Continuous(s) => Some(s),
            Series::Event(_) => None,
        }
    }

    pub fn as_event(&self) -> Option<&EventSeries> {
        match self {
            Series::Event(s) => Some(s),
            Series::Continuous(_) => None,
        }
    }

    /// Unwraps the continuous variant.
    ///
    /// # Errors
    /// * `SeriesError::Format` if the series is of the event kind.
    pub fn into_continuous(self) -> Result<ContinuousSeries> {
        match self {
            Series::Continuous(s) => Ok(s),
            Series::Event(s) => Err(SeriesError::Format(format!(
                "series '{}' is event-kind, expected continuous",
                s.name()
            ))),
        }
    }

    /// Unwraps the event variant.
    ///
    /// # Errors
    /// * `SeriesError::Format` if the series is of the continuous kind.
    pub fn into_event(self) -> Result<EventSeries> {
        match self {
            Series::Event(s) => Ok(s),
            Series::Continuous(s) => Err(SeriesError::Format(format!(
                "series '{}' is continuous-kind, expected event",
                s.name()
            ))),
        }
    }
}

impl From<ContinuousSeries> for Series {
    fn from(s: ContinuousSeries) -> Self {
        Series::Continuous(s)
    }
}

impl From<EventSeries> for Series {
    fn from(s: EventSeries) -> Self {
        Series::Event(s)
    }
}
