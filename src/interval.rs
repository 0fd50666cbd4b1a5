//! Time interval value types shared by every signal and by the fused output.
//!
//! All intervals are half-open spans in seconds with `end > start >= 0`. Constructors enforce
//! this, so once a value exists downstream code can rely on a strictly positive length.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Round to three decimal places (half away from zero).
///
/// Every number quietcut emits goes through this at creation time, so equality checks
/// between boundaries coming from different signals behave predictably.
pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Length of the intersection of `(a_start, a_end)` and `(b_start, b_end)`, never negative.
pub fn overlap_len(a_start: f64, a_end: f64, b_start: f64, b_end: f64) -> f64 {
    let start = a_start.max(b_start);
    let end = a_end.min(b_end);
    (end - start).max(0.0)
}

/// A validated `[start_sec, end_sec)` span.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawInterval", into = "RawInterval")]
pub struct TimeInterval {
    start_sec: f64,
    end_sec: f64,
}

impl TimeInterval {
    /// Build an interval, rounding both bounds to milliseconds first.
    ///
    /// Fails with [`Error::InvalidInterval`] when the rounded bounds are non-finite, the start
    /// is negative, or `end <= start`.
    pub fn new(start_sec: f64, end_sec: f64) -> Result<Self> {
        let start = round3(start_sec);
        let end = round3(end_sec);

        if !start.is_finite() || !end.is_finite() || start < 0.0 || end <= start {
            return Err(Error::InvalidInterval { start_sec, end_sec });
        }

        Ok(Self {
            start_sec: start,
            end_sec: end,
        })
    }

    pub fn start_sec(&self) -> f64 {
        self.start_sec
    }

    pub fn end_sec(&self) -> f64 {
        self.end_sec
    }

    pub fn len_sec(&self) -> f64 {
        self.end_sec - self.start_sec
    }

    /// Push the end out to `end_sec` (rounded) if that is later; never shortens.
    pub fn extend_to(self, end_sec: f64) -> Self {
        Self {
            start_sec: self.start_sec,
            end_sec: self.end_sec.max(round3(end_sec)),
        }
    }

    /// Overlap with another interval in seconds.
    pub fn overlap(&self, other: &TimeInterval) -> f64 {
        overlap_len(self.start_sec, self.end_sec, other.start_sec, other.end_sec)
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawInterval {
    start_sec: f64,
    end_sec: f64,
}

impl TryFrom<RawInterval> for TimeInterval {
    type Error = Error;

    fn try_from(raw: RawInterval) -> Result<Self> {
        Self::new(raw.start_sec, raw.end_sec)
    }
}

impl From<TimeInterval> for RawInterval {
    fn from(interval: TimeInterval) -> Self {
        Self {
            start_sec: interval.start_sec,
            end_sec: interval.end_sec,
        }
    }
}

/// A transcribed span of speech.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechRegion {
    #[serde(flatten)]
    pub interval: TimeInterval,
    pub text: String,
    /// Detector confidence, clamped to `[0, 1]` and rounded to milliunits.
    pub confidence: f64,
}

impl SpeechRegion {
    pub fn new(
        start_sec: f64,
        end_sec: f64,
        text: impl Into<String>,
        confidence: f64,
    ) -> Result<Self> {
        Ok(Self {
            interval: TimeInterval::new(start_sec, end_sec)?,
            text: text.into(),
            confidence: round3(confidence.clamp(0.0, 1.0)),
        })
    }
}

/// A span in which the audio stayed below the silence threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SilenceRegion {
    #[serde(flatten)]
    pub interval: TimeInterval,
}

impl SilenceRegion {
    pub fn new(start_sec: f64, end_sec: f64) -> Result<Self> {
        Ok(Self {
            interval: TimeInterval::new(start_sec, end_sec)?,
        })
    }
}

/// A fused, scored span considered safe to trim.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LowInfoRegion {
    #[serde(flatten)]
    pub interval: TimeInterval,
    /// Trim-safety score in `[0, 1]`.
    pub score: f64,
}

/// Sort anything carrying an interval by `(start, end)`.
pub fn sort_by_bounds<T>(items: &mut [T], interval: impl Fn(&T) -> TimeInterval) {
    items.sort_by(|a, b| {
        let (a, b) = (interval(a), interval(b));
        a.start_sec
            .total_cmp(&b.start_sec)
            .then(a.end_sec.total_cmp(&b.end_sec))
    });
}
