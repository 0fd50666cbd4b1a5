use std::path::Path;

use async_trait::async_trait;

use crate::Result;
use crate::interval::SilenceRegion;

/// Reports the total media duration in seconds.
///
/// Implementations must return a strictly positive value or fail.
#[async_trait]
pub trait DurationProbe: Send + Sync {
    async fn probe_duration(&self, video: &Path) -> Result<f64>;
}

/// Produces timed, confidence-scored speech segments.
///
/// Implementations may return segments in any order; the pipeline sorts them and drops
/// anything with `end <= start`.
#[async_trait]
pub trait SpeechDetector: Send + Sync {
    async fn detect_speech(&self, video: &Path) -> Result<Vec<SpeechSegment>>;
}

/// Produces silence intervals in stream order.
#[async_trait]
pub trait SilenceDetector: Send + Sync {
    async fn detect_silence(&self, video: &Path) -> Result<Vec<SilenceRegion>>;
}

/// Produces visual scene-change timestamps in seconds.
///
/// An empty result is legal and means "one scene spanning the whole video".
#[async_trait]
pub trait SceneDetector: Send + Sync {
    async fn detect_scene_cuts(&self, video: &Path) -> Result<Vec<f64>>;
}

/// A raw speech segment as reported by a detector, before validation.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechSegment {
    pub start_sec: f64,
    pub end_sec: f64,
    pub text: String,
    /// Detector-derived confidence; clamped to `[0, 1]` during validation.
    pub confidence: f64,
}
