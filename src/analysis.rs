//! The analysis payload and its warning records.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::interval::{LowInfoRegion, SilenceRegion, SpeechRegion, round3};

/// One step of the analysis pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Duration,
    Speech,
    Silence,
    Scene,
}

impl Stage {
    /// Human-readable stage name used in diagnostics.
    pub fn label(self) -> &'static str {
        match self {
            Self::Duration => "Duration probe",
            Self::Speech => "Speech analysis",
            Self::Silence => "Silence detection",
            Self::Scene => "Scene detection",
        }
    }

    /// Whether losing this stage aborts the run. Duration and speech have no substitute.
    pub fn is_fatal(self) -> bool {
        matches!(self, Self::Duration | Self::Speech)
    }
}

/// A recoverable stage failure recorded in the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageWarning {
    pub stage: Stage,
    pub cause: String,
}

impl StageWarning {
    pub fn new(stage: Stage, cause: impl Into<String>) -> Self {
        Self {
            stage,
            cause: cause.into(),
        }
    }
}

impl fmt::Display for StageWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.stage.label(), self.cause)
    }
}

/// Everything one analysis run produces.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// Sorted by `(start, end)`.
    pub speech_regions: Vec<SpeechRegion>,
    /// In producer order.
    pub silence_regions: Vec<SilenceRegion>,
    /// Sorted and deduplicated; always starts at `0` and ends at the rounded duration.
    pub scene_cuts_sec: Vec<f64>,
    /// Sorted, non-overlapping, non-touching.
    pub low_info_regions: Vec<LowInfoRegion>,
    /// Empty when every stage succeeded.
    pub warnings: Vec<StageWarning>,
}

/// Round, clamp to `>= 0`, sort, and deduplicate cut timestamps for the payload.
pub fn normalize_scene_cuts(cuts: &[f64]) -> Vec<f64> {
    let mut out: Vec<f64> = cuts
        .iter()
        .filter(|v| v.is_finite())
        .map(|v| round3(v.max(0.0)))
        .collect();
    out.sort_by(f64::total_cmp);
    out.dedup();
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_duration_and_speech_are_fatal() {
        assert!(Stage::Duration.is_fatal());
        assert!(Stage::Speech.is_fatal());
        assert!(!Stage::Silence.is_fatal());
        assert!(!Stage::Scene.is_fatal());
    }

    #[test]
    fn warning_serializes_as_tagged_record() -> anyhow::Result<()> {
        let warning = StageWarning::new(Stage::Silence, "ffmpeg exited with status 1");
        let value = serde_json::to_value(&warning)?;
        assert_eq!(value["stage"], "silence");
        assert_eq!(value["cause"], "ffmpeg exited with status 1");
        assert_eq!(
            warning.to_string(),
            "Silence detection failed: ffmpeg exited with status 1"
        );
        Ok(())
    }

    #[test]
    fn empty_result_uses_camel_case_keys() -> anyhow::Result<()> {
        let value = serde_json::to_value(AnalysisResult::default())?;
        for key in [
            "speechRegions",
            "silenceRegions",
            "sceneCutsSec",
            "lowInfoRegions",
            "warnings",
        ] {
            assert!(value[key].as_array().is_some_and(|a| a.is_empty()), "{key}");
        }
        Ok(())
    }

    #[test]
    fn scene_cuts_are_normalized() {
        assert_eq!(
            normalize_scene_cuts(&[7.0, -0.2, 3.0004, 3.0, f64::NAN]),
            vec![0.0, 3.0, 7.0]
        );
    }
}
