//! Pipeline orchestration: runs the producers, applies the failure policy, and fuses.
//!
//! Stage policy:
//! - duration and speech failures are fatal (the run returns an error, nothing is written)
//! - silence and scene failures degrade: a [`StageWarning`] is recorded and a safe default
//!   is substituted (no silences; one scene spanning the whole video)
//!
//! The duration probe always runs first. The three signal producers are independent of one
//! another, so by default they run concurrently and are joined before fusion.

use std::future::Future;
use std::path::Path;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::analysis::{AnalysisResult, Stage, StageWarning};
use crate::fusion::{FusionEngine, scene_boundaries};
use crate::interval::{SilenceRegion, SpeechRegion, sort_by_bounds};
use crate::media::{FfmpegSceneDetector, FfmpegSilenceDetector, FfprobeDurationProbe};
use crate::opts::AnalysisOpts;
use crate::producer::{
    DurationProbe, SceneDetector, SilenceDetector, SpeechDetector, SpeechSegment,
};
use crate::whisper::WhisperSpeechDetector;
use crate::{Error, Result};

/// The four producers an [`Analyzer`] drives.
pub struct Producers {
    pub duration: Box<dyn DurationProbe>,
    pub speech: Box<dyn SpeechDetector>,
    pub silence: Box<dyn SilenceDetector>,
    pub scene: Box<dyn SceneDetector>,
}

impl Producers {
    /// The built-in ffprobe / whisper / ffmpeg producers.
    pub fn from_opts(opts: &AnalysisOpts) -> Self {
        Self {
            duration: Box::new(FfprobeDurationProbe::new(&opts.ffprobe_bin)),
            speech: Box::new(WhisperSpeechDetector::from_opts(opts)),
            silence: Box::new(FfmpegSilenceDetector::new(
                &opts.ffmpeg_bin,
                &opts.silence_noise,
                opts.silence_min_duration_sec,
            )),
            scene: Box::new(FfmpegSceneDetector::new(
                &opts.ffmpeg_bin,
                opts.scene_threshold,
            )),
        }
    }
}

/// Per-stage time budgets. `None` waits indefinitely.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageTimeouts {
    pub duration: Option<Duration>,
    pub speech: Option<Duration>,
    pub silence: Option<Duration>,
    pub scene: Option<Duration>,
}

impl StageTimeouts {
    fn for_stage(&self, stage: Stage) -> Option<Duration> {
        match stage {
            Stage::Duration => self.duration,
            Stage::Speech => self.speech,
            Stage::Silence => self.silence,
            Stage::Scene => self.scene,
        }
    }
}

/// Runs one analysis per call. Holds no per-run state, so it can be reused.
pub struct Analyzer {
    producers: Producers,
    fusion: FusionEngine,
    timeouts: StageTimeouts,
    sequential: bool,
    echo_warnings: bool,
}

impl Analyzer {
    /// Build an analyzer with the built-in producers configured from `opts`.
    pub fn new(opts: &AnalysisOpts) -> Self {
        Self::with_producers(Producers::from_opts(opts), opts)
    }

    /// Build an analyzer around custom producers, taking policy settings from `opts`.
    pub fn with_producers(producers: Producers, opts: &AnalysisOpts) -> Self {
        Self {
            producers,
            fusion: FusionEngine::new(opts.fusion.clone()),
            timeouts: StageTimeouts {
                duration: opts.probe_timeout,
                speech: opts.speech_timeout,
                silence: opts.silence_timeout,
                scene: opts.scene_timeout,
            },
            sequential: opts.sequential,
            echo_warnings: opts.echo_warnings,
        }
    }

    pub fn timeouts(&self) -> StageTimeouts {
        self.timeouts
    }

    /// Analyze one video.
    ///
    /// Returns `Err` only for fatal stages (duration, speech). Recoverable losses show up in
    /// [`AnalysisResult::warnings`].
    pub async fn analyze(&self, video: &Path) -> Result<AnalysisResult> {
        info!(video = %video.display(), "analysis started");

        let duration_sec = self.probe_duration(video).await?;
        debug!(duration_sec, "duration probed");

        let p = &self.producers;
        let speech_fut = self.bounded(Stage::Speech, p.speech.detect_speech(video));
        let silence_fut = self.bounded(Stage::Silence, p.silence.detect_silence(video));
        let scene_fut = self.bounded(Stage::Scene, p.scene.detect_scene_cuts(video));

        let (speech, silence, scene) = if self.sequential {
            // Speech is fatal, so there is no point running the rest after it fails.
            let speech = speech_fut.await.map_err(|err| fatal(Stage::Speech, err))?;
            (speech, silence_fut.await, scene_fut.await)
        } else {
            // Silence and scene never fail the join; a speech error drops them (and kills
            // their tools) without waiting for them to finish.
            tokio::try_join!(
                async { speech_fut.await.map_err(|err| fatal(Stage::Speech, err)) },
                async { Ok::<_, Error>(silence_fut.await) },
                async { Ok::<_, Error>(scene_fut.await) },
            )?
        };

        let speech_regions = validate_speech(speech);

        let mut warnings = Vec::new();

        let silence_regions: Vec<SilenceRegion> = match silence {
            Ok(regions) => regions,
            Err(err) => {
                self.degrade(&mut warnings, Stage::Silence, &err);
                Vec::new()
            }
        };

        let scene_cuts = match scene {
            Ok(cuts) => cuts,
            Err(err) => {
                self.degrade(&mut warnings, Stage::Scene, &err);
                Vec::new()
            }
        };
        // An empty or lost cut list degenerates to the single scene [0, D].
        let scene_cuts = scene_boundaries(duration_sec, &scene_cuts);

        let low_info_regions = self.fusion.fuse(
            duration_sec,
            &silence_regions,
            &scene_cuts,
            &speech_regions,
        );

        info!(
            speech = speech_regions.len(),
            silence = silence_regions.len(),
            low_info = low_info_regions.len(),
            warnings = warnings.len(),
            "analysis finished"
        );

        Ok(AnalysisResult {
            speech_regions,
            silence_regions,
            scene_cuts_sec: scene_cuts,
            low_info_regions,
            warnings,
        })
    }

    async fn probe_duration(&self, video: &Path) -> Result<f64> {
        let duration_sec = self
            .bounded(Stage::Duration, self.producers.duration.probe_duration(video))
            .await
            .map_err(|err| fatal(Stage::Duration, err))?;

        if !duration_sec.is_finite() || duration_sec <= 0.0 {
            return Err(Error::StageFailed {
                stage: Stage::Duration,
                message: format!("non-positive duration: {duration_sec}"),
            });
        }

        Ok(duration_sec)
    }

    /// Apply the stage's time budget to `fut`. Dropping a timed-out future kills any child
    /// process it spawned.
    async fn bounded<T>(&self, stage: Stage, fut: impl Future<Output = Result<T>>) -> Result<T> {
        let Some(limit) = self.timeouts.for_stage(stage) else {
            return fut.await;
        };

        match tokio::time::timeout(limit, fut).await {
            Ok(res) => res,
            Err(_) => Err(Error::Timeout { stage, limit }),
        }
    }

    fn degrade(&self, warnings: &mut Vec<StageWarning>, stage: Stage, err: &Error) {
        debug_assert!(!stage.is_fatal(), "{stage:?} cannot degrade");
        let warning = StageWarning::new(stage, cause_of(err));
        if self.echo_warnings {
            warn!(stage = ?stage, cause = %warning.cause, "{warning}");
        } else {
            debug!(stage = ?stage, cause = %warning.cause, "stage degraded");
        }
        warnings.push(warning);
    }
}

/// Validate, round, and sort raw speech segments. Segments with `end <= start` are detector
/// noise and are dropped without a warning.
pub fn validate_speech(segments: Vec<SpeechSegment>) -> Vec<SpeechRegion> {
    let total = segments.len();

    let mut regions: Vec<SpeechRegion> = segments
        .into_iter()
        .filter_map(|s| SpeechRegion::new(s.start_sec, s.end_sec, s.text, s.confidence).ok())
        .collect();

    if regions.len() < total {
        debug!(skipped = total - regions.len(), "dropped malformed speech segments");
    }

    sort_by_bounds(&mut regions, |r| r.interval);
    regions
}

fn fatal(stage: Stage, err: Error) -> Error {
    match err {
        Error::StageFailed { .. } | Error::Timeout { .. } => err,
        other => Error::StageFailed {
            stage,
            message: other.to_string(),
        },
    }
}

fn cause_of(err: &Error) -> String {
    match err {
        Error::StageFailed { message, .. } => message.clone(),
        Error::Timeout { limit, .. } => format!("timed out after {limit:?}"),
        other => other.to_string(),
    }
}
