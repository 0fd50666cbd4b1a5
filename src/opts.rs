use std::path::PathBuf;
use std::time::Duration;

use crate::fusion::FusionParams;

/// Default whisper.cpp model name.
pub const DEFAULT_MODEL: &str = "base.en";

/// Options that control how an analysis is performed.
///
/// `quietcut-cli` maps its flags into this type; library callers build it directly,
/// usually starting from [`AnalysisOpts::new`].
#[derive(Debug, Clone)]
pub struct AnalysisOpts {
    /// Scratch directory for intermediate files (extracted audio).
    pub work_dir: PathBuf,

    /// Whisper model name (see [`crate::models`]) and the directory holding model files.
    pub model: String,
    pub model_dir: PathBuf,

    /// External tool binaries.
    pub ffmpeg_bin: String,
    pub ffprobe_bin: String,

    /// `silencedetect` noise floor, e.g. `"-30dB"`.
    pub silence_noise: String,
    /// `silencedetect` minimum silence length in seconds.
    pub silence_min_duration_sec: f64,

    /// Scene-change score threshold for ffmpeg's `select='gt(scene,T)'` filter, in `(0, 1)`.
    pub scene_threshold: f64,

    /// Per-stage time budgets. `None` waits indefinitely.
    pub probe_timeout: Option<Duration>,
    pub speech_timeout: Option<Duration>,
    pub silence_timeout: Option<Duration>,
    pub scene_timeout: Option<Duration>,

    /// Run the three signal producers one after another instead of concurrently.
    pub sequential: bool,

    /// Also log recoverable warnings on stderr; they always land in the payload.
    pub echo_warnings: bool,

    pub fusion: FusionParams,
}

impl AnalysisOpts {
    /// Options with production defaults rooted at the given work and model directories.
    pub fn new(work_dir: impl Into<PathBuf>, model_dir: impl Into<PathBuf>) -> Self {
        let stage_timeout = Some(Duration::from_secs(10 * 60));

        Self {
            work_dir: work_dir.into(),
            model: DEFAULT_MODEL.to_owned(),
            model_dir: model_dir.into(),
            ffmpeg_bin: "ffmpeg".to_owned(),
            ffprobe_bin: "ffprobe".to_owned(),
            silence_noise: "-30dB".to_owned(),
            silence_min_duration_sec: 0.3,
            scene_threshold: 0.3,
            probe_timeout: stage_timeout,
            speech_timeout: Some(Duration::from_secs(60 * 60)),
            silence_timeout: stage_timeout,
            scene_timeout: stage_timeout,
            sequential: false,
            echo_warnings: false,
            fusion: FusionParams::default(),
        }
    }

    /// Apply one budget to the duration, silence, and scene stages.
    pub fn with_stage_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.probe_timeout = timeout;
        self.silence_timeout = timeout;
        self.scene_timeout = timeout;
        self
    }
}
