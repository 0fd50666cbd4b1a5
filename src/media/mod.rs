//! Producers backed by the `ffmpeg` / `ffprobe` command-line tools.
//!
//! Each producer runs one tool invocation and turns its textual output into structured
//! values. Diagnostic-text parsing stays in these modules; nothing downstream sees it.

mod command;
mod probe;
mod scene;
mod silence;

pub mod audio;

pub use probe::{FfprobeDurationProbe, parse_duration};
pub use scene::{FfmpegSceneDetector, parse_showinfo_cuts};
pub use silence::{FfmpegSilenceDetector, parse_silencedetect};
