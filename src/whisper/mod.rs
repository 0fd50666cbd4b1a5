//! Speech producer powered by `whisper-rs` / `whisper.cpp`.

use std::path::{Path, PathBuf};

use anyhow::anyhow;
use async_trait::async_trait;
use tracing::debug;

use crate::Result;
use crate::media::audio::{extract_wav, load_wav};
use crate::models::locate_model;
use crate::opts::AnalysisOpts;
use crate::producer::{SpeechDetector, SpeechSegment};

mod ctx;
mod logging;
mod segments;

pub use logging::init_whisper_logging;
pub use segments::confidence_from_avg_logprob;

/// Transcribes a video's audio track with a local whisper.cpp model.
///
/// The model is resolved and loaded on each call, so a missing model surfaces as a speech
/// stage failure rather than a construction error.
#[derive(Debug, Clone)]
pub struct WhisperSpeechDetector {
    ffmpeg_bin: String,
    work_dir: PathBuf,
    model: String,
    model_dir: PathBuf,
}

impl WhisperSpeechDetector {
    pub fn new(
        ffmpeg_bin: impl Into<String>,
        work_dir: impl Into<PathBuf>,
        model: impl Into<String>,
        model_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            ffmpeg_bin: ffmpeg_bin.into(),
            work_dir: work_dir.into(),
            model: model.into(),
            model_dir: model_dir.into(),
        }
    }

    pub fn from_opts(opts: &AnalysisOpts) -> Self {
        Self::new(
            opts.ffmpeg_bin.clone(),
            opts.work_dir.clone(),
            opts.model.clone(),
            opts.model_dir.clone(),
        )
    }
}

#[async_trait]
impl SpeechDetector for WhisperSpeechDetector {
    async fn detect_speech(&self, video: &Path) -> Result<Vec<SpeechSegment>> {
        let model_path = locate_model(&self.model_dir, &self.model)?;
        let wav = extract_wav(&self.ffmpeg_bin, video, &self.work_dir).await?;
        let wav_path = wav.path().to_path_buf();

        // whisper inference is CPU-bound and blocking; keep it off the async workers.
        let segments = tokio::task::spawn_blocking(move || -> anyhow::Result<_> {
            let samples = load_wav(&wav_path)?;
            if samples.is_empty() {
                return Ok(Vec::new());
            }

            let ctx = ctx::get_context(&model_path)?;
            segments::transcribe(&ctx, &samples)
        })
        .await
        .map_err(|err| anyhow!("speech worker failed: {err}"))??;

        drop(wav);
        debug!(segments = segments.len(), "speech transcribed");
        Ok(segments)
    }
}
