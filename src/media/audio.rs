//! Audio extraction for speech recognition.
//!
//! We let ffmpeg demux and resample whatever container the video is in, writing a mono
//! 16 kHz PCM WAV into the work directory, then load that WAV with `hound`.

use std::ffi::OsStr;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use hound::WavReader;
use tracing::debug;
use uuid::Uuid;

use super::command::run_tool;

/// Whisper's expected mono sample rate (Hz).
pub const TARGET_SAMPLE_RATE: u32 = 16_000;

/// A file in the work directory that is removed when dropped.
#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
}

impl ScratchFile {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

/// Extract the first audio stream of `video` as mono 16 kHz signed 16-bit WAV.
pub async fn extract_wav(ffmpeg_bin: &str, video: &Path, work_dir: &Path) -> Result<ScratchFile> {
    std::fs::create_dir_all(work_dir)
        .with_context(|| format!("failed to create work dir: {}", work_dir.display()))?;

    let scratch = ScratchFile {
        path: work_dir.join(format!("audio-{}.wav", Uuid::new_v4())),
    };
    let rate = TARGET_SAMPLE_RATE.to_string();

    run_tool(
        ffmpeg_bin,
        [
            OsStr::new("-hide_banner"),
            OsStr::new("-nostats"),
            OsStr::new("-y"),
            OsStr::new("-i"),
            video.as_os_str(),
            OsStr::new("-vn"),
            OsStr::new("-ac"),
            OsStr::new("1"),
            OsStr::new("-ar"),
            OsStr::new(&rate),
            OsStr::new("-c:a"),
            OsStr::new("pcm_s16le"),
            scratch.path().as_os_str(),
        ],
    )
    .await?
    .ensure_success("ffmpeg audio extraction")?;

    debug!(path = %scratch.path().display(), "audio extracted");
    Ok(scratch)
}

/// Load an extracted WAV file into normalized samples.
pub fn load_wav(path: &Path) -> Result<Vec<f32>> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    read_wav_samples(BufReader::new(file))
}

/// Read mono 16 kHz 16-bit WAV data into `f32` samples in `[-1.0, 1.0]`.
///
/// Anything else is rejected; extraction always produces exactly this format, so a
/// mismatch means the file did not come from us.
pub fn read_wav_samples<R>(reader: R) -> Result<Vec<f32>>
where
    R: Read + Seek,
{
    let mut reader = WavReader::new(reader).context("failed to read WAV data")?;
    let spec = reader.spec();

    if spec.channels != 1 {
        bail!(
            "expected mono WAV (1 channel), got {} channels",
            spec.channels
        );
    }

    if spec.sample_rate != TARGET_SAMPLE_RATE {
        bail!(
            "expected {} Hz sample rate, got {} Hz",
            TARGET_SAMPLE_RATE,
            spec.sample_rate
        );
    }

    if spec.bits_per_sample != 16 || spec.sample_format != hound::SampleFormat::Int {
        bail!("expected 16-bit integer PCM");
    }

    reader
        .samples::<i16>()
        .map(|s| {
            s.map(|pcm| pcm as f32 / i16::MAX as f32)
                .context("failed to read WAV sample")
        })
        .collect()
}
