use std::ffi::OsStr;
use std::path::Path;

use anyhow::{Context, ensure};
use async_trait::async_trait;

use super::command::run_tool;
use crate::Result;
use crate::producer::DurationProbe;

/// Duration probe backed by `ffprobe`'s container-level duration.
#[derive(Debug, Clone)]
pub struct FfprobeDurationProbe {
    ffprobe_bin: String,
}

impl FfprobeDurationProbe {
    pub fn new(ffprobe_bin: impl Into<String>) -> Self {
        Self {
            ffprobe_bin: ffprobe_bin.into(),
        }
    }
}

#[async_trait]
impl DurationProbe for FfprobeDurationProbe {
    async fn probe_duration(&self, video: &Path) -> Result<f64> {
        let output = run_tool(
            &self.ffprobe_bin,
            [
                OsStr::new("-v"),
                OsStr::new("error"),
                OsStr::new("-show_entries"),
                OsStr::new("format=duration"),
                OsStr::new("-of"),
                OsStr::new("default=noprint_wrappers=1:nokey=1"),
                video.as_os_str(),
            ],
        )
        .await?
        .ensure_success("ffprobe")?;

        Ok(parse_duration(&output.stdout)?)
    }
}

/// Parse ffprobe's bare `format=duration` output.
pub fn parse_duration(text: &str) -> anyhow::Result<f64> {
    let text = text.trim();
    let duration: f64 = text
        .parse()
        .with_context(|| format!("ffprobe returned an unparseable duration: '{text}'"))?;
    ensure!(
        duration.is_finite() && duration > 0.0,
        "ffprobe returned non-positive duration"
    );
    Ok(duration)
}
