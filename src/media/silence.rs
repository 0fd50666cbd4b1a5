use std::ffi::OsStr;
use std::path::Path;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use tracing::debug;

use super::command::run_tool;
use crate::Result;
use crate::interval::SilenceRegion;
use crate::producer::SilenceDetector;

static START_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"silence_start:\s*(-?[0-9.]+)").expect("valid regex"));
static END_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"silence_end:\s*(-?[0-9.]+)").expect("valid regex"));

/// Silence detector backed by ffmpeg's `silencedetect` audio filter.
#[derive(Debug, Clone)]
pub struct FfmpegSilenceDetector {
    ffmpeg_bin: String,
    noise: String,
    min_duration_sec: f64,
}

impl FfmpegSilenceDetector {
    /// `noise` is the filter's noise floor (e.g. `"-30dB"`); `min_duration_sec` the shortest
    /// silence the filter reports.
    pub fn new(
        ffmpeg_bin: impl Into<String>,
        noise: impl Into<String>,
        min_duration_sec: f64,
    ) -> Self {
        Self {
            ffmpeg_bin: ffmpeg_bin.into(),
            noise: noise.into(),
            min_duration_sec,
        }
    }

    fn filter(&self) -> String {
        format!("silencedetect=noise={}:d={}", self.noise, self.min_duration_sec)
    }
}

#[async_trait]
impl SilenceDetector for FfmpegSilenceDetector {
    async fn detect_silence(&self, video: &Path) -> Result<Vec<SilenceRegion>> {
        let filter = self.filter();
        let output = run_tool(
            &self.ffmpeg_bin,
            [
                OsStr::new("-hide_banner"),
                OsStr::new("-nostats"),
                OsStr::new("-i"),
                video.as_os_str(),
                OsStr::new("-vn"),
                OsStr::new("-af"),
                OsStr::new(&filter),
                OsStr::new("-f"),
                OsStr::new("null"),
                OsStr::new("-"),
            ],
        )
        .await?
        .ensure_success("ffmpeg silencedetect")?;

        let regions = parse_silencedetect(&output.stderr);
        debug!(regions = regions.len(), "silencedetect parsed");
        Ok(regions)
    }
}

/// Pair `silence_start` / `silence_end` markers from silencedetect's log into regions.
///
/// A start without a following end (the stream ended mid-silence) is dropped, as is an end
/// with no open start. Pairs that do not form a positive interval after rounding are skipped.
pub fn parse_silencedetect(log: &str) -> Vec<SilenceRegion> {
    let mut regions = Vec::new();
    let mut open_start: Option<f64> = None;

    for line in log.lines() {
        if let Some(start) = capture_seconds(&START_RE, line) {
            // ffmpeg can report tiny negative starts for leading silence.
            open_start = Some(start.max(0.0));
            continue;
        }

        let Some(end) = capture_seconds(&END_RE, line) else {
            continue;
        };
        let Some(start) = open_start.take() else {
            continue;
        };

        if let Ok(region) = SilenceRegion::new(start, end) {
            regions.push(region);
        }
    }

    regions
}

fn capture_seconds(re: &Regex, line: &str) -> Option<f64> {
    re.captures(line)?.get(1)?.as_str().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds(regions: &[SilenceRegion]) -> Vec<(f64, f64)> {
        regions
            .iter()
            .map(|r| (r.interval.start_sec(), r.interval.end_sec()))
            .collect()
    }

    #[test]
    fn pairs_markers_in_order() {
        let log = "\
[silencedetect @ 0x5581] silence_start: 1.2346
[silencedetect @ 0x5581] silence_end: 2.5 | silence_duration: 1.2654
size=N/A time=00:00:05.00 bitrate=N/A speed= 512x
[silencedetect @ 0x5581] silence_start: 4
[silencedetect @ 0x5581] silence_end: 4.75 | silence_duration: 0.75
";
        assert_eq!(
            bounds(&parse_silencedetect(log)),
            vec![(1.235, 2.5), (4.0, 4.75)]
        );
    }

    #[test]
    fn trailing_start_without_end_is_dropped() {
        let log = "\
[silencedetect @ 0x1] silence_start: 0.5
[silencedetect @ 0x1] silence_end: 1.5 | silence_duration: 1
[silencedetect @ 0x1] silence_start: 9.0
";
        assert_eq!(bounds(&parse_silencedetect(log)), vec![(0.5, 1.5)]);
    }

    #[test]
    fn orphan_end_and_degenerate_pairs_are_skipped() {
        let log = "\
[silencedetect @ 0x1] silence_end: 1.0 | silence_duration: 1
[silencedetect @ 0x1] silence_start: 3.0
[silencedetect @ 0x1] silence_end: 3.0 | silence_duration: 0
[silencedetect @ 0x1] silence_start: -0.0015
[silencedetect @ 0x1] silence_end: 0.8 | silence_duration: 0.8
";
        assert_eq!(bounds(&parse_silencedetect(log)), vec![(0.0, 0.8)]);
    }

    #[test]
    fn filter_string_uses_configured_values() {
        let detector = FfmpegSilenceDetector::new("ffmpeg", "-35dB", 0.5);
        assert_eq!(detector.filter(), "silencedetect=noise=-35dB:d=0.5");
    }
}
