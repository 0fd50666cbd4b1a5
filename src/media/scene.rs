use std::ffi::OsStr;
use std::path::Path;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use tracing::debug;

use super::command::run_tool;
use crate::Result;
use crate::analysis::normalize_scene_cuts;
use crate::producer::SceneDetector;

static PTS_TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"pts_time:\s*(-?[0-9.]+)").expect("valid regex"));

/// Scene-cut detector backed by ffmpeg's scene-change score.
///
/// Frames whose `scene` score exceeds the threshold pass the `select` filter and are logged
/// by `showinfo`; each logged frame's timestamp is a cut.
#[derive(Debug, Clone)]
pub struct FfmpegSceneDetector {
    ffmpeg_bin: String,
    threshold: f64,
}

impl FfmpegSceneDetector {
    pub fn new(ffmpeg_bin: impl Into<String>, threshold: f64) -> Self {
        Self {
            ffmpeg_bin: ffmpeg_bin.into(),
            threshold,
        }
    }

    fn filter(&self) -> String {
        format!("select='gt(scene,{})',showinfo", self.threshold)
    }
}

#[async_trait]
impl SceneDetector for FfmpegSceneDetector {
    async fn detect_scene_cuts(&self, video: &Path) -> Result<Vec<f64>> {
        let filter = self.filter();
        let output = run_tool(
            &self.ffmpeg_bin,
            [
                OsStr::new("-hide_banner"),
                OsStr::new("-nostats"),
                OsStr::new("-i"),
                video.as_os_str(),
                OsStr::new("-an"),
                OsStr::new("-vf"),
                OsStr::new(&filter),
                OsStr::new("-f"),
                OsStr::new("null"),
                OsStr::new("-"),
            ],
        )
        .await?
        .ensure_success("ffmpeg scene detection")?;

        let cuts = parse_showinfo_cuts(&output.stderr);
        debug!(cuts = cuts.len(), "scene cuts parsed");
        Ok(cuts)
    }
}

/// Extract frame timestamps from `showinfo` log lines, sorted and deduplicated.
pub fn parse_showinfo_cuts(log: &str) -> Vec<f64> {
    let cuts: Vec<f64> = log
        .lines()
        .filter(|line| line.contains("showinfo"))
        .filter_map(|line| PTS_TIME_RE.captures(line)?.get(1)?.as_str().parse().ok())
        .collect();

    normalize_scene_cuts(&cuts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_pts_times_from_showinfo_lines() {
        let log = "\
Input #0, mov,mp4,m4a,3gp,3g2,mj2, from 'in.mp4':
[Parsed_showinfo_1 @ 0x55d0] config in time_base: 1/12800, frame_rate: 25/1
[Parsed_showinfo_1 @ 0x55d0] n:   0 pts:  38400 pts_time:3       duration:    512 fmt:yuv420p
[Parsed_showinfo_1 @ 0x55d0] n:   1 pts:  89600 pts_time:7.00004 duration:    512 fmt:yuv420p
[Parsed_showinfo_1 @ 0x55d0] n:   2 pts:  38400 pts_time:3       duration:    512 fmt:yuv420p
[out#0/null @ 0x55d1] video:0KiB audio:0KiB pts_time:99
";
        assert_eq!(parse_showinfo_cuts(log), vec![3.0, 7.0]);
    }

    #[test]
    fn no_selected_frames_means_no_cuts() {
        assert!(parse_showinfo_cuts("Stream mapping:\n  Stream #0:0 -> #0:0\n").is_empty());
    }

    #[test]
    fn filter_string_embeds_threshold() {
        let detector = FfmpegSceneDetector::new("ffmpeg", 0.4);
        assert_eq!(detector.filter(), "select='gt(scene,0.4)',showinfo");
    }
}
