use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::level_filters::LevelFilter;

use quietcut::output::write_result_file;
use quietcut::{AnalysisOpts, Analyzer};

#[derive(Parser, Debug)]
#[command(name = "quietcut")]
#[command(about = "Find trim-safe, low-information regions in a video")]
struct Params {
    /// Input video path.
    #[arg(long = "video")]
    video: PathBuf,

    /// Working directory for intermediate files (created if missing).
    #[arg(long = "work-dir")]
    work_dir: PathBuf,

    /// Output JSON path.
    #[arg(long = "out")]
    out: PathBuf,

    /// Whisper model name.
    #[arg(long = "model", default_value = quietcut::opts::DEFAULT_MODEL)]
    model: String,

    /// Whisper model cache directory (created if missing).
    #[arg(long = "model-dir")]
    model_dir: PathBuf,

    #[arg(long = "ffmpeg-bin", default_value = "ffmpeg")]
    ffmpeg_bin: String,

    #[arg(long = "ffprobe-bin", default_value = "ffprobe")]
    ffprobe_bin: String,

    /// Time budget for the duration, silence, and scene stages. 0 waits indefinitely.
    #[arg(long = "stage-timeout-secs", default_value_t = 600)]
    stage_timeout_secs: u64,

    /// Time budget for speech analysis. 0 waits indefinitely.
    #[arg(long = "speech-timeout-secs", default_value_t = 3600)]
    speech_timeout_secs: u64,

    /// Run signal producers one after another instead of concurrently.
    #[arg(long = "sequential", default_value_t = false)]
    sequential: bool,

    /// Also log recoverable stage warnings to stderr.
    #[arg(long = "echo-warnings", default_value_t = false)]
    echo_warnings: bool,
}

impl Params {
    fn to_opts(&self) -> AnalysisOpts {
        let mut opts = AnalysisOpts::new(&self.work_dir, &self.model_dir)
            .with_stage_timeout(secs_to_timeout(self.stage_timeout_secs));

        opts.model = self.model.clone();
        opts.ffmpeg_bin = self.ffmpeg_bin.clone();
        opts.ffprobe_bin = self.ffprobe_bin.clone();
        opts.speech_timeout = secs_to_timeout(self.speech_timeout_secs);
        opts.sequential = self.sequential;
        opts.echo_warnings = self.echo_warnings;
        opts
    }
}

fn secs_to_timeout(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

#[tokio::main]
async fn main() -> ExitCode {
    let params = Params::parse();

    let level = if params.echo_warnings {
        LevelFilter::WARN
    } else {
        LevelFilter::ERROR
    };
    quietcut::logging::init(level);

    let analyzer = Analyzer::new(&params.to_opts());
    report(run(&params, &analyzer).await)
}

/// Map a run outcome to the process exit status, printing fatal errors as one stderr line.
fn report(outcome: Result<()>) -> ExitCode {
    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(params: &Params, analyzer: &Analyzer) -> Result<()> {
    for dir in [&params.work_dir, &params.model_dir] {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create directory: {}", dir.display()))?;
    }

    let result = analyzer.analyze(&params.video).await?;

    write_result_file(&result, &params.out)?;

    println!("Analysis completed for {}", params.video.display());
    Ok(())
}
