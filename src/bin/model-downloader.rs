// Fetches a whisper model into a model directory, or checks that it is already there.

use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::blocking::Client;

use quietcut::models::{ModelSpec, lookup_model, model_list_string};

#[derive(Parser, Debug)]
#[command(name = "model-downloader")]
#[command(about = "Download whisper models for quietcut", long_about = None)]
struct Args {
    /// List supported model names and exit.
    #[arg(long)]
    list: bool,

    /// Model name (examples: tiny.en, base.en, large-v3-turbo).
    #[arg(long, default_value = quietcut::opts::DEFAULT_MODEL)]
    model: String,

    /// Directory that holds model files (created if missing).
    #[arg(long = "model-dir", required_unless_present = "list")]
    model_dir: Option<PathBuf>,

    /// Only report whether the model is present; never download.
    #[arg(long = "check-only")]
    check_only: bool,
}

#[derive(Debug, PartialEq, Eq)]
enum Outcome {
    Available,
    Downloaded,
}

fn main() -> ExitCode {
    let args = Args::parse();

    if args.list {
        print!("{}", model_list_string());
        return ExitCode::SUCCESS;
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let Some(model_dir) = args.model_dir.as_deref() else {
        anyhow::bail!("--model-dir is required");
    };

    let outcome = ensure_model(&args.model, model_dir, args.check_only, |spec, dest| {
        let client = Client::builder()
            .user_agent("quietcut-model-downloader")
            .build()
            .context("failed to build HTTP client")?;
        download_to_path(&client, spec.url, dest)
    })?;

    let verb = match outcome {
        Outcome::Available => "is available",
        Outcome::Downloaded => "is downloaded",
    };
    println!("Model {} {verb} in {}", args.model, model_dir.display());
    Ok(())
}

/// Make sure `name` exists in `model_dir`, calling `fetch` to download it when missing.
///
/// With `check_only` a missing model is an error and `fetch` is never called.
fn ensure_model<F>(name: &str, model_dir: &Path, check_only: bool, fetch: F) -> Result<Outcome>
where
    F: FnOnce(&ModelSpec, &Path) -> Result<()>,
{
    let spec = lookup_model(name).with_context(|| {
        format!("unknown model '{name}'. Run with --list to see supported models.")
    })?;

    let dest = model_dir.join(spec.filename);
    if dest.is_file() {
        return Ok(Outcome::Available);
    }

    if check_only {
        anyhow::bail!(
            "model '{name}' is not available in {}",
            model_dir.display()
        );
    }

    fs::create_dir_all(model_dir)
        .with_context(|| format!("failed to create model dir: {}", model_dir.display()))?;

    eprintln!("downloading {} from {}", spec.filename, spec.url);
    fetch(spec, &dest)?;
    Ok(Outcome::Downloaded)
}

fn download_to_path(client: &Client, url: &str, dest: &Path) -> Result<()> {
    let resp = client
        .get(url)
        .send()
        .with_context(|| format!("request failed: {url}"))?
        .error_for_status()
        .with_context(|| format!("download failed (bad status): {url}"))?;

    let total = resp.content_length();
    stream_to_path(resp, total, dest)
}

fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

/// Copy `reader` into `dest` via a sibling `.part` file that is synced and renamed into
/// place. The `.part` file is removed if anything fails.
fn stream_to_path<R: Read>(mut reader: R, total_bytes: Option<u64>, dest: &Path) -> Result<()> {
    let pb = match total_bytes {
        Some(total) if total > 0 => ProgressBar::new(total),
        _ => ProgressBar::new_spinner(),
    };
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} {bytes}/{total_bytes} {bar:40.cyan/blue} {eta}")
            .context("invalid progress template")?
            .progress_chars("#>-"),
    );

    let part = part_path(dest);

    let result = (|| -> Result<()> {
        let mut file = fs::File::create(&part)
            .with_context(|| format!("failed to create temp file: {}", part.display()))?;

        let mut buf = [0u8; 64 * 1024];
        loop {
            let n = reader.read(&mut buf).context("download interrupted")?;
            if n == 0 {
                break;
            }
            file.write_all(&buf[..n])?;
            pb.inc(n as u64);
        }
        file.sync_all()?;

        fs::rename(&part, dest)
            .with_context(|| format!("failed to move into place: {}", dest.display()))
    })();

    pb.finish_and_clear();
    if result.is_err() {
        let _ = fs::remove_file(&part);
    }
    result
}
