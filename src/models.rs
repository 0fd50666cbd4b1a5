//! Allowlist of known-good whisper.cpp GGML models.
//!
//! Both the speech producer (to find a model file on disk) and the model downloader (to know
//! where to fetch it from) resolve model names through this table.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Download source and on-disk name for a known model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelSpec {
    /// Friendly name users type (e.g. "base.en").
    pub name: &'static str,

    /// Filename written to disk (e.g. "ggml-base.en.bin").
    pub filename: &'static str,

    /// Full download URL.
    pub url: &'static str,
}

macro_rules! ggml {
    ($name:literal) => {
        ModelSpec {
            name: $name,
            filename: concat!("ggml-", $name, ".bin"),
            url: concat!(
                "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-",
                $name,
                ".bin"
            ),
        }
    };
}

// These URLs match whisper.cpp's standard Hugging Face repo for GGML models.
pub static WHISPER_MODELS: &[ModelSpec] = &[
    ggml!("tiny"),
    ggml!("tiny.en"),
    ggml!("tiny.en-q5_1"),
    ggml!("base"),
    ggml!("base.en"),
    ggml!("base.en-q5_1"),
    ggml!("small"),
    ggml!("small.en"),
    ggml!("small.en-q5_1"),
    ggml!("medium"),
    ggml!("medium.en"),
    ggml!("medium.en-q5_0"),
    ggml!("large-v3"),
    ggml!("large-v3-turbo"),
    ggml!("large-v3-turbo-q5_0"),
];

pub fn lookup_model(name: &str) -> Option<&'static ModelSpec> {
    WHISPER_MODELS.iter().find(|m| m.name == name)
}

/// Where `name` lives (or would live) inside `model_dir`.
pub fn model_path(model_dir: &Path, name: &str) -> Result<PathBuf> {
    let spec = lookup_model(name).with_context(|| {
        format!("unknown model '{name}'. Run model-downloader --list to see supported models.")
    })?;
    Ok(model_dir.join(spec.filename))
}

/// Resolve `name` to an existing model file in `model_dir`.
pub fn locate_model(model_dir: &Path, name: &str) -> Result<PathBuf> {
    let path = model_path(model_dir, name)?;
    anyhow::ensure!(
        path.is_file(),
        "model '{name}' not found at {}; run model-downloader --model {name} --model-dir {}",
        path.display(),
        model_dir.display()
    );
    Ok(path)
}

pub fn model_list_string() -> String {
    let mut out = String::from("Whisper models:\n");
    for m in WHISPER_MODELS {
        out.push_str("  - ");
        out.push_str(m.name);
        out.push('\n');
    }
    out
}
