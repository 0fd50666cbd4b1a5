//! `quietcut` finds low-information regions in a video: spans without meaningful speech or
//! visual change that are safe candidates for automatic trimming.
//!
//! This crate provides:
//! - Signal producers: duration (ffprobe), speech (whisper), silence and scene cuts (ffmpeg)
//! - The fusion engine that scores and merges silence- and scene-derived candidates
//! - The pipeline that runs the producers under a fatal/recoverable failure policy
//! - JSON output of the complete analysis
//!
//! Most consumers should start with [`Analyzer`] and [`AnalysisOpts`].

// High-level API.
pub mod analysis;
pub mod opts;
pub mod pipeline;

// Interval types and the fusion engine.
pub mod fusion;
pub mod interval;

// Producer interfaces and the built-in implementations.
pub mod media;
pub mod models;
pub mod producer;
pub mod whisper;

// Output serialization.
pub mod output;

mod error;

// Logging configuration and control.
#[cfg(feature = "logging")]
pub mod logging;

pub use analysis::{AnalysisResult, Stage, StageWarning};
pub use error::{Error, Result};
pub use fusion::{FusionEngine, FusionParams};
pub use interval::{LowInfoRegion, SilenceRegion, SpeechRegion, TimeInterval};
pub use opts::AnalysisOpts;
pub use pipeline::{Analyzer, Producers};
