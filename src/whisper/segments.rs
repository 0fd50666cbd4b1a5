use anyhow::{Context, Result};
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperSegment, WhisperState};

use crate::producer::SpeechSegment;

/// Transcription locale. Analysis is English-only.
const LANGUAGE: &str = "en";

/// Average log-probability assumed for segments that report no usable tokens.
const FALLBACK_AVG_LOGPROB: f64 = -1.0;

/// Run whisper over mono 16 kHz samples and collect raw speech segments.
pub(super) fn transcribe(ctx: &WhisperContext, samples: &[f32]) -> Result<Vec<SpeechSegment>> {
    let state = run_whisper_full(ctx, samples)?;

    let mut out = Vec::new();
    for whisper_segment in state.as_iter() {
        out.push(to_speech_segment(&whisper_segment)?);
    }
    Ok(out)
}

fn to_speech_segment(segment: &WhisperSegment) -> Result<SpeechSegment> {
    let text = segment_text(&segment.to_str_lossy().context("failed to get segment text")?);

    let avg_logprob = mean_token_logprob(segment)?.unwrap_or(FALLBACK_AVG_LOGPROB);

    Ok(SpeechSegment {
        start_sec: centiseconds_to_seconds(segment.start_timestamp()),
        end_sec: centiseconds_to_seconds(segment.end_timestamp()),
        text,
        confidence: confidence_from_avg_logprob(avg_logprob),
    })
}

/// Trimmed segment text. Invalid UTF-8 has already been replaced with U+FFFD.
fn segment_text(raw: &str) -> String {
    raw.trim().to_owned()
}

/// Map an average token log-probability onto `[0, 1]`.
///
/// `0.0` (certain) maps to `1.0`; anything at or below `-5.0` maps to `0.0`.
pub fn confidence_from_avg_logprob(avg_logprob: f64) -> f64 {
    (1.0 + avg_logprob / 5.0).clamp(0.0, 1.0)
}

/// Mean `plog` over the segment's text tokens, or `None` when it has none.
fn mean_token_logprob(segment: &WhisperSegment) -> Result<Option<f64>> {
    let token_count = segment.n_tokens();
    let token_count = usize::try_from(token_count)
        .with_context(|| format!("segment reported negative token count: {token_count}"))?;

    let mut sum = 0.0;
    let mut n = 0usize;
    for token_idx in 0..token_count {
        let token = segment
            .get_token(token_idx as i32)
            .context("failed to get token from segment")?;

        // BPE tokens may hold half of a multi-byte character.
        let text = token
            .to_str_lossy()
            .with_context(|| format!("failed to get token text at index {token_idx}"))?;
        if is_special_token(&text) {
            continue;
        }

        sum += f64::from(token.token_data().plog);
        n += 1;
    }

    Ok((n > 0).then(|| sum / n as f64))
}

/// whisper control tokens are formatted like `[_BEG_]` or `[_TT_50]`.
fn is_special_token(text: &str) -> bool {
    text.starts_with("[_") && text.ends_with(']')
}

fn centiseconds_to_seconds(value: i64) -> f64 {
    if value < 0 { 0.0 } else { value as f64 / 100.0 }
}

fn build_full_params() -> FullParams<'static, 'static> {
    let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });

    params.set_n_threads(num_cpus::get() as i32);
    params.set_translate(false);
    params.set_language(Some(LANGUAGE));
    params.set_temperature(0.0);
    params.set_no_context(true);
    params.set_single_segment(false);

    params.set_print_progress(false);
    params.set_print_special(false);
    params.set_print_realtime(false);
    params.set_print_timestamps(false);

    params
}

fn run_whisper_full(ctx: &WhisperContext, samples: &[f32]) -> Result<WhisperState> {
    let params = build_full_params();

    let mut state = ctx
        .create_state()
        .context("failed to create whisper state")?;

    state
        .full(params, samples)
        .context("failed to run whisper full()")?;

    Ok(state)
}
