//! Region fusion: turns silence, scene-cut, and speech signals into one scored list of
//! low-information regions.
//!
//! Two independent candidate passes feed a single merge:
//! - silence pass: every long-enough pause becomes a candidate, scored by its length
//! - scene pass: every long-enough visual segment with little speech becomes a candidate,
//!   scored by how little speech it holds plus a small length bonus
//!
//! Candidates from both passes share one shape and compete equally in the merge. Bounds and
//! scores are rounded to milliseconds/milliunits when a candidate is created, before the merge
//! compares boundaries, and again on output.

use tracing::debug;

use crate::interval::{
    LowInfoRegion, SilenceRegion, SpeechRegion, TimeInterval, round3, sort_by_bounds,
};

/// An unmerged, scored interval produced by one signal pass.
///
/// Candidates and merged regions have the same shape, so merged output can be fed back into
/// [`merge_candidates`] unchanged.
pub type Candidate = LowInfoRegion;

/// Thresholds and weights used by the two candidate passes.
///
/// `Default` holds the tuned production values.
#[derive(Debug, Clone, PartialEq)]
pub struct FusionParams {
    /// Silences shorter than this are ignored.
    pub min_silence_sec: f64,
    pub silence_base_score: f64,
    /// Upper bound of the length bonus for silences.
    pub silence_length_bonus_cap: f64,
    /// Seconds of silence per full point of length bonus.
    pub silence_length_divisor: f64,

    /// Scene segments shorter than this are ignored.
    pub min_scene_sec: f64,
    /// Scene segments whose speech coverage exceeds this are treated as spoken content.
    pub max_speech_coverage: f64,
    pub scene_base_score: f64,
    /// Weight of `(1 - coverage)` in the scene score.
    pub scene_quiet_weight: f64,
    pub scene_length_bonus_cap: f64,
    pub scene_length_divisor: f64,
}

impl Default for FusionParams {
    fn default() -> Self {
        Self {
            min_silence_sec: 0.4,
            silence_base_score: 0.55,
            silence_length_bonus_cap: 0.35,
            silence_length_divisor: 8.0,

            min_scene_sec: 0.8,
            max_speech_coverage: 0.2,
            scene_base_score: 0.4,
            scene_quiet_weight: 0.45,
            scene_length_bonus_cap: 0.15,
            scene_length_divisor: 12.0,
        }
    }
}

/// The fusion engine. Stateless apart from its parameters.
#[derive(Debug, Clone, Default)]
pub struct FusionEngine {
    params: FusionParams,
}

impl FusionEngine {
    pub fn new(params: FusionParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &FusionParams {
        &self.params
    }

    /// Fuse all three signals into sorted, non-overlapping, non-touching low-info regions.
    pub fn fuse(
        &self,
        duration_sec: f64,
        silence_regions: &[SilenceRegion],
        scene_cuts_sec: &[f64],
        speech_regions: &[SpeechRegion],
    ) -> Vec<LowInfoRegion> {
        let mut candidates = self.silence_candidates(silence_regions);
        let silence_count = candidates.len();

        candidates.extend(self.scene_candidates(duration_sec, scene_cuts_sec, speech_regions));
        debug!(
            silence_candidates = silence_count,
            scene_candidates = candidates.len() - silence_count,
            "fusion candidates built"
        );

        merge_candidates(candidates)
    }

    /// Silence pass: one candidate per silence region of sufficient length.
    pub fn silence_candidates(&self, silence_regions: &[SilenceRegion]) -> Vec<Candidate> {
        let p = &self.params;

        silence_regions
            .iter()
            .filter(|s| s.interval.len_sec() >= p.min_silence_sec)
            .map(|s| {
                let len = s.interval.len_sec();
                let bonus = (len / p.silence_length_divisor).min(p.silence_length_bonus_cap);
                Candidate {
                    interval: s.interval,
                    score: round3((p.silence_base_score + bonus).min(1.0)),
                }
            })
            .collect()
    }

    /// Scene pass: one candidate per quiet, long-enough segment between scene boundaries.
    pub fn scene_candidates(
        &self,
        duration_sec: f64,
        scene_cuts_sec: &[f64],
        speech_regions: &[SpeechRegion],
    ) -> Vec<Candidate> {
        let p = &self.params;
        let boundaries = scene_boundaries(duration_sec, scene_cuts_sec);

        let mut out = Vec::new();
        for pair in boundaries.windows(2) {
            let Ok(segment) = TimeInterval::new(pair[0], pair[1]) else {
                continue;
            };

            let len = segment.len_sec();
            if len < p.min_scene_sec {
                continue;
            }

            let coverage = speech_coverage(&segment, speech_regions);
            if coverage > p.max_speech_coverage {
                continue;
            }

            let bonus = (len / p.scene_length_divisor).min(p.scene_length_bonus_cap);
            let score = p.scene_base_score + (1.0 - coverage) * p.scene_quiet_weight + bonus;
            out.push(Candidate {
                interval: segment,
                score: round3(score.min(1.0)),
            });
        }

        out
    }
}

/// Fraction of `segment` overlapped by speech (summed per region, so it may exceed 1.0 when
/// speech regions overlap each other).
pub fn speech_coverage(segment: &TimeInterval, speech_regions: &[SpeechRegion]) -> f64 {
    let spoken: f64 = speech_regions
        .iter()
        .map(|s| segment.overlap(&s.interval))
        .sum();
    spoken / segment.len_sec()
}

/// Normalize raw cut timestamps into a boundary sequence from `0` to `duration_sec`.
///
/// Cuts are clamped into `[0, duration]`, rounded, sorted, and deduplicated; `0` and the
/// duration are inserted when missing.
pub fn scene_boundaries(duration_sec: f64, scene_cuts_sec: &[f64]) -> Vec<f64> {
    let duration = round3(duration_sec.max(0.0));

    let mut cuts: Vec<f64> = scene_cuts_sec
        .iter()
        .filter(|v| v.is_finite())
        .map(|v| round3(v.clamp(0.0, duration)))
        .collect();
    cuts.sort_by(f64::total_cmp);
    cuts.dedup();

    if cuts.first().is_none_or(|first| *first > 0.0) {
        cuts.insert(0, 0.0);
    }
    if cuts.last().is_some_and(|last| *last < duration) {
        cuts.push(duration);
    }

    cuts
}

/// Greedy left-to-right merge of candidates into sorted, non-touching regions.
///
/// A candidate whose start is at or before the open region's end extends it (end and score
/// both take the max); anything later closes the open region.
pub fn merge_candidates(mut candidates: Vec<Candidate>) -> Vec<LowInfoRegion> {
    sort_by_bounds(&mut candidates, |c| c.interval);

    let mut merged: Vec<LowInfoRegion> = Vec::with_capacity(candidates.len());
    for current in candidates {
        let Some(open) = merged.last_mut() else {
            merged.push(current);
            continue;
        };

        if current.interval.start_sec() > open.interval.end_sec() {
            merged.push(current);
            continue;
        }

        open.interval = open.interval.extend_to(current.interval.end_sec());
        open.score = round3(open.score.max(current.score));
    }

    merged
}
