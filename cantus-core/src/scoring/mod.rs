//! Candidate scoring and selection.
//!
//! ## Scoring stages (per pool)
//!
//! ```text
//! 1. Heuristics per candidate: repetition, duration, silence (no models)
//! 2. One batched recognition call for the whole pool (spawn_blocking)
//! 3. Error distance per candidate vs. the normalized reference
//! 4. score = recognition_error + 0.3 × weighted heuristic blend
//! 5. Minimum score wins; ties resolve to the lowest index
//! ```
//!
//! Scoring is all-or-nothing across the pool: either every candidate gets a
//! score or the call fails. There is no heuristics-only fallback — a missing
//! recognizer is a hard error for multi-candidate requests.

pub mod duration;
pub mod phoneme;
pub mod repetition;
pub mod silence;
pub mod transcript;

use tracing::debug;

use crate::asr::{self, RecognizerHandle};
use crate::audio::AudioClip;
use crate::error::{CantusError, Result};
use crate::lang::{self, Language};

/// One attempted rendering of the request.
///
/// Created once per successfully parsed generation result, scored at most
/// once, never mutated after selection, discarded with the response.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Speech-codec token ids; never empty once accepted into the pool.
    pub tokens: Vec<u32>,
    /// Synthesized waveform, owned exclusively by this candidate.
    pub audio: AudioClip,
    /// Present only after recognition scoring ran.
    pub recognized_text: Option<String>,
    pub repeat_penalty: f32,
    pub length_penalty: f32,
    pub silence_penalty: f32,
    pub recognition_error: Option<f32>,
    /// Combined score; lower is better. Present only after selection ran.
    pub score: Option<f32>,
}

impl Candidate {
    pub fn new(tokens: Vec<u32>, audio: AudioClip) -> Self {
        Self {
            tokens,
            audio,
            recognized_text: None,
            repeat_penalty: 0.0,
            length_penalty: 0.0,
            silence_penalty: 0.0,
            recognition_error: None,
            score: None,
        }
    }
}

/// Relative weights of the scoring signals.
#[derive(Debug, Clone)]
pub struct ScoreWeights {
    pub length: f32,
    pub silence: f32,
    pub repeat: f32,
    /// Blend factor applied to the heuristic sum before adding the
    /// recognition error.
    pub heuristic_blend: f32,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            length: 0.4,
            silence: 0.4,
            repeat: 0.2,
            heuristic_blend: 0.3,
        }
    }
}

/// Tunable scoring constants. The defaults are empirically tuned values
/// carried over unchanged; override per engine instance if a deployment
/// needs different behavior.
#[derive(Debug, Clone)]
pub struct ScoringConfig {
    /// Codec tokens per second of audio.
    pub token_rate_hz: f32,
    /// Seconds-per-phoneme (min, max) windows per language.
    pub spp_en: (f32, f32),
    pub spp_ja: (f32, f32),
    pub spp_other: (f32, f32),
    /// Mean |amplitude| below which a 20 ms frame counts as silent.
    pub silence_amplitude_threshold: f32,
    /// Silent-frame ratio above which the ratio term kicks in.
    pub silence_ratio_threshold: f32,
    /// Longest-silent-run length above which the run term kicks in.
    pub silence_long_threshold_secs: f32,
    pub weights: ScoreWeights,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            token_rate_hz: 25.0,
            spp_en: (0.06, 0.12),
            spp_ja: (0.07, 0.15),
            spp_other: (0.07, 0.18),
            silence_amplitude_threshold: 1e-4,
            silence_ratio_threshold: 0.2,
            silence_long_threshold_secs: 2.0,
            weights: ScoreWeights::default(),
        }
    }
}

impl ScoringConfig {
    /// The seconds-per-phoneme window for a resolved language.
    pub fn spp_window(&self, language: Language) -> (f32, f32) {
        match language {
            Language::En => self.spp_en,
            Language::Ja => self.spp_ja,
            Language::Auto => self.spp_other,
        }
    }
}

/// Per-request scoring inputs; immutable for the lifetime of one request.
#[derive(Debug, Clone, Copy)]
pub struct ScoringContext<'a> {
    /// The text the candidates were asked to speak.
    pub reference_text: &'a str,
    /// Requested language; `Auto` resolves from the reference text.
    pub language: Language,
    pub config: &'a ScoringConfig,
}

/// Outcome of scoring a pool.
#[derive(Debug, Clone, Copy)]
pub struct Selection {
    /// Index of the winning candidate in the pool.
    pub index: usize,
    /// Wall-clock seconds spent in the batched recognition call.
    pub asr_secs: f64,
}

/// Score every candidate and pick the best one.
///
/// Heuristics run first (no collaborators needed), then a single batched
/// recognition call covers the entire pool, then the combined scores are
/// assigned and the stable minimum selected.
///
/// # Errors
/// - [`CantusError::NoUsableCandidates`] on an empty pool (callers should
///   guard the 0/1-candidate cases before invoking scoring).
/// - Recognition failures propagate — scoring never silently degrades to
///   heuristics-only.
pub async fn score_and_select(
    ctx: ScoringContext<'_>,
    candidates: &mut [Candidate],
    recognizer: &RecognizerHandle,
) -> Result<Selection> {
    if candidates.is_empty() {
        return Err(CantusError::NoUsableCandidates);
    }
    let resolved = lang::resolve(ctx.reference_text, ctx.language);
    debug!(
        count = candidates.len(),
        language = %resolved,
        "scoring candidates"
    );

    for candidate in candidates.iter_mut() {
        candidate.repeat_penalty = repetition::repeat_penalty(&candidate.tokens);
        candidate.length_penalty = duration::length_penalty(
            ctx.config,
            ctx.reference_text,
            candidate.tokens.len(),
            resolved,
        );
        candidate.silence_penalty = silence::silence_penalty(ctx.config, &candidate.audio);
    }

    let clips: Vec<AudioClip> = candidates.iter().map(|c| c.audio.clone()).collect();
    let (asr_secs, texts) = asr::transcribe_pool(recognizer, clips, resolved.hint()).await?;
    debug!(asr_secs = format_args!("{asr_secs:.3}"), "recognition completed");

    let reference = transcript::normalize_reference(ctx.reference_text, resolved);
    for (candidate, text) in candidates.iter_mut().zip(texts) {
        candidate.recognition_error = Some(transcript::error_against(&reference, &text));
        candidate.recognized_text = Some(text);
    }

    let weights = &ctx.config.weights;
    for candidate in candidates.iter_mut() {
        let heuristic = weights.length * candidate.length_penalty
            + weights.silence * candidate.silence_penalty
            + weights.repeat * candidate.repeat_penalty;
        let recognition = candidate.recognition_error.unwrap_or(1.0);
        let score = recognition + weights.heuristic_blend * heuristic;
        candidate.score = Some(score);
        debug!(
            score = format_args!("{score:.4}"),
            recognition = format_args!("{recognition:.4}"),
            length = format_args!("{:.4}", candidate.length_penalty),
            silence = format_args!("{:.4}", candidate.silence_penalty),
            repeat = format_args!("{:.4}", candidate.repeat_penalty),
            "candidate scored"
        );
    }

    let index = select_best(candidates);
    debug!(
        index,
        score = format_args!("{:.4}", candidates[index].score.unwrap_or(0.0)),
        "selected candidate"
    );
    Ok(Selection { index, asr_secs })
}

/// Index of the minimum-score candidate; ties resolve to the lowest index.
/// Must not be called on an empty pool.
pub fn select_best(candidates: &[Candidate]) -> usize {
    let mut best_index = 0usize;
    let mut best_score = f32::INFINITY;
    for (index, candidate) in candidates.iter().enumerate() {
        let score = candidate.score.unwrap_or(0.0);
        if score < best_score {
            best_index = index;
            best_score = score;
        }
    }
    best_index
}
