//! `BestOfNEngine` — top-level request orchestration.
//!
//! ## Stage order (hard dependency, no pipelining)
//!
//! ```text
//! resolve model → generate N texts → parse tokens → synthesize (batch)
//!     → heuristic scoring → batched recognition → selection
//! ```
//!
//! Each stage starts only once its predecessor's full output is available:
//! the batched recognition call must see the entire candidate pool, so there
//! is nothing to stream. Generation attempts themselves run concurrently
//! (see [`crate::llm`]); codec and recognition calls run on blocking worker
//! threads so the async executor stays free.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::asr::RecognizerHandle;
use crate::audio::AudioClip;
use crate::error::{CantusError, Result};
use crate::lang::Language;
use crate::llm::{ChatMessage, ChatParams, LlmClient};
use crate::scoring::{self, Candidate, ScoringConfig, ScoringContext};
use crate::synth::{CodecHandle, VoiceReference};
use crate::tokens;

/// Configuration for `BestOfNEngine`.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub scoring: ScoringConfig,
    /// Upper bound on the candidate count of a single request. Default: 8.
    pub max_candidates: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            scoring: ScoringConfig::default(),
            max_candidates: 8,
        }
    }
}

/// One synthesis request.
#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    /// The text to speak; also the scoring reference.
    pub text: String,
    /// Voice identity forwarded to the codec.
    pub reference: VoiceReference,
    pub params: ChatParams,
    /// Requested candidate count (clamped to `[1, max_candidates]`).
    pub candidates: usize,
    /// Scoring language; `Auto` resolves from the text.
    pub language: Language,
}

/// The selected rendering plus request diagnostics.
#[derive(Debug, Clone)]
pub struct Synthesis {
    pub tokens: Vec<u32>,
    pub audio: AudioClip,
    /// Index of the winner within the scored pool (0 on the fast path).
    pub selected_index: usize,
    /// Size of the pool that survived parsing.
    pub candidate_count: usize,
    pub timings: StageTimings,
}

/// Per-stage wall-clock timings for one request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageTimings {
    pub llm_sec: f64,
    pub parse_sec: f64,
    pub codec_sec: f64,
    pub total_sec: f64,
    /// Ranking time net of recognition, clamped to ≥ 0. `None` on the
    /// single-candidate fast path.
    pub best_of_n_sec: Option<f64>,
    /// Batched recognition time. `None` on the fast path.
    pub asr_sec: Option<f64>,
}

/// The top-level engine handle.
///
/// All fields are shared handles; wrap in `Arc` (or clone the handles) to
/// serve concurrent requests. No request-level state is retained between
/// calls.
pub struct BestOfNEngine {
    llm: Arc<LlmClient>,
    codec: CodecHandle,
    recognizer: Option<RecognizerHandle>,
    config: EngineConfig,
}

impl BestOfNEngine {
    /// Create an engine. A `None` recognizer limits the engine to
    /// single-candidate requests — multi-candidate scoring fails fast.
    pub fn new(
        llm: Arc<LlmClient>,
        codec: CodecHandle,
        recognizer: Option<RecognizerHandle>,
        config: EngineConfig,
    ) -> Self {
        Self {
            llm,
            codec,
            recognizer,
            config,
        }
    }

    /// Serve one request end-to-end and return the selected rendering.
    ///
    /// # Errors
    /// - [`CantusError::AllCandidatesFailed`] when every generation attempt
    ///   failed (single-attempt failures propagate unmasked for n == 1).
    /// - [`CantusError::NoUsableCandidates`] when no attempt produced
    ///   parseable speech tokens.
    /// - [`CantusError::RecognizerUnavailable`] for a multi-candidate pool
    ///   without a recognition backend.
    /// - Codec/recognition failures propagate from the collaborators.
    pub async fn synthesize(&self, request: SynthesisRequest) -> Result<Synthesis> {
        let t0 = Instant::now();
        let n = request.candidates.clamp(1, self.config.max_candidates);
        let model = self
            .llm
            .resolve_model(request.params.model.as_deref())
            .await?;

        let messages = [ChatMessage::user(request.text.clone())];
        let texts = Arc::clone(&self.llm)
            .generate_candidates(&messages, &request.params, &model, n)
            .await?;
        let t1 = Instant::now();

        let mut token_lists: Vec<Vec<u32>> = Vec::with_capacity(texts.len());
        for text in &texts {
            match tokens::parse_speech_tokens(text) {
                Ok(parsed) => token_lists.push(parsed),
                Err(e) => warn!(error = %e, "dropping candidate without speech tokens"),
            }
        }
        if token_lists.is_empty() {
            return Err(CantusError::NoUsableCandidates);
        }
        debug!(
            count = token_lists.len(),
            token_lengths = ?token_lists.iter().map(Vec::len).collect::<Vec<_>>(),
            "parsed candidate pool"
        );
        let t2 = Instant::now();

        let synthesis = if token_lists.len() == 1 {
            // Fast path: a single candidate is returned directly, scoring
            // skipped entirely.
            let tokens = token_lists.swap_remove(0);
            let audio = self
                .synthesize_single(tokens.clone(), request.reference)
                .await?;
            let t3 = Instant::now();
            Synthesis {
                tokens,
                audio,
                selected_index: 0,
                candidate_count: 1,
                timings: StageTimings {
                    llm_sec: (t1 - t0).as_secs_f64(),
                    parse_sec: (t2 - t1).as_secs_f64(),
                    codec_sec: (t3 - t2).as_secs_f64(),
                    total_sec: t0.elapsed().as_secs_f64(),
                    best_of_n_sec: None,
                    asr_sec: None,
                },
            }
        } else {
            // Scoring requires recognition for the whole pool; fail before
            // spending codec time if no backend is wired in.
            let recognizer = self
                .recognizer
                .clone()
                .ok_or(CantusError::RecognizerUnavailable)?;

            let clips = self
                .synthesize_pool(token_lists.clone(), request.reference)
                .await?;
            if clips.len() != token_lists.len() {
                return Err(CantusError::Synthesis(format!(
                    "codec returned {} clips for {} token sequences",
                    clips.len(),
                    token_lists.len()
                )));
            }
            let t3 = Instant::now();

            let mut candidates: Vec<Candidate> = token_lists
                .into_iter()
                .zip(clips)
                .map(|(tokens, audio)| Candidate::new(tokens, audio))
                .collect();
            let pool_size = candidates.len();

            let ctx = ScoringContext {
                reference_text: &request.text,
                language: request.language,
                config: &self.config.scoring,
            };
            let selection = scoring::score_and_select(ctx, &mut candidates, &recognizer).await?;
            let ranking_secs = t3.elapsed().as_secs_f64();
            let chosen = candidates.swap_remove(selection.index);

            Synthesis {
                tokens: chosen.tokens,
                audio: chosen.audio,
                selected_index: selection.index,
                candidate_count: pool_size,
                timings: StageTimings {
                    llm_sec: (t1 - t0).as_secs_f64(),
                    parse_sec: (t2 - t1).as_secs_f64(),
                    codec_sec: (t3 - t2).as_secs_f64(),
                    total_sec: t0.elapsed().as_secs_f64(),
                    best_of_n_sec: Some((ranking_secs - selection.asr_secs).max(0.0)),
                    asr_sec: Some(selection.asr_secs),
                },
            }
        };

        let audio_secs = synthesis.audio.duration_secs();
        let rtf = if audio_secs > 0.0 {
            synthesis.timings.total_sec / audio_secs
        } else {
            0.0
        };
        info!(
            total_sec = format_args!("{:.3}", synthesis.timings.total_sec),
            llm_sec = format_args!("{:.3}", synthesis.timings.llm_sec),
            parse_sec = format_args!("{:.3}", synthesis.timings.parse_sec),
            codec_sec = format_args!("{:.3}", synthesis.timings.codec_sec),
            best_of_n_sec = format_args!("{:.3}", synthesis.timings.best_of_n_sec.unwrap_or(0.0)),
            asr_sec = format_args!("{:.3}", synthesis.timings.asr_sec.unwrap_or(0.0)),
            rtf = format_args!("{rtf:.3}"),
            tokens = synthesis.tokens.len(),
            selected = synthesis.selected_index,
            pool = synthesis.candidate_count,
            "synthesis complete"
        );
        Ok(synthesis)
    }

    async fn synthesize_single(
        &self,
        tokens: Vec<u32>,
        reference: VoiceReference,
    ) -> Result<AudioClip> {
        let codec = self.codec.clone();
        tokio::task::spawn_blocking(move || {
            let mut codec = codec.0.lock();
            codec.synthesize(&tokens, &reference)
        })
        .await
        .map_err(|e| CantusError::Synthesis(format!("synthesis task failed: {e}")))?
    }

    async fn synthesize_pool(
        &self,
        token_lists: Vec<Vec<u32>>,
        reference: VoiceReference,
    ) -> Result<Vec<AudioClip>> {
        let codec = self.codec.clone();
        tokio::task::spawn_blocking(move || {
            let mut codec = codec.0.lock();
            codec.synthesize_batch(&token_lists, &reference)
        })
        .await
        .map_err(|e| CantusError::Synthesis(format!("synthesis task failed: {e}")))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_timings_serialize_camel_case() {
        let timings = StageTimings {
            llm_sec: 1.25,
            parse_sec: 0.001,
            codec_sec: 0.5,
            total_sec: 2.0,
            best_of_n_sec: Some(0.1),
            asr_sec: Some(0.15),
        };
        let json = serde_json::to_value(&timings).expect("serialize timings");
        assert_eq!(json["llmSec"], 1.25);
        assert_eq!(json["bestOfNSec"], 0.1);
        assert_eq!(json["asrSec"], 0.15);
        assert!(json.get("llm_sec").is_none());
    }
}
