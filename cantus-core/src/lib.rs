//! # cantus-core
//!
//! Best-of-n text-to-speech selection engine SDK.
//!
//! ## Architecture
//!
//! ```text
//! Prompt → LlmClient (N concurrent attempts, bounded retries)
//!              │ raw text × N
//!       parse_speech_tokens (unparseable candidates dropped)
//!              │ token sequences
//!       SpeechCodec::synthesize_batch (spawn_blocking)
//!              │ waveforms
//!       heuristic scoring (repetition / duration / silence)
//!              │
//!       SpeechRecognizer::transcribe_batch (one batched call per request)
//!              │ per-candidate error vs. reference text
//!       selector — minimum combined score wins, ties to lowest index
//! ```
//!
//! The codec and recognizer are pluggable collaborators behind traits; the
//! engine never blocks the async executor on their inference calls.

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod asr;
pub mod audio;
pub mod engine;
pub mod error;
pub mod lang;
pub mod llm;
pub mod scoring;
pub mod synth;
pub mod tokens;

// Convenience re-exports for downstream crates
pub use asr::{RecognizerHandle, SpeechRecognizer};
pub use audio::AudioClip;
pub use engine::{BestOfNEngine, EngineConfig, StageTimings, Synthesis, SynthesisRequest};
pub use error::CantusError;
pub use lang::Language;
pub use llm::{ChatMessage, ChatParams, LlmClient, LlmConfig};
pub use scoring::{Candidate, ScoreWeights, ScoringConfig};
pub use synth::{CodecHandle, SpeechCodec, VoiceReference};
