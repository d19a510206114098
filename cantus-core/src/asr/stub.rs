//! `FixedRecognizer` — placeholder backend that returns a fixed transcript.
//!
//! With every candidate transcribed identically, recognition error is a
//! constant across the pool and selection falls through to the heuristic
//! signals — useful for smoke runs without an ASR model on disk.

use tracing::debug;

use crate::asr::SpeechRecognizer;
use crate::audio::AudioClip;
use crate::error::Result;
use crate::lang::Language;

/// Fixed-transcript stub recognizer.
pub struct FixedRecognizer {
    text: String,
}

impl FixedRecognizer {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl Default for FixedRecognizer {
    fn default() -> Self {
        Self::new("")
    }
}

impl SpeechRecognizer for FixedRecognizer {
    fn transcribe_batch(
        &mut self,
        clips: &[AudioClip],
        language: Option<Language>,
    ) -> Result<Vec<String>> {
        debug!(
            clips = clips.len(),
            language = ?language,
            "FixedRecognizer::transcribe_batch"
        );
        Ok(vec![self.text.clone(); clips.len()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_one_transcript_per_clip() {
        let mut recognizer = FixedRecognizer::new("hello");
        let clips = vec![
            AudioClip::new(vec![0.0; 8], 16_000),
            AudioClip::new(vec![0.0; 8], 16_000),
        ];
        let texts = recognizer
            .transcribe_batch(&clips, Some(Language::En))
            .expect("transcribe");
        assert_eq!(texts, vec!["hello", "hello"]);
    }

    #[test]
    fn empty_batch_yields_empty_output() {
        let mut recognizer = FixedRecognizer::default();
        let texts = recognizer.transcribe_batch(&[], None).expect("transcribe");
        assert!(texts.is_empty());
    }
}
