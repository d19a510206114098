//! `StubCodec` — deterministic placeholder decoder without real synthesis.
//!
//! Renders each token as a short tone whose frequency is derived from the
//! token id (token 0 renders silence), so the full engine — including the
//! silence and duration scoring paths — can be exercised end-to-end without
//! model weights.

use std::f32::consts::TAU;

use tracing::debug;

use crate::audio::AudioClip;
use crate::error::Result;
use crate::synth::{SpeechCodec, VoiceReference};

/// Tone-per-token stub codec.
pub struct StubCodec {
    sample_rate: u32,
    /// Samples emitted per token; matches the engine's 25 Hz token rate.
    samples_per_token: usize,
}

impl StubCodec {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            samples_per_token: (sample_rate as usize) / 25,
        }
    }
}

impl Default for StubCodec {
    fn default() -> Self {
        Self::new(24_000)
    }
}

impl SpeechCodec for StubCodec {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn synthesize(&mut self, tokens: &[u32], _reference: &VoiceReference) -> Result<AudioClip> {
        let mut samples = Vec::with_capacity(tokens.len() * self.samples_per_token);
        for &token in tokens {
            if token == 0 {
                samples.extend(std::iter::repeat(0.0f32).take(self.samples_per_token));
                continue;
            }
            let freq = 110.0 + (token % 64) as f32 * 8.0;
            for i in 0..self.samples_per_token {
                let t = i as f32 / self.sample_rate as f32;
                samples.push(0.3 * (TAU * freq * t).sin());
            }
        }
        debug!(
            tokens = tokens.len(),
            samples = samples.len(),
            "StubCodec::synthesize"
        );
        Ok(AudioClip::new(samples, self.sample_rate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_follows_the_token_rate() {
        let mut codec = StubCodec::new(24_000);
        let reference = VoiceReference::Embedding(vec![]);
        let clip = codec.synthesize(&[1; 50], &reference).expect("synthesize");
        // 50 tokens at 25 Hz = 2 seconds
        assert!((clip.duration_secs() - 2.0).abs() < 1e-6);
        assert_eq!(clip.sample_rate, 24_000);
    }

    #[test]
    fn zero_tokens_render_silence() {
        let mut codec = StubCodec::new(16_000);
        let reference = VoiceReference::Embedding(vec![]);
        let clip = codec.synthesize(&[0, 0, 0], &reference).expect("synthesize");
        assert!(clip.samples.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn output_is_deterministic_per_token_sequence() {
        let reference = VoiceReference::Embedding(vec![]);
        let a = StubCodec::new(16_000)
            .synthesize(&[3, 5, 8], &reference)
            .expect("synthesize");
        let b = StubCodec::new(16_000)
            .synthesize(&[3, 5, 8], &reference)
            .expect("synthesize");
        assert_eq!(a.samples, b.samples);
    }
}
