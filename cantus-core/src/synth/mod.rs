//! Speech codec abstraction.
//!
//! The `SpeechCodec` trait decouples the engine from any specific decoder
//! backend (in-process neural codec, sidecar process, remote service, the
//! test stub). `&mut self` on the synthesis methods intentionally expresses
//! that decoders are stateful — streaming caches, device buffers, etc. All
//! mutation is serialised through `CodecHandle`'s `parking_lot::Mutex`.

pub mod stub;

use std::sync::Arc;

use parking_lot::Mutex;

use crate::audio::AudioClip;
use crate::error::Result;

pub use stub::StubCodec;

/// The voice identity a synthesis should imitate.
#[derive(Debug, Clone)]
pub enum VoiceReference {
    /// Raw reference waveform; the codec derives the speaker embedding.
    Waveform(AudioClip),
    /// Precomputed speaker embedding.
    Embedding(Vec<f32>),
}

/// Contract for token-to-audio codec backends.
pub trait SpeechCodec: Send + 'static {
    /// Output sample rate in Hz. Fixed for the lifetime of the codec.
    fn sample_rate(&self) -> u32;

    /// Decode one token sequence into a waveform.
    ///
    /// # Errors
    /// Returns an error if the decoder rejects the sequence or the backend
    /// is unavailable.
    fn synthesize(&mut self, tokens: &[u32], reference: &VoiceReference) -> Result<AudioClip>;

    /// Decode a batch of token sequences, one waveform per input, in order.
    ///
    /// The default loops [`SpeechCodec::synthesize`]; backends with real
    /// batch decoding should override it.
    fn synthesize_batch(
        &mut self,
        token_lists: &[Vec<u32>],
        reference: &VoiceReference,
    ) -> Result<Vec<AudioClip>> {
        token_lists
            .iter()
            .map(|tokens| self.synthesize(tokens, reference))
            .collect()
    }
}

/// Thread-safe reference-counted handle to any `SpeechCodec` implementor.
#[derive(Clone)]
pub struct CodecHandle(pub Arc<Mutex<dyn SpeechCodec>>);

impl CodecHandle {
    /// Wrap any `SpeechCodec` in a `CodecHandle`.
    pub fn new<C: SpeechCodec>(codec: C) -> Self {
        Self(Arc::new(Mutex::new(codec)))
    }

    /// The wrapped codec's output sample rate.
    pub fn sample_rate(&self) -> u32 {
        self.0.lock().sample_rate()
    }
}

impl std::fmt::Debug for CodecHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodecHandle").finish_non_exhaustive()
    }
}
