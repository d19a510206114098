//! Speech recognition abstraction.
//!
//! The `SpeechRecognizer` trait is the scoring engine's view of whatever
//! transcription backend a deployment wires in. Recognition inference is
//! CPU/GPU-bound, so the engine always calls it through
//! [`transcribe_pool`], which offloads the single batched call to a
//! blocking worker thread and times it.

pub mod stub;

use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;

use crate::audio::AudioClip;
use crate::error::{CantusError, Result};
use crate::lang::Language;

pub use stub::FixedRecognizer;

/// Contract for speech recognition backends.
pub trait SpeechRecognizer: Send + 'static {
    /// Transcribe a batch of clips, one string per clip, preserving input
    /// order. The language hint is advisory; `None` requests the backend's
    /// auto-detection.
    ///
    /// # Errors
    /// Returns an error if the backend is not loaded or inference fails.
    fn transcribe_batch(
        &mut self,
        clips: &[AudioClip],
        language: Option<Language>,
    ) -> Result<Vec<String>>;
}

/// Thread-safe reference-counted handle to any `SpeechRecognizer`
/// implementor.
#[derive(Clone)]
pub struct RecognizerHandle(pub Arc<Mutex<dyn SpeechRecognizer>>);

impl RecognizerHandle {
    /// Wrap any `SpeechRecognizer` in a `RecognizerHandle`.
    pub fn new<R: SpeechRecognizer>(recognizer: R) -> Self {
        Self(Arc::new(Mutex::new(recognizer)))
    }
}

impl std::fmt::Debug for RecognizerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecognizerHandle").finish_non_exhaustive()
    }
}

/// Transcribe an entire candidate pool in one batched call on a blocking
/// worker thread. Returns the elapsed wall-clock seconds and one
/// transcription per clip.
///
/// # Errors
/// Recognition failures propagate; a backend returning the wrong number of
/// transcriptions is treated as a recognition error.
pub async fn transcribe_pool(
    handle: &RecognizerHandle,
    clips: Vec<AudioClip>,
    language: Option<Language>,
) -> Result<(f64, Vec<String>)> {
    let expected = clips.len();
    let handle = handle.clone();
    let start = Instant::now();
    let texts = tokio::task::spawn_blocking(move || {
        let mut recognizer = handle.0.lock();
        recognizer.transcribe_batch(&clips, language)
    })
    .await
    .map_err(|e| CantusError::Recognition(format!("recognition task failed: {e}")))??;
    let elapsed = start.elapsed().as_secs_f64();

    if texts.len() != expected {
        return Err(CantusError::Recognition(format!(
            "recognizer returned {} transcriptions for {} clips",
            texts.len(),
            expected
        )));
    }
    Ok((elapsed, texts))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoLengths;

    impl SpeechRecognizer for EchoLengths {
        fn transcribe_batch(
            &mut self,
            clips: &[AudioClip],
            _language: Option<Language>,
        ) -> Result<Vec<String>> {
            Ok(clips.iter().map(|c| c.samples.len().to_string()).collect())
        }
    }

    struct ShortBatchRecognizer;

    impl SpeechRecognizer for ShortBatchRecognizer {
        fn transcribe_batch(
            &mut self,
            _clips: &[AudioClip],
            _language: Option<Language>,
        ) -> Result<Vec<String>> {
            Ok(vec!["only one".into()])
        }
    }

    #[tokio::test]
    async fn pool_transcription_preserves_order() {
        let handle = RecognizerHandle::new(EchoLengths);
        let clips = vec![
            AudioClip::new(vec![0.0; 10], 16_000),
            AudioClip::new(vec![0.0; 20], 16_000),
            AudioClip::new(vec![0.0; 30], 16_000),
        ];
        let (elapsed, texts) = transcribe_pool(&handle, clips, Some(Language::En))
            .await
            .expect("transcribe");
        assert_eq!(texts, vec!["10", "20", "30"]);
        assert!(elapsed >= 0.0);
    }

    #[tokio::test]
    async fn mismatched_batch_size_is_a_recognition_error() {
        let handle = RecognizerHandle::new(ShortBatchRecognizer);
        let clips = vec![
            AudioClip::new(vec![0.0; 10], 16_000),
            AudioClip::new(vec![0.0; 20], 16_000),
        ];
        let err = transcribe_pool(&handle, clips, None).await.unwrap_err();
        assert!(matches!(err, CantusError::Recognition(_)));
    }
}
