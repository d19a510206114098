//! Typed audio clip passed between the codec, scoring, and recognition stages.

use crate::error::Result;

/// A contiguous block of mono PCM samples at a known sample rate.
///
/// Owned exclusively by its candidate once synthesized — clips are never
/// shared between candidates or across requests.
#[derive(Debug, Clone, Default)]
pub struct AudioClip {
    /// Mono f32 samples in [-1.0, 1.0].
    pub samples: Vec<f32>,
    /// Sample rate in Hz (e.g. 16000, 24000, 48000).
    pub sample_rate: u32,
}

impl AudioClip {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Returns the duration of this clip in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Returns true if the clip contains no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Encode a clip as a 16-bit PCM mono WAV byte buffer.
///
/// Samples outside [-1.0, 1.0] are clamped before quantization.
pub fn write_wav_bytes(clip: &AudioClip) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: clip.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)
            .map_err(|e| anyhow::anyhow!("wav encode failed: {e}"))?;
        for sample in &clip.samples {
            let quantized = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            writer
                .write_sample(quantized)
                .map_err(|e| anyhow::anyhow!("wav encode failed: {e}"))?;
        }
        writer
            .finalize()
            .map_err(|e| anyhow::anyhow!("wav encode failed: {e}"))?;
    }
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_reflects_sample_count_and_rate() {
        let clip = AudioClip::new(vec![0.0; 16_000], 16_000);
        assert!((clip.duration_secs() - 1.0).abs() < 1e-9);
        assert!(!clip.is_empty());
    }

    #[test]
    fn empty_clip_has_zero_duration() {
        let clip = AudioClip::new(vec![], 24_000);
        assert_eq!(clip.duration_secs(), 0.0);
        assert!(clip.is_empty());
    }

    #[test]
    fn wav_bytes_carry_riff_header_and_pcm_payload() {
        let clip = AudioClip::new(vec![0.0, 0.5, -0.5, 1.0], 16_000);
        let bytes = write_wav_bytes(&clip).expect("encode wav");
        assert_eq!(&bytes[..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WAVE");
        // 44-byte canonical header + 2 bytes per sample
        assert_eq!(bytes.len(), 44 + clip.samples.len() * 2);
    }

    #[test]
    fn wav_encode_clamps_out_of_range_samples() {
        let clip = AudioClip::new(vec![2.0, -2.0], 16_000);
        let bytes = write_wav_bytes(&clip).expect("encode wav");
        let first = i16::from_le_bytes([bytes[44], bytes[45]]);
        let second = i16::from_le_bytes([bytes[46], bytes[47]]);
        assert_eq!(first, i16::MAX);
        assert_eq!(second, -i16::MAX);
    }
}
