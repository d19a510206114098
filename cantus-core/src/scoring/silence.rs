//! Silence penalty — frame-level energy statistics over the waveform.
//!
//! Two independent failure signals: too much total silence (the codec
//! rendered dead air) and one long contiguous gap (the model emitted a
//! pathological pause). Both accumulate into one penalty.

use crate::audio::AudioClip;
use crate::scoring::ScoringConfig;

/// Frame width for silence classification.
const FRAME_SECS: f32 = 0.02;

/// `max(0, (ratio − r₀)/(1 − r₀)) + max(0, (longest − t₀)/t₀)` with the
/// thresholds from `config`. Zero-length audio scores the maximal ratio
/// term (1.0) by convention.
pub fn silence_penalty(config: &ScoringConfig, clip: &AudioClip) -> f32 {
    let (ratio, longest_secs) = silence_stats(clip, config.silence_amplitude_threshold);
    let mut penalty = 0.0;
    if ratio > config.silence_ratio_threshold {
        penalty += (ratio - config.silence_ratio_threshold)
            / (1.0 - config.silence_ratio_threshold).max(1e-6);
    }
    if longest_secs > config.silence_long_threshold_secs {
        penalty += (longest_secs - config.silence_long_threshold_secs)
            / config.silence_long_threshold_secs.max(1e-6);
    }
    penalty
}

/// (silent-frame ratio, longest contiguous silent run in seconds) over
/// 20 ms frames; a frame is silent when its mean |amplitude| is below
/// `amplitude_threshold`.
///
/// Empty audio → (1.0, 0.0). Audio shorter than one frame is classified by
/// its whole-clip mean, and its full length counts as the longest run.
pub fn silence_stats(clip: &AudioClip, amplitude_threshold: f32) -> (f32, f32) {
    if clip.samples.is_empty() {
        return (1.0, 0.0);
    }
    let frame_size = ((clip.sample_rate as f32 * FRAME_SECS) as usize).max(1);
    let frames = clip.samples.len() / frame_size;
    if frames == 0 {
        let ratio = if mean_abs(&clip.samples) < amplitude_threshold {
            1.0
        } else {
            0.0
        };
        return (ratio, clip.samples.len() as f32 / clip.sample_rate as f32);
    }

    let mut silent_frames = 0usize;
    let mut longest_run = 0usize;
    let mut current_run = 0usize;
    for frame in clip.samples.chunks_exact(frame_size) {
        if mean_abs(frame) < amplitude_threshold {
            silent_frames += 1;
            current_run += 1;
            longest_run = longest_run.max(current_run);
        } else {
            current_run = 0;
        }
    }
    let ratio = silent_frames as f32 / frames as f32;
    let longest_secs = (longest_run * frame_size) as f32 / clip.sample_rate as f32;
    (ratio, longest_secs)
}

fn mean_abs(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().map(|s| s.abs()).sum::<f32>() / samples.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn config() -> ScoringConfig {
        ScoringConfig::default()
    }

    fn loud_clip(secs: f32, sample_rate: u32) -> AudioClip {
        let len = (secs * sample_rate as f32) as usize;
        AudioClip::new(vec![0.3; len], sample_rate)
    }

    fn silent_clip(secs: f32, sample_rate: u32) -> AudioClip {
        let len = (secs * sample_rate as f32) as usize;
        AudioClip::new(vec![0.0; len], sample_rate)
    }

    #[test]
    fn all_zero_waveform_over_two_seconds_beats_loud_audio() {
        let silent = silence_penalty(&config(), &silent_clip(3.0, 16_000));
        let loud = silence_penalty(&config(), &loud_clip(3.0, 16_000));
        assert!(silent > loud, "silent={silent} loud={loud}");
        // ratio term = (1.0 - 0.2)/0.8 = 1.0; run term = (3.0 - 2.0)/2.0 = 0.5
        assert_relative_eq!(silent, 1.5, epsilon = 1e-3);
        assert_eq!(loud, 0.0);
    }

    #[test]
    fn empty_audio_scores_maximal_ratio_penalty() {
        let clip = AudioClip::new(vec![], 16_000);
        assert_relative_eq!(silence_penalty(&config(), &clip), 1.0);
    }

    #[test]
    fn moderate_silence_below_thresholds_is_free() {
        // 10% silent frames, longest run well under 2 s.
        let sample_rate = 16_000u32;
        let frame = (sample_rate as f32 * FRAME_SECS) as usize;
        let mut samples = vec![0.3f32; frame * 90];
        samples.extend(vec![0.0f32; frame * 10]);
        // keep the silent tail as the last frames
        let clip = AudioClip::new(samples, sample_rate);
        assert_eq!(silence_penalty(&config(), &clip), 0.0);
    }

    #[test]
    fn stats_report_longest_contiguous_run_not_total() {
        let sample_rate = 16_000u32;
        let frame = (sample_rate as f32 * FRAME_SECS) as usize;
        let mut samples = Vec::new();
        samples.extend(vec![0.0f32; frame * 5]); // run of 5
        samples.extend(vec![0.3f32; frame * 2]);
        samples.extend(vec![0.0f32; frame * 3]); // run of 3
        let clip = AudioClip::new(samples, sample_rate);
        let (ratio, longest) = silence_stats(&clip, 1e-4);
        assert_relative_eq!(ratio, 0.8, epsilon = 1e-6);
        assert_relative_eq!(longest, 5.0 * FRAME_SECS, epsilon = 1e-6);
    }

    #[test]
    fn sub_frame_clip_is_classified_by_its_mean() {
        let quiet = AudioClip::new(vec![0.0; 10], 16_000);
        let (ratio, _) = silence_stats(&quiet, 1e-4);
        assert_eq!(ratio, 1.0);

        let loud = AudioClip::new(vec![0.5; 10], 16_000);
        let (ratio, _) = silence_stats(&loud, 1e-4);
        assert_eq!(ratio, 0.0);
    }
}
