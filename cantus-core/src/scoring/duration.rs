//! Duration-plausibility penalty.
//!
//! Expected speech duration is bounded by `phonemes × seconds-per-phoneme`
//! windows (per language) plus a pause bonus for punctuation. A candidate
//! whose token count implies a duration outside the window is penalised
//! relative to the violated bound — catching both truncated outputs and
//! runaway generation that the repetition signal misses.

use crate::lang::{self, Language};
use crate::scoring::phoneme::phoneme_count;
use crate::scoring::ScoringConfig;

/// Pause bonus per major sentence terminator (. ! ? and CJK forms).
const MAJOR_PAUSE_SECS: f32 = 0.40;
/// Pause bonus per minor separator (、，,;；:).
const MINOR_PAUSE_SECS: f32 = 0.20;
/// Pause bonus per ellipsis (… or ...).
const ELLIPSIS_PAUSE_SECS: f32 = 1.0;
/// Pause bonus per dash pause (— or --).
const DASH_PAUSE_SECS: f32 = 0.12;
/// Total pause bonus cap.
const MAX_PAUSE_BONUS_SECS: f32 = 10.0;

/// Penalty for a candidate of `token_count` tokens against the expected
/// duration window of `text`. Zero when the implied duration is plausible.
pub fn length_penalty(
    config: &ScoringConfig,
    text: &str,
    token_count: usize,
    language: Language,
) -> f32 {
    let duration_secs = token_count as f32 / config.token_rate_hz;
    let lang = match language {
        Language::Auto => lang::detect(text),
        explicit => explicit,
    };
    let phonemes = phoneme_count(text, lang).max(1) as f32;
    let (min_spp, max_spp) = config.spp_window(lang);
    let bonus = punctuation_bonus_secs(text);
    let min_expected = phonemes * min_spp + bonus;
    let max_expected = phonemes * max_spp + bonus;

    if duration_secs <= 0.0 || min_expected <= 0.0 {
        return 0.0;
    }
    if duration_secs < min_expected {
        (min_expected - duration_secs) / min_expected
    } else if duration_secs > max_expected {
        (duration_secs - max_expected) / max_expected
    } else {
        0.0
    }
}

/// Expected extra pause time implied by punctuation, capped at 10 s.
/// A trailing sentence terminator does not pause — it just ends the audio —
/// so one major mark is discounted when the text ends with one.
pub fn punctuation_bonus_secs(text: &str) -> f32 {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    let is_major = |ch: char| matches!(ch, '.' | '!' | '?' | '。' | '！' | '？');
    let is_minor = |ch: char| matches!(ch, '、' | '，' | ',' | ';' | '；' | ':');

    let mut major = trimmed.chars().filter(|&ch| is_major(ch)).count();
    let minor = trimmed.chars().filter(|&ch| is_minor(ch)).count();
    if trimmed.ends_with(is_major) {
        major = major.saturating_sub(1);
    }
    let ellipsis = trimmed.matches('…').count() + trimmed.matches("...").count();
    let dash = trimmed.matches('—').count() + trimmed.matches("--").count();

    let bonus = major as f32 * MAJOR_PAUSE_SECS
        + minor as f32 * MINOR_PAUSE_SECS
        + ellipsis as f32 * ELLIPSIS_PAUSE_SECS
        + dash as f32 * DASH_PAUSE_SECS;
    bonus.min(MAX_PAUSE_BONUS_SECS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn config() -> ScoringConfig {
        ScoringConfig::default()
    }

    #[test]
    fn plausible_duration_scores_zero() {
        // "hello world" ≈ 10 estimated phonemes → window ≈ [0.6, 1.2] s.
        // 18 tokens at 25 Hz = 0.72 s.
        assert_eq!(length_penalty(&config(), "hello world", 18, Language::En), 0.0);
    }

    #[test]
    fn truncated_audio_is_penalised_relative_to_the_minimum() {
        let text = "a much longer sentence that should take several seconds to speak aloud";
        // 5 tokens = 0.2 s, far below any plausible minimum.
        let penalty = length_penalty(&config(), text, 5, Language::En);
        assert!(penalty > 0.5, "penalty={penalty}");
        assert!(penalty < 1.0);
    }

    #[test]
    fn runaway_generation_is_penalised_above_the_maximum() {
        // "hi" ≈ 2 phonemes → max ≈ 0.24 s; 500 tokens = 20 s.
        let penalty = length_penalty(&config(), "hi", 500, Language::En);
        assert!(penalty > 10.0, "penalty={penalty}");
    }

    #[test]
    fn zero_tokens_score_zero() {
        assert_eq!(length_penalty(&config(), "hello", 0, Language::En), 0.0);
    }

    #[test]
    fn trailing_terminator_is_discounted() {
        assert_relative_eq!(punctuation_bonus_secs("Stop here."), 0.0);
        // An interior terminator still counts.
        assert_relative_eq!(punctuation_bonus_secs("Stop. Go."), MAJOR_PAUSE_SECS);
    }

    #[test]
    fn minor_marks_and_dashes_accumulate() {
        let bonus = punctuation_bonus_secs("one, two; three — four");
        assert_relative_eq!(bonus, 2.0 * MINOR_PAUSE_SECS + DASH_PAUSE_SECS, epsilon = 1e-6);
    }

    #[test]
    fn ellipsis_counts_in_both_spellings() {
        assert_relative_eq!(punctuation_bonus_secs("wait… then"), ELLIPSIS_PAUSE_SECS);
        // Dot-ellipsis chars also count as major marks, so "..." stacks the
        // ellipsis bonus on top of three major pauses.
        assert_relative_eq!(
            punctuation_bonus_secs("wait... then"),
            ELLIPSIS_PAUSE_SECS + 3.0 * MAJOR_PAUSE_SECS,
            epsilon = 1e-6
        );
    }

    #[test]
    fn bonus_caps_at_ten_seconds() {
        let spammy = "!?".repeat(100);
        let text = format!("{spammy} end");
        assert_relative_eq!(punctuation_bonus_secs(&text), MAX_PAUSE_BONUS_SECS);
    }

    #[test]
    fn empty_text_has_no_bonus() {
        assert_eq!(punctuation_bonus_secs(""), 0.0);
        assert_eq!(punctuation_bonus_secs("   "), 0.0);
    }
}
