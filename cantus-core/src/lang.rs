//! Language detection and resolution for scoring.
//!
//! Only what the scorer needs: a ja/en/auto split driven by character-class
//! ratios. Full text normalization lives with the orchestration layer, not
//! here.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Resolved scoring language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Japanese — character error rate, mora-based duration estimate.
    Ja,
    /// English — word error rate, letter-based duration estimate.
    En,
    /// Undetermined — recognizer auto-detects, scoring falls back to
    /// character counts.
    Auto,
}

impl Language {
    pub fn as_str(self) -> &'static str {
        match self {
            Language::Ja => "ja",
            Language::En => "en",
            Language::Auto => "auto",
        }
    }

    /// Parse a language tag; anything other than `ja`/`en` maps to `Auto`.
    pub fn from_tag(tag: &str) -> Self {
        match tag.to_ascii_lowercase().as_str() {
            "ja" => Language::Ja,
            "en" => Language::En,
            _ => Language::Auto,
        }
    }

    /// The hint passed through to the recognition collaborator: `Auto`
    /// resolves to no hint at all.
    pub fn hint(self) -> Option<Language> {
        match self {
            Language::Auto => None,
            explicit => Some(explicit),
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether `ch` falls in the Japanese script ranges considered by scoring:
/// hiragana, katakana, CJK unified ideographs (+ extension A, compatibility).
pub fn is_japanese_char(ch: char) -> bool {
    matches!(
        ch as u32,
        0x3040..=0x309F | 0x30A0..=0x30FF | 0x4E00..=0x9FFF | 0x3400..=0x4DBF | 0xF900..=0xFAFF
    )
}

/// Classify `text` by script ratios over its non-whitespace characters:
/// ≥ 20 % Japanese-range chars → `Ja`, else ≥ 50 % ASCII letters → `En`,
/// otherwise `Auto`. Empty text is `Auto`.
pub fn detect(text: &str) -> Language {
    let total = text.chars().filter(|ch| !ch.is_whitespace()).count();
    if total == 0 {
        return Language::Auto;
    }
    let ja_count = text.chars().filter(|&ch| is_japanese_char(ch)).count();
    let en_count = text.chars().filter(|ch| ch.is_ascii_alphabetic()).count();
    let ja_ratio = ja_count as f32 / total as f32;
    let en_ratio = en_count as f32 / total as f32;
    debug!(
        ja_ratio = format_args!("{ja_ratio:.3}"),
        en_ratio = format_args!("{en_ratio:.3}"),
        total,
        "language detect"
    );
    if ja_ratio >= 0.2 {
        Language::Ja
    } else if en_ratio >= 0.5 {
        Language::En
    } else {
        Language::Auto
    }
}

/// An explicit `ja`/`en` preference wins; `Auto` falls back to detection.
pub fn resolve(text: &str, preferred: Language) -> Language {
    match preferred {
        Language::Auto => detect(text),
        explicit => explicit,
    }
}
