//! Rule-based phoneme-count estimators.
//!
//! Phoneme counts only feed the duration-plausibility window, which is wide
//! (distinct min/max seconds-per-phoneme bounds per language), so a cheap
//! estimate is sufficient — no dictionary lookup, no G2P model.
//!
//! - English: consonant letters + vowel groups per word, with a silent-e
//!   adjustment. "hello" → h,l,l + e,o = 5 (actual: 4).
//! - Japanese: kana ≈ 2 phones (consonant + vowel), small kana and the
//!   long-vowel mark ≈ 1, kanji ≈ 3 (≈ 1.5 mora).
//! - Fallback: character count, minimum 1.

use crate::lang::{is_japanese_char, Language};

/// Estimate the phoneme count of `text` for the given language.
/// Always ≥ 1 so duration windows never collapse to zero.
pub fn phoneme_count(text: &str, language: Language) -> usize {
    match language {
        Language::En => phoneme_count_en(text),
        Language::Ja => phoneme_count_ja(text),
        Language::Auto => text.chars().count().max(1),
    }
}

fn phoneme_count_en(text: &str) -> usize {
    text.split(|ch: char| !ch.is_ascii_alphabetic())
        .filter(|word| !word.is_empty())
        .map(word_phonemes)
        .sum::<usize>()
        .max(1)
}

fn word_phonemes(word: &str) -> usize {
    let lower = word.to_ascii_lowercase();
    let mut vowel_groups = 0usize;
    let mut consonants = 0usize;
    let mut prev_vowel = false;
    for ch in lower.chars() {
        let vowel = matches!(ch, 'a' | 'e' | 'i' | 'o' | 'u' | 'y');
        if vowel {
            if !prev_vowel {
                vowel_groups += 1;
            }
        } else {
            consonants += 1;
        }
        prev_vowel = vowel;
    }
    let mut phones = consonants + vowel_groups;
    if lower.ends_with('e') && vowel_groups > 1 {
        phones -= 1;
    }
    phones.max(1)
}

fn phoneme_count_ja(text: &str) -> usize {
    let mut count = 0usize;
    for ch in text.chars() {
        if is_small_kana(ch) || ch == 'ー' {
            count += 1;
        } else if is_kana(ch) {
            count += 2;
        } else if is_japanese_char(ch) {
            count += 3;
        } else if ch.is_alphanumeric() {
            count += 1;
        }
    }
    count.max(1)
}

fn is_kana(ch: char) -> bool {
    matches!(ch as u32, 0x3040..=0x309F | 0x30A0..=0x30FF)
}

fn is_small_kana(ch: char) -> bool {
    matches!(
        ch,
        'ゃ' | 'ゅ' | 'ょ' | 'ぁ' | 'ぃ' | 'ぅ' | 'ぇ' | 'ぉ' | 'っ'
            | 'ャ' | 'ュ' | 'ョ' | 'ァ' | 'ィ' | 'ゥ' | 'ェ' | 'ォ' | 'ッ'
    )
}
