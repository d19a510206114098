//! Transcription-error distance between a reference text and a recognition
//! hypothesis.
//!
//! English uses word error rate over an apostrophe-preserving word
//! normalization; everything else (including Japanese) uses character error
//! rate over a punctuation-stripped character normalization. Both divide a
//! unit-cost Levenshtein distance by the reference length.

use crate::lang::{is_japanese_char, Language};

/// A reference text normalized once per request, reused against every
/// candidate hypothesis.
#[derive(Debug, Clone)]
pub enum NormalizedReference {
    Words(Vec<String>),
    Chars(Vec<char>),
}

/// Normalize `text` according to the metric `language` selects.
pub fn normalize_reference(text: &str, language: Language) -> NormalizedReference {
    match language {
        Language::En => NormalizedReference::Words(normalize_words(text)),
        _ => NormalizedReference::Chars(normalize_chars(text)),
    }
}

/// Error distance of `hypothesis` against a normalized reference: WER for a
/// word reference, CER for a character reference. Empty reference → 1.0 if
/// the hypothesis is non-empty, else 0.0.
pub fn error_against(reference: &NormalizedReference, hypothesis: &str) -> f32 {
    match reference {
        NormalizedReference::Words(ref_words) => {
            let hyp_words = normalize_words(hypothesis);
            rate(ref_words, &hyp_words)
        }
        NormalizedReference::Chars(ref_chars) => {
            let hyp_chars = normalize_chars(hypothesis);
            rate(ref_chars, &hyp_chars)
        }
    }
}

/// One-shot convenience over [`normalize_reference`] + [`error_against`].
pub fn transcription_error(reference: &str, hypothesis: &str, language: Language) -> f32 {
    error_against(&normalize_reference(reference, language), hypothesis)
}

/// Lower-case, collapse all non `[a-z0-9']` runs to separators, split.
pub fn normalize_words(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let mut words = Vec::new();
    let mut current = String::new();
    for ch in lowered.chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '\'' {
            current.push(ch);
        } else if !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// Lower-case, keep only alphanumeric and Japanese-range characters.
pub fn normalize_chars(text: &str) -> Vec<char> {
    text.to_lowercase()
        .chars()
        .filter(|&ch| ch.is_alphanumeric() || is_japanese_char(ch))
        .collect()
}

fn rate<T: PartialEq>(reference: &[T], hypothesis: &[T]) -> f32 {
    if reference.is_empty() {
        return if hypothesis.is_empty() { 0.0 } else { 1.0 };
    }
    levenshtein(reference, hypothesis) as f32 / reference.len().max(1) as f32
}

/// Unit-cost edit distance (insert / delete / substitute) with auxiliary
/// space proportional to the shorter sequence.
pub fn levenshtein<T: PartialEq>(a: &[T], b: &[T]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }
    let (outer, inner) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    let mut row: Vec<usize> = (0..=inner.len()).collect();
    for (i, x) in outer.iter().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        for (j, y) in inner.iter().enumerate() {
            let up = row[j + 1];
            let cost = usize::from(x != y);
            row[j + 1] = (up + 1).min(row[j] + 1).min(diagonal + cost);
            diagonal = up;
        }
    }
    row[inner.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn levenshtein_base_cases() {
        assert_eq!(levenshtein::<char>(&[], &[]), 0);
        assert_eq!(levenshtein(&chars("abc"), &[]), 3);
        assert_eq!(levenshtein(&[], &chars("ab")), 2);
    }

    #[test]
    fn kitten_to_sitting_is_three_edits() {
        assert_eq!(levenshtein(&chars("kitten"), &chars("sitting")), 3);
    }

    #[test]
    fn distance_is_symmetric() {
        let pairs = [("kitten", "sitting"), ("abc", "xbz"), ("", "abc"), ("flaw", "lawn")];
        for (a, b) in pairs {
            assert_eq!(
                levenshtein(&chars(a), &chars(b)),
                levenshtein(&chars(b), &chars(a)),
                "a={a} b={b}"
            );
        }
    }

    #[test]
    fn distance_satisfies_the_triangle_inequality() {
        let words = ["kitten", "sitting", "mitten", "", "kit", "sit"];
        for a in words {
            for b in words {
                for c in words {
                    let ab = levenshtein(&chars(a), &chars(b));
                    let bc = levenshtein(&chars(b), &chars(c));
                    let ac = levenshtein(&chars(a), &chars(c));
                    assert!(ac <= ab + bc, "a={a} b={b} c={c}");
                }
            }
        }
    }

    #[test]
    fn wer_matches_the_contract_examples() {
        assert_eq!(
            transcription_error("the cat sat", "the cat sat", Language::En),
            0.0
        );
        assert_relative_eq!(
            transcription_error("the cat sat", "the dog sat", Language::En),
            1.0 / 3.0,
            epsilon = 1e-6
        );
    }

    #[test]
    fn word_normalization_strips_punctuation_and_keeps_apostrophes() {
        assert_eq!(
            normalize_words("It's   GREAT -- really!"),
            vec!["it's", "great", "really"]
        );
        assert!(normalize_words("—…—").is_empty());
    }

    #[test]
    fn char_normalization_drops_punctuation_and_spacing() {
        assert_eq!(normalize_chars("こんにちは、世界。"), chars("こんにちは世界"));
        assert_eq!(normalize_chars("A b-c!"), chars("abc"));
    }

    #[test]
    fn cer_counts_character_edits() {
        // One substitution over five reference chars.
        assert_relative_eq!(
            transcription_error("こんにちは", "こんばちは", Language::Ja),
            0.2,
            epsilon = 1e-6
        );
    }

    #[test]
    fn empty_reference_is_one_when_hypothesis_speaks() {
        assert_eq!(transcription_error("", "anything", Language::En), 1.0);
        assert_eq!(transcription_error("", "", Language::En), 0.0);
        assert_eq!(transcription_error("…", "何か", Language::Ja), 1.0);
    }

    #[test]
    fn error_can_exceed_one_for_verbose_hypotheses() {
        let error = transcription_error("hi", "one two three four five six", Language::En);
        assert!(error > 1.0, "error={error}");
    }
}
