//! Speech-token marker parsing.
//!
//! The language model emits codec token ids wrapped in `<|s_N|>` markers,
//! interleaved with whatever prose it decides to add. Parsing extracts the
//! ids in order of appearance; rendering is the exact inverse.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{CantusError, Result};

fn token_pattern() -> &'static Regex {
    static TOKEN_PATTERN: OnceLock<Regex> = OnceLock::new();
    TOKEN_PATTERN.get_or_init(|| {
        Regex::new(r"<\|s_(\d+)\|>").expect("token marker pattern is a valid regex")
    })
}

/// Extract all `<|s_N|>` token ids from `text`, preserving order of
/// appearance (duplicates kept).
///
/// # Errors
/// `CantusError::NoSpeechTokens` when the text contains no markers — an
/// empty sequence is never returned successfully.
pub fn parse_speech_tokens(text: &str) -> Result<Vec<u32>> {
    let tokens: Vec<u32> = token_pattern()
        .captures_iter(text)
        .filter_map(|cap| cap[1].parse::<u32>().ok())
        .collect();
    if tokens.is_empty() {
        return Err(CantusError::NoSpeechTokens);
    }
    Ok(tokens)
}

/// Render `tokens` as marker text containing exactly those markers in order.
///
/// Inverse of [`parse_speech_tokens`] for any token sequence.
pub fn tokens_to_markup(tokens: &[u32]) -> String {
    tokens
        .iter()
        .map(|token| format!("<|s_{token}|>"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_any_sequence() {
        let cases: &[&[u32]] = &[
            &[0],
            &[1, 2, 3],
            &[42, 42, 42],
            &[0, 999_999, 7, 7, 123],
        ];
        for tokens in cases {
            let text = tokens_to_markup(tokens);
            let parsed = parse_speech_tokens(&text).expect("round trip");
            assert_eq!(&parsed, tokens);
        }
    }

    #[test]
    fn extracts_markers_embedded_in_prose() {
        let text = "Sure! Here you go: <|s_10|><|s_20|> and some more <|s_10|>.";
        let parsed = parse_speech_tokens(text).expect("parse");
        assert_eq!(parsed, vec![10, 20, 10]);
    }

    #[test]
    fn no_markers_is_an_error_never_an_empty_vec() {
        let err = parse_speech_tokens("no tokens here").unwrap_err();
        assert!(matches!(err, CantusError::NoSpeechTokens));
        let err = parse_speech_tokens("").unwrap_err();
        assert!(matches!(err, CantusError::NoSpeechTokens));
    }

    #[test]
    fn malformed_markers_are_ignored() {
        assert!(parse_speech_tokens("<|s_|> <|s_x|> <|t_5|>").is_err());
        let parsed = parse_speech_tokens("<|s_|><|s_5|>").expect("parse");
        assert_eq!(parsed, vec![5]);
    }
}
