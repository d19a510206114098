//! Repetition penalty — n-gram diversity collapse over the token sequence.
//!
//! Looping is the dominant failure mode of speech-token generation: the
//! model gets stuck emitting the same short cycle of codec ids. Any cycle
//! length up to 4 shows up as a low unique/total ratio for one of the
//! n-gram sizes, so the penalty takes the maximum across sizes.

use std::collections::HashSet;

/// `max` over n ∈ {2, 3, 4} of `1 − unique n-grams / total n-grams`.
///
/// Sequences shorter than n contribute 0 for that n; a strictly
/// non-repeating sequence scores 0.
pub fn repeat_penalty(tokens: &[u32]) -> f32 {
    [2usize, 3, 4]
        .into_iter()
        .map(|n| ngram_repeat_ratio(tokens, n))
        .fold(0.0f32, f32::max)
}

fn ngram_repeat_ratio(tokens: &[u32], n: usize) -> f32 {
    if tokens.len() < n {
        return 0.0;
    }
    let total = tokens.len() - n + 1;
    let unique: HashSet<&[u32]> = tokens.windows(n).collect();
    1.0 - unique.len() as f32 / total as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn non_repeating_sequence_scores_zero() {
        assert_eq!(repeat_penalty(&[1, 2, 3, 4, 5, 6, 7, 8]), 0.0);
    }

    #[test]
    fn constant_sequence_scores_higher_than_distinct() {
        let looping = repeat_penalty(&[1, 1, 1, 1, 1, 1]);
        let distinct = repeat_penalty(&[1, 2, 3, 4, 5, 6]);
        assert!(looping > distinct);
        // [1,1,1,1,1,1]: 5 bigrams, 1 unique → 0.8 is the max ratio
        assert_relative_eq!(looping, 0.8, epsilon = 1e-6);
        assert_eq!(distinct, 0.0);
    }

    #[test]
    fn short_cycle_is_caught_by_a_larger_ngram() {
        // Alternating pair: every bigram distinct from its neighbor but only
        // two unique bigrams exist.
        let penalty = repeat_penalty(&[5, 9, 5, 9, 5, 9, 5, 9]);
        assert!(penalty > 0.5, "penalty={penalty}");
    }

    #[test]
    fn sequences_shorter_than_ngram_contribute_zero() {
        assert_eq!(repeat_penalty(&[]), 0.0);
        assert_eq!(repeat_penalty(&[7]), 0.0);
        // Two tokens: only the bigram ratio applies, and it is unique.
        assert_eq!(repeat_penalty(&[7, 8]), 0.0);
    }

    #[test]
    fn penalty_approaches_one_as_diversity_collapses() {
        let tokens = vec![3u32; 200];
        let penalty = repeat_penalty(&tokens);
        assert!(penalty > 0.99, "penalty={penalty}");
        assert!(penalty < 1.0);
    }
}
