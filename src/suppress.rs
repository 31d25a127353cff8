//! This module contains the rules that ban fixed token lists and length-dependent
//! tokens.

use crate::rule::{ApplyRuleError, RuleLike};
use crate::score::ScoreBuffer;

/// A rule that sets a fixed list of tokens to negative infinity at every step.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SuppressTokens {
    token_ids: Vec<u32>,
}

impl SuppressTokens {
    /// Creates a new [`SuppressTokens`] banning `token_ids` unconditionally.
    pub fn new(token_ids: Vec<u32>) -> Self {
        Self { token_ids }
    }
}

impl RuleLike for SuppressTokens {
    fn apply(&self, _history: &[u32], scores: &mut ScoreBuffer) -> Result<(), ApplyRuleError> {
        for &token_id in &self.token_ids {
            if token_id as usize >= scores.vocab_size() {
                return Err(ApplyRuleError::ShapeMismatch);
            }
            scores.suppress(token_id);
        }
        Ok(())
    }
}

/// A rule that sets a fixed list of tokens to negative infinity only while the
/// history length equals a configured begin index, i.e. at the first free step
/// after the prompt.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BeginSuppressTokens {
    token_ids: Vec<u32>,
    begin_index: usize,
}

impl BeginSuppressTokens {
    /// Creates a new [`BeginSuppressTokens`] banning `token_ids` when the history
    /// holds exactly `begin_index` tokens.
    pub fn new(token_ids: Vec<u32>, begin_index: usize) -> Self {
        Self {
            token_ids,
            begin_index,
        }
    }
}

impl RuleLike for BeginSuppressTokens {
    fn apply(&self, history: &[u32], scores: &mut ScoreBuffer) -> Result<(), ApplyRuleError> {
        if history.len() != self.begin_index {
            return Ok(());
        }
        for &token_id in &self.token_ids {
            if token_id as usize >= scores.vocab_size() {
                return Err(ApplyRuleError::ShapeMismatch);
            }
            scores.suppress(token_id);
        }
        Ok(())
    }
}

/// A rule that keeps the end-of-sequence token out of reach while the history is
/// shorter than a minimum length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MinLength {
    min_length: usize,
    eos_token_id: u32,
}

impl MinLength {
    /// Creates a new [`MinLength`] suppressing `eos_token_id` below `min_length`.
    pub fn new(min_length: usize, eos_token_id: u32) -> Self {
        Self {
            min_length,
            eos_token_id,
        }
    }
}

impl RuleLike for MinLength {
    fn apply(&self, history: &[u32], scores: &mut ScoreBuffer) -> Result<(), ApplyRuleError> {
        if history.len() < self.min_length {
            if self.eos_token_id as usize >= scores.vocab_size() {
                return Err(ApplyRuleError::ShapeMismatch);
            }
            scores.suppress(self.eos_token_id);
        }
        Ok(())
    }
}

/// A rule that bans configured word sequences.
///
/// A single-token word is banned unconditionally. For a multi-token word, only its
/// final token is banned and only when the history ends with the word's preceding
/// tokens, so the word can never be completed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NoBadWords {
    bad_words_ids: Vec<Vec<u32>>,
}

impl NoBadWords {
    /// Creates a new [`NoBadWords`] from the given word sequences. Empty sequences
    /// are dropped with a warning.
    pub fn new(bad_words_ids: Vec<Vec<u32>>) -> Self {
        let bad_words_ids: Vec<Vec<u32>> = bad_words_ids
            .into_iter()
            .filter(|word| {
                if word.is_empty() {
                    log::warn!(
                        "An empty bad word sequence was supplied and will be ignored. \
                        Check the code that tokenizes the bad word list."
                    );
                    false
                } else {
                    true
                }
            })
            .collect();
        Self { bad_words_ids }
    }
}

impl RuleLike for NoBadWords {
    fn apply(&self, history: &[u32], scores: &mut ScoreBuffer) -> Result<(), ApplyRuleError> {
        for word in &self.bad_words_ids {
            // words are nonempty by construction
            let (prefix, last) = word.split_at(word.len() - 1);
            let banned = last[0];
            if banned as usize >= scores.vocab_size() {
                return Err(ApplyRuleError::ShapeMismatch);
            }
            if prefix.is_empty() {
                scores.suppress(banned);
                continue;
            }
            if history.len() < prefix.len() {
                continue;
            }
            if &history[history.len() - prefix.len()..] == prefix {
                scores.suppress(banned);
            }
        }
        Ok(())
    }
}
