//! This module contains the rules that discourage or forbid repetition of already
//! generated tokens.

use ahash::{AHashMap, AHashSet};

use crate::rule::{ApplyRuleError, CreateRuleError, RuleLike};
use crate::score::ScoreBuffer;

/// A rule that penalizes every token that already occurs in the history.
///
/// A negative score is multiplied by the penalty and a non-negative score is
/// divided by it, so a penalty above `1.0` makes every seen token less likely
/// while a penalty below `1.0` makes it more likely. Each distinct token is
/// transformed exactly once per step no matter how often it occurs in the history.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RepetitionPenalty {
    penalty: f32,
}

impl RepetitionPenalty {
    /// Creates a new [`RepetitionPenalty`] with the given penalty.
    ///
    /// # Errors
    ///
    /// Returns [`CreateRuleError::InvalidPenalty`] when the penalty is not a
    /// strictly positive finite number.
    pub fn new(penalty: f32) -> Result<Self, CreateRuleError> {
        if !(penalty.is_finite() && penalty > 0.0) {
            return Err(CreateRuleError::InvalidPenalty(penalty));
        }
        Ok(Self { penalty })
    }
}

impl RuleLike for RepetitionPenalty {
    fn apply(&self, history: &[u32], scores: &mut ScoreBuffer) -> Result<(), ApplyRuleError> {
        let mut seen: AHashSet<u32> = AHashSet::default();
        for &token_id in history {
            if !seen.insert(token_id) {
                continue;
            }
            let index = token_id as usize;
            if index >= scores.vocab_size() {
                return Err(ApplyRuleError::ShapeMismatch);
            }
            let slice = scores.as_mut_slice();
            let score = slice[index];
            slice[index] = if score < 0.0 {
                score * self.penalty
            } else {
                score / self.penalty
            };
        }
        Ok(())
    }
}

/// A rule that bans any token that would complete an n-gram already present in the
/// history.
///
/// Every n-length contiguous window of the history is grouped by its first `n - 1`
/// elements; the tokens that historically followed the current `n - 1`-element
/// suffix of the history are suppressed. Prefix equality is exact sequence
/// equality. With fewer than `n - 1` tokens of history nothing is banned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NoRepeatNGram {
    n: usize,
}

impl NoRepeatNGram {
    /// Creates a new [`NoRepeatNGram`] banning repetitions of `n`-grams.
    ///
    /// # Errors
    ///
    /// Returns [`CreateRuleError::InvalidNGramOrder`] when `n` is zero.
    pub fn new(n: usize) -> Result<Self, CreateRuleError> {
        if n < 1 {
            return Err(CreateRuleError::InvalidNGramOrder);
        }
        Ok(Self { n })
    }
}

impl RuleLike for NoRepeatNGram {
    fn apply(&self, history: &[u32], scores: &mut ScoreBuffer) -> Result<(), ApplyRuleError> {
        if history.len() + 1 < self.n {
            return Ok(());
        }
        let mut followers: AHashMap<&[u32], Vec<u32>> = AHashMap::default();
        if history.len() >= self.n {
            for window in history.windows(self.n) {
                let (prefix, follower) = window.split_at(self.n - 1);
                followers.entry(prefix).or_default().push(follower[0]);
            }
        }
        let current_prefix = &history[history.len() + 1 - self.n..];
        if let Some(banned) = followers.get(current_prefix) {
            for &token_id in banned {
                if token_id as usize >= scores.vocab_size() {
                    return Err(ApplyRuleError::ShapeMismatch);
                }
                scores.suppress(token_id);
            }
        }
        Ok(())
    }
}
