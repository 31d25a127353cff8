//! This module contains the rules that force a single token at a specific decoding step.

use ahash::AHashMap;

use crate::rule::{ApplyRuleError, RuleLike};
use crate::score::ScoreBuffer;

/// A rule that forces specific tokens at specific decoding steps.
///
/// The rule holds a mapping from decoding-step index (the history length at call
/// time) to a forced token. On a hit, every other token is suppressed and the
/// forced token's score is set to `0.0`, the log-probability of certainty. Steps
/// without an entry pass the buffer through unmodified.
#[derive(Debug, Clone)]
pub struct ForceTokenAt {
    forced: AHashMap<usize, u32>,
}

impl ForceTokenAt {
    /// Creates a new [`ForceTokenAt`] from `(step, token)` pairs.
    ///
    /// When the same step appears more than once with different tokens, the last
    /// entry wins and a warning is logged.
    pub fn new(forced: impl IntoIterator<Item = (usize, u32)>) -> Self {
        let mut map = AHashMap::default();
        for (step, token_id) in forced {
            if let Some(previous) = map.insert(step, token_id) {
                if previous != token_id {
                    log::warn!(
                        "Decoding step {} is forced to two different tokens ({} and {}). \
                        The last entry wins. \
                        Seeing this warning likely indicates that the forced decoder id list \
                        was assembled incorrectly.",
                        step,
                        previous,
                        token_id
                    );
                }
            }
        }
        Self { forced: map }
    }
}

impl RuleLike for ForceTokenAt {
    fn apply(&self, history: &[u32], scores: &mut ScoreBuffer) -> Result<(), ApplyRuleError> {
        if let Some(&token_id) = self.forced.get(&history.len()) {
            if token_id as usize >= scores.vocab_size() {
                return Err(ApplyRuleError::ShapeMismatch);
            }
            scores.force_only(token_id);
        }
        Ok(())
    }
}

/// A rule that forces the begin-of-sequence token at the step immediately after the
/// synthetic start token, i.e. when the history holds exactly one token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ForceBos {
    bos_token_id: u32,
}

impl ForceBos {
    /// Creates a new [`ForceBos`] forcing `bos_token_id`.
    pub fn new(bos_token_id: u32) -> Self {
        Self { bos_token_id }
    }
}

impl RuleLike for ForceBos {
    fn apply(&self, history: &[u32], scores: &mut ScoreBuffer) -> Result<(), ApplyRuleError> {
        if history.len() == 1 {
            if self.bos_token_id as usize >= scores.vocab_size() {
                return Err(ApplyRuleError::ShapeMismatch);
            }
            scores.force_only(self.bos_token_id);
        }
        Ok(())
    }
}

/// A rule that forces the end-of-sequence token at the last step of the length
/// budget, i.e. when the history has grown to `max_length - 1` tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ForceEos {
    max_length: usize,
    eos_token_id: u32,
}

impl ForceEos {
    /// Creates a new [`ForceEos`] forcing `eos_token_id` once the history reaches
    /// `max_length - 1` tokens.
    pub fn new(max_length: usize, eos_token_id: u32) -> Self {
        Self {
            max_length,
            eos_token_id,
        }
    }
}

impl RuleLike for ForceEos {
    fn apply(&self, history: &[u32], scores: &mut ScoreBuffer) -> Result<(), ApplyRuleError> {
        if history.len() + 1 == self.max_length {
            if self.eos_token_id as usize >= scores.vocab_size() {
                return Err(ApplyRuleError::ShapeMismatch);
            }
            scores.force_only(self.eos_token_id);
        }
        Ok(())
    }
}
