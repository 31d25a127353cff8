//! This module contains the [`RuleChain`] struct, the ordered rule collection the
//! decoding loop applies at every step.

use crate::config::GenerationConfig;
use crate::force::{ForceBos, ForceEos, ForceTokenAt};
use crate::repetition::{NoRepeatNGram, RepetitionPenalty};
use crate::rule::{ApplyRuleError, CreateRuleError, Rule, RuleLike};
use crate::score::ScoreBuffer;
use crate::suppress::{BeginSuppressTokens, MinLength, NoBadWords, SuppressTokens};

/// An ordered, mutable collection of rules, applied in insertion order.
///
/// Later rules observe the mutations of earlier rules; a rule may appear more than
/// once. The chain is constructed once per generation request and applied at every
/// decoding step.
#[derive(Debug, Clone, Default)]
pub struct RuleChain {
    rules: Vec<Rule>,
}

impl RuleChain {
    /// Creates an empty [`RuleChain`].
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Appends one rule to the end of the chain.
    pub fn push(&mut self, rule: impl Into<Rule>) {
        self.rules.push(rule.into());
    }

    /// Retrieves the number of rules in the chain.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Checks whether the chain holds no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Returns an iterator over the rules in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Rule> {
        self.rules.iter()
    }

    /// Applies every rule in insertion order to one row.
    ///
    /// # Errors
    ///
    /// Propagates the first [`ApplyRuleError`] a rule reports; the buffer keeps
    /// the mutations applied up to that point.
    pub fn apply(&self, history: &[u32], scores: &mut ScoreBuffer) -> Result<(), ApplyRuleError> {
        for rule in &self.rules {
            rule.apply(history, scores)?;
        }
        Ok(())
    }

    /// Applies every rule in insertion order to each row of a batch, using one
    /// history per row.
    ///
    /// Rows are processed independently: a rule's mutation of one row's buffer
    /// cannot observe or affect another row's.
    ///
    /// # Errors
    ///
    /// Returns [`ApplyRuleError::BatchSizeMismatch`] when the number of histories
    /// does not equal the number of buffers, and otherwise propagates the first
    /// error a rule reports.
    pub fn apply_batch(
        &self,
        histories: &[&[u32]],
        buffers: &mut [ScoreBuffer],
    ) -> Result<(), ApplyRuleError> {
        if histories.len() != buffers.len() {
            return Err(ApplyRuleError::BatchSizeMismatch);
        }
        for (history, scores) in histories.iter().zip(buffers.iter_mut()) {
            self.apply(history, scores)?;
        }
        Ok(())
    }

    /// Applies every rule to each row of a batch, sharing a single history across
    /// all rows.
    ///
    /// This reproduces the behavior of decoding loops that pass one history to the
    /// whole batch. It is only correct when every row really has the same history;
    /// with diverged rows (beam search, multi-sequence batches) use
    /// [`RuleChain::apply_batch`] instead.
    ///
    /// # Errors
    ///
    /// Propagates the first error a rule reports.
    pub fn apply_batch_shared(
        &self,
        history: &[u32],
        buffers: &mut [ScoreBuffer],
    ) -> Result<(), ApplyRuleError> {
        for scores in buffers.iter_mut() {
            self.apply(history, scores)?;
        }
        Ok(())
    }

    /// Assembles the standard chain for a validated [`GenerationConfig`].
    ///
    /// An option at its default (a penalty of `1.0`, an n-gram size of `0`, an
    /// unset token id) contributes no rule. The timestamp rule is not assembled
    /// here because its special token ids live outside the generation
    /// configuration; construct a
    /// [`TimestampConstraint`](crate::timestamp::TimestampConstraint) and
    /// [`push`](RuleChain::push) it where needed.
    ///
    /// # Errors
    ///
    /// Returns a [`CreateRuleError`] when the configuration fails validation or a
    /// rule constructor rejects its options.
    pub fn from_config(config: &GenerationConfig) -> Result<Self, CreateRuleError> {
        config.validate()?;
        let mut chain = Self::new();
        if config.repetition_penalty != 1.0 {
            chain.push(RepetitionPenalty::new(config.repetition_penalty)?);
        }
        if config.no_repeat_ngram_size > 0 {
            chain.push(NoRepeatNGram::new(config.no_repeat_ngram_size)?);
        }
        if let Some(bad_words_ids) = &config.bad_words_ids {
            if !bad_words_ids.is_empty() {
                chain.push(NoBadWords::new(bad_words_ids.clone()));
            }
        }
        if config.min_length > 0 {
            match config.eos_token_id {
                Some(eos_token_id) => chain.push(MinLength::new(config.min_length, eos_token_id)),
                None => log::warn!(
                    "`min_length` is set but `eos_token_id` is not, \
                    so the minimum length cannot be enforced at the score level. \
                    Set `eos_token_id` in the generation configuration to enforce it."
                ),
            }
        }
        if let Some(bos_token_id) = config.forced_bos_token_id {
            chain.push(ForceBos::new(bos_token_id));
        }
        if let Some(eos_token_id) = config.forced_eos_token_id {
            chain.push(ForceEos::new(config.max_length, eos_token_id));
        }
        if let Some(token_ids) = &config.suppress_tokens {
            if !token_ids.is_empty() {
                chain.push(SuppressTokens::new(token_ids.clone()));
            }
        }
        if let Some(token_ids) = &config.begin_suppress_tokens {
            if !token_ids.is_empty() {
                let begin_index = config
                    .forced_decoder_ids
                    .as_ref()
                    .map_or(0, |forced| forced.len())
                    + 1;
                chain.push(BeginSuppressTokens::new(token_ids.clone(), begin_index));
            }
        }
        if let Some(forced_decoder_ids) = &config.forced_decoder_ids {
            chain.push(ForceTokenAt::new(forced_decoder_ids.iter().copied()));
        }
        Ok(chain)
    }
}

impl Extend<Rule> for RuleChain {
    fn extend<T: IntoIterator<Item = Rule>>(&mut self, rules: T) {
        self.rules.extend(rules);
    }
}

impl FromIterator<Rule> for RuleChain {
    fn from_iter<T: IntoIterator<Item = Rule>>(rules: T) -> Self {
        Self {
            rules: rules.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a RuleChain {
    type Item = &'a Rule;
    type IntoIter = std::slice::Iter<'a, Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

impl IntoIterator for RuleChain {
    type Item = Rule;
    type IntoIter = std::vec::IntoIter<Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.into_iter()
    }
}
