//! This module contains the [`TimestampConstraint`] rule used by speech-transcription
//! decoding.

use crate::config::GenerationConfig;
use crate::rule::{ApplyRuleError, CreateRuleError, RuleLike};
use crate::score::ScoreBuffer;
use crate::utils;

/// A rule that keeps timestamp tokens paired during speech-transcription decoding.
///
/// The vocabulary tail starting at `timestamp_begin` holds timestamp tokens; the
/// decoder must open every text segment with one timestamp and close it with
/// another. The rule derives its working state each call from the portion of the
/// history generated after the forced prefix:
///
/// * at the step immediately after the forced prefix, the first free token is
///   forced to be `timestamp_begin`;
/// * after a timestamp that closed a segment, the next token must be text, so the
///   whole timestamp range is suppressed;
/// * after a timestamp that opened a segment, the next token must close it, so
///   everything below the end-of-sequence token is suppressed;
/// * the "no timestamps" marker is suppressed unconditionally at every step.
///
/// Finally, the summed probability mass of the timestamp range is compared against
/// the best single text token in log-space; when the timestamps collectively
/// outweigh every individual alternative, all text tokens are suppressed. This
/// biases the decoder toward a timestamp even when no single timestamp dominates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimestampConstraint {
    eos_token_id: u32,
    no_timestamps_token_id: u32,
    timestamp_begin: u32,
    begin_index: usize,
    max_initial_timestamp_index: Option<u32>,
}

impl TimestampConstraint {
    /// Creates a new [`TimestampConstraint`].
    ///
    /// # Arguments
    ///
    /// * `eos_token_id` - The end-of-sequence token.
    /// * `no_timestamps_token_id` - The marker that disables timestamps; the
    ///   timestamp range starts right after it.
    /// * `forced_decoder_ids` - The `(step, token)` prefix the decoder is forced to
    ///   emit; free decoding begins after it.
    /// * `max_initial_timestamp_index` - Bounds how far into the timestamp range
    ///   the first timestamp may fall, if set.
    ///
    /// # Errors
    ///
    /// Returns [`CreateRuleError::MissingForcedDecoderIds`] when `forced_decoder_ids`
    /// is empty.
    pub fn new(
        eos_token_id: u32,
        no_timestamps_token_id: u32,
        forced_decoder_ids: &[(usize, u32)],
        max_initial_timestamp_index: Option<u32>,
    ) -> Result<Self, CreateRuleError> {
        if forced_decoder_ids.is_empty() {
            return Err(CreateRuleError::MissingForcedDecoderIds);
        }
        let timestamp_begin = no_timestamps_token_id + 1;
        let mut begin_index = forced_decoder_ids.len() + 2;
        if forced_decoder_ids
            .last()
            .is_some_and(|&(_, token_id)| token_id == no_timestamps_token_id)
        {
            begin_index -= 1;
        }
        Ok(Self {
            eos_token_id,
            no_timestamps_token_id,
            timestamp_begin,
            begin_index,
            max_initial_timestamp_index,
        })
    }

    /// Creates a new [`TimestampConstraint`] from a [`GenerationConfig`], which
    /// supplies `eos_token_id` and `forced_decoder_ids`.
    ///
    /// # Errors
    ///
    /// Returns a [`CreateRuleError`] when `eos_token_id` is unset or
    /// `forced_decoder_ids` is missing or empty.
    pub fn from_config(
        config: &GenerationConfig,
        no_timestamps_token_id: u32,
        max_initial_timestamp_index: Option<u32>,
    ) -> Result<Self, CreateRuleError> {
        let eos_token_id = config
            .eos_token_id
            .ok_or(CreateRuleError::MissingConfigField("eos_token_id"))?;
        let forced_decoder_ids = config
            .forced_decoder_ids
            .as_deref()
            .ok_or(CreateRuleError::MissingForcedDecoderIds)?;
        Self::new(
            eos_token_id,
            no_timestamps_token_id,
            forced_decoder_ids,
            max_initial_timestamp_index,
        )
    }

    /// Retrieves the first token id of the timestamp range.
    pub fn timestamp_begin(&self) -> u32 {
        self.timestamp_begin
    }

    /// Retrieves the history length at which free decoding begins.
    pub fn begin_index(&self) -> usize {
        self.begin_index
    }
}

impl RuleLike for TimestampConstraint {
    fn apply(&self, history: &[u32], scores: &mut ScoreBuffer) -> Result<(), ApplyRuleError> {
        let vocab_size = scores.vocab_size();
        let timestamp_begin = self.timestamp_begin as usize;
        if timestamp_begin >= vocab_size || self.eos_token_id as usize >= vocab_size {
            return Err(ApplyRuleError::ShapeMismatch);
        }
        // the "no timestamps" marker must never be re-emitted mid-sequence
        scores.suppress(self.no_timestamps_token_id);

        if history.len() + 1 == self.begin_index {
            // the first free token opens a segment, so it must be a timestamp
            scores.force_only(self.timestamp_begin);
            return Ok(());
        }

        let sampled = &history[self.begin_index.min(history.len())..];
        let last_was_timestamp = sampled
            .last()
            .is_some_and(|&token_id| token_id >= self.timestamp_begin);
        let penultimate_was_timestamp =
            sampled.len() < 2 || sampled[sampled.len() - 2] >= self.timestamp_begin;
        if last_was_timestamp {
            if penultimate_was_timestamp {
                // the segment just closed; the next token must be text
                scores.suppress_range(timestamp_begin..vocab_size);
            } else {
                // the segment is open; the next token must close it or end the sequence
                scores.suppress_range(0..self.eos_token_id as usize);
            }
        }

        if history.len() == self.begin_index {
            if let Some(max_initial) = self.max_initial_timestamp_index {
                let last_allowed = timestamp_begin + max_initial as usize;
                scores.suppress_range(last_allowed + 1..vocab_size);
            }
        }

        let log_probs = utils::log_softmax(scores.as_slice());
        let timestamp_log_prob = utils::log_sum_exp(&log_probs[timestamp_begin..]);
        let max_text_log_prob = log_probs[..timestamp_begin]
            .iter()
            .copied()
            .fold(f32::NEG_INFINITY, f32::max);
        if timestamp_log_prob > max_text_log_prob {
            scores.suppress_range(0..timestamp_begin);
        }
        Ok(())
    }
}
