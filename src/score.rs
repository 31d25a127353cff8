//! This module contains the [`ScoreBuffer`] struct, the per-step score storage that rules mutate.

/// A fixed-length buffer of per-token scores (log-likelihoods) for one generation row
/// at one decoding step.
///
/// The buffer owns its storage and its length equals the vocabulary size for the
/// lifetime of the buffer. The decoding loop creates one buffer per row per step,
/// lends it mutably to a [`RuleChain`](crate::chain::RuleChain) and discards it after
/// token selection.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreBuffer {
    scores: Vec<f32>,
}

impl ScoreBuffer {
    /// Creates a buffer of `vocab_size` scores, all initialized to `0.0`.
    pub fn new(vocab_size: usize) -> Self {
        Self {
            scores: vec![0.0; vocab_size],
        }
    }

    /// Creates a buffer from the raw scores of one row. The vocabulary size is the
    /// length of `scores`.
    pub fn from_scores(scores: Vec<f32>) -> Self {
        Self { scores }
    }

    /// Retrieves the vocabulary size of the buffer.
    pub fn vocab_size(&self) -> usize {
        self.scores.len()
    }

    /// Retrieves the scores as an immutable slice.
    pub fn as_slice(&self) -> &[f32] {
        &self.scores
    }

    /// Retrieves the scores as a mutable slice.
    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.scores
    }

    /// Consumes the buffer and returns the raw scores.
    pub fn into_scores(self) -> Vec<f32> {
        self.scores
    }

    /// Sets the score of `token_id` to negative infinity, ruling the token out of
    /// selection.
    ///
    /// The caller must ensure `token_id` fits the buffer.
    pub fn suppress(&mut self, token_id: u32) {
        self.scores[token_id as usize] = f32::NEG_INFINITY;
    }

    /// Sets every score in `range` to negative infinity. The end of the range is
    /// clamped to the vocabulary size.
    pub fn suppress_range(&mut self, range: std::ops::Range<usize>) {
        let end = range.end.min(self.scores.len());
        for score in &mut self.scores[range.start.min(end)..end] {
            *score = f32::NEG_INFINITY;
        }
    }

    /// Suppresses the entire buffer and then restores `token_id` to `0.0`,
    /// the log-probability of certainty.
    ///
    /// This is the full-suppression-except-one pattern the forcing rules use. It is
    /// deliberately a two-step operation on the dense buffer so the result feeds
    /// directly into downstream log-softmax consumers.
    ///
    /// The caller must ensure `token_id` fits the buffer.
    pub fn force_only(&mut self, token_id: u32) {
        self.scores.fill(f32::NEG_INFINITY);
        self.scores[token_id as usize] = 0.0;
    }
}
