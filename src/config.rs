//! The configuration module of the decoding rule chain.
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
/// Represents the error type for generation configuration validation.
pub enum InvalidConfigError {
    #[error("`temperature` must be a strictly positive finite number, got {0}.")]
    /// The temperature is zero, negative, infinite or not a number.
    NonPositiveTemperature(f32),
    #[error("`{name}` must be in (0, 1], got {value}.")]
    /// A probability-style option is outside the half-open unit interval.
    InvalidProbability {
        /// The offending option.
        name: &'static str,
        /// Its value.
        value: f32,
    },
    #[error("`{name}` must be in [0, 1), got {value}.")]
    /// A cutoff option is outside the unit interval.
    InvalidCutoff {
        /// The offending option.
        name: &'static str,
        /// Its value.
        value: f32,
    },
    #[error("`{name}` must be a strictly positive finite number, got {value}.")]
    /// A penalty option is zero, negative, infinite or not a number.
    NonPositivePenalty {
        /// The offending option.
        name: &'static str,
        /// Its value.
        value: f32,
    },
    #[error("`diversity_penalty` must be non-negative, got {0}.")]
    /// The diversity penalty is negative or not a number.
    NegativeDiversityPenalty(f32),
    #[error("`min_length` ({min_length}) exceeds `max_length` ({max_length}).
    A generation with these bounds can never terminate cleanly, so the contradiction is rejected at construction.")]
    /// The length bounds contradict each other.
    LengthBoundsConflict {
        /// The configured minimum length.
        min_length: usize,
        /// The configured maximum length.
        max_length: usize,
    },
    #[error("`min_new_tokens` ({min_new_tokens}) exceeds `max_new_tokens` ({max_new_tokens}).")]
    /// The new-token bounds contradict each other.
    NewTokenBoundsConflict {
        /// The configured minimum number of new tokens.
        min_new_tokens: usize,
        /// The configured maximum number of new tokens.
        max_new_tokens: usize,
    },
    #[error("`num_beams` must be at least 1.")]
    /// The beam count is zero.
    ZeroBeams,
    #[error("`num_beam_groups` ({num_beam_groups}) must be at least 1 and divide `num_beams` ({num_beams}).")]
    /// The beam group count is zero or does not divide the beam count.
    InvalidBeamGroups {
        /// The configured number of beam groups.
        num_beam_groups: usize,
        /// The configured number of beams.
        num_beams: usize,
    },
}

/// The configuration of one generation request.
///
/// Every option has a stated default; caller-supplied overrides merge over the
/// defaults field by field, either with struct-update syntax or by deserializing a
/// partial document:
///
/// ```rust
/// use logitgate::GenerationConfig;
/// let config = GenerationConfig {
///     repetition_penalty: 1.2,
///     no_repeat_ngram_size: 3,
///     ..GenerationConfig::default()
/// };
/// assert_eq!(config.max_length, 20);
///
/// let config: GenerationConfig =
///     serde_json::from_str(r#"{"no_repeat_ngram_size": 3}"#).unwrap();
/// assert_eq!(config.no_repeat_ngram_size, 3);
/// assert_eq!(config.top_k, 50);
/// ```
///
/// The record is immutable after construction by convention: it is created once per
/// request and passed by reference to every rule constructor and to the decoding
/// loop. Options the rule chain does not consume (beam counts, sampling switches,
/// output flags) are carried for the decoding loop and the search strategy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GenerationConfig {
    /// The maximum length of the generated sequence, prompt included.
    /// The default is `20`.
    pub max_length: usize,
    /// The maximum number of freshly generated tokens, prompt excluded.
    /// Takes precedence over [`GenerationConfig::max_length`] in the decoding loop when set.
    /// The default is `None`.
    pub max_new_tokens: Option<usize>,
    /// The minimum length of the generated sequence, prompt included.
    /// The default is `0`.
    pub min_length: usize,
    /// The minimum number of freshly generated tokens, prompt excluded.
    /// The default is `None`.
    pub min_new_tokens: Option<usize>,
    /// Whether beam search stops as soon as enough finished candidates exist.
    /// The default is `false`.
    pub early_stopping: bool,
    /// The wall-clock budget for one generation in seconds.
    /// The default is `None`, which means no budget.
    pub max_time: Option<f32>,
    /// Whether tokens are sampled instead of taken greedily.
    /// The default is `false`.
    pub do_sample: bool,
    /// The number of beams for beam search. `1` means no beam search.
    /// The default is `1`.
    pub num_beams: usize,
    /// The number of groups for diverse beam search. Must divide
    /// [`GenerationConfig::num_beams`]. The default is `1`.
    pub num_beam_groups: usize,
    /// The degeneration penalty for contrastive search.
    /// The default is `None`, which means no contrastive search.
    pub penalty_alpha: Option<f32>,
    /// Whether the model reuses past key/value states.
    /// The default is `true`.
    pub use_cache: bool,
    /// The value used to module the next-token probabilities.
    /// The default is `1.0`.
    pub temperature: f32,
    /// The number of highest-probability tokens kept for top-k filtering.
    /// The default is `50`.
    pub top_k: usize,
    /// The cumulative probability bound for nucleus filtering.
    /// The default is `1.0`, which means no filtering.
    pub top_p: f32,
    /// The local typicality bound for typical filtering.
    /// The default is `1.0`, which means no filtering.
    pub typical_p: f32,
    /// The absolute probability floor for epsilon filtering.
    /// The default is `0.0`, which means no filtering.
    pub epsilon_cutoff: f32,
    /// The entropy-scaled probability floor for eta filtering.
    /// The default is `0.0`, which means no filtering.
    pub eta_cutoff: f32,
    /// The score subtracted from beams of other groups in diverse beam search.
    /// The default is `0.0`.
    pub diversity_penalty: f32,
    /// The penalty applied to tokens that already occur in the history.
    /// Values above `1.0` discourage repetition, values below encourage it.
    /// The default is `1.0`, which means no penalty.
    pub repetition_penalty: f32,
    /// The repetition penalty applied against the encoder input tokens.
    /// The default is `1.0`, which means no penalty.
    pub encoder_repetition_penalty: f32,
    /// The exponential length penalty used when ranking beam candidates.
    /// The default is `1.0`.
    pub length_penalty: f32,
    /// The n-gram order whose repetition is forbidden. `0` disables the rule.
    /// The default is `0`.
    pub no_repeat_ngram_size: usize,
    /// The n-gram order whose repetition of the encoder input is forbidden.
    /// `0` disables the rule. The default is `0`.
    pub encoder_no_repeat_ngram_size: usize,
    /// Token sequences that must never be generated.
    /// The default is `None`.
    pub bad_words_ids: Option<Vec<Vec<u32>>>,
    /// Token sequences that must appear in the output, consumed by the
    /// constrained search strategy. The default is `None`.
    pub force_words_ids: Option<Vec<Vec<u32>>>,
    /// Whether the scores are renormalized after all rules ran.
    /// The default is `false`.
    pub renormalize_logits: bool,
    /// Token-id phrase constraints consumed by the constrained search strategy.
    /// The default is `None`.
    pub constraints: Option<Vec<Vec<u32>>>,
    /// The token forced at the first free decoding step.
    /// The default is `None`.
    pub forced_bos_token_id: Option<u32>,
    /// The token forced once the length budget runs out.
    /// The default is `None`.
    pub forced_eos_token_id: Option<u32>,
    /// Whether infinite and not-a-number scores are clamped by the decoding loop.
    /// The default is `false`.
    pub remove_invalid_values: bool,
    /// An `(start, decay_factor)` pair exponentially raising the end-of-sequence
    /// score once `start` tokens were generated. The default is `None`.
    pub exponential_decay_length_penalty: Option<(usize, f32)>,
    /// Tokens suppressed at every decoding step.
    /// The default is `None`.
    pub suppress_tokens: Option<Vec<u32>>,
    /// Tokens suppressed at the first free decoding step only.
    /// The default is `None`.
    pub begin_suppress_tokens: Option<Vec<u32>>,
    /// The `(step, token)` prefix the decoder is forced to emit before free
    /// decoding begins. The default is `None`.
    pub forced_decoder_ids: Option<Vec<(usize, u32)>>,
    /// Whether the decoding loop returns attention weights.
    /// The default is `false`.
    pub output_attentions: bool,
    /// Whether the decoding loop returns hidden states.
    /// The default is `false`.
    pub output_hidden_states: bool,
    /// Whether the decoding loop returns per-step scores.
    /// The default is `false`.
    pub output_scores: bool,
    /// Whether the decoding loop returns a structured result instead of a bare
    /// sequence. The default is `false`.
    pub return_dict_in_generate: bool,
    /// The padding token. The default is `None`.
    pub pad_token_id: Option<u32>,
    /// The begin-of-sequence token. The default is `None`.
    pub bos_token_id: Option<u32>,
    /// The end-of-sequence token. The default is `None`.
    pub eos_token_id: Option<u32>,
    /// The token an encoder-decoder model starts decoding with.
    /// The default is `None`.
    pub decoder_start_token_id: Option<u32>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_length: 20,
            max_new_tokens: None,
            min_length: 0,
            min_new_tokens: None,
            early_stopping: false,
            max_time: None,
            do_sample: false,
            num_beams: 1,
            num_beam_groups: 1,
            penalty_alpha: None,
            use_cache: true,
            temperature: 1.0,
            top_k: 50,
            top_p: 1.0,
            typical_p: 1.0,
            epsilon_cutoff: 0.0,
            eta_cutoff: 0.0,
            diversity_penalty: 0.0,
            repetition_penalty: 1.0,
            encoder_repetition_penalty: 1.0,
            length_penalty: 1.0,
            no_repeat_ngram_size: 0,
            encoder_no_repeat_ngram_size: 0,
            bad_words_ids: None,
            force_words_ids: None,
            renormalize_logits: false,
            constraints: None,
            forced_bos_token_id: None,
            forced_eos_token_id: None,
            remove_invalid_values: false,
            exponential_decay_length_penalty: None,
            suppress_tokens: None,
            begin_suppress_tokens: None,
            forced_decoder_ids: None,
            output_attentions: false,
            output_hidden_states: false,
            output_scores: false,
            return_dict_in_generate: false,
            pad_token_id: None,
            bos_token_id: None,
            eos_token_id: None,
            decoder_start_token_id: None,
        }
    }
}

impl GenerationConfig {
    /// Checks every numeric option against its domain and the length bounds
    /// against each other.
    ///
    /// # Errors
    ///
    /// Returns the first [`InvalidConfigError`] encountered. The checks run in
    /// declaration order, so an error names the first offending field of the
    /// record.
    pub fn validate(&self) -> Result<(), InvalidConfigError> {
        if !(self.temperature.is_finite() && self.temperature > 0.0) {
            return Err(InvalidConfigError::NonPositiveTemperature(self.temperature));
        }
        for (name, value) in [("top_p", self.top_p), ("typical_p", self.typical_p)] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(InvalidConfigError::InvalidProbability { name, value });
            }
        }
        for (name, value) in [
            ("epsilon_cutoff", self.epsilon_cutoff),
            ("eta_cutoff", self.eta_cutoff),
        ] {
            if !(value >= 0.0 && value < 1.0) {
                return Err(InvalidConfigError::InvalidCutoff { name, value });
            }
        }
        for (name, value) in [
            ("repetition_penalty", self.repetition_penalty),
            ("encoder_repetition_penalty", self.encoder_repetition_penalty),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(InvalidConfigError::NonPositivePenalty { name, value });
            }
        }
        if !(self.diversity_penalty >= 0.0) {
            return Err(InvalidConfigError::NegativeDiversityPenalty(
                self.diversity_penalty,
            ));
        }
        if self.min_length > self.max_length {
            return Err(InvalidConfigError::LengthBoundsConflict {
                min_length: self.min_length,
                max_length: self.max_length,
            });
        }
        if let (Some(min_new_tokens), Some(max_new_tokens)) =
            (self.min_new_tokens, self.max_new_tokens)
        {
            if min_new_tokens > max_new_tokens {
                return Err(InvalidConfigError::NewTokenBoundsConflict {
                    min_new_tokens,
                    max_new_tokens,
                });
            }
        }
        if self.num_beams < 1 {
            return Err(InvalidConfigError::ZeroBeams);
        }
        if self.num_beam_groups < 1 || self.num_beams % self.num_beam_groups != 0 {
            return Err(InvalidConfigError::InvalidBeamGroups {
                num_beam_groups: self.num_beam_groups,
                num_beams: self.num_beams,
            });
        }
        Ok(())
    }
}
