//! This module contains the [`RuleLike`] trait, which defines the behavior of a decoding
//! rule, and the closed [`Rule`] union over every concrete rule in the crate.

use displaydoc::Display;

use crate::force::{ForceBos, ForceEos, ForceTokenAt};
use crate::repetition::{NoRepeatNGram, RepetitionPenalty};
use crate::score::ScoreBuffer;
use crate::suppress::{BeginSuppressTokens, MinLength, NoBadWords, SuppressTokens};
use crate::timestamp::TimestampConstraint;

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
/// Represents the error when a [`RuleLike`] is applied to a score buffer.
pub enum ApplyRuleError {
    /// The invoked rule does not override the default apply implementation.
    NotImplemented,
    /// A token index held by the rule or found in the history does not fit the score buffer.
    ShapeMismatch,
    /// The number of histories does not equal the number of score buffers.
    BatchSizeMismatch,
}

#[derive(Debug, thiserror::Error)]
/// Represents the error type for rule creation.
pub enum CreateRuleError {
    #[error("The penalty {0} is not a strictly positive real number.")]
    /// The penalty is zero, negative, infinite or not a number.
    InvalidPenalty(f32),
    #[error("The n-gram order must be at least 1.")]
    /// The n-gram order is zero.
    InvalidNGramOrder,
    #[error("The timestamp rule requires a nonempty forced decoder id list.
    The forced prefix tells the rule where free decoding begins; without it the pairing state machine has no anchor.")]
    /// The forced decoder id list is missing or empty.
    MissingForcedDecoderIds,
    #[error("The rule requires `{0}` to be set in the generation configuration.")]
    /// A required configuration field is unset.
    MissingConfigField(&'static str),
    #[error("{0}")] // inherits the error message from the wrapped InvalidConfigError
    /// A wrapper for the [`InvalidConfigError`](crate::config::InvalidConfigError) error type.
    InvalidConfig(#[from] crate::config::InvalidConfigError),
}

/// A trait that defines the behavior of a decoding rule.
///
/// A rule inspects the generated-token history of one row and mutates that row's
/// score buffer in place. Rules hold configuration captured at construction time
/// but no per-call mutable state: everything a call needs is recomputed from the
/// `history` argument, so one row's processing can never leak into another row's.
pub trait RuleLike {
    /// Applies the rule to one row's scores.
    ///
    /// # Arguments
    ///
    /// * `history` - The tokens emitted so far for this row, oldest first.
    /// * `scores` - A mutable reference to the row's score buffer.
    ///
    /// # Errors
    ///
    /// Returns an [`ApplyRuleError`] when a token index does not fit the buffer.
    /// The default implementation fails with [`ApplyRuleError::NotImplemented`];
    /// every concrete rule overrides it. It exists as a safety net against
    /// mis-registered rule variants, not as a runtime code path.
    fn apply(&self, history: &[u32], scores: &mut ScoreBuffer) -> Result<(), ApplyRuleError> {
        let _ = (history, scores);
        Err(ApplyRuleError::NotImplemented)
    }
}

#[derive(Debug, Clone, strum::Display)]
/// An enum over every concrete rule in the crate.
///
/// A [`RuleChain`](crate::chain::RuleChain) holds this closed union rather than
/// type-erased trait objects, so the set of rules is compile-time exhaustive.
pub enum Rule {
    /// Forces a specific token at configured decoding steps.
    ForceTokenAt(ForceTokenAt),
    /// Forces the begin-of-sequence token at the first free step.
    ForceBos(ForceBos),
    /// Forces the end-of-sequence token when the length budget runs out.
    ForceEos(ForceEos),
    /// Penalizes every token that already occurs in the history.
    RepetitionPenalty(RepetitionPenalty),
    /// Bans tokens that would repeat an already-seen n-gram.
    NoRepeatNGram(NoRepeatNGram),
    /// Enforces timestamp pairing for speech-transcription decoding.
    TimestampConstraint(TimestampConstraint),
    /// Unconditionally suppresses a fixed list of tokens.
    SuppressTokens(SuppressTokens),
    /// Suppresses a fixed list of tokens at the first free step only.
    BeginSuppressTokens(BeginSuppressTokens),
    /// Keeps the end-of-sequence token out of reach below a minimum length.
    MinLength(MinLength),
    /// Bans configured single- and multi-token word sequences.
    NoBadWords(NoBadWords),
}

macro_rules! match_rule {
    ($e:path[$s:expr$(,$p:ident)*]) => {
        match $s {
            Rule::ForceTokenAt(rule) => $e(rule, $($p,)*),
            Rule::ForceBos(rule) => $e(rule, $($p,)*),
            Rule::ForceEos(rule) => $e(rule, $($p,)*),
            Rule::RepetitionPenalty(rule) => $e(rule, $($p,)*),
            Rule::NoRepeatNGram(rule) => $e(rule, $($p,)*),
            Rule::TimestampConstraint(rule) => $e(rule, $($p,)*),
            Rule::SuppressTokens(rule) => $e(rule, $($p,)*),
            Rule::BeginSuppressTokens(rule) => $e(rule, $($p,)*),
            Rule::MinLength(rule) => $e(rule, $($p,)*),
            Rule::NoBadWords(rule) => $e(rule, $($p,)*),
        }
    }
}

impl RuleLike for Rule {
    fn apply(&self, history: &[u32], scores: &mut ScoreBuffer) -> Result<(), ApplyRuleError> {
        match_rule!(RuleLike::apply[self, history, scores])
    }
}

macro_rules! impl_from_rule {
    ($($variant:ident),*) => {$(
        impl From<$variant> for Rule {
            fn from(rule: $variant) -> Self {
                Rule::$variant(rule)
            }
        }
    )*}
}

impl_from_rule!(
    ForceTokenAt,
    ForceBos,
    ForceEos,
    RepetitionPenalty,
    NoRepeatNGram,
    TimestampConstraint,
    SuppressTokens,
    BeginSuppressTokens,
    MinLength,
    NoBadWords
);
