/*!
# logitgate

This crate provides the constraint-enforcement layer that sits between a sequence
model's raw per-token scores and the token-selection step of autoregressive
generation. At every decoding step, an ordered chain of rules rules out, forces or
reweights vocabulary entries in place, based on the generated-token history and an
immutable generation configuration. Here is a quick example of how this crate
works:

```rust
use logitgate::force::ForceTokenAt;
use logitgate::repetition::RepetitionPenalty;
use logitgate::{RuleChain, ScoreBuffer};

let mut chain = RuleChain::new();
// transcripts open with a fixed marker: token 3 is forced at step 1
chain.push(ForceTokenAt::new([(1, 3)]));
chain.push(RepetitionPenalty::new(2.0).unwrap());

// step 1: one token of history, the forced entry fires
let mut scores = ScoreBuffer::from_scores(vec![0.5, 0.5, 0.5, 0.5]);
chain.apply(&[2], &mut scores).unwrap();
assert_eq!(&format!("{:?}", scores.as_slice()), "[-inf, -inf, -inf, 0.0]");

// step 2: no forced entry, the repetition penalty halves the seen tokens
let mut scores = ScoreBuffer::from_scores(vec![1.0, 1.0, 1.0, -1.0]);
chain.apply(&[2, 3], &mut scores).unwrap();
assert_eq!(&format!("{:?}", scores.as_slice()), "[1.0, 1.0, 0.5, -2.0]");
```

# Overview

The primary types in this crate are [`RuleLike`], [`Rule`], [`RuleChain`],
[`ScoreBuffer`] and [`GenerationConfig`].

- [`RuleLike`] defines the contract of one rule: inspect one row's history,
  mutate that row's [`ScoreBuffer`] in place. Rules hold configuration captured at
  construction but recompute all working state from the history each call.
- [`Rule`] is the closed union over every concrete rule, so a chain is
  compile-time exhaustive rather than a list of type-erased closures. The concrete
  rules live in [`force`], [`repetition`], [`suppress`] and [`timestamp`].
- [`RuleChain`] applies its rules in insertion order, per batch row, with one
  history per row ([`RuleChain::apply_batch`]) or a shared history for decoding
  loops that work that way ([`RuleChain::apply_batch_shared`]).
- [`GenerationConfig`] is the immutable per-request record of decoding options
  with documented defaults; [`RuleChain::from_config`] assembles the standard
  chain from it after validation.

# Examples

## Assemble a chain from a configuration

```rust
use logitgate::{GenerationConfig, RuleChain};
let config = GenerationConfig {
    repetition_penalty: 1.3,
    no_repeat_ngram_size: 2,
    forced_bos_token_id: Some(0),
    ..GenerationConfig::default()
};
let chain = RuleChain::from_config(&config).unwrap();
assert_eq!(chain.len(), 3);
```

## Apply a chain to a batch with per-row histories

```rust
use logitgate::repetition::NoRepeatNGram;
use logitgate::{RuleChain, ScoreBuffer};
let mut chain = RuleChain::new();
chain.push(NoRepeatNGram::new(2).unwrap());
let histories: [&[u32]; 2] = [&[5, 3, 5, 3], &[1, 2]];
let mut buffers = vec![ScoreBuffer::new(8), ScoreBuffer::new(8)];
chain.apply_batch(&histories, &mut buffers).unwrap();
// row 0 has seen the bigram (3, 5), so 5 is banned after the trailing 3
assert_eq!(buffers[0].as_slice()[5], f32::NEG_INFINITY);
// row 1 repeats nothing
assert!(buffers[1].as_slice().iter().all(|&score| score == 0.0));
```

## Keep timestamps paired during transcription decoding

```rust
use logitgate::timestamp::TimestampConstraint;
use logitgate::{RuleLike, ScoreBuffer};
// text tokens 0..=3, end of sequence 4, "no timestamps" marker 5, timestamps 6..
let rule = TimestampConstraint::new(4, 5, &[(1, 1), (2, 2)], None).unwrap();
// the step right after the forced prefix must open a segment with a timestamp
let mut scores = ScoreBuffer::new(10);
rule.apply(&[0, 1, 2], &mut scores).unwrap();
assert_eq!(
    &format!("{:?}", scores.as_slice()),
    "[-inf, -inf, -inf, -inf, -inf, -inf, 0.0, -inf, -inf, -inf]"
);
```
*/
#![warn(missing_docs)]
#![warn(rustdoc::broken_intra_doc_links)]
pub mod chain;
pub mod config;
pub mod force;
pub mod repetition;
pub mod rule;
pub mod score;
pub mod suppress;
pub mod timestamp;
pub mod utils;
pub use chain::RuleChain;
pub use config::GenerationConfig;
pub use config::InvalidConfigError;
pub use rule::ApplyRuleError;
pub use rule::CreateRuleError;
pub use rule::Rule;
pub use rule::RuleLike;
pub use score::ScoreBuffer;
