use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use logitgate::force::ForceTokenAt;
use logitgate::repetition::{NoRepeatNGram, RepetitionPenalty};
use logitgate::suppress::SuppressTokens;
use logitgate::timestamp::TimestampConstraint;
use logitgate::{RuleChain, ScoreBuffer};

// A Whisper-sized vocabulary with the timestamp range at its tail.
const VOCAB_SIZE: usize = 51865;
const EOS_TOKEN_ID: u32 = 50257;
const NO_TIMESTAMPS_TOKEN_ID: u32 = 50362;

fn pseudo_history(len: usize) -> Vec<u32> {
    (0..len).map(|i| (i as u32 * 7919) % 50000).collect()
}

fn run_a_chain(chain: &RuleChain, history: &[u32], mut scores: ScoreBuffer) {
    chain.apply(history, &mut scores).unwrap();
    black_box(scores);
}

fn criterion_benchmark(c: &mut Criterion) {
    let mut c = c.benchmark_group("Simple");
    c.measurement_time(Duration::from_secs(10)).sample_size(100);
    let history = pseudo_history(448);
    let scores = ScoreBuffer::new(VOCAB_SIZE);

    let mut chain = RuleChain::new();
    chain.push(RepetitionPenalty::new(1.2).unwrap());
    c.bench_function("repetition penalty over 448 tokens of history", |b| {
        b.iter_batched(
            || scores.clone(),
            |scores| run_a_chain(&chain, &history, scores),
            BatchSize::SmallInput,
        )
    });

    let mut chain = RuleChain::new();
    chain.push(NoRepeatNGram::new(3).unwrap());
    c.bench_function("no-repeat trigram over 448 tokens of history", |b| {
        b.iter_batched(
            || scores.clone(),
            |scores| run_a_chain(&chain, &history, scores),
            BatchSize::SmallInput,
        )
    });

    let mut chain = RuleChain::new();
    chain.push(
        TimestampConstraint::new(
            EOS_TOKEN_ID,
            NO_TIMESTAMPS_TOKEN_ID,
            &[(1, 50258), (2, 50259)],
            Some(50),
        )
        .unwrap(),
    );
    c.bench_function("timestamp constraint over a 51865-entry buffer", |b| {
        b.iter_batched(
            || scores.clone(),
            |scores| run_a_chain(&chain, &history, scores),
            BatchSize::SmallInput,
        )
    });

    let mut chain = RuleChain::new();
    chain.push(ForceTokenAt::new([(1, 50258), (2, 50259)]));
    chain.push(RepetitionPenalty::new(1.2).unwrap());
    chain.push(NoRepeatNGram::new(3).unwrap());
    chain.push(SuppressTokens::new(vec![220, 50256]));
    chain.push(
        TimestampConstraint::new(
            EOS_TOKEN_ID,
            NO_TIMESTAMPS_TOKEN_ID,
            &[(1, 50258), (2, 50259)],
            Some(50),
        )
        .unwrap(),
    );
    c.bench_function("full transcription chain", |b| {
        b.iter_batched(
            || scores.clone(),
            |scores| run_a_chain(&chain, &history, scores),
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
