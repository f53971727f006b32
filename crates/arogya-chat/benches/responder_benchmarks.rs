//! Benchmarks for reply selection.
//!
//! The responder runs on every turn between two database writes, so it
//! should stay in the microsecond range even for long messages that match
//! nothing and fall through every keyword group.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use arogya_chat::RuleBasedResponder;

fn long_unmatched_message(words: usize) -> String {
    (0..words)
        .map(|i| format!("word{}", i))
        .collect::<Vec<_>>()
        .join(" ")
}

fn bench_respond(c: &mut Criterion) {
    let responder = RuleBasedResponder::default();
    let mut group = c.benchmark_group("respond");

    for (name, query) in [
        ("first_group", "I have had a fever since last night"),
        ("last_group", "Can you help me find a doctor near Pune?"),
        ("fallback", "Hello, what can you do for me today?"),
    ] {
        group.bench_with_input(BenchmarkId::new("short", name), query, |b, q| {
            b.iter(|| responder.respond(black_box(q)))
        });
    }

    for words in [100, 1_000] {
        let message = long_unmatched_message(words);
        group.bench_with_input(
            BenchmarkId::new("unmatched_words", words),
            &message,
            |b, q| b.iter(|| responder.respond(black_box(q))),
        );
    }

    group.finish();
}

fn bench_classify(c: &mut Criterion) {
    let responder = RuleBasedResponder::default();
    c.bench_function("classify_mixed_keywords", |b| {
        b.iter(|| responder.classify(black_box("urgent: headache, cough and cold")))
    });
}

criterion_group!(benches, bench_respond, bench_classify);
criterion_main!(benches);
