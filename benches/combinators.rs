//! Combinator Benchmarks
//!
//! Measures:
//! 1. Repetition over growing inputs (`sep_by` over numbers)
//! 2. Backtracking-heavy alternation
//! 3. Failure report construction
//! 4. In-memory text vs. a byte stream
//!
//! Run with: cargo bench --bench combinators

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use retrace::prelude::*;
use std::io::Cursor;

// ============================================================================
// Test Data
// ============================================================================

mod data {
    pub fn numbers(count: usize) -> String {
        (0..count)
            .map(|i| (i * 7919 % 100_000).to_string())
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn keywords(count: usize) -> String {
        const WORDS: [&str; 5] = ["letter", "loop", "log", "lambda", "let"];
        (0..count)
            .map(|i| WORDS[i % WORDS.len()])
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn table(rows: usize) -> String {
        (0..rows)
            .map(|i| format!("{},\"name {}\",{}.5\n", i, i, i * 3))
            .collect()
    }
}

// ============================================================================
// Grammars
// ============================================================================

fn number_list() -> Parser<Vec<u64>> {
    sep_by(decimal(), string(",")).before(eof())
}

fn keyword_list() -> Parser<Vec<String>> {
    let keyword = choice(vec![
        string("letter"),
        string("lambda"),
        string("loop"),
        string("log"),
        string("let"),
    ]);
    sep_by(keyword, whitespace1()).before(eof())
}

fn table() -> Parser<Vec<Vec<String>>> {
    let quoted = string("\"")
        .then(many(any_char().that_fails(string("\""))).join())
        .before(string("\""));
    let plain = many(any_char().that_fails(char_in(",\n"))).join();
    let record = sep_by(quoted.or(plain), string(",")).before(string("\n"));
    many(record).before(eof())
}

// ============================================================================
// Benchmarks
// ============================================================================

fn bench_repetition(c: &mut Criterion) {
    let mut group = c.benchmark_group("sep_by");
    let parser = number_list();

    for count in [10usize, 100, 1_000] {
        let input = data::numbers(count);
        group.throughput(Throughput::Bytes(input.len() as u64));
        group.bench_with_input(BenchmarkId::new("numbers", count), &input, |b, input| {
            b.iter(|| parser.parse(black_box(input)))
        });
    }

    group.finish();
}

fn bench_alternation(c: &mut Criterion) {
    let mut group = c.benchmark_group("choice");
    let parser = keyword_list();

    for count in [10usize, 100, 1_000] {
        let input = data::keywords(count);
        group.bench_with_input(BenchmarkId::new("keywords", count), &input, |b, input| {
            b.iter(|| parser.parse(black_box(input)))
        });
    }

    group.finish();
}

fn bench_failure_report(c: &mut Criterion) {
    let mut group = c.benchmark_group("failure");
    let parser = number_list();

    for count in [10usize, 100, 1_000] {
        let input = format!("{},x", data::numbers(count));
        group.bench_with_input(BenchmarkId::new("render", count), &input, |b, input| {
            b.iter(|| match parser.parse(black_box(input)) {
                Err(ParseError::Failed(failure)) => failure.render(),
                _ => String::new(),
            })
        });
    }

    group.finish();
}

fn bench_stream(c: &mut Criterion) {
    let mut group = c.benchmark_group("stream");
    let parser = table();
    let input = data::table(200);
    group.throughput(Throughput::Bytes(input.len() as u64));

    group.bench_function("text", |b| b.iter(|| parser.parse(black_box(&input))));
    group.bench_function("reader", |b| {
        b.iter(|| parser.parse_reader(Cursor::new(black_box(input.as_bytes()))))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_repetition,
    bench_alternation,
    bench_failure_report,
    bench_stream
);
criterion_main!(benches);
