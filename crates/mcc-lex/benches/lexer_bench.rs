//! Lexer benchmarks.
//!
//! Run with: `cargo bench --package mcc-lex`

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use mcc_lex::Lexer;
use mcc_util::Handler;

fn lexer_token_count(source: &str) -> usize {
    let mut handler = Handler::new();
    let lexer = Lexer::new(source, &mut handler);
    lexer.count()
}

fn bench_lexer_keywords(c: &mut Criterion) {
    let mut group = c.benchmark_group("lexer");

    let source = "int x; void main(void) { int y; y = x + 1; return; }";
    group.throughput(Throughput::Bytes(source.len() as u64));

    group.bench_function("var_declaration", |b| {
        b.iter(|| lexer_token_count(black_box("int x;")))
    });

    group.bench_function("function_with_body", |b| {
        b.iter(|| lexer_token_count(black_box(source)))
    });

    group.finish();
}

fn bench_lexer_complex(c: &mut Criterion) {
    let mut group = c.benchmark_group("lexer_complex");

    let source = r#"
        int gcd(int a, int b) {
            while (a != b) {
                if (a > b)
                    a = a - b;
                else
                    b = b - a;
            }
            return a;
        }

        void main(void) {
            int x;
            int y;
            int arr[10];
            x = input();
            y = input();
            output(gcd(x, y));
        }
    "#;

    group.throughput(Throughput::Bytes(source.len() as u64));

    group.bench_function("complex_source", |b| {
        b.iter(|| lexer_token_count(black_box(source)))
    });

    group.finish();
}

fn bench_lexer_comments(c: &mut Criterion) {
    let mut group = c.benchmark_group("lexer_comments");

    group.bench_function("short_comment", |b| {
        b.iter(|| lexer_token_count(black_box("int x; /* a comment */ x = 1;")))
    });

    group.bench_function("long_comment", |b| {
        let source = format!("int x; /* {} */ x = 1;", "filler text ".repeat(50));
        b.iter(|| lexer_token_count(black_box(&source)))
    });

    group.finish();
}

fn bench_lexer_numbers(c: &mut Criterion) {
    let mut group = c.benchmark_group("lexer_numbers");

    group.bench_function("small_number", |b| {
        b.iter(|| lexer_token_count(black_box("int x; x = 7;")))
    });

    group.bench_function("large_number", |b| {
        b.iter(|| lexer_token_count(black_box("int x; x = 123456789;")))
    });

    group.finish();
}

fn bench_lexer_identifiers(c: &mut Criterion) {
    let mut group = c.benchmark_group("lexer_identifiers");

    group.bench_function("short_ident", |b| {
        b.iter(|| lexer_token_count(black_box("int x;")))
    });

    group.bench_function("long_ident", |b| {
        b.iter(|| lexer_token_count(black_box("int this_is_a_long_variable_name;")))
    });

    group.bench_function("many_idents", |b| {
        b.iter(|| {
            lexer_token_count(black_box(
                "int a; int b; int c; int d; int e; int f; int g;",
            ))
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_lexer_keywords,
    bench_lexer_complex,
    bench_lexer_comments,
    bench_lexer_numbers,
    bench_lexer_identifiers
);
criterion_main!(benches);
