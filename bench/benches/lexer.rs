use criterion::{criterion_group, criterion_main, Criterion};
use lore::lexer;
use std::hint::black_box;

static INPUT: &str = include_str!("../fixtures/program.lore");

fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("lexer", |b| {
        b.iter(|| {
            let lexemes = lexer::lex(black_box(INPUT)).unwrap();
            black_box(lexemes.len());
        });
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
