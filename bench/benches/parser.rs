use criterion::{criterion_group, criterion_main, Criterion};
use lore::{lexer, parser::parse_program};
use std::hint::black_box;

static INPUT: &str = include_str!("../fixtures/program.lore");

fn criterion_benchmark(c: &mut Criterion) {
    let lexemes = lexer::lex(INPUT).unwrap();

    c.bench_function("parser", |b| {
        b.iter(|| {
            let root = parse_program(black_box(&lexemes)).unwrap();
            black_box(root);
        });
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
