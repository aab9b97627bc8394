use criterion::{criterion_group, criterion_main, Criterion};
use lore::driver;
use std::hint::black_box;

static INPUT: &str = include_str!("../fixtures/program.lore");

fn criterion_benchmark(c: &mut Criterion) {
    let options = driver::Options::default();

    c.bench_function("compile", |b| {
        b.iter(|| {
            let module = driver::compile(black_box(INPUT), &options).unwrap();
            black_box(module);
        });
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
