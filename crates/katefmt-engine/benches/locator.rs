use criterion::{Criterion, criterion_group, criterion_main};
use katefmt_engine::editing::{Document, Position};
use katefmt_engine::scanning::{BreakChars, locate};
mod common;

fn bench_locate(c: &mut Criterion) {
    let mut group = c.benchmark_group("locator");
    group.sample_size(10);

    let source = Document::from_text(&common::generate_cpp_source(200));
    group.bench_function("locate_parameter_list", |b| {
        b.iter(|| {
            let cursor = std::hint::black_box(Position::new(1, 50));
            let found = locate(&source, cursor, BreakChars::Commas);
            std::hint::black_box(found)
        });
    });

    let long_call = Document::from_text(&common::generate_long_call(1000));
    group.bench_function("locate_long_call", |b| {
        b.iter(|| {
            let cursor = std::hint::black_box(Position::new(500, 10));
            let found = locate(&long_call, cursor, BreakChars::Commas);
            std::hint::black_box(found)
        });
    });

    group.bench_function("locate_outside_brackets", |b| {
        b.iter(|| {
            let cursor = std::hint::black_box(Position::new(2, 0));
            let found = locate(&source, cursor, BreakChars::Commas);
            std::hint::black_box(found)
        });
    });

    group.finish();
}

criterion_group!(benches, bench_locate);
criterion_main!(benches);
