use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use blocknote_engine::editing::{Block, BlockType, extract_plain_text, plain_text};
mod common;

fn bench_extraction(c: &mut Criterion) {
    let mut group = c.benchmark_group("plain_text_extraction");
    group.sample_size(20);

    for sections in [10, 100, 1000] {
        let doc = common::generate_document(sections);
        group.bench_function(format!("{sections}_sections"), |b| {
            b.iter(|| {
                let text = extract_plain_text(black_box(doc.blocks()));
                black_box(text);
            });
        });
    }

    group.finish();
}

fn bench_truncation(c: &mut Criterion) {
    let mut group = c.benchmark_group("grapheme_truncation");
    group.sample_size(20);

    let text = common::generate_accented_text(5000);
    group.bench_function("truncate_at_grapheme", |b| {
        b.iter(|| {
            let cut = plain_text::truncate_at_grapheme(black_box(&text), plain_text::PLAIN_TEXT_CAP);
            black_box(cut);
        });
    });

    let blocks = vec![Block::new(BlockType::Text, text.clone())];
    group.bench_function("extract_over_cap", |b| {
        b.iter(|| {
            let extracted = extract_plain_text(black_box(&blocks));
            black_box(extracted);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_extraction, bench_truncation);
criterion_main!(benches);
