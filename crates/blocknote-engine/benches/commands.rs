use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use blocknote_engine::editing::{AfterSave, BlockType, Document, EditSession};
use blocknote_engine::io::{MemoryGateway, NoteId};
mod common;

fn editing_session(doc: Document) -> EditSession {
    let mut session = EditSession::new(NoteId::parse("bench").unwrap(), doc);
    session.enter_edit().unwrap();
    session
}

fn bench_typing(c: &mut Criterion) {
    let mut group = c.benchmark_group("typing");
    group.sample_size(20);

    group.bench_function("set_content_per_keystroke", |b| {
        let mut session = editing_session(common::generate_document(100));
        let id = session.document().get(0).unwrap().id().clone();
        let mut content = String::new();
        b.iter(|| {
            content.push('x');
            if content.len() > 200 {
                content.clear();
            }
            let patch = session.set_content(&id, content.as_str()).unwrap();
            black_box(patch);
        });
    });

    group.bench_function("commit_and_advance", |b| {
        b.iter(|| {
            let mut session = editing_session(Document::new());
            let mut id = session.focused().cloned().unwrap();
            for _ in 0..50 {
                session.set_content(&id, "line").unwrap();
                session.commit_and_advance(&id).unwrap();
                let patch = session.commit_and_advance(&id).unwrap();
                id = patch.created.unwrap();
            }
            black_box(session);
        });
    });

    group.finish();
}

fn bench_structure(c: &mut Criterion) {
    let mut group = c.benchmark_group("structure");
    group.sample_size(20);

    let doc = common::generate_document(250);
    group.bench_function("insert_and_remove", |b| {
        let mut session = editing_session(doc.clone());
        let anchor = session.document().get(500).unwrap().id().clone();
        b.iter(|| {
            let id = session
                .insert_after(&anchor, BlockType::Text)
                .unwrap()
                .unwrap();
            session.remove_block(&id).unwrap();
        });
    });

    group.bench_function("reorder", |b| {
        let mut session = editing_session(doc.clone());
        let last = session.document().len() - 1;
        b.iter(|| {
            session.reorder(black_box(0), black_box(last)).unwrap();
        });
    });

    group.finish();
}

fn bench_save(c: &mut Criterion) {
    let mut group = c.benchmark_group("save");
    group.sample_size(20);

    let doc = common::generate_document(250);
    group.bench_function("save_to_memory", |b| {
        let mut gateway = MemoryGateway::new();
        let mut session = editing_session(doc.clone());
        let id = session.document().get(0).unwrap().id().clone();
        let mut n = 0u64;
        b.iter(|| {
            n += 1;
            session.set_content(&id, n.to_string()).unwrap();
            session.save(&mut gateway, AfterSave::Editing).unwrap();
        });
    });

    group.finish();
}

criterion_group!(benches, bench_typing, bench_structure, bench_save);
criterion_main!(benches);
