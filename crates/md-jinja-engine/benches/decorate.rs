use criterion::{Criterion, criterion_group, criterion_main};
use md_jinja_engine::document::{Document, Edit, Point};
use md_jinja_engine::highlight::Decorator;
use std::hint::black_box;

fn generate_document(repeats: usize) -> Document {
    let base = "# {{ title }}\nHello {{ user.name }}, see https://example.com/docs[^1].\n{% for item in items %}\n- <b>{{ item | upper }}</b>\n{% endfor %}\n{# trailing comment #}\n| {{ a }} | {{ b }} |\n```jinja\n";
    Document::from_markdown_lines(&base.repeat(repeats))
}

fn bench_decorate_cold(c: &mut Criterion) {
    let mut group = c.benchmark_group("decorate_cold");
    group.sample_size(20);

    let document = generate_document(100);
    for (name, jinja) in [("jinja_on", true), ("jinja_off", false)] {
        group.bench_function(name, |b| {
            b.iter(|| {
                let mut decorator = Decorator::new(jinja);
                black_box(decorator.decorate_document(black_box(&document)));
            });
        });
    }

    group.finish();
}

fn bench_decorate_cached(c: &mut Criterion) {
    let mut group = c.benchmark_group("decorate_cached");
    group.sample_size(20);

    let mut document = generate_document(100);
    let mut decorator = Decorator::new(true);
    decorator.decorate_document(&document);

    group.bench_function("unchanged", |b| {
        b.iter(|| black_box(decorator.decorate_document(&document)));
    });

    group.bench_function("one_block_edited", |b| {
        b.iter(|| {
            let patch = document
                .apply(vec![Edit::InsertText {
                    at: Point::new([1, 0], 0),
                    text: "x".into(),
                }])
                .unwrap();
            decorator.sync(&patch);
            black_box(decorator.decorate_document(&document));
        });
    });

    group.finish();
}

criterion_group!(benches, bench_decorate_cold, bench_decorate_cached);
criterion_main!(benches);
