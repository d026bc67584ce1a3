use chart_scene::Document;
use chart_scene::core::{
    CdsView, Column, ColumnData, ColumnDataSource, DataRange1d, Filter, Glyph, GlyphRenderer,
    ModelId, PropertyValue, SetOperation,
};
use criterion::{Criterion, criterion_group, criterion_main};
use indexmap::IndexMap;
use std::hint::black_box;

fn scatter_document(rows: usize) -> (Document, ModelId, ModelId, ModelId) {
    let xs: Vec<f64> = (0..rows).map(|i| i as f64 * 0.5).collect();
    let ys: Vec<f64> = (0..rows).map(|i| ((i as f64) * 0.01).sin() * 100.0).collect();

    let mut document = Document::new();
    let source = document
        .add(ColumnDataSource::from_columns([("x", xs), ("y", ys)]).expect("valid source"))
        .expect("add source");
    let glyph = document.add(Glyph::scatter("x", "y")).expect("add glyph");
    let renderer = document
        .add(GlyphRenderer::new(source.clone(), glyph))
        .expect("add renderer");
    let x_range = document.add(DataRange1d::new()).expect("add x range");
    let y_range = document.add(DataRange1d::new()).expect("add y range");
    let mut plot = document
        .plot_template()
        .with_ranges(x_range.clone(), y_range);
    plot.renderers.push(renderer);
    let plot = document.add_plot_with_defaults(plot).expect("add plot");
    (document, source, x_range, plot)
}

fn bench_data_range_resolution_100k(c: &mut Criterion) {
    let (mut document, _, x_range, _) = scatter_document(100_000);

    c.bench_function("data_range_resolution_100k", |b| {
        b.iter(|| {
            document.invalidate_all();
            let _ = document
                .resolve_range(black_box(&x_range))
                .expect("resolution should succeed");
        })
    });
}

fn bench_stream_then_resolve_10k(c: &mut Criterion) {
    let (mut document, source, x_range, _) = scatter_document(10_000);
    let mut next = 10_000.0;

    c.bench_function("stream_then_resolve_10k", |b| {
        b.iter(|| {
            let mut rows: ColumnData = IndexMap::new();
            rows.insert("x".to_owned(), vec![next].into());
            rows.insert("y".to_owned(), vec![next.cos()].into());
            next += 1.0;
            document
                .stream_source(&source, rows, Some(10_000))
                .expect("stream should succeed");
            let _ = document
                .resolve_range(black_box(&x_range))
                .expect("resolution should succeed");
            let _ = document.take_patch();
        })
    });
}

fn bench_render_plot_10k(c: &mut Criterion) {
    let (mut document, _, _, plot) = scatter_document(10_000);

    c.bench_function("render_plot_10k", |b| {
        b.iter(|| {
            let _ = document
                .render_plot(black_box(&plot))
                .expect("render should succeed");
        })
    });
}

fn bench_filtered_view_100k(c: &mut Criterion) {
    let rows = 100_000;
    let kinds: Vec<&str> = (0..rows).map(|i| if i % 3 == 0 { "a" } else { "b" }).collect();
    let mut document = Document::new();
    let source = document
        .add(
            ColumnDataSource::from_columns([
                ("x", Column::from((0..rows).map(|i| i as f64).collect::<Vec<_>>())),
                ("kind", Column::from(kinds)),
            ])
            .expect("valid source"),
        )
        .expect("add source");
    let group = document
        .add(Filter::group("kind", "a"))
        .expect("add group filter");
    let index = document
        .add(Filter::index((0..rows).step_by(2).collect()))
        .expect("add index filter");
    let union = document
        .add(Filter::composite(SetOperation::Union, vec![group.clone(), index]))
        .expect("add union filter");
    let view = document
        .add(CdsView::new(vec![union]).with_source(source.clone()))
        .expect("add view");
    let glyph = document.add(Glyph::scatter("x", 0.0)).expect("add glyph");
    let renderer = document
        .add(GlyphRenderer::new(source, glyph).with_view(view))
        .expect("add renderer");
    let mut toggle = false;

    c.bench_function("filtered_view_100k", |b| {
        b.iter(|| {
            toggle = !toggle;
            let group_value = if toggle { "a" } else { "b" };
            document
                .set(&group, "group", PropertyValue::from(group_value))
                .expect("set group");
            let _ = document
                .view_indices(black_box(&renderer))
                .expect("view should resolve");
        })
    });
}

fn bench_document_json_2k(c: &mut Criterion) {
    let (document, _, _, _) = scatter_document(2_000);

    c.bench_function("document_json_2k", |b| {
        b.iter(|| {
            let _ = black_box(&document)
                .to_json()
                .expect("serialization should succeed");
        })
    });
}

criterion_group!(
    benches,
    bench_data_range_resolution_100k,
    bench_stream_then_resolve_10k,
    bench_render_plot_10k,
    bench_filtered_view_100k,
    bench_document_json_2k
);
criterion_main!(benches);
