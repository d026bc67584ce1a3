use chart_scene::core::{
    CdsView, Column, ColumnDataSource, Filter, Glyph, GlyphRenderer, ModelId, PropertyValue,
    SetOperation,
};
use chart_scene::core::view::NoOperands;
use chart_scene::document::DiagnosticCode;
use chart_scene::{Document, SceneError};

fn letters() -> ColumnDataSource {
    ColumnDataSource::from_columns([
        ("x", Column::from(vec![1.0, 2.0, 3.0, 4.0, 5.0])),
        ("kind", Column::from(vec!["a", "b", "a", "c", "a"])),
    ])
    .expect("source")
}

fn ids(raw: &[&str]) -> Vec<ModelId> {
    raw.iter().copied().map(ModelId::from).collect()
}

#[test]
fn view_without_filters_selects_every_row() {
    let view = CdsView::default();

    assert_eq!(view.compute_indices(&letters(), &NoOperands), vec![0, 1, 2, 3, 4]);
}

#[test]
fn view_intersects_its_filters() {
    let filters = vec![
        (ModelId::from("f1"), Filter::index(vec![0, 2, 3, 4])),
        (
            ModelId::from("f2"),
            Filter::boolean(vec![true, true, false, true, true]),
        ),
        (ModelId::from("f3"), Filter::group("kind", "a")),
    ];
    let view = CdsView::new(ids(&["f1", "f2", "f3"]));

    assert_eq!(view.compute_indices(&letters(), &filters), vec![0, 4]);
}

#[test]
fn index_and_boolean_filters_keep_rows_in_both() {
    let source = ColumnDataSource::from_columns([(
        "x",
        Column::from((0..10).map(f64::from).collect::<Vec<_>>()),
    )])
    .expect("source");
    let filters = vec![
        (ModelId::from("even"), Filter::index(vec![0, 2, 4, 6, 8])),
        (
            ModelId::from("fourth"),
            Filter::boolean((0..10).map(|row| row % 4 == 0).collect()),
        ),
    ];
    let view = CdsView::new(ids(&["even", "fourth"]));

    assert_eq!(view.compute_indices(&source, &filters), vec![0, 4, 8]);
}

#[test]
fn index_filter_ignores_out_of_range_rows() {
    let mask = Filter::index(vec![1, 99]).compute_mask(&letters(), &NoOperands);

    assert_eq!(mask, vec![false, true, false, false, false]);
}

#[test]
fn short_boolean_filter_treats_missing_rows_as_excluded() {
    let mask = Filter::boolean(vec![true, true]).compute_mask(&letters(), &NoOperands);

    assert_eq!(mask, vec![true, true, false, false, false]);
}

#[test]
fn group_filter_on_missing_column_matches_nothing() {
    let mask = Filter::group("absent", "a").compute_mask(&letters(), &NoOperands);

    assert!(mask.iter().all(|keep| !keep));
}

#[test]
fn set_operations_combine_operand_masks() {
    let filters = vec![
        (ModelId::from("left"), Filter::index(vec![0, 1, 2])),
        (ModelId::from("right"), Filter::index(vec![2, 3])),
    ];
    let source = letters();
    let rows = |operation| {
        let filter = Filter::composite(operation, ids(&["left", "right"]));
        let mask = filter.compute_mask(&source, &filters);
        mask.iter()
            .enumerate()
            .filter_map(|(row, keep)| keep.then_some(row))
            .collect::<Vec<_>>()
    };

    assert_eq!(rows(SetOperation::Intersection), vec![2]);
    assert_eq!(rows(SetOperation::Union), vec![0, 1, 2, 3]);
    assert_eq!(rows(SetOperation::Difference), vec![0, 1]);
    assert_eq!(rows(SetOperation::SymmetricDifference), vec![0, 1, 3]);
}

#[test]
fn inversion_negates_its_operand() {
    let filters = vec![(ModelId::from("a_rows"), Filter::group("kind", "a"))];
    let inverted = Filter::inversion(ModelId::from("a_rows"));

    assert_eq!(
        inverted.compute_mask(&letters(), &filters),
        vec![false, true, false, true, false]
    );
}

#[test]
fn missing_or_cyclic_operands_contribute_no_rows() {
    let filters = vec![(
        ModelId::from("self"),
        Filter::composite(SetOperation::Union, ids(&["self", "ghost"])),
    )];
    let view = CdsView::new(ids(&["self"]));

    assert!(view.compute_indices(&letters(), &filters).is_empty());
}

#[test]
fn view_referencing_an_unknown_filter_selects_nothing() {
    let view = CdsView::new(ids(&["nowhere"]));

    assert!(view.compute_indices(&letters(), &NoOperands).is_empty());
}

struct Filtered {
    document: Document,
    renderer: ModelId,
    index_filter: ModelId,
}

fn filtered_renderer() -> Filtered {
    let mut document = Document::new();
    let source = document.add(letters()).expect("source");
    let index_filter = document
        .add(Filter::index(vec![0, 1, 2]))
        .expect("index filter");
    let group_filter = document.add(Filter::group("kind", "a")).expect("group filter");
    let view = document
        .add(CdsView::new(vec![index_filter.clone(), group_filter]).with_source(source.clone()))
        .expect("view");
    let glyph = document.add(Glyph::scatter("x", 0.0)).expect("glyph");
    let renderer = document
        .add(GlyphRenderer::new(source, glyph).with_view(view))
        .expect("renderer");
    Filtered {
        document,
        renderer,
        index_filter,
    }
}

#[test]
fn renderer_rows_follow_its_view() {
    let mut filtered = filtered_renderer();

    let rows = filtered
        .document
        .view_indices(&filtered.renderer)
        .expect("rows");

    assert_eq!(&rows[..], &[0, 2]);
}

#[test]
fn changing_a_filter_recomputes_cached_rows() {
    let mut filtered = filtered_renderer();
    filtered
        .document
        .view_indices(&filtered.renderer)
        .expect("rows");

    filtered
        .document
        .set(
            &filtered.index_filter,
            "indices",
            PropertyValue::List(vec![2.0.into(), 3.0.into(), 4.0.into()]),
        )
        .expect("set indices");

    let rows = filtered
        .document
        .view_indices(&filtered.renderer)
        .expect("rows");
    assert_eq!(&rows[..], &[2, 4]);
}

#[test]
fn view_filters_must_reference_filters() {
    let mut document = Document::new();
    let source = document.add(letters()).expect("source");

    let err = document
        .add(CdsView::new(vec![source]))
        .expect_err("a source is not a filter");

    assert!(matches!(err, SceneError::WrongModelKind { .. }));
}

#[test]
fn mismatched_boolean_filter_is_diagnosed() {
    let mut document = Document::new();
    let source = document.add(letters()).expect("source");
    let filter = document
        .add(Filter::boolean(vec![true, false]))
        .expect("filter");
    let view = document
        .add(CdsView::new(vec![filter.clone()]))
        .expect("view");
    let glyph = document.add(Glyph::scatter("x", 0.0)).expect("glyph");
    document
        .add(GlyphRenderer::new(source, glyph).with_view(view))
        .expect("renderer");

    let diagnostics = document.validate();

    assert!(diagnostics.iter().any(|diagnostic| {
        diagnostic.code == DiagnosticCode::ViewLengthMismatch && diagnostic.model == filter
    }));
}
