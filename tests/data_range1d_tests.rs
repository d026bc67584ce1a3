use approx::assert_relative_eq;
use chart_scene::core::{
    Bounds, ColumnData, ColumnDataSource, DataRange1d, Extent, Follow, Glyph, GlyphRenderer,
    ModelId, PaddingUnits, Range1d, ScaleHint,
};
use chart_scene::{Document, SceneError};
use indexmap::IndexMap;

fn extent(min: f64, max: f64) -> Option<Extent> {
    Some(Extent { min, max })
}

#[test]
fn default_padding_widens_by_ten_percent() {
    let (start, end) = DataRange1d::new()
        .compute(extent(-10.0, -6.0))
        .expect("range");

    assert_relative_eq!(start, -10.2, epsilon = 1e-12);
    assert_relative_eq!(end, -5.8, epsilon = 1e-12);
}

#[test]
fn absolute_padding_is_added_to_each_side() {
    let (start, end) = DataRange1d::new()
        .with_padding(0.5, PaddingUnits::Absolute)
        .compute(extent(0.0, 10.0))
        .expect("range");

    assert_eq!((start, end), (-0.5, 10.5));
}

#[test]
fn degenerate_extent_uses_default_span() {
    let (start, end) = DataRange1d::new()
        .compute(extent(3.0, 3.0))
        .expect("range");

    assert_eq!((start, end), (2.0, 4.0));
}

#[test]
fn follow_start_keeps_the_leading_edge() {
    let range = DataRange1d::new()
        .with_padding(0.0, PaddingUnits::Percent)
        .with_follow(Follow::Start, Some(4.0));

    assert_eq!(range.compute(extent(1.0, 7.0)), Some((1.0, 5.0)));
    assert_eq!(
        range.with_flipped(true).compute(extent(1.0, 7.0)),
        Some((7.0, 3.0))
    );
}

#[test]
fn follow_end_keeps_the_trailing_edge() {
    let range = DataRange1d::new()
        .with_padding(0.0, PaddingUnits::Percent)
        .with_follow(Follow::End, Some(4.0));

    assert_eq!(range.compute(extent(1.0, 7.0)), Some((3.0, 7.0)));
    assert_eq!(
        range.with_flipped(true).compute(extent(1.0, 7.0)),
        Some((5.0, 1.0))
    );
}

#[test]
fn follow_interval_wider_than_data_has_no_effect() {
    let range = DataRange1d::new()
        .with_padding(0.0, PaddingUnits::Percent)
        .with_follow(Follow::End, Some(100.0));

    assert_eq!(range.compute(extent(1.0, 7.0)), Some((1.0, 7.0)));
}

#[test]
fn log_hint_pads_in_decades() {
    let mut range = DataRange1d::new().with_padding(0.5, PaddingUnits::Percent);
    range.scale_hint = ScaleHint::Log;

    let (start, end) = range.compute(extent(0.01, 10.0)).expect("range");

    assert_relative_eq!(start, 0.001_778_279_4, max_relative = 1e-6);
    assert_relative_eq!(end, 56.234_132_5, max_relative = 1e-6);
}

#[test]
fn log_hint_with_single_value_spans_two_decades() {
    let mut range = DataRange1d::new();
    range.scale_hint = ScaleHint::Log;

    let (start, end) = range.compute(extent(100.0, 100.0)).expect("range");

    assert_relative_eq!(start, 9.988_493, max_relative = 1e-5);
    assert_relative_eq!(end, 1001.152, max_relative = 1e-5);
}

#[test]
fn explicit_bounds_clamp_the_padded_extent() {
    let mut range = DataRange1d::new();
    range.bounds = Bounds::explicit(Some(0.0), None);

    let (start, end) = range.compute(extent(0.0, 10.0)).expect("range");

    assert_eq!(start, 0.0);
    assert_relative_eq!(end, 10.5, epsilon = 1e-12);
}

#[test]
fn user_overrides_win_over_computed_values() {
    let mut range = DataRange1d::new();
    range.start = Some(-100.0);

    let (start, end) = range.compute(extent(0.0, 10.0)).expect("range");

    assert_eq!(start, -100.0);
    assert_relative_eq!(end, 10.5, epsilon = 1e-12);
}

#[test]
fn no_data_resolves_only_with_both_overrides() {
    let mut range = DataRange1d::new();
    assert_eq!(range.compute(None), None);

    range.start = Some(1.0);
    assert_eq!(range.compute(None), None);

    range.end = Some(2.0);
    assert_eq!(range.compute(None), Some((1.0, 2.0)));
}

struct ScatterPlot {
    document: Document,
    sources: Vec<ModelId>,
    renderers: Vec<ModelId>,
    x_range: ModelId,
    y_range: ModelId,
}

fn scatter_plot(columns: &[(Vec<f64>, Vec<f64>)], x_range: DataRange1d) -> ScatterPlot {
    let mut document = Document::new();
    let mut sources = Vec::new();
    let mut renderers = Vec::new();
    for (xs, ys) in columns {
        let source = document
            .add(
                ColumnDataSource::from_columns([("x", xs.clone()), ("y", ys.clone())])
                    .expect("source"),
            )
            .expect("add source");
        let glyph = document.add(Glyph::scatter("x", "y")).expect("add glyph");
        renderers.push(
            document
                .add(GlyphRenderer::new(source.clone(), glyph))
                .expect("add renderer"),
        );
        sources.push(source);
    }
    let x_range = document.add(x_range).expect("add x range");
    let y_range = document.add(DataRange1d::new()).expect("add y range");
    let mut plot = document
        .plot_template()
        .with_ranges(x_range.clone(), y_range.clone());
    plot.renderers = renderers.clone();
    document.add(plot).expect("add plot");
    ScatterPlot {
        document,
        sources,
        renderers,
        x_range,
        y_range,
    }
}

fn resolved_x(plot: &mut ScatterPlot) -> (f64, f64) {
    let resolved = plot
        .document
        .resolve_range(&plot.x_range)
        .expect("resolve")
        .expect("extent");
    (resolved.start(), resolved.end())
}

#[test]
fn extent_combines_every_renderer_on_the_plot() {
    let mut plot = scatter_plot(
        &[
            (vec![0.0, 5.0, 10.0], vec![1.0, 2.0, 3.0]),
            (vec![-3.0, 2.0, 8.0], vec![1.0, 2.0, 3.0]),
        ],
        DataRange1d::new().with_padding(0.0, PaddingUnits::Percent),
    );

    assert_eq!(resolved_x(&mut plot), (-3.0, 10.0));
}

#[test]
fn streaming_into_a_source_invalidates_the_cached_range() {
    let mut plot = scatter_plot(
        &[(vec![0.0, 5.0, 10.0], vec![1.0, 2.0, 3.0])],
        DataRange1d::new().with_padding(0.0, PaddingUnits::Percent),
    );
    assert_eq!(resolved_x(&mut plot), (0.0, 10.0));
    assert!(plot.document.is_resolved(&plot.x_range));

    let mut rows: ColumnData = IndexMap::new();
    rows.insert("x".to_owned(), vec![20.0].into());
    rows.insert("y".to_owned(), vec![4.0].into());
    plot.document
        .stream_source(&plot.sources[0], rows, None)
        .expect("stream");

    assert!(!plot.document.is_resolved(&plot.x_range));
    assert_eq!(resolved_x(&mut plot), (0.0, 20.0));
}

#[test]
fn hidden_renderers_are_skipped_only_when_requested() {
    let mut range = DataRange1d::new().with_padding(0.0, PaddingUnits::Percent);
    range.only_visible = true;
    let mut plot = scatter_plot(
        &[
            (vec![0.0, 1.0], vec![0.0, 1.0]),
            (vec![50.0, 60.0], vec![0.0, 1.0]),
        ],
        range,
    );
    assert_eq!(resolved_x(&mut plot), (0.0, 60.0));

    let hidden = plot.renderers[1].clone();
    plot.document.set(&hidden, "visible", false).expect("hide");

    assert_eq!(resolved_x(&mut plot), (0.0, 1.0));
}

#[test]
fn explicit_renderer_list_limits_the_scan() {
    let mut document = Document::new();
    let wide = document
        .add(ColumnDataSource::from_columns([("x", vec![-100.0, 100.0])]).expect("source"))
        .expect("add");
    let narrow = document
        .add(ColumnDataSource::from_columns([("x", vec![2.0, 4.0])]).expect("source"))
        .expect("add");
    let glyph = document.add(Glyph::scatter("x", 0.0)).expect("glyph");
    let wide_renderer = document
        .add(GlyphRenderer::new(wide, glyph.clone()))
        .expect("renderer");
    let narrow_renderer = document
        .add(GlyphRenderer::new(narrow, glyph))
        .expect("renderer");
    let range = document
        .add(
            DataRange1d::new()
                .with_padding(0.0, PaddingUnits::Percent)
                .with_renderers(vec![narrow_renderer.clone()]),
        )
        .expect("range");
    let y_range = document.add(Range1d::new(0.0, 1.0).expect("y")).expect("y");
    let mut plot = document.plot_template().with_ranges(range.clone(), y_range);
    plot.renderers = vec![wide_renderer, narrow_renderer];
    document.add(plot).expect("plot");

    let resolved = document
        .resolve_range(&range)
        .expect("resolve")
        .expect("extent");
    assert_eq!((resolved.start(), resolved.end()), (2.0, 4.0));
}

#[test]
fn source_list_contributes_every_numeric_column() {
    let mut document = Document::new();
    let source = document
        .add(
            ColumnDataSource::from_columns([
                ("a", vec![-1.0, 3.0]),
                ("b", vec![7.0, 2.0]),
            ])
            .expect("source"),
        )
        .expect("add");
    let range = document
        .add(
            DataRange1d::new()
                .with_padding(0.0, PaddingUnits::Percent)
                .with_sources(vec![source]),
        )
        .expect("range");

    let resolved = document
        .resolve_range(&range)
        .expect("resolve")
        .expect("extent");
    assert_eq!((resolved.start(), resolved.end()), (-1.0, 7.0));
}

#[test]
fn range_without_data_is_unresolved() {
    let mut document = Document::new();
    let range = document.add(DataRange1d::new()).expect("range");

    assert!(document.resolve_range(&range).expect("resolve").is_none());
}

#[test]
fn resolving_a_non_range_is_a_kind_error() {
    let mut plot = scatter_plot(
        &[(vec![0.0], vec![0.0])],
        DataRange1d::new(),
    );
    let source = plot.sources[0].clone();

    let err = plot
        .document
        .resolve_range(&source)
        .expect_err("sources are not ranges");
    assert!(matches!(err, SceneError::WrongModelKind { .. }));
}

#[test]
fn y_range_is_resolved_independently() {
    let mut plot = scatter_plot(
        &[(vec![0.0, 1.0], vec![10.0, 20.0])],
        DataRange1d::new(),
    );

    let y = plot
        .document
        .resolve_range(&plot.y_range)
        .expect("resolve")
        .expect("extent");
    assert_relative_eq!(y.start(), 9.5, epsilon = 1e-12);
    assert_relative_eq!(y.end(), 20.5, epsilon = 1e-12);
}

#[test]
fn non_finite_values_never_reach_the_range() {
    let mut plot = scatter_plot(
        &[(
            vec![f64::NAN, 1.0, f64::INFINITY, 4.0, f64::NEG_INFINITY],
            vec![0.0, 1.0, 2.0, 3.0, 4.0],
        )],
        DataRange1d::new().with_padding(0.0, PaddingUnits::Percent),
    );

    assert_eq!(resolved_x(&mut plot), (1.0, 4.0));
}

#[test]
fn all_nan_column_leaves_the_range_unresolved() {
    let mut plot = scatter_plot(
        &[(vec![f64::NAN, f64::NAN], vec![0.0, 1.0])],
        DataRange1d::new(),
    );

    assert!(
        plot.document
            .resolve_range(&plot.x_range)
            .expect("resolve")
            .is_none()
    );
}
