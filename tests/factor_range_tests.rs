use approx::assert_relative_eq;
use chart_scene::core::{
    Column, ColumnDataSource, DataRange1d, Factor, FactorRange, Glyph, GlyphRenderer, ModelArgs,
    PaddingUnits, PropertyContainer, PropertyValue,
};
use chart_scene::document::DiagnosticCode;
use chart_scene::{Document, SceneError};

#[test]
fn flat_factors_are_centered_on_half_units() {
    let mapping = FactorRange::new(["A", "B", "C", "D"]).expect("range").mapping();

    assert_eq!(mapping.coordinate(&Factor::from("A")), Some(0.5));
    assert_eq!(mapping.coordinate(&Factor::from("D")), Some(3.5));
    assert_eq!((mapping.start, mapping.end), (0.0, 4.0));
}

#[test]
fn percent_range_padding_is_split_across_both_ends() {
    let mapping = FactorRange::new(["A", "B", "C", "D"])
        .expect("range")
        .with_range_padding(0.1, PaddingUnits::Percent)
        .mapping();

    assert_relative_eq!(mapping.start, -0.2, epsilon = 1e-12);
    assert_relative_eq!(mapping.end, 4.2, epsilon = 1e-12);
}

#[test]
fn absolute_range_padding_is_added_to_each_end() {
    let mapping = FactorRange::new(["A", "B", "C", "D"])
        .expect("range")
        .with_range_padding(1.0, PaddingUnits::Absolute)
        .mapping();

    assert_eq!((mapping.start, mapping.end), (-1.0, 5.0));
}

#[test]
fn factor_padding_spaces_neighbouring_factors() {
    let mapping = FactorRange::new(["a", "b", "c"])
        .expect("range")
        .with_paddings(0.1, 0.0, 0.0)
        .mapping();

    let centers: Vec<f64> = ["a", "b", "c"]
        .into_iter()
        .map(|label| mapping.coordinate(&Factor::from(label)).expect("known factor"))
        .collect();
    assert_relative_eq!(centers[0], 0.5, epsilon = 1e-12);
    assert_relative_eq!(centers[1], 1.6, epsilon = 1e-12);
    assert_relative_eq!(centers[2], 2.7, epsilon = 1e-12);
    assert_relative_eq!(mapping.end, 3.2, epsilon = 1e-12);
}

#[test]
fn three_level_factors_nest_group_and_subgroup_padding() {
    let mapping = FactorRange::new([
        ("a", "x", "1"),
        ("a", "x", "2"),
        ("a", "y", "1"),
        ("b", "x", "1"),
    ])
    .expect("range")
    .with_paddings(0.0, 0.5, 1.0)
    .mapping();

    assert_eq!(mapping.coordinate(&Factor::from(("a", "x", "2"))), Some(1.5));
    assert_eq!(mapping.coordinate(&Factor::from(("a", "y", "1"))), Some(3.0));
    assert_eq!(mapping.coordinate(&Factor::from(("b", "x", "1"))), Some(5.0));
    assert_eq!(mapping.mid_coordinate("a", "x"), Some(1.0));
    assert_eq!(mapping.end, 5.5);

    let mid = PropertyValue::List(vec!["a".into(), "x".into()]);
    assert_eq!(mapping.synthetic(&mid), 1.0);
}

#[test]
fn duplicate_factors_are_reported_and_collapsed() {
    let mapping = FactorRange::new(["a", "b", "a"]).expect("range").mapping();

    assert_eq!(mapping.factors(), &[Factor::from("a"), Factor::from("b")]);
    assert_eq!(mapping.duplicates(), &[Factor::from("a")]);
    assert_eq!(mapping.end, 2.0);
}

#[test]
fn mixed_nesting_levels_are_rejected() {
    let mut range = FactorRange::default();
    let err = range
        .apply(
            "factors",
            PropertyValue::List(vec![
                "a".into(),
                PropertyValue::List(vec!["b".into(), "c".into()]),
            ]),
        )
        .expect_err("mixed levels must fail");

    assert!(matches!(err, SceneError::Validation { .. }));
}

#[test]
fn positional_scalars_become_factors() {
    let range = FactorRange::from_args(&ModelArgs::new().arg("x").arg(2.0)).expect("range");

    assert_eq!(range.factors, vec![Factor::from("x"), Factor::from("2")]);
}

#[test]
fn positional_list_is_ambiguous() {
    let err = FactorRange::from_args(
        &ModelArgs::new().arg(PropertyValue::List(vec!["a".into(), "b".into()])),
    )
    .expect_err("list positional must fail");

    assert!(matches!(err, SceneError::InvalidArgument { model: "FactorRange", .. }));
}

#[test]
fn positional_and_factors_keyword_conflict() {
    let err = FactorRange::from_args(
        &ModelArgs::new()
            .arg("a")
            .kwarg("factors", PropertyValue::List(vec!["b".into()])),
    )
    .expect_err("both forms must fail");

    assert!(matches!(err, SceneError::InvalidArgument { .. }));
}

#[test]
fn empty_factor_range_derives_factors_from_plotted_data() {
    let mut document = Document::new();
    let source = document
        .add(
            ColumnDataSource::from_columns([
                ("fruit", Column::from(vec!["apple", "pear", "apple", "fig"])),
                ("count", Column::from(vec![3.0, 1.0, 4.0, 2.0])),
            ])
            .expect("source"),
        )
        .expect("add source");
    let glyph = document.add(Glyph::vbar("fruit", 0.9, "count")).expect("add glyph");
    let renderer = document
        .add(GlyphRenderer::new(source, glyph))
        .expect("add renderer");
    let x_range = document.add(FactorRange::default()).expect("add x range");
    let y_range = document.add(DataRange1d::new()).expect("add y range");
    let mut plot = document
        .plot_template()
        .with_ranges(x_range.clone(), y_range.clone());
    plot.renderers.push(renderer);
    document.add(plot).expect("add plot");

    let resolved = document
        .resolve_range(&x_range)
        .expect("resolve")
        .expect("factors derived");
    let mapping = resolved.factors().expect("categorical");
    assert_eq!(
        mapping.factors(),
        &[Factor::from("apple"), Factor::from("pear"), Factor::from("fig")]
    );
    assert_eq!(resolved.synthetic(&"fig".into()), 2.5);

    let y = document
        .resolve_range(&y_range)
        .expect("resolve")
        .expect("numeric extent");
    assert_relative_eq!(y.start(), -0.2, epsilon = 1e-12);
    assert_relative_eq!(y.end(), 4.2, epsilon = 1e-12);
}

#[test]
fn factor_range_without_any_data_stays_unresolved() {
    let mut document = Document::new();
    let range = document.add(FactorRange::default()).expect("add");

    assert!(document.resolve_range(&range).expect("resolve").is_none());
    assert!(
        document
            .validate()
            .iter()
            .any(|diagnostic| diagnostic.code == DiagnosticCode::EmptyFactorRange)
    );
}

#[test]
fn validation_flags_duplicate_explicit_factors() {
    let mut document = Document::new();
    let range = document
        .add(FactorRange::new(["a", "a"]).expect("range"))
        .expect("add");

    let diagnostics = document.validate();
    let duplicate = diagnostics
        .iter()
        .find(|diagnostic| diagnostic.code == DiagnosticCode::DuplicateFactors)
        .expect("duplicate reported");
    assert_eq!(duplicate.model, range);
    assert_eq!(duplicate.code.code(), "E-1001");
}
