use approx::assert_relative_eq;
use chart_scene::core::{
    ColumnDataSource, DataRange1d, Glyph, GlyphRenderer, ModelId, PropertyValue, Range1d,
};
use chart_scene::document::{WIRE_VERSION, WireDocument};
use chart_scene::{Document, DocumentConfig, SceneError};
use serde_json::{Value, json};

fn scatter_document() -> (Document, ModelId) {
    let mut document = Document::new();
    let source = document
        .add(
            ColumnDataSource::from_columns([("x", vec![1.0, 2.0, 3.0]), ("y", vec![4.0, 5.0, 6.0])])
                .expect("source"),
        )
        .expect("source");
    let glyph = document
        .add(Glyph::scatter("x", "y").with_fill_color("#1f77b4"))
        .expect("glyph");
    let renderer = document
        .add(GlyphRenderer::new(source, glyph))
        .expect("renderer");
    let mut plot = document.plot_template().with_title("prices");
    plot.renderers.push(renderer);
    let plot = document.add_plot_with_defaults(plot).expect("plot");
    document.add_root(&plot).expect("root");
    (document, plot)
}

#[test]
fn range_with_source_serializes_both_models_once() {
    let mut document = Document::new();
    let source = document
        .add(ColumnDataSource::from_columns([("x", vec![1.0, 2.0, 3.0])]).expect("source"))
        .expect("source");
    let range = document
        .add(DataRange1d::new().with_sources(vec![source.clone(), source.clone()]))
        .expect("range");
    document.add_root(&range).expect("root");

    let wire = document.to_wire();
    assert_eq!(wire.version, WIRE_VERSION);
    assert_eq!(wire.references.len(), 2);
    let range_wire = wire
        .references
        .iter()
        .find(|model| model.id == range)
        .expect("range on the wire");
    assert_eq!(range_wire.type_name, "DataRange1d");
    assert_eq!(
        range_wire.attributes.get("sources"),
        Some(&json!([{ "ref": source.as_str() }, { "ref": source.as_str() }]))
    );

    let json = document.to_json().expect("json");
    let mut restored = Document::from_json(&json).expect("restore");
    let resolved = restored
        .resolve_range(&range)
        .expect("resolve")
        .expect("extent");
    assert_relative_eq!(resolved.start(), 0.9, epsilon = 1e-12);
    assert_relative_eq!(resolved.end(), 3.1, epsilon = 1e-12);
}

#[test]
fn plot_graph_round_trips_with_identical_ids_and_attributes() {
    let (document, plot) = scatter_document();
    let json = document.to_json().expect("json");

    let restored = Document::from_json(&json).expect("restore");

    assert_eq!(restored.roots(), &[plot.clone()]);
    assert_eq!(restored.model_count(), document.model_count());
    assert_eq!(restored.to_wire(), document.to_wire());
    assert_eq!(
        restored.get(&plot, "title").expect("title"),
        PropertyValue::from("prices")
    );
}

#[test]
fn tool_plot_cycle_survives_the_round_trip() {
    let (document, plot) = scatter_document();
    let tools = match document.get(&plot, "tools").expect("tools") {
        PropertyValue::List(items) => items,
        other => panic!("unexpected tools value: {other:?}"),
    };
    assert!(!tools.is_empty());

    let restored = Document::from_json(&document.to_json().expect("json")).expect("restore");
    for tool in tools {
        let PropertyValue::Ref(tool) = tool else {
            panic!("tools must be references");
        };
        assert_eq!(
            restored.get(&tool, "plot").expect("plot"),
            PropertyValue::Ref(plot.clone())
        );
    }
}

#[test]
fn restored_document_allocates_fresh_ids() {
    let (document, _) = scatter_document();
    let mut restored = Document::from_json(&document.to_json().expect("json")).expect("restore");

    let id = restored.add(Range1d::new(0.0, 1.0).expect("range")).expect("add");

    assert!(!document.contains(&id));
}

#[test]
fn names_travel_with_their_models() {
    let mut document = Document::new();
    let range = document
        .add_named("x_axis_range", Range1d::new(0.0, 5.0).expect("range"))
        .expect("add");
    document.add_root(&range).expect("root");

    let restored = Document::from_json(&document.to_json().expect("json")).expect("restore");

    let named = restored.select_by_name("x_axis_range");
    assert_eq!(named.len(), 1);
    assert_eq!(named[0].id, range);
}

#[test]
fn non_finite_numbers_are_encoded_explicitly() {
    let mut document = Document::new();
    let source = document
        .add(ColumnDataSource::from_columns([("x", vec![1.0, f64::NAN])]).expect("source"))
        .expect("source");
    document.add_root(&source).expect("root");

    let wire: Value = serde_json::from_str(&document.to_json().expect("json")).expect("value");
    assert_eq!(
        wire["references"][0]["attributes"]["data"]["x"][1],
        json!({ "type": "number", "value": "nan" })
    );

    let restored = Document::from_json(&wire.to_string()).expect("restore");
    let data = restored.get(&source, "data").expect("data");
    let PropertyValue::Map(columns) = data else {
        panic!("data must be a map");
    };
    let PropertyValue::List(xs) = &columns["x"] else {
        panic!("column must be a list");
    };
    assert!(matches!(xs[1], PropertyValue::Number(value) if value.is_nan()));
}

#[test]
fn unknown_model_type_is_rejected() {
    let input = json!({
        "version": WIRE_VERSION,
        "roots": ["p1"],
        "references": [{ "type": "Teapot", "id": "p1", "attributes": {} }]
    });

    let err = Document::from_json(&input.to_string()).expect_err("unknown type");

    assert!(matches!(err, SceneError::UnknownModelType(name) if name == "Teapot"));
}

#[test]
fn dangling_reference_is_rejected() {
    let input = json!({
        "version": WIRE_VERSION,
        "roots": ["p1"],
        "references": [{
            "type": "DataRange1d",
            "id": "p1",
            "attributes": { "sources": [{ "ref": "p404" }] }
        }]
    });

    let err = Document::from_json(&input.to_string()).expect_err("dangling ref");

    assert!(matches!(err, SceneError::UnresolvedReference(id) if id.as_str() == "p404"));
}

#[test]
fn reference_of_the_wrong_kind_is_rejected() {
    let input = json!({
        "version": WIRE_VERSION,
        "roots": ["p1"],
        "references": [
            { "type": "Range1d", "id": "p2", "attributes": {} },
            { "type": "DataRange1d", "id": "p1", "attributes": { "sources": [{ "ref": "p2" }] } }
        ]
    });

    assert!(Document::from_json(&input.to_string()).is_err());
}

#[test]
fn missing_root_is_rejected() {
    let input = json!({ "version": WIRE_VERSION, "roots": ["p9"], "references": [] });

    let err = Document::from_json(&input.to_string()).expect_err("missing root");

    assert!(matches!(err, SceneError::UnresolvedReference(_)));
}

#[test]
fn unsupported_version_is_rejected() {
    let wire = WireDocument {
        version: "99".to_owned(),
        title: String::new(),
        roots: Vec::new(),
        references: Vec::new(),
    };

    let err = Document::from_wire(wire, DocumentConfig::default()).expect_err("version");

    assert!(matches!(err, SceneError::InvalidData(_)));
}

#[test]
fn malformed_json_surfaces_as_json_error() {
    let err = Document::from_json("{ not json").expect_err("malformed");

    assert!(matches!(err, SceneError::Json(_)));
}
