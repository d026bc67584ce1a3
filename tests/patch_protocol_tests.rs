use std::sync::{Arc, Mutex};

use chart_scene::core::{
    Column, ColumnData, ColumnDataSource, ColumnPatch, ColumnPatches, DataRange1d, Glyph,
    GlyphRenderer, ModelId, PaddingUnits, PropertyValue, Range1d,
};
use chart_scene::document::{
    ChangeKind, ChangeOrigin, PatchEvent, PatchInbox, PatchMessage, PatchOutbox,
};
use chart_scene::{Document, SceneError};
use indexmap::IndexMap;
use serde_json::json;

struct Replicas {
    local: Document,
    remote: Document,
    range: ModelId,
    source: ModelId,
    plot: ModelId,
}

fn replicas() -> Replicas {
    let mut local = Document::new();
    let source = local
        .add(
            ColumnDataSource::from_columns([("x", vec![1.0, 2.0, 3.0]), ("y", vec![3.0, 1.0, 2.0])])
                .expect("source"),
        )
        .expect("source");
    let glyph = local.add(Glyph::line("x", "y")).expect("glyph");
    let renderer = local
        .add(GlyphRenderer::new(source.clone(), glyph))
        .expect("renderer");
    let range = local.add(Range1d::new(0.0, 10.0).expect("range")).expect("range");
    let y_range = local.add(Range1d::new(0.0, 5.0).expect("range")).expect("range");
    let mut plot = local.plot_template().with_ranges(range.clone(), y_range);
    plot.renderers.push(renderer);
    let plot = local.add(plot).expect("plot");
    local.add_root(&plot).expect("root");

    let remote = Document::from_json(&local.to_json().expect("json")).expect("remote");
    local.take_patch();
    local.mark_synced();

    Replicas {
        local,
        remote,
        range,
        source,
        plot,
    }
}

fn one_row(x: f64, y: f64) -> ColumnData {
    let mut rows: ColumnData = IndexMap::new();
    rows.insert("x".to_owned(), Column::from(vec![x]));
    rows.insert("y".to_owned(), Column::from(vec![y]));
    rows
}

#[test]
fn property_change_reaches_the_remote_replica() {
    let mut replicas = replicas();
    replicas
        .local
        .set(&replicas.range, "start", 5.0)
        .expect("set");

    let patch = replicas.local.take_patch().expect("pending patch");
    assert!(patch.references.is_empty());
    assert_eq!(
        patch.events,
        vec![PatchEvent::PropertyChanged {
            id: replicas.range.clone(),
            attr: "start".to_owned(),
            new: json!(5.0),
        }]
    );

    replicas.remote.apply_patch(&patch).expect("apply");
    assert_eq!(
        replicas.remote.get(&replicas.range, "start").expect("start"),
        PropertyValue::Number(5.0)
    );
}

#[test]
fn unchanged_value_emits_nothing() {
    let mut replicas = replicas();
    replicas
        .local
        .set(&replicas.range, "start", 0.0)
        .expect("set");

    assert!(replicas.local.take_patch().is_none());
}

#[test]
fn applied_patches_are_not_echoed_back() {
    let mut replicas = replicas();
    replicas
        .local
        .set(&replicas.range, "end", 20.0)
        .expect("set");
    let patch = replicas.local.take_patch().expect("patch");

    replicas.remote.apply_patch(&patch).expect("apply");

    assert!(replicas.remote.take_patch().is_none());
}

#[test]
fn new_models_travel_with_the_event_that_references_them() {
    let mut replicas = replicas();
    let extra_source = replicas
        .local
        .add(ColumnDataSource::from_columns([("x", vec![7.0]), ("y", vec![8.0])]).expect("source"))
        .expect("source");
    let glyph = replicas.local.add(Glyph::scatter("x", "y")).expect("glyph");
    let renderer = replicas
        .local
        .add(GlyphRenderer::new(extra_source.clone(), glyph.clone()))
        .expect("renderer");
    let mut renderers = match replicas
        .local
        .get(&replicas.plot, "renderers")
        .expect("renderers")
    {
        PropertyValue::List(items) => items,
        other => panic!("unexpected renderers value: {other:?}"),
    };
    renderers.push(PropertyValue::Ref(renderer.clone()));
    replicas
        .local
        .set(&replicas.plot, "renderers", PropertyValue::List(renderers))
        .expect("set renderers");

    let patch = replicas.local.take_patch().expect("patch");
    let mut shipped: Vec<&ModelId> = patch.references.iter().map(|model| &model.id).collect();
    shipped.sort();
    let mut expected = vec![&renderer, &extra_source, &glyph];
    expected.sort();
    assert_eq!(shipped, expected);

    replicas.remote.apply_patch(&patch).expect("apply");
    assert!(replicas.remote.contains(&renderer));
    assert!(replicas.remote.contains(&extra_source));

    replicas.local.set(&renderer, "visible", false).expect("hide");
    let second = replicas.local.take_patch().expect("second patch");
    assert!(second.references.is_empty());
}

#[test]
fn held_property_changes_collapse_to_the_latest_value() {
    let mut replicas = replicas();
    replicas.local.hold();
    for start in [1.0, 2.0, 3.0] {
        replicas
            .local
            .set(&replicas.range, "start", start)
            .expect("set");
    }
    assert!(replicas.local.take_patch().is_none());

    replicas.local.unhold();
    let patch = replicas.local.take_patch().expect("patch");

    assert_eq!(patch.events.len(), 1);
    assert!(matches!(
        &patch.events[0],
        PatchEvent::PropertyChanged { new, .. } if *new == json!(3.0)
    ));
}

#[test]
fn held_streams_are_concatenated() {
    let mut replicas = replicas();
    replicas.local.hold();
    replicas
        .local
        .stream_source(&replicas.source, one_row(4.0, 4.0), None)
        .expect("stream");
    replicas
        .local
        .stream_source(&replicas.source, one_row(5.0, 5.0), None)
        .expect("stream");
    replicas.local.unhold();

    let patch = replicas.local.take_patch().expect("patch");
    assert_eq!(patch.events.len(), 1);
    let PatchEvent::Stream { data, .. } = &patch.events[0] else {
        panic!("expected a stream event");
    };
    assert_eq!(data["x"], json!([4.0, 5.0]));

    replicas.remote.apply_patch(&patch).expect("apply");
    let PropertyValue::Map(columns) = replicas
        .remote
        .get(&replicas.source, "data")
        .expect("data")
    else {
        panic!("data must be a map");
    };
    assert_eq!(
        columns["x"],
        PropertyValue::List(vec![1.0.into(), 2.0.into(), 3.0.into(), 4.0.into(), 5.0.into()])
    );
}

#[test]
fn data_replacement_supersedes_held_streams() {
    let mut replicas = replicas();
    replicas.local.hold();
    replicas
        .local
        .stream_source(&replicas.source, one_row(4.0, 4.0), None)
        .expect("stream");
    replicas
        .local
        .replace_source_data(&replicas.source, one_row(9.0, 9.0))
        .expect("replace");
    replicas.local.unhold();

    let patch = replicas.local.take_patch().expect("patch");

    assert_eq!(patch.events.len(), 1);
    assert!(matches!(patch.events[0], PatchEvent::ColumnDataChanged { .. }));
}

fn single_column(name: &str, values: &[f64]) -> PropertyValue {
    let mut columns = IndexMap::new();
    columns.insert(
        name.to_owned(),
        PropertyValue::List(values.iter().map(|&v| v.into()).collect()),
    );
    PropertyValue::Map(columns)
}

#[test]
fn data_property_change_supersedes_held_streams_in_between() {
    let mut replicas = replicas();
    replicas.local.hold();
    replicas
        .local
        .set(&replicas.source, "data", single_column("z", &[1.0]))
        .expect("replace with z");
    let mut rows: ColumnData = IndexMap::new();
    rows.insert("z".to_owned(), Column::from(vec![2.0]));
    replicas
        .local
        .stream_source(&replicas.source, rows, None)
        .expect("stream z");
    replicas
        .local
        .set(&replicas.source, "data", single_column("w", &[5.0]))
        .expect("replace with w");
    replicas.local.unhold();

    let patch = replicas.local.take_patch().expect("patch");
    assert_eq!(patch.events.len(), 1);
    replicas.remote.apply_patch(&patch).expect("apply");

    assert_eq!(
        replicas.remote.get(&replicas.source, "data").expect("remote data"),
        single_column("w", &[5.0])
    );
}

#[test]
fn plot_added_remotely_refreshes_a_shared_data_range() {
    let mut local = Document::new();
    let first = local
        .add(ColumnDataSource::from_columns([("x", vec![0.0, 2.0])]).expect("source"))
        .expect("source");
    let glyph = local.add(Glyph::scatter("x", 0.0)).expect("glyph");
    let renderer = local
        .add(GlyphRenderer::new(first, glyph.clone()))
        .expect("renderer");
    let x_range = local
        .add(DataRange1d::new().with_padding(0.0, PaddingUnits::Percent))
        .expect("x range");
    let y_range = local.add(Range1d::new(0.0, 1.0).expect("y")).expect("y range");
    let mut plot = local
        .plot_template()
        .with_ranges(x_range.clone(), y_range.clone());
    plot.renderers.push(renderer);
    let plot = local.add(plot).expect("plot");
    local.add_root(&plot).expect("root");

    let mut remote = Document::from_json(&local.to_json().expect("json")).expect("remote");
    local.take_patch();
    local.mark_synced();
    let cached = remote
        .resolve_range(&x_range)
        .expect("resolve")
        .expect("extent");
    assert_eq!((cached.start(), cached.end()), (0.0, 2.0));

    let second = local
        .add(ColumnDataSource::from_columns([("x", vec![100.0])]).expect("source"))
        .expect("source");
    let renderer = local
        .add(GlyphRenderer::new(second, glyph))
        .expect("renderer");
    let mut shared = local.plot_template().with_ranges(x_range.clone(), y_range);
    shared.renderers.push(renderer);
    let shared = local.add(shared).expect("second plot");
    local.add_root(&shared).expect("second root");
    remote
        .apply_patch(&local.take_patch().expect("patch"))
        .expect("apply");

    let expected = local
        .resolve_range(&x_range)
        .expect("resolve local")
        .expect("extent");
    let refreshed = remote
        .resolve_range(&x_range)
        .expect("resolve remote")
        .expect("extent");
    assert_eq!((expected.start(), expected.end()), (0.0, 100.0));
    assert_eq!((refreshed.start(), refreshed.end()), (0.0, 100.0));
}

#[test]
fn column_patches_apply_on_the_remote_side() {
    let mut replicas = replicas();
    let mut patches = ColumnPatches::new();
    patches.insert(
        "y".to_owned(),
        vec![
            ColumnPatch::index(0, 30.0),
            ColumnPatch::slice(1, 3, vec![10.0.into(), 20.0.into()]),
        ],
    );
    replicas
        .local
        .patch_source(&replicas.source, &patches)
        .expect("patch");

    let message = replicas.local.take_patch().expect("message");
    let wire = message.to_json().expect("json");
    let decoded = PatchMessage::from_json(&wire).expect("decode");
    assert_eq!(decoded, message);

    replicas.remote.apply_patch(&decoded).expect("apply");
    assert_eq!(
        replicas.remote.get(&replicas.source, "data").expect("remote data"),
        replicas.local.get(&replicas.source, "data").expect("local data")
    );
}

#[test]
fn failing_event_leaves_the_remote_untouched() {
    let mut replicas = replicas();
    let message = PatchMessage {
        references: Vec::new(),
        events: vec![
            PatchEvent::PropertyChanged {
                id: replicas.range.clone(),
                attr: "start".to_owned(),
                new: json!(4.0),
            },
            PatchEvent::PropertyChanged {
                id: replicas.range.clone(),
                attr: "no_such_property".to_owned(),
                new: json!(1.0),
            },
        ],
    };

    let err = replicas
        .remote
        .apply_patch(&message)
        .expect_err("unknown property");

    assert!(matches!(err, SceneError::UnknownProperty { .. }));
    assert_eq!(
        replicas.remote.get(&replicas.range, "start").expect("start"),
        PropertyValue::Number(0.0)
    );
}

#[test]
fn event_for_an_unknown_model_is_rejected() {
    let mut replicas = replicas();
    let message = PatchMessage {
        references: Vec::new(),
        events: vec![PatchEvent::RootAdded {
            id: ModelId::from("p9999"),
        }],
    };

    let err = replicas.remote.apply_patch(&message).expect_err("unknown root");

    assert!(matches!(err, SceneError::UnresolvedReference(_)));
    assert_eq!(replicas.remote.roots(), &[replicas.plot.clone()]);
}

#[test]
fn title_and_roots_are_synchronized() {
    let mut replicas = replicas();
    replicas.local.set_title("Quarterly");
    let extra = replicas
        .local
        .add(Range1d::new(1.0, 2.0).expect("range"))
        .expect("range");
    replicas.local.add_root(&extra).expect("root");
    assert!(replicas.local.remove_root(&replicas.plot));

    let patch = replicas.local.take_patch().expect("patch");
    replicas.remote.apply_patch(&patch).expect("apply");

    assert_eq!(replicas.remote.title(), "Quarterly");
    assert_eq!(replicas.remote.roots(), &[extra]);
}

#[test]
fn remote_changes_notify_listeners_as_remote() {
    let mut replicas = replicas();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    replicas
        .remote
        .on_change("recorder", move |change, _| {
            if let Ok(mut seen) = sink.lock() {
                seen.push((change.property.clone(), change.kind, change.origin));
            }
            Vec::new()
        })
        .expect("listener");

    replicas
        .local
        .stream_source(&replicas.source, one_row(4.0, 4.0), Some(3))
        .expect("stream");
    replicas
        .local
        .set(&replicas.range, "end", 12.0)
        .expect("set");
    let patch = replicas.local.take_patch().expect("patch");
    replicas.remote.apply_patch(&patch).expect("apply");

    let seen = seen.lock().expect("seen");
    assert_eq!(
        *seen,
        vec![
            ("data".to_owned(), ChangeKind::Streamed, ChangeOrigin::Remote),
            ("end".to_owned(), ChangeKind::Property, ChangeOrigin::Remote),
        ]
    );
}

#[test]
fn malformed_patch_json_is_a_protocol_error() {
    let err = PatchMessage::from_json(r#"{"events": [{"event": "explode"}]}"#)
        .expect_err("unknown event");

    assert!(matches!(err, SceneError::MalformedPatch(_)));
}

#[test]
fn inbox_applies_patches_strictly_in_sequence() {
    let mut replicas = replicas();
    let mut outbox = PatchOutbox::new();
    let mut inbox = PatchInbox::new();

    replicas
        .local
        .set(&replicas.range, "start", 1.0)
        .expect("set");
    assert_eq!(outbox.collect_from(&mut replicas.local), Some(0));
    replicas
        .local
        .set(&replicas.range, "start", 2.0)
        .expect("set");
    assert_eq!(outbox.collect_from(&mut replicas.local), Some(1));
    assert_eq!(outbox.collect_from(&mut replicas.local), None);

    let first = outbox.dispatch().expect("first");
    let second = outbox.dispatch().expect("second");

    let err = inbox
        .receive(&mut replicas.remote, &second)
        .expect_err("out of order");
    assert!(matches!(
        err,
        SceneError::OutOfOrderPatch {
            expected: 0,
            actual: 1
        }
    ));

    inbox.receive(&mut replicas.remote, &first).expect("first");
    inbox.receive(&mut replicas.remote, &second).expect("second");
    assert_eq!(inbox.expected(), 2);
    assert_eq!(
        replicas.remote.get(&replicas.range, "start").expect("start"),
        PropertyValue::Number(2.0)
    );
}

#[test]
fn cancelled_patch_leaves_a_gap_until_reset() {
    let mut replicas = replicas();
    let mut outbox = PatchOutbox::new();
    let mut inbox = PatchInbox::new();
    for start in [1.0, 2.0, 3.0] {
        replicas
            .local
            .set(&replicas.range, "start", start)
            .expect("set");
        outbox.collect_from(&mut replicas.local);
    }

    assert!(outbox.cancel(1));
    assert!(!outbox.cancel(1));
    assert_eq!(outbox.pending(), 2);

    let first = outbox.dispatch().expect("first");
    let third = outbox.dispatch().expect("third");
    inbox.receive(&mut replicas.remote, &first).expect("first");
    assert!(inbox.receive(&mut replicas.remote, &third).is_err());

    inbox.reset(third.sequence);
    inbox.receive(&mut replicas.remote, &third).expect("after reset");
    assert_eq!(
        replicas.remote.get(&replicas.range, "start").expect("start"),
        PropertyValue::Number(3.0)
    );
}

#[test]
fn rejected_patch_does_not_advance_the_inbox() {
    let mut replicas = replicas();
    let mut outbox = PatchOutbox::new();
    let mut inbox = PatchInbox::new();
    outbox.push(PatchMessage {
        references: Vec::new(),
        events: vec![PatchEvent::RootRemoved {
            id: replicas.plot.clone(),
        }],
    });
    let sequence = outbox.push(PatchMessage {
        references: Vec::new(),
        events: vec![PatchEvent::PropertyChanged {
            id: replicas.range.clone(),
            attr: "start".to_owned(),
            new: json!("not a number"),
        }],
    });
    assert_eq!(sequence, 1);

    let first = outbox.dispatch().expect("first");
    let bad = outbox.dispatch().expect("bad");
    inbox.receive(&mut replicas.remote, &first).expect("first");
    assert!(inbox.receive(&mut replicas.remote, &bad).is_err());

    assert_eq!(inbox.expected(), 1);
    assert!(replicas.remote.roots().is_empty());
}
