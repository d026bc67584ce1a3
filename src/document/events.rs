//! Incremental patch protocol.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::source::{Column, ColumnData, ColumnPatch, ColumnPatches, PatchTarget};
use crate::core::{ModelId, PropertyValue};
use crate::document::serialization::WireModel;
use crate::error::{SceneError, SceneResult};

/// One delta against an existing document graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum PatchEvent {
    PropertyChanged {
        id: ModelId,
        attr: String,
        new: Value,
    },
    /// In-place replacement of column entries: `column -> [[target, value], ...]`.
    Patch {
        id: ModelId,
        patches: IndexMap<String, Vec<(PatchTarget, Value)>>,
    },
    Stream {
        id: ModelId,
        data: IndexMap<String, Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        rollover: Option<usize>,
    },
    ColumnDataChanged {
        id: ModelId,
        data: IndexMap<String, Value>,
    },
    RootAdded {
        id: ModelId,
    },
    RootRemoved {
        id: ModelId,
    },
    TitleChanged {
        title: String,
    },
}

impl PatchEvent {
    pub(crate) fn property_changed(id: &ModelId, attr: &str, new: &PropertyValue) -> Self {
        Self::PropertyChanged {
            id: id.clone(),
            attr: attr.to_owned(),
            new: new.to_wire(),
        }
    }

    pub(crate) fn patch(id: &ModelId, patches: &ColumnPatches) -> Self {
        Self::Patch {
            id: id.clone(),
            patches: patches
                .iter()
                .map(|(column, entries)| {
                    let entries = entries
                        .iter()
                        .map(|entry| (entry.target, entry.value.to_wire()))
                        .collect();
                    (column.clone(), entries)
                })
                .collect(),
        }
    }

    pub(crate) fn stream(id: &ModelId, rows: &ColumnData, rollover: Option<usize>) -> Self {
        Self::Stream {
            id: id.clone(),
            data: column_data_to_wire(rows),
            rollover,
        }
    }

    pub(crate) fn column_data_changed(id: &ModelId, data: &ColumnData) -> Self {
        Self::ColumnDataChanged {
            id: id.clone(),
            data: column_data_to_wire(data),
        }
    }

    /// Model the event targets, if any.
    #[must_use]
    pub fn target(&self) -> Option<&ModelId> {
        match self {
            Self::PropertyChanged { id, .. }
            | Self::Patch { id, .. }
            | Self::Stream { id, .. }
            | Self::ColumnDataChanged { id, .. }
            | Self::RootAdded { id }
            | Self::RootRemoved { id } => Some(id),
            Self::TitleChanged { .. } => None,
        }
    }

    /// Models referenced by values carried in the event.
    #[must_use]
    pub fn referenced_models(&self) -> Vec<ModelId> {
        let mut refs = Vec::new();
        match self {
            Self::PropertyChanged { new, .. } => {
                if let Ok(value) = PropertyValue::from_wire(new) {
                    value.collect_refs(&mut refs);
                }
            }
            Self::RootAdded { id } => refs.push(id.clone()),
            _ => {}
        }
        refs
    }
}

pub(crate) fn column_data_to_wire(data: &ColumnData) -> IndexMap<String, Value> {
    data.iter()
        .map(|(name, column)| (name.clone(), column.to_values().to_wire()))
        .collect()
}

pub(crate) fn column_data_from_wire(data: &IndexMap<String, Value>) -> SceneResult<ColumnData> {
    data.iter()
        .map(|(name, values)| {
            let values = PropertyValue::from_wire(values)?;
            let column = Column::from_values(values.expect_list(name)?, name)?;
            Ok((name.clone(), column))
        })
        .collect()
}

pub(crate) fn patches_from_wire(
    patches: &IndexMap<String, Vec<(PatchTarget, Value)>>,
) -> SceneResult<ColumnPatches> {
    patches
        .iter()
        .map(|(column, entries)| {
            let entries = entries
                .iter()
                .map(|(target, value)| {
                    Ok(ColumnPatch {
                        target: *target,
                        value: PropertyValue::from_wire(value)?,
                    })
                })
                .collect::<SceneResult<Vec<_>>>()?;
            Ok((column.clone(), entries))
        })
        .collect()
}

/// True for events that read or replace the column data of source `id`.
fn touches_data(event: &PatchEvent, id: &ModelId) -> bool {
    match event {
        PatchEvent::Patch { id: other, .. }
        | PatchEvent::Stream { id: other, .. }
        | PatchEvent::ColumnDataChanged { id: other, .. } => other == id,
        PatchEvent::PropertyChanged { id: other, attr, .. } => other == id && attr == "data",
        _ => false,
    }
}

/// Adds `event` to a held buffer, merging it with earlier events where the
/// result is equivalent.
///
/// A repeated property change replaces the earlier one only when no event
/// for the same model sits between them. A stream directly following a
/// stream into the same source with the same rollover is concatenated onto
/// it. A full data replacement, as an event or as a `data` property change,
/// supersedes earlier data events of the same source.
pub(crate) fn combine(buffer: &mut Vec<PatchEvent>, event: PatchEvent) {
    match &event {
        PatchEvent::PropertyChanged { id, attr, .. } if attr == "data" => {
            buffer.retain(|existing| !touches_data(existing, id));
        }
        PatchEvent::PropertyChanged { id, attr, .. } => {
            let earlier = buffer.iter().rposition(|existing| {
                matches!(
                    existing,
                    PatchEvent::PropertyChanged { id: other, attr: other_attr, .. }
                        if other == id && other_attr == attr
                )
            });
            if let Some(index) = earlier {
                let interleaved = buffer[index + 1..]
                    .iter()
                    .any(|existing| existing.target() == Some(id));
                if !interleaved {
                    buffer.remove(index);
                }
            }
        }
        PatchEvent::Stream { id, data, rollover } => {
            if let Some(PatchEvent::Stream {
                id: last_id,
                data: last_data,
                rollover: last_rollover,
            }) = buffer.last_mut()
            {
                if last_id == id
                    && last_rollover == rollover
                    && last_data.len() == data.len()
                    && last_data.keys().all(|key| data.contains_key(key))
                {
                    for (name, values) in data {
                        if let (Some(Value::Array(target)), Value::Array(extra)) =
                            (last_data.get_mut(name), values)
                        {
                            target.extend(extra.iter().cloned());
                        }
                    }
                    return;
                }
            }
        }
        PatchEvent::ColumnDataChanged { id, .. } => {
            buffer.retain(|existing| !touches_data(existing, id));
        }
        PatchEvent::TitleChanged { .. } => {
            buffer.retain(|existing| !matches!(existing, PatchEvent::TitleChanged { .. }));
        }
        PatchEvent::Patch { .. } | PatchEvent::RootAdded { .. } | PatchEvent::RootRemoved { .. } => {}
    }
    buffer.push(event);
}

/// Self-contained delta message: new models plus ordered events.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PatchMessage {
    #[serde(default)]
    pub references: Vec<WireModel>,
    pub events: Vec<PatchEvent>,
}

impl PatchMessage {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn to_json(&self) -> SceneResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(input: &str) -> SceneResult<Self> {
        serde_json::from_str(input)
            .map_err(|e| SceneError::MalformedPatch(format!("failed to parse patch: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;
    use serde_json::json;

    use super::{PatchEvent, combine};
    use crate::core::ModelId;

    fn stream(values: serde_json::Value, rollover: Option<usize>) -> PatchEvent {
        let mut data = IndexMap::new();
        data.insert("x".to_owned(), values);
        PatchEvent::Stream {
            id: ModelId::new("p1"),
            data,
            rollover,
        }
    }

    #[test]
    fn consecutive_streams_concatenate() {
        let mut buffer = Vec::new();
        combine(&mut buffer, stream(json!([1.0]), Some(5)));
        combine(&mut buffer, stream(json!([2.0, 3.0]), Some(5)));
        combine(&mut buffer, stream(json!([4.0]), None));

        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer[0], stream(json!([1.0, 2.0, 3.0]), Some(5)));
    }

    #[test]
    fn property_changes_keep_latest_value() {
        let mut buffer = Vec::new();
        let change = |value: f64| PatchEvent::PropertyChanged {
            id: ModelId::new("p2"),
            attr: "start".to_owned(),
            new: json!(value),
        };
        combine(&mut buffer, change(1.0));
        combine(&mut buffer, PatchEvent::TitleChanged { title: "t".to_owned() });
        combine(&mut buffer, change(2.0));

        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer[1], change(2.0));
    }

    #[test]
    fn property_change_after_an_event_on_the_same_model_is_kept_in_order() {
        let mut buffer = Vec::new();
        let change = |attr: &str, value: f64| PatchEvent::PropertyChanged {
            id: ModelId::new("p2"),
            attr: attr.to_owned(),
            new: json!(value),
        };
        combine(&mut buffer, change("start", 1.0));
        combine(&mut buffer, change("end", 5.0));
        combine(&mut buffer, change("start", 2.0));

        assert_eq!(
            buffer,
            vec![change("start", 1.0), change("end", 5.0), change("start", 2.0)]
        );
    }

    #[test]
    fn data_property_change_supersedes_earlier_data_events() {
        let mut buffer = Vec::new();
        let data = |values: serde_json::Value| PatchEvent::PropertyChanged {
            id: ModelId::new("p1"),
            attr: "data".to_owned(),
            new: json!({ "x": values }),
        };
        combine(&mut buffer, data(json!([1.0])));
        combine(&mut buffer, stream(json!([2.0]), None));
        combine(&mut buffer, data(json!([5.0])));

        assert_eq!(buffer, vec![data(json!([5.0]))]);
    }

    #[test]
    fn wire_shape_uses_kebab_case_tags() {
        let event = PatchEvent::RootAdded {
            id: ModelId::new("p3"),
        };
        assert_eq!(
            serde_json::to_value(&event).expect("serialize"),
            json!({"event": "root-added", "id": "p3"})
        );
    }
}
