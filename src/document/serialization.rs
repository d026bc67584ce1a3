//! Full-document JSON round trip.
//!
//! Models are written as a flat `references` list and relinked by id on the
//! way back in. Instantiation is two-pass: every referenced model is created
//! in its default state first, then attributes are applied, so reference
//! cycles (a tool pointing back at its plot) load without ordering concerns.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, trace, warn};

use crate::core::property::{ModelCategory, PropertyContainer};
use crate::core::{ModelId, PropertyValue};
use crate::document::model::{Model, ModelEntry};
use crate::document::{Document, DocumentConfig, check_reference_kinds};
use crate::error::{SceneError, SceneResult};

/// Version tag written into every serialized document.
pub const WIRE_VERSION: &str = "1";

/// One model on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireModel {
    #[serde(rename = "type")]
    pub type_name: String,
    pub id: ModelId,
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

impl WireModel {
    #[must_use]
    pub fn from_entry(entry: &ModelEntry) -> Self {
        let mut attributes: Map<String, Value> = entry
            .body
            .attributes()
            .into_iter()
            .map(|(name, value)| (name, value.to_wire()))
            .collect();
        if let Some(name) = &entry.name {
            attributes.insert("name".to_owned(), Value::String(name.clone()));
        }
        Self {
            type_name: entry.body.type_name().to_owned(),
            id: entry.id.clone(),
            attributes,
        }
    }
}

/// Serialized document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireDocument {
    pub version: String,
    #[serde(default)]
    pub title: String,
    pub roots: Vec<ModelId>,
    pub references: Vec<WireModel>,
}

/// Instantiates wire models against ids already present on the receiving
/// side. A reference that is neither in `references` nor known fails with
/// `UnresolvedReference`.
pub(crate) fn instantiate(
    references: &[WireModel],
    known: &dyn Fn(&ModelId) -> Option<ModelCategory>,
) -> SceneResult<IndexMap<ModelId, ModelEntry>> {
    let mut created: IndexMap<ModelId, ModelEntry> = IndexMap::with_capacity(references.len());
    for wire in references {
        if created.contains_key(&wire.id) {
            trace!(model = %wire.id, "duplicate reference entry ignored");
            continue;
        }
        let body = Model::bare(&wire.type_name)?;
        created.insert(wire.id.clone(), ModelEntry::new(wire.id.clone(), body));
    }

    let mut applied: IndexMap<&ModelId, bool> = IndexMap::new();
    for wire in references {
        if applied.insert(&wire.id, true).is_some() {
            continue;
        }
        let Some(entry) = created.get(&wire.id) else {
            continue;
        };
        let mut staged = entry.clone();
        for (attribute, raw) in &wire.attributes {
            let value = PropertyValue::from_wire(raw)?;
            let mut refs = Vec::new();
            value.collect_refs(&mut refs);
            if let Some(missing) = refs
                .into_iter()
                .find(|id| !created.contains_key(id) && known(id).is_none())
            {
                return Err(SceneError::UnresolvedReference(missing));
            }
            staged.set(attribute, value)?;
        }
        created.insert(wire.id.clone(), staged);
    }

    let lookup = |id: &ModelId| {
        created
            .get(id)
            .map(|entry| entry.body.category())
            .or_else(|| known(id))
    };
    for entry in created.values() {
        check_reference_kinds(&entry.body, &lookup, SceneError::UnresolvedReference)?;
    }
    Ok(created)
}

impl Document {
    /// Roots plus the transitive closure of models they reference.
    #[must_use]
    pub fn to_wire(&self) -> WireDocument {
        let references = self
            .references(&self.roots)
            .iter()
            .filter_map(|id| self.models.get(id))
            .map(WireModel::from_entry)
            .collect();
        WireDocument {
            version: WIRE_VERSION.to_owned(),
            title: self.title.clone(),
            roots: self.roots.clone(),
            references,
        }
    }

    pub fn to_json(&self) -> SceneResult<String> {
        if self.config.validate_on_serialize {
            for diagnostic in self.validate() {
                warn!(
                    code = diagnostic.code.code(),
                    model = %diagnostic.model,
                    "{}",
                    diagnostic.message
                );
            }
        }
        Ok(serde_json::to_string(&self.to_wire())?)
    }

    pub fn to_json_pretty(&self) -> SceneResult<String> {
        Ok(serde_json::to_string_pretty(&self.to_wire())?)
    }

    pub fn from_json(input: &str) -> SceneResult<Self> {
        Self::from_json_with_config(input, DocumentConfig::default())
    }

    /// Rebuilds a document with identical ids, so patches exchanged with
    /// the sender keep resolving.
    pub fn from_json_with_config(input: &str, config: DocumentConfig) -> SceneResult<Self> {
        let wire: WireDocument = serde_json::from_str(input)?;
        Self::from_wire(wire, config)
    }

    pub fn from_wire(wire: WireDocument, config: DocumentConfig) -> SceneResult<Self> {
        if wire.version != WIRE_VERSION {
            return Err(SceneError::InvalidData(format!(
                "unsupported document version `{}`",
                wire.version
            )));
        }
        let mut document = Self::with_config(config)?;
        let created = instantiate(&wire.references, &|_| None)?;
        if let Some(missing) = wire.roots.iter().find(|id| !created.contains_key(*id)) {
            return Err(SceneError::UnresolvedReference(missing.clone()));
        }
        for (id, entry) in created {
            document.ids.observe(&id);
            document.models.insert(id, entry);
        }
        document.roots = wire.roots;
        document.title = wire.title;
        debug!(
            models = document.models.len(),
            roots = document.roots.len(),
            "document deserialized"
        );
        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{WireModel, instantiate};
    use crate::core::ModelId;
    use crate::error::SceneError;

    fn wire(value: serde_json::Value) -> Vec<WireModel> {
        serde_json::from_value(value).expect("wire models")
    }

    #[test]
    fn cycles_instantiate_in_two_passes() {
        let references = wire(json!([
            {"type": "Tool", "id": "t1", "attributes": {"kind": "pan", "plot": {"ref": "p1"}}},
            {"type": "Plot", "id": "p1", "attributes": {"tools": [{"ref": "t1"}]}}
        ]));
        let created = instantiate(&references, &|_| None).expect("instantiate");
        assert_eq!(created.len(), 2);
        assert_eq!(
            created[&ModelId::new("p1")].body.as_plot().map(|p| p.tools.clone()),
            Some(vec![ModelId::new("t1")])
        );
    }

    #[test]
    fn dangling_reference_is_reported() {
        let references = wire(json!([
            {"type": "CDSView", "id": "v1", "attributes": {"filters": [{"ref": "f9"}]}}
        ]));
        let err = instantiate(&references, &|_| None).expect_err("dangling");
        assert!(matches!(err, SceneError::UnresolvedReference(id) if id.as_str() == "f9"));
    }
}
