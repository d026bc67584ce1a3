//! Source mutations and the incremental patch exchange.

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::core::property::{ModelCategory, PropertyContainer};
use crate::core::{ColumnData, ColumnDataSource, ColumnPatches, ModelId, PropertyValue};
use crate::document::events::{
    PatchEvent, PatchMessage, column_data_from_wire, patches_from_wire,
};
use crate::document::listener::{ChangeKind, ChangeOrigin, PropertyChange};
use crate::document::model::{Model, ModelEntry};
use crate::document::resolution::wrong_kind;
use crate::document::serialization::{WireModel, instantiate};
use crate::document::{Document, check_reference_kinds};
use crate::error::{SceneError, SceneResult};

fn data_change(id: &ModelId, kind: ChangeKind, origin: ChangeOrigin) -> PropertyChange {
    PropertyChange {
        model: id.clone(),
        property: "data".to_owned(),
        old: PropertyValue::Null,
        new: PropertyValue::Null,
        kind,
        origin,
    }
}

fn source_mut<'a>(id: &ModelId, entry: &'a mut ModelEntry) -> SceneResult<&'a mut ColumnDataSource> {
    match &mut entry.body {
        Model::ColumnDataSource(source) => Ok(source),
        other => Err(wrong_kind(id, ModelCategory::DataSource, other.category())),
    }
}

/// Copy-on-first-touch staging of a model for an atomic patch.
fn stage<'a>(
    id: &ModelId,
    models: &IndexMap<ModelId, ModelEntry>,
    created: &IndexMap<ModelId, ModelEntry>,
    staged: &'a mut IndexMap<ModelId, ModelEntry>,
) -> SceneResult<&'a mut ModelEntry> {
    if !staged.contains_key(id) {
        let entry = created
            .get(id)
            .or_else(|| models.get(id))
            .cloned()
            .ok_or_else(|| SceneError::UnknownModel(id.clone()))?;
        staged.insert(id.clone(), entry);
    }
    staged
        .get_mut(id)
        .ok_or_else(|| SceneError::UnknownModel(id.clone()))
}

impl Document {
    /// Replaces column entries in place; all or nothing.
    pub fn patch_source(&mut self, id: &ModelId, patches: &ColumnPatches) -> SceneResult<()> {
        let entry = self
            .models
            .get_mut(id)
            .ok_or_else(|| SceneError::UnknownModel(id.clone()))?;
        source_mut(id, entry)?.patch_many(patches)?;
        self.cache.invalidate(id);
        self.record(PatchEvent::patch(id, patches));
        self.notify(data_change(id, ChangeKind::Patched, ChangeOrigin::Local));
        Ok(())
    }

    /// Appends rows, trimming the oldest beyond `rollover`.
    pub fn stream_source(
        &mut self,
        id: &ModelId,
        rows: ColumnData,
        rollover: Option<usize>,
    ) -> SceneResult<()> {
        let event = PatchEvent::stream(id, &rows, rollover);
        let entry = self
            .models
            .get_mut(id)
            .ok_or_else(|| SceneError::UnknownModel(id.clone()))?;
        source_mut(id, entry)?.stream(rows, rollover)?;
        self.cache.invalidate(id);
        self.record(event);
        self.notify(data_change(id, ChangeKind::Streamed, ChangeOrigin::Local));
        Ok(())
    }

    pub fn replace_source_data(&mut self, id: &ModelId, data: ColumnData) -> SceneResult<()> {
        let event = PatchEvent::column_data_changed(id, &data);
        let entry = self
            .models
            .get_mut(id)
            .ok_or_else(|| SceneError::UnknownModel(id.clone()))?;
        source_mut(id, entry)?.replace_data(data)?;
        self.cache.invalidate(id);
        self.record(event);
        self.notify(data_change(id, ChangeKind::Replaced, ChangeOrigin::Local));
        Ok(())
    }

    /// Starts buffering outgoing events so repeated changes collapse.
    pub fn hold(&mut self) {
        if self.held.is_none() {
            self.held = Some(Vec::new());
            debug!("document events held");
        }
    }

    /// Releases held events into the outgoing queue.
    pub fn unhold(&mut self) {
        if let Some(buffer) = self.held.take() {
            debug!(events = buffer.len(), "document events released");
            self.outgoing.extend(buffer);
        }
    }

    #[must_use]
    pub fn is_held(&self) -> bool {
        self.held.is_some()
    }

    /// Drains locally originated events into one patch message carrying
    /// every not-yet-synced model those events reference.
    pub fn take_patch(&mut self) -> Option<PatchMessage> {
        if self.outgoing.is_empty() {
            return None;
        }
        let events = std::mem::take(&mut self.outgoing);
        let seeds: Vec<ModelId> = events
            .iter()
            .flat_map(PatchEvent::referenced_models)
            .collect();
        let references: Vec<WireModel> = self
            .references(&seeds)
            .into_iter()
            .filter(|id| self.unsynced.shift_remove(id))
            .filter_map(|id| self.models.get(&id).map(WireModel::from_entry))
            .collect();
        debug!(
            events = events.len(),
            references = references.len(),
            "outgoing patch assembled"
        );
        Some(PatchMessage { references, events })
    }

    /// Marks every current model as known to the remote side, e.g. after
    /// sending a full `to_json` snapshot.
    pub fn mark_synced(&mut self) {
        self.unsynced.clear();
    }

    /// Applies a remote patch atomically.
    ///
    /// Every event is applied to a staged copy of the model it touches; the
    /// document changes only if all events succeed. Applied changes notify
    /// listeners with [`ChangeOrigin::Remote`] and are not queued for
    /// sending back.
    pub fn apply_patch(&mut self, message: &PatchMessage) -> SceneResult<()> {
        let incoming: Vec<WireModel> = message
            .references
            .iter()
            .filter(|wire| !self.models.contains_key(&wire.id))
            .cloned()
            .collect();
        let created = instantiate(&incoming, &|id: &ModelId| self.category_of(id))?;

        let mut staged: IndexMap<ModelId, ModelEntry> = IndexMap::new();
        let mut roots = self.roots.clone();
        let mut title = None;
        let mut changes = Vec::new();

        for event in &message.events {
            match event {
                PatchEvent::PropertyChanged { id, attr, new } => {
                    let entry = stage(id, &self.models, &created, &mut staged)?;
                    let old = entry.set(attr, PropertyValue::from_wire(new)?)?;
                    let new = entry.get(attr)?;
                    changes.push(PropertyChange {
                        model: id.clone(),
                        property: attr.clone(),
                        old,
                        new,
                        kind: ChangeKind::Property,
                        origin: ChangeOrigin::Remote,
                    });
                }
                PatchEvent::Patch { id, patches } => {
                    let entry = stage(id, &self.models, &created, &mut staged)?;
                    source_mut(id, entry)?.patch_many(&patches_from_wire(patches)?)?;
                    changes.push(data_change(id, ChangeKind::Patched, ChangeOrigin::Remote));
                }
                PatchEvent::Stream { id, data, rollover } => {
                    let entry = stage(id, &self.models, &created, &mut staged)?;
                    source_mut(id, entry)?.stream(column_data_from_wire(data)?, *rollover)?;
                    changes.push(data_change(id, ChangeKind::Streamed, ChangeOrigin::Remote));
                }
                PatchEvent::ColumnDataChanged { id, data } => {
                    let entry = stage(id, &self.models, &created, &mut staged)?;
                    source_mut(id, entry)?.replace_data(column_data_from_wire(data)?)?;
                    changes.push(data_change(id, ChangeKind::Replaced, ChangeOrigin::Remote));
                }
                PatchEvent::RootAdded { id } => {
                    if !self.models.contains_key(id) && !created.contains_key(id) {
                        return Err(SceneError::UnresolvedReference(id.clone()));
                    }
                    if !roots.contains(id) {
                        roots.push(id.clone());
                    }
                }
                PatchEvent::RootRemoved { id } => roots.retain(|root| root != id),
                PatchEvent::TitleChanged { title: new_title } => title = Some(new_title.clone()),
            }
        }

        let lookup = |id: &ModelId| {
            staged
                .get(id)
                .or_else(|| created.get(id))
                .map(|entry| entry.body.category())
                .or_else(|| self.category_of(id))
        };
        for entry in staged.values() {
            check_reference_kinds(&entry.body, &lookup, SceneError::UnresolvedReference)?;
        }

        debug!(
            events = message.events.len(),
            references = created.len(),
            "applying remote patch"
        );
        for (id, entry) in created {
            self.ids.observe(&id);
            for referenced in entry.body.references() {
                self.cache.invalidate(&referenced);
            }
            self.models.insert(id, entry);
        }
        for (id, entry) in staged {
            trace!(model = %id, "committing staged model");
            self.models.insert(id, entry);
        }
        self.roots = roots;
        if let Some(title) = title {
            self.title = title;
        }
        for change in &changes {
            self.invalidate_with_refs(&change.model, &change.old, &change.new);
        }
        for change in changes {
            self.notify(change);
        }
        Ok(())
    }
}
