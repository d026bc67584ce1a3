//! Arena-owned document graph.
//!
//! A [`Document`] owns every model in an id-keyed arena. Models refer to each
//! other only by [`ModelId`], so shared and cyclic references (a tool and the
//! plot it belongs to) need no shared ownership. All mutation goes through
//! the document so it can validate references, invalidate resolution caches,
//! notify listeners and record outgoing patch events.

mod config;
mod diagnostics;
mod events;
mod listener;
mod model;
mod patch;
mod render;
mod resolution;
mod serialization;
mod sync;

use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::core::defaults::{default_axis, default_range, default_tools};
use crate::core::property::{ModelCategory, PropertyContainer};
use crate::core::{FilterResolver, Filter, IdAllocator, ModelId, Plot, PropertyValue};
use crate::error::{SceneError, SceneResult};

pub use config::DocumentConfig;
pub use diagnostics::{Diagnostic, DiagnosticCode, DiagnosticLevel};
pub use events::{PatchEvent, PatchMessage};
pub use listener::{
    ChangeKind, ChangeOrigin, DocumentListener, PropertyChange, PropertyUpdate,
};
pub use model::{Model, ModelEntry};
pub use serialization::{WIRE_VERSION, WireDocument, WireModel};
pub use sync::{PatchInbox, PatchOutbox, SequencedPatch};

use resolution::ResolutionCache;

/// Document shared between a host thread and a sync task.
pub type SharedDocument = Arc<Mutex<Document>>;

pub struct Document {
    config: DocumentConfig,
    title: String,
    ids: IdAllocator,
    models: IndexMap<ModelId, ModelEntry>,
    roots: Vec<ModelId>,
    listeners: Vec<Box<dyn DocumentListener>>,
    /// Combined events while held.
    held: Option<Vec<PatchEvent>>,
    outgoing: Vec<PatchEvent>,
    /// Locally created models the remote side has not seen yet.
    unsynced: IndexSet<ModelId>,
    cache: ResolutionCache,
    in_flight: HashSet<(ModelId, String)>,
    recomputing: HashSet<ModelId>,
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("title", &self.title)
            .field("models", &self.models.len())
            .field("roots", &self.roots)
            .field("listeners", &self.listeners.len())
            .field("held", &self.held.is_some())
            .finish_non_exhaustive()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    #[must_use]
    pub fn new() -> Self {
        Self::build(DocumentConfig::default())
    }

    pub fn with_config(config: DocumentConfig) -> SceneResult<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: DocumentConfig) -> Self {
        Self {
            ids: IdAllocator::new(config.id_prefix.clone(), config.id_start),
            config,
            title: String::new(),
            models: IndexMap::new(),
            roots: Vec::new(),
            listeners: Vec::new(),
            held: None,
            outgoing: Vec::new(),
            unsynced: IndexSet::new(),
            cache: ResolutionCache::default(),
            in_flight: HashSet::new(),
            recomputing: HashSet::new(),
        }
    }

    #[must_use]
    pub fn into_shared(self) -> SharedDocument {
        Arc::new(Mutex::new(self))
    }

    #[must_use]
    pub fn config(&self) -> &DocumentConfig {
        &self.config
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: &str) {
        if self.title == title {
            return;
        }
        self.title = title.to_owned();
        debug!(title, "document title changed");
        self.record(PatchEvent::TitleChanged {
            title: title.to_owned(),
        });
    }

    /// Adds a model and returns its freshly allocated id.
    ///
    /// Every reference the model holds must already be in the document and
    /// of the category its property declares.
    pub fn add(&mut self, model: impl Into<Model>) -> SceneResult<ModelId> {
        self.insert(None, model.into())
    }

    pub fn add_named(&mut self, name: &str, model: impl Into<Model>) -> SceneResult<ModelId> {
        self.insert(Some(name.to_owned()), model.into())
    }

    fn insert(&mut self, name: Option<String>, body: Model) -> SceneResult<ModelId> {
        check_reference_kinds(
            &body,
            &|id: &ModelId| self.category_of(id),
            SceneError::UnknownModel,
        )?;
        let id = self.ids.allocate();
        for referenced in body.references() {
            self.cache.invalidate(&referenced);
        }
        trace!(model = %id, kind = body.type_name(), "model added");
        let mut entry = ModelEntry::new(id.clone(), body);
        entry.name = name;
        self.models.insert(id.clone(), entry);
        self.unsynced.insert(id.clone());
        Ok(id)
    }

    pub fn add_root(&mut self, id: &ModelId) -> SceneResult<()> {
        if !self.models.contains_key(id) {
            return Err(SceneError::UnknownModel(id.clone()));
        }
        if self.roots.contains(id) {
            return Ok(());
        }
        self.roots.push(id.clone());
        debug!(model = %id, "root added");
        self.record(PatchEvent::RootAdded { id: id.clone() });
        Ok(())
    }

    /// Returns `true` when `id` was a root.
    pub fn remove_root(&mut self, id: &ModelId) -> bool {
        let Some(position) = self.roots.iter().position(|root| root == id) else {
            return false;
        };
        self.roots.remove(position);
        debug!(model = %id, "root removed");
        self.record(PatchEvent::RootRemoved { id: id.clone() });
        true
    }

    #[must_use]
    pub fn roots(&self) -> &[ModelId] {
        &self.roots
    }

    #[must_use]
    pub fn contains(&self, id: &ModelId) -> bool {
        self.models.contains_key(id)
    }

    #[must_use]
    pub fn model_count(&self) -> usize {
        self.models.len()
    }

    #[must_use]
    pub fn get_model(&self, id: &ModelId) -> Option<&ModelEntry> {
        self.models.get(id)
    }

    pub fn models(&self) -> impl Iterator<Item = &ModelEntry> {
        self.models.values()
    }

    /// Models whose `name` equals `name`, in insertion order.
    #[must_use]
    pub fn select_by_name(&self, name: &str) -> Vec<&ModelEntry> {
        self.models
            .values()
            .filter(|entry| entry.name.as_deref() == Some(name))
            .collect()
    }

    pub fn get(&self, id: &ModelId, property: &str) -> SceneResult<PropertyValue> {
        self.entry(id)?.get(property)
    }

    /// Validates and stores a property value, then notifies listeners.
    pub fn set(
        &mut self,
        id: &ModelId,
        property: &str,
        value: impl Into<PropertyValue>,
    ) -> SceneResult<()> {
        self.set_with_origin(id, property, value.into(), ChangeOrigin::Local)
    }

    pub(crate) fn set_with_origin(
        &mut self,
        id: &ModelId,
        property: &str,
        value: PropertyValue,
        origin: ChangeOrigin,
    ) -> SceneResult<()> {
        let entry = self.entry(id)?;
        if let Some(expected) = entry
            .body
            .descriptor(property)
            .and_then(|descriptor| descriptor.kind.ref_category())
        {
            check_refs_in(
                &value,
                expected,
                &|id: &ModelId| self.category_of(id),
                SceneError::UnknownModel,
            )?;
        }

        let entry = self
            .models
            .get_mut(id)
            .ok_or_else(|| SceneError::UnknownModel(id.clone()))?;
        let old = entry.set(property, value)?;
        let new = entry.get(property)?;
        if old == new {
            return Ok(());
        }

        self.invalidate_with_refs(id, &old, &new);
        if origin == ChangeOrigin::Local {
            self.record(PatchEvent::property_changed(id, property, &new));
        }
        trace!(model = %id, property, "property changed");
        self.notify(PropertyChange {
            model: id.clone(),
            property: property.to_owned(),
            old,
            new,
            kind: ChangeKind::Property,
            origin,
        });
        Ok(())
    }

    /// Transitive closure of models reachable from `roots`, roots included,
    /// in breadth-first order.
    #[must_use]
    pub fn references(&self, roots: &[ModelId]) -> Vec<ModelId> {
        let mut seen: IndexSet<ModelId> = IndexSet::new();
        let mut queue: VecDeque<ModelId> = roots.iter().cloned().collect();
        while let Some(id) = queue.pop_front() {
            let Some(entry) = self.models.get(&id) else {
                continue;
            };
            if seen.insert(id) {
                queue.extend(entry.body.references());
            }
        }
        seen.into_iter().collect()
    }

    /// Adds `plot`, filling in what it omits: a data range per missing
    /// dimension, one axis per empty axis side and the configured default
    /// tools when it has none.
    pub fn add_plot_with_defaults(&mut self, mut plot: Plot) -> SceneResult<ModelId> {
        if plot.x_range.is_none() {
            plot.x_range = Some(self.add(default_range())?);
        }
        if plot.y_range.is_none() {
            plot.y_range = Some(self.add(default_range())?);
        }
        if plot.below.is_empty() {
            let categorical = self.is_categorical_range(plot.x_range.as_ref());
            plot.below = vec![self.add(default_axis(categorical, plot.x_scale))?];
        }
        if plot.left.is_empty() {
            let categorical = self.is_categorical_range(plot.y_range.as_ref());
            plot.left = vec![self.add(default_axis(categorical, plot.y_scale))?];
        }
        let mut tool_ids = Vec::new();
        if plot.tools.is_empty() {
            for tool in default_tools(&self.config.default_tools) {
                tool_ids.push(self.add(tool)?);
            }
            plot.tools = tool_ids.clone();
        }
        let plot_id = self.add(plot)?;
        for tool in &tool_ids {
            self.set(tool, "plot", plot_id.clone())?;
        }
        debug!(plot = %plot_id, tools = tool_ids.len(), "plot added with defaults");
        Ok(plot_id)
    }

    /// A plot sized from the document configuration.
    #[must_use]
    pub fn plot_template(&self) -> Plot {
        Plot::new(self.config.plot_width, self.config.plot_height)
    }

    fn is_categorical_range(&self, id: Option<&ModelId>) -> bool {
        id.and_then(|id| self.models.get(id))
            .is_some_and(|entry| matches!(entry.body, Model::FactorRange(_)))
    }

    pub(crate) fn entry(&self, id: &ModelId) -> SceneResult<&ModelEntry> {
        self.models
            .get(id)
            .ok_or_else(|| SceneError::UnknownModel(id.clone()))
    }

    pub(crate) fn category_of(&self, id: &ModelId) -> Option<ModelCategory> {
        self.models.get(id).map(|entry| entry.body.category())
    }

    pub(crate) fn invalidate_with_refs(
        &mut self,
        id: &ModelId,
        old: &PropertyValue,
        new: &PropertyValue,
    ) {
        self.cache.invalidate(id);
        let mut refs = Vec::new();
        old.collect_refs(&mut refs);
        new.collect_refs(&mut refs);
        for referenced in &refs {
            self.cache.invalidate(referenced);
        }
    }

    /// Queues a locally originated event for the next outgoing patch.
    pub(crate) fn record(&mut self, event: PatchEvent) {
        match &mut self.held {
            Some(buffer) => events::combine(buffer, event),
            None => self.outgoing.push(event),
        }
    }
}

impl FilterResolver for Document {
    fn filter(&self, id: &ModelId) -> Option<&Filter> {
        self.models.get(id).and_then(|entry| entry.body.as_filter())
    }
}

/// Checks every reference held by `body` against `lookup`.
pub(crate) fn check_reference_kinds(
    body: &Model,
    lookup: &dyn Fn(&ModelId) -> Option<ModelCategory>,
    missing: fn(ModelId) -> SceneError,
) -> SceneResult<()> {
    for descriptor in body.properties() {
        let Some(expected) = descriptor.kind.ref_category() else {
            continue;
        };
        if let Ok(value) = body.get(descriptor.name) {
            check_refs_in(&value, expected, lookup, missing)?;
        }
    }
    Ok(())
}

fn check_refs_in(
    value: &PropertyValue,
    expected: ModelCategory,
    lookup: &dyn Fn(&ModelId) -> Option<ModelCategory>,
    missing: fn(ModelId) -> SceneError,
) -> SceneResult<()> {
    let mut refs = Vec::new();
    value.collect_refs(&mut refs);
    for id in refs {
        match lookup(&id) {
            None => return Err(missing(id)),
            Some(actual) if actual != expected => {
                return Err(SceneError::WrongModelKind {
                    id,
                    expected: expected.label(),
                    actual: actual.label(),
                });
            }
            Some(_) => {}
        }
    }
    Ok(())
}
