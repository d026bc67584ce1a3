use tracing::{trace, warn};

use crate::core::{ModelId, PropertyValue};
use crate::document::Document;
use crate::error::{SceneError, SceneResult};

/// Where a change came from. Remote changes are never echoed back out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOrigin {
    Local,
    Remote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Property,
    /// Column entries replaced in place.
    Patched,
    /// Rows appended to a data source.
    Streamed,
    /// Whole column set swapped.
    Replaced,
}

/// Notification delivered to listeners after a change has been applied.
///
/// For patched, streamed and replaced sources `property` is `"data"` and
/// both values are `Null`; listeners read the new rows from the document.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyChange {
    pub model: ModelId,
    pub property: String,
    pub old: PropertyValue,
    pub new: PropertyValue,
    pub kind: ChangeKind,
    pub origin: ChangeOrigin,
}

/// Follow-up write requested by a listener.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyUpdate {
    pub model: ModelId,
    pub property: String,
    pub value: PropertyValue,
}

impl PropertyUpdate {
    #[must_use]
    pub fn new(model: ModelId, property: &str, value: impl Into<PropertyValue>) -> Self {
        Self {
            model,
            property: property.to_owned(),
            value: value.into(),
        }
    }
}

/// Observer of document changes.
///
/// Listeners see the document read-only and express reactions as returned
/// updates; the document applies them depth-first after every listener has
/// seen the triggering change.
pub trait DocumentListener: Send {
    fn id(&self) -> &str;

    fn on_change(&mut self, change: &PropertyChange, document: &Document) -> Vec<PropertyUpdate>;
}

struct FnListener<F> {
    id: String,
    callback: F,
}

impl<F> DocumentListener for FnListener<F>
where
    F: FnMut(&PropertyChange, &Document) -> Vec<PropertyUpdate> + Send,
{
    fn id(&self) -> &str {
        &self.id
    }

    fn on_change(&mut self, change: &PropertyChange, document: &Document) -> Vec<PropertyUpdate> {
        (self.callback)(change, document)
    }
}

impl Document {
    /// Registers a listener. Ids must be non-empty and unique.
    pub fn register_listener(&mut self, listener: Box<dyn DocumentListener>) -> SceneResult<()> {
        let listener_id = listener.id().to_owned();
        if listener_id.is_empty() {
            return Err(SceneError::InvalidData(
                "listener id must not be empty".to_owned(),
            ));
        }
        if self.has_listener(&listener_id) {
            return Err(SceneError::InvalidData(format!(
                "listener with id `{listener_id}` is already registered"
            )));
        }
        self.listeners.push(listener);
        Ok(())
    }

    /// Registers a closure as a listener.
    pub fn on_change<F>(&mut self, id: &str, callback: F) -> SceneResult<()>
    where
        F: FnMut(&PropertyChange, &Document) -> Vec<PropertyUpdate> + Send + 'static,
    {
        self.register_listener(Box::new(FnListener {
            id: id.to_owned(),
            callback,
        }))
    }

    /// Unregisters a listener by id. Returns `true` when removed.
    pub fn unregister_listener(&mut self, listener_id: &str) -> bool {
        if let Some(position) = self
            .listeners
            .iter()
            .position(|listener| listener.id() == listener_id)
        {
            self.listeners.remove(position);
            return true;
        }
        false
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    #[must_use]
    pub fn has_listener(&self, listener_id: &str) -> bool {
        self.listeners
            .iter()
            .any(|listener| listener.id() == listener_id)
    }

    /// Delivers `change` to every listener, then applies their follow-up
    /// updates depth-first.
    ///
    /// A follow-up targeting a `(model, property)` pair whose notification is
    /// still being delivered further up the chain is dropped, which bounds
    /// listener ping-pong.
    pub(crate) fn notify(&mut self, change: PropertyChange) {
        if self.listeners.is_empty() {
            return;
        }
        let key = (change.model.clone(), change.property.clone());
        if !self.in_flight.insert(key.clone()) {
            return;
        }

        let mut listeners = std::mem::take(&mut self.listeners);
        let mut updates = Vec::new();
        for listener in &mut listeners {
            updates.extend(listener.on_change(&change, self));
        }
        self.listeners = listeners;

        for update in updates {
            if self
                .in_flight
                .contains(&(update.model.clone(), update.property.clone()))
            {
                trace!(
                    model = %update.model,
                    property = %update.property,
                    "follow-up update dropped while its change is in flight"
                );
                continue;
            }
            if let Err(err) = self.set_with_origin(
                &update.model,
                &update.property,
                update.value,
                ChangeOrigin::Local,
            ) {
                warn!(
                    error = %err,
                    model = %update.model,
                    property = %update.property,
                    "listener follow-up update rejected"
                );
            }
        }
        self.in_flight.remove(&key);
    }
}
