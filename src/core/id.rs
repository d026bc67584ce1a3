use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identifier of a model inside a document.
///
/// Ids are opaque strings on the wire so replicas can exchange references
/// without agreeing on a numeric allocator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelId(String);

impl ModelId {
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModelId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

/// Monotonic id allocator owned by one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdAllocator {
    prefix: String,
    next: u64,
}

impl IdAllocator {
    #[must_use]
    pub fn new(prefix: impl Into<String>, start: u64) -> Self {
        Self {
            prefix: prefix.into(),
            next: start,
        }
    }

    pub fn allocate(&mut self) -> ModelId {
        let id = ModelId(format!("{}{}", self.prefix, self.next));
        self.next = self.next.saturating_add(1);
        id
    }

    /// Moves the counter past an externally supplied id so later allocations
    /// never collide with it.
    pub fn observe(&mut self, id: &ModelId) {
        let Some(suffix) = id.as_str().strip_prefix(self.prefix.as_str()) else {
            return;
        };
        if let Ok(value) = suffix.parse::<u64>() {
            self.next = self.next.max(value.saturating_add(1));
        }
    }
}
