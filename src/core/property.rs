//! Reflection-free property introspection shared by every model kind.
//!
//! Each model declares a static table of [`PropertyDescriptor`]s and
//! implements `get`/`apply` with a plain `match` on the property name. The
//! typed field conversion inside `apply` is the validator: a value that does
//! not convert is rejected with `SceneError::Validation`.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::core::{ModelId, PropertyValue};
use crate::error::{SceneError, SceneResult};

/// Broad family of a model, used to type-check references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelCategory {
    DataSource,
    View,
    Filter,
    Range,
    Glyph,
    Renderer,
    Plot,
    Axis,
    Tool,
}

impl ModelCategory {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::DataSource => "data source",
            Self::View => "view",
            Self::Filter => "filter",
            Self::Range => "range",
            Self::Glyph => "glyph",
            Self::Renderer => "renderer",
            Self::Plot => "plot",
            Self::Axis => "axis",
            Self::Tool => "tool",
        }
    }
}

/// Declared type of one property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    Bool,
    Number,
    NonNegative,
    Integer,
    String,
    Enum(&'static [&'static str]),
    Nullable(&'static PropertyKind),
    NumberList,
    BoolList,
    IndexList,
    ColumnData,
    Factors,
    DataSpec,
    Color,
    Bounds,
    Ref(ModelCategory),
    RefList(ModelCategory),
    RefMap(ModelCategory),
    /// `"auto"` or a list of references.
    AutoRefList(ModelCategory),
    /// `"auto"`, `null` or a reference.
    StateGlyph,
    Any,
}

impl PropertyKind {
    /// Category every reference stored in this property must belong to.
    #[must_use]
    pub const fn ref_category(self) -> Option<ModelCategory> {
        match self {
            Self::Ref(category)
            | Self::RefList(category)
            | Self::RefMap(category)
            | Self::AutoRefList(category) => Some(category),
            Self::StateGlyph => Some(ModelCategory::Glyph),
            Self::Nullable(inner) => inner.ref_category(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyDescriptor {
    pub name: &'static str,
    pub kind: PropertyKind,
}

impl PropertyDescriptor {
    #[must_use]
    pub const fn new(name: &'static str, kind: PropertyKind) -> Self {
        Self { name, kind }
    }
}

/// Introspectable container of named, typed properties.
pub trait PropertyContainer {
    /// Wire type name, e.g. `"DataRange1d"`.
    fn type_name(&self) -> &'static str;

    fn properties(&self) -> &'static [PropertyDescriptor];

    fn get(&self, name: &str) -> SceneResult<PropertyValue>;

    /// Validates and stores `value`. Must leave the container untouched on error.
    fn apply(&mut self, name: &str, value: PropertyValue) -> SceneResult<()>;

    /// Sets a property and returns the previous value.
    fn set(&mut self, name: &str, value: PropertyValue) -> SceneResult<PropertyValue> {
        let old = self.get(name)?;
        self.apply(name, value)?;
        Ok(old)
    }

    #[must_use]
    fn descriptor(&self, name: &str) -> Option<&'static PropertyDescriptor> {
        self.properties().iter().find(|d| d.name == name)
    }

    /// Models referenced directly by this container's property values.
    fn references(&self) -> Vec<ModelId> {
        let mut out = Vec::new();
        for descriptor in self.properties() {
            if descriptor.kind.ref_category().is_none() {
                continue;
            }
            if let Ok(value) = self.get(descriptor.name) {
                value.collect_refs(&mut out);
            }
        }
        out
    }

    /// All properties as an ordered attribute map.
    fn attributes(&self) -> IndexMap<String, PropertyValue> {
        self.properties()
            .iter()
            .filter_map(|d| self.get(d.name).ok().map(|v| (d.name.to_owned(), v)))
            .collect()
    }
}

pub(crate) fn unknown_property(model: &'static str, name: &str) -> SceneError {
    SceneError::UnknownProperty {
        model,
        property: name.to_owned(),
    }
}

pub(crate) fn expect_enum<T: Copy>(
    value: &PropertyValue,
    property: &str,
    options: &[(&str, T)],
) -> SceneResult<T> {
    let raw = value.expect_str(property)?;
    options
        .iter()
        .find(|(label, _)| *label == raw)
        .map(|(_, item)| *item)
        .ok_or_else(|| {
            let allowed: Vec<&str> = options.iter().map(|(label, _)| *label).collect();
            SceneError::validation(
                property,
                format!("`{raw}` is not one of [{}]", allowed.join(", ")),
            )
        })
}

/// Positional and keyword constructor arguments, mirroring how models are
/// declared by scripting front ends.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModelArgs {
    pub positional: Vec<PropertyValue>,
    pub keywords: IndexMap<String, PropertyValue>,
}

impl ModelArgs {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn arg(mut self, value: impl Into<PropertyValue>) -> Self {
        self.positional.push(value.into());
        self
    }

    #[must_use]
    pub fn kwarg(mut self, name: &str, value: impl Into<PropertyValue>) -> Self {
        self.keywords.insert(name.to_owned(), value.into());
        self
    }

    /// Applies keyword arguments to a freshly built container.
    pub fn apply_keywords<C: PropertyContainer>(&self, container: &mut C) -> SceneResult<()> {
        for (name, value) in &self.keywords {
            container.apply(name, value.clone())?;
        }
        Ok(())
    }
}
