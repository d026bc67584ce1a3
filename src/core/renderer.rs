use crate::core::property::{
    ModelCategory, PropertyContainer, PropertyDescriptor, PropertyKind, unknown_property,
};
use crate::core::{ModelId, PropertyValue};
use crate::error::{SceneError, SceneResult};

/// Alpha factor applied to the base glyph for unselected rows.
pub const NONSELECTION_ALPHA: f64 = 0.1;
/// Alpha factor applied to the base glyph of a muted renderer.
pub const MUTED_ALPHA: f64 = 0.2;

/// Glyph used for one interaction state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateGlyph {
    /// Derived from the base glyph.
    Auto,
    /// Nothing special is drawn for this state.
    Disabled,
    Explicit(ModelId),
}

impl StateGlyph {
    #[must_use]
    pub fn to_value(&self) -> PropertyValue {
        match self {
            Self::Auto => "auto".into(),
            Self::Disabled => PropertyValue::Null,
            Self::Explicit(id) => PropertyValue::Ref(id.clone()),
        }
    }

    pub fn from_value(value: &PropertyValue, property: &str) -> SceneResult<Self> {
        match value {
            PropertyValue::Null => Ok(Self::Disabled),
            PropertyValue::String(raw) if raw == "auto" => Ok(Self::Auto),
            PropertyValue::Ref(id) => Ok(Self::Explicit(id.clone())),
            other => Err(SceneError::validation(
                property,
                format!("expected \"auto\", null or a glyph reference, got {}", other.type_label()),
            )),
        }
    }

    #[must_use]
    pub fn explicit(&self) -> Option<&ModelId> {
        match self {
            Self::Explicit(id) => Some(id),
            Self::Auto | Self::Disabled => None,
        }
    }
}

/// Interaction state a row is drawn in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderState {
    Normal,
    Selected,
    Nonselected,
    Hovered,
    Muted,
}

const STATE_GLYPH: PropertyKind = PropertyKind::StateGlyph;

const GLYPH_RENDERER_PROPERTIES: &[PropertyDescriptor] = &[
    PropertyDescriptor::new("data_source", PropertyKind::Ref(ModelCategory::DataSource)),
    PropertyDescriptor::new(
        "view",
        PropertyKind::Nullable(&PropertyKind::Ref(ModelCategory::View)),
    ),
    PropertyDescriptor::new("glyph", PropertyKind::Ref(ModelCategory::Glyph)),
    PropertyDescriptor::new("selection_glyph", STATE_GLYPH),
    PropertyDescriptor::new("nonselection_glyph", STATE_GLYPH),
    PropertyDescriptor::new("hover_glyph", STATE_GLYPH),
    PropertyDescriptor::new("muted_glyph", STATE_GLYPH),
    PropertyDescriptor::new("visible", PropertyKind::Bool),
    PropertyDescriptor::new("muted", PropertyKind::Bool),
    PropertyDescriptor::new("x_range_name", PropertyKind::String),
    PropertyDescriptor::new("y_range_name", PropertyKind::String),
];

pub const DEFAULT_RANGE_NAME: &str = "default";

/// Binds a glyph to a data source and an optional view.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphRenderer {
    pub data_source: ModelId,
    /// `None` draws every row in source order.
    pub view: Option<ModelId>,
    pub glyph: ModelId,
    pub selection_glyph: StateGlyph,
    pub nonselection_glyph: StateGlyph,
    pub hover_glyph: StateGlyph,
    pub muted_glyph: StateGlyph,
    pub visible: bool,
    pub muted: bool,
    pub x_range_name: String,
    pub y_range_name: String,
}

impl GlyphRenderer {
    #[must_use]
    pub fn new(data_source: ModelId, glyph: ModelId) -> Self {
        Self {
            data_source,
            view: None,
            glyph,
            selection_glyph: StateGlyph::Auto,
            nonselection_glyph: StateGlyph::Auto,
            hover_glyph: StateGlyph::Disabled,
            muted_glyph: StateGlyph::Auto,
            visible: true,
            muted: false,
            x_range_name: DEFAULT_RANGE_NAME.to_owned(),
            y_range_name: DEFAULT_RANGE_NAME.to_owned(),
        }
    }

    #[must_use]
    pub fn with_view(mut self, view: ModelId) -> Self {
        self.view = Some(view);
        self
    }

    #[must_use]
    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    #[must_use]
    pub fn state_glyph(&self, state: RenderState) -> Option<&StateGlyph> {
        match state {
            RenderState::Normal => None,
            RenderState::Selected => Some(&self.selection_glyph),
            RenderState::Nonselected => Some(&self.nonselection_glyph),
            RenderState::Hovered => Some(&self.hover_glyph),
            RenderState::Muted => Some(&self.muted_glyph),
        }
    }

    /// Alpha factor an `Auto` state glyph applies to the base glyph.
    #[must_use]
    pub fn auto_alpha(state: RenderState) -> f64 {
        match state {
            RenderState::Nonselected => NONSELECTION_ALPHA,
            RenderState::Muted => MUTED_ALPHA,
            RenderState::Normal | RenderState::Selected | RenderState::Hovered => 1.0,
        }
    }
}

impl PropertyContainer for GlyphRenderer {
    fn type_name(&self) -> &'static str {
        "GlyphRenderer"
    }

    fn properties(&self) -> &'static [PropertyDescriptor] {
        GLYPH_RENDERER_PROPERTIES
    }

    fn get(&self, name: &str) -> SceneResult<PropertyValue> {
        Ok(match name {
            "data_source" => self.data_source.clone().into(),
            "view" => self.view.clone().into(),
            "glyph" => self.glyph.clone().into(),
            "selection_glyph" => self.selection_glyph.to_value(),
            "nonselection_glyph" => self.nonselection_glyph.to_value(),
            "hover_glyph" => self.hover_glyph.to_value(),
            "muted_glyph" => self.muted_glyph.to_value(),
            "visible" => self.visible.into(),
            "muted" => self.muted.into(),
            "x_range_name" => self.x_range_name.clone().into(),
            "y_range_name" => self.y_range_name.clone().into(),
            _ => return Err(unknown_property(self.type_name(), name)),
        })
    }

    fn apply(&mut self, name: &str, value: PropertyValue) -> SceneResult<()> {
        match name {
            "data_source" => self.data_source = value.expect_ref(name)?,
            "view" => self.view = value.expect_optional_ref(name)?,
            "glyph" => self.glyph = value.expect_ref(name)?,
            "selection_glyph" => self.selection_glyph = StateGlyph::from_value(&value, name)?,
            "nonselection_glyph" => {
                self.nonselection_glyph = StateGlyph::from_value(&value, name)?;
            }
            "hover_glyph" => self.hover_glyph = StateGlyph::from_value(&value, name)?,
            "muted_glyph" => self.muted_glyph = StateGlyph::from_value(&value, name)?,
            "visible" => self.visible = value.expect_bool(name)?,
            "muted" => self.muted = value.expect_bool(name)?,
            "x_range_name" => self.x_range_name = value.expect_str(name)?.to_owned(),
            "y_range_name" => self.y_range_name = value.expect_str(name)?.to_owned(),
            _ => return Err(unknown_property(self.type_name(), name)),
        }
        Ok(())
    }
}
