use crate::core::property::{ModelArgs, ModelCategory, PropertyContainer, PropertyDescriptor};
use crate::core::{
    Axis, CdsView, ColumnDataSource, DataRange1d, FactorRange, Filter, Glyph, GlyphRenderer,
    ModelId, Plot, PropertyValue, Range1d, Tool, ToolKind,
};
use crate::core::plot::AxisKind;
use crate::error::{SceneError, SceneResult};

/// Every model kind a document can hold.
#[derive(Debug, Clone, PartialEq)]
pub enum Model {
    ColumnDataSource(ColumnDataSource),
    CdsView(CdsView),
    Filter(Filter),
    Range1d(Range1d),
    DataRange1d(DataRange1d),
    FactorRange(FactorRange),
    Glyph(Glyph),
    GlyphRenderer(GlyphRenderer),
    Plot(Plot),
    Axis(Axis),
    Tool(Tool),
}

impl Model {
    #[must_use]
    pub fn category(&self) -> ModelCategory {
        match self {
            Self::ColumnDataSource(_) => ModelCategory::DataSource,
            Self::CdsView(_) => ModelCategory::View,
            Self::Filter(_) => ModelCategory::Filter,
            Self::Range1d(_) | Self::DataRange1d(_) | Self::FactorRange(_) => {
                ModelCategory::Range
            }
            Self::Glyph(_) => ModelCategory::Glyph,
            Self::GlyphRenderer(_) => ModelCategory::Renderer,
            Self::Plot(_) => ModelCategory::Plot,
            Self::Axis(_) => ModelCategory::Axis,
            Self::Tool(_) => ModelCategory::Tool,
        }
    }

    /// Default-valued instance of a wire type, filled in by a later pass.
    pub fn bare(type_name: &str) -> SceneResult<Self> {
        let placeholder = ModelId::new("");
        Ok(match type_name {
            "ColumnDataSource" => Self::ColumnDataSource(ColumnDataSource::default()),
            "CDSView" => Self::CdsView(CdsView::default()),
            "Range1d" => Self::Range1d(Range1d::default()),
            "DataRange1d" => Self::DataRange1d(DataRange1d::default()),
            "FactorRange" => Self::FactorRange(FactorRange::default()),
            "GlyphRenderer" => {
                Self::GlyphRenderer(GlyphRenderer::new(placeholder.clone(), placeholder))
            }
            "Plot" => Self::Plot(Plot::new(
                crate::core::defaults::DEFAULT_PLOT_WIDTH,
                crate::core::defaults::DEFAULT_PLOT_HEIGHT,
            )),
            "Axis" => Self::Axis(Axis::new(AxisKind::Linear)),
            "Tool" => Self::Tool(Tool::new(ToolKind::Pan)),
            other => {
                if let Some(filter) = Filter::bare(other) {
                    Self::Filter(filter)
                } else if let Some(glyph) = Glyph::bare(other) {
                    Self::Glyph(glyph)
                } else {
                    return Err(SceneError::UnknownModelType(other.to_owned()));
                }
            }
        })
    }

    /// Builds a model from constructor arguments.
    ///
    /// Ranges have dedicated positional rules; every other type accepts
    /// keywords only.
    pub fn from_args(type_name: &str, args: &ModelArgs) -> SceneResult<Self> {
        match type_name {
            "Range1d" => return Range1d::from_args(args).map(Self::Range1d),
            "FactorRange" => return FactorRange::from_args(args).map(Self::FactorRange),
            _ => {}
        }
        let mut model = Self::bare(type_name)?;
        if !args.positional.is_empty() {
            return Err(SceneError::invalid_argument(
                model.type_name(),
                "only keyword arguments are accepted",
            ));
        }
        args.apply_keywords(&mut model)?;
        Ok(model)
    }

    fn container(&self) -> &dyn PropertyContainer {
        match self {
            Self::ColumnDataSource(model) => model,
            Self::CdsView(model) => model,
            Self::Filter(model) => model,
            Self::Range1d(model) => model,
            Self::DataRange1d(model) => model,
            Self::FactorRange(model) => model,
            Self::Glyph(model) => model,
            Self::GlyphRenderer(model) => model,
            Self::Plot(model) => model,
            Self::Axis(model) => model,
            Self::Tool(model) => model,
        }
    }

    fn container_mut(&mut self) -> &mut dyn PropertyContainer {
        match self {
            Self::ColumnDataSource(model) => model,
            Self::CdsView(model) => model,
            Self::Filter(model) => model,
            Self::Range1d(model) => model,
            Self::DataRange1d(model) => model,
            Self::FactorRange(model) => model,
            Self::Glyph(model) => model,
            Self::GlyphRenderer(model) => model,
            Self::Plot(model) => model,
            Self::Axis(model) => model,
            Self::Tool(model) => model,
        }
    }

    #[must_use]
    pub fn as_source(&self) -> Option<&ColumnDataSource> {
        match self {
            Self::ColumnDataSource(source) => Some(source),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_view(&self) -> Option<&CdsView> {
        match self {
            Self::CdsView(view) => Some(view),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_filter(&self) -> Option<&Filter> {
        match self {
            Self::Filter(filter) => Some(filter),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_glyph(&self) -> Option<&Glyph> {
        match self {
            Self::Glyph(glyph) => Some(glyph),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_renderer(&self) -> Option<&GlyphRenderer> {
        match self {
            Self::GlyphRenderer(renderer) => Some(renderer),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_plot(&self) -> Option<&Plot> {
        match self {
            Self::Plot(plot) => Some(plot),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_auto_range(&self) -> bool {
        matches!(self, Self::DataRange1d(_) | Self::FactorRange(_))
    }
}

impl PropertyContainer for Model {
    fn type_name(&self) -> &'static str {
        self.container().type_name()
    }

    fn properties(&self) -> &'static [PropertyDescriptor] {
        self.container().properties()
    }

    fn get(&self, name: &str) -> SceneResult<PropertyValue> {
        self.container().get(name)
    }

    fn apply(&mut self, name: &str, value: PropertyValue) -> SceneResult<()> {
        self.container_mut().apply(name, value)
    }
}

macro_rules! model_from {
    ($($variant:ident),* $(,)?) => {$(
        impl From<$variant> for Model {
            fn from(model: $variant) -> Self {
                Self::$variant(model)
            }
        }
    )*};
}

model_from!(
    ColumnDataSource,
    CdsView,
    Filter,
    Range1d,
    DataRange1d,
    FactorRange,
    Glyph,
    GlyphRenderer,
    Plot,
    Axis,
    Tool,
);

/// A model stored in a document together with its identity.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelEntry {
    pub id: ModelId,
    pub name: Option<String>,
    pub body: Model,
}

impl ModelEntry {
    #[must_use]
    pub fn new(id: ModelId, body: Model) -> Self {
        Self {
            id,
            name: None,
            body,
        }
    }

    /// Property lookup including the document-level `name`.
    pub fn get(&self, property: &str) -> SceneResult<PropertyValue> {
        if property == "name" {
            return Ok(self.name.clone().into());
        }
        self.body.get(property)
    }

    /// Stores a property value, returning the previous value.
    pub fn set(&mut self, property: &str, value: PropertyValue) -> SceneResult<PropertyValue> {
        if property == "name" {
            let name = value.expect_optional_string(property)?;
            return Ok(std::mem::replace(&mut self.name, name).into());
        }
        self.body.set(property, value)
    }
}
