use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::core::property::{
    ModelCategory, PropertyContainer, PropertyDescriptor, PropertyKind, expect_enum,
    unknown_property,
};
use crate::core::value::{ref_list, ref_map};
use crate::core::{ModelId, PropertyValue};
use crate::error::{SceneError, SceneResult};

/// Mapping from data space to the screen along one plot dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScaleKind {
    #[default]
    Linear,
    Log,
}

impl ScaleKind {
    const OPTIONS: &'static [(&'static str, Self)] = &[("linear", Self::Linear), ("log", Self::Log)];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Log => "log",
        }
    }
}

const NULLABLE_RANGE: PropertyKind = PropertyKind::Nullable(&PropertyKind::Ref(ModelCategory::Range));

const PLOT_PROPERTIES: &[PropertyDescriptor] = &[
    PropertyDescriptor::new("title", PropertyKind::Nullable(&PropertyKind::String)),
    PropertyDescriptor::new("width", PropertyKind::Integer),
    PropertyDescriptor::new("height", PropertyKind::Integer),
    PropertyDescriptor::new("x_range", NULLABLE_RANGE),
    PropertyDescriptor::new("y_range", NULLABLE_RANGE),
    PropertyDescriptor::new("x_scale", PropertyKind::Enum(&["linear", "log"])),
    PropertyDescriptor::new("y_scale", PropertyKind::Enum(&["linear", "log"])),
    PropertyDescriptor::new("extra_x_ranges", PropertyKind::RefMap(ModelCategory::Range)),
    PropertyDescriptor::new("extra_y_ranges", PropertyKind::RefMap(ModelCategory::Range)),
    PropertyDescriptor::new("renderers", PropertyKind::RefList(ModelCategory::Renderer)),
    PropertyDescriptor::new("below", PropertyKind::RefList(ModelCategory::Axis)),
    PropertyDescriptor::new("left", PropertyKind::RefList(ModelCategory::Axis)),
    PropertyDescriptor::new("tools", PropertyKind::RefList(ModelCategory::Tool)),
];

/// Container of ranges, renderers, axes and tools.
#[derive(Debug, Clone, PartialEq)]
pub struct Plot {
    pub title: Option<String>,
    pub width: u32,
    pub height: u32,
    pub x_range: Option<ModelId>,
    pub y_range: Option<ModelId>,
    pub x_scale: ScaleKind,
    pub y_scale: ScaleKind,
    pub extra_x_ranges: IndexMap<String, ModelId>,
    pub extra_y_ranges: IndexMap<String, ModelId>,
    pub renderers: Vec<ModelId>,
    pub below: Vec<ModelId>,
    pub left: Vec<ModelId>,
    pub tools: Vec<ModelId>,
}

impl Plot {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            title: None,
            width,
            height,
            x_range: None,
            y_range: None,
            x_scale: ScaleKind::Linear,
            y_scale: ScaleKind::Linear,
            extra_x_ranges: IndexMap::new(),
            extra_y_ranges: IndexMap::new(),
            renderers: Vec::new(),
            below: Vec::new(),
            left: Vec::new(),
            tools: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_ranges(mut self, x_range: ModelId, y_range: ModelId) -> Self {
        self.x_range = Some(x_range);
        self.y_range = Some(y_range);
        self
    }

    #[must_use]
    pub fn with_title(mut self, title: &str) -> Self {
        self.title = Some(title.to_owned());
        self
    }

    /// Range a renderer's `x_range_name`/`y_range_name` resolves to.
    #[must_use]
    pub fn range_named(&self, horizontal: bool, name: &str) -> Option<&ModelId> {
        let (default, extra) = if horizontal {
            (&self.x_range, &self.extra_x_ranges)
        } else {
            (&self.y_range, &self.extra_y_ranges)
        };
        if name == crate::core::renderer::DEFAULT_RANGE_NAME {
            default.as_ref()
        } else {
            extra.get(name)
        }
    }

    /// Whether `range` is used by this plot in the given dimension, and under
    /// which renderer range name.
    #[must_use]
    pub fn range_name_of(&self, horizontal: bool, range: &ModelId) -> Option<&str> {
        let (default, extra) = if horizontal {
            (&self.x_range, &self.extra_x_ranges)
        } else {
            (&self.y_range, &self.extra_y_ranges)
        };
        if default.as_ref() == Some(range) {
            return Some(crate::core::renderer::DEFAULT_RANGE_NAME);
        }
        extra
            .iter()
            .find(|(_, id)| *id == range)
            .map(|(name, _)| name.as_str())
    }
}

impl PropertyContainer for Plot {
    fn type_name(&self) -> &'static str {
        "Plot"
    }

    fn properties(&self) -> &'static [PropertyDescriptor] {
        PLOT_PROPERTIES
    }

    fn get(&self, name: &str) -> SceneResult<PropertyValue> {
        Ok(match name {
            "title" => self.title.clone().into(),
            "width" => f64::from(self.width).into(),
            "height" => f64::from(self.height).into(),
            "x_range" => self.x_range.clone().into(),
            "y_range" => self.y_range.clone().into(),
            "x_scale" => self.x_scale.label().into(),
            "y_scale" => self.y_scale.label().into(),
            "extra_x_ranges" => ref_map(&self.extra_x_ranges),
            "extra_y_ranges" => ref_map(&self.extra_y_ranges),
            "renderers" => ref_list(&self.renderers),
            "below" => ref_list(&self.below),
            "left" => ref_list(&self.left),
            "tools" => ref_list(&self.tools),
            _ => return Err(unknown_property(self.type_name(), name)),
        })
    }

    fn apply(&mut self, name: &str, value: PropertyValue) -> SceneResult<()> {
        match name {
            "title" => self.title = value.expect_optional_string(name)?,
            "width" => self.width = expect_dimension(&value, name)?,
            "height" => self.height = expect_dimension(&value, name)?,
            "x_range" => self.x_range = value.expect_optional_ref(name)?,
            "y_range" => self.y_range = value.expect_optional_ref(name)?,
            "x_scale" => self.x_scale = expect_enum(&value, name, ScaleKind::OPTIONS)?,
            "y_scale" => self.y_scale = expect_enum(&value, name, ScaleKind::OPTIONS)?,
            "extra_x_ranges" => self.extra_x_ranges = value.expect_ref_map(name)?,
            "extra_y_ranges" => self.extra_y_ranges = value.expect_ref_map(name)?,
            "renderers" => self.renderers = value.expect_ref_list(name)?,
            "below" => self.below = value.expect_ref_list(name)?,
            "left" => self.left = value.expect_ref_list(name)?,
            "tools" => self.tools = value.expect_ref_list(name)?,
            _ => return Err(unknown_property(self.type_name(), name)),
        }
        Ok(())
    }
}

fn expect_dimension(value: &PropertyValue, property: &str) -> SceneResult<u32> {
    let pixels = value.expect_usize(property)?;
    u32::try_from(pixels)
        .ok()
        .filter(|pixels| *pixels > 0)
        .ok_or_else(|| SceneError::validation(property, "plot dimension must be in 1..=u32::MAX"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AxisKind {
    #[default]
    Linear,
    Log,
    Categorical,
    Datetime,
}

impl AxisKind {
    const OPTIONS: &'static [(&'static str, Self)] = &[
        ("linear", Self::Linear),
        ("log", Self::Log),
        ("categorical", Self::Categorical),
        ("datetime", Self::Datetime),
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Log => "log",
            Self::Categorical => "categorical",
            Self::Datetime => "datetime",
        }
    }
}

const AXIS_PROPERTIES: &[PropertyDescriptor] = &[
    PropertyDescriptor::new(
        "kind",
        PropertyKind::Enum(&["linear", "log", "categorical", "datetime"]),
    ),
    PropertyDescriptor::new("axis_label", PropertyKind::Nullable(&PropertyKind::String)),
];

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Axis {
    pub kind: AxisKind,
    pub axis_label: Option<String>,
}

impl Axis {
    #[must_use]
    pub fn new(kind: AxisKind) -> Self {
        Self {
            kind,
            axis_label: None,
        }
    }
}

impl PropertyContainer for Axis {
    fn type_name(&self) -> &'static str {
        "Axis"
    }

    fn properties(&self) -> &'static [PropertyDescriptor] {
        AXIS_PROPERTIES
    }

    fn get(&self, name: &str) -> SceneResult<PropertyValue> {
        Ok(match name {
            "kind" => self.kind.label().into(),
            "axis_label" => self.axis_label.clone().into(),
            _ => return Err(unknown_property(self.type_name(), name)),
        })
    }

    fn apply(&mut self, name: &str, value: PropertyValue) -> SceneResult<()> {
        match name {
            "kind" => self.kind = expect_enum(&value, name, AxisKind::OPTIONS)?,
            "axis_label" => self.axis_label = value.expect_optional_string(name)?,
            _ => return Err(unknown_property(self.type_name(), name)),
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    Pan,
    WheelZoom,
    BoxZoom,
    Reset,
    Save,
    Hover,
}

impl ToolKind {
    const OPTIONS: &'static [(&'static str, Self)] = &[
        ("pan", Self::Pan),
        ("wheel_zoom", Self::WheelZoom),
        ("box_zoom", Self::BoxZoom),
        ("reset", Self::Reset),
        ("save", Self::Save),
        ("hover", Self::Hover),
    ];

    #[must_use]
    pub fn label(self) -> &'static str {
        Self::OPTIONS
            .iter()
            .find(|(_, kind)| *kind == self)
            .map_or("pan", |(label, _)| label)
    }
}

const TOOL_PROPERTIES: &[PropertyDescriptor] = &[
    PropertyDescriptor::new(
        "kind",
        PropertyKind::Enum(&["pan", "wheel_zoom", "box_zoom", "reset", "save", "hover"]),
    ),
    PropertyDescriptor::new(
        "plot",
        PropertyKind::Nullable(&PropertyKind::Ref(ModelCategory::Plot)),
    ),
    PropertyDescriptor::new("renderers", PropertyKind::RefList(ModelCategory::Renderer)),
];

/// Interaction tool. `plot` may point back at the plot listing the tool.
#[derive(Debug, Clone, PartialEq)]
pub struct Tool {
    pub kind: ToolKind,
    pub plot: Option<ModelId>,
    pub renderers: Vec<ModelId>,
}

impl Tool {
    #[must_use]
    pub fn new(kind: ToolKind) -> Self {
        Self {
            kind,
            plot: None,
            renderers: Vec::new(),
        }
    }
}

impl PropertyContainer for Tool {
    fn type_name(&self) -> &'static str {
        "Tool"
    }

    fn properties(&self) -> &'static [PropertyDescriptor] {
        TOOL_PROPERTIES
    }

    fn get(&self, name: &str) -> SceneResult<PropertyValue> {
        Ok(match name {
            "kind" => self.kind.label().into(),
            "plot" => self.plot.clone().into(),
            "renderers" => ref_list(&self.renderers),
            _ => return Err(unknown_property(self.type_name(), name)),
        })
    }

    fn apply(&mut self, name: &str, value: PropertyValue) -> SceneResult<()> {
        match name {
            "kind" => self.kind = expect_enum(&value, name, ToolKind::OPTIONS)?,
            "plot" => self.plot = value.expect_optional_ref(name)?,
            "renderers" => self.renderers = value.expect_ref_list(name)?,
            _ => return Err(unknown_property(self.type_name(), name)),
        }
        Ok(())
    }
}
