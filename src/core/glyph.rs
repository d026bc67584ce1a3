//! Visual glyph specifications.
//!
//! Coordinates are [`DataSpec`]s naming a column or holding a constant.
//! Line and fill visuals are shared field groups embedded by value and
//! exposed through [`HasLineProps`] / [`HasFillProps`]. Unset visual fields
//! fall back to the base glyph of a renderer and then to the defaults below.

use smallvec::SmallVec;

use crate::core::PropertyValue;
use crate::core::property::{
    PropertyContainer, PropertyDescriptor, PropertyKind, expect_enum, unknown_property,
};
use crate::error::{SceneError, SceneResult};
use crate::render::Color;

pub const DEFAULT_LINE_COLOR: &str = "black";
pub const DEFAULT_FILL_COLOR: &str = "gray";
pub const DEFAULT_LINE_WIDTH: f64 = 1.0;
pub const DEFAULT_MARKER_SIZE: f64 = 4.0;

/// Column reference or constant.
#[derive(Debug, Clone, PartialEq)]
pub enum DataSpec {
    Field(String),
    Value(f64),
}

impl DataSpec {
    #[must_use]
    pub fn field(name: &str) -> Self {
        Self::Field(name.to_owned())
    }

    #[must_use]
    pub fn field_name(&self) -> Option<&str> {
        match self {
            Self::Field(name) => Some(name),
            Self::Value(_) => None,
        }
    }

    #[must_use]
    pub fn to_value(&self) -> PropertyValue {
        let (key, value) = match self {
            Self::Field(name) => ("field", PropertyValue::String(name.clone())),
            Self::Value(number) => ("value", PropertyValue::Number(*number)),
        };
        PropertyValue::Map([(key.to_owned(), value)].into_iter().collect())
    }

    /// Accepts `{"field": name}`, `{"value": number}`, a bare column name or
    /// a bare number.
    pub fn from_value(value: &PropertyValue, property: &str) -> SceneResult<Self> {
        match value {
            PropertyValue::String(name) => Ok(Self::Field(name.clone())),
            PropertyValue::Number(number) => Ok(Self::Value(*number)),
            PropertyValue::Map(entries) if entries.len() == 1 => {
                if let Some(name) = entries.get("field") {
                    return Ok(Self::Field(name.expect_str(property)?.to_owned()));
                }
                if let Some(number) = entries.get("value") {
                    return Ok(Self::Value(number.expect_number(property)?));
                }
                Err(SceneError::validation(
                    property,
                    "data spec map needs a `field` or `value` key",
                ))
            }
            other => Err(SceneError::validation(
                property,
                format!("expected a data spec, got {}", other.type_label()),
            )),
        }
    }
}

impl From<&str> for DataSpec {
    fn from(name: &str) -> Self {
        Self::field(name)
    }
}

impl From<f64> for DataSpec {
    fn from(value: f64) -> Self {
        Self::Value(value)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LineProps {
    pub line_color: Option<String>,
    pub line_alpha: Option<f64>,
    pub line_width: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FillProps {
    pub fill_color: Option<String>,
    pub fill_alpha: Option<f64>,
}

pub trait HasLineProps {
    fn line_props(&self) -> &LineProps;
    fn line_props_mut(&mut self) -> &mut LineProps;
}

pub trait HasFillProps {
    fn fill_props(&self) -> &FillProps;
    fn fill_props_mut(&mut self) -> &mut FillProps;
}

const LINE_PROPERTY_NAMES: [&str; 3] = ["line_color", "line_alpha", "line_width"];
const FILL_PROPERTY_NAMES: [&str; 2] = ["fill_color", "fill_alpha"];

const NULLABLE_COLOR: PropertyKind = PropertyKind::Nullable(&PropertyKind::Color);
const NULLABLE_NON_NEGATIVE: PropertyKind = PropertyKind::Nullable(&PropertyKind::NonNegative);

impl LineProps {
    fn get(&self, name: &str) -> Option<PropertyValue> {
        Some(match name {
            "line_color" => self.line_color.clone().into(),
            "line_alpha" => self.line_alpha.into(),
            "line_width" => self.line_width.into(),
            _ => return None,
        })
    }

    fn apply(&mut self, name: &str, value: &PropertyValue) -> Option<SceneResult<()>> {
        let result = match name {
            "line_color" => expect_optional_color(value, name).map(|c| self.line_color = c),
            "line_alpha" => expect_optional_alpha(value, name).map(|a| self.line_alpha = a),
            "line_width" => value
                .expect_optional_finite(name)
                .and_then(|width| non_negative(width, name))
                .map(|width| self.line_width = width),
            _ => return None,
        };
        Some(result)
    }
}

impl FillProps {
    fn get(&self, name: &str) -> Option<PropertyValue> {
        Some(match name {
            "fill_color" => self.fill_color.clone().into(),
            "fill_alpha" => self.fill_alpha.into(),
            _ => return None,
        })
    }

    fn apply(&mut self, name: &str, value: &PropertyValue) -> Option<SceneResult<()>> {
        let result = match name {
            "fill_color" => expect_optional_color(value, name).map(|c| self.fill_color = c),
            "fill_alpha" => expect_optional_alpha(value, name).map(|a| self.fill_alpha = a),
            _ => return None,
        };
        Some(result)
    }
}

fn expect_optional_color(value: &PropertyValue, property: &str) -> SceneResult<Option<String>> {
    let color = value.expect_optional_string(property)?;
    if let Some(raw) = &color {
        Color::parse(raw).map_err(|err| SceneError::validation(property, err.to_string()))?;
    }
    Ok(color)
}

fn expect_optional_alpha(value: &PropertyValue, property: &str) -> SceneResult<Option<f64>> {
    let alpha = value.expect_optional_finite(property)?;
    if alpha.is_some_and(|alpha| !(0.0..=1.0).contains(&alpha)) {
        return Err(SceneError::validation(property, "alpha must be in [0, 1]"));
    }
    Ok(alpha)
}

fn non_negative(value: Option<f64>, property: &str) -> SceneResult<Option<f64>> {
    if value.is_some_and(|value| value < 0.0) {
        return Err(SceneError::validation(property, "number must be >= 0"));
    }
    Ok(value)
}

/// Marker shapes drawn by [`Scatter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MarkerType {
    #[default]
    Circle,
    Square,
    Triangle,
    Diamond,
    Cross,
    X,
}

impl MarkerType {
    const OPTIONS: &'static [(&'static str, Self)] = &[
        ("circle", Self::Circle),
        ("square", Self::Square),
        ("triangle", Self::Triangle),
        ("diamond", Self::Diamond),
        ("cross", Self::Cross),
        ("x", Self::X),
    ];
    const LABELS: &'static [&'static str] =
        &["circle", "square", "triangle", "diamond", "cross", "x"];

    #[must_use]
    pub fn label(self) -> &'static str {
        Self::OPTIONS
            .iter()
            .find(|(_, marker)| *marker == self)
            .map_or("circle", |(label, _)| label)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scatter {
    pub x: DataSpec,
    pub y: DataSpec,
    pub size: DataSpec,
    pub marker: MarkerType,
    pub line: LineProps,
    pub fill: FillProps,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub x: DataSpec,
    pub y: DataSpec,
    pub line: LineProps,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rect {
    pub x: DataSpec,
    pub y: DataSpec,
    pub width: DataSpec,
    pub height: DataSpec,
    pub line: LineProps,
    pub fill: FillProps,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VBar {
    pub x: DataSpec,
    pub width: DataSpec,
    pub top: DataSpec,
    pub bottom: DataSpec,
    pub line: LineProps,
    pub fill: FillProps,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HBar {
    pub y: DataSpec,
    pub height: DataSpec,
    pub left: DataSpec,
    pub right: DataSpec,
    pub line: LineProps,
    pub fill: FillProps,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Quad {
    pub left: DataSpec,
    pub right: DataSpec,
    pub top: DataSpec,
    pub bottom: DataSpec,
    pub line: LineProps,
    pub fill: FillProps,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Patch {
    pub x: DataSpec,
    pub y: DataSpec,
    pub line: LineProps,
    pub fill: FillProps,
}

/// One polyline per row; `xs`/`ys` name list-valued columns.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiLine {
    pub xs: DataSpec,
    pub ys: DataSpec,
    pub line: LineProps,
}

macro_rules! line_and_fill {
    ($($glyph:ty => line $(, fill $fill:ident)?;)*) => {$(
        impl HasLineProps for $glyph {
            fn line_props(&self) -> &LineProps {
                &self.line
            }

            fn line_props_mut(&mut self) -> &mut LineProps {
                &mut self.line
            }
        }

        $(
        impl HasFillProps for $glyph {
            fn fill_props(&self) -> &FillProps {
                &self.$fill
            }

            fn fill_props_mut(&mut self) -> &mut FillProps {
                &mut self.$fill
            }
        }
        )?
    )*};
}

line_and_fill! {
    Scatter => line, fill fill;
    Line => line;
    Rect => line, fill fill;
    VBar => line, fill fill;
    HBar => line, fill fill;
    Quad => line, fill fill;
    Patch => line, fill fill;
    MultiLine => line;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    X,
    Y,
}

/// A coordinate spec plus the optional full width/height centered on it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateSpec<'a> {
    pub spec: &'a DataSpec,
    pub extent: Option<&'a DataSpec>,
}

impl<'a> CoordinateSpec<'a> {
    fn point(spec: &'a DataSpec) -> Self {
        Self { spec, extent: None }
    }

    fn centered(spec: &'a DataSpec, extent: &'a DataSpec) -> Self {
        Self {
            spec,
            extent: Some(extent),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Glyph {
    Scatter(Scatter),
    Line(Line),
    Rect(Rect),
    VBar(VBar),
    HBar(HBar),
    Quad(Quad),
    Patch(Patch),
    MultiLine(MultiLine),
}

impl Glyph {
    #[must_use]
    pub fn scatter(x: impl Into<DataSpec>, y: impl Into<DataSpec>) -> Self {
        Self::Scatter(Scatter {
            x: x.into(),
            y: y.into(),
            size: DataSpec::Value(DEFAULT_MARKER_SIZE),
            marker: MarkerType::Circle,
            line: LineProps::default(),
            fill: FillProps::default(),
        })
    }

    #[must_use]
    pub fn line(x: impl Into<DataSpec>, y: impl Into<DataSpec>) -> Self {
        Self::Line(Line {
            x: x.into(),
            y: y.into(),
            line: LineProps::default(),
        })
    }

    #[must_use]
    pub fn rect(
        x: impl Into<DataSpec>,
        y: impl Into<DataSpec>,
        width: impl Into<DataSpec>,
        height: impl Into<DataSpec>,
    ) -> Self {
        Self::Rect(Rect {
            x: x.into(),
            y: y.into(),
            width: width.into(),
            height: height.into(),
            line: LineProps::default(),
            fill: FillProps::default(),
        })
    }

    #[must_use]
    pub fn vbar(x: impl Into<DataSpec>, width: f64, top: impl Into<DataSpec>) -> Self {
        Self::VBar(VBar {
            x: x.into(),
            width: DataSpec::Value(width),
            top: top.into(),
            bottom: DataSpec::Value(0.0),
            line: LineProps::default(),
            fill: FillProps::default(),
        })
    }

    #[must_use]
    pub fn hbar(y: impl Into<DataSpec>, height: f64, right: impl Into<DataSpec>) -> Self {
        Self::HBar(HBar {
            y: y.into(),
            height: DataSpec::Value(height),
            left: DataSpec::Value(0.0),
            right: right.into(),
            line: LineProps::default(),
            fill: FillProps::default(),
        })
    }

    #[must_use]
    pub fn quad(
        left: impl Into<DataSpec>,
        right: impl Into<DataSpec>,
        top: impl Into<DataSpec>,
        bottom: impl Into<DataSpec>,
    ) -> Self {
        Self::Quad(Quad {
            left: left.into(),
            right: right.into(),
            top: top.into(),
            bottom: bottom.into(),
            line: LineProps::default(),
            fill: FillProps::default(),
        })
    }

    #[must_use]
    pub fn patch(x: impl Into<DataSpec>, y: impl Into<DataSpec>) -> Self {
        Self::Patch(Patch {
            x: x.into(),
            y: y.into(),
            line: LineProps::default(),
            fill: FillProps::default(),
        })
    }

    #[must_use]
    pub fn multi_line(xs: impl Into<DataSpec>, ys: impl Into<DataSpec>) -> Self {
        Self::MultiLine(MultiLine {
            xs: xs.into(),
            ys: ys.into(),
            line: LineProps::default(),
        })
    }

    /// Bare instance for a wire type name.
    #[must_use]
    pub fn bare(type_name: &str) -> Option<Self> {
        let zero = || DataSpec::Value(0.0);
        Some(match type_name {
            "Scatter" => Self::scatter(zero(), zero()),
            "Line" => Self::line(zero(), zero()),
            "Rect" => Self::rect(zero(), zero(), 1.0, 1.0),
            "VBar" => Self::vbar(zero(), 1.0, zero()),
            "HBar" => Self::hbar(zero(), 1.0, zero()),
            "Quad" => Self::quad(zero(), zero(), zero(), zero()),
            "Patch" => Self::patch(zero(), zero()),
            "MultiLine" => Self::multi_line(zero(), zero()),
            _ => return None,
        })
    }

    #[must_use]
    pub fn with_line_color(mut self, color: &str) -> Self {
        self.line_props_mut().line_color = Some(color.to_owned());
        self
    }

    #[must_use]
    pub fn with_fill_color(mut self, color: &str) -> Self {
        if let Some(fill) = self.fill_props_mut() {
            fill.fill_color = Some(color.to_owned());
        }
        self
    }

    /// Whether rows are joined into one connected path.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Line(_) | Self::Patch(_))
    }

    #[must_use]
    pub fn line_props(&self) -> &LineProps {
        match self {
            Self::Scatter(glyph) => glyph.line_props(),
            Self::Line(glyph) => glyph.line_props(),
            Self::Rect(glyph) => glyph.line_props(),
            Self::VBar(glyph) => glyph.line_props(),
            Self::HBar(glyph) => glyph.line_props(),
            Self::Quad(glyph) => glyph.line_props(),
            Self::Patch(glyph) => glyph.line_props(),
            Self::MultiLine(glyph) => glyph.line_props(),
        }
    }

    pub fn line_props_mut(&mut self) -> &mut LineProps {
        match self {
            Self::Scatter(glyph) => glyph.line_props_mut(),
            Self::Line(glyph) => glyph.line_props_mut(),
            Self::Rect(glyph) => glyph.line_props_mut(),
            Self::VBar(glyph) => glyph.line_props_mut(),
            Self::HBar(glyph) => glyph.line_props_mut(),
            Self::Quad(glyph) => glyph.line_props_mut(),
            Self::Patch(glyph) => glyph.line_props_mut(),
            Self::MultiLine(glyph) => glyph.line_props_mut(),
        }
    }

    #[must_use]
    pub fn fill_props(&self) -> Option<&FillProps> {
        match self {
            Self::Scatter(glyph) => Some(glyph.fill_props()),
            Self::Rect(glyph) => Some(glyph.fill_props()),
            Self::VBar(glyph) => Some(glyph.fill_props()),
            Self::HBar(glyph) => Some(glyph.fill_props()),
            Self::Quad(glyph) => Some(glyph.fill_props()),
            Self::Patch(glyph) => Some(glyph.fill_props()),
            Self::Line(_) | Self::MultiLine(_) => None,
        }
    }

    pub fn fill_props_mut(&mut self) -> Option<&mut FillProps> {
        match self {
            Self::Scatter(glyph) => Some(glyph.fill_props_mut()),
            Self::Rect(glyph) => Some(glyph.fill_props_mut()),
            Self::VBar(glyph) => Some(glyph.fill_props_mut()),
            Self::HBar(glyph) => Some(glyph.fill_props_mut()),
            Self::Quad(glyph) => Some(glyph.fill_props_mut()),
            Self::Patch(glyph) => Some(glyph.fill_props_mut()),
            Self::Line(_) | Self::MultiLine(_) => None,
        }
    }

    /// Copy with every alpha scaled by `factor`, resolving unset alphas
    /// against `base`.
    #[must_use]
    pub fn faded(&self, base: &Glyph, factor: f64) -> Self {
        let mut glyph = self.clone();
        let line_alpha = self
            .line_props()
            .line_alpha
            .or(base.line_props().line_alpha)
            .unwrap_or(1.0);
        glyph.line_props_mut().line_alpha = Some(line_alpha * factor);
        let base_fill_alpha = base.fill_props().and_then(|fill| fill.fill_alpha);
        if let Some(fill) = glyph.fill_props_mut() {
            fill.fill_alpha = Some(fill.fill_alpha.or(base_fill_alpha).unwrap_or(1.0) * factor);
        }
        glyph
    }

    /// Coordinate specs contributing to the extent along `dimension`.
    #[must_use]
    pub fn coordinate_specs(&self, dimension: Dimension) -> SmallVec<[CoordinateSpec<'_>; 2]> {
        let mut specs = SmallVec::new();
        match (self, dimension) {
            (Self::Scatter(glyph), Dimension::X) => specs.push(CoordinateSpec::point(&glyph.x)),
            (Self::Scatter(glyph), Dimension::Y) => specs.push(CoordinateSpec::point(&glyph.y)),
            (Self::Line(glyph), Dimension::X) => specs.push(CoordinateSpec::point(&glyph.x)),
            (Self::Line(glyph), Dimension::Y) => specs.push(CoordinateSpec::point(&glyph.y)),
            (Self::Patch(glyph), Dimension::X) => specs.push(CoordinateSpec::point(&glyph.x)),
            (Self::Patch(glyph), Dimension::Y) => specs.push(CoordinateSpec::point(&glyph.y)),
            (Self::MultiLine(glyph), Dimension::X) => specs.push(CoordinateSpec::point(&glyph.xs)),
            (Self::MultiLine(glyph), Dimension::Y) => specs.push(CoordinateSpec::point(&glyph.ys)),
            (Self::Rect(glyph), Dimension::X) => {
                specs.push(CoordinateSpec::centered(&glyph.x, &glyph.width));
            }
            (Self::Rect(glyph), Dimension::Y) => {
                specs.push(CoordinateSpec::centered(&glyph.y, &glyph.height));
            }
            (Self::VBar(glyph), Dimension::X) => {
                specs.push(CoordinateSpec::centered(&glyph.x, &glyph.width));
            }
            (Self::VBar(glyph), Dimension::Y) => {
                specs.push(CoordinateSpec::point(&glyph.top));
                specs.push(CoordinateSpec::point(&glyph.bottom));
            }
            (Self::HBar(glyph), Dimension::X) => {
                specs.push(CoordinateSpec::point(&glyph.left));
                specs.push(CoordinateSpec::point(&glyph.right));
            }
            (Self::HBar(glyph), Dimension::Y) => {
                specs.push(CoordinateSpec::centered(&glyph.y, &glyph.height));
            }
            (Self::Quad(glyph), Dimension::X) => {
                specs.push(CoordinateSpec::point(&glyph.left));
                specs.push(CoordinateSpec::point(&glyph.right));
            }
            (Self::Quad(glyph), Dimension::Y) => {
                specs.push(CoordinateSpec::point(&glyph.top));
                specs.push(CoordinateSpec::point(&glyph.bottom));
            }
        }
        specs
    }

    /// Every column name the glyph reads.
    #[must_use]
    pub fn fields(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .data_specs()
            .into_iter()
            .filter_map(DataSpec::field_name)
            .collect();
        names.dedup();
        names
    }

    fn data_specs(&self) -> SmallVec<[&DataSpec; 4]> {
        match self {
            Self::Scatter(glyph) => SmallVec::from_slice(&[&glyph.x, &glyph.y, &glyph.size]),
            Self::Line(glyph) => SmallVec::from_slice(&[&glyph.x, &glyph.y]),
            Self::Rect(glyph) => {
                SmallVec::from_slice(&[&glyph.x, &glyph.y, &glyph.width, &glyph.height])
            }
            Self::VBar(glyph) => {
                SmallVec::from_slice(&[&glyph.x, &glyph.width, &glyph.top, &glyph.bottom])
            }
            Self::HBar(glyph) => {
                SmallVec::from_slice(&[&glyph.y, &glyph.height, &glyph.left, &glyph.right])
            }
            Self::Quad(glyph) => {
                SmallVec::from_slice(&[&glyph.left, &glyph.right, &glyph.top, &glyph.bottom])
            }
            Self::Patch(glyph) => SmallVec::from_slice(&[&glyph.x, &glyph.y]),
            Self::MultiLine(glyph) => SmallVec::from_slice(&[&glyph.xs, &glyph.ys]),
        }
    }

    fn spec_names(&self) -> &'static [&'static str] {
        match self {
            Self::Scatter(_) => &["x", "y", "size"],
            Self::Line(_) | Self::Patch(_) => &["x", "y"],
            Self::Rect(_) => &["x", "y", "width", "height"],
            Self::VBar(_) => &["x", "width", "top", "bottom"],
            Self::HBar(_) => &["y", "height", "left", "right"],
            Self::Quad(_) => &["left", "right", "top", "bottom"],
            Self::MultiLine(_) => &["xs", "ys"],
        }
    }

    fn spec_mut(&mut self, name: &str) -> Option<&mut DataSpec> {
        Some(match (self, name) {
            (Self::Scatter(glyph), "x") => &mut glyph.x,
            (Self::Scatter(glyph), "y") => &mut glyph.y,
            (Self::Scatter(glyph), "size") => &mut glyph.size,
            (Self::Line(glyph), "x") => &mut glyph.x,
            (Self::Line(glyph), "y") => &mut glyph.y,
            (Self::Patch(glyph), "x") => &mut glyph.x,
            (Self::Patch(glyph), "y") => &mut glyph.y,
            (Self::Rect(glyph), "x") => &mut glyph.x,
            (Self::Rect(glyph), "y") => &mut glyph.y,
            (Self::Rect(glyph), "width") => &mut glyph.width,
            (Self::Rect(glyph), "height") => &mut glyph.height,
            (Self::VBar(glyph), "x") => &mut glyph.x,
            (Self::VBar(glyph), "width") => &mut glyph.width,
            (Self::VBar(glyph), "top") => &mut glyph.top,
            (Self::VBar(glyph), "bottom") => &mut glyph.bottom,
            (Self::HBar(glyph), "y") => &mut glyph.y,
            (Self::HBar(glyph), "height") => &mut glyph.height,
            (Self::HBar(glyph), "left") => &mut glyph.left,
            (Self::HBar(glyph), "right") => &mut glyph.right,
            (Self::Quad(glyph), "left") => &mut glyph.left,
            (Self::Quad(glyph), "right") => &mut glyph.right,
            (Self::Quad(glyph), "top") => &mut glyph.top,
            (Self::Quad(glyph), "bottom") => &mut glyph.bottom,
            (Self::MultiLine(glyph), "xs") => &mut glyph.xs,
            (Self::MultiLine(glyph), "ys") => &mut glyph.ys,
            _ => return None,
        })
    }

    fn spec(&self, name: &str) -> Option<&DataSpec> {
        let index = self.spec_names().iter().position(|spec| *spec == name)?;
        self.data_specs().get(index).copied()
    }
}

const SCATTER_PROPERTIES: &[PropertyDescriptor] = &[
    PropertyDescriptor::new("x", PropertyKind::DataSpec),
    PropertyDescriptor::new("y", PropertyKind::DataSpec),
    PropertyDescriptor::new("size", PropertyKind::DataSpec),
    PropertyDescriptor::new("marker", PropertyKind::Enum(MarkerType::LABELS)),
    PropertyDescriptor::new("line_color", NULLABLE_COLOR),
    PropertyDescriptor::new("line_alpha", NULLABLE_NON_NEGATIVE),
    PropertyDescriptor::new("line_width", NULLABLE_NON_NEGATIVE),
    PropertyDescriptor::new("fill_color", NULLABLE_COLOR),
    PropertyDescriptor::new("fill_alpha", NULLABLE_NON_NEGATIVE),
];

const LINE_PROPERTIES: &[PropertyDescriptor] = &[
    PropertyDescriptor::new("x", PropertyKind::DataSpec),
    PropertyDescriptor::new("y", PropertyKind::DataSpec),
    PropertyDescriptor::new("line_color", NULLABLE_COLOR),
    PropertyDescriptor::new("line_alpha", NULLABLE_NON_NEGATIVE),
    PropertyDescriptor::new("line_width", NULLABLE_NON_NEGATIVE),
];

const RECT_PROPERTIES: &[PropertyDescriptor] = &[
    PropertyDescriptor::new("x", PropertyKind::DataSpec),
    PropertyDescriptor::new("y", PropertyKind::DataSpec),
    PropertyDescriptor::new("width", PropertyKind::DataSpec),
    PropertyDescriptor::new("height", PropertyKind::DataSpec),
    PropertyDescriptor::new("line_color", NULLABLE_COLOR),
    PropertyDescriptor::new("line_alpha", NULLABLE_NON_NEGATIVE),
    PropertyDescriptor::new("line_width", NULLABLE_NON_NEGATIVE),
    PropertyDescriptor::new("fill_color", NULLABLE_COLOR),
    PropertyDescriptor::new("fill_alpha", NULLABLE_NON_NEGATIVE),
];

const VBAR_PROPERTIES: &[PropertyDescriptor] = &[
    PropertyDescriptor::new("x", PropertyKind::DataSpec),
    PropertyDescriptor::new("width", PropertyKind::DataSpec),
    PropertyDescriptor::new("top", PropertyKind::DataSpec),
    PropertyDescriptor::new("bottom", PropertyKind::DataSpec),
    PropertyDescriptor::new("line_color", NULLABLE_COLOR),
    PropertyDescriptor::new("line_alpha", NULLABLE_NON_NEGATIVE),
    PropertyDescriptor::new("line_width", NULLABLE_NON_NEGATIVE),
    PropertyDescriptor::new("fill_color", NULLABLE_COLOR),
    PropertyDescriptor::new("fill_alpha", NULLABLE_NON_NEGATIVE),
];

const HBAR_PROPERTIES: &[PropertyDescriptor] = &[
    PropertyDescriptor::new("y", PropertyKind::DataSpec),
    PropertyDescriptor::new("height", PropertyKind::DataSpec),
    PropertyDescriptor::new("left", PropertyKind::DataSpec),
    PropertyDescriptor::new("right", PropertyKind::DataSpec),
    PropertyDescriptor::new("line_color", NULLABLE_COLOR),
    PropertyDescriptor::new("line_alpha", NULLABLE_NON_NEGATIVE),
    PropertyDescriptor::new("line_width", NULLABLE_NON_NEGATIVE),
    PropertyDescriptor::new("fill_color", NULLABLE_COLOR),
    PropertyDescriptor::new("fill_alpha", NULLABLE_NON_NEGATIVE),
];

const QUAD_PROPERTIES: &[PropertyDescriptor] = &[
    PropertyDescriptor::new("left", PropertyKind::DataSpec),
    PropertyDescriptor::new("right", PropertyKind::DataSpec),
    PropertyDescriptor::new("top", PropertyKind::DataSpec),
    PropertyDescriptor::new("bottom", PropertyKind::DataSpec),
    PropertyDescriptor::new("line_color", NULLABLE_COLOR),
    PropertyDescriptor::new("line_alpha", NULLABLE_NON_NEGATIVE),
    PropertyDescriptor::new("line_width", NULLABLE_NON_NEGATIVE),
    PropertyDescriptor::new("fill_color", NULLABLE_COLOR),
    PropertyDescriptor::new("fill_alpha", NULLABLE_NON_NEGATIVE),
];

const PATCH_PROPERTIES: &[PropertyDescriptor] = &[
    PropertyDescriptor::new("x", PropertyKind::DataSpec),
    PropertyDescriptor::new("y", PropertyKind::DataSpec),
    PropertyDescriptor::new("line_color", NULLABLE_COLOR),
    PropertyDescriptor::new("line_alpha", NULLABLE_NON_NEGATIVE),
    PropertyDescriptor::new("line_width", NULLABLE_NON_NEGATIVE),
    PropertyDescriptor::new("fill_color", NULLABLE_COLOR),
    PropertyDescriptor::new("fill_alpha", NULLABLE_NON_NEGATIVE),
];

const MULTI_LINE_PROPERTIES: &[PropertyDescriptor] = &[
    PropertyDescriptor::new("xs", PropertyKind::DataSpec),
    PropertyDescriptor::new("ys", PropertyKind::DataSpec),
    PropertyDescriptor::new("line_color", NULLABLE_COLOR),
    PropertyDescriptor::new("line_alpha", NULLABLE_NON_NEGATIVE),
    PropertyDescriptor::new("line_width", NULLABLE_NON_NEGATIVE),
];

impl PropertyContainer for Glyph {
    fn type_name(&self) -> &'static str {
        match self {
            Self::Scatter(_) => "Scatter",
            Self::Line(_) => "Line",
            Self::Rect(_) => "Rect",
            Self::VBar(_) => "VBar",
            Self::HBar(_) => "HBar",
            Self::Quad(_) => "Quad",
            Self::Patch(_) => "Patch",
            Self::MultiLine(_) => "MultiLine",
        }
    }

    fn properties(&self) -> &'static [PropertyDescriptor] {
        match self {
            Self::Scatter(_) => SCATTER_PROPERTIES,
            Self::Line(_) => LINE_PROPERTIES,
            Self::Rect(_) => RECT_PROPERTIES,
            Self::VBar(_) => VBAR_PROPERTIES,
            Self::HBar(_) => HBAR_PROPERTIES,
            Self::Quad(_) => QUAD_PROPERTIES,
            Self::Patch(_) => PATCH_PROPERTIES,
            Self::MultiLine(_) => MULTI_LINE_PROPERTIES,
        }
    }

    fn get(&self, name: &str) -> SceneResult<PropertyValue> {
        if let Some(spec) = self.spec(name) {
            return Ok(spec.to_value());
        }
        if let Self::Scatter(glyph) = self {
            if name == "marker" {
                return Ok(glyph.marker.label().into());
            }
        }
        if LINE_PROPERTY_NAMES.contains(&name) {
            if let Some(value) = self.line_props().get(name) {
                return Ok(value);
            }
        }
        if FILL_PROPERTY_NAMES.contains(&name) {
            if let Some(value) = self.fill_props().and_then(|fill| fill.get(name)) {
                return Ok(value);
            }
        }
        Err(unknown_property(self.type_name(), name))
    }

    fn apply(&mut self, name: &str, value: PropertyValue) -> SceneResult<()> {
        let type_name = self.type_name();
        if let Some(spec) = self.spec_mut(name) {
            *spec = DataSpec::from_value(&value, name)?;
            return Ok(());
        }
        if let Self::Scatter(glyph) = self {
            if name == "marker" {
                glyph.marker = expect_enum(&value, name, MarkerType::OPTIONS)?;
                return Ok(());
            }
        }
        if let Some(result) = self.line_props_mut().apply(name, &value) {
            return result;
        }
        if let Some(result) = self
            .fill_props_mut()
            .and_then(|fill| fill.apply(name, &value))
        {
            return result;
        }
        Err(unknown_property(type_name, name))
    }
}

/// Concrete line visuals after fallback resolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineVisuals {
    pub color: Color,
    pub width: f64,
}

/// Concrete fill visuals after fallback resolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FillVisuals {
    pub color: Color,
}

/// Resolves line visuals of `glyph`, falling back attribute by attribute to
/// `base` and then to the defaults.
pub fn resolve_line(glyph: &Glyph, base: &Glyph) -> SceneResult<LineVisuals> {
    let own = glyph.line_props();
    let fallback = base.line_props();
    let color = own
        .line_color
        .as_deref()
        .or(fallback.line_color.as_deref())
        .unwrap_or(DEFAULT_LINE_COLOR);
    let alpha = own.line_alpha.or(fallback.line_alpha).unwrap_or(1.0);
    Ok(LineVisuals {
        color: Color::parse(color)?.with_alpha_scaled(alpha),
        width: own
            .line_width
            .or(fallback.line_width)
            .unwrap_or(DEFAULT_LINE_WIDTH),
    })
}

/// Resolves fill visuals, or `None` for glyphs without a fill.
pub fn resolve_fill(glyph: &Glyph, base: &Glyph) -> SceneResult<Option<FillVisuals>> {
    let Some(own) = glyph.fill_props() else {
        return Ok(None);
    };
    let fallback = base.fill_props();
    let color = own
        .fill_color
        .as_deref()
        .or_else(|| fallback.and_then(|fill| fill.fill_color.as_deref()))
        .unwrap_or(DEFAULT_FILL_COLOR);
    let alpha = own
        .fill_alpha
        .or_else(|| fallback.and_then(|fill| fill.fill_alpha))
        .unwrap_or(1.0);
    Ok(Some(FillVisuals {
        color: Color::parse(color)?.with_alpha_scaled(alpha),
    }))
}

#[cfg(test)]
mod tests {
    use super::{DataSpec, Dimension, Glyph, resolve_fill, resolve_line};
    use crate::core::property::PropertyContainer;

    #[test]
    fn vbar_widens_x_and_spans_top_and_bottom() {
        let glyph = Glyph::vbar("x", 0.5, "top");
        let x = glyph.coordinate_specs(Dimension::X);
        assert_eq!(x.len(), 1);
        assert_eq!(x[0].extent, Some(&DataSpec::Value(0.5)));
        assert_eq!(glyph.coordinate_specs(Dimension::Y).len(), 2);
        assert_eq!(glyph.fields(), vec!["x", "top"]);
    }

    #[test]
    fn explicit_state_glyph_inherits_unset_visuals() {
        let base = Glyph::scatter("x", "y")
            .with_line_color("#ff0000")
            .with_fill_color("blue");
        let mut state = Glyph::scatter("x", "y");
        state
            .set("fill_alpha", 0.5.into())
            .expect("fill alpha is valid");

        let line = resolve_line(&state, &base).expect("line");
        assert_eq!(line.color.red, 1.0);
        let fill = resolve_fill(&state, &base).expect("fill").expect("scatter fills");
        assert_eq!(fill.color.blue, 1.0);
        assert_eq!(fill.color.alpha, 0.5);
    }

    #[test]
    fn unknown_color_is_a_validation_error() {
        let mut glyph = Glyph::line("x", "y");
        assert!(glyph.set("line_color", "not-a-color".into()).is_err());
        assert!(glyph.set("fill_color", "red".into()).is_err());
    }
}
