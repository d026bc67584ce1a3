use crate::core::primitives::Extent;
use crate::core::property::{
    ModelCategory, PropertyContainer, PropertyDescriptor, PropertyKind, expect_enum,
    unknown_property,
};
use crate::core::range::{Bounds, PaddingUnits, validate_interval};
use crate::core::value::ref_list;
use crate::core::{ModelId, PropertyValue};
use crate::error::{SceneError, SceneResult};

pub const DEFAULT_RANGE_PADDING: f64 = 0.1;
pub const DEFAULT_SPAN: f64 = 2.0;

/// Renderers scanned by a data range.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RendererSelection {
    /// Every renderer of every plot using the range in its dimension.
    #[default]
    Auto,
    Explicit(Vec<ModelId>),
}

impl RendererSelection {
    #[must_use]
    pub fn to_value(&self) -> PropertyValue {
        match self {
            Self::Auto => "auto".into(),
            Self::Explicit(ids) => ref_list(ids),
        }
    }

    pub fn from_value(value: &PropertyValue, property: &str) -> SceneResult<Self> {
        match value {
            PropertyValue::String(raw) if raw == "auto" => Ok(Self::Auto),
            other => other.expect_ref_list(property).map(Self::Explicit),
        }
    }
}

/// Edge a scrolling window stays attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Follow {
    #[default]
    None,
    Start,
    End,
}

impl Follow {
    #[must_use]
    pub fn to_value(self) -> PropertyValue {
        match self {
            Self::None => PropertyValue::Null,
            Self::Start => "start".into(),
            Self::End => "end".into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScaleHint {
    #[default]
    Auto,
    Log,
}

const NULLABLE_NUMBER: PropertyKind = PropertyKind::Nullable(&PropertyKind::Number);
const NULLABLE_NON_NEGATIVE: PropertyKind = PropertyKind::Nullable(&PropertyKind::NonNegative);

const DATA_RANGE1D_PROPERTIES: &[PropertyDescriptor] = &[
    PropertyDescriptor::new("renderers", PropertyKind::AutoRefList(ModelCategory::Renderer)),
    PropertyDescriptor::new("sources", PropertyKind::RefList(ModelCategory::DataSource)),
    PropertyDescriptor::new("range_padding", PropertyKind::NonNegative),
    PropertyDescriptor::new(
        "range_padding_units",
        PropertyKind::Enum(PaddingUnits::LABELS),
    ),
    PropertyDescriptor::new(
        "follow",
        PropertyKind::Nullable(&PropertyKind::Enum(&["start", "end"])),
    ),
    PropertyDescriptor::new("follow_interval", NULLABLE_NON_NEGATIVE),
    PropertyDescriptor::new("flipped", PropertyKind::Bool),
    PropertyDescriptor::new("only_visible", PropertyKind::Bool),
    PropertyDescriptor::new("default_span", PropertyKind::NonNegative),
    PropertyDescriptor::new("scale_hint", PropertyKind::Enum(&["auto", "log"])),
    PropertyDescriptor::new("start", NULLABLE_NUMBER),
    PropertyDescriptor::new("end", NULLABLE_NUMBER),
    PropertyDescriptor::new("bounds", PropertyKind::Bounds),
    PropertyDescriptor::new("min_interval", NULLABLE_NON_NEGATIVE),
    PropertyDescriptor::new("max_interval", NULLABLE_NON_NEGATIVE),
];

/// Range fitted to the data of the renderers and sources it scans.
#[derive(Debug, Clone, PartialEq)]
pub struct DataRange1d {
    pub renderers: RendererSelection,
    pub sources: Vec<ModelId>,
    pub range_padding: f64,
    pub range_padding_units: PaddingUnits,
    pub follow: Follow,
    pub follow_interval: Option<f64>,
    pub flipped: bool,
    pub only_visible: bool,
    pub default_span: f64,
    pub scale_hint: ScaleHint,
    /// User override of the computed start.
    pub start: Option<f64>,
    /// User override of the computed end.
    pub end: Option<f64>,
    pub bounds: Bounds,
    pub min_interval: Option<f64>,
    pub max_interval: Option<f64>,
}

impl Default for DataRange1d {
    fn default() -> Self {
        Self {
            renderers: RendererSelection::Auto,
            sources: Vec::new(),
            range_padding: DEFAULT_RANGE_PADDING,
            range_padding_units: PaddingUnits::Percent,
            follow: Follow::None,
            follow_interval: None,
            flipped: false,
            only_visible: false,
            default_span: DEFAULT_SPAN,
            scale_hint: ScaleHint::Auto,
            start: None,
            end: None,
            bounds: Bounds::Unbounded,
            min_interval: None,
            max_interval: None,
        }
    }
}

impl DataRange1d {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_sources(mut self, sources: Vec<ModelId>) -> Self {
        self.sources = sources;
        self
    }

    #[must_use]
    pub fn with_renderers(mut self, renderers: Vec<ModelId>) -> Self {
        self.renderers = RendererSelection::Explicit(renderers);
        self
    }

    #[must_use]
    pub fn with_padding(mut self, padding: f64, units: PaddingUnits) -> Self {
        self.range_padding = padding;
        self.range_padding_units = units;
        self
    }

    #[must_use]
    pub fn with_follow(mut self, follow: Follow, interval: Option<f64>) -> Self {
        self.follow = follow;
        self.follow_interval = interval;
        self
    }

    #[must_use]
    pub fn with_flipped(mut self, flipped: bool) -> Self {
        self.flipped = flipped;
        self
    }

    /// Turns the raw data extent into the visible `(start, end)`.
    ///
    /// Padding is applied first, then the follow window, then bounds, and
    /// finally user overrides. `None` means no finite data and no complete
    /// override pair.
    #[must_use]
    pub fn compute(&self, extent: Option<Extent>) -> Option<(f64, f64)> {
        let Some(extent) = extent else {
            return self.start.zip(self.end);
        };

        let (lo, hi) = self.padded(extent.min, extent.max);
        let (mut start, mut end) = if self.flipped { (hi, lo) } else { (lo, hi) };

        if let Some(interval) = self.follow_interval {
            if (end - start).abs() > interval {
                let sign = if self.flipped { -1.0 } else { 1.0 };
                match self.follow {
                    Follow::Start => end = start + sign * interval,
                    Follow::End => start = end - sign * interval,
                    Follow::None => {}
                }
            }
        }

        let (lo, hi) = self.bounds.clamp(start.min(end), start.max(end));
        let (start, end) = if self.flipped { (hi, lo) } else { (lo, hi) };

        Some((self.start.unwrap_or(start), self.end.unwrap_or(end)))
    }

    fn padded(&self, min: f64, max: f64) -> (f64, f64) {
        match self.scale_hint {
            ScaleHint::Log => self.padded_log(min, max),
            ScaleHint::Auto => {
                let span = if max == min {
                    self.default_span
                } else {
                    match self.range_padding_units {
                        PaddingUnits::Percent => (max - min) * (1.0 + self.range_padding),
                        PaddingUnits::Absolute => (max - min) + 2.0 * self.range_padding,
                    }
                };
                let center = (max + min) / 2.0;
                (center - span / 2.0, center + span / 2.0)
            }
        }
    }

    fn padded_log(&self, min: f64, max: f64) -> (f64, f64) {
        let min = if min > 0.0 {
            min
        } else if max > 0.0 {
            max / 100.0
        } else {
            0.1
        };
        let max = if max > 0.0 { max } else { min * 100.0 };

        let (center, span) = if max == min {
            (min.log10(), self.default_span + 0.001)
        } else {
            let (log_min, log_max) = match self.range_padding_units {
                PaddingUnits::Percent => (min.log10(), max.log10()),
                PaddingUnits::Absolute => (
                    (min - self.range_padding).log10(),
                    (max + self.range_padding).log10(),
                ),
            };
            let span = match self.range_padding_units {
                PaddingUnits::Percent => (log_max - log_min) * (1.0 + self.range_padding),
                PaddingUnits::Absolute => log_max - log_min,
            };
            ((log_min + log_max) / 2.0, span)
        };
        (
            10f64.powf(center - span / 2.0),
            10f64.powf(center + span / 2.0),
        )
    }
}

impl PropertyContainer for DataRange1d {
    fn type_name(&self) -> &'static str {
        "DataRange1d"
    }

    fn properties(&self) -> &'static [PropertyDescriptor] {
        DATA_RANGE1D_PROPERTIES
    }

    fn get(&self, name: &str) -> SceneResult<PropertyValue> {
        Ok(match name {
            "renderers" => self.renderers.to_value(),
            "sources" => ref_list(&self.sources),
            "range_padding" => self.range_padding.into(),
            "range_padding_units" => self.range_padding_units.label().into(),
            "follow" => self.follow.to_value(),
            "follow_interval" => self.follow_interval.into(),
            "flipped" => self.flipped.into(),
            "only_visible" => self.only_visible.into(),
            "default_span" => self.default_span.into(),
            "scale_hint" => match self.scale_hint {
                ScaleHint::Auto => "auto".into(),
                ScaleHint::Log => "log".into(),
            },
            "start" => self.start.into(),
            "end" => self.end.into(),
            "bounds" => self.bounds.to_value(),
            "min_interval" => self.min_interval.into(),
            "max_interval" => self.max_interval.into(),
            _ => return Err(unknown_property(self.type_name(), name)),
        })
    }

    fn apply(&mut self, name: &str, value: PropertyValue) -> SceneResult<()> {
        match name {
            "renderers" => self.renderers = RendererSelection::from_value(&value, name)?,
            "sources" => self.sources = value.expect_ref_list(name)?,
            "range_padding" => self.range_padding = value.expect_non_negative(name)?,
            "range_padding_units" => {
                self.range_padding_units = PaddingUnits::from_value(&value, name)?;
            }
            "follow" => {
                self.follow = if value.is_null() {
                    Follow::None
                } else {
                    expect_enum(&value, name, &[("start", Follow::Start), ("end", Follow::End)])?
                };
            }
            "follow_interval" => {
                self.follow_interval = validate_interval(value.expect_optional_finite(name)?, name)?;
            }
            "flipped" => self.flipped = value.expect_bool(name)?,
            "only_visible" => self.only_visible = value.expect_bool(name)?,
            "default_span" => {
                let span = value.expect_non_negative(name)?;
                if span == 0.0 {
                    return Err(SceneError::validation(name, "default span must be positive"));
                }
                self.default_span = span;
            }
            "scale_hint" => {
                self.scale_hint =
                    expect_enum(&value, name, &[("auto", ScaleHint::Auto), ("log", ScaleHint::Log)])?;
            }
            "start" => self.start = value.expect_optional_finite(name)?,
            "end" => self.end = value.expect_optional_finite(name)?,
            "bounds" => self.bounds = Bounds::from_value(&value, name)?,
            "min_interval" => {
                self.min_interval = validate_interval(value.expect_optional_finite(name)?, name)?;
            }
            "max_interval" => {
                self.max_interval = validate_interval(value.expect_optional_finite(name)?, name)?;
            }
            _ => return Err(unknown_property(self.type_name(), name)),
        }
        Ok(())
    }
}
