//! Axis ranges: fixed, data-fitted and categorical.

mod data_range1d;
mod factor_range;
mod range1d;

pub use data_range1d::{DataRange1d, Follow, RendererSelection, ScaleHint};
pub use factor_range::{Factor, FactorLevel, FactorMapping, FactorRange};
pub use range1d::Range1d;

use std::sync::Arc;

use crate::core::PropertyValue;
use crate::core::property::expect_enum;
use crate::error::{SceneError, SceneResult};

/// Interpretation of `range_padding`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaddingUnits {
    #[default]
    Percent,
    Absolute,
}

impl PaddingUnits {
    const OPTIONS: &'static [(&'static str, Self)] =
        &[("percent", Self::Percent), ("absolute", Self::Absolute)];
    pub(crate) const LABELS: &'static [&'static str] = &["percent", "absolute"];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Percent => "percent",
            Self::Absolute => "absolute",
        }
    }

    pub(crate) fn from_value(value: &PropertyValue, property: &str) -> SceneResult<Self> {
        expect_enum(value, property, Self::OPTIONS)
    }

    /// Half of the padding added on each side of `span`.
    #[must_use]
    pub fn half_padding(self, span: f64, padding: f64) -> f64 {
        match self {
            Self::Percent => span * padding / 2.0,
            Self::Absolute => padding,
        }
    }
}

/// Hard limits a range may not extend past.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Bounds {
    #[default]
    Unbounded,
    /// Bounded by the data extent itself.
    Auto,
    Explicit {
        min: Option<f64>,
        max: Option<f64>,
    },
}

impl Bounds {
    #[must_use]
    pub fn explicit(min: Option<f64>, max: Option<f64>) -> Self {
        Self::Explicit { min, max }
    }

    /// Clamps an ordered interval `lo <= hi` into the bounds.
    #[must_use]
    pub fn clamp(self, lo: f64, hi: f64) -> (f64, f64) {
        let Self::Explicit { min, max } = self else {
            return (lo, hi);
        };
        let lo = min.map_or(lo, |min| lo.max(min));
        let hi = max.map_or(hi, |max| hi.min(max));
        (lo.min(hi), hi)
    }

    #[must_use]
    pub fn to_value(self) -> PropertyValue {
        match self {
            Self::Unbounded => PropertyValue::Null,
            Self::Auto => "auto".into(),
            Self::Explicit { min, max } => PropertyValue::List(vec![min.into(), max.into()]),
        }
    }

    pub fn from_value(value: &PropertyValue, property: &str) -> SceneResult<Self> {
        match value {
            PropertyValue::Null => Ok(Self::Unbounded),
            PropertyValue::String(raw) if raw == "auto" => Ok(Self::Auto),
            PropertyValue::List(items) if items.len() == 2 => {
                let min = items[0].expect_optional_finite(property)?;
                let max = items[1].expect_optional_finite(property)?;
                if let (Some(min), Some(max)) = (min, max) {
                    if min > max {
                        return Err(SceneError::validation(
                            property,
                            format!("lower bound {min} exceeds upper bound {max}"),
                        ));
                    }
                }
                Ok(Self::Explicit { min, max })
            }
            other => Err(SceneError::validation(
                property,
                format!(
                    "expected null, \"auto\" or a [min, max] pair, got {}",
                    other.type_label()
                ),
            )),
        }
    }
}

pub(crate) fn validate_interval(value: Option<f64>, property: &str) -> SceneResult<Option<f64>> {
    match value {
        Some(interval) if interval <= 0.0 => Err(SceneError::validation(
            property,
            "interval must be positive",
        )),
        other => Ok(other),
    }
}

/// Effective extent of a range after resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedRange {
    Continuous { start: f64, end: f64 },
    Categorical(Arc<FactorMapping>),
}

impl ResolvedRange {
    #[must_use]
    pub fn start(&self) -> f64 {
        match self {
            Self::Continuous { start, .. } => *start,
            Self::Categorical(mapping) => mapping.start,
        }
    }

    #[must_use]
    pub fn end(&self) -> f64 {
        match self {
            Self::Continuous { end, .. } => *end,
            Self::Categorical(mapping) => mapping.end,
        }
    }

    #[must_use]
    pub fn factors(&self) -> Option<&FactorMapping> {
        match self {
            Self::Categorical(mapping) => Some(mapping),
            Self::Continuous { .. } => None,
        }
    }

    /// Maps a data value (number, factor or `[factor, offset]`) onto the
    /// range's numeric axis. Unknown factors map to NaN.
    #[must_use]
    pub fn synthetic(&self, value: &PropertyValue) -> f64 {
        match self {
            Self::Categorical(mapping) => mapping.synthetic(value),
            Self::Continuous { .. } => match value {
                PropertyValue::Number(number) => *number,
                _ => f64::NAN,
            },
        }
    }
}
