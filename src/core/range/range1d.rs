use chrono::{DateTime, Utc};

use crate::core::primitives::datetime_to_unix_millis;
use crate::core::property::{
    ModelArgs, PropertyContainer, PropertyDescriptor, PropertyKind, unknown_property,
};
use crate::core::range::{Bounds, validate_interval};
use crate::core::PropertyValue;
use crate::error::{SceneError, SceneResult};

const NULLABLE_NUMBER: PropertyKind = PropertyKind::Nullable(&PropertyKind::Number);
const NULLABLE_NON_NEGATIVE: PropertyKind = PropertyKind::Nullable(&PropertyKind::NonNegative);

const RANGE1D_PROPERTIES: &[PropertyDescriptor] = &[
    PropertyDescriptor::new("start", PropertyKind::Number),
    PropertyDescriptor::new("end", PropertyKind::Number),
    PropertyDescriptor::new("reset_start", NULLABLE_NUMBER),
    PropertyDescriptor::new("reset_end", NULLABLE_NUMBER),
    PropertyDescriptor::new("bounds", PropertyKind::Bounds),
    PropertyDescriptor::new("min_interval", NULLABLE_NON_NEGATIVE),
    PropertyDescriptor::new("max_interval", NULLABLE_NON_NEGATIVE),
];

/// Fixed numeric range.
#[derive(Debug, Clone, PartialEq)]
pub struct Range1d {
    pub start: f64,
    pub end: f64,
    pub reset_start: Option<f64>,
    pub reset_end: Option<f64>,
    pub bounds: Bounds,
    pub min_interval: Option<f64>,
    pub max_interval: Option<f64>,
}

impl Default for Range1d {
    fn default() -> Self {
        Self {
            start: 0.0,
            end: 1.0,
            reset_start: None,
            reset_end: None,
            bounds: Bounds::Unbounded,
            min_interval: None,
            max_interval: None,
        }
    }
}

impl Range1d {
    pub fn new(start: f64, end: f64) -> SceneResult<Self> {
        let mut range = Self::default();
        range.apply("start", start.into())?;
        range.apply("end", end.into())?;
        Ok(range)
    }

    /// Range between two instants, stored as epoch milliseconds.
    pub fn from_datetimes(start: DateTime<Utc>, end: DateTime<Utc>) -> SceneResult<Self> {
        Self::new(datetime_to_unix_millis(start), datetime_to_unix_millis(end))
    }

    /// Builds from either exactly two positional values or keywords, never both.
    pub fn from_args(args: &ModelArgs) -> SceneResult<Self> {
        let mut range = Self::default();
        match args.positional.as_slice() {
            [] => {}
            [start, end] => {
                if args.keywords.contains_key("start") || args.keywords.contains_key("end") {
                    return Err(SceneError::invalid_argument(
                        "Range1d",
                        "start and end may be given positionally or as keywords, not both",
                    ));
                }
                range
                    .apply("start", start.clone())
                    .map_err(|err| SceneError::invalid_argument("Range1d", err.to_string()))?;
                range
                    .apply("end", end.clone())
                    .map_err(|err| SceneError::invalid_argument("Range1d", err.to_string()))?;
            }
            other => {
                return Err(SceneError::invalid_argument(
                    "Range1d",
                    format!(
                        "expected exactly two positional arguments (start, end), got {}",
                        other.len()
                    ),
                ));
            }
        }
        args.apply_keywords(&mut range)?;
        Ok(range)
    }

    #[must_use]
    pub fn with_bounds(mut self, bounds: Bounds) -> Self {
        self.bounds = bounds;
        self
    }

    #[must_use]
    pub fn span(&self) -> f64 {
        (self.end - self.start).abs()
    }

    #[must_use]
    pub fn is_reversed(&self) -> bool {
        self.end < self.start
    }

    /// Start/end restored by a reset action.
    #[must_use]
    pub fn reset_values(&self) -> (f64, f64) {
        (
            self.reset_start.unwrap_or(self.start),
            self.reset_end.unwrap_or(self.end),
        )
    }
}

impl PropertyContainer for Range1d {
    fn type_name(&self) -> &'static str {
        "Range1d"
    }

    fn properties(&self) -> &'static [PropertyDescriptor] {
        RANGE1D_PROPERTIES
    }

    fn get(&self, name: &str) -> SceneResult<PropertyValue> {
        Ok(match name {
            "start" => self.start.into(),
            "end" => self.end.into(),
            "reset_start" => self.reset_start.into(),
            "reset_end" => self.reset_end.into(),
            "bounds" => self.bounds.to_value(),
            "min_interval" => self.min_interval.into(),
            "max_interval" => self.max_interval.into(),
            _ => return Err(unknown_property(self.type_name(), name)),
        })
    }

    fn apply(&mut self, name: &str, value: PropertyValue) -> SceneResult<()> {
        match name {
            "start" => self.start = value.expect_finite(name)?,
            "end" => self.end = value.expect_finite(name)?,
            "reset_start" => self.reset_start = value.expect_optional_finite(name)?,
            "reset_end" => self.reset_end = value.expect_optional_finite(name)?,
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
