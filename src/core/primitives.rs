use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::error::{SceneError, SceneResult};

pub fn decimal_to_f64(value: Decimal, field_name: &str) -> SceneResult<f64> {
    value.to_f64().ok_or_else(|| {
        SceneError::InvalidData(format!("{field_name} cannot be represented as f64"))
    })
}

/// Datetimes travel as milliseconds since the Unix epoch.
#[must_use]
pub fn datetime_to_unix_millis(time: DateTime<Utc>) -> f64 {
    time.timestamp_millis() as f64
}

/// Running finite min/max accumulator. Non-finite samples are skipped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub min: f64,
    pub max: f64,
}

impl Extent {
    #[must_use]
    pub fn of(value: f64) -> Option<Self> {
        value.is_finite().then_some(Self {
            min: value,
            max: value,
        })
    }

    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    #[must_use]
    pub fn merge_option(left: Option<Self>, right: Option<Self>) -> Option<Self> {
        match (left, right) {
            (Some(left), Some(right)) => Some(left.merge(right)),
            (Some(only), None) | (None, Some(only)) => Some(only),
            (None, None) => None,
        }
    }

    #[must_use]
    pub fn widened(self, half_width: f64) -> Self {
        if !half_width.is_finite() || half_width <= 0.0 {
            return self;
        }
        Self {
            min: self.min - half_width,
            max: self.max + half_width,
        }
    }

    /// Finite extent of a slice, or `None` when nothing finite is present.
    #[must_use]
    pub fn scan(values: &[f64]) -> Option<Self> {
        #[cfg(feature = "parallel-scan")]
        {
            use rayon::prelude::*;
            const PARALLEL_THRESHOLD: usize = 16_384;
            if values.len() >= PARALLEL_THRESHOLD {
                return values
                    .par_iter()
                    .filter_map(|value| Self::of(*value))
                    .reduce_with(Self::merge);
            }
        }

        values
            .iter()
            .filter_map(|value| Self::of(*value))
            .reduce(Self::merge)
    }
}
