use crate::core::plot::ScaleKind;
use crate::error::{SceneError, SceneResult};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    domain_start: f64,
    domain_end: f64,
}

impl LinearScale {
    pub fn new(domain_start: f64, domain_end: f64) -> SceneResult<Self> {
        if !domain_start.is_finite() || !domain_end.is_finite() || domain_start == domain_end {
            return Err(SceneError::InvalidData(
                "scale domain must be finite and non-zero".to_owned(),
            ));
        }

        Ok(Self {
            domain_start,
            domain_end,
        })
    }

    #[must_use]
    pub fn domain(self) -> (f64, f64) {
        (self.domain_start, self.domain_end)
    }

    /// Maps `value` onto `[0, length]`. Non-finite input maps to NaN.
    #[must_use]
    pub fn map(self, value: f64, length: f64) -> f64 {
        let span = self.domain_end - self.domain_start;
        (value - self.domain_start) / span * length
    }

    #[must_use]
    pub fn invert(self, pixel: f64, length: f64) -> f64 {
        let span = self.domain_end - self.domain_start;
        self.domain_start + pixel / length * span
    }
}

/// Logarithmic scale; non-positive values map to NaN.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogScale {
    inner: LinearScale,
}

impl LogScale {
    pub fn new(domain_start: f64, domain_end: f64) -> SceneResult<Self> {
        if domain_start <= 0.0 || domain_end <= 0.0 {
            return Err(SceneError::InvalidData(
                "log scale domain must be positive".to_owned(),
            ));
        }
        Ok(Self {
            inner: LinearScale::new(domain_start.log10(), domain_end.log10())?,
        })
    }

    #[must_use]
    pub fn map(self, value: f64, length: f64) -> f64 {
        if value <= 0.0 {
            return f64::NAN;
        }
        self.inner.map(value.log10(), length)
    }

    #[must_use]
    pub fn invert(self, pixel: f64, length: f64) -> f64 {
        10f64.powf(self.inner.invert(pixel, length))
    }
}

/// Scale selected by a plot for one dimension.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AxisScale {
    Linear(LinearScale),
    Log(LogScale),
}

impl AxisScale {
    pub fn new(kind: ScaleKind, start: f64, end: f64) -> SceneResult<Self> {
        Ok(match kind {
            ScaleKind::Linear => Self::Linear(LinearScale::new(start, end)?),
            ScaleKind::Log => Self::Log(LogScale::new(start, end)?),
        })
    }

    #[must_use]
    pub fn map(self, value: f64, length: f64) -> f64 {
        match self {
            Self::Linear(scale) => scale.map(value, length),
            Self::Log(scale) => scale.map(value, length),
        }
    }

    #[must_use]
    pub fn invert(self, pixel: f64, length: f64) -> f64 {
        match self {
            Self::Linear(scale) => scale.invert(pixel, length),
            Self::Log(scale) => scale.invert(pixel, length),
        }
    }
}
