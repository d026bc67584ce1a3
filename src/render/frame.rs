use crate::error::{SceneError, SceneResult};
use crate::render::{
    LinePrimitive, MarkerPrimitive, PolygonPrimitive, RectPrimitive, TextPrimitive,
};

/// Pixel size of the area a plot draws into. The origin is the top-left
/// corner and y grows downwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

impl Canvas {
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    #[must_use]
    pub fn center_x(self) -> f64 {
        f64::from(self.width) / 2.0
    }

    fn check(self) -> SceneResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(SceneError::InvalidCanvas {
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }
}

/// Everything one plot draw pass produced, grouped by primitive kind and in
/// paint order within each group.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderFrame {
    pub canvas: Canvas,
    pub lines: Vec<LinePrimitive>,
    pub rects: Vec<RectPrimitive>,
    pub markers: Vec<MarkerPrimitive>,
    pub polygons: Vec<PolygonPrimitive>,
    pub texts: Vec<TextPrimitive>,
}

impl RenderFrame {
    #[must_use]
    pub fn new(canvas: Canvas) -> Self {
        Self {
            canvas,
            lines: Vec::new(),
            rects: Vec::new(),
            markers: Vec::new(),
            polygons: Vec::new(),
            texts: Vec::new(),
        }
    }

    /// Checks the canvas and every primitive; the first invalid one wins.
    pub fn validate(&self) -> SceneResult<()> {
        self.canvas.check()?;
        self.lines.iter().try_for_each(|line| line.validate())?;
        self.rects.iter().try_for_each(|rect| rect.validate())?;
        self.markers.iter().try_for_each(|marker| marker.validate())?;
        self.polygons.iter().try_for_each(PolygonPrimitive::validate)?;
        self.texts.iter().try_for_each(TextPrimitive::validate)
    }

    #[must_use]
    pub fn primitive_count(&self) -> usize {
        [
            self.lines.len(),
            self.rects.len(),
            self.markers.len(),
            self.polygons.len(),
            self.texts.len(),
        ]
        .iter()
        .sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.primitive_count() == 0
    }
}
