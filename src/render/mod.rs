//! Pixel-space output of a plot draw pass.

mod frame;
mod null_renderer;
mod primitives;

pub use frame::{Canvas, RenderFrame};
pub use null_renderer::NullRenderer;
pub use primitives::{
    Color, LinePrimitive, MarkerPrimitive, PolygonPrimitive, RectPrimitive, Stroke, TextHAlign,
    TextPrimitive,
};

use crate::core::ModelId;
use crate::document::Document;
use crate::error::SceneResult;

/// Drawing backend fed with resolved frames.
pub trait Renderer {
    fn render(&mut self, frame: &RenderFrame) -> SceneResult<()>;

    /// Renders `plot` from `document` and hands the frame to this backend.
    fn draw_plot(&mut self, document: &mut Document, plot: &ModelId) -> SceneResult<RenderFrame> {
        let frame = document.render_plot(plot)?;
        self.render(&frame)?;
        Ok(frame)
    }
}
