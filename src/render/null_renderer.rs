use crate::error::SceneResult;
use crate::render::{RenderFrame, Renderer};

/// Backend that draws nothing and keeps counters of what it was given.
/// Frames are still validated.
#[derive(Debug, Default)]
pub struct NullRenderer {
    pub frames_rendered: usize,
    pub last_primitive_count: usize,
    pub last_marker_count: usize,
}

impl Renderer for NullRenderer {
    fn render(&mut self, frame: &RenderFrame) -> SceneResult<()> {
        frame.validate()?;
        self.frames_rendered += 1;
        self.last_primitive_count = frame.primitive_count();
        self.last_marker_count = frame.markers.len();
        Ok(())
    }
}
