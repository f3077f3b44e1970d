//! The seam between the render surface logic and the GPU.

use arview_core::{ObjectId, Scene};
use image::RgbaImage;

use crate::error::RenderError;

/// What a [`RenderContext`](crate::RenderContext) needs from a renderer.
///
/// The wgpu [`Renderer`](crate::Renderer) is the real implementation; tests
/// use recording fakes.
pub trait FrameRenderer {
    /// Output size in pixels.  Never called with a zero dimension.
    fn resize(&mut self, width: u32, height: u32);

    /// Draws `scene` into the 3D layer once.
    fn render(&mut self, scene: &Scene) -> Result<(), RenderError>;

    /// Pixels of the last rendered layer: RGBA8, premultiplied alpha,
    /// transparent where nothing was drawn.
    fn read_layer(&mut self) -> Result<RgbaImage, RenderError>;

    /// Releases GPU resources held for a retired scene object.
    fn retire(&mut self, object: ObjectId);
}
