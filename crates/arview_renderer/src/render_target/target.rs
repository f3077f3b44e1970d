/// The offscreen 3D layer: a [`ColorTarget`] plus a matching [`DepthTarget`].
///
/// The layer is rendered with a transparent clear so the presenter and the
/// compositor can put it on top of the video frame.
use super::{color::ColorTarget, depth::DepthTarget};

pub struct RenderTarget {
    pub color: ColorTarget,
    pub depth: DepthTarget,
    pub width: u32,
    pub height: u32,
}

impl RenderTarget {
    pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;
    pub const SAMPLE_COUNT: u32 = 4;

    pub fn new(device: &wgpu::Device, width: u32, height: u32, sample_count: u32) -> Self {
        let (width, height) = (width.max(1), height.max(1));
        Self {
            color: ColorTarget::new(device, width, height, Self::FORMAT, sample_count),
            depth: DepthTarget::new(device, width, height, sample_count),
            width,
            height,
        }
    }

    /// Recreates all attachments when the resolution changes.
    ///
    /// Returns `false` (no GPU allocation) if the size is unchanged or zero.
    pub fn resize(&mut self, device: &wgpu::Device, new_width: u32, new_height: u32) -> bool {
        if new_width == 0 || new_height == 0 {
            return false;
        }
        if new_width == self.width && new_height == self.height {
            return false;
        }
        self.width = new_width;
        self.height = new_height;
        self.color.resize(device, new_width, new_height);
        self.depth.resize(device, new_width, new_height);
        true
    }

    #[inline]
    pub fn sample_count(&self) -> u32 {
        self.color.sample_count
    }

    /// Returns the (render_view, resolve_target) pair for color attachments.
    #[inline]
    pub fn color_views(&self) -> (&wgpu::TextureView, Option<&wgpu::TextureView>) {
        self.color.attachment_views()
    }

    #[inline]
    pub fn depth_view(&self) -> &wgpu::TextureView {
        &self.depth.view
    }

    /// The single-sample resolve texture; source of readback and of the
    /// present pass.
    #[inline]
    pub fn color_texture(&self) -> &wgpu::Texture {
        &self.color.texture
    }

    #[inline]
    pub fn color_view(&self) -> &wgpu::TextureView {
        &self.color.view
    }
}
