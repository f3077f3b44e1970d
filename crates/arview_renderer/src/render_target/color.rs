/// Single-sample color texture plus an optional MSAA texture resolving into it.
///
/// The resolve texture is always created: it is sampled by the present pass
/// and copied out for screenshots.
use crate::resources::texture::{self, RenderTextureDesc};

pub struct ColorTarget {
    /// Single-sample texture, also the MSAA resolve target.
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    /// Multisampled attachment, `None` when `sample_count == 1`.
    pub msaa: Option<(wgpu::Texture, wgpu::TextureView)>,
    pub format: wgpu::TextureFormat,
    pub sample_count: u32,
}

impl ColorTarget {
    pub fn new(
        device: &wgpu::Device,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
        sample_count: u32,
    ) -> Self {
        let (texture, view) = Self::make_resolve(device, width, height, format);
        let msaa = Self::make_msaa(device, width, height, format, sample_count);
        Self { texture, view, msaa, format, sample_count }
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        let (t, v) = Self::make_resolve(device, width, height, self.format);
        self.texture = t;
        self.view    = v;
        self.msaa = Self::make_msaa(device, width, height, self.format, self.sample_count);
    }

    /// Returns `(render_view, resolve_target)` for a `RenderPassColorAttachment`.
    pub fn attachment_views(&self) -> (&wgpu::TextureView, Option<&wgpu::TextureView>) {
        match &self.msaa {
            Some((_, msaa_view)) => (msaa_view, Some(&self.view)),
            None => (&self.view, None),
        }
    }

    // ── Private helpers ───────────────────────────────────────────────────

    fn make_resolve(
        device: &wgpu::Device,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
    ) -> (wgpu::Texture, wgpu::TextureView) {
        let tex = texture::create_render_texture(device, &RenderTextureDesc {
            label: "Layer Resolve Texture",
            width,
            height,
            format,
            sample_count: 1,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC,
        });
        let view = texture::default_view(&tex);
        (tex, view)
    }

    fn make_msaa(
        device: &wgpu::Device,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
        sample_count: u32,
    ) -> Option<(wgpu::Texture, wgpu::TextureView)> {
        if sample_count <= 1 {
            return None;
        }
        let tex = texture::create_render_texture(device, &RenderTextureDesc {
            label: "Layer MSAA Texture",
            width,
            height,
            format,
            sample_count,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        });
        let view = texture::default_view(&tex);
        Some((tex, view))
    }
}
