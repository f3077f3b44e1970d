/// Window presentation: video background, then the 3D layer over it.
///
/// With no video frame uploaded the surface is cleared to opaque black.
use std::sync::Arc;

use wgpu::{
    CommandEncoder, Device, LoadOp, Operations, Queue, RenderPassColorAttachment,
    RenderPassDescriptor, StoreOp, TextureView,
};

use crate::graph::{FramePacket, RenderPass};
use crate::pipeline::{PipelineLayouts, PresentPipeline};
use crate::resources::texture;

/// Streaming texture holding the latest camera frame.
struct VideoTexture {
    texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
    width: u32,
    height: u32,
}

pub struct PresentPass {
    pipeline:  PresentPipeline,
    layout:    Arc<wgpu::BindGroupLayout>,
    sampler:   wgpu::Sampler,
    layer:     wgpu::BindGroup,
    video:     Option<VideoTexture>,
}

impl PresentPass {
    pub const VIDEO_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

    pub fn new(
        device: &Device,
        surface_format: wgpu::TextureFormat,
        layouts: &PipelineLayouts,
        layer_view: &TextureView,
    ) -> Self {
        let sampler = texture::linear_sampler(device, "Present Sampler");
        let layer = Self::bind(device, &layouts.present, layer_view, &sampler, "Present: Layer");
        Self {
            pipeline: PresentPipeline::new(device, surface_format, layouts),
            layout: layouts.present.clone(),
            sampler,
            layer,
            video: None,
        }
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.pipeline.format
    }

    /// Rebinds the layer texture after the render target was recreated.
    pub fn set_layer(&mut self, device: &Device, layer_view: &TextureView) {
        self.layer = Self::bind(device, &self.layout, layer_view, &self.sampler, "Present: Layer");
    }

    /// Uploads one tightly packed RGBA8 frame, reallocating on size change.
    pub fn upload_video(&mut self, device: &Device, queue: &Queue, width: u32, height: u32, rgba: &[u8]) {
        if width == 0 || height == 0 || rgba.len() != width as usize * height as usize * 4 {
            log::warn!("ignoring malformed video frame {width}x{height} ({} bytes)", rgba.len());
            return;
        }
        let stale = self
            .video
            .as_ref()
            .map_or(true, |v| v.width != width || v.height != height);
        if stale {
            let tex = texture::create_render_texture(device, &texture::RenderTextureDesc {
                label: "Video Texture",
                width,
                height,
                format: Self::VIDEO_FORMAT,
                sample_count: 1,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            });
            let view = texture::default_view(&tex);
            let bind_group = Self::bind(device, &self.layout, &view, &self.sampler, "Present: Video");
            self.video = Some(VideoTexture {
                texture: tex,
                bind_group,
                width,
                height,
            });
        }
        if let Some(video) = &self.video {
            texture::write_rgba8(queue, &video.texture, width, height, rgba);
        }
    }

    /// Drops the video texture; the background goes back to black.
    pub fn clear_video(&mut self) {
        self.video = None;
    }

    pub fn has_video(&self) -> bool {
        self.video.is_some()
    }

    fn bind(
        device: &Device,
        layout: &wgpu::BindGroupLayout,
        view: &TextureView,
        sampler: &wgpu::Sampler,
        label: &str,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        })
    }
}

impl RenderPass for PresentPass {
    fn name(&self) -> &str { "Present Pass" }

    fn prepare(&mut self, _device: &Device, _queue: &Queue, _packet: &FramePacket) {}

    fn execute(
        &mut self,
        encoder: &mut CommandEncoder,
        color_view: &TextureView,
        _resolve_target: Option<&TextureView>,
        _depth_view: Option<&TextureView>,
        _packet: &FramePacket,
    ) {
        let mut rpass = encoder.begin_render_pass(&RenderPassDescriptor {
            label: Some(self.name()),
            color_attachments: &[Some(RenderPassColorAttachment {
                view: color_view,
                resolve_target: None,
                ops: Operations {
                    load:  LoadOp::Clear(wgpu::Color::BLACK),
                    store: StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            occlusion_query_set: None,
            timestamp_writes:    None,
        });

        rpass.set_pipeline(&self.pipeline.inner);
        if let Some(video) = &self.video {
            rpass.set_bind_group(0, &video.bind_group, &[]);
            rpass.draw(0..3, 0..1);
        }
        rpass.set_bind_group(0, &self.layer, &[]);
        rpass.draw(0..3, 0..1);
    }
}
