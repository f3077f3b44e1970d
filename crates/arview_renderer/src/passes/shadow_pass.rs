/// Renders shadow casters into the light's depth map.
///
/// Owns the shadow map; the colour and depth views handed to `execute` are
/// ignored.
use wgpu::{CommandEncoder, Device, LoadOp, Operations, Queue, RenderPassDepthStencilAttachment, StoreOp, TextureView};

use crate::camera::GpuCamera;
use crate::graph::{FramePacket, RenderPass};
use crate::lighting::ShadowMap;
use crate::pipeline::{PipelineLayouts, ShadowPipeline};

pub struct ShadowPass {
    pipeline: ShadowPipeline,
    light_camera: GpuCamera,
    pub map: ShadowMap,
}

impl ShadowPass {
    pub fn new(device: &Device, layouts: &PipelineLayouts, map_size: u32) -> Self {
        Self {
            pipeline: ShadowPipeline::new(device, layouts),
            light_camera: GpuCamera::new(device, "Shadow Camera", &layouts.camera),
            map: ShadowMap::new(device, map_size),
        }
    }
}

impl RenderPass for ShadowPass {
    fn name(&self) -> &str { "Shadow Pass" }

    fn prepare(&mut self, _device: &Device, queue: &Queue, packet: &FramePacket) {
        self.light_camera.sync_matrix(queue, packet.light.view_proj, packet.light.eye);
    }

    fn execute(
        &mut self,
        encoder: &mut CommandEncoder,
        _color_view: &TextureView,
        _resolve_target: Option<&TextureView>,
        _depth_view: Option<&TextureView>,
        packet: &FramePacket,
    ) {
        // cleared even with no casters so stale shadows disappear
        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(self.name()),
            color_attachments: &[],
            depth_stencil_attachment: Some(RenderPassDepthStencilAttachment {
                view: &self.map.view,
                depth_ops: Some(Operations {
                    load:  LoadOp::Clear(1.0),
                    store: StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes:    None,
        });

        rpass.set_pipeline(&self.pipeline.inner);
        rpass.set_bind_group(0, &*self.light_camera.bind_group, &[]);

        for cmd in packet.shadow_casters() {
            rpass.set_bind_group(1, &*packet.model_bind_group, &[cmd.model_offset]);
            rpass.set_vertex_buffer(0, cmd.mesh.vertex_buffer.slice(..));
            rpass.set_index_buffer(cmd.mesh.index_buffer.slice(..), cmd.mesh.index_format);
            rpass.draw_indexed(0..cmd.mesh.index_count, 0, 0..1);
        }
    }
}
