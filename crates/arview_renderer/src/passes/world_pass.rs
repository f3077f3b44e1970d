/// Lit geometry pass for the 3D layer.
///
/// Clears colour to the (transparent) scene clear colour and depth to 1, then
/// emits one indexed draw per `DrawCommand`.
use std::sync::Arc;

use wgpu::{
    CommandEncoder, Device, LoadOp, Operations, Queue, RenderPassColorAttachment,
    RenderPassDepthStencilAttachment, RenderPassDescriptor, StoreOp, TextureView,
};

use crate::graph::{FramePacket, RenderPass};
use crate::pipeline::WorldPipeline;

pub struct WorldPass {
    pipeline:            WorldPipeline,
    camera_bind_group:   Arc<wgpu::BindGroup>,
    lighting_bind_group: Arc<wgpu::BindGroup>,
}

impl WorldPass {
    pub fn new(
        pipeline: WorldPipeline,
        camera_bind_group: Arc<wgpu::BindGroup>,
        lighting_bind_group: Arc<wgpu::BindGroup>,
    ) -> Self {
        Self {
            pipeline,
            camera_bind_group,
            lighting_bind_group,
        }
    }
}

impl RenderPass for WorldPass {
    fn name(&self) -> &str { "World Pass" }

    fn prepare(&mut self, _device: &Device, _queue: &Queue, _packet: &FramePacket) {}

    fn execute(
        &mut self,
        encoder: &mut CommandEncoder,
        color_view: &TextureView,
        resolve_target: Option<&TextureView>,
        depth_view: Option<&TextureView>,
        packet: &FramePacket,
    ) {
        let mut rpass = encoder.begin_render_pass(&RenderPassDescriptor {
            label: Some(self.name()),
            color_attachments: &[Some(RenderPassColorAttachment {
                view: color_view,
                resolve_target,
                ops: Operations {
                    load:  LoadOp::Clear(packet.clear_color),
                    store: StoreOp::Store,
                },
            })],
            depth_stencil_attachment: depth_view.map(|v| RenderPassDepthStencilAttachment {
                view: v,
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
        rpass.set_bind_group(0, &*self.camera_bind_group, &[]);
        rpass.set_bind_group(2, &*self.lighting_bind_group, &[]);

        for cmd in &packet.draws {
            rpass.set_bind_group(1, &*packet.model_bind_group, &[cmd.model_offset]);
            rpass.set_vertex_buffer(0, cmd.mesh.vertex_buffer.slice(..));
            rpass.set_index_buffer(cmd.mesh.index_buffer.slice(..), cmd.mesh.index_format);
            rpass.draw_indexed(0..cmd.mesh.index_count, 0, 0..1);
        }
    }
}
