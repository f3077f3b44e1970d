/// The `RenderPass` trait: every stage of a frame implements it.
///
/// ## Two-phase design
/// `prepare` → `execute` lets passes upload GPU data before a
/// `wgpu::RenderPass` is opened; `write_buffer` cannot be interleaved with
/// an encoder that is recording a render pass.
use wgpu::{CommandEncoder, Device, Queue, TextureView};

use crate::graph::FramePacket;

pub trait RenderPass: 'static {
    /// Debug label.
    fn name(&self) -> &str;

    /// Called when the layer size changes.
    #[allow(unused_variables)]
    fn on_resize(&mut self, device: &Device, queue: &Queue, width: u32, height: u32) {}

    /// Upload GPU data.  Called before `execute` each frame.
    fn prepare(&mut self, device: &Device, queue: &Queue, packet: &FramePacket);

    /// Record draw commands into `encoder`.
    ///
    /// - `color_view`    : color attachment (MSAA texture when active)
    /// - `resolve_target`: single-sample resolve target, or `None` without MSAA
    /// - `depth_view`    : depth attachment, or `None` for passes that skip depth
    fn execute(
        &mut self,
        encoder: &mut CommandEncoder,
        color_view: &TextureView,
        resolve_target: Option<&TextureView>,
        depth_view: Option<&TextureView>,
        packet: &FramePacket,
    );
}
