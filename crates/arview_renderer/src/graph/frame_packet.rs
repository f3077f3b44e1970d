/// Data assembled once per frame and passed immutably to every `RenderPass`.
///
/// Passes see resolved GPU handles and slot offsets, not the scene graph.
use std::sync::Arc;

use glam::{Mat4, Vec3};

use crate::geometry::GpuMesh;

// ── Camera ────────────────────────────────────────────────────────────────────

pub struct CameraPacket {
    pub view_proj: Mat4,
    pub eye: Vec3,
}

// ── 3-D scene ─────────────────────────────────────────────────────────────────

/// One indexed draw, resolved to GPU buffers and a `ModelBuffer` offset.
pub struct DrawCommand {
    pub mesh: GpuMesh,
    /// Dynamic offset into the model buffer (group 1).
    pub model_offset: u32,
    pub cast_shadow: bool,
}

// ── Frame packet ──────────────────────────────────────────────────────────────

pub struct FramePacket {
    pub camera: CameraPacket,
    /// Orthographic shadow camera of the directional light.
    pub light: CameraPacket,
    /// Premultiplied clear colour of the 3D layer.
    pub clear_color: wgpu::Color,
    pub draws: Vec<DrawCommand>,
    /// Bind group of the model buffer the offsets refer to.
    pub model_bind_group: Arc<wgpu::BindGroup>,
}

impl FramePacket {
    pub fn shadow_casters(&self) -> impl Iterator<Item = &DrawCommand> {
        self.draws.iter().filter(|d| d.cast_shadow)
    }
}
