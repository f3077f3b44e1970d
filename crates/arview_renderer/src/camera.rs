/// GPU-side camera resources: the uniform buffer and its bind group.
///
/// The same type backs the viewer camera (world pass) and the light's
/// shadow camera (shadow pass); both bind at group(0).
use std::sync::Arc;

use arview_core::scene::{Camera, CameraUniform};
use glam::{Mat4, Vec3};

use crate::resources::buffer;

pub struct GpuCamera {
    pub uniform: CameraUniform,
    pub buffer: Arc<wgpu::Buffer>,
    pub bind_group: Arc<wgpu::BindGroup>,
}

impl GpuCamera {
    /// `layout` must have a single `UNIFORM` buffer entry at binding 0.
    pub fn new(device: &wgpu::Device, label: &str, layout: &wgpu::BindGroupLayout) -> Self {
        let uniform = CameraUniform::new();
        let buf = buffer::create_uniform(device, label, &uniform);

        let bind_group = Arc::new(device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buf.as_entire_binding(),
            }],
        }));

        Self {
            uniform,
            buffer: buf,
            bind_group,
        }
    }

    /// Uploads the view-projection of `camera`.  Call once per frame before
    /// any pass executes.
    pub fn sync(&mut self, queue: &wgpu::Queue, camera: &Camera) {
        self.uniform.update(camera);
        buffer::update_uniform(queue, &self.buffer, &self.uniform);
    }

    /// Uploads an explicit matrix, e.g. the light's shadow projection.
    pub fn sync_matrix(&mut self, queue: &wgpu::Queue, view_proj: Mat4, eye: Vec3) {
        self.uniform.view_proj = view_proj.to_cols_array_2d();
        self.uniform.eye = eye.extend(1.0).to_array();
        buffer::update_uniform(queue, &self.buffer, &self.uniform);
    }
}
