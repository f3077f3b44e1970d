/// Dynamic uniform buffer holding one [`ObjectUniform`] per draw.
///
/// All per-draw data lives in a single buffer; the shadow and world passes
/// bind it once and pick a slot per draw call through a dynamic offset:
///
/// ```text
/// rpass.set_bind_group(1, &models.bind_group, &[models.offset(slot)]);
/// ```
///
/// Each slot is `align_up(size_of::<ObjectUniform>(), alignment)` bytes,
/// where `alignment` is the device's `min_uniform_buffer_offset_alignment`.
use std::sync::Arc;

use arview_core::scene::DrawItem;
use glam::Mat4;

/// Per-draw uniform: transforms, material colour and shadow flags.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ObjectUniform {
    pub model: [[f32; 4]; 4],
    /// Inverse-transpose of `model`, for normals.
    pub normal: [[f32; 4]; 4],
    /// Linear base colour, straight alpha.
    pub base_color: [f32; 4],
    /// x = receives shadows (0/1); yzw unused.
    pub flags: [f32; 4],
}

impl ObjectUniform {
    pub const SIZE: u64 = std::mem::size_of::<Self>() as u64;

    pub fn from_item(item: &DrawItem) -> Self {
        Self {
            model: item.world.to_cols_array_2d(),
            normal: normal_matrix(item.world).to_cols_array_2d(),
            base_color: item.mesh.material.base_color.to_array(),
            flags: [f32::from(u8::from(item.receive_shadow)), 0.0, 0.0, 0.0],
        }
    }
}

fn normal_matrix(model: Mat4) -> Mat4 {
    let det = model.determinant();
    if det.abs() <= f32::EPSILON || !det.is_finite() {
        return Mat4::IDENTITY;
    }
    model.inverse().transpose()
}

/// A growable GPU buffer of [`ObjectUniform`] slots.
pub struct ModelBuffer {
    pub buffer: wgpu::Buffer,
    /// Single bind group over the whole buffer, used with a dynamic offset.
    pub bind_group: Arc<wgpu::BindGroup>,
    /// Byte stride between consecutive slots.
    pub stride: u32,
    capacity: usize,
}

impl ModelBuffer {
    /// `layout` must be the model layout with `has_dynamic_offset: true`.
    pub fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, initial_capacity: usize) -> Self {
        let alignment = device.limits().min_uniform_buffer_offset_alignment;
        let stride = align_up(ObjectUniform::SIZE as u32, alignment);

        let capacity = initial_capacity.max(1);
        let buffer = Self::create_buffer(device, capacity, stride);
        let bind_group = Self::create_bind_group(device, layout, &buffer);

        Self {
            buffer,
            bind_group: Arc::new(bind_group),
            stride,
            capacity,
        }
    }

    #[inline]
    pub fn offset(&self, index: usize) -> u32 {
        (index as u32).wrapping_mul(self.stride)
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn write(&self, queue: &wgpu::Queue, index: usize, data: &ObjectUniform) {
        debug_assert!(index < self.capacity, "ModelBuffer slot out of range");
        queue.write_buffer(&self.buffer, u64::from(self.offset(index)), bytemuck::bytes_of(data));
    }

    /// Grows the buffer (doubling) until it holds `needed` slots.
    ///
    /// Reallocation replaces the bind group; packets built before the call
    /// must be rebuilt.
    pub fn ensure_capacity(&mut self, device: &wgpu::Device, layout: &wgpu::BindGroupLayout, needed: usize) {
        if needed <= self.capacity {
            return;
        }
        let mut new_cap = self.capacity;
        while new_cap < needed {
            new_cap *= 2;
        }
        log::debug!("ModelBuffer grows {} -> {new_cap} slots", self.capacity);
        self.buffer = Self::create_buffer(device, new_cap, self.stride);
        self.bind_group = Arc::new(Self::create_bind_group(device, layout, &self.buffer));
        self.capacity = new_cap;
    }

    // ── Private helpers ──────────────────────────────────────────────────────

    fn create_buffer(device: &wgpu::Device, capacity: usize, stride: u32) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("ModelBuffer"),
            size: capacity as u64 * u64::from(stride),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    fn create_bind_group(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        buffer: &wgpu::Buffer,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("ModelBuffer BindGroup"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer,
                    offset: 0,
                    // the window the shader sees at each dynamic offset
                    size: wgpu::BufferSize::new(ObjectUniform::SIZE),
                }),
            }],
        })
    }
}

/// Round `value` up to the next multiple of `alignment` (a power of two).
#[inline]
pub(crate) fn align_up(value: u32, alignment: u32) -> u32 {
    (value + alignment - 1) & !(alignment - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arview_core::{Color, Material, MeshData};
    use glam::Vec3;

    #[test]
    fn align_up_rounds_to_power_of_two() {
        assert_eq!(align_up(160, 256), 256);
        assert_eq!(align_up(256, 256), 256);
        assert_eq!(align_up(257, 256), 512);
        assert_eq!(align_up(160, 32), 160);
    }

    #[test]
    fn uniform_layout_matches_wgsl() {
        // mat4 + mat4 + vec4 + vec4
        assert_eq!(ObjectUniform::SIZE, 160);
    }

    #[test]
    fn object_uniform_carries_material_and_flags() {
        let mesh = MeshData::new(vec![[0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]], Vec::new(), vec![0, 1, 2])
            .with_material(Material {
                base_color: Color::rgba(0.1, 0.2, 0.3, 0.8),
            });
        let item = DrawItem {
            mesh: Arc::new(mesh),
            world: Mat4::from_scale(Vec3::new(2.0, 2.0, 2.0)),
            cast_shadow: true,
            receive_shadow: true,
        };
        let u = ObjectUniform::from_item(&item);
        assert_eq!(u.base_color, [0.1, 0.2, 0.3, 0.8]);
        assert_eq!(u.flags[0], 1.0);
        // uniform scale: normal matrix is the inverse scale
        assert!((u.normal[0][0] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn singular_model_falls_back_to_identity_normals() {
        assert_eq!(normal_matrix(Mat4::ZERO), Mat4::IDENTITY);
    }
}
