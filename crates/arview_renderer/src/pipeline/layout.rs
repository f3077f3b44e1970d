/// Bind-group layouts shared by the pipelines.  Created once and handed out
/// through `Arc` so every pass binds against the same layout objects.
use std::sync::Arc;

use crate::resources::ObjectUniform;

#[derive(Clone)]
pub struct PipelineLayouts {
    /// group(0): camera (or light camera) view-projection, binding 0.
    pub camera: Arc<wgpu::BindGroupLayout>,
    /// group(1): per-draw [`ObjectUniform`] with a dynamic offset.
    pub model: Arc<wgpu::BindGroupLayout>,
    /// group(2) of the world shader: lights, shadow map, comparison sampler.
    pub lighting: Arc<wgpu::BindGroupLayout>,
    /// group(0) of the present shader: one filterable texture and its sampler.
    pub present: Arc<wgpu::BindGroupLayout>,
}

impl PipelineLayouts {
    pub fn new(device: &wgpu::Device) -> Self {
        let uniform_entry = |binding: u32, dynamic: bool, min_size: Option<u64>| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: dynamic,
                min_binding_size: min_size.and_then(wgpu::BufferSize::new),
            },
            count: None,
        };

        let camera = Arc::new(device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Layout: Camera"),
            entries: &[uniform_entry(0, false, None)],
        }));

        let model = Arc::new(device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Layout: Model (dynamic)"),
            entries: &[uniform_entry(0, true, Some(ObjectUniform::SIZE))],
        }));

        let lighting = Arc::new(device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Layout: Lighting"),
            entries: &[
                uniform_entry(0, false, None),
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Depth,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                    count: None,
                },
            ],
        }));

        let present = Arc::new(device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Layout: Present"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        }));

        Self {
            camera,
            model,
            lighting,
            present,
        }
    }
}
