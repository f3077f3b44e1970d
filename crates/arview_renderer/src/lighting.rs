//! Light uniforms and the directional shadow map.

use std::sync::Arc;

use arview_core::scene::{AmbientLight, DirectionalLight};

use crate::render_target::DepthTarget;
use crate::resources::{buffer, texture};

/// group(2) binding(0) of the world shader.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    pub light_view_proj: [[f32; 4]; 4],
    /// xyz: unit vector towards the light; w: 1 when shadows are enabled.
    pub to_light: [f32; 4],
    /// Sun colour premultiplied by intensity.
    pub sun: [f32; 4],
    /// Ambient colour premultiplied by intensity.
    pub ambient: [f32; 4],
}

impl LightUniform {
    pub fn new(ambient: &AmbientLight, sun: &DirectionalLight) -> Self {
        let [sr, sg, sb] = sun.color.scaled(sun.intensity);
        let [ar, ag, ab] = ambient.color.scaled(ambient.intensity);
        Self {
            light_view_proj: sun.shadow_view_proj().to_cols_array_2d(),
            to_light: sun.to_light().extend(f32::from(u8::from(sun.cast_shadow))).to_array(),
            sun: [sr, sg, sb, 1.0],
            ambient: [ar, ag, ab, 1.0],
        }
    }
}

/// Square depth texture the shadow pass renders into.
pub struct ShadowMap {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub size: u32,
}

impl ShadowMap {
    pub fn new(device: &wgpu::Device, size: u32) -> Self {
        let size = size.clamp(1, device.limits().max_texture_dimension_2d);
        let texture = texture::create_render_texture(device, &texture::RenderTextureDesc {
            label: "Shadow Map",
            width: size,
            height: size,
            format: DepthTarget::FORMAT,
            sample_count: 1,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        });
        let view = texture::default_view(&texture);
        Self { texture, view, size }
    }
}

/// Light buffer bound with the shadow map and a comparison sampler at group(2).
pub struct GpuLights {
    pub uniform: LightUniform,
    pub buffer: Arc<wgpu::Buffer>,
    pub bind_group: Arc<wgpu::BindGroup>,
}

impl GpuLights {
    pub fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, shadow_map: &ShadowMap) -> Self {
        let uniform = LightUniform::new(&AmbientLight::default(), &DirectionalLight::default());
        let buffer = buffer::create_uniform(device, "Light Uniform Buffer", &uniform);
        let sampler = texture::shadow_sampler(device);
        let bind_group = Arc::new(device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Lighting Bind Group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&shadow_map.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        }));
        Self {
            uniform,
            buffer,
            bind_group,
        }
    }

    pub fn sync(&mut self, queue: &wgpu::Queue, ambient: &AmbientLight, sun: &DirectionalLight) {
        self.uniform = LightUniform::new(ambient, sun);
        buffer::update_uniform(queue, &self.buffer, &self.uniform);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn uniform_scales_colours_by_intensity() {
        let u = LightUniform::new(&AmbientLight::default(), &DirectionalLight::default());
        assert_eq!(u.ambient, [0.8, 0.8, 0.8, 1.0]);
        assert_eq!(u.sun, [1.0, 1.0, 1.0, 1.0]);
        let dir = Vec3::new(u.to_light[0], u.to_light[1], u.to_light[2]);
        assert!(dir.abs_diff_eq(Vec3::ONE.normalize(), 1e-6));
        assert_eq!(u.to_light[3], 1.0);
    }

    #[test]
    fn shadows_can_be_disabled() {
        let sun = DirectionalLight {
            cast_shadow: false,
            ..Default::default()
        };
        assert_eq!(LightUniform::new(&AmbientLight::default(), &sun).to_light[3], 0.0);
    }

    #[test]
    fn uniform_size_matches_wgsl() {
        assert_eq!(std::mem::size_of::<LightUniform>(), 112);
    }
}
