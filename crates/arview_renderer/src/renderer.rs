//! The wgpu implementation of [`FrameRenderer`].

use std::collections::HashMap;

use arview_core::context::EngineContext;
use arview_core::scene::{DirectionalLight, DrawItem};
use arview_core::{ObjectId, Scene, SceneObject};
use image::RgbaImage;

use crate::camera::GpuCamera;
use crate::error::RenderError;
use crate::frame::FrameRenderer;
use crate::geometry::GpuMesh;
use crate::graph::{CameraPacket, DrawCommand, FramePacket, RenderPass};
use crate::lighting::GpuLights;
use crate::passes::{PresentPass, ShadowPass, WorldPass};
use crate::pipeline::{PipelineLayouts, WorldPipeline};
use crate::readback;
use crate::render_target::RenderTarget;
use crate::resources::{ModelBuffer, ObjectUniform};

/// Offscreen 3D layer renderer with optional presentation to a window.
///
/// Each frame runs the shadow pass then the world pass into the layer
/// target.  [`Renderer::present`] composes the latest video frame and the
/// layer into a surface texture.
pub struct Renderer {
    pub context: EngineContext,
    target: RenderTarget,
    layouts: PipelineLayouts,

    // ── Per-frame uniforms ────────────────────────────────────────────────
    camera: GpuCamera,
    lights: GpuLights,
    models: ModelBuffer,

    // ── Passes ────────────────────────────────────────────────────────────
    shadow: ShadowPass,
    world: WorldPass,
    present: Option<PresentPass>,

    // ── Object cache ──────────────────────────────────────────────────────
    objects: HashMap<ObjectId, Vec<GpuMesh>>,
    retired: u64,
    last_packet: Option<FramePacket>,
}

impl Renderer {
    pub fn new(context: EngineContext, width: u32, height: u32) -> Self {
        let device = &context.device;

        let target = RenderTarget::new(device, width, height, RenderTarget::SAMPLE_COUNT);
        let layouts = PipelineLayouts::new(device);

        let camera = GpuCamera::new(device, "Camera Uniform Buffer", &layouts.camera);
        let shadow = ShadowPass::new(device, &layouts, DirectionalLight::default().shadow_map_size);
        let lights = GpuLights::new(device, &layouts.lighting, &shadow.map);
        let models = ModelBuffer::new(device, &layouts.model, 16);

        let world_pipeline = WorldPipeline::new(device, RenderTarget::FORMAT, target.sample_count(), &layouts);
        let world = WorldPass::new(world_pipeline, camera.bind_group.clone(), lights.bind_group.clone());

        Self {
            context,
            target,
            layouts,
            camera,
            lights,
            models,
            shadow,
            world,
            present: None,
            objects: HashMap::new(),
            retired: 0,
            last_packet: None,
        }
    }

    /// Enables [`present`](Self::present) for surfaces of `format`.
    pub fn attach_surface(&mut self, format: wgpu::TextureFormat) {
        if self.present.as_ref().is_some_and(|p| p.surface_format() == format) {
            return;
        }
        self.present = Some(PresentPass::new(
            &self.context.device,
            format,
            &self.layouts,
            self.target.color_view(),
        ));
    }

    /// Uploads the camera frame drawn behind the layer.
    pub fn upload_video(&mut self, width: u32, height: u32, rgba: &[u8]) {
        if let Some(present) = &mut self.present {
            present.upload_video(&self.context.device, &self.context.queue, width, height, rgba);
        }
    }

    pub fn clear_video(&mut self) {
        if let Some(present) = &mut self.present {
            present.clear_video();
        }
    }

    /// Draws video + layer into `view` (a surface texture).
    pub fn present(&mut self, view: &wgpu::TextureView) -> Result<(), RenderError> {
        let present = self
            .present
            .as_mut()
            .ok_or_else(|| RenderError::Surface("no surface attached".into()))?;
        let packet = match self.last_packet.take() {
            Some(p) => p,
            None => empty_packet(&self.models),
        };

        let mut encoder = self
            .context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Present Encoder"),
            });
        present.prepare(&self.context.device, &self.context.queue, &packet);
        present.execute(&mut encoder, view, None, None, &packet);
        self.context.queue.submit(std::iter::once(encoder.finish()));
        self.last_packet = Some(packet);
        Ok(())
    }

    pub fn size(&self) -> (u32, u32) {
        (self.target.width, self.target.height)
    }

    /// Objects with uploaded GPU meshes.
    pub fn gpu_object_count(&self) -> usize {
        self.objects.len()
    }

    /// Objects released through [`FrameRenderer::retire`].
    pub fn retired_count(&self) -> u64 {
        self.retired
    }

    // ── Private helpers ───────────────────────────────────────────────────────

    /// Uploads `object` on first sight and drops meshes of anything else.
    fn sync_objects(&mut self, object: Option<&SceneObject>, items: &[DrawItem]) {
        let keep = object.map(SceneObject::id);
        self.objects.retain(|id, _| {
            let live = Some(*id) == keep;
            if !live {
                log::warn!("dropping GPU meshes of {id:?} that was never retired");
            }
            live
        });

        let Some(object) = object else { return };
        let device = &self.context.device;
        let meshes = self.objects.entry(object.id()).or_default();
        if meshes.len() != items.len() {
            *meshes = items
                .iter()
                .enumerate()
                .map(|(i, item)| GpuMesh::upload(device, &format!("{}#{i}", object.name), &item.mesh))
                .collect();
            let bytes: u64 = meshes.iter().map(GpuMesh::byte_size).sum();
            log::debug!("uploaded '{}': {} meshes, {bytes} bytes", object.name, meshes.len());
        }
    }

    fn build_packet(&mut self, scene: &Scene, items: &[DrawItem]) -> FramePacket {
        let device = &self.context.device;
        let queue = &self.context.queue;
        self.models.ensure_capacity(device, &self.layouts.model, items.len());

        let meshes = scene
            .active()
            .and_then(|o| self.objects.get(&o.id()))
            .map(Vec::as_slice)
            .unwrap_or_default();

        let mut draws = Vec::with_capacity(items.len());
        for (slot, (item, mesh)) in items.iter().zip(meshes).enumerate() {
            self.models.write(queue, slot, &ObjectUniform::from_item(item));
            draws.push(DrawCommand {
                mesh: mesh.clone(),
                model_offset: self.models.offset(slot),
                cast_shadow: item.cast_shadow,
            });
        }

        let c = scene.clear_color;
        FramePacket {
            camera: CameraPacket {
                view_proj: scene.camera.build_view_projection_matrix(),
                eye: scene.camera.eye,
            },
            light: CameraPacket {
                view_proj: scene.sun.shadow_view_proj(),
                eye: scene.sun.position,
            },
            clear_color: wgpu::Color {
                r: f64::from(c.r * c.a),
                g: f64::from(c.g * c.a),
                b: f64::from(c.b * c.a),
                a: f64::from(c.a),
            },
            draws,
            model_bind_group: self.models.bind_group.clone(),
        }
    }
}

fn empty_packet(models: &ModelBuffer) -> FramePacket {
    let idle = || CameraPacket {
        view_proj: glam::Mat4::IDENTITY,
        eye: glam::Vec3::ZERO,
    };
    FramePacket {
        camera: idle(),
        light: idle(),
        clear_color: wgpu::Color::TRANSPARENT,
        draws: Vec::new(),
        model_bind_group: models.bind_group.clone(),
    }
}

impl FrameRenderer for Renderer {
    fn resize(&mut self, width: u32, height: u32) {
        if !self.target.resize(&self.context.device, width, height) {
            return;
        }
        if let Some(present) = &mut self.present {
            present.set_layer(&self.context.device, self.target.color_view());
        }
        for pass in [&mut self.shadow as &mut dyn RenderPass, &mut self.world] {
            pass.on_resize(&self.context.device, &self.context.queue, width, height);
        }
        log::debug!("layer resized to {width}x{height}");
    }

    fn render(&mut self, scene: &Scene) -> Result<(), RenderError> {
        let items = scene.active().map(SceneObject::draw_items).unwrap_or_default();
        self.sync_objects(scene.active(), &items);

        self.camera.sync(&self.context.queue, &scene.camera);
        self.lights.sync(&self.context.queue, &scene.ambient, &scene.sun);
        let packet = self.build_packet(scene, &items);

        let device = &self.context.device;
        let queue = &self.context.queue;
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Frame Encoder"),
        });

        let (color_view, resolve_target) = self.target.color_views();
        let depth_view = self.target.depth_view();
        for pass in [&mut self.shadow as &mut dyn RenderPass, &mut self.world] {
            pass.prepare(device, queue, &packet);
            pass.execute(&mut encoder, color_view, resolve_target, Some(depth_view), &packet);
        }
        queue.submit(std::iter::once(encoder.finish()));

        self.last_packet = Some(packet);
        Ok(())
    }

    fn read_layer(&mut self) -> Result<RgbaImage, RenderError> {
        readback::read_texture(
            &self.context.device,
            &self.context.queue,
            self.target.color_texture(),
            self.target.width,
            self.target.height,
        )
    }

    fn retire(&mut self, object: ObjectId) {
        if let Some(meshes) = self.objects.remove(&object) {
            self.retired += 1;
            let bytes: u64 = meshes.iter().map(GpuMesh::byte_size).sum();
            log::debug!("retired {object:?}: released {bytes} bytes");
        }
    }
}
