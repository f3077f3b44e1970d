//! The viewer scene: camera, lights and the active-object slot.

use crate::color::Color;
use crate::scene::active::ActiveSlot;
use crate::scene::camera::Camera;
use crate::scene::light::{AmbientLight, DirectionalLight};
use crate::scene::object::SceneObject;
use crate::transform::Transform;

/// Everything the renderer needs to draw one frame.
///
/// The scene holds at most one model (the active object); swapping it goes
/// through [`Scene::replace_active`].
#[derive(Debug)]
pub struct Scene {
    pub camera: Camera,
    pub ambient: AmbientLight,
    pub sun: DirectionalLight,
    /// Fully transparent by default so the video layer shows through.
    pub clear_color: Color,
    active: ActiveSlot,
}

impl Scene {
    /// Camera at (0, 0, 3), ambient 0.8, shadow-casting sun at (5, 5, 5).
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            camera: Camera::ar_default(aspect_of(width, height)),
            ambient: AmbientLight::default(),
            sun: DirectionalLight::default(),
            clear_color: Color::TRANSPARENT,
            active: ActiveSlot::new(),
        }
    }

    /// Updates the camera aspect.  Zero-sized viewports are ignored.
    pub fn set_viewport_size(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.camera.set_aspect(aspect_of(width, height));
    }

    // ── Active object ──────────────────────────────────────────────────────

    /// Swaps in `next`; returns the retired object for explicit release.
    pub fn replace_active(&mut self, next: SceneObject) -> Option<SceneObject> {
        self.active.replace(next)
    }

    pub fn active(&self) -> Option<&SceneObject> {
        self.active.get()
    }

    pub fn active_transform_mut(&mut self) -> Option<&mut Transform> {
        self.active.transform_mut()
    }

    pub fn slot(&self) -> &ActiveSlot {
        &self.active
    }

    /// Number of model objects in the scene (0 or 1).
    pub fn object_count(&self) -> usize {
        self.active.len()
    }
}

fn aspect_of(width: u32, height: u32) -> f32 {
    if height == 0 {
        1.0
    } else {
        width as f32 / height as f32
    }
}
