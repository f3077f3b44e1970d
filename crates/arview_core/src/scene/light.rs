//! Scene lighting: one ambient term and one shadow-casting directional light.

use glam::{Mat4, Vec3};

use crate::color::Color;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbientLight {
    pub color: Color,
    pub intensity: f32,
}

impl Default for AmbientLight {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            intensity: 0.8,
        }
    }
}

/// Directional light placed at `position` and aimed at `target`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    pub color: Color,
    pub intensity: f32,
    pub position: Vec3,
    pub target: Vec3,
    pub cast_shadow: bool,
    /// Shadow map edge length in texels.
    pub shadow_map_size: u32,
    /// Half-size of the orthographic shadow frustum.
    pub shadow_extent: f32,
    pub shadow_near: f32,
    pub shadow_far: f32,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            intensity: 1.0,
            position: Vec3::new(5.0, 5.0, 5.0),
            target: Vec3::ZERO,
            cast_shadow: true,
            shadow_map_size: 2048,
            shadow_extent: 5.0,
            shadow_near: 0.5,
            shadow_far: 500.0,
        }
    }
}

impl DirectionalLight {
    /// Unit vector pointing *from* the surface *towards* the light.
    pub fn to_light(&self) -> Vec3 {
        (self.position - self.target).try_normalize().unwrap_or(Vec3::Y)
    }

    /// View-projection of the shadow camera (orthographic, right-handed,
    /// depth range 0..1).
    pub fn shadow_view_proj(&self) -> Mat4 {
        let up = if self.to_light().abs_diff_eq(Vec3::Y, 1e-4)
            || self.to_light().abs_diff_eq(Vec3::NEG_Y, 1e-4)
        {
            Vec3::Z
        } else {
            Vec3::Y
        };
        let view = Mat4::look_at_rh(self.position, self.target, up);
        let e = self.shadow_extent;
        let proj = Mat4::orthographic_rh(-e, e, -e, e, self.shadow_near, self.shadow_far);
        proj * view
    }
}
