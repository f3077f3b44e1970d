//! Object transform: position, rotation (Euler XYZ), uniform scale.
//!
//! `Transform` is `Copy` and `Default`, making it easy to embed in any
//! struct.  Call `.matrix()` to get the combined model matrix for upload
//! to the GPU.

use glam::{EulerRot, Mat4, Quat, Vec3};

/// Root transform of a scene object.
///
/// Rotation is kept as three Euler angles (radians, intrinsic X → Y → Z) so
/// that drag deltas can be accumulated per axis and reset to exactly zero.
///
/// # Example
/// ```rust,ignore
/// use arview_core::Transform;
/// use glam::Vec3;
///
/// let mut t = Transform::from_position(Vec3::new(0.0, 0.0, -2.0));
/// t.rotate_euler(Vec3::new(0.0, 0.5, 0.0));
/// let m = t.matrix();
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// World-space position.
    pub position: Vec3,
    /// Euler angles in radians (x, y, z).
    pub rotation: Vec3,
    /// Uniform scale factor.
    pub scale: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    /// No translation, no rotation, scale 1.
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Vec3::ZERO,
        scale: 1.0,
    };

    /// Construct with a world-space position, zero rotation and scale 1.
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    /// Orientation as a quaternion.
    pub fn quat(&self) -> Quat {
        Quat::from_euler(EulerRot::XYZ, self.rotation.x, self.rotation.y, self.rotation.z)
    }

    /// Build the TRS model matrix (`T * R * S`).
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(Vec3::splat(self.scale), self.quat(), self.position)
    }

    /// Add `delta` radians to each Euler angle.
    pub fn rotate_euler(&mut self, delta: Vec3) {
        self.rotation += delta;
    }

    /// Zero all three Euler angles.
    pub fn reset_rotation(&mut self) {
        self.rotation = Vec3::ZERO;
    }

    /// Multiply the uniform scale by `factor`.
    pub fn scale_by(&mut self, factor: f32) {
        self.scale *= factor;
    }

    /// Apply a translation offset in world space.
    pub fn translate(&mut self, offset: Vec3) {
        self.position += offset;
    }
}
