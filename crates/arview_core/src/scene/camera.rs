use glam::{Mat4, Vec3};

/// Perspective camera.  The struct lives in core so that the viewport logic
/// can inspect or modify it directly; renderer-specific code still owns GPU
/// resources such as the uniform buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    // --- view parameters --------------------------------------------------
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    // --- projection parameters --------------------------------------------
    /// Vertical field of view in radians.
    pub fovy: f32,
    pub aspect: f32,
    pub znear: f32,
    pub zfar: f32,
}

impl Camera {
    pub const AR_FOV_DEGREES: f32 = 75.0;
    pub const AR_NEAR: f32 = 0.1;
    pub const AR_FAR: f32 = 1000.0;
    pub const AR_EYE: Vec3 = Vec3::new(0.0, 0.0, 3.0);

    /// The viewer camera: 75° fov at (0, 0, 3), looking down −Z.
    pub fn ar_default(aspect: f32) -> Self {
        Self {
            eye: Self::AR_EYE,
            target: Self::AR_EYE + Vec3::NEG_Z,
            up: Vec3::Y,
            fovy: Self::AR_FOV_DEGREES.to_radians(),
            aspect,
            znear: Self::AR_NEAR,
            zfar: Self::AR_FAR,
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fovy, self.aspect, self.znear, self.zfar)
    }

    /// Build the combined view-projection matrix from the current parameters.
    pub fn build_view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Update the aspect ratio when viewport dimensions change.
    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
    }

    /// Unit vector the camera looks along.
    pub fn forward(&self) -> Vec3 {
        (self.target - self.eye).normalize_or_zero()
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::ar_default(1.0)
    }
}

/// Uniform data uploaded to the GPU: view-projection plus eye position
/// (`w` unused) for specular terms.
#[cfg(feature = "gpu")]
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    pub eye: [f32; 4],
}

#[cfg(feature = "gpu")]
impl CameraUniform {
    pub fn new() -> Self {
        Self {
            view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            eye: [0.0; 4],
        }
    }

    pub fn update(&mut self, camera: &Camera) {
        self.view_proj = camera.build_view_projection_matrix().to_cols_array_2d();
        self.eye = camera.eye.extend(1.0).to_array();
    }
}

#[cfg(feature = "gpu")]
impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn ar_default_faces_negative_z() {
        let cam = Camera::ar_default(16.0 / 9.0);
        assert_eq!(cam.eye, Vec3::new(0.0, 0.0, 3.0));
        assert!(cam.forward().abs_diff_eq(Vec3::NEG_Z, 1e-6));
        assert_relative_eq!(cam.fovy, 75f32.to_radians());
        assert_relative_eq!(cam.zfar, 1000.0);
    }

    #[test]
    fn point_in_front_projects_inside_clip_space() {
        let cam = Camera::ar_default(1.0);
        let clip = cam.build_view_projection_matrix() * Vec3::new(0.0, 0.0, -2.0).extend(1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-5 && ndc.y.abs() < 1e-5);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }
}
