//! Fits an arbitrary model into a fixed size in front of the camera.

use arview_core::{Aabb, SceneObject, Transform};
use glam::Vec3;

/// Longest edge of a normalised model, in world units.
pub const TARGET_SIZE: f32 = 2.0;
/// Where normalised models are placed relative to the world origin.
pub const STANDOFF: Vec3 = Vec3::new(0.0, 0.0, -2.0);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalization {
    pub target_size: f32,
    pub standoff: Vec3,
}

impl Default for Normalization {
    fn default() -> Self {
        Self {
            target_size: TARGET_SIZE,
            standoff: STANDOFF,
        }
    }
}

/// What [`normalize`] measured and applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizeReport {
    pub source_bounds: Aabb,
    pub scale: f32,
}

/// Re-centres `object` on its bounding-box centre, scales it so the largest
/// dimension equals `target_size`, moves it to `standoff` and turns shadows on
/// for every mesh.  Degenerate bounds (empty, flat to a point, non-finite)
/// leave the scale at 1.
pub fn normalize(object: &mut SceneObject, params: &Normalization) -> NormalizeReport {
    let bounds = object.local_bounds();
    let max_dim = bounds.max_dim();
    let scale = if max_dim > 0.0 && max_dim.is_finite() {
        params.target_size / max_dim
    } else {
        1.0
    };

    object.pivot = if bounds.is_empty() { Vec3::ZERO } else { -bounds.center() };
    object.transform = Transform {
        position: params.standoff,
        rotation: Vec3::ZERO,
        scale,
    };
    object.root.set_shadows(true, true);

    log::debug!(
        "normalised '{}': max dimension {max_dim:.3} -> scale {scale:.4}",
        object.name
    );
    NormalizeReport {
        source_bounds: bounds,
        scale,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use arview_core::{MeshData, SceneNode};
    use glam::Mat4;
    use std::sync::Arc;

    fn box_object(min: [f32; 3], max: [f32; 3]) -> SceneObject {
        let mesh = MeshData::new(vec![min, max, [min[0], max[1], min[2]]], Vec::new(), vec![0, 1, 2]);
        let root = SceneNode::new("root").with_child(
            SceneNode::new("child")
                .with_local(Mat4::from_translation(Vec3::new(10.0, 0.0, 0.0)))
                .with_mesh(Arc::new(mesh)),
        );
        SceneObject::new("box", "test", root)
    }

    #[test]
    fn largest_dimension_becomes_target_and_centre_lands_on_standoff() {
        let mut obj = box_object([0.0, 0.0, 0.0], [10.0, 4.0, 2.0]);
        let report = normalize(&mut obj, &Normalization::default());
        assert_relative_eq!(report.scale, 0.2);

        let world = obj.world_bounds();
        assert_relative_eq!(world.max_dim(), TARGET_SIZE, epsilon = 1e-5);
        let c = world.center();
        assert_relative_eq!(c.x, STANDOFF.x, epsilon = 1e-5);
        assert_relative_eq!(c.y, STANDOFF.y, epsilon = 1e-5);
        assert_relative_eq!(c.z, STANDOFF.z, epsilon = 1e-5);
    }

    #[test]
    fn rotation_pivots_about_the_centre() {
        let mut obj = box_object([-3.0, 1.0, 5.0], [1.0, 3.0, 7.0]);
        normalize(&mut obj, &Normalization::default());
        obj.transform.rotate_euler(Vec3::new(0.4, 1.1, 0.0));
        let c = obj.world_bounds().center();
        // a rotated box's AABB is still centred on the pivot
        assert_relative_eq!(c.x, STANDOFF.x, epsilon = 1e-4);
        assert_relative_eq!(c.y, STANDOFF.y, epsilon = 1e-4);
        assert_relative_eq!(c.z, STANDOFF.z, epsilon = 1e-4);
    }

    #[test]
    fn marks_every_mesh_for_shadows() {
        let mut obj = box_object([0.0; 3], [1.0; 3]);
        normalize(&mut obj, &Normalization::default());
        for item in obj.draw_items() {
            assert!(item.cast_shadow && item.receive_shadow);
        }
    }

    #[test]
    fn degenerate_bounds_keep_unit_scale() {
        let mut point = box_object([1.0; 3], [1.0; 3]);
        let report = normalize(&mut point, &Normalization::default());
        assert_eq!(report.scale, 1.0);

        let mut empty = SceneObject::new("empty", "test", SceneNode::new("root"));
        let report = normalize(&mut empty, &Normalization::default());
        assert_eq!(report.scale, 1.0);
        assert_eq!(empty.pivot, Vec3::ZERO);
        assert_eq!(empty.transform.position, STANDOFF);
    }
}
