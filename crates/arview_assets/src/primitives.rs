//! Built-in shapes shown when no external model is loaded.
//!
//! All three share one translucent green material and are centred on the
//! origin, so they can be placed at the standoff position without a pivot.

use std::f32::consts::{PI, TAU};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use arview_core::{Color, Material, MeshData, SceneNode, SceneObject, Transform};
use glam::Vec3;

const SEGMENTS: u32 = 32;
const RINGS: u32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Cube,
    Sphere,
    Cone,
}

impl PrimitiveKind {
    pub const ALL: [PrimitiveKind; 3] = [PrimitiveKind::Cube, PrimitiveKind::Sphere, PrimitiveKind::Cone];

    pub fn name(self) -> &'static str {
        match self {
            PrimitiveKind::Cube => "cube",
            PrimitiveKind::Sphere => "sphere",
            PrimitiveKind::Cone => "cone",
        }
    }

    pub fn mesh(self) -> MeshData {
        let mesh = match self {
            PrimitiveKind::Cube => cube(),
            PrimitiveKind::Sphere => sphere(),
            PrimitiveKind::Cone => cone(),
        };
        mesh.with_material(primitive_material())
    }

    /// A ready-to-show object positioned at `standoff` with unit scale.
    pub fn build(self, standoff: Vec3) -> SceneObject {
        let mut root = SceneNode::new(self.name()).with_mesh(Arc::new(self.mesh()));
        root.set_shadows(true, true);
        let mut object = SceneObject::new(self.name(), format!("builtin:{}", self.name()), root);
        object.transform = Transform::from_position(standoff);
        object
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PrimitiveKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cube" => Ok(PrimitiveKind::Cube),
            "sphere" => Ok(PrimitiveKind::Sphere),
            "cone" => Ok(PrimitiveKind::Cone),
            other => Err(other.to_string()),
        }
    }
}

/// `#00ff88` at 80% opacity.
pub fn primitive_material() -> Material {
    Material {
        base_color: Color::from_rgb_hex(0x00ff88).with_alpha(0.8),
    }
}

/// Unit cube, 24 vertices so every face gets a flat normal.
fn cube() -> MeshData {
    const H: f32 = 0.5;
    let faces: [([f32; 3], [[f32; 3]; 4]); 6] = [
        // front  (z+)
        ([0.0, 0.0, 1.0], [[-H, -H, H], [H, -H, H], [H, H, H], [-H, H, H]]),
        // back   (z-)
        ([0.0, 0.0, -1.0], [[H, -H, -H], [-H, -H, -H], [-H, H, -H], [H, H, -H]]),
        // left   (x-)
        ([-1.0, 0.0, 0.0], [[-H, -H, -H], [-H, -H, H], [-H, H, H], [-H, H, -H]]),
        // right  (x+)
        ([1.0, 0.0, 0.0], [[H, -H, H], [H, -H, -H], [H, H, -H], [H, H, H]]),
        // top    (y+)
        ([0.0, 1.0, 0.0], [[-H, H, H], [H, H, H], [H, H, -H], [-H, H, -H]]),
        // bottom (y-)
        ([0.0, -1.0, 0.0], [[-H, -H, -H], [H, -H, -H], [H, -H, H], [-H, -H, H]]),
    ];

    let mut positions = Vec::with_capacity(24);
    let mut normals = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for (normal, corners) in faces {
        let base = positions.len() as u32;
        positions.extend_from_slice(&corners);
        normals.extend_from_slice(&[normal; 4]);
        indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
    }
    MeshData::new(positions, normals, indices)
}

/// UV sphere of radius 0.5.
fn sphere() -> MeshData {
    let radius = 0.5;
    let mut positions = Vec::new();
    let mut normals = Vec::new();
    for ring in 0..=RINGS {
        let phi = PI * ring as f32 / RINGS as f32;
        for seg in 0..=SEGMENTS {
            let theta = TAU * seg as f32 / SEGMENTS as f32;
            let n = Vec3::new(phi.sin() * theta.cos(), phi.cos(), -phi.sin() * theta.sin());
            positions.push((n * radius).to_array());
            normals.push(n.to_array());
        }
    }

    let stride = SEGMENTS + 1;
    let mut indices = Vec::new();
    for ring in 0..RINGS {
        for seg in 0..SEGMENTS {
            let a = ring * stride + seg;
            let b = a + stride;
            indices.extend_from_slice(&[a, b, a + 1, a + 1, b, b + 1]);
        }
    }
    MeshData::new(positions, normals, indices)
}

/// Cone of radius 0.5 and height 1, apex up, with a closed base.
fn cone() -> MeshData {
    let radius = 0.5;
    let half_h = 0.5;
    // side normal tilts up by atan(radius / height)
    let slope = radius / (2.0 * half_h);

    let mut positions = Vec::new();
    let mut normals = Vec::new();
    let mut indices = Vec::new();

    // sides: one apex copy per segment so normals stay smooth around the rim
    for seg in 0..SEGMENTS {
        let t0 = TAU * seg as f32 / SEGMENTS as f32;
        let t1 = TAU * (seg + 1) as f32 / SEGMENTS as f32;
        let tm = 0.5 * (t0 + t1);
        let side_normal = |t: f32| Vec3::new(t.cos(), slope, -t.sin()).normalize().to_array();

        let base = positions.len() as u32;
        positions.push([radius * t0.cos(), -half_h, -radius * t0.sin()]);
        positions.push([radius * t1.cos(), -half_h, -radius * t1.sin()]);
        positions.push([0.0, half_h, 0.0]);
        normals.push(side_normal(t0));
        normals.push(side_normal(t1));
        normals.push(side_normal(tm));
        indices.extend_from_slice(&[base, base + 1, base + 2]);
    }

    // base cap
    let center = positions.len() as u32;
    positions.push([0.0, -half_h, 0.0]);
    normals.push([0.0, -1.0, 0.0]);
    for seg in 0..=SEGMENTS {
        let t = TAU * seg as f32 / SEGMENTS as f32;
        positions.push([radius * t.cos(), -half_h, -radius * t.sin()]);
        normals.push([0.0, -1.0, 0.0]);
    }
    for seg in 0..SEGMENTS {
        let a = center + 1 + seg;
        indices.extend_from_slice(&[center, a + 1, a]);
    }
    MeshData::new(positions, normals, indices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn cube_is_unit_sized_and_closed() {
        let mesh = PrimitiveKind::Cube.mesh();
        assert_eq!(mesh.vertex_count(), 24);
        assert_eq!(mesh.triangle_count(), 12);
        let b = mesh.local_bounds();
        assert_relative_eq!(b.size().x, 1.0);
        assert_relative_eq!(b.size().y, 1.0);
        assert_relative_eq!(b.size().z, 1.0);
    }

    #[test]
    fn sphere_and_cone_fit_unit_box() {
        for kind in [PrimitiveKind::Sphere, PrimitiveKind::Cone] {
            let b = kind.mesh().local_bounds();
            assert_relative_eq!(b.max_dim(), 1.0, epsilon = 1e-5);
            assert_relative_eq!(b.center().y, 0.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn cube_faces_wind_outward() {
        let mesh = PrimitiveKind::Cube.mesh();
        for tri in mesh.indices.chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| Vec3::from(mesh.positions[i as usize]));
            let face = (b - a).cross(c - a).normalize();
            let n = Vec3::from(mesh.normals[tri[0] as usize]);
            assert!(face.dot(n) > 0.99, "face {face:?} vs normal {n:?}");
        }
    }

    #[test]
    fn built_primitive_sits_at_standoff_with_shared_material() {
        let standoff = Vec3::new(0.0, 0.0, -2.0);
        for kind in PrimitiveKind::ALL {
            let obj = kind.build(standoff);
            assert_eq!(obj.transform.position, standoff);
            assert_eq!(obj.transform.scale, 1.0);
            assert_eq!(obj.origin, format!("builtin:{kind}"));
            let mesh = obj.root.mesh.as_ref().unwrap();
            assert_relative_eq!(mesh.material.base_color.a, 0.8);
            assert!(mesh.material.is_transparent());
        }
    }

    #[test]
    fn parses_names_case_insensitively() {
        assert_eq!("CONE".parse::<PrimitiveKind>(), Ok(PrimitiveKind::Cone));
        assert!("pyramid".parse::<PrimitiveKind>().is_err());
    }
}
