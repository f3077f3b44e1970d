//! CPU-side triangle meshes and their flat materials.
//!
//! `MeshData` is what loaders produce and what the renderer uploads.  It is
//! shared through `Arc` between scene nodes so instanced glTF meshes are only
//! stored once.

use glam::Vec3;

use crate::bounds::Aabb;
use crate::color::Color;

/// Surface description used by the lit world shader.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    /// Linear base colour; `a` is the opacity.
    pub base_color: Color,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            base_color: Color::WHITE,
        }
    }
}

impl Material {
    pub fn is_transparent(&self) -> bool {
        self.base_color.a < 1.0
    }
}

/// Indexed triangle list.
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
    pub material: Material,
}

impl MeshData {
    /// Builds a mesh, computing smooth normals when `normals` is empty or does
    /// not match the vertex count.
    pub fn new(positions: Vec<[f32; 3]>, normals: Vec<[f32; 3]>, indices: Vec<u32>) -> Self {
        let mut mesh = Self {
            positions,
            normals,
            indices,
            material: Material::default(),
        };
        if mesh.normals.len() != mesh.positions.len() {
            mesh.normals = mesh.smooth_normals();
        }
        mesh
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.material = material;
        self
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Object-space bounds of the vertex positions.
    pub fn local_bounds(&self) -> Aabb {
        Aabb::from_points(self.positions.iter().copied().map(Vec3::from))
    }

    /// Area-weighted vertex normals from the index list.
    fn smooth_normals(&self) -> Vec<[f32; 3]> {
        let mut acc = vec![Vec3::ZERO; self.positions.len()];
        for tri in self.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            if a >= acc.len() || b >= acc.len() || c >= acc.len() {
                continue;
            }
            let pa = Vec3::from(self.positions[a]);
            let pb = Vec3::from(self.positions[b]);
            let pc = Vec3::from(self.positions[c]);
            let n = (pb - pa).cross(pc - pa);
            acc[a] += n;
            acc[b] += n;
            acc[c] += n;
        }
        acc.into_iter()
            .map(|n| n.try_normalize().unwrap_or(Vec3::Y).to_array())
            .collect()
    }
}
