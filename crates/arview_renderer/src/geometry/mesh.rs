/// GPU copy of an [`arview_core::MeshData`].
///
/// Buffers are `Arc`-wrapped so draw commands can hold them without copying
/// GPU memory; dropping the last handle frees them.
use std::sync::Arc;

use arview_core::MeshData;

use super::Vertex;
use crate::resources::buffer;

#[derive(Clone)]
pub struct GpuMesh {
    pub vertex_buffer: Arc<wgpu::Buffer>,
    pub index_buffer: Arc<wgpu::Buffer>,
    pub index_count: u32,
    pub index_format: wgpu::IndexFormat,
}

impl GpuMesh {
    pub fn upload(device: &wgpu::Device, label: &str, mesh: &MeshData) -> Self {
        let vertices = interleave(mesh);
        Self {
            vertex_buffer: buffer::create_vertex(device, label, &vertices),
            index_buffer: buffer::create_index(device, label, &mesh.indices),
            index_count: mesh.indices.len() as u32,
            index_format: wgpu::IndexFormat::Uint32,
        }
    }

    /// Bytes held on the GPU by this mesh.
    pub fn byte_size(&self) -> u64 {
        self.vertex_buffer.size() + self.index_buffer.size()
    }
}

/// Interleaves positions and normals; missing normals default to +Y.
pub fn interleave(mesh: &MeshData) -> Vec<Vertex> {
    mesh.positions
        .iter()
        .enumerate()
        .map(|(i, &position)| Vertex {
            position,
            normal: mesh.normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interleave_pairs_positions_with_normals() {
        let mesh = MeshData::new(
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            Vec::new(),
            vec![0, 1, 2],
        );
        let v = interleave(&mesh);
        assert_eq!(v.len(), 3);
        assert_eq!(v[1].position, [1.0, 0.0, 0.0]);
        assert_eq!(v[1].normal, mesh.normals[1]);
    }

    #[test]
    fn vertex_is_24_bytes() {
        assert_eq!(std::mem::size_of::<Vertex>(), 24);
    }
}
