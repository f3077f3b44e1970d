//! glTF 2.0 decoding into a [`SceneNode`] hierarchy.
//!
//! Both the JSON (`.gltf`) and binary (`.glb`) containers are accepted.
//! Buffers are resolved with `gltf::import_buffers`, so embedded `data:` URIs
//! always work and relative URIs work when a base directory is known.
//! Textures are not decoded; each primitive keeps only its base colour factor.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use arview_core::{Color, Material, MeshData, SceneNode};
use glam::Mat4;
use gltf::mesh::util::ReadIndices;

use crate::error::LoadError;

/// Glb files start with this magic.
const GLB_MAGIC: &[u8; 4] = b"glTF";
const MAX_NODE_DEPTH: usize = 64;

/// Container format recognised from the leading bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GltfContainer {
    Binary,
    Json,
}

/// Identifies a glTF payload by its content rather than its name.
pub fn sniff(bytes: &[u8]) -> Option<GltfContainer> {
    if bytes.starts_with(GLB_MAGIC) {
        return Some(GltfContainer::Binary);
    }
    let text = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);
    let first = text.iter().copied().find(|b| !b.is_ascii_whitespace());
    (first == Some(b'{')).then_some(GltfContainer::Json)
}

/// Decodes a glTF asset held in memory.  `base_dir` resolves relative buffer
/// URIs; without it only embedded buffers can be read.
pub fn decode_slice(bytes: &[u8], base_dir: Option<&Path>) -> Result<SceneNode, LoadError> {
    let gltf::Gltf { document, blob } =
        gltf::Gltf::from_slice(bytes).map_err(|e| LoadError::Decode(e.to_string()))?;
    let buffers = gltf::import_buffers(&document, base_dir, blob)
        .map_err(|e| LoadError::Decode(format!("buffer data: {e}")))?;
    build_hierarchy(&document, &buffers)
}

// ── Hierarchy ──────────────────────────────────────────────────────────────

fn build_hierarchy(document: &gltf::Document, buffers: &[gltf::buffer::Data]) -> Result<SceneNode, LoadError> {
    let mut meshes = MeshCache::default();
    let mut root = SceneNode::new("gltf");

    match document.default_scene().or_else(|| document.scenes().next()) {
        Some(scene) => {
            for node in scene.nodes() {
                root.children.push(build_node(&node, buffers, &mut meshes, 0)?);
            }
        }
        None => {
            // no scenes: show every mesh at the origin
            for mesh in document.meshes() {
                let mut node = SceneNode::new(mesh.name().unwrap_or("mesh"));
                attach_mesh(&mut node, &mesh, buffers, &mut meshes)?;
                root.children.push(node);
            }
        }
    }

    log::debug!(
        "glTF decoded: {} nodes in scene, {} meshes",
        document.nodes().count(),
        root.mesh_count()
    );
    Ok(root)
}

fn build_node(
    node: &gltf::Node,
    buffers: &[gltf::buffer::Data],
    meshes: &mut MeshCache,
    depth: usize,
) -> Result<SceneNode, LoadError> {
    if depth > MAX_NODE_DEPTH {
        return Err(LoadError::Decode("node hierarchy is too deep".into()));
    }
    let name = node
        .name()
        .map(str::to_owned)
        .unwrap_or_else(|| format!("node{}", node.index()));
    let local = Mat4::from_cols_array_2d(&node.transform().matrix());
    let mut out = SceneNode::new(name).with_local(local);

    if let Some(mesh) = node.mesh() {
        attach_mesh(&mut out, &mesh, buffers, meshes)?;
    }
    for child in node.children() {
        out.children.push(build_node(&child, buffers, meshes, depth + 1)?);
    }
    Ok(out)
}

/// A single-primitive mesh goes on the node itself; multi-primitive meshes
/// become one child per primitive.
fn attach_mesh(
    node: &mut SceneNode,
    mesh: &gltf::Mesh,
    buffers: &[gltf::buffer::Data],
    cache: &mut MeshCache,
) -> Result<(), LoadError> {
    let parts = cache.get_or_read(mesh, buffers)?;
    match parts.as_slice() {
        [] => {}
        [only] => node.mesh = Some(Arc::clone(only)),
        many => {
            for (i, part) in many.iter().enumerate() {
                node.children
                    .push(SceneNode::new(format!("{}#{i}", node.name)).with_mesh(Arc::clone(part)));
            }
        }
    }
    Ok(())
}

/// Meshes referenced by several nodes are read once and shared.
#[derive(Default)]
struct MeshCache {
    by_index: HashMap<usize, Vec<Arc<MeshData>>>,
}

impl MeshCache {
    fn get_or_read(
        &mut self,
        mesh: &gltf::Mesh,
        buffers: &[gltf::buffer::Data],
    ) -> Result<Vec<Arc<MeshData>>, LoadError> {
        if let Some(parts) = self.by_index.get(&mesh.index()) {
            return Ok(parts.clone());
        }
        let mut parts = Vec::new();
        for prim in mesh.primitives() {
            if let Some(data) = read_primitive(&prim, buffers)? {
                parts.push(Arc::new(data));
            }
        }
        self.by_index.insert(mesh.index(), parts.clone());
        Ok(parts)
    }
}

// ── Primitives ─────────────────────────────────────────────────────────────

fn read_primitive(prim: &gltf::Primitive, buffers: &[gltf::buffer::Data]) -> Result<Option<MeshData>, LoadError> {
    if prim.mode() != gltf::mesh::Mode::Triangles {
        log::warn!("skipping glTF primitive with mode {:?}", prim.mode());
        return Ok(None);
    }
    let reader = prim.reader(|b| buffers.get(b.index()).map(|d| d.0.as_slice()));

    let positions: Vec<[f32; 3]> = reader
        .read_positions()
        .ok_or_else(|| LoadError::Decode("primitive has no POSITION attribute".into()))?
        .collect();
    let normals: Vec<[f32; 3]> = reader.read_normals().map(|n| n.collect()).unwrap_or_default();
    let indices: Vec<u32> = match reader.read_indices() {
        Some(ReadIndices::U8(it)) => it.map(u32::from).collect(),
        Some(ReadIndices::U16(it)) => it.map(u32::from).collect(),
        Some(ReadIndices::U32(it)) => it.collect(),
        None => (0..positions.len() as u32).collect(),
    };

    if indices.len() % 3 != 0 {
        return Err(LoadError::Decode(format!(
            "triangle list has {} indices",
            indices.len()
        )));
    }
    if let Some(bad) = indices.iter().find(|&&i| i as usize >= positions.len()) {
        return Err(LoadError::Decode(format!(
            "index {bad} out of range for {} vertices",
            positions.len()
        )));
    }

    let material = prim.material();
    let [r, g, b, a] = material.pbr_metallic_roughness().base_color_factor();
    let alpha = match material.alpha_mode() {
        gltf::material::AlphaMode::Blend => a,
        _ => 1.0,
    };
    Ok(Some(MeshData::new(positions, normals, indices).with_material(Material {
        base_color: Color::rgba(r, g, b, alpha),
    })))
}

#[cfg(test)]
pub(crate) mod fixtures {
    use base64::{engine::general_purpose::STANDARD, Engine as _};

    /// A one-triangle glTF with an embedded buffer.  The triangle spans
    /// `(0,0,0)..(size,size,0)` and its node is translated by `offset`.
    pub(crate) fn triangle_gltf(size: f32, offset: [f32; 3]) -> String {
        let mut bin = Vec::new();
        for p in [[0.0f32, 0.0, 0.0], [size, 0.0, 0.0], [0.0, size, 0.0]] {
            for c in p {
                bin.extend_from_slice(&c.to_le_bytes());
            }
        }
        for i in [0u16, 1, 2] {
            bin.extend_from_slice(&i.to_le_bytes());
        }
        bin.extend_from_slice(&[0, 0]);
        let data = STANDARD.encode(&bin);
        format!(
            r#"{{
  "asset": {{ "version": "2.0" }},
  "scene": 0,
  "scenes": [{{ "nodes": [0] }}],
  "nodes": [{{ "name": "Tri", "mesh": 0, "translation": [{ox}, {oy}, {oz}] }}],
  "meshes": [{{ "primitives": [{{ "attributes": {{ "POSITION": 0 }}, "indices": 1 }}] }}],
  "buffers": [{{ "byteLength": {len}, "uri": "data:application/octet-stream;base64,{data}" }}],
  "bufferViews": [
    {{ "buffer": 0, "byteOffset": 0, "byteLength": 36 }},
    {{ "buffer": 0, "byteOffset": 36, "byteLength": 6 }}
  ],
  "accessors": [
    {{ "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
       "min": [0, 0, 0], "max": [{size}, {size}, 0] }},
    {{ "bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR" }}
  ]
}}"#,
            ox = offset[0],
            oy = offset[1],
            oz = offset[2],
            len = bin.len(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn sniffs_containers() {
        assert_eq!(sniff(b"glTF\x02\0\0\0"), Some(GltfContainer::Binary));
        assert_eq!(sniff(b"  \n{\"asset\":{}}"), Some(GltfContainer::Json));
        assert_eq!(sniff(b"\xEF\xBB\xBF{}"), Some(GltfContainer::Json));
        assert_eq!(sniff(b"v 0 0 0\nf 1 2 3"), None);
    }

    #[test]
    fn decodes_embedded_triangle_with_node_transform() {
        let src = fixtures::triangle_gltf(2.0, [1.0, 0.0, 0.0]);
        let root = decode_slice(src.as_bytes(), None).unwrap();
        assert_eq!(root.mesh_count(), 1);

        let tri = &root.children[0];
        assert_eq!(tri.name, "Tri");
        let mesh = tri.mesh.as_ref().unwrap();
        assert_eq!(mesh.indices, vec![0, 1, 2]);
        // normals were generated
        assert_eq!(mesh.normals.len(), 3);

        let bounds = root.bounds(Mat4::IDENTITY);
        assert_relative_eq!(bounds.min.x, 1.0);
        assert_relative_eq!(bounds.max.x, 3.0);
        assert_relative_eq!(bounds.size().y, 2.0);
        assert_eq!(bounds.size().z, 0.0);
    }

    #[test]
    fn garbage_is_a_decode_error() {
        assert!(matches!(
            decode_slice(b"{ not json", None),
            Err(LoadError::Decode(_))
        ));
        assert!(matches!(
            decode_slice(b"glTF\x02\0\0\0\x10\0\0\0", None),
            Err(LoadError::Decode(_))
        ));
    }
}
