//! Scene objects: a root transform over a hierarchy of mesh-carrying nodes.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use glam::{Mat4, Vec3};

use crate::bounds::Aabb;
use crate::mesh::MeshData;
use crate::transform::Transform;

// ─── ID generation ─────────────────────────────────────────────────────────

static ID_COUNTER: AtomicU64 = AtomicU64::new(1);

fn next_id() -> u64 {
    ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// Stable identifier of a [`SceneObject`].  Never reused within a process, so
/// the renderer can key GPU resources on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u64);

// ─── Nodes ─────────────────────────────────────────────────────────────────

/// One node of a loaded hierarchy.
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub name: String,
    /// Transform relative to the parent node.
    pub local: Mat4,
    pub mesh: Option<Arc<MeshData>>,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            local: Mat4::IDENTITY,
            mesh: None,
            cast_shadow: false,
            receive_shadow: false,
            children: Vec::new(),
        }
    }

    pub fn with_mesh(mut self, mesh: Arc<MeshData>) -> Self {
        self.mesh = Some(mesh);
        self
    }

    pub fn with_local(mut self, local: Mat4) -> Self {
        self.local = local;
        self
    }

    pub fn with_child(mut self, child: SceneNode) -> Self {
        self.children.push(child);
        self
    }

    /// Depth-first walk calling `f(node, world_matrix)` for every node.
    pub fn visit(&self, parent: Mat4, f: &mut impl FnMut(&SceneNode, Mat4)) {
        let world = parent * self.local;
        f(self, world);
        for child in &self.children {
            child.visit(world, f);
        }
    }

    /// Flag every mesh in this subtree.
    pub fn set_shadows(&mut self, cast: bool, receive: bool) {
        if self.mesh.is_some() {
            self.cast_shadow = cast;
            self.receive_shadow = receive;
        }
        for child in &mut self.children {
            child.set_shadows(cast, receive);
        }
    }

    /// Bounds of every mesh in this subtree, transformed by `parent`.
    pub fn bounds(&self, parent: Mat4) -> Aabb {
        let mut aabb = Aabb::EMPTY;
        self.visit(parent, &mut |node, world| {
            if let Some(mesh) = &node.mesh {
                aabb = aabb.union(&mesh.local_bounds().transform(&world));
            }
        });
        aabb
    }

    pub fn mesh_count(&self) -> usize {
        let mut n = 0;
        self.visit(Mat4::IDENTITY, &mut |node, _| {
            if node.mesh.is_some() {
                n += 1;
            }
        });
        n
    }
}

// ─── Object ────────────────────────────────────────────────────────────────

/// A mesh instance with its resolved world matrix, ready for drawing.
#[derive(Debug, Clone)]
pub struct DrawItem {
    pub mesh: Arc<MeshData>,
    pub world: Mat4,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
}

/// The displayable model: root transform + pivot + node hierarchy.
///
/// The model matrix is `transform.matrix() * translate(pivot)`, so a pivot of
/// `-center` makes rotation and scale act about the bounds centre.
#[derive(Debug, Clone)]
pub struct SceneObject {
    id: ObjectId,
    pub name: String,
    /// Reference the object was loaded from (`builtin:cube`, a URL, ...).
    pub origin: String,
    pub transform: Transform,
    pub pivot: Vec3,
    pub root: SceneNode,
}

impl SceneObject {
    pub fn new(name: impl Into<String>, origin: impl Into<String>, root: SceneNode) -> Self {
        Self {
            id: ObjectId(next_id()),
            name: name.into(),
            origin: origin.into(),
            transform: Transform::IDENTITY,
            pivot: Vec3::ZERO,
            root,
        }
    }

    #[inline]
    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn model_matrix(&self) -> Mat4 {
        self.transform.matrix() * Mat4::from_translation(self.pivot)
    }

    /// Bounds of the hierarchy in root space, before pivot and transform.
    pub fn local_bounds(&self) -> Aabb {
        self.root.bounds(Mat4::IDENTITY)
    }

    /// Bounds in world space.
    pub fn world_bounds(&self) -> Aabb {
        self.root.bounds(self.model_matrix())
    }

    pub fn mesh_count(&self) -> usize {
        self.root.mesh_count()
    }

    /// Flattens the hierarchy into draw items with world matrices.
    pub fn draw_items(&self) -> Vec<DrawItem> {
        let mut items = Vec::new();
        self.root.visit(self.model_matrix(), &mut |node, world| {
            if let Some(mesh) = &node.mesh {
                items.push(DrawItem {
                    mesh: mesh.clone(),
                    world,
                    cast_shadow: node.cast_shadow,
                    receive_shadow: node.receive_shadow,
                });
            }
        });
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_quad() -> Arc<MeshData> {
        Arc::new(MeshData::new(
            vec![[-0.5, -0.5, 0.0], [0.5, -0.5, 0.0], [0.5, 0.5, 0.0], [-0.5, 0.5, 0.0]],
            Vec::new(),
            vec![0, 1, 2, 0, 2, 3],
        ))
    }

    #[test]
    fn ids_are_unique() {
        let a = SceneObject::new("a", "test", SceneNode::new("root"));
        let b = SceneObject::new("b", "test", SceneNode::new("root"));
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn child_transforms_compose_into_bounds() {
        let root = SceneNode::new("root").with_child(
            SceneNode::new("child")
                .with_local(Mat4::from_translation(Vec3::new(10.0, 0.0, 0.0)))
                .with_mesh(unit_quad()),
        );
        let obj = SceneObject::new("m", "test", root);
        let b = obj.local_bounds();
        assert!(b.center().abs_diff_eq(Vec3::new(10.0, 0.0, 0.0), 1e-6));
        assert_eq!(obj.mesh_count(), 1);
    }

    #[test]
    fn pivot_recentres_world_bounds() {
        let root = SceneNode::new("root").with_mesh(unit_quad());
        let mut obj = SceneObject::new("m", "test", root);
        obj.pivot = Vec3::new(-1.0, 0.0, 0.0);
        obj.transform.position = Vec3::new(0.0, 0.0, -2.0);
        let c = obj.world_bounds().center();
        assert!(c.abs_diff_eq(Vec3::new(-1.0, 0.0, -2.0), 1e-6));
    }

    #[test]
    fn shadow_flags_reach_every_mesh() {
        let mut root = SceneNode::new("root")
            .with_mesh(unit_quad())
            .with_child(SceneNode::new("c").with_mesh(unit_quad()))
            .with_child(SceneNode::new("empty"));
        root.set_shadows(true, true);
        let obj = SceneObject::new("m", "test", root);
        let items = obj.draw_items();
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|i| i.cast_shadow && i.receive_shadow));
    }
}
