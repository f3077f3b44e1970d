//! Scene graph, active-object slot, camera and lights.

pub mod active;
pub mod camera;
pub mod graph;
pub mod light;
pub mod object;

pub use active::ActiveSlot;
pub use camera::Camera;
#[cfg(feature = "gpu")]
pub use camera::CameraUniform;
pub use graph::Scene;
pub use light::{AmbientLight, DirectionalLight};
pub use object::{DrawItem, ObjectId, SceneNode, SceneObject};
