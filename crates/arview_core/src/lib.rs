//! `arview_core`: math, scene and timing types shared by the ARView crates.
//!
//! # Module layout
//!
//! | Module      | Responsibility                                          |
//! |-------------|---------------------------------------------------------|
//! | `color`     | Linear RGBA colour + sRGB hex helpers                   |
//! | `transform` | Position / Euler rotation / uniform scale               |
//! | `bounds`    | Axis-aligned bounding boxes                             |
//! | `mesh`      | CPU-side triangle meshes and flat materials             |
//! | `scene`     | Scene graph, active-object slot, camera, lights         |
//! | `input`     | Pointer / touch event normalisation                     |
//! | `time`      | Frame clock                                             |
//! | `context`   | wgpu device/queue bundle (feature `gpu`)                |

pub mod bounds;
pub mod color;
pub mod input;
pub mod mesh;
pub mod scene;
pub mod time;
pub mod transform;

#[cfg(feature = "gpu")]
pub mod context;

pub use bounds::Aabb;
pub use color::Color;
pub use input::{InputState, PointerEvent};
pub use mesh::{Material, MeshData};
pub use scene::{
    ActiveSlot, AmbientLight, Camera, DirectionalLight, ObjectId, Scene, SceneNode, SceneObject,
};
pub use time::{Time, TimeClock};
pub use transform::Transform;

pub use glam;
