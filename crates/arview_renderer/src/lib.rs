//! `arview_renderer`: the 3D layer of the AR viewer.
//!
//! # Module layout
//!
//! | Module          | Responsibility                                          |
//! |-----------------|---------------------------------------------------------|
//! | `surface`       | `RenderContext` (scene + renderer) and the `DrawLoop`   |
//! | `frame`         | `FrameRenderer` trait, the GPU seam                     |
//! | `renderer`      | wgpu `Renderer`: shadow + world passes, presentation    |
//! | `resources`     | Buffer / texture helpers, dynamic `ModelBuffer`         |
//! | `geometry`      | `Vertex`, `GpuMesh` upload                              |
//! | `camera`        | `GpuCamera` uniform                                     |
//! | `lighting`      | Light uniform, shadow map                               |
//! | `pipeline`      | Bind-group layouts, world / shadow / present pipelines  |
//! | `render_target` | Offscreen MSAA color + depth targets                    |
//! | `graph`         | `RenderPass` trait + `FramePacket`                      |
//! | `passes`        | `ShadowPass`, `WorldPass`, `PresentPass`                |
//! | `readback`      | Texture → `RgbaImage` copies                            |
pub mod camera;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod graph;
pub mod lighting;
pub mod passes;
pub mod pipeline;
pub mod readback;
pub mod render_target;
pub mod renderer;
pub mod resources;
pub mod surface;

// ── Public re-exports ─────────────────────────────────────────────────────────

pub use glam;
pub use image::RgbaImage;

pub use camera::GpuCamera;
pub use error::RenderError;
pub use frame::FrameRenderer;
pub use geometry::{GpuMesh, Vertex};
pub use graph::{FramePacket, RenderPass};
pub use render_target::RenderTarget;
pub use renderer::Renderer;
pub use surface::{DrawLoop, LoopHandle, RenderContext};
