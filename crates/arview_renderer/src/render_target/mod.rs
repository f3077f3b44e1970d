pub mod color;
pub mod depth;
pub mod target;

pub use color::ColorTarget;
pub use depth::DepthTarget;
pub use target::RenderTarget;
