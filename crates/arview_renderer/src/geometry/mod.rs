pub mod mesh;
pub mod vertex;

pub use mesh::GpuMesh;
pub use vertex::Vertex;
