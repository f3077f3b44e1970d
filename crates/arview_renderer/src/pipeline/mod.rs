pub mod layout;
pub mod present;
pub mod shadow;
pub mod world;

pub use layout::PipelineLayouts;
pub use present::PresentPipeline;
pub use shadow::ShadowPipeline;
pub use world::WorldPipeline;
