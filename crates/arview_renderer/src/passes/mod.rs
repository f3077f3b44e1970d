pub mod present_pass;
pub mod shadow_pass;
pub mod world_pass;

pub use present_pass::PresentPass;
pub use shadow_pass::ShadowPass;
pub use world_pass::WorldPass;
