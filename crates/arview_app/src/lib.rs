//! The ARView application: window, camera, 3D layer and model selection
//! glued together.
//!
//! | Module        | Contents |
//! |---------------|----------|
//! | `builder`     | [`App`] builder and window settings ([`AppConfig`]) |
//! | `config`      | [`ViewerConfig`] loaded from `arview.toml` |
//! | `logging`     | `fern` logger setup |
//! | `viewport`    | [`Viewport`] lifecycle: camera, draw loop, active model |
//! | `interaction` | drag rotation and step zoom |
//! | `compositor`  | video + 3D layer still capture |
//! | `graphics`    | swap-chain setup (private) |
//! | `runner`      | winit event loop (private) |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use arview_app::{logging, App, ViewerConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = ViewerConfig::load(None)?;
//!     logging::init(&config.log_level, config.log_file.as_deref())?;
//!     App::new(config).with_initial_model("builtin:sphere").run()
//! }
//! ```
//!
//! Keys: `Space` start/stop the camera, `+`/`-` zoom, `R` reset rotation,
//! `S` screenshot, `1`/`2`/`3` cube/sphere/cone, `N` next stored model,
//! `Esc` quit.

pub mod builder;
pub mod compositor;
pub mod config;
mod graphics;
pub mod interaction;
pub mod logging;
mod runner;
pub mod viewport;

pub use builder::{App, AppConfig};
pub use compositor::{compose, ComposeError, Screenshot};
pub use config::{CaptureConfig, ViewerConfig};
pub use interaction::{InteractionController, InteractionSettings};
pub use viewport::{
    Notice, NoticeLevel, PollReport, Selection, StartTicket, Viewport, ViewportError, ViewportOptions,
    ViewportState,
};

/// Browser entry point: draws into `<canvas id="arview">` with the default
/// configuration.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen::prelude::wasm_bindgen]
pub fn run_web() -> Result<(), wasm_bindgen::JsValue> {
    console_error_panic_hook::set_once();
    let config = ViewerConfig::default();
    if let Err(e) = logging::init(&config.log_level, None) {
        web_sys::console::warn_1(&format!("logger unavailable: {e}").into());
    }
    App::new(config)
        .run()
        .map_err(|e| wasm_bindgen::JsValue::from_str(&format!("{e:#}")))
}
