//! Camera acquisition for the AR viewport.
//!
//! | Module      | Contents |
//! |-------------|----------|
//! | `profile`   | [`ConstraintProfile`] and the ordered [`CapturePolicy`] |
//! | `error`     | [`CaptureError`] taxonomy and its ranking |
//! | `device`    | [`MediaDevices`] / [`VideoTrack`] seams, [`CaptureSession`] |
//! | `manager`   | [`CaptureManager`]: prechecks + fallback loop |
//! | `synthetic` | deterministic test-pattern camera (native default) |
//! | `web`       | `getUserMedia` backend (wasm32 only) |
//!
//! ```rust,ignore
//! let manager = CaptureManager::new(SyntheticDevices::default(), CapturePolicy::default());
//! let session = pollster::block_on(manager.start())?;
//! let frame = session.grab_frame();
//! drop(session); // tracks stop here
//! ```

pub mod device;
pub mod error;
pub mod manager;
pub mod profile;
pub mod synthetic;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use device::{CaptureSession, MediaDevices, TrackSettings, TrackState, VideoFrame, VideoTrack};
pub use error::CaptureError;
pub use manager::CaptureManager;
pub use profile::{CapturePolicy, ConstraintProfile, FacingMode, Resolution};
pub use synthetic::{SyntheticConfig, SyntheticDevices};
#[cfg(target_arch = "wasm32")]
pub use web::WebMediaDevices;
