//! A deterministic stand-in camera for desktop builds and tests.
//!
//! Frames are SMPTE-style colour bars with a moving scan band, so motion is
//! visible behind the 3D layer.  Failure switches reproduce the browser's
//! permission and hardware errors.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::device::{MediaDevices, TrackSettings, TrackState, VideoFrame, VideoTrack};
use crate::error::CaptureError;
use crate::profile::{ConstraintProfile, FacingMode, Resolution};

const BARS: [[u8; 3]; 7] = [
    [192, 192, 192],
    [192, 192, 0],
    [0, 192, 192],
    [0, 192, 0],
    [192, 0, 192],
    [192, 0, 0],
    [0, 0, 192],
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticConfig {
    pub facing: FacingMode,
    /// Modes the fake sensor offers.
    pub modes: Vec<Resolution>,
    pub no_device: bool,
    pub deny_permission: bool,
    pub busy: bool,
    pub insecure_context: bool,
    pub no_camera_api: bool,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            facing: FacingMode::Environment,
            modes: vec![
                Resolution::new(1920, 1080),
                Resolution::new(1280, 720),
                Resolution::new(640, 480),
            ],
            no_device: false,
            deny_permission: false,
            busy: false,
            insecure_context: false,
            no_camera_api: false,
        }
    }
}

/// The only camera on the synthetic platform.  One session may hold it at a
/// time; a second open reports [`CaptureError::DeviceBusy`].
#[derive(Debug, Default)]
pub struct SyntheticDevices {
    config: SyntheticConfig,
    in_use: Arc<AtomicUsize>,
    next_track: AtomicU64,
}

impl SyntheticDevices {
    pub fn new(config: SyntheticConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Open tracks currently holding the sensor.
    pub fn open_tracks(&self) -> usize {
        self.in_use.load(Ordering::SeqCst)
    }

    fn open(&self, profile: &ConstraintProfile) -> Result<SyntheticTrack, CaptureError> {
        let c = &self.config;
        if c.deny_permission {
            return Err(CaptureError::PermissionDenied);
        }
        if c.no_device || c.modes.is_empty() {
            return Err(CaptureError::NoDevice);
        }
        if c.busy || self.open_tracks() > 0 {
            return Err(CaptureError::DeviceBusy);
        }
        if !profile.facing.accepts(c.facing) {
            return Err(CaptureError::Overconstrained(profile.name.clone()));
        }
        let mode = profile
            .select_mode(&c.modes)
            .ok_or_else(|| CaptureError::Overconstrained(profile.name.clone()))?;

        self.in_use.fetch_add(1, Ordering::SeqCst);
        let n = self.next_track.fetch_add(1, Ordering::Relaxed);
        Ok(SyntheticTrack {
            id: format!("synthetic-{n}"),
            settings: TrackSettings {
                width: mode.width,
                height: mode.height,
                facing: c.facing,
            },
            live: AtomicBool::new(true),
            frame: AtomicU64::new(0),
            in_use: Arc::clone(&self.in_use),
        })
    }
}

impl MediaDevices for SyntheticDevices {
    fn is_secure_context(&self) -> bool {
        !self.config.insecure_context
    }

    fn has_camera_api(&self) -> bool {
        !self.config.no_camera_api
    }

    async fn get_user_media(
        &self,
        profile: &ConstraintProfile,
    ) -> Result<Vec<Box<dyn VideoTrack>>, CaptureError> {
        let track = self.open(profile)?;
        Ok(vec![Box::new(track) as Box<dyn VideoTrack>])
    }
}

pub struct SyntheticTrack {
    id: String,
    settings: TrackSettings,
    live: AtomicBool,
    frame: AtomicU64,
    in_use: Arc<AtomicUsize>,
}

impl SyntheticTrack {
    fn render(&self, n: u64) -> VideoFrame {
        let (w, h) = (self.settings.width, self.settings.height);
        let mut row = Vec::with_capacity(w as usize * 4);
        for x in 0..w {
            let bar = BARS[(x as usize * BARS.len()) / w.max(1) as usize];
            row.extend_from_slice(&[bar[0], bar[1], bar[2], 255]);
        }

        let band_h = (h / 12).max(1);
        let band_y = (n * 4 % u64::from(h.max(1))) as u32;
        let mut data = Vec::with_capacity(VideoFrame::byte_len(w, h));
        for y in 0..h {
            if y.wrapping_sub(band_y) < band_h {
                data.extend(row.chunks_exact(4).flat_map(|p| [p[0] / 2, p[1] / 2, p[2] / 2, 255]));
            } else {
                data.extend_from_slice(&row);
            }
        }
        VideoFrame { width: w, height: h, data }
    }
}

impl VideoTrack for SyntheticTrack {
    fn id(&self) -> &str {
        &self.id
    }

    fn state(&self) -> TrackState {
        if self.live.load(Ordering::SeqCst) {
            TrackState::Live
        } else {
            TrackState::Ended
        }
    }

    fn stop(&self) {
        if self.live.swap(false, Ordering::SeqCst) {
            self.in_use.fetch_sub(1, Ordering::SeqCst);
            log::debug!("synthetic track {} ended", self.id);
        }
    }

    fn settings(&self) -> TrackSettings {
        self.settings
    }

    fn grab_frame(&self) -> Option<VideoFrame> {
        if !self.live.load(Ordering::SeqCst) {
            return None;
        }
        let n = self.frame.fetch_add(1, Ordering::Relaxed);
        Some(self.render(n))
    }
}

impl Drop for SyntheticTrack {
    fn drop(&mut self) {
        self.stop();
    }
}
