//! Backend seams and the owned stream handle.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::error::CaptureError;
use crate::profile::{ConstraintProfile, FacingMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackState {
    Live,
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackSettings {
    pub width: u32,
    pub height: u32,
    pub facing: FacingMode,
}

/// One RGBA8 video frame, rows tightly packed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl VideoFrame {
    pub fn byte_len(width: u32, height: u32) -> usize {
        width as usize * height as usize * 4
    }

    /// Solid-colour frame.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let mut data = Vec::with_capacity(Self::byte_len(width, height));
        for _ in 0..(width as usize * height as usize) {
            data.extend_from_slice(&rgba);
        }
        Self { width, height, data }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        self.data.get(i..i + 4).map(|p| [p[0], p[1], p[2], p[3]])
    }
}

/// A single media track produced by a backend.
pub trait VideoTrack {
    fn id(&self) -> &str;
    fn state(&self) -> TrackState;
    /// Ends the track and releases the hardware.  Idempotent.
    fn stop(&self);
    fn settings(&self) -> TrackSettings;
    /// Latest frame, or `None` when the track is not producing yet (or ended).
    fn grab_frame(&self) -> Option<VideoFrame>;
}

/// Camera access for one platform.
pub trait MediaDevices {
    /// Capture is only allowed from a secure context.
    fn is_secure_context(&self) -> bool;
    fn has_camera_api(&self) -> bool;
    /// One acquisition attempt with `profile`.
    fn get_user_media(
        &self,
        profile: &ConstraintProfile,
    ) -> impl Future<Output = Result<Vec<Box<dyn VideoTrack>>, CaptureError>>;
}

/// A live camera stream.  Stopping (explicitly or by dropping) ends every
/// track exactly once.
pub struct CaptureSession {
    id: u64,
    profile: String,
    tracks: Vec<Box<dyn VideoTrack>>,
    live_sessions: Arc<AtomicUsize>,
    stopped: bool,
}

impl CaptureSession {
    pub(crate) fn new(
        id: u64,
        profile: String,
        tracks: Vec<Box<dyn VideoTrack>>,
        live_sessions: Arc<AtomicUsize>,
    ) -> Self {
        live_sessions.fetch_add(1, Ordering::SeqCst);
        Self {
            id,
            profile,
            tracks,
            live_sessions,
            stopped: false,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Name of the constraint profile that succeeded.
    pub fn profile(&self) -> &str {
        &self.profile
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn live_track_count(&self) -> usize {
        self.tracks
            .iter()
            .filter(|t| t.state() == TrackState::Live)
            .count()
    }

    /// Settings of the primary video track.
    pub fn settings(&self) -> Option<TrackSettings> {
        self.tracks.first().map(|t| t.settings())
    }

    pub fn grab_frame(&self) -> Option<VideoFrame> {
        if self.stopped {
            return None;
        }
        self.tracks.first().and_then(|t| t.grab_frame())
    }

    pub fn stop(&mut self) {
        if self.stopped {
            return;
        }
        for track in &self.tracks {
            track.stop();
        }
        self.stopped = true;
        self.live_sessions.fetch_sub(1, Ordering::SeqCst);
        log::info!("capture session {} stopped", self.id);
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for CaptureSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureSession")
            .field("id", &self.id)
            .field("profile", &self.profile)
            .field("tracks", &self.tracks.len())
            .field("stopped", &self.stopped)
            .finish()
    }
}
