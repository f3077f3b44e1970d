use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::device::{CaptureSession, MediaDevices};
use crate::error::CaptureError;
use crate::profile::CapturePolicy;

/// Opens the camera by walking the capture policy until one profile works.
///
/// Cloning is cheap; clones share the backend and the live-session counter,
/// so a clone can be moved into a spawned future.
pub struct CaptureManager<D> {
    devices: Arc<D>,
    policy: CapturePolicy,
    live_sessions: Arc<AtomicUsize>,
    next_session: Arc<AtomicU64>,
}

impl<D> Clone for CaptureManager<D> {
    fn clone(&self) -> Self {
        Self {
            devices: Arc::clone(&self.devices),
            policy: self.policy.clone(),
            live_sessions: Arc::clone(&self.live_sessions),
            next_session: Arc::clone(&self.next_session),
        }
    }
}

impl<D: MediaDevices> CaptureManager<D> {
    pub fn new(devices: D, policy: CapturePolicy) -> Self {
        Self {
            devices: Arc::new(devices),
            policy,
            live_sessions: Arc::new(AtomicUsize::new(0)),
            next_session: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn devices(&self) -> &D {
        &self.devices
    }

    pub fn policy(&self) -> &CapturePolicy {
        &self.policy
    }

    /// Sessions started by this manager (or its clones) and not yet stopped.
    pub fn live_sessions(&self) -> usize {
        self.live_sessions.load(Ordering::SeqCst)
    }

    pub async fn start(&self) -> Result<CaptureSession, CaptureError> {
        if !self.devices.is_secure_context() {
            return Err(CaptureError::InsecureContext);
        }
        if !self.devices.has_camera_api() {
            return Err(CaptureError::CameraUnavailable);
        }

        let mut best: Option<CaptureError> = None;
        for profile in self.policy.profiles() {
            log::debug!("requesting camera with profile '{}'", profile.name);
            let err = match self.devices.get_user_media(profile).await {
                Ok(tracks) if !tracks.is_empty() => {
                    let id = self.next_session.fetch_add(1, Ordering::Relaxed);
                    let session =
                        CaptureSession::new(id, profile.name.clone(), tracks, Arc::clone(&self.live_sessions));
                    log::info!(
                        "camera started with profile '{}' ({:?})",
                        profile.name,
                        session.settings()
                    );
                    return Ok(session);
                }
                Ok(_) => CaptureError::NoDevice,
                Err(e) => e,
            };
            log::warn!("camera profile '{}' failed: {err}", profile.name);

            if err.ends_fallback() {
                return Err(err);
            }
            if best.as_ref().map_or(true, |b| err.rank() > b.rank()) {
                best = Some(err);
            }
        }

        Err(match best {
            None | Some(CaptureError::Overconstrained(_)) => CaptureError::NoDevice,
            Some(e) => e,
        })
    }

    /// Stops `session` if there is one.  Stopping twice is harmless.
    pub fn stop(&self, session: Option<CaptureSession>) {
        if let Some(mut session) = session {
            session.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{TrackSettings, TrackState, VideoFrame, VideoTrack};
    use crate::profile::{ConstraintProfile, FacingMode};
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    struct FakeTrack {
        live: Rc<Cell<bool>>,
    }

    impl VideoTrack for FakeTrack {
        fn id(&self) -> &str {
            "fake"
        }
        fn state(&self) -> TrackState {
            if self.live.get() {
                TrackState::Live
            } else {
                TrackState::Ended
            }
        }
        fn stop(&self) {
            self.live.set(false);
        }
        fn settings(&self) -> TrackSettings {
            TrackSettings {
                width: 640,
                height: 480,
                facing: FacingMode::Environment,
            }
        }
        fn grab_frame(&self) -> Option<VideoFrame> {
            None
        }
    }

    /// Answers each attempt from a script; records which profiles were tried.
    struct ScriptedDevices {
        secure: bool,
        api: bool,
        script: RefCell<Vec<Result<(), CaptureError>>>,
        tried: RefCell<Vec<String>>,
        tracks: RefCell<Vec<Rc<Cell<bool>>>>,
    }

    impl ScriptedDevices {
        fn new(script: Vec<Result<(), CaptureError>>) -> Self {
            Self {
                secure: true,
                api: true,
                script: RefCell::new(script.into_iter().rev().collect()),
                tried: RefCell::new(Vec::new()),
                tracks: RefCell::new(Vec::new()),
            }
        }
    }

    impl MediaDevices for ScriptedDevices {
        fn is_secure_context(&self) -> bool {
            self.secure
        }
        fn has_camera_api(&self) -> bool {
            self.api
        }
        async fn get_user_media(
            &self,
            profile: &ConstraintProfile,
        ) -> Result<Vec<Box<dyn VideoTrack>>, CaptureError> {
            self.tried.borrow_mut().push(profile.name.clone());
            let step = self.script.borrow_mut().pop().unwrap_or(Err(CaptureError::NoDevice));
            step.map(|()| {
                let live = Rc::new(Cell::new(true));
                self.tracks.borrow_mut().push(live.clone());
                vec![Box::new(FakeTrack { live }) as Box<dyn VideoTrack>]
            })
        }
    }

    fn manager(script: Vec<Result<(), CaptureError>>) -> CaptureManager<ScriptedDevices> {
        CaptureManager::new(ScriptedDevices::new(script), CapturePolicy::default())
    }

    #[test]
    fn falls_back_to_second_profile() {
        let m = manager(vec![Err(CaptureError::Overconstrained("environment-hd".into())), Ok(())]);
        let session = pollster::block_on(m.start()).unwrap();
        assert_eq!(session.profile(), "environment-sd");
        assert_eq!(*m.devices().tried.borrow(), ["environment-hd", "environment-sd"]);
        assert_eq!(m.live_sessions(), 1);
    }

    #[test]
    fn permission_denied_stops_the_loop() {
        let m = manager(vec![Err(CaptureError::PermissionDenied), Ok(())]);
        assert_eq!(pollster::block_on(m.start()).unwrap_err(), CaptureError::PermissionDenied);
        assert_eq!(m.devices().tried.borrow().len(), 1);
    }

    #[test]
    fn exhaustion_reports_most_informative_error() {
        let m = manager(vec![
            Err(CaptureError::Overconstrained("environment-hd".into())),
            Err(CaptureError::DeviceBusy),
            Err(CaptureError::NoDevice),
        ]);
        assert_eq!(pollster::block_on(m.start()).unwrap_err(), CaptureError::DeviceBusy);

        let m = manager(vec![
            Err(CaptureError::Overconstrained("a".into())),
            Err(CaptureError::Overconstrained("b".into())),
            Err(CaptureError::Overconstrained("c".into())),
        ]);
        assert_eq!(pollster::block_on(m.start()).unwrap_err(), CaptureError::NoDevice);
        assert_eq!(m.live_sessions(), 0);
    }

    #[test]
    fn prechecks_fail_fast() {
        let mut devices = ScriptedDevices::new(vec![Ok(())]);
        devices.secure = false;
        let m = CaptureManager::new(devices, CapturePolicy::default());
        assert_eq!(pollster::block_on(m.start()).unwrap_err(), CaptureError::InsecureContext);
        assert!(m.devices().tried.borrow().is_empty());

        let mut devices = ScriptedDevices::new(vec![Ok(())]);
        devices.api = false;
        let m = CaptureManager::new(devices, CapturePolicy::default());
        assert_eq!(pollster::block_on(m.start()).unwrap_err(), CaptureError::CameraUnavailable);
    }

    #[test]
    fn stop_releases_every_track() {
        let m = manager(vec![Ok(())]);
        let session = pollster::block_on(m.start()).unwrap();
        m.stop(Some(session));
        m.stop(None);
        assert_eq!(m.live_sessions(), 0);
        assert!(m.devices().tracks.borrow().iter().all(|t| !t.get()));
    }

    #[test]
    fn clones_share_session_count() {
        let m = manager(vec![Ok(())]);
        let clone = m.clone();
        let _session = pollster::block_on(clone.start()).unwrap();
        assert_eq!(m.live_sessions(), 1);
    }
}
