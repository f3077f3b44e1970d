//! The AR viewport: camera session, render surface and active model, wired
//! through the `Idle → Starting → Active → Stopped` lifecycle.
//!
//! Everything here runs on the event-loop thread.  The two slow operations
//! are split so the loop never blocks on them:
//!
//! * camera acquisition: [`Viewport::begin_start`] hands out a
//!   [`StartTicket`], the caller drives [`CaptureManager::start`] however the
//!   platform allows, then returns the outcome through
//!   [`Viewport::finish_start`];
//! * model loading: [`Viewport::select`] spawns a worker and
//!   [`Viewport::poll`] applies its result on a later frame.

use std::path::{Path, PathBuf};

use arview_assets::{LoadError, LoadProgress, ModelLoader, ModelReference, PendingLoad, PrimitiveKind};
use arview_capture::{CaptureError, CaptureManager, CaptureSession, MediaDevices, VideoFrame};
use arview_core::time::unix_millis;
use arview_core::PointerEvent;
use arview_renderer::{FrameRenderer, LoopHandle, RenderContext, RenderError};
use thiserror::Error;

use crate::compositor::{compose, ComposeError, Screenshot};
use crate::config::ViewerConfig;
use crate::interaction::{InteractionController, InteractionSettings};

#[derive(Debug, Error)]
pub enum ViewportError {
    #[error("the camera is already starting")]
    StartInProgress,
    #[error("the viewport is not active")]
    NotActive,
    /// The viewport was torn down while the camera was being acquired.
    #[error("camera start was cancelled")]
    Cancelled,
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Compose(#[from] ComposeError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewportState {
    Idle,
    Starting,
    Active,
    /// `error` holds a user-facing reason when starting failed.
    Stopped { error: Option<String> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// The latest message worth showing the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    fn new(level: NoticeLevel, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
        }
    }
}

/// Proof that a start was begun.  Goes stale when the viewport is torn down
/// before [`Viewport::finish_start`].
#[derive(Debug)]
#[must_use]
pub struct StartTicket {
    generation: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub name: String,
    pub reference: String,
}

struct InFlight {
    generation: u64,
    selection: Selection,
    load: PendingLoad,
}

/// What one [`Viewport::poll`] did.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PollReport {
    /// Name of a model installed this poll.
    pub installed: Option<String>,
    /// A load failed and the fallback primitive took its place.
    pub fell_back: bool,
    /// [`Viewport::latest_frame`] changed.
    pub new_frame: bool,
    /// Progress of a load still running.
    pub loading: Option<LoadProgress>,
}

#[derive(Debug, Clone)]
pub struct ViewportOptions {
    pub fallback: PrimitiveKind,
    pub initial_model: Option<String>,
    pub interaction: InteractionSettings,
}

impl Default for ViewportOptions {
    fn default() -> Self {
        Self {
            fallback: PrimitiveKind::Cube,
            initial_model: None,
            interaction: InteractionSettings::default(),
        }
    }
}

impl From<&ViewerConfig> for ViewportOptions {
    fn from(config: &ViewerConfig) -> Self {
        Self {
            fallback: config.fallback_primitive(),
            initial_model: config.initial_model.clone(),
            interaction: config.interaction,
        }
    }
}

pub struct Viewport<D, R> {
    state: ViewportState,
    capture: CaptureManager<D>,
    session: Option<CaptureSession>,
    latest_frame: Option<VideoFrame>,
    surface: RenderContext<R>,
    loop_handle: Option<LoopHandle>,
    loader: ModelLoader,
    pending: Option<InFlight>,
    load_generation: u64,
    start_generation: u64,
    interaction: InteractionController,
    notice: Option<Notice>,
    fallback: PrimitiveKind,
    initial_model: Option<String>,
    selected: Option<Selection>,
}

impl<D: MediaDevices, R: FrameRenderer> Viewport<D, R> {
    pub fn new(
        capture: CaptureManager<D>,
        surface: RenderContext<R>,
        loader: ModelLoader,
        options: ViewportOptions,
    ) -> Self {
        Self {
            state: ViewportState::Idle,
            capture,
            session: None,
            latest_frame: None,
            surface,
            loop_handle: None,
            loader,
            pending: None,
            load_generation: 0,
            start_generation: 0,
            interaction: InteractionController::new(options.interaction),
            notice: None,
            fallback: options.fallback,
            initial_model: options.initial_model,
            selected: None,
        }
    }

    // ── Accessors ────────────────────────────────────────────────────────────

    pub fn state(&self) -> &ViewportState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == ViewportState::Active
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn capture(&self) -> &CaptureManager<D> {
        &self.capture
    }

    pub fn session(&self) -> Option<&CaptureSession> {
        self.session.as_ref()
    }

    /// Most recent camera frame; `None` while stopped.
    pub fn latest_frame(&self) -> Option<&VideoFrame> {
        self.latest_frame.as_ref()
    }

    pub fn surface(&self) -> &RenderContext<R> {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut RenderContext<R> {
        &mut self.surface
    }

    /// Split borrow for uploading the current frame to the renderer.
    pub fn frame_and_renderer_mut(&mut self) -> (Option<&VideoFrame>, &mut R) {
        (self.latest_frame.as_ref(), self.surface.renderer_mut())
    }

    pub fn selected(&self) -> Option<&Selection> {
        self.selected.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    // ── Lifecycle ────────────────────────────────────────────────────────────

    /// `Ok(None)` when already active: the running session is reused.
    pub fn begin_start(&mut self) -> Result<Option<StartTicket>, ViewportError> {
        match self.state {
            ViewportState::Active => Ok(None),
            ViewportState::Starting => Err(ViewportError::StartInProgress),
            ViewportState::Idle | ViewportState::Stopped { .. } => {
                self.start_generation += 1;
                self.state = ViewportState::Starting;
                log::info!("starting camera (attempt {})", self.start_generation);
                Ok(Some(StartTicket {
                    generation: self.start_generation,
                }))
            }
        }
    }

    pub fn finish_start(
        &mut self,
        ticket: StartTicket,
        acquisition: Result<CaptureSession, CaptureError>,
    ) -> Result<(), ViewportError> {
        if self.state != ViewportState::Starting || ticket.generation != self.start_generation {
            if let Ok(session) = acquisition {
                log::info!("discarding camera session {} acquired after teardown", session.id());
                self.capture.stop(Some(session));
            }
            return Err(ViewportError::Cancelled);
        }

        let session = match acquisition {
            Ok(session) => session,
            Err(e) => {
                self.fail_start(e.user_message());
                return Err(e.into());
            }
        };

        let handle = match self.surface.run_loop() {
            Ok(handle) => handle,
            Err(e) => {
                self.capture.stop(Some(session));
                self.fail_start("The viewer could not start drawing.");
                return Err(e.into());
            }
        };
        self.session = Some(session);
        self.loop_handle = Some(handle);
        self.state = ViewportState::Active;

        if self.surface.scene().active().is_none() {
            self.install_fallback();
        }
        let auto = self.selected.clone().or_else(|| {
            self.initial_model.clone().map(|reference| Selection {
                name: reference.clone(),
                reference,
            })
        });
        if let Some(selection) = auto {
            self.select(selection.name, selection.reference);
        }
        Ok(())
    }

    /// Acquires the camera on the calling thread.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn start(&mut self) -> Result<(), ViewportError> {
        let Some(ticket) = self.begin_start()? else {
            return Ok(());
        };
        let capture = self.capture.clone();
        let acquisition = pollster::block_on(capture.start());
        self.finish_start(ticket, acquisition)
    }

    /// Releases the camera, stops drawing and forgets in-flight work.  Safe
    /// from any state and safe to repeat.
    pub fn stop(&mut self) {
        self.start_generation += 1;
        self.load_generation += 1;
        self.pending = None;
        if let Some(handle) = self.loop_handle.take() {
            handle.cancel();
        }
        self.capture.stop(self.session.take());
        self.latest_frame = None;

        match self.state {
            ViewportState::Idle | ViewportState::Stopped { .. } => {}
            ViewportState::Starting | ViewportState::Active => {
                log::info!("viewport stopped");
                self.state = ViewportState::Stopped { error: None };
            }
        }
    }

    fn fail_start(&mut self, reason: &str) {
        log::warn!("camera start failed: {reason}");
        self.state = ViewportState::Stopped {
            error: Some(reason.to_string()),
        };
        self.notice = Some(Notice::new(NoticeLevel::Error, reason));
    }

    // ── Models ───────────────────────────────────────────────────────────────

    /// Chooses the model to show.  While active the swap happens right away
    /// for built-ins and on a later [`poll`](Self::poll) for everything else;
    /// otherwise the choice is kept for the next start.
    pub fn select(&mut self, name: impl Into<String>, reference: impl Into<String>) {
        let selection = Selection {
            name: name.into(),
            reference: reference.into(),
        };
        self.selected = Some(selection.clone());
        if !self.is_active() {
            return;
        }

        self.load_generation += 1;
        self.pending = None;
        match ModelReference::parse(&selection.reference) {
            Ok(ModelReference::BuiltIn(kind)) => {
                let mut object = self.loader.load_builtin(kind);
                object.name = selection.name.clone();
                self.surface.replace_active(object);
                self.notice = Some(Notice::new(NoticeLevel::Info, format!("Showing {}", selection.name)));
            }
            Ok(_) => {
                log::debug!("loading '{}' (generation {})", selection.name, self.load_generation);
                let load = self.loader.spawn(selection.name.clone(), selection.reference.clone());
                self.pending = Some(InFlight {
                    generation: self.load_generation,
                    selection,
                    load,
                });
            }
            Err(e) => self.fall_back(&selection, &e),
        }
    }

    fn install_fallback(&mut self) {
        let object = self.loader.load_builtin(self.fallback);
        log::debug!("installing fallback {}", self.fallback);
        self.surface.replace_active(object);
    }

    fn fall_back(&mut self, selection: &Selection, error: &LoadError) {
        log::warn!("could not load '{}': {error}", selection.name);
        self.install_fallback();
        self.notice = Some(Notice::new(
            NoticeLevel::Warning,
            format!("{} Showing a {} instead.", error.user_message(), self.fallback),
        ));
    }

    // ── Per-frame ────────────────────────────────────────────────────────────

    /// Applies finished loads and pulls the next camera frame.  Call once per
    /// event-loop iteration.
    pub fn poll(&mut self) -> PollReport {
        let mut report = PollReport::default();

        if let Some(inflight) = self.pending.as_mut() {
            match inflight.load.try_result() {
                None => report.loading = inflight.load.last_progress().cloned(),
                Some(result) => {
                    if let Some(done) = self.pending.take() {
                        self.apply_load(done, result, &mut report);
                    }
                }
            }
        }

        if !self.is_active() {
            return report;
        }
        let ended = self.session.as_ref().is_some_and(|s| s.live_track_count() == 0);
        if ended {
            log::warn!("camera stream ended");
            self.stop();
            self.notice = Some(Notice::new(NoticeLevel::Error, "The camera stopped."));
        } else if let Some(frame) = self.session.as_ref().and_then(|s| s.grab_frame()) {
            self.latest_frame = Some(frame);
            report.new_frame = true;
        }
        report
    }

    fn apply_load(
        &mut self,
        done: InFlight,
        result: Result<arview_core::SceneObject, LoadError>,
        report: &mut PollReport,
    ) {
        if done.generation != self.load_generation || !self.is_active() {
            log::debug!("dropping stale load of '{}'", done.selection.name);
            return;
        }
        match result {
            Ok(object) => {
                self.surface.replace_active(object);
                self.notice = Some(Notice::new(
                    NoticeLevel::Info,
                    format!("Showing {}", done.selection.name),
                ));
                report.installed = Some(done.selection.name);
            }
            Err(e) => {
                self.fall_back(&done.selection, &e);
                report.fell_back = true;
            }
        }
    }

    /// One display refresh of the 3D layer.
    pub fn redraw(&mut self) -> bool {
        self.surface.on_redraw()
    }

    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        self.surface.resize(width, height)
    }

    // ── Interaction ──────────────────────────────────────────────────────────

    pub fn pointer(&mut self, event: PointerEvent) -> bool {
        let target = self.surface.scene_mut().active_transform_mut();
        self.interaction.pointer(event, target)
    }

    pub fn zoom_in(&mut self) {
        self.interaction.zoom_in(self.surface.scene_mut().active_transform_mut());
    }

    pub fn zoom_out(&mut self) {
        self.interaction.zoom_out(self.surface.scene_mut().active_transform_mut());
    }

    pub fn reset_rotation(&mut self) {
        self.interaction
            .reset_rotation(self.surface.scene_mut().active_transform_mut());
    }

    // ── Stills ───────────────────────────────────────────────────────────────

    /// Freezes the current camera frame and 3D layer into one image.  Does not
    /// pause anything.
    pub fn capture_still(&mut self) -> Result<Screenshot, ViewportError> {
        if !self.is_active() {
            return Err(ViewportError::NotActive);
        }
        let layer = self.surface.read_layer()?;
        let image = compose(self.latest_frame.as_ref(), &layer);
        Ok(Screenshot::new(image, unix_millis()))
    }

    /// [`capture_still`](Self::capture_still) and write it into `dir`.
    pub fn save_still(&mut self, dir: &Path) -> Result<PathBuf, ViewportError> {
        let path = self.capture_still()?.save(dir)?;
        self.notice = Some(Notice::new(
            NoticeLevel::Info,
            format!("Screenshot saved to {}", path.display()),
        ));
        Ok(path)
    }
}

impl<D, R> Drop for Viewport<D, R> {
    fn drop(&mut self) {
        if let Some(handle) = self.loop_handle.take() {
            handle.cancel();
        }
        if let Some(mut session) = self.session.take() {
            session.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arview_assets::store::upload::{upload, UploadRequest};
    use arview_assets::{AssetStore, FsAssetStore, LoaderSettings};
    use arview_capture::{CapturePolicy, SyntheticConfig, SyntheticDevices, Resolution};
    use arview_core::glam::Vec3;
    use arview_core::{ObjectId, Scene};
    use approx::assert_relative_eq;
    use image::RgbaImage;
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    #[derive(Default)]
    struct FakeRenderer {
        size: (u32, u32),
        renders: usize,
        retired: Vec<ObjectId>,
    }

    impl FrameRenderer for FakeRenderer {
        fn resize(&mut self, width: u32, height: u32) {
            self.size = (width, height);
        }
        fn render(&mut self, _scene: &Scene) -> Result<(), RenderError> {
            self.renders += 1;
            Ok(())
        }
        fn read_layer(&mut self) -> Result<RgbaImage, RenderError> {
            Ok(RgbaImage::new(self.size.0, self.size.1))
        }
        fn retire(&mut self, object: ObjectId) {
            self.retired.push(object);
        }
    }

    type TestViewport = Viewport<SyntheticDevices, FakeRenderer>;

    fn small_camera() -> SyntheticConfig {
        SyntheticConfig {
            modes: vec![Resolution::new(64, 48)],
            ..Default::default()
        }
    }

    fn viewport_with(camera: SyntheticConfig, loader: ModelLoader, options: ViewportOptions) -> TestViewport {
        let capture = CaptureManager::new(SyntheticDevices::new(camera), CapturePolicy::default());
        let surface = RenderContext::initialize(FakeRenderer::default(), 64, 48);
        Viewport::new(capture, surface, loader, options)
    }

    fn viewport() -> TestViewport {
        viewport_with(
            small_camera(),
            ModelLoader::new(LoaderSettings::default()),
            ViewportOptions::default(),
        )
    }

    fn poll_until_loaded(v: &mut TestViewport) -> PollReport {
        let deadline = Instant::now() + Duration::from_secs(10);
        loop {
            let report = v.poll();
            if !v.is_loading() || Instant::now() > deadline {
                return report;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    fn triangle_gltf() -> String {
        use base64::{engine::general_purpose::STANDARD, Engine as _};
        let mut bin = Vec::new();
        for c in [0.0f32, 0.0, 0.0, 4.0, 0.0, 0.0, 0.0, 1.0, 0.0] {
            bin.extend_from_slice(&c.to_le_bytes());
        }
        format!(
            r#"{{"asset":{{"version":"2.0"}},"scene":0,"scenes":[{{"nodes":[0]}}],
"nodes":[{{"mesh":0,"translation":[10,0,0]}}],
"meshes":[{{"primitives":[{{"attributes":{{"POSITION":0}}}}]}}],
"buffers":[{{"byteLength":36,"uri":"data:application/octet-stream;base64,{}"}}],
"bufferViews":[{{"buffer":0,"byteLength":36}}],
"accessors":[{{"bufferView":0,"componentType":5126,"count":3,"type":"VEC3","min":[0,0,0],"max":[4,1,0]}}]}}"#,
            STANDARD.encode(&bin)
        )
    }

    #[test]
    fn start_installs_fallback_and_streams_video() {
        let mut v = viewport();
        assert_eq!(v.state(), &ViewportState::Idle);
        v.start().unwrap();
        assert!(v.is_active());
        assert_eq!(v.surface().scene().object_count(), 1);
        assert_eq!(v.surface().scene().active().map(|o| o.origin.as_str()), Some("builtin:cube"));

        assert!(v.poll().new_frame);
        assert_eq!(v.latest_frame().map(|f| (f.width, f.height)), Some((64, 48)));
        assert!(v.redraw());
        assert_eq!(v.surface().renderer().renders, 1);
    }

    #[test]
    fn starting_twice_keeps_one_loop() {
        let mut v = viewport();
        v.start().unwrap();
        v.start().unwrap();
        assert_eq!(v.surface().draw_loop().running_count(), 1);
        assert_eq!(v.surface().draw_loop().started_count(), 1);
        assert_eq!(v.capture().live_sessions(), 1);
    }

    #[test]
    fn second_begin_while_starting_is_rejected() {
        let mut v = viewport();
        let _ticket = v.begin_start().unwrap().unwrap();
        assert!(matches!(v.begin_start(), Err(ViewportError::StartInProgress)));
    }

    #[test]
    fn stop_releases_every_track() {
        let mut v = viewport();
        v.start().unwrap();
        v.stop();
        assert_eq!(v.capture().devices().open_tracks(), 0);
        assert_eq!(v.capture().live_sessions(), 0);
        assert!(!v.surface().is_looping());
        assert!(!v.redraw());
        assert!(v.latest_frame().is_none());
        assert_eq!(v.state(), &ViewportState::Stopped { error: None });

        v.stop();
        assert_eq!(v.state(), &ViewportState::Stopped { error: None });

        v.start().unwrap();
        assert!(v.is_active());
        assert_eq!(v.surface().draw_loop().started_count(), 2);
    }

    #[test]
    fn teardown_during_starting_discards_late_session() {
        let mut v = viewport();
        let ticket = v.begin_start().unwrap().unwrap();
        let capture = v.capture().clone();
        let late = pollster::block_on(capture.start());
        assert!(late.is_ok());

        v.stop();
        assert!(matches!(v.finish_start(ticket, late), Err(ViewportError::Cancelled)));
        assert_eq!(v.capture().devices().open_tracks(), 0);
        assert!(!v.surface().is_looping());
        assert_eq!(v.state(), &ViewportState::Stopped { error: None });
    }

    #[test]
    fn capture_failure_is_reported_and_retryable() {
        let mut camera = small_camera();
        camera.deny_permission = true;
        let mut v = viewport_with(camera, ModelLoader::new(LoaderSettings::default()), ViewportOptions::default());

        assert!(matches!(
            v.start(),
            Err(ViewportError::Capture(CaptureError::PermissionDenied))
        ));
        let reason = CaptureError::PermissionDenied.user_message().to_string();
        assert_eq!(v.state(), &ViewportState::Stopped { error: Some(reason.clone()) });
        assert_eq!(v.notice().map(|n| n.level), Some(NoticeLevel::Error));
        assert!(!v.surface().is_looping());

        assert!(v.begin_start().unwrap().is_some());
        assert_eq!(v.state(), &ViewportState::Starting);
    }

    #[test]
    fn selecting_builtin_replaces_in_place() {
        let mut v = viewport();
        v.start().unwrap();
        let first = v.surface().scene().active().map(|o| o.id());

        v.select("Ball", "builtin:sphere");
        assert_eq!(v.surface().scene().object_count(), 1);
        let active = v.surface().scene().active().unwrap();
        assert_eq!(active.name, "Ball");
        assert_eq!(active.origin, "builtin:sphere");
        assert_eq!(v.surface().renderer().retired, first.into_iter().collect::<Vec<_>>());
        assert!(v.is_active());
    }

    #[test]
    fn initial_model_loads_on_activation() {
        let options = ViewportOptions {
            initial_model: Some("builtin:cone".into()),
            ..Default::default()
        };
        let mut v = viewport_with(small_camera(), ModelLoader::new(LoaderSettings::default()), options);
        v.start().unwrap();
        assert_eq!(v.surface().scene().object_count(), 1);
        assert_eq!(v.surface().scene().active().map(|o| o.origin.as_str()), Some("builtin:cone"));
    }

    #[test]
    fn selection_before_start_is_remembered() {
        let mut v = viewport();
        v.select("Ball", "builtin:sphere");
        assert_eq!(v.surface().scene().object_count(), 0);
        v.start().unwrap();
        assert_eq!(v.surface().scene().active().map(|o| o.name.as_str()), Some("Ball"));
    }

    #[test]
    fn failed_load_falls_back_with_warning() {
        let mut v = viewport();
        v.start().unwrap();
        v.select("Ghost", "/definitely/not/here.glb");
        let report = poll_until_loaded(&mut v);
        assert!(report.fell_back);
        assert_eq!(v.surface().scene().object_count(), 1);
        assert_eq!(v.surface().scene().active().map(|o| o.origin.as_str()), Some("builtin:cube"));
        assert_eq!(v.notice().map(|n| n.level), Some(NoticeLevel::Warning));
        assert!(v.is_active());
    }

    #[test]
    fn load_finishing_after_teardown_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tri.gltf");
        std::fs::write(&path, triangle_gltf()).unwrap();

        let mut v = viewport();
        v.start().unwrap();
        let before = v.surface().scene().active().map(|o| o.id());
        v.select("Tri", path.to_str().unwrap());
        v.stop();
        std::thread::sleep(Duration::from_millis(50));
        let report = v.poll();
        assert_eq!(report, PollReport::default());
        assert_eq!(v.surface().scene().active().map(|o| o.id()), before);
    }

    #[test]
    fn newer_selection_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tri.gltf");
        std::fs::write(&path, triangle_gltf()).unwrap();

        let mut v = viewport();
        v.start().unwrap();
        v.select("Tri", path.to_str().unwrap());
        v.select("Ball", "builtin:sphere");
        assert!(!v.is_loading());
        std::thread::sleep(Duration::from_millis(50));
        v.poll();
        assert_eq!(v.surface().scene().active().map(|o| o.name.as_str()), Some("Ball"));
    }

    #[test]
    fn uploaded_chair_is_normalised_at_standoff() {
        let dir = tempfile::tempdir().unwrap();
        let store: Arc<dyn AssetStore> = Arc::new(FsAssetStore::open(dir.path()).unwrap());
        let record = upload(
            store.as_ref(),
            UploadRequest {
                file_name: "chair.gltf".into(),
                bytes: triangle_gltf().into_bytes(),
                name: "Chair".into(),
                description: None,
            },
        )
        .unwrap();

        let loader = ModelLoader::new(LoaderSettings::default()).with_store(Arc::clone(&store));
        let mut v = viewport_with(small_camera(), loader, ViewportOptions::default());
        v.start().unwrap();
        v.select(record.name.clone(), record.file_reference.clone());
        let report = poll_until_loaded(&mut v);
        assert_eq!(report.installed.as_deref(), Some("Chair"));

        let scene = v.surface().scene();
        assert_eq!(scene.object_count(), 1);
        let bounds = scene.active().unwrap().world_bounds();
        assert_relative_eq!(bounds.max_dim(), 2.0, epsilon = 1e-4);
        let c = bounds.center();
        assert_relative_eq!(c.x, 0.0, epsilon = 1e-4);
        assert_relative_eq!(c.y, 0.0, epsilon = 1e-4);
        assert_relative_eq!(c.z, -2.0, epsilon = 1e-4);
    }

    #[test]
    fn interaction_targets_active_object() {
        let mut v = viewport();
        v.zoom_in();
        v.reset_rotation();
        assert!(!v.pointer(PointerEvent::Down { x: 0.0, y: 0.0 }));

        v.start().unwrap();
        v.pointer(PointerEvent::Down { x: 0.0, y: 0.0 });
        assert!(v.pointer(PointerEvent::Move { x: 10.0, y: 0.0 }));
        v.pointer(PointerEvent::Up);
        for _ in 0..3 {
            v.zoom_in();
        }
        for _ in 0..3 {
            v.zoom_out();
        }
        v.reset_rotation();
        let t = v.surface().scene().active().unwrap().transform;
        assert_eq!(t.rotation, Vec3::ZERO);
        assert_relative_eq!(t.scale, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn still_requires_active_viewport() {
        let mut v = viewport();
        assert!(matches!(v.capture_still(), Err(ViewportError::NotActive)));

        v.start().unwrap();
        v.poll();
        let shot = v.capture_still().unwrap();
        assert_eq!(shot.image.dimensions(), (64, 48));
        // transparent layer: the synthetic colour bars show through
        let expected = v.latest_frame().unwrap().pixel(0, 0).unwrap();
        assert_eq!(shot.image.get_pixel(0, 0).0, expected);
        assert!(v.surface().is_looping());
        assert!(v.session().is_some_and(|s| s.live_track_count() == 1));

        let dir = tempfile::tempdir().unwrap();
        let path = v.save_still(dir.path()).unwrap();
        assert!(path.file_name().unwrap().to_str().unwrap().starts_with("ar-screenshot-"));
        assert_eq!(v.notice().map(|n| n.level), Some(NoticeLevel::Info));
    }
}
