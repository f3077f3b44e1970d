use std::sync::Arc;

use arview_assets::{AssetStore, LoaderSettings, ModelLoader};
use arview_capture::CaptureManager;
use arview_core::input::KeyCode;
use arview_core::{InputState, TimeClock};
use arview_renderer::{RenderContext, Renderer};
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowAttributes, WindowId},
};

use crate::config::ViewerConfig;
use crate::graphics::GraphicsState;
use crate::viewport::{NoticeLevel, Viewport, ViewportOptions, ViewportState};

#[cfg(not(target_arch = "wasm32"))]
type PlatformDevices = arview_capture::SyntheticDevices;
#[cfg(target_arch = "wasm32")]
type PlatformDevices = arview_capture::WebMediaDevices;

type PlatformViewport = Viewport<PlatformDevices, Renderer>;

#[cfg(target_arch = "wasm32")]
type StartResult = Result<arview_capture::CaptureSession, arview_capture::CaptureError>;

/// Id of the `<canvas>` the viewer draws into on the web.
#[cfg(target_arch = "wasm32")]
const CANVAS_ID: &str = "arview";

const TITLE_REFRESH_SECS: f64 = 0.5;

struct Runner {
    config: ViewerConfig,
    window: Option<Arc<Window>>,
    graphics: Option<GraphicsState>,
    viewport: Option<PlatformViewport>,
    store: Option<Arc<dyn AssetStore>>,
    /// Position in the store listing for "next model".
    next_record: usize,
    input: InputState,
    clock: TimeClock,
    title_refreshed_at: f64,
    fatal: Option<anyhow::Error>,
    #[cfg(target_arch = "wasm32")]
    graphics_rx: Option<std::sync::mpsc::Receiver<anyhow::Result<(GraphicsState, Renderer)>>>,
    #[cfg(target_arch = "wasm32")]
    start_rx: Option<(crate::viewport::StartTicket, std::sync::mpsc::Receiver<StartResult>)>,
}

impl Runner {
    fn new(config: ViewerConfig) -> Self {
        Self {
            store: open_store(&config),
            config,
            window: None,
            graphics: None,
            viewport: None,
            next_record: 0,
            input: InputState::new(),
            clock: TimeClock::new(),
            title_refreshed_at: f64::NEG_INFINITY,
            fatal: None,
            #[cfg(target_arch = "wasm32")]
            graphics_rx: None,
            #[cfg(target_arch = "wasm32")]
            start_rx: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("{error:#}");
        self.fatal = Some(error);
        event_loop.exit();
    }

    /// Second half of `resumed`, once the GPU is ready.
    fn install(&mut self, graphics: GraphicsState, renderer: Renderer) {
        let (w, h) = (graphics.config.width, graphics.config.height);
        let devices = platform_devices(&self.config);
        let capture = CaptureManager::new(devices, self.config.capture_policy());

        let mut loader = ModelLoader::new(LoaderSettings::default());
        if let Some(store) = &self.store {
            loader = loader.with_store(Arc::clone(store));
        }
        let surface = RenderContext::initialize(renderer, w, h);
        let viewport = Viewport::new(capture, surface, loader, ViewportOptions::from(&self.config));

        self.graphics = Some(graphics);
        self.viewport = Some(viewport);
        self.start_camera();
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn start_camera(&mut self) {
        if let Some(viewport) = &mut self.viewport {
            if let Err(e) = viewport.start() {
                log::warn!("camera did not start: {e}");
            }
        }
    }

    /// getUserMedia resolves on the browser's task queue; the outcome comes
    /// back through a channel polled in `about_to_wait`.
    #[cfg(target_arch = "wasm32")]
    fn start_camera(&mut self) {
        let Some(viewport) = &mut self.viewport else {
            return;
        };
        match viewport.begin_start() {
            Ok(Some(ticket)) => {
                let capture = viewport.capture().clone();
                let (tx, rx) = std::sync::mpsc::channel();
                wasm_bindgen_futures::spawn_local(async move {
                    let _ = tx.send(capture.start().await);
                });
                self.start_rx = Some((ticket, rx));
            }
            Ok(None) => {}
            Err(e) => log::warn!("camera did not start: {e}"),
        }
    }

    #[cfg(target_arch = "wasm32")]
    fn poll_async(&mut self) {
        let graphics = self.graphics_rx.as_ref().and_then(|rx| rx.try_recv().ok());
        if let Some(result) = graphics {
            self.graphics_rx = None;
            match result {
                Ok((graphics, renderer)) => self.install(graphics, renderer),
                Err(e) => log::error!("graphics initialisation failed: {e:#}"),
            }
        }
        let started = self.start_rx.as_ref().and_then(|(_, rx)| rx.try_recv().ok());
        if let (Some(result), Some((ticket, _))) = (started, self.start_rx.take()) {
            if let Some(viewport) = &mut self.viewport {
                if let Err(e) = viewport.finish_start(ticket, result) {
                    log::warn!("camera did not start: {e}");
                }
            }
        }
    }

    fn toggle_camera(&mut self) {
        let active = self.viewport.as_ref().is_some_and(|v| v.is_active());
        if active {
            if let Some(viewport) = &mut self.viewport {
                viewport.stop();
            }
        } else {
            self.start_camera();
        }
    }

    /// Cycles through the stored models that have a file.
    fn select_next_stored(&mut self) {
        let Some(store) = &self.store else {
            log::info!("no model store available");
            return;
        };
        let records = match store.list() {
            Ok(records) => records,
            Err(e) => {
                log::warn!("could not list models: {e}");
                return;
            }
        };
        let ready: Vec<_> = records.into_iter().filter(|r| !r.is_pending()).collect();
        if ready.is_empty() {
            log::info!("the model store is empty");
            return;
        }
        let record = &ready[self.next_record % ready.len()];
        self.next_record = self.next_record.wrapping_add(1);
        if let Some(viewport) = &mut self.viewport {
            viewport.select(record.name.clone(), record.file_reference.clone());
        }
    }

    fn handle_keys(&mut self, event_loop: &ActiveEventLoop) {
        let pressed = |key| self.input.just_pressed(key);
        if pressed(KeyCode::Escape) {
            if let Some(viewport) = &mut self.viewport {
                viewport.stop();
            }
            event_loop.exit();
            return;
        }
        let toggle = pressed(KeyCode::Space);
        let next = pressed(KeyCode::KeyN);
        let primitive = [
            (KeyCode::Digit1, "cube"),
            (KeyCode::Digit2, "sphere"),
            (KeyCode::Digit3, "cone"),
        ]
        .into_iter()
        .find(|(key, _)| pressed(*key))
        .map(|(_, name)| name);
        let zoom_in = pressed(KeyCode::Equal) || pressed(KeyCode::NumpadAdd);
        let zoom_out = pressed(KeyCode::Minus) || pressed(KeyCode::NumpadSubtract);
        let reset = pressed(KeyCode::KeyR);
        let still = pressed(KeyCode::KeyS);

        if toggle {
            self.toggle_camera();
        }
        if next {
            self.select_next_stored();
        }
        let screenshot_dir = self.config.screenshot_root();
        let Some(viewport) = &mut self.viewport else {
            return;
        };
        if let Some(name) = primitive {
            viewport.select(name, format!("builtin:{name}"));
        }
        if zoom_in {
            viewport.zoom_in();
        }
        if zoom_out {
            viewport.zoom_out();
        }
        if reset {
            viewport.reset_rotation();
        }
        if still {
            if let Err(e) = viewport.save_still(&screenshot_dir) {
                log::warn!("screenshot failed: {e}");
            }
        }
    }

    fn refresh_title(&mut self, elapsed: f64, fps: f32) {
        if elapsed - self.title_refreshed_at < TITLE_REFRESH_SECS {
            return;
        }
        self.title_refreshed_at = elapsed;
        let (Some(window), Some(viewport)) = (&self.window, &self.viewport) else {
            return;
        };
        let state = match viewport.state() {
            ViewportState::Idle => "idle",
            ViewportState::Starting => "starting camera",
            ViewportState::Active => "live",
            ViewportState::Stopped { .. } => "stopped",
        };
        let mut title = format!("{} | {state} | {fps:.0} fps", self.config.window.title);
        if let Some(notice) = viewport.notice() {
            let tag = match notice.level {
                NoticeLevel::Info => "",
                NoticeLevel::Warning => "warning: ",
                NoticeLevel::Error => "error: ",
            };
            title.push_str(&format!(" | {tag}{}", notice.text));
        }
        window.set_title(&title);
    }
}

impl ApplicationHandler for Runner {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let window = &self.config.window;
        let attributes = Window::default_attributes()
            .with_title(&window.title)
            .with_inner_size(winit::dpi::PhysicalSize::new(window.width, window.height));
        let window = match event_loop.create_window(platform_attributes(attributes)) {
            Ok(window) => Arc::new(window),
            Err(e) => return self.fail(event_loop, anyhow::Error::new(e).context("creating the window")),
        };
        let size = window.inner_size();
        let vsync = self.config.window.vsync;
        self.window = Some(Arc::clone(&window));

        #[cfg(not(target_arch = "wasm32"))]
        {
            match pollster::block_on(GraphicsState::new(window, size.width, size.height, vsync)) {
                Ok((graphics, renderer)) => self.install(graphics, renderer),
                Err(e) => self.fail(event_loop, e.context("initialising graphics")),
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let (tx, rx) = std::sync::mpsc::channel();
            wasm_bindgen_futures::spawn_local(async move {
                let _ = tx.send(GraphicsState::new(window, size.width, size.height, vsync).await);
            });
            self.graphics_rx = Some(rx);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if let Some(pointer) = self.input.handle_window_event(&event) {
            if let Some(viewport) = &mut self.viewport {
                viewport.pointer(pointer);
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                if let Some(viewport) = &mut self.viewport {
                    viewport.stop();
                }
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let (Some(gfx), Some(viewport)) = (&mut self.graphics, &mut self.viewport) {
                    gfx.resize(&viewport.surface().renderer().context.device, size.width, size.height);
                    viewport.resize(size.width, size.height);
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        #[cfg(target_arch = "wasm32")]
        {
            self.poll_async();
        }

        let time = self.clock.tick();
        self.handle_keys(event_loop);

        let (Some(gfx), Some(viewport), Some(window)) = (&mut self.graphics, &mut self.viewport, &self.window)
        else {
            self.input.end_frame();
            return;
        };

        // ── 1. UPDATE ────────────────────────────────────────────────────────
        let report = viewport.poll();
        if let Some(name) = &report.installed {
            log::info!("now showing '{name}'");
        }
        let active = viewport.is_active();
        let (frame, renderer) = viewport.frame_and_renderer_mut();
        match frame {
            Some(frame) if report.new_frame => renderer.upload_video(frame.width, frame.height, &frame.data),
            None if !active => renderer.clear_video(),
            _ => {}
        }

        // ── 2. DRAW ──────────────────────────────────────────────────────────
        viewport.redraw();
        if let Err(e) = gfx.present(viewport.surface_mut().renderer_mut()) {
            log::warn!("present failed: {e}");
        }

        self.input.end_frame();
        window.request_redraw();
        self.refresh_title(time.elapsed, time.fps);
    }
}

fn open_store(config: &ViewerConfig) -> Option<Arc<dyn AssetStore>> {
    if cfg!(target_arch = "wasm32") {
        return None;
    }
    let root = config.store_root();
    match arview_assets::FsAssetStore::open(&root) {
        Ok(store) => Some(Arc::new(store)),
        Err(e) => {
            log::warn!("model store at {} unavailable: {e}", root.display());
            None
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn platform_devices(config: &ViewerConfig) -> PlatformDevices {
    arview_capture::SyntheticDevices::new(config.capture.synthetic.clone())
}

#[cfg(target_arch = "wasm32")]
fn platform_devices(_config: &ViewerConfig) -> PlatformDevices {
    arview_capture::WebMediaDevices
}

#[cfg(not(target_arch = "wasm32"))]
fn platform_attributes(attributes: WindowAttributes) -> WindowAttributes {
    attributes
}

/// Draws into `<canvas id="arview">` when the page has one.
#[cfg(target_arch = "wasm32")]
fn platform_attributes(attributes: WindowAttributes) -> WindowAttributes {
    use wasm_bindgen::JsCast;
    use winit::platform::web::WindowAttributesExtWebSys;

    let canvas = web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.get_element_by_id(CANVAS_ID))
        .and_then(|e| e.dyn_into::<web_sys::HtmlCanvasElement>().ok());
    match canvas {
        Some(canvas) => attributes.with_canvas(Some(canvas)),
        None => attributes.with_append(true),
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub(crate) fn run_internal(config: ViewerConfig) -> anyhow::Result<()> {
    let mut runner = Runner::new(config);
    let event_loop = EventLoop::new()?;
    // Poll = spin the loop as fast as possible; no sleeping between frames.
    event_loop.set_control_flow(ControlFlow::Poll);
    event_loop.run_app(&mut runner)?;
    match runner.fatal.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

#[cfg(target_arch = "wasm32")]
pub(crate) fn run_internal(config: ViewerConfig) -> anyhow::Result<()> {
    use winit::platform::web::EventLoopExtWebSys;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);
    event_loop.spawn_app(Runner::new(config));
    Ok(())
}
