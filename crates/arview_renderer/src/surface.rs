//! The render surface: scene + renderer + a single-instance draw loop.

use std::cell::RefCell;
use std::rc::Rc;

use arview_core::{ObjectId, Scene, SceneObject};
use image::RgbaImage;

use crate::error::RenderError;
use crate::frame::FrameRenderer;

// ── Draw loop ─────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct LoopState {
    running: Option<u64>,
    next_id: u64,
    started: u64,
}

/// Schedules continuous redraws.  At most one loop runs at a time.
///
/// The loop itself is driven by the window's redraw ticks; this type only
/// answers "should this tick draw?".
#[derive(Debug, Default)]
pub struct DrawLoop {
    state: Rc<RefCell<LoopState>>,
}

impl DrawLoop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&self) -> Result<LoopHandle, RenderError> {
        let mut state = self.state.borrow_mut();
        if state.running.is_some() {
            return Err(RenderError::LoopAlreadyRunning);
        }
        state.next_id += 1;
        state.started += 1;
        let id = state.next_id;
        state.running = Some(id);
        log::debug!("draw loop {id} started");
        Ok(LoopHandle {
            id,
            state: Rc::clone(&self.state),
        })
    }

    pub fn is_running(&self) -> bool {
        self.state.borrow().running.is_some()
    }

    /// 0 or 1.
    pub fn running_count(&self) -> usize {
        usize::from(self.is_running())
    }

    /// Loops started over the lifetime of this scheduler.
    pub fn started_count(&self) -> u64 {
        self.state.borrow().started
    }
}

/// Owner of a running draw loop.  Cancelling (or dropping) it stops the loop
/// before the next tick.
#[derive(Debug)]
pub struct LoopHandle {
    id: u64,
    state: Rc<RefCell<LoopState>>,
}

impl LoopHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Synchronous and idempotent.
    pub fn cancel(&self) {
        let mut state = self.state.borrow_mut();
        if state.running == Some(self.id) {
            state.running = None;
            log::debug!("draw loop {} cancelled", self.id);
        }
    }

    pub fn is_active(&self) -> bool {
        self.state.borrow().running == Some(self.id)
    }
}

impl Drop for LoopHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

// ── Render context ────────────────────────────────────────────────────────────

/// Scene, camera, lights and renderer for one drawable surface.
pub struct RenderContext<R> {
    scene: Scene,
    renderer: R,
    draw_loop: DrawLoop,
    width: u32,
    height: u32,
    frames: u64,
    failed_frames: u64,
}

impl<R: FrameRenderer> RenderContext<R> {
    /// Builds the viewer scene for a `width`×`height` surface drawn by
    /// `renderer`.
    pub fn initialize(mut renderer: R, width: u32, height: u32) -> Self {
        let (width, height) = (width.max(1), height.max(1));
        renderer.resize(width, height);
        log::info!("render surface initialised at {width}x{height}");
        Self {
            scene: Scene::new(width, height),
            renderer,
            draw_loop: DrawLoop::new(),
            width,
            height,
            frames: 0,
            failed_frames: 0,
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    /// Updates camera aspect and renderer size.  Returns `false` when the
    /// size is unchanged or has a zero dimension.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 || (width, height) == (self.width, self.height) {
            return false;
        }
        self.width = width;
        self.height = height;
        self.scene.set_viewport_size(width, height);
        self.renderer.resize(width, height);
        true
    }

    pub fn render_frame(&mut self) -> Result<(), RenderError> {
        self.renderer.render(&self.scene)?;
        self.frames += 1;
        Ok(())
    }

    pub fn run_loop(&mut self) -> Result<LoopHandle, RenderError> {
        self.draw_loop.start()
    }

    pub fn is_looping(&self) -> bool {
        self.draw_loop.is_running()
    }

    pub fn draw_loop(&self) -> &DrawLoop {
        &self.draw_loop
    }

    /// One display refresh.  Draws if a loop is running; a failed frame is
    /// logged and skipped.  Returns whether a frame was drawn.
    pub fn on_redraw(&mut self) -> bool {
        if !self.draw_loop.is_running() {
            return false;
        }
        match self.render_frame() {
            Ok(()) => true,
            Err(e) => {
                self.failed_frames += 1;
                log::warn!("frame skipped: {e}");
                false
            }
        }
    }

    /// Swaps the active object and releases the retired one's GPU resources.
    pub fn replace_active(&mut self, next: SceneObject) -> Option<ObjectId> {
        let retired = self.scene.replace_active(next)?;
        self.renderer.retire(retired.id());
        Some(retired.id())
    }

    pub fn read_layer(&mut self) -> Result<RgbaImage, RenderError> {
        self.renderer.read_layer()
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }

    pub fn frames_failed(&self) -> u64 {
        self.failed_frames
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Records every call; can be told to fail renders.
    #[derive(Debug, Default)]
    pub struct RecordingRenderer {
        pub sizes: Vec<(u32, u32)>,
        pub renders: usize,
        pub retired: Vec<ObjectId>,
        pub fail_renders: bool,
        pub last_object_count: usize,
    }

    impl FrameRenderer for RecordingRenderer {
        fn resize(&mut self, width: u32, height: u32) {
            self.sizes.push((width, height));
        }

        fn render(&mut self, scene: &Scene) -> Result<(), RenderError> {
            if self.fail_renders {
                return Err(RenderError::Surface("lost".into()));
            }
            self.renders += 1;
            self.last_object_count = scene.object_count();
            Ok(())
        }

        fn read_layer(&mut self) -> Result<RgbaImage, RenderError> {
            let (w, h) = self.sizes.last().copied().unwrap_or((1, 1));
            Ok(RgbaImage::new(w, h))
        }

        fn retire(&mut self, object: ObjectId) {
            self.retired.push(object);
        }
    }
}
