//! Pointer / touch normalisation and keyboard state.
//!
//! Mouse and touch input both collapse into [`PointerEvent`]s so that the
//! interaction layer only has one gesture stream to interpret.  Only the
//! first finger down drives the pointer; extra fingers are ignored until it
//! lifts.

#[cfg(feature = "input")]
use std::collections::HashSet;

#[cfg(feature = "input")]
pub use winit::event::MouseButton;
#[cfg(feature = "input")]
pub use winit::keyboard::KeyCode;

/// A device-independent pointer gesture step in window pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down { x: f64, y: f64 },
    Move { x: f64, y: f64 },
    Up,
}

/// Touch lifecycle, mirrored from the windowing layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchPhase {
    Started,
    Moved,
    Ended,
    Cancelled,
}

/// State of the pointer and keyboard at a given moment.
///
/// The runner feeds it raw window events; it answers with normalised
/// [`PointerEvent`]s and key queries.
#[derive(Debug, Default)]
pub struct InputState {
    cursor: (f64, f64),
    primary_touch: Option<u64>,
    #[cfg(feature = "input")]
    keys_down: HashSet<KeyCode>,
    #[cfg(feature = "input")]
    keys_pressed: HashSet<KeyCode>,
}

impl InputState {
    pub fn new() -> Self {
        Default::default()
    }

    /// Last known cursor position (window coordinates).
    pub fn cursor(&self) -> (f64, f64) {
        self.cursor
    }

    // ── Mouse ──────────────────────────────────────────────────────────────

    pub fn cursor_moved(&mut self, x: f64, y: f64) -> PointerEvent {
        self.cursor = (x, y);
        PointerEvent::Move { x, y }
    }

    /// Primary button press/release at the current cursor position.
    pub fn primary_button(&mut self, pressed: bool) -> PointerEvent {
        if pressed {
            let (x, y) = self.cursor;
            PointerEvent::Down { x, y }
        } else {
            PointerEvent::Up
        }
    }

    // ── Touch ──────────────────────────────────────────────────────────────

    /// Maps one touch update to a pointer event, or `None` if it belongs to a
    /// secondary finger.
    pub fn touch(&mut self, id: u64, phase: TouchPhase, x: f64, y: f64) -> Option<PointerEvent> {
        match phase {
            TouchPhase::Started => {
                if self.primary_touch.is_some() {
                    return None;
                }
                self.primary_touch = Some(id);
                self.cursor = (x, y);
                Some(PointerEvent::Down { x, y })
            }
            TouchPhase::Moved if self.primary_touch == Some(id) => {
                self.cursor = (x, y);
                Some(PointerEvent::Move { x, y })
            }
            TouchPhase::Ended | TouchPhase::Cancelled if self.primary_touch == Some(id) => {
                self.primary_touch = None;
                Some(PointerEvent::Up)
            }
            _ => None,
        }
    }

    // ── winit bridge ───────────────────────────────────────────────────────

    /// Translates a winit window event.  Keyboard events update key state and
    /// yield `None`.
    #[cfg(feature = "input")]
    pub fn handle_window_event(&mut self, event: &winit::event::WindowEvent) -> Option<PointerEvent> {
        use winit::event::{ElementState, WindowEvent};
        use winit::keyboard::PhysicalKey;

        match event {
            WindowEvent::CursorMoved { position, .. } => Some(self.cursor_moved(position.x, position.y)),
            WindowEvent::MouseInput { state, button: MouseButton::Left, .. } => {
                Some(self.primary_button(*state == ElementState::Pressed))
            }
            WindowEvent::CursorLeft { .. } => Some(PointerEvent::Up),
            WindowEvent::Touch(touch) => {
                let phase = match touch.phase {
                    winit::event::TouchPhase::Started => TouchPhase::Started,
                    winit::event::TouchPhase::Moved => TouchPhase::Moved,
                    winit::event::TouchPhase::Ended => TouchPhase::Ended,
                    winit::event::TouchPhase::Cancelled => TouchPhase::Cancelled,
                };
                self.touch(touch.id, phase, touch.location.x, touch.location.y)
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(code) = event.physical_key {
                    self.update_key(code, event.state == ElementState::Pressed, event.repeat);
                }
                None
            }
            _ => None,
        }
    }

    // ── Keyboard ───────────────────────────────────────────────────────────

    #[cfg(feature = "input")]
    pub fn update_key(&mut self, key: KeyCode, pressed: bool, repeat: bool) {
        if pressed {
            if !repeat && self.keys_down.insert(key) {
                self.keys_pressed.insert(key);
            }
        } else {
            self.keys_down.remove(&key);
        }
    }

    /// True only on the frame the key went down.
    #[cfg(feature = "input")]
    pub fn just_pressed(&self, key: KeyCode) -> bool {
        self.keys_pressed.contains(&key)
    }

    /// Clears per-frame edge state.  Call once after the frame's updates.
    #[cfg(feature = "input")]
    pub fn end_frame(&mut self) {
        self.keys_pressed.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mouse_press_reports_cursor_position() {
        let mut input = InputState::new();
        input.cursor_moved(10.0, 20.0);
        assert_eq!(input.primary_button(true), PointerEvent::Down { x: 10.0, y: 20.0 });
        assert_eq!(input.primary_button(false), PointerEvent::Up);
    }

    #[test]
    fn only_first_finger_drives_pointer() {
        let mut input = InputState::new();
        assert_eq!(
            input.touch(1, TouchPhase::Started, 5.0, 5.0),
            Some(PointerEvent::Down { x: 5.0, y: 5.0 })
        );
        assert_eq!(input.touch(2, TouchPhase::Started, 50.0, 50.0), None);
        assert_eq!(input.touch(2, TouchPhase::Moved, 60.0, 60.0), None);
        assert_eq!(
            input.touch(1, TouchPhase::Moved, 7.0, 9.0),
            Some(PointerEvent::Move { x: 7.0, y: 9.0 })
        );
        assert_eq!(input.touch(2, TouchPhase::Ended, 0.0, 0.0), None);
        assert_eq!(input.touch(1, TouchPhase::Cancelled, 0.0, 0.0), Some(PointerEvent::Up));
        // primary released: a new finger may take over
        assert!(input.touch(2, TouchPhase::Started, 1.0, 1.0).is_some());
    }

    #[cfg(feature = "input")]
    #[test]
    fn key_edges_reset_each_frame() {
        let mut input = InputState::new();
        input.update_key(KeyCode::KeyR, true, false);
        assert!(input.just_pressed(KeyCode::KeyR));
        input.end_frame();
        assert!(!input.just_pressed(KeyCode::KeyR));
        // held + OS repeat does not re-trigger
        input.update_key(KeyCode::KeyR, true, true);
        assert!(!input.just_pressed(KeyCode::KeyR));
    }
}
