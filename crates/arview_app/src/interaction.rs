//! Drag-to-rotate and step zoom on the active object.

use arview_core::glam::Vec3;
use arview_core::{PointerEvent, Transform};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionSettings {
    /// Radians per pixel of drag.
    pub rotate_sensitivity: f32,
    /// Scale factor per zoom step; zooming out divides by it.
    pub zoom_step: f32,
}

impl Default for InteractionSettings {
    fn default() -> Self {
        Self {
            rotate_sensitivity: 0.01,
            zoom_step: 1.1,
        }
    }
}

/// Turns pointer gestures into transform edits.  Every operation takes the
/// active object's transform, if any; with `None` nothing happens.
#[derive(Debug, Default)]
pub struct InteractionController {
    settings: InteractionSettings,
    last: Option<(f64, f64)>,
}

impl InteractionController {
    /// A zoom step that is not finite and above 1, or a sensitivity that is
    /// not finite and positive, is replaced by its default.
    pub fn new(settings: InteractionSettings) -> Self {
        let defaults = InteractionSettings::default();
        let mut settings = settings;
        if !(settings.zoom_step.is_finite() && settings.zoom_step > 1.0) {
            log::warn!("invalid zoom step {}, using {}", settings.zoom_step, defaults.zoom_step);
            settings.zoom_step = defaults.zoom_step;
        }
        if !(settings.rotate_sensitivity.is_finite() && settings.rotate_sensitivity > 0.0) {
            log::warn!(
                "invalid rotate sensitivity {}, using {}",
                settings.rotate_sensitivity,
                defaults.rotate_sensitivity
            );
            settings.rotate_sensitivity = defaults.rotate_sensitivity;
        }
        Self { settings, last: None }
    }

    pub fn settings(&self) -> InteractionSettings {
        self.settings
    }

    pub fn is_dragging(&self) -> bool {
        self.last.is_some()
    }

    /// Feeds one gesture step.  Returns whether the transform changed.
    pub fn pointer(&mut self, event: PointerEvent, target: Option<&mut Transform>) -> bool {
        match event {
            PointerEvent::Down { x, y } => {
                self.last = Some((x, y));
                false
            }
            PointerEvent::Up => {
                self.last = None;
                false
            }
            PointerEvent::Move { x, y } => {
                let Some((lx, ly)) = self.last else {
                    return false;
                };
                self.last = Some((x, y));
                let Some(transform) = target else {
                    return false;
                };
                let k = self.settings.rotate_sensitivity;
                let (dx, dy) = ((x - lx) as f32, (y - ly) as f32);
                if dx == 0.0 && dy == 0.0 {
                    return false;
                }
                transform.rotate_euler(Vec3::new(dy * k, dx * k, 0.0));
                true
            }
        }
    }

    pub fn zoom_in(&self, target: Option<&mut Transform>) {
        if let Some(t) = target {
            t.scale_by(self.settings.zoom_step);
        }
    }

    pub fn zoom_out(&self, target: Option<&mut Transform>) {
        if let Some(t) = target {
            t.scale_by(1.0 / self.settings.zoom_step);
        }
    }

    pub fn reset_rotation(&self, target: Option<&mut Transform>) {
        if let Some(t) = target {
            t.reset_rotation();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn controller() -> InteractionController {
        InteractionController::new(InteractionSettings::default())
    }

    #[test]
    fn drag_rotates_about_y_and_x() {
        let mut c = controller();
        let mut t = Transform::default();
        assert!(!c.pointer(PointerEvent::Down { x: 100.0, y: 100.0 }, Some(&mut t)));
        assert!(c.pointer(PointerEvent::Move { x: 150.0, y: 80.0 }, Some(&mut t)));
        assert_relative_eq!(t.rotation.y, 0.5);
        assert_relative_eq!(t.rotation.x, -0.2);
        assert_relative_eq!(t.rotation.z, 0.0);

        c.pointer(PointerEvent::Up, Some(&mut t));
        assert!(!c.pointer(PointerEvent::Move { x: 400.0, y: 400.0 }, Some(&mut t)));
        assert_relative_eq!(t.rotation.y, 0.5);
    }

    #[test]
    fn zoom_in_then_out_restores_scale() {
        let c = controller();
        let mut t = Transform::default();
        t.scale = 0.37;
        for _ in 0..25 {
            c.zoom_in(Some(&mut t));
        }
        assert!(t.scale > 0.37 * 10.0);
        for _ in 0..25 {
            c.zoom_out(Some(&mut t));
        }
        assert_relative_eq!(t.scale, 0.37, max_relative = 1e-4);
    }

    #[test]
    fn reset_keeps_scale_and_position() {
        let mut c = controller();
        let mut t = Transform::default();
        t.position = Vec3::new(0.0, 0.0, -2.0);
        c.zoom_in(Some(&mut t));
        c.pointer(PointerEvent::Down { x: 0.0, y: 0.0 }, Some(&mut t));
        c.pointer(PointerEvent::Move { x: 30.0, y: 40.0 }, Some(&mut t));
        c.reset_rotation(Some(&mut t));
        assert_eq!(t.rotation, Vec3::ZERO);
        assert_relative_eq!(t.scale, 1.1);
        assert_eq!(t.position, Vec3::new(0.0, 0.0, -2.0));
    }

    #[test]
    fn nothing_active_is_a_no_op() {
        let mut c = controller();
        c.zoom_in(None);
        c.zoom_out(None);
        c.reset_rotation(None);
        c.pointer(PointerEvent::Down { x: 0.0, y: 0.0 }, None);
        assert!(!c.pointer(PointerEvent::Move { x: 5.0, y: 5.0 }, None));
        assert!(c.is_dragging());
    }

    #[test]
    fn bad_zoom_step_is_replaced() {
        for step in [0.0, 0.5, 1.0, -2.0, f32::NAN, f32::INFINITY] {
            let c = InteractionController::new(InteractionSettings {
                zoom_step: step,
                rotate_sensitivity: 0.02,
            });
            assert_eq!(c.settings().zoom_step, 1.1, "step {step}");
            assert_eq!(c.settings().rotate_sensitivity, 0.02);
        }
        assert_eq!(
            InteractionController::new(InteractionSettings {
                zoom_step: 1.5,
                rotate_sensitivity: 0.02,
            })
            .settings()
            .zoom_step,
            1.5
        );
    }

    #[test]
    fn sub_unit_zoom_step_still_zooms_in() {
        let c = InteractionController::new(InteractionSettings {
            zoom_step: 0.5,
            ..InteractionSettings::default()
        });
        let mut t = Transform::default();
        c.zoom_in(Some(&mut t));
        assert!(t.scale > 1.0);
        c.zoom_out(Some(&mut t));
        c.zoom_out(Some(&mut t));
        assert!(t.scale < 1.0);
    }

    #[test]
    fn bad_rotate_sensitivity_is_replaced() {
        for k in [0.0, -0.01, f32::NAN, f32::INFINITY] {
            let mut c = InteractionController::new(InteractionSettings {
                rotate_sensitivity: k,
                zoom_step: 1.2,
            });
            assert_eq!(c.settings().rotate_sensitivity, 0.01);
            assert_eq!(c.settings().zoom_step, 1.2);

            let mut t = Transform::default();
            c.pointer(PointerEvent::Down { x: 0.0, y: 0.0 }, Some(&mut t));
            c.pointer(PointerEvent::Move { x: 10.0, y: 0.0 }, Some(&mut t));
            assert!(t.rotation.y.is_finite() && t.rotation.y > 0.0);
        }
    }
}
