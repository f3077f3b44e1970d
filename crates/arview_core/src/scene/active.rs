//! The single "active object" slot.
//!
//! `ActiveSlot` exclusively owns the displayed [`SceneObject`].  The only way
//! to change *which* object is displayed is [`ActiveSlot::replace`], which
//! swaps old for new in one synchronous step and hands the retired object
//! back to the caller so its GPU resources can be released explicitly.

use crate::scene::object::{ObjectId, SceneObject};
use crate::transform::Transform;

#[derive(Debug, Default)]
pub struct ActiveSlot {
    current: Option<SceneObject>,
    retired: u64,
}

impl ActiveSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs `next` and returns the previously active object, if any.
    ///
    /// The slot never holds zero objects after a successful call, and never
    /// holds two.
    pub fn replace(&mut self, next: SceneObject) -> Option<SceneObject> {
        let old = self.current.replace(next);
        if let Some(old) = &old {
            self.retired += 1;
            log::debug!("active object {:?} '{}' retired", old.id(), old.name);
        }
        old
    }

    pub fn get(&self) -> Option<&SceneObject> {
        self.current.as_ref()
    }

    pub fn id(&self) -> Option<ObjectId> {
        self.current.as_ref().map(SceneObject::id)
    }

    /// Mutable access to the active object's root transform.
    ///
    /// Interaction edits the transform in place; the object itself can only
    /// be swapped through [`replace`](Self::replace).
    pub fn transform_mut(&mut self) -> Option<&mut Transform> {
        self.current.as_mut().map(|o| &mut o.transform)
    }

    /// 0 or 1.
    pub fn len(&self) -> usize {
        usize::from(self.current.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_none()
    }

    /// Total number of objects retired through `replace`.
    pub fn retired_count(&self) -> u64 {
        self.retired
    }
}
