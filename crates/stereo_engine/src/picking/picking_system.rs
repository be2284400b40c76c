//! Click selection on top of [`Scene::find_selectable`]

use crate::foundation::math::Vec2;
use crate::render::ViewCamera;
use crate::scene::{ObjectKey, Scene, SelectionMask};

use super::Modifiers;

/// How a click changes the selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    /// Replace current selection (default)
    Replace,
    /// Add to current selection (Ctrl)
    Add,
    /// Remove from current selection (Shift)
    Remove,
}

impl SelectionMode {
    /// Mode implied by the held modifiers; Ctrl wins over Shift
    pub fn from_modifiers(modifiers: Modifiers) -> Self {
        if modifiers.contains(Modifiers::CTRL) {
            SelectionMode::Add
        } else if modifiers.contains(Modifiers::SHIFT) {
            SelectionMode::Remove
        } else {
            SelectionMode::Replace
        }
    }
}

/// Selection tool: picks the best object under the cursor and updates the
/// scene's selection according to the held modifiers
#[derive(Debug, Clone)]
pub struct PickingSystem {
    mask: SelectionMask,
}

impl PickingSystem {
    /// Picking over every selectable kind
    pub fn new() -> Self {
        Self { mask: SelectionMask::all() }
    }

    /// Restrict picking to some kinds
    pub fn with_mask(mask: SelectionMask) -> Self {
        Self { mask }
    }

    /// Kinds this picker considers
    pub fn mask(&self) -> SelectionMask {
        self.mask
    }

    /// Set the kinds this picker considers
    pub fn set_mask(&mut self, mask: SelectionMask) {
        self.mask = mask;
    }

    /// Handle a selection click; returns the object hit, if any.
    ///
    /// Replace selects only the hit object and clears the selection on a miss.
    /// Add ignores already selected objects so repeated clicks reach the next
    /// candidate. Remove deselects the hit object.
    pub fn click(&self, scene: &mut Scene, camera: &dyn ViewCamera, screen: Vec2, modifiers: Modifiers) -> Option<ObjectKey> {
        let mode = SelectionMode::from_modifiers(modifiers);
        let allow_selected = mode != SelectionMode::Add;
        let hit = scene.find_selectable(camera, screen, self.mask, allow_selected);
        log::debug!("Selection click at ({:.1}, {:.1}) in {:?} mode hit {:?}", screen.x, screen.y, mode, hit);

        match (mode, hit) {
            (SelectionMode::Replace, Some(key)) => self.select_only(scene, key),
            (SelectionMode::Replace, None) => {
                scene.deselect_all();
            }
            (SelectionMode::Add, Some(key)) => {
                scene.select(&[key]);
            }
            (SelectionMode::Remove, Some(key)) => {
                scene.deselect(&[key]);
            }
            (_, None) => {}
        }
        hit
    }

    /// Make `key` the only selected object
    pub fn select_only(&self, scene: &mut Scene, key: ObjectKey) {
        let others: Vec<ObjectKey> = scene.selected().iter().copied().filter(|k| *k != key).collect();
        scene.deselect(&others);
        scene.select(&[key]);
    }

    /// Flip the selection state of an object
    pub fn toggle(&self, scene: &mut Scene, key: ObjectKey) {
        if scene.is_selected(key) {
            scene.deselect(&[key]);
        } else {
            scene.select(&[key]);
        }
    }

    /// Clear the selection
    pub fn deselect_all(&self, scene: &mut Scene) {
        scene.deselect_all();
    }
}

impl Default for PickingSystem {
    fn default() -> Self {
        Self::new()
    }
}
