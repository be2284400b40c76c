//! # Construction Builders
//!
//! One click-driven state machine per tool. A click first tries to snap to
//! existing geometry through [`Scene::find_selectable`]; when nothing is hit a
//! new point is placed at the click's fallback world position.
//!
//! ## Contract
//!
//! - `process_click` returns `true` when the click completed a shape
//! - `cancel` removes only what the unfinished operation created; snapped
//!   objects are left alone
//! - `has_any_progress` tells the host whether Escape should cancel the tool or
//!   clear the selection (see [`ToolController`])
//! - Objects a builder creates or reuses are selected; starting a new shape
//!   clears the previous selection

pub mod controller;
pub mod division;
pub mod edge;
pub mod face;
pub mod line;
pub mod plane;
pub mod point;
pub mod rect;

use crate::foundation::math::{Vec2, Vec3};
use crate::primitive::{Construction, ObjectId, PrimitiveKind};
use crate::render::ViewCamera;
use crate::scene::{ObjectKey, Scene, SceneError, SceneResult, SelectionMask};

pub use crate::picking::Modifiers;
pub use controller::{Tool, ToolController};
pub use division::DivisionBuilder;
pub use edge::EdgeBuilder;
pub use face::FaceBuilder;
pub use line::LineBuilder;
pub use plane::PlaneBuilder;
pub use point::PointBuilder;
pub use rect::RectBuilder;

/// A click as seen by a builder
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Click {
    /// Cursor position in pixels
    pub screen: Vec2,
    /// Where a new point goes when nothing is snapped
    pub world: Vec3,
    /// Held modifier keys
    pub modifiers: Modifiers,
}

impl Click {
    /// A click without modifiers
    pub fn new(screen: Vec2, world: Vec3) -> Self {
        Self { screen, world, modifiers: Modifiers::empty() }
    }

    /// The same click with modifiers held
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Whether Shift is held
    pub fn shift(&self) -> bool {
        self.modifiers.contains(Modifiers::SHIFT)
    }
}

/// Click-driven construction tool
pub trait Builder {
    /// Tool name for logs and UI
    fn name(&self) -> &'static str;

    /// Feed one click; returns whether it completed a shape
    fn process_click(&mut self, scene: &mut Scene, camera: &dyn ViewCamera, click: &Click) -> SceneResult<bool>;

    /// Abandon the shape in progress
    fn cancel(&mut self, scene: &mut Scene) -> SceneResult<()>;

    /// Whether a shape is in progress
    fn has_any_progress(&self) -> bool;
}

/// A point taking part in a construction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchor {
    /// The point
    pub key: ObjectKey,
    /// Whether this operation created it
    pub created: bool,
}

/// Snap to a point or place a new one; `None` when the snap hits one of `taken`.
///
/// The anchor ends up selected.
pub(crate) fn anchor_point(
    scene: &mut Scene,
    camera: &dyn ViewCamera,
    click: &Click,
    taken: &[ObjectKey],
) -> SceneResult<Option<Anchor>> {
    match scene.find_selectable(camera, click.screen, SelectionMask::POINT, true) {
        Some(key) if taken.contains(&key) => Ok(None),
        Some(key) => {
            scene.select(&[key]);
            Ok(Some(Anchor { key, created: false }))
        }
        None => {
            let key = scene.create_point(click.world)?;
            scene.select(&[key]);
            Ok(Some(Anchor { key, created: true }))
        }
    }
}

/// Remove an object if it still exists
pub(crate) fn discard(scene: &mut Scene, key: ObjectKey) -> SceneResult<()> {
    if scene.contains(key) {
        scene.remove_object(key)?;
    }
    Ok(())
}

/// Remove an anchor's point if this operation created it
pub(crate) fn discard_created(scene: &mut Scene, anchor: Anchor) -> SceneResult<()> {
    if anchor.created {
        discard(scene, anchor.key)?;
    }
    Ok(())
}

/// Remove whatever in `created` still exists, newest first, in one batch
pub(crate) fn discard_all(scene: &mut Scene, created: &[ObjectKey]) -> SceneResult<()> {
    let alive: Vec<ObjectKey> = created.iter().rev().copied().filter(|key| scene.contains(*key)).collect();
    if !alive.is_empty() {
        scene.remove_objects(&alive)?;
    }
    Ok(())
}

pub(crate) fn ids_of<const N: usize>(scene: &Scene, keys: [ObjectKey; N]) -> SceneResult<[ObjectId; N]> {
    let mut ids = [ObjectId::default(); N];
    for (id, key) in ids.iter_mut().zip(keys) {
        *id = scene.id_of(key).ok_or(SceneError::MissingObject(key))?;
    }
    Ok(ids)
}

/// Reuse an object of `kind` that already depends on all `parents`, or create
/// one from `construction`. Either way it is selected. The flag tells whether
/// it was created.
pub(crate) fn reuse_or_create(
    scene: &mut Scene,
    parents: &[ObjectKey],
    kind: PrimitiveKind,
    construction: Construction,
) -> SceneResult<(ObjectKey, bool)> {
    let (key, created) = match scene.common_child(parents, kind) {
        Some(existing) => (existing, false),
        None => (scene.create(construction)?, true),
    };
    scene.select(&[key]);
    Ok((key, created))
}

/// Edge between two points, reusing an existing one
pub(crate) fn edge_between(scene: &mut Scene, a: ObjectKey, b: ObjectKey) -> SceneResult<(ObjectKey, bool)> {
    let [ia, ib] = ids_of(scene, [a, b])?;
    reuse_or_create(scene, &[a, b], PrimitiveKind::Segment, Construction::Segment { a: ia, b: ib })
}

/// Face over three points, reusing an existing one
pub(crate) fn face_between(
    scene: &mut Scene,
    a: ObjectKey,
    b: ObjectKey,
    c: ObjectKey,
) -> SceneResult<(ObjectKey, bool)> {
    let [ia, ib, ic] = ids_of(scene, [a, b, c])?;
    let construction = Construction::Triangle { a: ia, b: ib, c: ic };
    reuse_or_create(scene, &[a, b, c], PrimitiveKind::Triangle, construction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::OrthoCamera;

    #[test]
    fn test_anchor_snaps_to_existing_point() {
        let mut scene = Scene::default();
        let existing = scene.create_point(Vec3::new(1.0, 1.0, 0.0)).expect("point");
        let camera = OrthoCamera::new();

        let click = Click::new(Vec2::new(105.0, 100.0), Vec3::new(9.0, 9.0, 9.0));
        let anchor = anchor_point(&mut scene, &camera, &click, &[]).expect("anchor").expect("snap");
        assert_eq!(anchor, Anchor { key: existing, created: false });
        assert!(scene.is_selected(existing));

        let rejected = anchor_point(&mut scene, &camera, &click, &[existing]).expect("anchor");
        assert!(rejected.is_none());
        assert_eq!(scene.len(), 1);
    }

    #[test]
    fn test_edges_are_reused() {
        let mut scene = Scene::default();
        let a = scene.create_point(Vec3::zeros()).expect("point");
        let b = scene.create_point(Vec3::x()).expect("point");
        let (first, created) = edge_between(&mut scene, a, b).expect("edge");
        assert!(created);
        assert_eq!(edge_between(&mut scene, b, a).expect("edge"), (first, false));
        assert_eq!(scene.count_of(PrimitiveKind::Segment), 1);
    }
}
