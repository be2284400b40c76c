//! # Hit Testing
//!
//! Resolves a click to the single best object across points, lines, edges,
//! planes and faces. Every eligible object scores the click with a weight in
//! `[0, 1]` (or NaN for "no match"):
//!
//! - **Points, lines, edges**: screen-space distance to the projected geometry,
//!   `1 - 0.8 * d / 20` inside a 20 pixel radius, NaN beyond it
//! - **Planes, faces**: distance `t` along the click ray to the surface,
//!   `1 - atan(t) / (pi / 2) * 0.8`, so nearer hits win without a hard cutoff
//!
//! The highest weight wins; ties go to the object added first.

pub mod picking_system;

use bitflags::bitflags;

use crate::foundation::math::{constants::HALF_PI, Vec2};
use crate::geometry::{point_to_line_distance, point_to_segment_distance, GeometryResult};
use crate::primitive::{resolve, PrimitiveKind};
use crate::render::ViewCamera;
use crate::scene::{mesh, ObjectKey, Scene, SceneObject, SelectionMask};

pub use picking_system::{PickingSystem, SelectionMode};

/// Screen-space pick radius in pixels
pub const PICK_RADIUS: f64 = 20.0;

/// Weight lost between a perfect hit and the edge of the pick radius
const FALLOFF: f64 = 0.8;

bitflags! {
    /// Keyboard modifiers held during a click
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        /// Shift
        const SHIFT = 0b01;
        /// Control
        const CTRL  = 0b10;
    }
}

/// Weight of a screen-space distance, NaN outside the pick radius
pub fn screen_weight(distance: f64) -> f64 {
    if distance.is_finite() && distance <= PICK_RADIUS {
        1.0 - FALLOFF * distance / PICK_RADIUS
    } else {
        f64::NAN
    }
}

/// Weight of a hit `t` units along the click ray, NaN on a miss
pub fn surface_weight(t: f64) -> f64 {
    if t.is_finite() && t >= 0.0 {
        1.0 - t.atan() / HALF_PI * FALLOFF
    } else {
        f64::NAN
    }
}

/// The candidate with the strictly greatest valid weight; earlier candidates win ties.
///
/// NaN weights are skipped silently. Weights outside `[0, 1]` are reported and
/// skipped.
pub fn pick_best<K: Copy + std::fmt::Debug>(candidates: impl IntoIterator<Item = (K, f64)>) -> Option<K> {
    let mut best: Option<(K, f64)> = None;
    for (key, weight) in candidates {
        if weight.is_nan() {
            continue;
        }
        if !(0.0..=1.0).contains(&weight) {
            log::warn!("Selection weight {} of {:?} is outside [0, 1], skipping", weight, key);
            continue;
        }
        if best.map_or(true, |(_, current)| weight > current) {
            best = Some((key, weight));
        }
    }
    best.map(|(key, _)| key)
}

impl Scene {
    /// Best object under a screen position among those matching `mask`.
    ///
    /// Selected objects are only eligible when `allow_selected` is set.
    pub fn find_selectable(
        &self,
        camera: &dyn ViewCamera,
        screen: Vec2,
        mask: SelectionMask,
        allow_selected: bool,
    ) -> Option<ObjectKey> {
        let candidates = self
            .objects()
            .filter(|(_, object)| object.selection_mask().intersects(mask))
            .filter(|(_, object)| allow_selected || !object.is_selected())
            .map(|(key, object)| (key, self.selection_weight(object, camera, screen)));
        pick_best(candidates)
    }

    /// How well a click at `screen` matches an object, NaN for no match
    pub fn selection_weight(&self, object: &SceneObject, camera: &dyn ViewCamera, screen: Vec2) -> f64 {
        match self.try_selection_weight(object, camera, screen) {
            Ok(weight) => weight,
            Err(err) => {
                log::trace!("Cannot score '{}': {}", object.name(), err);
                f64::NAN
            }
        }
    }

    fn try_selection_weight(&self, object: &SceneObject, camera: &dyn ViewCamera, screen: Vec2) -> GeometryResult<f64> {
        let primitive = object.primitive();
        Ok(match object.kind() {
            PrimitiveKind::Point => {
                let projected = camera.world_to_screen(object.position());
                screen_weight((projected - screen).norm())
            }
            PrimitiveKind::Segment => {
                let segment = resolve::segment_of(self, primitive)?;
                let (a, b) = (camera.world_to_screen(segment.a), camera.world_to_screen(segment.b));
                screen_weight(point_to_segment_distance(screen, a, b))
            }
            PrimitiveKind::Line => {
                let [p0, p1] = resolve::line_of(self, primitive)?.pivot_points();
                let (a, b) = (camera.world_to_screen(p0), camera.world_to_screen(p1));
                screen_weight(point_to_line_distance(screen, a, b))
            }
            PrimitiveKind::Triangle => {
                let triangle = resolve::triangle_of(self, primitive)?;
                surface_weight(triangle.ray_distance(&camera.ray_through(screen)))
            }
            PrimitiveKind::Plane => {
                let plane = resolve::plane_of(self, primitive)?;
                let shown = mesh::plane_display_triangle(&plane, self.config().display.plane_extent);
                surface_weight(shown.ray_distance(&camera.ray_through(screen)))
            }
            PrimitiveKind::Body => f64::NAN,
        })
    }
}
