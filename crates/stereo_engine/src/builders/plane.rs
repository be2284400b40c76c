//! Plane tool
//!
//! A plane is finished by three points, or by one point plus a reference
//! object: a plane (parallel copy), a line or an edge (plane containing it).
//! References can only be picked while fewer than two points are collected.

use crate::primitive::{Construction, PrimitiveKind};
use crate::render::ViewCamera;
use crate::scene::{ObjectKey, Scene, SceneError, SceneResult, SelectionMask};

use super::{discard_created, ids_of, reuse_or_create, Anchor, Builder, Click};

#[derive(Debug, Clone, PartialEq, Eq)]
enum PlaneState {
    Idle,
    Collecting {
        points: Vec<Anchor>,
        reference: Option<ObjectKey>,
    },
}

/// What the last click contributed, so a failed completion can be undone
enum Added {
    Point(Anchor),
    Reference { previous: Option<ObjectKey> },
}

/// Builds planes from points and reference objects
#[derive(Debug)]
pub struct PlaneBuilder {
    state: PlaneState,
}

impl PlaneBuilder {
    /// Create the tool
    pub fn new() -> Self {
        Self { state: PlaneState::Idle }
    }

    fn snap_mask(point_count: usize) -> SelectionMask {
        if point_count < 2 {
            SelectionMask::POINT | SelectionMask::PLANE | SelectionMask::EDGE | SelectionMask::LINE
        } else {
            SelectionMask::POINT
        }
    }

    /// Construction for the collected inputs, if they are enough for a plane
    fn construction(scene: &Scene, points: &[Anchor], reference: Option<ObjectKey>) -> SceneResult<Option<(Vec<ObjectKey>, Construction)>> {
        match (points, reference) {
            ([p], Some(reference)) => {
                let [point, other] = ids_of(scene, [p.key, reference])?;
                let kind = scene.get(reference).ok_or(SceneError::MissingObject(reference))?.kind();
                let construction = match kind {
                    PrimitiveKind::Plane => Construction::PlaneByPointAndPlane { point, plane: other },
                    PrimitiveKind::Line => Construction::PlaneByPointAndLine { point, line: other },
                    _ => Construction::PlaneByPointAndSegment { point, segment: other },
                };
                Ok(Some((vec![p.key, reference], construction)))
            }
            ([a, b, c], _) => {
                let [ia, ib, ic] = ids_of(scene, [a.key, b.key, c.key])?;
                Ok(Some((vec![a.key, b.key, c.key], Construction::PlaneByThreePoints { a: ia, b: ib, c: ic })))
            }
            _ => Ok(None),
        }
    }
}

impl Default for PlaneBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Builder for PlaneBuilder {
    fn name(&self) -> &'static str {
        "plane"
    }

    fn process_click(&mut self, scene: &mut Scene, camera: &dyn ViewCamera, click: &Click) -> SceneResult<bool> {
        if self.state == PlaneState::Idle {
            scene.deselect_all();
            self.state = PlaneState::Collecting { points: Vec::new(), reference: None };
        }
        let PlaneState::Collecting { points, reference } = &mut self.state else {
            return Ok(false);
        };

        let mask = Self::snap_mask(points.len());
        let added = match scene.find_selectable(camera, click.screen, mask, true) {
            Some(snap) if points.iter().any(|p| p.key == snap) || *reference == Some(snap) => return Ok(false),
            Some(snap) => {
                let kind = scene.get(snap).ok_or(SceneError::MissingObject(snap))?.kind();
                scene.select(&[snap]);
                if kind == PrimitiveKind::Point {
                    let anchor = Anchor { key: snap, created: false };
                    points.push(anchor);
                    Added::Point(anchor)
                } else {
                    let previous = reference.replace(snap);
                    if let Some(previous) = previous {
                        scene.deselect(&[previous]);
                    }
                    Added::Reference { previous }
                }
            }
            None => {
                let key = scene.create_point(click.world)?;
                scene.select(&[key]);
                let anchor = Anchor { key, created: true };
                points.push(anchor);
                Added::Point(anchor)
            }
        };

        let Some((parents, construction)) = Self::construction(scene, points, *reference)? else {
            return Ok(false);
        };

        match reuse_or_create(scene, &parents, PrimitiveKind::Plane, construction) {
            Ok((plane, _)) => {
                log::debug!("Plane tool: completed {:?}", plane);
                self.state = PlaneState::Idle;
                Ok(true)
            }
            Err(err) => {
                log::warn!("Plane tool: cannot build plane: {}", err);
                match added {
                    Added::Point(anchor) => {
                        points.retain(|p| p.key != anchor.key);
                        scene.deselect(&[anchor.key]);
                        discard_created(scene, anchor)?;
                    }
                    Added::Reference { previous } => {
                        if let Some(current) = reference.take() {
                            scene.deselect(&[current]);
                        }
                        if let Some(previous) = previous {
                            scene.select(&[previous]);
                            *reference = Some(previous);
                        }
                    }
                }
                Err(err)
            }
        }
    }

    fn cancel(&mut self, scene: &mut Scene) -> SceneResult<()> {
        if let PlaneState::Collecting { points, reference } = std::mem::replace(&mut self.state, PlaneState::Idle) {
            if let Some(reference) = reference {
                scene.deselect(&[reference]);
            }
            for anchor in points.into_iter().rev() {
                discard_created(scene, anchor)?;
            }
        }
        Ok(())
    }

    fn has_any_progress(&self) -> bool {
        match &self.state {
            PlaneState::Idle => false,
            PlaneState::Collecting { points, reference } => !points.is_empty() || reference.is_some(),
        }
    }
}
