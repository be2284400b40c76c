//! Face tool: three points make a triangle with its three edges.
//!
//! Holding Shift on completion keeps the first point and the last edge, so the
//! next click fans another triangle off the same corner.

use crate::render::ViewCamera;
use crate::scene::{ObjectKey, Scene, SceneResult};

use super::{anchor_point, discard, discard_created, edge_between, face_between, Anchor, Builder, Click};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FaceState {
    Idle,
    OnePoint(Anchor),
    TwoPoints {
        p1: Anchor,
        p2: Anchor,
        edge: (ObjectKey, bool),
    },
    Chaining {
        p1: ObjectKey,
        p2: ObjectKey,
        edge: ObjectKey,
    },
}

/// Builds triangles and their edges
#[derive(Debug)]
pub struct FaceBuilder {
    state: FaceState,
}

impl FaceBuilder {
    /// Create the tool
    pub fn new() -> Self {
        Self { state: FaceState::Idle }
    }

    fn complete(
        &mut self,
        scene: &mut Scene,
        (p1, p2, edge): (ObjectKey, ObjectKey, ObjectKey),
        pt: ObjectKey,
        shift: bool,
    ) -> SceneResult<bool> {
        let (edge2, _) = edge_between(scene, p2, pt)?;
        let (edge3, _) = edge_between(scene, pt, p1)?;
        let (face, _) = face_between(scene, p1, p2, pt)?;
        scene.add_parents(face, &[edge, edge2, edge3])?;

        self.state = if shift {
            FaceState::Chaining { p1, p2: pt, edge: edge3 }
        } else {
            FaceState::Idle
        };
        log::debug!("Face tool: completed {:?}", face);
        Ok(true)
    }
}

impl Default for FaceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Builder for FaceBuilder {
    fn name(&self) -> &'static str {
        "face"
    }

    fn process_click(&mut self, scene: &mut Scene, camera: &dyn ViewCamera, click: &Click) -> SceneResult<bool> {
        if matches!(self.state, FaceState::Chaining { .. }) && !click.shift() {
            self.state = FaceState::Idle;
        }

        match self.state {
            FaceState::Idle => {
                scene.deselect_all();
                if let Some(p1) = anchor_point(scene, camera, click, &[])? {
                    self.state = FaceState::OnePoint(p1);
                }
                Ok(false)
            }
            FaceState::OnePoint(p1) => {
                let Some(p2) = anchor_point(scene, camera, click, &[p1.key])? else {
                    return Ok(false);
                };
                match edge_between(scene, p1.key, p2.key) {
                    Ok(edge) => {
                        self.state = FaceState::TwoPoints { p1, p2, edge };
                        Ok(false)
                    }
                    Err(err) => {
                        discard_created(scene, p2)?;
                        Err(err)
                    }
                }
            }
            FaceState::TwoPoints { p1, p2, edge } => {
                let Some(pt) = anchor_point(scene, camera, click, &[p1.key, p2.key])? else {
                    return Ok(false);
                };
                let result = self.complete(scene, (p1.key, p2.key, edge.0), pt.key, click.shift());
                if result.is_err() {
                    discard_created(scene, pt)?;
                }
                result
            }
            FaceState::Chaining { p1, p2, edge } => {
                let Some(pt) = anchor_point(scene, camera, click, &[p1, p2])? else {
                    return Ok(false);
                };
                let result = self.complete(scene, (p1, p2, edge), pt.key, true);
                if result.is_err() {
                    discard_created(scene, pt)?;
                }
                result
            }
        }
    }

    fn cancel(&mut self, scene: &mut Scene) -> SceneResult<()> {
        match std::mem::replace(&mut self.state, FaceState::Idle) {
            FaceState::OnePoint(p1) => discard_created(scene, p1),
            FaceState::TwoPoints { p1, p2, edge: (edge, edge_created) } => {
                if edge_created {
                    discard(scene, edge)?;
                }
                discard_created(scene, p2)?;
                discard_created(scene, p1)
            }
            FaceState::Idle | FaceState::Chaining { .. } => Ok(()),
        }
    }

    fn has_any_progress(&self) -> bool {
        matches!(self.state, FaceState::OnePoint(_) | FaceState::TwoPoints { .. })
    }
}
