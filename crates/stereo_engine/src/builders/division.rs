//! Division tool
//!
//! Pick a point, then an edge: the edge is split where it passes closest to
//! the click ray. The two halves replace it, a connecting edge joins the picked
//! point to the split point, and every face bordering the edge is split in two
//! through its opposite corner.
//!
//! With Shift held the picked point stays active for further divisions.

use crate::foundation::math::{utils, Vec3};
use crate::geometry::GeometryError;
use crate::primitive::{resolve, Construction, PrimitiveKind};
use crate::render::ViewCamera;
use crate::scene::{ObjectKey, Scene, SceneError, SceneResult, SelectionMask};

use super::{discard_all, edge_between, ids_of, Builder, Click};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DivisionState {
    Idle,
    PointChosen(ObjectKey),
    /// A division was completed; Shift clicks keep dividing from this point
    Chaining(ObjectKey),
}

/// Splits edges and their faces
#[derive(Debug)]
pub struct DivisionBuilder {
    state: DivisionState,
}

impl DivisionBuilder {
    /// Create the tool
    pub fn new() -> Self {
        Self { state: DivisionState::Idle }
    }

    fn endpoints(scene: &Scene, edge: ObjectKey) -> SceneResult<(ObjectKey, ObjectKey)> {
        let object = scene.get(edge).ok_or(SceneError::MissingObject(edge))?;
        let Construction::Segment { a, b } = object.primitive().construction else {
            return Err(GeometryError::WrongKind {
                id: object.id(),
                expected: PrimitiveKind::Segment,
                found: object.kind(),
            }
            .into());
        };
        let a = scene.key_of(a).ok_or(SceneError::UnknownId(a))?;
        let b = scene.key_of(b).ok_or(SceneError::UnknownId(b))?;
        Ok((a, b))
    }

    /// Faces over both `a` and `b`, with their third corner
    fn adjacent_faces(scene: &Scene, a: ObjectKey, b: ObjectKey) -> Vec<(ObjectKey, ObjectKey)> {
        let mut faces = Vec::new();
        for &face in scene.children(a) {
            let Some(object) = scene.get(face) else { continue };
            if object.kind() != PrimitiveKind::Triangle || !scene.parents(face).contains(&b) {
                continue;
            }
            let Construction::Triangle { a: i, b: j, c: k } = object.primitive().construction else {
                continue;
            };
            let opposite = [i, j, k]
                .into_iter()
                .filter_map(|id| scene.key_of(id))
                .find(|key| *key != a && *key != b);
            if let Some(opposite) = opposite {
                faces.push((face, opposite));
            }
        }
        faces
    }

    /// Create the division point, both halves, the connecting edges and the
    /// split faces. Everything new is recorded in `created`.
    fn split(
        scene: &mut Scene,
        p: ObjectKey,
        (a, b): (ObjectKey, ObjectKey),
        opposites: &[ObjectKey],
        division: Vec3,
        created: &mut Vec<ObjectKey>,
    ) -> SceneResult<()> {
        let div = scene.create_point(division)?;
        created.push(div);
        scene.select(&[div]);
        let [ia, ib, idiv] = ids_of(scene, [a, b, div])?;
        let edge1 = scene.create(Construction::Segment { a: ia, b: idiv })?;
        created.push(edge1);
        let edge2 = scene.create(Construction::Segment { a: ib, b: idiv })?;
        created.push(edge2);
        let (to_point, new) = edge_between(scene, p, div)?;
        if new {
            created.push(to_point);
        }

        for &q in opposites {
            let (connecting, new) = edge_between(scene, q, div)?;
            if new {
                created.push(connecting);
            }
            let [iq] = ids_of(scene, [q])?;
            for (end, end_id, half) in [(a, ia, edge1), (b, ib, edge2)] {
                let face = scene.create(Construction::Triangle { a: end_id, b: idiv, c: iq })?;
                created.push(face);
                let mut parents = vec![half, connecting];
                parents.extend(scene.common_child(&[q, end], PrimitiveKind::Segment));
                scene.add_parents(face, &parents)?;
            }
        }
        Ok(())
    }

    fn divide(scene: &mut Scene, camera: &dyn ViewCamera, click: &Click, p: ObjectKey, edge: ObjectKey) -> SceneResult<bool> {
        if scene.parents(edge).contains(&p) {
            return Ok(false);
        }
        let (a, b) = Self::endpoints(scene, edge)?;

        let lookup: &Scene = scene;
        let primitive = lookup.get(edge).ok_or(SceneError::MissingObject(edge))?.primitive();
        let segment = resolve::segment_of(lookup, primitive)?;
        let Some(raw) = segment.closest_point_to_ray(&camera.ray_through(click.screen)) else {
            log::debug!("Division tool: click ray is parallel to {:?}", edge);
            return Ok(false);
        };
        let division = utils::round_vec3(raw, scene.config().coordinate_digits);

        let faces = Self::adjacent_faces(scene, a, b);
        let mut opposites: Vec<ObjectKey> = Vec::new();
        for (_, q) in &faces {
            if !opposites.contains(q) {
                opposites.push(*q);
            }
        }

        let mut created = Vec::new();
        if let Err(err) = Self::split(scene, p, (a, b), &opposites, division, &mut created) {
            log::error!("Division tool: failed to split {:?}: {}", edge, err);
            discard_all(scene, &created)?;
            return Err(err);
        }

        let mut replaced = vec![edge];
        replaced.extend(faces.iter().map(|(face, _)| *face));
        scene.remove_objects(&replaced)?;

        log::debug!("Division tool: split {:?} at {:?}", edge, division.as_slice());
        Ok(true)
    }
}

impl Default for DivisionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Builder for DivisionBuilder {
    fn name(&self) -> &'static str {
        "division"
    }

    fn process_click(&mut self, scene: &mut Scene, camera: &dyn ViewCamera, click: &Click) -> SceneResult<bool> {
        if matches!(self.state, DivisionState::Chaining(_)) && !click.shift() {
            self.state = DivisionState::Idle;
        }

        match self.state {
            DivisionState::Idle => {
                scene.deselect_all();
                if let Some(p) = scene.find_selectable(camera, click.screen, SelectionMask::POINT, true) {
                    scene.select(&[p]);
                    self.state = DivisionState::PointChosen(p);
                }
                Ok(false)
            }
            DivisionState::PointChosen(p) | DivisionState::Chaining(p) => {
                let Some(edge) = scene.find_selectable(camera, click.screen, SelectionMask::EDGE, true) else {
                    return Ok(false);
                };
                let done = Self::divide(scene, camera, click, p, edge)?;
                if done {
                    self.state = DivisionState::Chaining(p);
                }
                Ok(done)
            }
        }
    }

    fn cancel(&mut self, scene: &mut Scene) -> SceneResult<()> {
        if let DivisionState::PointChosen(p) = std::mem::replace(&mut self.state, DivisionState::Idle) {
            scene.deselect(&[p]);
        }
        Ok(())
    }

    fn has_any_progress(&self) -> bool {
        matches!(self.state, DivisionState::PointChosen(_))
    }
}
