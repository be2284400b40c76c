//! Rect tool: two opposite corners make an axis-aligned box of points, edges
//! and triangular faces

use crate::foundation::math::{utils, Vec3};
use crate::render::ViewCamera;
use crate::scene::{ObjectKey, Scene, SceneError, SceneResult};

use super::{anchor_point, discard_all, discard_created, edge_between, face_between, Anchor, Builder, Click};

/// Corner triples of the twelve faces.
///
/// Corners are indexed `[p1, fbr, ftl, ftr, nbl, ntl, nbr, p2]`: far/near along
/// Z, bottom/top along Y, left/right along X, with `p1` the far bottom left and
/// `p2` the near top right corner.
const FACES: [[usize; 3]; 12] = [
    [1, 2, 3],
    [0, 1, 2],
    [0, 4, 5],
    [0, 5, 2],
    [0, 4, 1],
    [2, 3, 7],
    [2, 5, 7],
    [4, 7, 5],
    [4, 6, 7],
    [1, 4, 6],
    [1, 3, 6],
    [3, 7, 6],
];

/// Positions of the six generated corners between `p1` and `p2`
pub fn inner_corners(p1: Vec3, p2: Vec3) -> [Vec3; 6] {
    let dx = Vec3::new(p2.x - p1.x, 0.0, 0.0);
    let dy = Vec3::new(0.0, p2.y - p1.y, 0.0);
    let dz = Vec3::new(0.0, 0.0, p2.z - p1.z);

    let fbr = p1 + dx;
    let ftl = p1 + dy;
    let ftr = fbr + dy;
    let nbl = p1 + dz;
    let ntl = nbl + dy;
    let nbr = nbl + dx;
    [fbr, ftl, ftr, nbl, ntl, nbr]
}

/// Builds boxes from two corner clicks
#[derive(Debug, Default)]
pub struct RectBuilder {
    first: Option<Anchor>,
}

impl RectBuilder {
    /// Create the tool
    pub fn new() -> Self {
        Self { first: None }
    }

    fn position(scene: &Scene, key: ObjectKey) -> SceneResult<Vec3> {
        scene.get(key).map(|object| object.position()).ok_or(SceneError::MissingObject(key))
    }

    /// Build the box, recording every object it creates in `created`
    fn create_box(scene: &mut Scene, p1: ObjectKey, p2: ObjectKey, created: &mut Vec<ObjectKey>) -> SceneResult<()> {
        let digits = scene.config().coordinate_digits;
        let (from, to) = (Self::position(scene, p1)?, Self::position(scene, p2)?);

        let mut corners = Vec::with_capacity(8);
        corners.push(p1);
        for position in inner_corners(from, to) {
            let key = scene.create_point(utils::round_vec3(position, digits))?;
            created.push(key);
            scene.select(&[key]);
            corners.push(key);
        }
        corners.push(p2);

        let mut track = |(key, new): (ObjectKey, bool)| {
            if new {
                created.push(key);
            }
            key
        };
        for [i, j, k] in FACES {
            let (a, b, c) = (corners[i], corners[j], corners[k]);
            let face = track(face_between(scene, a, b, c)?);
            let ab = track(edge_between(scene, a, b)?);
            let bc = track(edge_between(scene, b, c)?);
            let ca = track(edge_between(scene, c, a)?);
            scene.add_parents(face, &[ab, bc, ca])?;
        }
        Ok(())
    }
}

impl Builder for RectBuilder {
    fn name(&self) -> &'static str {
        "rect"
    }

    fn process_click(&mut self, scene: &mut Scene, camera: &dyn ViewCamera, click: &Click) -> SceneResult<bool> {
        let taken: Vec<ObjectKey> = match self.first {
            None => {
                scene.deselect_all();
                Vec::new()
            }
            Some(first) => vec![first.key],
        };

        let Some(anchor) = anchor_point(scene, camera, click, &taken)? else {
            return Ok(false);
        };

        let Some(first) = self.first.take() else {
            self.first = Some(anchor);
            return Ok(false);
        };

        let mut created = Vec::new();
        if let Err(err) = Self::create_box(scene, first.key, anchor.key, &mut created) {
            log::error!("Rect tool: failed to build box: {}", err);
            discard_all(scene, &created)?;
            discard_created(scene, anchor)?;
            self.first = Some(first);
            return Err(err);
        }
        log::debug!("Rect tool: completed box {:?} -> {:?}", first.key, anchor.key);
        Ok(true)
    }

    fn cancel(&mut self, scene: &mut Scene) -> SceneResult<()> {
        match self.first.take() {
            Some(first) => discard_created(scene, first),
            None => Ok(()),
        }
    }

    fn has_any_progress(&self) -> bool {
        self.first.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_inner_corners() {
        let [fbr, ftl, ftr, nbl, ntl, nbr] = inner_corners(Vec3::zeros(), Vec3::new(1.0, 2.0, 3.0));
        assert_relative_eq!(fbr, Vec3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(ftl, Vec3::new(0.0, 2.0, 0.0));
        assert_relative_eq!(ftr, Vec3::new(1.0, 2.0, 0.0));
        assert_relative_eq!(nbl, Vec3::new(0.0, 0.0, 3.0));
        assert_relative_eq!(ntl, Vec3::new(0.0, 2.0, 3.0));
        assert_relative_eq!(nbr, Vec3::new(1.0, 0.0, 3.0));
    }

    #[test]
    fn test_faces_cover_eighteen_edges() {
        let mut edges = std::collections::HashSet::new();
        for [a, b, c] in FACES {
            for (x, y) in [(a, b), (b, c), (c, a)] {
                edges.insert((x.min(y), x.max(y)));
            }
        }
        assert_eq!(edges.len(), 18);
    }
}
