//! # Render Queue
//!
//! Per-frame draw list built from a scene. Batched objects (points, edges,
//! faces) are drawn as one call per arena block; objects with their own mesh
//! (lines, planes) get one [`DrawCommand`] each.
//!
//! ## Ordering
//!
//! - Batches: faces, then edges, then points, so points stay visible on top
//! - Commands: unselected before selected, then by render layer, then the most
//!   recently added first

use crate::foundation::math::Mat4;
use crate::scene::{ObjectKey, ObjectMesh, Scene};

use super::{DrawBatch, RenderMode, ViewCamera};

/// Draw call for an object with its own vertex data
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCommand {
    /// Object to draw
    pub object: ObjectKey,
    /// Primitive topology
    pub mode: RenderMode,
    /// Draw-order bucket
    pub layer: i32,
    /// Whether the object is selected
    pub selected: bool,
    /// Projection * view * model
    pub matrix: Mat4,
}

/// Everything to draw for one frame, in submission order
#[derive(Debug, Clone, Default)]
pub struct RenderQueue {
    batches: Vec<DrawBatch>,
    commands: Vec<DrawCommand>,
}

impl RenderQueue {
    /// Collect the draw list for `scene` as seen from `camera`
    pub fn build(scene: &Scene, camera: &dyn ViewCamera) -> Self {
        let mut batches = scene.arena().batches();
        // Stable: blocks of the same topology keep allocation order
        batches.sort_by(|a, b| b.mode.cmp(&a.mode));

        let mut indexed: Vec<(usize, DrawCommand)> = scene
            .objects()
            .enumerate()
            .filter(|(_, (_, object))| matches!(object.mesh(), ObjectMesh::Unique(_)))
            .map(|(index, (key, object))| {
                let command = DrawCommand {
                    object: key,
                    mode: object.render_mode(),
                    layer: object.render_layer(),
                    selected: object.is_selected(),
                    matrix: object.render_matrix(camera),
                };
                (index, command)
            })
            .collect();
        indexed.sort_by(|(ia, a), (ib, b)| {
            a.selected
                .cmp(&b.selected)
                .then(a.layer.cmp(&b.layer))
                .then(ib.cmp(ia))
        });

        let commands: Vec<DrawCommand> = indexed.into_iter().map(|(_, command)| command).collect();
        log::trace!("Render queue: {} batches, {} commands", batches.len(), commands.len());
        Self { batches, commands }
    }

    /// Batched draws in submission order
    pub fn batches(&self) -> &[DrawBatch] {
        &self.batches
    }

    /// Per-object draws in submission order
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Total draw calls
    pub fn draw_count(&self) -> usize {
        self.batches.len() + self.commands.len()
    }

    /// Whether there is nothing to draw
    pub fn is_empty(&self) -> bool {
        self.batches.is_empty() && self.commands.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use crate::primitive::Construction;
    use crate::test_support::OrthoCamera;

    #[test]
    fn test_empty_scene_has_nothing_to_draw() {
        let scene = Scene::default();
        let queue = RenderQueue::build(&scene, &OrthoCamera::new());
        assert!(queue.is_empty());
        assert_eq!(queue.draw_count(), 0);
    }

    #[test]
    fn test_batches_draw_faces_before_points() {
        let mut scene = Scene::default();
        let a = scene.create_point(Vec3::zeros()).expect("point");
        let b = scene.create_point(Vec3::x()).expect("point");
        let c = scene.create_point(Vec3::y()).expect("point");
        let ids = [a, b, c].map(|key| scene.id_of(key).expect("id"));
        scene.create(Construction::Segment { a: ids[0], b: ids[1] }).expect("edge");
        scene.create(Construction::Triangle { a: ids[0], b: ids[1], c: ids[2] }).expect("face");

        let queue = RenderQueue::build(&scene, &OrthoCamera::new());
        let modes: Vec<RenderMode> = queue.batches().iter().map(|batch| batch.mode).collect();
        assert_eq!(modes, vec![RenderMode::Triangles, RenderMode::Lines, RenderMode::Points]);
        assert!(queue.commands().is_empty());
    }

    #[test]
    fn test_selected_lines_come_last_and_newest_first() {
        let mut scene = Scene::default();
        let a = scene.create_point(Vec3::zeros()).expect("point");
        let b = scene.create_point(Vec3::x()).expect("point");
        let c = scene.create_point(Vec3::y()).expect("point");
        let [ia, ib, ic] = [a, b, c].map(|key| scene.id_of(key).expect("id"));
        let first = scene.create(Construction::LineByTwoPoints { a: ia, b: ib }).expect("line");
        let second = scene.create(Construction::LineByTwoPoints { a: ia, b: ic }).expect("line");
        let third = scene.create(Construction::LineByTwoPoints { a: ib, b: ic }).expect("line");
        scene.select(&[second]);

        let queue = RenderQueue::build(&scene, &OrthoCamera::new());
        let order: Vec<ObjectKey> = queue.commands().iter().map(|command| command.object).collect();
        assert_eq!(order, vec![third, first, second]);
        assert!(queue.commands()[2].selected);
        assert!(queue.commands().iter().all(|command| command.mode == RenderMode::Lines));
    }
}
