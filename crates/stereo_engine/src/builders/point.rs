//! Point tool: every click places one free point

use crate::render::ViewCamera;
use crate::scene::{Scene, SceneResult};

use super::{Builder, Click};

/// Places a point at the click's fallback position; never snaps
#[derive(Debug, Default)]
pub struct PointBuilder;

impl PointBuilder {
    /// Create the tool
    pub fn new() -> Self {
        Self
    }
}

impl Builder for PointBuilder {
    fn name(&self) -> &'static str {
        "point"
    }

    fn process_click(&mut self, scene: &mut Scene, _camera: &dyn ViewCamera, click: &Click) -> SceneResult<bool> {
        scene.deselect_all();
        let key = scene.create_point(click.world)?;
        scene.select(&[key]);
        log::debug!("Point tool placed {:?} at {:?}", key, click.world.as_slice());
        Ok(true)
    }

    fn cancel(&mut self, _scene: &mut Scene) -> SceneResult<()> {
        Ok(())
    }

    fn has_any_progress(&self) -> bool {
        false
    }
}
