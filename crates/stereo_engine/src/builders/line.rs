//! Line tool: two points make an infinite line

use crate::primitive::{Construction, PrimitiveKind};
use crate::render::ViewCamera;
use crate::scene::{Scene, SceneResult};

use super::{anchor_point, discard_created, ids_of, reuse_or_create, Anchor, Builder, Click};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineState {
    Idle,
    FirstPoint(Anchor),
}

/// Builds a line through two clicked points
#[derive(Debug)]
pub struct LineBuilder {
    state: LineState,
}

impl LineBuilder {
    /// Create the tool
    pub fn new() -> Self {
        Self { state: LineState::Idle }
    }
}

impl Default for LineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Builder for LineBuilder {
    fn name(&self) -> &'static str {
        "line"
    }

    fn process_click(&mut self, scene: &mut Scene, camera: &dyn ViewCamera, click: &Click) -> SceneResult<bool> {
        let taken = match self.state {
            LineState::Idle => {
                scene.deselect_all();
                Vec::new()
            }
            LineState::FirstPoint(first) => vec![first.key],
        };

        let Some(anchor) = anchor_point(scene, camera, click, &taken)? else {
            return Ok(false);
        };

        match self.state {
            LineState::Idle => {
                self.state = LineState::FirstPoint(anchor);
                log::debug!("Line tool: first point {:?}", anchor.key);
                Ok(false)
            }
            LineState::FirstPoint(first) => {
                let [a, b] = ids_of(scene, [first.key, anchor.key])?;
                let result = reuse_or_create(
                    scene,
                    &[first.key, anchor.key],
                    PrimitiveKind::Line,
                    Construction::LineByTwoPoints { a, b },
                );
                match result {
                    Ok((line, _)) => {
                        self.state = LineState::Idle;
                        log::debug!("Line tool: completed {:?}", line);
                        Ok(true)
                    }
                    Err(err) => {
                        discard_created(scene, anchor)?;
                        Err(err)
                    }
                }
            }
        }
    }

    fn cancel(&mut self, scene: &mut Scene) -> SceneResult<()> {
        if let LineState::FirstPoint(first) = std::mem::replace(&mut self.state, LineState::Idle) {
            discard_created(scene, first)?;
        }
        Ok(())
    }

    fn has_any_progress(&self) -> bool {
        self.state != LineState::Idle
    }
}
