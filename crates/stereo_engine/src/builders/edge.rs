//! Edge tool: two points make a segment; Shift keeps chaining from the last point

use crate::render::ViewCamera;
use crate::scene::{ObjectKey, Scene, SceneResult};

use super::{anchor_point, discard_created, edge_between, Anchor, Builder, Click};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EdgeState {
    Idle,
    /// First endpoint placed
    Started(Anchor),
    /// An edge was completed with Shift held; the next Shift click continues from here
    Chaining(ObjectKey),
}

/// Builds segments between clicked points
#[derive(Debug)]
pub struct EdgeBuilder {
    state: EdgeState,
}

impl EdgeBuilder {
    /// Create the tool
    pub fn new() -> Self {
        Self { state: EdgeState::Idle }
    }
}

impl Default for EdgeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Builder for EdgeBuilder {
    fn name(&self) -> &'static str {
        "edge"
    }

    fn process_click(&mut self, scene: &mut Scene, camera: &dyn ViewCamera, click: &Click) -> SceneResult<bool> {
        if matches!(self.state, EdgeState::Chaining(_)) && !click.shift() {
            self.state = EdgeState::Idle;
        }

        let (start, taken) = match self.state {
            EdgeState::Idle => {
                scene.deselect_all();
                (None, Vec::new())
            }
            EdgeState::Started(first) => (Some(first.key), vec![first.key]),
            EdgeState::Chaining(last) => (Some(last), vec![last]),
        };

        let Some(anchor) = anchor_point(scene, camera, click, &taken)? else {
            return Ok(false);
        };

        let Some(start) = start else {
            self.state = EdgeState::Started(anchor);
            log::debug!("Edge tool: first point {:?}", anchor.key);
            return Ok(false);
        };

        let (edge, _) = edge_between(scene, start, anchor.key)?;
        self.state = if click.shift() { EdgeState::Chaining(anchor.key) } else { EdgeState::Idle };
        log::debug!("Edge tool: completed {:?}", edge);
        Ok(true)
    }

    fn cancel(&mut self, scene: &mut Scene) -> SceneResult<()> {
        if let EdgeState::Started(first) = std::mem::replace(&mut self.state, EdgeState::Idle) {
            discard_created(scene, first)?;
        }
        Ok(())
    }

    fn has_any_progress(&self) -> bool {
        matches!(self.state, EdgeState::Started(_))
    }
}
