//! Active tool dispatch
//!
//! The host forwards clicks and Escape presses here. The controller turns a
//! click into a [`Click`] (computing the fallback position for unsnapped
//! points) and hands it to the active builder, or to the [`PickingSystem`]
//! when the selection tool is active.

use std::fmt;

use crate::foundation::math::{utils, Vec2, Vec3};
use crate::picking::{Modifiers, PickingSystem};
use crate::render::ViewCamera;
use crate::scene::{Scene, SceneResult};

use super::{
    Builder, Click, DivisionBuilder, EdgeBuilder, FaceBuilder, LineBuilder, PlaneBuilder, PointBuilder, RectBuilder,
};

/// Editor tools
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Tool {
    /// Click selection
    #[default]
    Select,
    /// Free points
    Point,
    /// Lines through two points
    Line,
    /// Segments
    Edge,
    /// Triangles
    Face,
    /// Planes
    Plane,
    /// Boxes
    Rect,
    /// Edge division
    Division,
}

impl Tool {
    /// Every tool, in toolbar order
    pub const ALL: [Tool; 8] = [
        Tool::Select,
        Tool::Point,
        Tool::Line,
        Tool::Edge,
        Tool::Face,
        Tool::Plane,
        Tool::Rect,
        Tool::Division,
    ];

    fn builder(self) -> Option<Box<dyn Builder>> {
        match self {
            Tool::Select => None,
            Tool::Point => Some(Box::new(PointBuilder::new())),
            Tool::Line => Some(Box::new(LineBuilder::new())),
            Tool::Edge => Some(Box::new(EdgeBuilder::new())),
            Tool::Face => Some(Box::new(FaceBuilder::new())),
            Tool::Plane => Some(Box::new(PlaneBuilder::new())),
            Tool::Rect => Some(Box::new(RectBuilder::new())),
            Tool::Division => Some(Box::new(DivisionBuilder::new())),
        }
    }
}

/// Owns the active builder and routes input to it
pub struct ToolController {
    tool: Tool,
    builder: Option<Box<dyn Builder>>,
    picking: PickingSystem,
}

impl ToolController {
    /// Start with the selection tool
    pub fn new() -> Self {
        Self {
            tool: Tool::Select,
            builder: None,
            picking: PickingSystem::new(),
        }
    }

    /// Active tool
    pub fn tool(&self) -> Tool {
        self.tool
    }

    /// Selection picker used by [`Tool::Select`]
    pub fn picking(&self) -> &PickingSystem {
        &self.picking
    }

    /// Mutable selection picker, e.g. to restrict its mask
    pub fn picking_mut(&mut self) -> &mut PickingSystem {
        &mut self.picking
    }

    /// Switch tools; the unfinished work of the previous builder is cancelled
    pub fn set_tool(&mut self, scene: &mut Scene, tool: Tool) -> SceneResult<()> {
        if let Some(builder) = self.builder.as_mut() {
            builder.cancel(scene)?;
        }
        log::info!("Switching tool {:?} -> {:?}", self.tool, tool);
        self.tool = tool;
        self.builder = tool.builder();
        Ok(())
    }

    /// Where a point placed at `screen` lands when nothing is snapped
    pub fn fallback_position(scene: &Scene, camera: &dyn ViewCamera, screen: Vec2) -> Vec3 {
        let config = scene.config();
        let ray = camera.ray_through(screen);
        utils::round_vec3(ray.at(config.click_depth), config.coordinate_digits)
    }

    /// Handle a left click; returns whether it completed a shape
    pub fn click(&mut self, scene: &mut Scene, camera: &dyn ViewCamera, screen: Vec2, modifiers: Modifiers) -> SceneResult<bool> {
        let Some(builder) = self.builder.as_mut() else {
            self.picking.click(scene, camera, screen, modifiers);
            return Ok(false);
        };
        let click = Click::new(screen, Self::fallback_position(scene, camera, screen)).with_modifiers(modifiers);
        builder.process_click(scene, camera, &click)
    }

    /// Escape: cancel the shape in progress, or clear the selection when
    /// nothing is in progress
    pub fn escape(&mut self, scene: &mut Scene) -> SceneResult<()> {
        match self.builder.as_mut() {
            Some(builder) if builder.has_any_progress() => {
                log::debug!("Cancelling {} tool", builder.name());
                builder.cancel(scene)
            }
            _ => {
                scene.deselect_all();
                Ok(())
            }
        }
    }

    /// Whether the active builder has a shape in progress
    pub fn has_any_progress(&self) -> bool {
        self.builder.as_ref().map_or(false, |builder| builder.has_any_progress())
    }
}

impl Default for ToolController {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ToolController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolController")
            .field("tool", &self.tool)
            .field("in_progress", &self.has_any_progress())
            .finish()
    }
}
