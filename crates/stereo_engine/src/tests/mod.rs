//! Scenario tests driving the editor the way a host does: tools, clicks,
//! selection, files and vertex storage together

mod arena_scenarios;
mod scene_file_roundtrip;

use crate::foundation::math::Vec3;
use crate::picking::Modifiers;
use crate::builders::{Tool, ToolController};
use crate::scene::{ObjectKey, Scene};
use crate::test_support::OrthoCamera;

/// Click at the world position `(x, y, 0)` through the test camera
pub(crate) fn click_at(tools: &mut ToolController, scene: &mut Scene, x: f64, y: f64) -> bool {
    click_with(tools, scene, x, y, Modifiers::empty())
}

/// Same as [`click_at`] with modifiers held
pub(crate) fn click_with(tools: &mut ToolController, scene: &mut Scene, x: f64, y: f64, modifiers: Modifiers) -> bool {
    tools
        .click(scene, &OrthoCamera::new(), OrthoCamera::screen_of(x, y), modifiers)
        .expect("click")
}

/// Controller with `tool` active on an empty scene
pub(crate) fn start(tool: Tool) -> (ToolController, Scene) {
    let mut scene = Scene::default();
    let mut tools = ToolController::new();
    tools.set_tool(&mut scene, tool).expect("tool");
    (tools, scene)
}

/// Key of the point at a position
pub(crate) fn point_at(scene: &Scene, position: Vec3) -> Option<ObjectKey> {
    scene
        .objects()
        .find(|(_, object)| object.kind() == crate::primitive::PrimitiveKind::Point && (object.position() - position).norm() < 1e-9)
        .map(|(key, _)| key)
}
