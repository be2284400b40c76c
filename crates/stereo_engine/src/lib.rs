//! # Stereo Engine
//!
//! Core of an interactive 3D stereometry editor: points, lines, planes,
//! segments and triangles linked in a dependency graph, picked with the mouse,
//! built with click-driven tools and drawn from pooled GPU vertex buffers.
//!
//! ## Features
//!
//! - **Dependency graph**: derived objects recompute when their defining points move
//! - **Picking**: screen-distance and ray-hit weighting with a 20 pixel radius
//! - **Construction tools**: point, line, edge, face, plane, box and edge division
//! - **Buffer arena**: thousands of small meshes drawn with one call per block
//! - **Scene files**: JSON with stable UUIDs and the camera pose
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use stereo_engine::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut scene = Scene::new(EditorConfig::default());
//!     let camera = Camera::default();
//!     let mut tools = ToolController::new();
//!
//!     tools.set_tool(&mut scene, Tool::Edge)?;
//!     tools.click(&mut scene, &camera, Vec2::new(600.0, 300.0), Modifiers::empty())?;
//!     tools.click(&mut scene, &camera, Vec2::new(700.0, 400.0), Modifiers::empty())?;
//!
//!     save_scene(&scene, camera.settings(), "scene.json")?;
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod config;
pub mod foundation;

pub mod geometry;
pub mod primitive;
pub mod render;
pub mod events;
pub mod scene;
pub mod picking;
pub mod builders;
pub mod serialization;

#[cfg(test)]
mod test_support;
#[cfg(test)]
mod tests;

/// Common imports for editor hosts
pub mod prelude {
    pub use crate::{
        builders::{Builder, Click, Tool, ToolController},
        core::config::EditorConfig,
        events::{ObjectHandle, SceneEvent, SceneObserver, SubscriptionToken},
        foundation::math::{Mat4, Quat, Transform, Vec2, Vec3, Vec4},
        geometry::{GeometryError, Line, Plane, Ray, Segment, Triangle},
        picking::{Modifiers, PickingSystem, SelectionMode},
        primitive::{Construction, ObjectId, Primitive, PrimitiveKind},
        render::{Camera, MeshArena, RenderMode, RenderQueue, ViewCamera},
        scene::{ObjectKey, Scene, SceneError, SceneObject, SelectionMask},
        serialization::{load_scene, save_scene, SerializationError},
    };
}
