//! Scene objects: a primitive plus transform, selection state, dependency
//! edges and render data

use bitflags::bitflags;
use slotmap::new_key_type;

use crate::foundation::math::{Mat4, Transform, Vec3, Vec4};
use crate::primitive::{ObjectId, Primitive, PrimitiveKind};
use crate::render::{RenderMode, ViewCamera, VirtualMesh};

new_key_type! {
    /// Key of an object in the scene table
    pub struct ObjectKey;
}

bitflags! {
    /// Which picking categories an object answers to
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SelectionMask: u32 {
        /// Free points
        const POINT = 0b0_0001;
        /// Infinite lines
        const LINE  = 0b0_0010;
        /// Infinite planes
        const PLANE = 0b0_0100;
        /// Segments
        const EDGE  = 0b0_1000;
        /// Triangles
        const FACE  = 0b1_0000;
    }
}

impl SelectionMask {
    /// Mask an object of `kind` is registered under; bodies are not pickable
    pub fn for_kind(kind: PrimitiveKind) -> Self {
        match kind {
            PrimitiveKind::Point => Self::POINT,
            PrimitiveKind::Line => Self::LINE,
            PrimitiveKind::Plane => Self::PLANE,
            PrimitiveKind::Segment => Self::EDGE,
            PrimitiveKind::Triangle => Self::FACE,
            PrimitiveKind::Body => Self::empty(),
        }
    }
}

/// Vertex data owned by a single object
#[derive(Debug, Clone, PartialEq)]
pub struct LocalMesh {
    /// Positions relative to the object's translation
    pub positions: Vec<Vec3>,
    /// One color per vertex
    pub colors: Vec<Vec4>,
}

/// Where an object's vertices live
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectMesh {
    /// World-space vertices leased from the arena, drawn in batches
    Shared(VirtualMesh),
    /// Local vertices drawn with the object's own model matrix
    Unique(LocalMesh),
}

/// Node of the scene graph
///
/// Edges are keys into the owning scene table: `children` are the objects
/// derived from this one, `parents` the objects it was derived from.
#[derive(Debug, Clone)]
pub struct SceneObject {
    pub(crate) primitive: Primitive,
    pub(crate) transform: Transform,
    pub(crate) selected: bool,
    pub(crate) selection_mask: SelectionMask,
    pub(crate) render_mode: RenderMode,
    pub(crate) render_layer: i32,
    pub(crate) parents: Vec<ObjectKey>,
    pub(crate) children: Vec<ObjectKey>,
    pub(crate) mesh: ObjectMesh,
}

impl SceneObject {
    /// Persistent id, shared with the primitive
    pub fn id(&self) -> ObjectId {
        self.primitive.id
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.primitive.name
    }

    /// Primitive kind
    pub fn kind(&self) -> PrimitiveKind {
        self.primitive.kind()
    }

    /// Wrapped primitive
    pub fn primitive(&self) -> &Primitive {
        &self.primitive
    }

    /// Spatial transform; the translation is the object's reference position
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Reference position
    pub fn position(&self) -> Vec3 {
        self.transform.translation
    }

    /// Whether the object is in the scene's selection
    pub fn is_selected(&self) -> bool {
        self.selected
    }

    /// Picking categories
    pub fn selection_mask(&self) -> SelectionMask {
        self.selection_mask
    }

    /// Draw topology
    pub fn render_mode(&self) -> RenderMode {
        self.render_mode
    }

    /// Draw-order bucket
    pub fn render_layer(&self) -> i32 {
        self.render_layer
    }

    /// Objects this one is derived from
    pub fn parents(&self) -> &[ObjectKey] {
        &self.parents
    }

    /// Objects derived from this one
    pub fn children(&self) -> &[ObjectKey] {
        &self.children
    }

    /// Vertex storage
    pub fn mesh(&self) -> &ObjectMesh {
        &self.mesh
    }

    /// Matrix the renderer should use for this object's mesh
    pub fn render_matrix(&self, camera: &dyn ViewCamera) -> Mat4 {
        match self.mesh {
            ObjectMesh::Shared(_) => camera.proj_view_matrix(),
            ObjectMesh::Unique(_) => camera.proj_view_matrix() * self.transform.to_matrix(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_masks_are_distinct_per_pickable_kind() {
        let masks: Vec<_> = PrimitiveKind::ALL.iter().map(|k| SelectionMask::for_kind(*k)).collect();
        for (i, a) in masks.iter().enumerate() {
            for b in &masks[i + 1..] {
                assert!((*a & *b).is_empty());
            }
        }
        assert!(SelectionMask::for_kind(PrimitiveKind::Body).is_empty());
    }
}
