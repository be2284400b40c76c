//! Primitive algebra
//!
//! Value types for resolved geometry (lines, planes, segments, triangles, rays)
//! and the intersection and distance tests the scene, picking and builders
//! depend on. Everything here is pure: no scene lookups, no side effects.
//!
//! Two tolerances are part of the observable contract:
//! - [`CONSTRUCTION_EPSILON`] (`1e-9`) decides construction validity, e.g. whether
//!   three points are collinear.
//! - [`EQUALITY_EPSILON`] (`1e-8`) decides numeric equality.

pub mod intersect;
pub mod shapes;

pub use intersect::{
    are_coplanar, closest_point_on_segment_to_ray, line_line_intersection, point_to_line_distance,
    point_to_segment_distance, pyramid_volume_sign, ray_plane_intersection_distance,
    ray_triangle_intersection_distance,
};
pub use shapes::{Line, Plane, Ray, Segment, Triangle};

use crate::primitive::{ObjectId, PrimitiveKind};

/// Tolerance for construction validity checks
pub const CONSTRUCTION_EPSILON: f64 = 1e-9;

/// Tolerance for numeric equality
pub const EQUALITY_EPSILON: f64 = 1e-8;

/// Tolerance used by the ray/triangle test
pub const RAY_EPSILON: f64 = 1e-5;

/// Geometry errors
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// The defining points do not span the requested shape
    #[error("Degenerate geometry: {0}")]
    Degenerate(String),

    /// A forming object id could not be resolved
    #[error("Unresolved reference to object {0}")]
    UnresolvedReference(ObjectId),

    /// A forming object resolved to the wrong kind of primitive
    #[error("Object {id} is a {found}, expected a {expected}")]
    WrongKind {
        /// Offending object
        id: ObjectId,
        /// Kind the construction needs
        expected: PrimitiveKind,
        /// Kind actually found
        found: PrimitiveKind,
    },
}

/// Result type for geometry operations
pub type GeometryResult<T> = Result<T, GeometryError>;

/// Numeric equality within [`EQUALITY_EPSILON`]
pub fn almost_equal(a: f64, b: f64) -> bool {
    (a - b).abs() < EQUALITY_EPSILON
}

/// Vector equality: squared distance within [`EQUALITY_EPSILON`]
pub fn almost_equal_vec(a: &crate::foundation::math::Vec3, b: &crate::foundation::math::Vec3) -> bool {
    (a - b).norm_squared() < EQUALITY_EPSILON
}
