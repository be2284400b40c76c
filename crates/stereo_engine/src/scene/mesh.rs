//! Per-kind mesh generation
//!
//! Points, edges and faces are small, numerous and drawn in world space, so
//! they lease arena storage. Lines and planes are drawn as a long segment and
//! an enlarged triangle around their reference position and keep their own
//! local vertices.

use crate::core::DisplayConfig;
use crate::foundation::math::{Vec3, Vec4};
use crate::geometry::{GeometryError, GeometryResult, Plane, Triangle};
use crate::primitive::{resolve, Primitive, PrimitiveKind, PrimitiveLookup};
use crate::render::RenderMode;

/// Color of points, lines and edges
pub const LINE_COLOR: [f64; 4] = [0.0, 0.0, 0.0, 1.0];

/// Color of planes
pub const PLANE_COLOR: [f64; 4] = [137.0 / 256.0, 143.0 / 256.0, 141.0 / 256.0, 0.7];

/// Color of faces
pub const FACE_COLOR: [f64; 4] = [137.0 / 256.0, 143.0 / 256.0, 141.0 / 256.0, 1.0];

/// Highlight of selected objects; planes keep their translucency
pub const SELECTED_COLOR: [f64; 4] = [0.95, 0.55, 0.1, 1.0];

/// Resolved vertex data for one object
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct MeshGeometry {
    /// World positions for shared meshes, offsets from `translation` otherwise
    pub positions: Vec<Vec3>,
    /// Reference position of the object
    pub translation: Vec3,
}

/// Draw topology of a kind
pub fn render_mode(kind: PrimitiveKind) -> RenderMode {
    match kind {
        PrimitiveKind::Point | PrimitiveKind::Body => RenderMode::Points,
        PrimitiveKind::Line | PrimitiveKind::Segment => RenderMode::Lines,
        PrimitiveKind::Plane | PrimitiveKind::Triangle => RenderMode::Triangles,
    }
}

/// Whether objects of a kind lease arena storage
pub fn uses_shared_mesh(kind: PrimitiveKind) -> bool {
    matches!(kind, PrimitiveKind::Point | PrimitiveKind::Segment | PrimitiveKind::Triangle)
}

/// Vertex color of an object
pub fn color(kind: PrimitiveKind, selected: bool) -> Vec4 {
    let [r, g, b, a] = match (kind, selected) {
        (PrimitiveKind::Plane, true) => [SELECTED_COLOR[0], SELECTED_COLOR[1], SELECTED_COLOR[2], PLANE_COLOR[3]],
        (_, true) => SELECTED_COLOR,
        (PrimitiveKind::Plane, false) => PLANE_COLOR,
        (PrimitiveKind::Triangle, false) => FACE_COLOR,
        _ => LINE_COLOR,
    };
    Vec4::new(r, g, b, a)
}

/// The triangle a plane is drawn (and picked) as: its pivots scaled about the center
pub fn plane_display_triangle(plane: &Plane, extent: f64) -> Triangle {
    let center = plane.center();
    let [a, b, c] = plane.pivot_points().map(|p| center + (p - center) * extent);
    Triangle::new(a, b, c)
}

/// Resolve an object's vertices from the current state of its forming objects
pub(crate) fn build_geometry<L: PrimitiveLookup + ?Sized>(
    lookup: &L,
    primitive: &Primitive,
    display: &DisplayConfig,
) -> GeometryResult<MeshGeometry> {
    Ok(match primitive.kind() {
        PrimitiveKind::Point => {
            let p = primitive.position().ok_or(GeometryError::UnresolvedReference(primitive.id))?;
            MeshGeometry { positions: vec![p], translation: p }
        }
        PrimitiveKind::Segment => {
            let segment = resolve::segment_of(lookup, primitive)?;
            MeshGeometry { positions: vec![segment.a, segment.b], translation: segment.midpoint() }
        }
        PrimitiveKind::Triangle => {
            let triangle = resolve::triangle_of(lookup, primitive)?;
            MeshGeometry { positions: triangle.points.to_vec(), translation: triangle.centroid() }
        }
        PrimitiveKind::Line => {
            let line = resolve::line_of(lookup, primitive)?;
            let half = line.directional_vector().normalize() * display.line_extent;
            MeshGeometry { positions: vec![-half, half], translation: line.origin }
        }
        PrimitiveKind::Plane => {
            let plane = resolve::plane_of(lookup, primitive)?;
            let center = plane.center();
            let triangle = plane_display_triangle(&plane, display.plane_extent);
            MeshGeometry { positions: triangle.points.iter().map(|p| p - center).collect(), translation: center }
        }
        PrimitiveKind::Body => {
            let points = resolve::pivot_points(lookup, primitive)?;
            let center = if points.is_empty() {
                Vec3::zeros()
            } else {
                points.iter().sum::<Vec3>() / points.len() as f64
            };
            MeshGeometry { positions: points.iter().map(|p| p - center).collect(), translation: center }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitive::{Construction, ObjectId};
    use approx::assert_relative_eq;
    use std::collections::HashMap;

    fn add(table: &mut HashMap<ObjectId, Primitive>, construction: Construction) -> ObjectId {
        let primitive = Primitive::new(construction);
        let id = primitive.id;
        table.insert(id, primitive);
        id
    }

    #[test]
    fn test_line_is_drawn_around_its_origin() {
        let mut table = HashMap::new();
        let a = add(&mut table, Construction::Point { position: Vec3::new(1.0, 1.0, 0.0) });
        let b = add(&mut table, Construction::Point { position: Vec3::new(1.0, 3.0, 0.0) });
        let line = add(&mut table, Construction::LineByTwoPoints { a, b });
        let display = DisplayConfig::default();

        let mesh = build_geometry(&table, &table[&line], &display).expect("line");
        assert_relative_eq!(mesh.translation, Vec3::new(1.0, 1.0, 0.0));
        assert_relative_eq!(mesh.positions[1], Vec3::new(0.0, display.line_extent, 0.0));
    }

    #[test]
    fn test_plane_triangle_is_scaled_about_center() {
        let plane = Plane::from_points(Vec3::zeros(), Vec3::new(3.0, 0.0, 0.0), Vec3::new(0.0, 3.0, 0.0))
            .expect("plane");
        let triangle = plane_display_triangle(&plane, 2.0);
        assert_relative_eq!(triangle.centroid(), plane.center(), epsilon = 1e-12);
        assert_relative_eq!(triangle.points[1], Vec3::new(5.0, -1.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_selected_plane_keeps_alpha() {
        assert_relative_eq!(color(PrimitiveKind::Plane, true).w, PLANE_COLOR[3]);
        assert_eq!(color(PrimitiveKind::Segment, false), Vec4::from(LINE_COLOR));
        assert_eq!(color(PrimitiveKind::Triangle, true), Vec4::from(SELECTED_COLOR));
    }
}
