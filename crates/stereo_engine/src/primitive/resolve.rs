//! Recursive evaluation of constructions into resolved geometry

use crate::foundation::math::Vec3;
use crate::geometry::{GeometryError, GeometryResult, Line, Plane, Segment, Triangle};

use super::{Construction, ObjectId, Primitive, PrimitiveKind};

/// Anything that can look primitives up by id
pub trait PrimitiveLookup {
    /// Find a primitive by id
    fn find_primitive(&self, id: ObjectId) -> Option<&Primitive>;
}

impl PrimitiveLookup for std::collections::HashMap<ObjectId, Primitive> {
    fn find_primitive(&self, id: ObjectId) -> Option<&Primitive> {
        self.get(&id)
    }
}

fn fetch<L: PrimitiveLookup + ?Sized>(lookup: &L, id: ObjectId, expected: PrimitiveKind) -> GeometryResult<&Primitive> {
    let primitive = lookup.find_primitive(id).ok_or(GeometryError::UnresolvedReference(id))?;
    if primitive.kind() != expected {
        return Err(GeometryError::WrongKind { id, expected, found: primitive.kind() });
    }
    Ok(primitive)
}

/// Position of a point primitive
pub fn point<L: PrimitiveLookup + ?Sized>(lookup: &L, id: ObjectId) -> GeometryResult<Vec3> {
    let primitive = fetch(lookup, id, PrimitiveKind::Point)?;
    primitive.position().ok_or(GeometryError::UnresolvedReference(id))
}

/// Resolved line for a line primitive
pub fn line<L: PrimitiveLookup + ?Sized>(lookup: &L, id: ObjectId) -> GeometryResult<Line> {
    line_of(lookup, fetch(lookup, id, PrimitiveKind::Line)?)
}

/// Resolved plane for a plane primitive
pub fn plane<L: PrimitiveLookup + ?Sized>(lookup: &L, id: ObjectId) -> GeometryResult<Plane> {
    plane_of(lookup, fetch(lookup, id, PrimitiveKind::Plane)?)
}

/// Resolved segment for a segment primitive
pub fn segment<L: PrimitiveLookup + ?Sized>(lookup: &L, id: ObjectId) -> GeometryResult<Segment> {
    segment_of(lookup, fetch(lookup, id, PrimitiveKind::Segment)?)
}

/// Line geometry of a line primitive already in hand
pub fn line_of<L: PrimitiveLookup + ?Sized>(lookup: &L, primitive: &Primitive) -> GeometryResult<Line> {
    match &primitive.construction {
        Construction::LineByTwoPoints { a, b } => Line::through(point(lookup, *a)?, point(lookup, *b)?),
        Construction::LineByPointAndLine { point: p, line: l } => {
            Ok(Line::parallel_through(point(lookup, *p)?, &line(lookup, *l)?))
        }
        _ => Err(GeometryError::WrongKind {
            id: primitive.id,
            expected: PrimitiveKind::Line,
            found: primitive.kind(),
        }),
    }
}

/// Plane geometry of a plane primitive already in hand
pub fn plane_of<L: PrimitiveLookup + ?Sized>(lookup: &L, primitive: &Primitive) -> GeometryResult<Plane> {
    match &primitive.construction {
        Construction::PlaneByThreePoints { a, b, c } => {
            Plane::from_points(point(lookup, *a)?, point(lookup, *b)?, point(lookup, *c)?)
        }
        Construction::PlaneByPointAndPlane { point: p, plane: reference } => {
            let origin = point(lookup, *p)?;
            let [d0, d1] = plane(lookup, *reference)?.directional_vectors();
            Plane::from_points(origin, origin + d0, origin + d1)
        }
        Construction::PlaneByPointAndLine { point: p, line: l } => {
            let [l0, l1] = line(lookup, *l)?.pivot_points();
            Plane::from_points(point(lookup, *p)?, l0, l1)
        }
        Construction::PlaneByPointAndSegment { point: p, segment: s } => {
            let s = segment(lookup, *s)?;
            Plane::from_points(point(lookup, *p)?, s.a, s.b)
        }
        _ => Err(GeometryError::WrongKind {
            id: primitive.id,
            expected: PrimitiveKind::Plane,
            found: primitive.kind(),
        }),
    }
}

/// Segment geometry of a segment primitive already in hand
pub fn segment_of<L: PrimitiveLookup + ?Sized>(lookup: &L, primitive: &Primitive) -> GeometryResult<Segment> {
    match &primitive.construction {
        Construction::Segment { a, b } => Ok(Segment::new(point(lookup, *a)?, point(lookup, *b)?)),
        _ => Err(GeometryError::WrongKind {
            id: primitive.id,
            expected: PrimitiveKind::Segment,
            found: primitive.kind(),
        }),
    }
}

/// Triangle geometry of a triangle primitive already in hand
pub fn triangle_of<L: PrimitiveLookup + ?Sized>(lookup: &L, primitive: &Primitive) -> GeometryResult<Triangle> {
    match &primitive.construction {
        Construction::Triangle { a, b, c } => {
            Ok(Triangle::new(point(lookup, *a)?, point(lookup, *b)?, point(lookup, *c)?))
        }
        _ => Err(GeometryError::WrongKind {
            id: primitive.id,
            expected: PrimitiveKind::Triangle,
            found: primitive.kind(),
        }),
    }
}

/// Pivot points of any primitive
pub fn pivot_points<L: PrimitiveLookup + ?Sized>(lookup: &L, primitive: &Primitive) -> GeometryResult<Vec<Vec3>> {
    Ok(match &primitive.construction {
        Construction::Point { position } => vec![*position],
        Construction::LineByTwoPoints { .. } | Construction::LineByPointAndLine { .. } => {
            line_of(lookup, primitive)?.pivot_points().to_vec()
        }
        Construction::PlaneByThreePoints { .. }
        | Construction::PlaneByPointAndPlane { .. }
        | Construction::PlaneByPointAndLine { .. }
        | Construction::PlaneByPointAndSegment { .. } => plane_of(lookup, primitive)?.pivot_points().to_vec(),
        Construction::Segment { .. } => {
            let s = segment_of(lookup, primitive)?;
            vec![s.a, s.b]
        }
        Construction::Triangle { .. } => triangle_of(lookup, primitive)?.points.to_vec(),
        Construction::Body { points } => points
            .iter()
            .map(|id| point(lookup, *id))
            .collect::<GeometryResult<Vec<_>>>()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::collections::HashMap;

    fn insert(table: &mut HashMap<ObjectId, Primitive>, construction: Construction) -> ObjectId {
        let primitive = Primitive::new(construction);
        let id = primitive.id;
        table.insert(id, primitive);
        id
    }

    fn point_at(table: &mut HashMap<ObjectId, Primitive>, x: f64, y: f64, z: f64) -> ObjectId {
        insert(table, Construction::Point { position: Vec3::new(x, y, z) })
    }

    #[test]
    fn test_line_by_point_and_line_shares_direction() {
        let mut table = HashMap::new();
        let a = point_at(&mut table, 0.0, 0.0, 0.0);
        let b = point_at(&mut table, 0.0, 2.0, 0.0);
        let p = point_at(&mut table, 5.0, 0.0, 0.0);
        let base = insert(&mut table, Construction::LineByTwoPoints { a, b });
        let parallel = insert(&mut table, Construction::LineByPointAndLine { point: p, line: base });

        let resolved = line(&table, parallel).expect("line");
        let [p0, p1] = resolved.pivot_points();
        assert_relative_eq!(p0, Vec3::new(5.0, 0.0, 0.0));
        assert_relative_eq!(p1, Vec3::new(5.0, 2.0, 0.0));
    }

    #[test]
    fn test_plane_by_point_and_plane_is_parallel() {
        let mut table = HashMap::new();
        let a = point_at(&mut table, 0.0, 0.0, 0.0);
        let b = point_at(&mut table, 1.0, 0.0, 0.0);
        let c = point_at(&mut table, 1.0, 1.0, 0.0);
        let p = point_at(&mut table, 0.0, 0.0, 3.0);
        let base = insert(&mut table, Construction::PlaneByThreePoints { a, b, c });
        let derived = insert(&mut table, Construction::PlaneByPointAndPlane { point: p, plane: base });

        let base = plane(&table, base).expect("plane");
        let derived = plane(&table, derived).expect("plane");
        assert!(base.is_parallel_to(&derived));
        assert!(derived.contains_point(Vec3::new(0.0, 0.0, 3.0)));
    }

    #[test]
    fn test_plane_by_point_on_its_line_is_degenerate() {
        let mut table = HashMap::new();
        let a = point_at(&mut table, 0.0, 0.0, 0.0);
        let b = point_at(&mut table, 1.0, 0.0, 0.0);
        let p = point_at(&mut table, 3.0, 0.0, 0.0);
        let l = insert(&mut table, Construction::LineByTwoPoints { a, b });
        let bad = insert(&mut table, Construction::PlaneByPointAndLine { point: p, line: l });
        assert!(matches!(plane(&table, bad), Err(GeometryError::Degenerate(_))));
    }

    #[test]
    fn test_wrong_kind_and_missing_reference() {
        let mut table = HashMap::new();
        let a = point_at(&mut table, 0.0, 0.0, 0.0);
        let missing = ObjectId::new();
        assert!(matches!(line(&table, a), Err(GeometryError::WrongKind { .. })));
        assert_eq!(point(&table, missing), Err(GeometryError::UnresolvedReference(missing)));
    }

    #[test]
    fn test_pivot_points_of_segment_follow_points() {
        let mut table = HashMap::new();
        let a = point_at(&mut table, 1.0, 0.0, 0.0);
        let b = point_at(&mut table, 2.0, 0.0, 0.0);
        let s = insert(&mut table, Construction::Segment { a, b });
        if let Some(primitive) = table.get_mut(&a) {
            primitive.construction = Construction::Point { position: Vec3::new(-1.0, 0.0, 0.0) };
        }
        let pivots = pivot_points(&table, &table[&s]).expect("segment");
        assert_relative_eq!(pivots[0], Vec3::new(-1.0, 0.0, 0.0));
    }
}
