//! Resolved geometric values

use crate::foundation::math::Vec3;

use super::intersect::{closest_point_on_segment_to_ray, line_line_intersection, ray_plane_intersection_distance};
use super::{GeometryError, GeometryResult, CONSTRUCTION_EPSILON};

/// A half-line `origin + t * direction`, `t >= 0`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Start of the ray
    pub origin: Vec3,
    /// Unit direction
    pub direction: Vec3,
}

impl Ray {
    /// Create a ray, normalizing the direction
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction: direction.normalize() }
    }

    /// Point at distance `t` along the ray
    pub fn at(&self, t: f64) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// An infinite line through two pivot points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line {
    /// First pivot point
    pub origin: Vec3,
    /// Directional vector; the second pivot is `origin + direction`
    pub direction: Vec3,
}

impl Line {
    /// Line through two distinct points
    pub fn through(p1: Vec3, p2: Vec3) -> GeometryResult<Self> {
        let direction = p2 - p1;
        if direction.norm() < CONSTRUCTION_EPSILON {
            return Err(GeometryError::Degenerate("line pivots coincide".to_string()));
        }
        Ok(Self { origin: p1, direction })
    }

    /// Line through `point` parallel to `other`
    pub fn parallel_through(point: Vec3, other: &Line) -> Self {
        Self { origin: point, direction: other.direction }
    }

    /// The two pivot points
    pub fn pivot_points(&self) -> [Vec3; 2] {
        [self.origin, self.origin + self.direction]
    }

    /// Directional vector
    pub fn directional_vector(&self) -> Vec3 {
        self.direction
    }

    /// Intersection point with another line, if they meet
    pub fn intersection_with_line(&self, other: &Line) -> Option<Vec3> {
        line_line_intersection(self.origin, self.direction, other.origin, other.direction)
    }

    /// Whether both lines have collinear directions
    pub fn is_parallel_to(&self, other: &Line) -> bool {
        self.direction.cross(&other.direction).norm() < CONSTRUCTION_EPSILON
    }
}

/// A plane spanned by three non-collinear pivot points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pivots: [Vec3; 3],
}

impl Plane {
    /// Plane through three points; fails when they are collinear
    pub fn from_points(p1: Vec3, p2: Vec3, p3: Vec3) -> GeometryResult<Self> {
        if Self::are_collinear(p1, p2, p3) {
            return Err(GeometryError::Degenerate(format!(
                "points {:?}, {:?}, {:?} are collinear",
                p1.as_slice(), p2.as_slice(), p3.as_slice()
            )));
        }
        Ok(Self { pivots: [p1, p2, p3] })
    }

    /// Collinearity test used for construction validity
    pub fn are_collinear(p1: Vec3, p2: Vec3, p3: Vec3) -> bool {
        (p2 - p1).cross(&(p3 - p1)).norm() < CONSTRUCTION_EPSILON
    }

    /// The three pivot points
    pub fn pivot_points(&self) -> [Vec3; 3] {
        self.pivots
    }

    /// Directional vectors `(p2 - p1, p3 - p2)`
    pub fn directional_vectors(&self) -> [Vec3; 2] {
        let [p1, p2, p3] = self.pivots;
        [p2 - p1, p3 - p2]
    }

    /// Unit normal
    pub fn normal(&self) -> Vec3 {
        let [d1, d2] = self.directional_vectors();
        d1.cross(&d2).normalize()
    }

    /// Centroid of the pivot points
    pub fn center(&self) -> Vec3 {
        let [p1, p2, p3] = self.pivots;
        (p1 + p2 + p3) / 3.0
    }

    /// Whether the normals of both planes are collinear
    pub fn is_parallel_to(&self, other: &Plane) -> bool {
        (self.normal().dot(&other.normal()).abs() - 1.0).abs() < CONSTRUCTION_EPSILON
    }

    /// Whether `point` lies in the plane
    pub fn contains_point(&self, point: Vec3) -> bool {
        (point - self.pivots[0]).dot(&self.normal()).abs() < CONSTRUCTION_EPSILON
    }

    /// Intersection with a line; `None` when the line is parallel to the plane
    pub fn intersection_with_line(&self, line: &Line) -> Option<Vec3> {
        let t = ray_plane_intersection_distance(line.origin, line.direction, self.pivots[0], self.normal());
        t.is_finite().then(|| line.origin + line.direction * t)
    }

    /// Line along which two planes meet; `None` for parallel planes
    pub fn intersection_with_plane(&self, other: &Plane) -> Option<Line> {
        let direction = self.normal().cross(&other.normal());
        if direction.norm() < CONSTRUCTION_EPSILON {
            return None;
        }
        // A line in this plane that is not parallel to the other plane
        let [d1, d2] = self.directional_vectors();
        let in_plane = if d1.dot(&other.normal()).abs() > d2.dot(&other.normal()).abs() { d1 } else { d2 };
        let probe = Line { origin: self.pivots[0], direction: in_plane };
        let origin = other.intersection_with_line(&probe)?;
        Some(Line { origin, direction })
    }
}

/// A segment between two points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    /// First endpoint
    pub a: Vec3,
    /// Second endpoint
    pub b: Vec3,
}

impl Segment {
    /// Create a segment
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self { a, b }
    }

    /// Vector from `a` to `b`
    pub fn vector(&self) -> Vec3 {
        self.b - self.a
    }

    /// Midpoint
    pub fn midpoint(&self) -> Vec3 {
        (self.a + self.b) / 2.0
    }

    /// Supporting line; fails for a zero-length segment
    pub fn line(&self) -> GeometryResult<Line> {
        Line::through(self.a, self.b)
    }

    /// Intersection with a line, only if it falls within the segment
    pub fn intersection_with_line(&self, line: &Line) -> Option<Vec3> {
        let intersection = self.line().ok()?.intersection_with_line(line)?;
        let offset = intersection - self.a;
        let vector = self.vector();
        if offset.dot(&vector) < -CONSTRUCTION_EPSILON || offset.norm() > vector.norm() + CONSTRUCTION_EPSILON {
            return None;
        }
        Some(intersection)
    }

    /// Intersection with another segment
    pub fn intersection_with_segment(&self, other: &Segment) -> Option<Vec3> {
        let hit = self.intersection_with_line(&other.line().ok()?)?;
        other.intersection_with_line(&self.line().ok()?).map(|_| hit)
    }

    /// Closest point on the segment to a ray
    pub fn closest_point_to_ray(&self, ray: &Ray) -> Option<Vec3> {
        closest_point_on_segment_to_ray(self.a, self.b, ray.origin, ray.direction)
    }
}

/// A triangle; may be degenerate (zero area) without error
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    /// Corners in construction order
    pub points: [Vec3; 3],
}

impl Triangle {
    /// Create a triangle
    pub fn new(a: Vec3, b: Vec3, c: Vec3) -> Self {
        Self { points: [a, b, c] }
    }

    /// Centroid
    pub fn centroid(&self) -> Vec3 {
        let [a, b, c] = self.points;
        (a + b + c) / 3.0
    }

    /// Distance along `ray` to the triangle, NaN on a miss
    pub fn ray_distance(&self, ray: &Ray) -> f64 {
        let [a, b, c] = self.points;
        super::ray_triangle_intersection_distance(ray.origin, ray.direction, a, b, c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_plane_from_collinear_points_is_degenerate() {
        let result = Plane::from_points(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0), Vec3::new(2.0, 2.0, 2.0));
        assert!(matches!(result, Err(GeometryError::Degenerate(_))));
    }

    #[test]
    fn test_plane_accepts_barely_non_collinear_points() {
        // |cross| = 1e-8 which is above the 1e-9 threshold
        let result = Plane::from_points(Vec3::zeros(), Vec3::x(), Vec3::new(2.0, 1e-8, 0.0));
        assert!(result.is_ok());
        let too_close = Plane::from_points(Vec3::zeros(), Vec3::x(), Vec3::new(2.0, 1e-10, 0.0));
        assert!(too_close.is_err());
    }

    #[test]
    fn test_plane_vectors_and_normal() {
        let plane = Plane::from_points(Vec3::zeros(), Vec3::x(), Vec3::new(1.0, 1.0, 0.0)).expect("plane");
        let [d1, d2] = plane.directional_vectors();
        assert_relative_eq!(d1, Vec3::x());
        assert_relative_eq!(d2, Vec3::y());
        assert_relative_eq!(plane.normal(), Vec3::z());
    }

    #[test]
    fn test_parallel_planes() {
        let a = Plane::from_points(Vec3::zeros(), Vec3::x(), Vec3::y()).expect("plane");
        let b = Plane::from_points(Vec3::z(), Vec3::z() + Vec3::y(), Vec3::z() + Vec3::x()).expect("plane");
        let c = Plane::from_points(Vec3::zeros(), Vec3::x(), Vec3::z()).expect("plane");
        assert!(a.is_parallel_to(&b));
        assert!(!a.is_parallel_to(&c));
        let meet = a.intersection_with_plane(&c).expect("planes meet");
        assert!(a.contains_point(meet.origin) && c.contains_point(meet.origin));
        assert!(a.intersection_with_plane(&b).is_none());
    }

    #[test]
    fn test_segment_intersection_respects_bounds() {
        let segment = Segment::new(Vec3::zeros(), Vec3::new(2.0, 0.0, 0.0));
        let inside = Line::through(Vec3::new(1.0, -1.0, 0.0), Vec3::new(1.0, 1.0, 0.0)).expect("line");
        let outside = Line::through(Vec3::new(3.0, -1.0, 0.0), Vec3::new(3.0, 1.0, 0.0)).expect("line");
        let behind = Line::through(Vec3::new(-1.0, -1.0, 0.0), Vec3::new(-1.0, 1.0, 0.0)).expect("line");
        assert_relative_eq!(segment.intersection_with_line(&inside).expect("hit"), Vec3::x(), epsilon = 1e-12);
        assert!(segment.intersection_with_line(&outside).is_none());
        assert!(segment.intersection_with_line(&behind).is_none());
    }

    #[test]
    fn test_line_pivots() {
        let line = Line::through(Vec3::new(1.0, 1.0, 0.0), Vec3::new(1.0, 2.0, 0.0)).expect("line");
        let [p1, p2] = line.pivot_points();
        assert_relative_eq!(p1, Vec3::new(1.0, 1.0, 0.0));
        assert_relative_eq!(p2, Vec3::new(1.0, 2.0, 0.0));
        assert!(Line::through(Vec3::x(), Vec3::x()).is_err());
    }
}
