//! Intersection and distance tests

use crate::foundation::math::{Vec2, Vec3};

use super::{almost_equal, CONSTRUCTION_EPSILON, EQUALITY_EPSILON, RAY_EPSILON};

/// Intersect two lines given as `origin + t * direction`.
///
/// The 3D system is reduced to two equations by picking the coordinate pair
/// (xy, xz or yz) whose sub-determinant of the direction vectors is largest.
/// Returns `None` for parallel lines, for a vanishing sub-determinant and for
/// skew lines whose remaining coordinate does not agree.
pub fn line_line_intersection(a_origin: Vec3, a_dir: Vec3, b_origin: Vec3, b_dir: Vec3) -> Option<Vec3> {
    if a_dir.cross(&b_dir).norm() < CONSTRUCTION_EPSILON {
        return None;
    }

    let c = b_origin - a_origin;
    let axes = [(0usize, 1usize), (0, 2), (1, 2)];
    let (u, v, det) = axes
        .iter()
        .map(|&(u, v)| (u, v, b_dir[u] * a_dir[v] - a_dir[u] * b_dir[v]))
        .max_by(|l, r| l.2.abs().total_cmp(&r.2.abs()))?;

    if det.abs() < CONSTRUCTION_EPSILON {
        return None;
    }

    let t = (a_dir[u] * c[v] - a_dir[v] * c[u]) / det;
    let candidate = b_origin + b_dir * t;

    // The eliminated coordinate must agree, otherwise the lines are skew
    let s = if a_dir[u].abs() > a_dir[v].abs() {
        (candidate[u] - a_origin[u]) / a_dir[u]
    } else {
        (candidate[v] - a_origin[v]) / a_dir[v]
    };
    let on_a = a_origin + a_dir * s;
    if (on_a - candidate).norm() > EQUALITY_EPSILON.sqrt() {
        return None;
    }

    Some(candidate)
}

/// Distance along a ray to its intersection with a plane through `point`
/// with normal `normal`. NaN when the ray is parallel to the plane.
pub fn ray_plane_intersection_distance(origin: Vec3, direction: Vec3, point: Vec3, normal: Vec3) -> f64 {
    let den = direction.dot(&normal);
    if almost_equal(den, 0.0) {
        return f64::NAN;
    }
    (point - origin).dot(&normal) / den
}

/// Möller–Trumbore ray/triangle test.
///
/// Returns the distance along `direction` to the hit, or NaN when the ray
/// misses, runs parallel to the triangle, or hits behind its origin.
pub fn ray_triangle_intersection_distance(origin: Vec3, direction: Vec3, p1: Vec3, p2: Vec3, p3: Vec3) -> f64 {
    let edge1 = p2 - p1;
    let edge2 = p3 - p1;
    let h = direction.cross(&edge2);
    let a = edge1.dot(&h);
    if a.abs() < RAY_EPSILON {
        return f64::NAN;
    }

    let f = 1.0 / a;
    let s = origin - p1;
    let u = f * s.dot(&h);
    if !(0.0..=1.0).contains(&u) {
        return f64::NAN;
    }

    let q = s.cross(&edge1);
    let v = f * direction.dot(&q);
    if v < 0.0 || u + v > 1.0 {
        return f64::NAN;
    }

    let t = f * edge2.dot(&q);
    if t > RAY_EPSILON { t } else { f64::NAN }
}

/// Distance from a 2D point to the infinite line through `l1` and `l2`
pub fn point_to_line_distance(point: Vec2, l1: Vec2, l2: Vec2) -> f64 {
    let dir = l2 - l1;
    let len = dir.norm();
    if len < CONSTRUCTION_EPSILON {
        return (point - l1).norm();
    }
    let dir = dir / len;
    let p = l1 - point;
    (p.x * dir.y - dir.x * p.y).abs()
}

/// Distance from a 2D point to the segment `[s1, s2]`
pub fn point_to_segment_distance(point: Vec2, s1: Vec2, s2: Vec2) -> f64 {
    let s1s2 = s2 - s1;
    let s1p = point - s1;
    let s2p = point - s2;

    if s1s2.dot(&s2p) > 0.0 {
        return s2p.norm();
    }
    if s1s2.dot(&s1p) < 0.0 {
        return s1p.norm();
    }
    point_to_line_distance(point, s1, s2)
}

/// Closest point on segment `[a, b]` to the ray `origin + t * direction`.
///
/// `None` when the segment has zero length.
pub fn closest_point_on_segment_to_ray(a: Vec3, b: Vec3, origin: Vec3, direction: Vec3) -> Option<Vec3> {
    let u = b - a;
    let uu = u.dot(&u);
    if uu < CONSTRUCTION_EPSILON {
        return None;
    }

    let w0 = a - origin;
    let ud = u.dot(&direction);
    let dd = direction.dot(&direction);
    let uw = u.dot(&w0);
    let dw = direction.dot(&w0);
    let denom = uu * dd - ud * ud;

    let s = if denom.abs() < CONSTRUCTION_EPSILON {
        // Parallel: every point is equally close, keep the projection of the origin
        -uw / uu
    } else {
        (ud * dw - dd * uw) / denom
    };

    Some(a + u * s.clamp(0.0, 1.0))
}

/// Sign of the volume of the tetrahedron `(s, t1, t2, t3)`: -1, 0 or 1
pub fn pyramid_volume_sign(s: Vec3, t1: Vec3, t2: Vec3, t3: Vec3) -> f64 {
    let volume = (t1 - s).cross(&(t2 - s)).dot(&(t3 - s));
    if volume.abs() < CONSTRUCTION_EPSILON {
        0.0
    } else {
        volume.signum()
    }
}

/// Whether four points lie in one plane
pub fn are_coplanar(p1: Vec3, p2: Vec3, p3: Vec3, p4: Vec3) -> bool {
    pyramid_volume_sign(p1, p2, p3, p4) == 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_line_line_intersection_in_xy_plane() {
        let hit = line_line_intersection(
            Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, -1.0, 0.0), Vec3::new(0.0, 1.0, 0.0),
        ).expect("lines cross");
        assert_relative_eq!(hit, Vec3::new(1.0, 0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_line_line_intersection_uses_other_projection() {
        // Both directions have zero x, so the xy and xz determinants vanish
        let hit = line_line_intersection(
            Vec3::new(3.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(3.0, 2.0, -2.0), Vec3::new(0.0, 0.0, 1.0),
        ).expect("lines cross");
        assert_relative_eq!(hit, Vec3::new(3.0, 2.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_parallel_and_skew_lines_do_not_intersect() {
        assert!(line_line_intersection(
            Vec3::zeros(), Vec3::x(), Vec3::new(0.0, 1.0, 0.0), Vec3::x() * 2.0,
        ).is_none());
        assert!(line_line_intersection(
            Vec3::zeros(), Vec3::x(), Vec3::new(0.0, 0.0, 1.0), Vec3::y(),
        ).is_none());
    }

    #[test]
    fn test_ray_plane_distance() {
        let d = ray_plane_intersection_distance(
            Vec3::new(0.0, 0.0, 10.0), Vec3::new(0.0, 0.0, -1.0), Vec3::zeros(), Vec3::z(),
        );
        assert_relative_eq!(d, 10.0);
        assert!(ray_plane_intersection_distance(Vec3::zeros(), Vec3::x(), Vec3::zeros(), Vec3::z()).is_nan());
    }

    #[test]
    fn test_ray_triangle_hit_and_miss() {
        let (a, b, c) = (Vec3::zeros(), Vec3::new(2.0, 0.0, 0.0), Vec3::new(0.0, 2.0, 0.0));
        let down = Vec3::new(0.0, 0.0, -1.0);
        let t = ray_triangle_intersection_distance(Vec3::new(0.5, 0.5, 3.0), down, a, b, c);
        assert_relative_eq!(t, 3.0, epsilon = 1e-12);
        assert!(ray_triangle_intersection_distance(Vec3::new(1.5, 1.5, 3.0), down, a, b, c).is_nan());
        // Triangle behind the ray origin
        assert!(ray_triangle_intersection_distance(Vec3::new(0.5, 0.5, -3.0), down, a, b, c).is_nan());
    }

    #[test]
    fn test_point_to_segment_distance_regions() {
        let (s1, s2) = (Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0));
        assert_relative_eq!(point_to_segment_distance(Vec2::new(5.0, 3.0), s1, s2), 3.0);
        assert_relative_eq!(point_to_segment_distance(Vec2::new(-3.0, 4.0), s1, s2), 5.0);
        assert_relative_eq!(point_to_segment_distance(Vec2::new(13.0, 4.0), s1, s2), 5.0);
        assert_relative_eq!(point_to_line_distance(Vec2::new(13.0, 4.0), s1, s2), 4.0);
    }

    #[test]
    fn test_closest_point_on_segment_clamps() {
        let a = Vec3::zeros();
        let b = Vec3::new(4.0, 0.0, 0.0);
        let down = Vec3::new(0.0, 0.0, -1.0);
        let mid = closest_point_on_segment_to_ray(a, b, Vec3::new(1.0, 2.0, 5.0), down).expect("segment");
        assert_relative_eq!(mid, Vec3::new(1.0, 0.0, 0.0), epsilon = 1e-12);
        let end = closest_point_on_segment_to_ray(a, b, Vec3::new(9.0, 0.0, 5.0), down).expect("segment");
        assert_relative_eq!(end, b, epsilon = 1e-12);
        assert!(closest_point_on_segment_to_ray(a, a, Vec3::zeros(), down).is_none());
    }

    #[test]
    fn test_pyramid_volume_sign() {
        let s = Vec3::new(0.0, 0.0, 1.0);
        let sign = pyramid_volume_sign(s, Vec3::zeros(), Vec3::x(), Vec3::y());
        assert_eq!(sign, -1.0);
        assert_eq!(pyramid_volume_sign(Vec3::zeros(), Vec3::zeros(), Vec3::x(), Vec3::y()), 0.0);
    }

    #[test]
    fn test_coplanar_points() {
        let (a, b, c) = (Vec3::zeros(), Vec3::x(), Vec3::y());
        assert!(are_coplanar(a, b, c, Vec3::new(3.0, -2.0, 0.0)));
        assert!(!are_coplanar(a, b, c, Vec3::new(0.0, 0.0, 0.5)));
        assert_eq!(pyramid_volume_sign(-Vec3::z(), a, b, c), 1.0);
    }
}
