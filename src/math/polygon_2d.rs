use super::{Point2, Point3, Vector2};
use crate::error::{GeometryError, Result};

/// Computes the signed area of a polygon in the XY plane (shoelace formula).
///
/// Positive for counter-clockwise, negative for clockwise.
#[must_use]
pub fn signed_area_2d(points: &[Point3]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        sum += points[i].x * points[j].y - points[j].x * points[i].y;
    }
    sum * 0.5
}

/// Returns the polygon with counter-clockwise winding.
///
/// Reverses the vertex order when the signed area is negative. The inward
/// offset direction of the wavefront is derived from this winding.
#[must_use]
pub fn normalize_orientation(points: &[Point3]) -> Vec<Point3> {
    let mut out = points.to_vec();
    if signed_area_2d(points) < 0.0 {
        out.reverse();
    }
    out
}

/// Returns the polygon with clockwise winding, as expected for holes.
#[must_use]
pub fn normalize_hole_orientation(points: &[Point3]) -> Vec<Point3> {
    let mut out = points.to_vec();
    if signed_area_2d(points) > 0.0 {
        out.reverse();
    }
    out
}

/// Even-odd point-in-polygon test in the XY plane.
///
/// Points on the boundary may go either way.
#[must_use]
pub fn point_in_polygon_2d(p: &Point2, polygon: &[Point3]) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (a, b) = (&polygon[i], &polygon[j]);
        if (a.y > p.y) != (b.y > p.y) {
            let x_cross = a.x + (p.y - a.y) / (b.y - a.y) * (b.x - a.x);
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Computes the normalized direction from point `a` to point `b` in the XY plane.
///
/// # Errors
///
/// Returns `GeometryError::Degenerate` if the segment has zero length.
pub fn segment_direction(a: &Point3, b: &Point3) -> Result<Vector2> {
    let d = b - a;
    let len = (d.x * d.x + d.y * d.y).sqrt();
    if len < f64::EPSILON * 1e3 {
        return Err(GeometryError::Degenerate(format!(
            "zero-length segment between ({}, {}) and ({}, {})",
            a.x, a.y, b.x, b.y
        ))
        .into());
    }
    Ok(Vector2::new(d.x / len, d.y / len))
}

/// Returns the left-pointing normal of a direction vector.
#[must_use]
pub fn left_normal(dir: Vector2) -> Vector2 {
    Vector2::new(-dir.y, dir.x)
}

/// 2D cross product (z component of the 3D cross product).
#[must_use]
pub fn cross_2d(a: &Vector2, b: &Vector2) -> f64 {
    a.x * b.y - a.y * b.x
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn square_ccw() -> Vec<Point3> {
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ]
    }

    #[test]
    fn signed_area_ccw_square() {
        let area = signed_area_2d(&square_ccw());
        assert!((area - 1.0).abs() < 1e-12);
    }

    #[test]
    fn signed_area_cw_square() {
        let mut pts = square_ccw();
        pts.reverse();
        let area = signed_area_2d(&pts);
        assert!((area + 1.0).abs() < 1e-12);
    }

    #[test]
    fn signed_area_degenerate() {
        assert!((signed_area_2d(&[Point3::new(0.0, 0.0, 0.0)])).abs() < 1e-12);
        assert!((signed_area_2d(&[])).abs() < 1e-12);
    }

    #[test]
    fn normalize_reverses_clockwise() {
        let mut pts = square_ccw();
        pts.reverse();
        let normalized = normalize_orientation(&pts);
        assert!(signed_area_2d(&normalized) > 0.0);
    }

    #[test]
    fn normalize_is_idempotent() {
        let pts = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 4.0, 0.0),
            Point3::new(2.0, 2.0, 0.0),
            Point3::new(4.0, 4.0, 0.0),
            Point3::new(4.0, 0.0, 0.0),
        ];
        let once = normalize_orientation(&pts);
        let twice = normalize_orientation(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn hole_orientation_is_clockwise() {
        let hole = normalize_hole_orientation(&square_ccw());
        assert!(signed_area_2d(&hole) < 0.0);
    }

    #[test]
    fn point_in_square() {
        let pts = square_ccw();
        assert!(point_in_polygon_2d(&Point2::new(0.5, 0.5), &pts));
        assert!(!point_in_polygon_2d(&Point2::new(1.5, 0.5), &pts));
    }

    #[test]
    fn segment_direction_basic() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(3.0, 4.0, 0.0);
        let dir = segment_direction(&a, &b).unwrap();
        assert!((dir.x - 0.6).abs() < 1e-12);
        assert!((dir.y - 0.8).abs() < 1e-12);
    }

    #[test]
    fn segment_direction_zero_length() {
        let a = Point3::new(1.0, 1.0, 0.0);
        assert!(segment_direction(&a, &a).is_err());
    }

    #[test]
    fn left_normal_basic() {
        let n = left_normal(Vector2::new(1.0, 0.0));
        assert!((n.x).abs() < 1e-12);
        assert!((n.y - 1.0).abs() < 1e-12);
    }
}
