use super::{Point2, Vector2};

/// Parametric 2D line-line intersection.
///
/// Given lines `p1 + t * d1` and `p2 + u * d2`, returns `(t, u)` if not parallel.
#[must_use]
pub fn line_line_intersect_2d(
    p1: &Point2,
    d1: &Vector2,
    p2: &Point2,
    d2: &Vector2,
) -> Option<(f64, f64)> {
    let cross = d1.x * d2.y - d1.y * d2.x;
    if cross.abs() < 1e-12 {
        return None;
    }
    let dx = p2.x - p1.x;
    let dy = p2.y - p1.y;
    let t = (dx * d2.y - dy * d2.x) / cross;
    let u = (dx * d1.y - dy * d1.x) / cross;
    Some((t, u))
}

/// Bounded segment-segment intersection in 2D.
///
/// Returns `(intersection_point, t, u)` where `t` and `u` are in `[0, 1]`.
/// Parallel (including collinear) segments return `None`; collinear overlap
/// is handled with [`point_on_segment_param`].
#[must_use]
pub fn segment_segment_intersect_2d(
    a0: &Point2,
    a1: &Point2,
    b0: &Point2,
    b1: &Point2,
    eps: f64,
) -> Option<(Point2, f64, f64)> {
    let da = a1 - a0;
    let db = b1 - b0;
    let (t, u) = line_line_intersect_2d(a0, &da, b0, &db)?;

    // Parameter tolerance scaled so that `eps` is a distance.
    let ta = eps / da.norm().max(f64::EPSILON);
    let tb = eps / db.norm().max(f64::EPSILON);
    if t >= -ta && t <= 1.0 + ta && u >= -tb && u <= 1.0 + tb {
        let t_clamped = t.clamp(0.0, 1.0);
        Some((a0 + da * t_clamped, t_clamped, u.clamp(0.0, 1.0)))
    } else {
        None
    }
}

/// Returns the parameter of `p` along segment `a`-`b` if `p` lies on the
/// segment within distance `eps`.
#[must_use]
pub fn point_on_segment_param(p: &Point2, a: &Point2, b: &Point2, eps: f64) -> Option<f64> {
    let d = b - a;
    let len_sq = d.norm_squared();
    if len_sq < f64::EPSILON {
        return None;
    }
    let t = (p - a).dot(&d) / len_sq;
    let closest = a + d * t;
    let slack = eps / len_sq.sqrt();
    if (p - closest).norm() <= eps && t >= -slack && t <= 1.0 + slack {
        Some(t.clamp(0.0, 1.0))
    } else {
        None
    }
}
