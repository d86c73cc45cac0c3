pub mod edge_frame;
pub mod intersect_2d;
pub mod polygon_2d;

/// 2D point type.
pub type Point2 = nalgebra::Point2<f64>;

/// 3D point type.
pub type Point3 = nalgebra::Point3<f64>;

/// 2D vector type.
pub type Vector2 = nalgebra::Vector2<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// Global tolerance for "same point" and "same height" tests.
///
/// Coordinates pass through unit conversion and serialization round trips, so
/// all geometric matching uses this tolerance instead of exact equality.
pub const TOLERANCE: f64 = 1e-4;

/// Returns `true` if `x` is within [`TOLERANCE`] of zero.
#[must_use]
pub fn is_near_zero(x: f64) -> bool {
    is_near_zero_eps(x, TOLERANCE)
}

/// Returns `true` if `x` is within `eps` of zero (inclusive).
#[must_use]
pub fn is_near_zero_eps(x: f64, eps: f64) -> bool {
    x.abs() <= eps
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn near_zero_is_inclusive() {
        assert!(is_near_zero(0.0));
        assert!(is_near_zero(-1e-4));
        assert!(!is_near_zero(2e-4));
        assert!(is_near_zero_eps(0.5, 0.5));
        assert!(!is_near_zero_eps(-0.6, 0.5));
    }
}
