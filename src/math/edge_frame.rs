use super::polygon_2d::{left_normal, segment_direction};
use super::{Point2, Point3, Vector2};
use crate::error::Result;

/// Coordinates of a point expressed in an [`EdgeFrame`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeLocal {
    /// Distance along the edge direction, measured from the edge start.
    pub along: f64,
    /// Signed distance from the edge line; positive on the left side.
    pub offset: f64,
    /// Height above the edge.
    pub height: f64,
}

/// A local 2D frame aligned with a horizontal segment.
///
/// Used to move a roof vertex toward or away from an eave line while keeping
/// its height and its position along the eave.
#[derive(Debug, Clone, Copy)]
pub struct EdgeFrame {
    origin: Point2,
    dir: Vector2,
    normal: Vector2,
    base_z: f64,
}

impl EdgeFrame {
    /// Builds the frame of the segment `start`-`end`.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::Degenerate` if the segment has zero length in XY.
    pub fn new(start: &Point3, end: &Point3) -> Result<Self> {
        let dir = segment_direction(start, end)?;
        Ok(Self {
            origin: Point2::new(start.x, start.y),
            dir,
            normal: left_normal(dir),
            base_z: start.z,
        })
    }

    /// Decomposes `point` into along-edge, perpendicular and height components.
    #[must_use]
    pub fn project(&self, point: &Point3) -> EdgeLocal {
        let d = Point2::new(point.x, point.y) - self.origin;
        EdgeLocal {
            along: d.dot(&self.dir),
            offset: d.dot(&self.normal),
            height: point.z - self.base_z,
        }
    }

    /// Inverse of [`EdgeFrame::project`].
    #[must_use]
    pub fn unproject(&self, local: &EdgeLocal) -> Point3 {
        let p = self.origin + self.dir * local.along + self.normal * local.offset;
        Point3::new(p.x, p.y, self.base_z + local.height)
    }

    /// Scales the perpendicular offset of `point` by `factor`, keeping its
    /// position along the edge and its height.
    #[must_use]
    pub fn scale_offset(&self, point: &Point3, factor: f64) -> Point3 {
        let mut local = self.project(point);
        local.offset *= factor;
        self.unproject(&local)
    }

    /// Elevation angle in degrees between the edge line and `point`, measured
    /// in the plane perpendicular to the edge.
    ///
    /// A point directly above the edge line gives 90 degrees.
    #[must_use]
    pub fn elevation_angle(&self, point: &Point3) -> f64 {
        let local = self.project(point);
        local.height.atan2(local.offset.abs()).to_degrees()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn project_and_unproject_round_trip() {
        let frame = EdgeFrame::new(&Point3::new(1.0, 1.0, 0.0), &Point3::new(1.0, 5.0, 0.0)).unwrap();
        let p = Point3::new(-1.0, 3.0, 2.5);
        let local = frame.project(&p);
        assert_abs_diff_eq!(local.along, 2.0, epsilon = 1e-12);
        // Left of an edge pointing +Y is -X.
        assert_abs_diff_eq!(local.offset, 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(local.height, 2.5, epsilon = 1e-12);
        let back = frame.unproject(&local);
        assert_abs_diff_eq!((back - p).norm(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn scale_offset_to_zero_lands_above_edge() {
        let frame = EdgeFrame::new(&Point3::new(0.0, 0.0, 0.0), &Point3::new(10.0, 0.0, 0.0)).unwrap();
        let moved = frame.scale_offset(&Point3::new(5.0, 5.0, 5.0), 0.0);
        assert_abs_diff_eq!(moved.x, 5.0, epsilon = 1e-12);
        assert_abs_diff_eq!(moved.y, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(moved.z, 5.0, epsilon = 1e-12);
    }

    #[test]
    fn elevation_angle_of_45_degree_pitch() {
        let frame = EdgeFrame::new(&Point3::new(0.0, 0.0, 0.0), &Point3::new(10.0, 0.0, 0.0)).unwrap();
        assert_abs_diff_eq!(frame.elevation_angle(&Point3::new(5.0, 5.0, 5.0)), 45.0, epsilon = 1e-9);
        assert_abs_diff_eq!(frame.elevation_angle(&Point3::new(5.0, 0.0, 5.0)), 90.0, epsilon = 1e-9);
    }

    #[test]
    fn degenerate_edge_is_rejected() {
        let p = Point3::new(2.0, 2.0, 0.0);
        assert!(EdgeFrame::new(&p, &p).is_err());
    }
}
