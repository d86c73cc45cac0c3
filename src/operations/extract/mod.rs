mod noding;
mod polygonize;

use tracing::debug;

use crate::error::{ExtractionError, Result};
use crate::geometry::FootprintPolygon;
use crate::math::{Point3, TOLERANCE};

/// Reduces an unordered soup of line segments to a single footprint.
///
/// The segments are unioned into a planar arrangement and polygonized. The
/// polygon with the largest enclosed area becomes the outer boundary; closed
/// loops nested inside it become holes. The outer ring is returned
/// counter-clockwise and holes clockwise.
#[derive(Debug)]
pub struct ExtractFootprint {
    segments: Vec<(Point3, Point3)>,
    tolerance: f64,
}

impl ExtractFootprint {
    /// Creates a new extraction over the given segments.
    #[must_use]
    pub fn new(segments: Vec<(Point3, Point3)>) -> Self {
        Self {
            segments,
            tolerance: TOLERANCE,
        }
    }

    /// Sets the distance below which points are considered identical.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Executes the extraction.
    ///
    /// # Errors
    ///
    /// Returns `ExtractionError::NoBoundary` if the segments do not close any
    /// polygon of non-zero area.
    pub fn execute(&self) -> Result<FootprintPolygon> {
        let arrangement = noding::build(&self.segments, self.tolerance);
        let regions = polygonize::regions(&arrangement);
        debug!(
            "arrangement: {} points, {} edges, {} regions",
            arrangement.points.len(),
            arrangement.edges.len(),
            regions.len()
        );

        let best = regions
            .into_iter()
            .filter(|r| r.shell.len() >= 3 && r.area > self.tolerance * self.tolerance)
            .max_by(|a, b| a.area.total_cmp(&b.area))
            .ok_or(ExtractionError::NoBoundary {
                segments: self.segments.len(),
            })?;

        Ok(FootprintPolygon::new(best.shell, best.holes))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::RoofError;
    use crate::math::polygon_2d::signed_area_2d;

    fn seg(ax: f64, ay: f64, bx: f64, by: f64) -> (Point3, Point3) {
        (Point3::new(ax, ay, 0.0), Point3::new(bx, by, 0.0))
    }

    #[test]
    fn picks_largest_polygon() {
        let segments = vec![
            seg(0.0, 0.0, 10.0, 0.0),
            seg(10.0, 0.0, 10.0, 10.0),
            seg(10.0, 10.0, 0.0, 10.0),
            seg(0.0, 10.0, 0.0, 0.0),
            seg(20.0, 0.0, 21.0, 0.0),
            seg(21.0, 0.0, 21.0, 1.0),
            seg(21.0, 1.0, 20.0, 0.0),
        ];
        let fp = ExtractFootprint::new(segments).execute().unwrap();
        assert_eq!(fp.outer.len(), 4);
        assert!((fp.area() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn clockwise_input_is_normalized() {
        let segments = vec![
            seg(0.0, 0.0, 0.0, 4.0),
            seg(0.0, 4.0, 4.0, 4.0),
            seg(4.0, 4.0, 4.0, 0.0),
            seg(4.0, 0.0, 0.0, 0.0),
        ];
        let fp = ExtractFootprint::new(segments).execute().unwrap();
        assert!(signed_area_2d(&fp.outer) > 0.0);
    }

    #[test]
    fn hole_is_clockwise() {
        let segments = vec![
            seg(0.0, 0.0, 10.0, 0.0),
            seg(10.0, 0.0, 10.0, 10.0),
            seg(10.0, 10.0, 0.0, 10.0),
            seg(0.0, 10.0, 0.0, 0.0),
            seg(4.0, 4.0, 6.0, 4.0),
            seg(6.0, 4.0, 6.0, 6.0),
            seg(6.0, 6.0, 4.0, 6.0),
            seg(4.0, 6.0, 4.0, 4.0),
        ];
        let fp = ExtractFootprint::new(segments).execute().unwrap();
        assert_eq!(fp.holes.len(), 1);
        assert!(signed_area_2d(&fp.holes[0]) < 0.0);
        assert!((fp.area() - 96.0).abs() < 1e-9);
    }

    #[test]
    fn open_segments_report_no_boundary() {
        let segments = vec![seg(0.0, 0.0, 5.0, 0.0), seg(6.0, 0.0, 6.0, 5.0)];
        let err = ExtractFootprint::new(segments).execute().unwrap_err();
        assert!(matches!(
            err,
            RoofError::Extraction(ExtractionError::NoBoundary { segments: 2 })
        ));
    }

    #[test]
    fn empty_input_reports_no_boundary() {
        assert!(ExtractFootprint::new(Vec::new()).execute().is_err());
    }
}
