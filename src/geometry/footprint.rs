use serde::{Deserialize, Serialize};

use crate::math::polygon_2d::{normalize_hole_orientation, normalize_orientation, signed_area_2d};
use crate::math::Point3;

/// A contiguous run of vertices in a flat vertex array forming one closed ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopRange {
    /// Index of the first vertex of the ring.
    pub start: usize,
    /// Number of vertices in the ring.
    pub count: usize,
}

impl LoopRange {
    /// Creates a new loop range.
    #[must_use]
    pub fn new(start: usize, count: usize) -> Self {
        Self { start, count }
    }

    /// Iterates the vertex indices of the ring.
    pub fn indices(&self) -> std::ops::Range<usize> {
        self.start..self.start + self.count
    }

    /// Index of the vertex following `index` in the ring (wrapping).
    #[must_use]
    pub fn next(&self, index: usize) -> usize {
        self.start + (index - self.start + 1) % self.count
    }

    /// Index of the vertex preceding `index` in the ring (wrapping).
    #[must_use]
    pub fn prev(&self, index: usize) -> usize {
        self.start + (index - self.start + self.count - 1) % self.count
    }
}

/// A closed footprint with an outer boundary and optional holes.
///
/// The outer ring winds counter-clockwise and holes wind clockwise once
/// [`FootprintPolygon::normalized`] has been applied. Rings are implicitly
/// closed; the first point is not repeated.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FootprintPolygon {
    /// Outer boundary.
    pub outer: Vec<Point3>,
    /// Hole boundaries.
    pub holes: Vec<Vec<Point3>>,
}

impl FootprintPolygon {
    /// Creates a footprint from raw rings, normalizing their orientation.
    #[must_use]
    pub fn new(outer: Vec<Point3>, holes: Vec<Vec<Point3>>) -> Self {
        Self { outer, holes }.normalized()
    }

    /// Axis-aligned square footprint centred on the origin, the starting shape
    /// offered when no usable boundary exists.
    #[must_use]
    pub fn rectangle(half_extent: f64) -> Self {
        let h = half_extent;
        Self::new(
            vec![
                Point3::new(-h, -h, 0.0),
                Point3::new(h, -h, 0.0),
                Point3::new(h, h, 0.0),
                Point3::new(-h, h, 0.0),
            ],
            Vec::new(),
        )
    }

    /// Returns a copy with the outer ring counter-clockwise and holes clockwise.
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            outer: normalize_orientation(&self.outer),
            holes: self
                .holes
                .iter()
                .map(|h| normalize_hole_orientation(h))
                .collect(),
        }
    }

    /// Enclosed area: outer area minus hole areas.
    #[must_use]
    pub fn area(&self) -> f64 {
        let holes: f64 = self.holes.iter().map(|h| signed_area_2d(h).abs()).sum();
        signed_area_2d(&self.outer).abs() - holes
    }

    /// Total number of vertices over all rings.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.outer.len() + self.holes.iter().map(Vec::len).sum::<usize>()
    }

    /// Boundary segments of every ring, in ring order.
    #[must_use]
    pub fn segments(&self) -> Vec<(Point3, Point3)> {
        std::iter::once(&self.outer)
            .chain(self.holes.iter())
            .flat_map(|ring| {
                let n = ring.len();
                (0..n).map(move |i| (ring[i], ring[(i + 1) % n]))
            })
            .collect()
    }

    /// Flattens all rings into one vertex array with loop descriptors.
    #[must_use]
    pub fn flatten(&self) -> FlatFootprint {
        let mut vertices = Vec::with_capacity(self.vertex_count());
        let mut loops = Vec::with_capacity(1 + self.holes.len());
        for ring in std::iter::once(&self.outer).chain(self.holes.iter()) {
            loops.push(LoopRange::new(vertices.len(), ring.len()));
            vertices.extend_from_slice(ring);
        }
        FlatFootprint { vertices, loops }
    }
}

/// A footprint laid out as one vertex array shared by all rings.
///
/// `loops[0]` is the outer ring; the remaining entries describe holes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FlatFootprint {
    /// All ring vertices, outer ring first.
    pub vertices: Vec<Point3>,
    /// Ring descriptors into `vertices`.
    pub loops: Vec<LoopRange>,
}

impl FlatFootprint {
    /// The outer ring descriptor, if any.
    #[must_use]
    pub fn outer(&self) -> Option<LoopRange> {
        self.loops.first().copied()
    }

    /// The hole ring descriptors.
    #[must_use]
    pub fn holes(&self) -> &[LoopRange] {
        self.loops.get(1..).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point3 {
        Point3::new(x, y, 0.0)
    }

    #[test]
    fn new_normalizes_rings() {
        let fp = FootprintPolygon::new(
            vec![p(0.0, 0.0), p(0.0, 10.0), p(10.0, 10.0), p(10.0, 0.0)],
            vec![vec![p(2.0, 2.0), p(4.0, 2.0), p(4.0, 4.0), p(2.0, 4.0)]],
        );
        assert!(signed_area_2d(&fp.outer) > 0.0);
        assert!(signed_area_2d(&fp.holes[0]) < 0.0);
        assert!((fp.area() - 96.0).abs() < 1e-9);
    }

    #[test]
    fn flatten_shares_one_vertex_array() {
        let fp = FootprintPolygon::new(
            vec![p(0.0, 0.0), p(10.0, 0.0), p(10.0, 10.0), p(0.0, 10.0)],
            vec![vec![p(2.0, 2.0), p(2.0, 4.0), p(4.0, 4.0)]],
        );
        let flat = fp.flatten();
        assert_eq!(flat.vertices.len(), 7);
        assert_eq!(flat.outer(), Some(LoopRange::new(0, 4)));
        assert_eq!(flat.holes(), &[LoopRange::new(4, 3)]);
    }

    #[test]
    fn loop_range_wraps() {
        let l = LoopRange::new(4, 3);
        assert_eq!(l.next(6), 4);
        assert_eq!(l.prev(4), 6);
        assert_eq!(l.indices().collect::<Vec<_>>(), vec![4, 5, 6]);
    }

    #[test]
    fn rectangle_is_ccw_square() {
        let fp = FootprintPolygon::rectangle(5.0);
        assert_eq!(fp.outer.len(), 4);
        assert!((fp.area() - 100.0).abs() < 1e-9);
        assert_eq!(fp.segments().len(), 4);
    }
}
