use crate::math::intersect_2d::{point_on_segment_param, segment_segment_intersect_2d};
use crate::math::{Point2, Point3};

/// A planar arrangement: merged points and the non-overlapping edges between them.
#[derive(Debug, Default)]
pub struct Arrangement {
    /// Distinct points (merged within tolerance).
    pub points: Vec<Point2>,
    /// Height of the first input point merged into each entry of `points`.
    pub heights: Vec<f64>,
    /// Undirected edges as point index pairs; no duplicates, no self-loops.
    pub edges: Vec<(usize, usize)>,
}

/// Unions line segments into a planar arrangement.
///
/// Every segment is split at its intersections with every other segment and
/// at endpoints of collinear segments lying on it, so that the resulting
/// edges only meet at shared endpoints.
pub fn build(segments: &[(Point3, Point3)], eps: f64) -> Arrangement {
    let flat: Vec<(Point2, Point2, f64)> = segments
        .iter()
        .map(|(a, b)| (Point2::new(a.x, a.y), Point2::new(b.x, b.y), a.z))
        .filter(|(a, b, _)| (b - a).norm() > eps)
        .collect();

    let mut arrangement = Arrangement::default();
    for (i, (a0, a1, z)) in flat.iter().enumerate() {
        let mut params = vec![0.0, 1.0];
        for (j, (b0, b1, _)) in flat.iter().enumerate() {
            if i == j {
                continue;
            }
            if let Some((_, t, _)) = segment_segment_intersect_2d(a0, a1, b0, b1, eps) {
                params.push(t);
            }
            for endpoint in [b0, b1] {
                if let Some(t) = point_on_segment_param(endpoint, a0, a1, eps) {
                    params.push(t);
                }
            }
        }
        params.sort_by(f64::total_cmp);

        let mut prev: Option<usize> = None;
        for t in params {
            let p = a0 + (a1 - a0) * t;
            let idx = ensure_point(&mut arrangement, p, *z, eps);
            if let Some(prev_idx) = prev {
                if prev_idx != idx {
                    push_edge(&mut arrangement.edges, prev_idx, idx);
                }
            }
            prev = Some(idx);
        }
    }
    arrangement
}

/// Finds or inserts a point, returning its index.
fn ensure_point(arrangement: &mut Arrangement, p: Point2, z: f64, eps: f64) -> usize {
    for (i, q) in arrangement.points.iter().enumerate() {
        if (q - p).norm() <= eps {
            return i;
        }
    }
    arrangement.points.push(p);
    arrangement.heights.push(z);
    arrangement.points.len() - 1
}

fn push_edge(edges: &mut Vec<(usize, usize)>, a: usize, b: usize) {
    let exists = edges
        .iter()
        .any(|&(u, v)| (u == a && v == b) || (u == b && v == a));
    if !exists {
        edges.push((a, b));
    }
}
