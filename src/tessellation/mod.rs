mod triangulate_roof;

pub use triangulate_roof::TriangulateRoof;

use crate::math::{Point3, Vector3};

/// A triangle mesh approximation of a roof, ready for rendering or export.
#[derive(Debug, Clone, Default)]
pub struct TriangleMesh {
    /// Vertex positions.
    pub vertices: Vec<Point3>,
    /// Vertex normals.
    pub normals: Vec<Vector3>,
    /// Triangle indices (each triple defines a triangle).
    pub indices: Vec<[u32; 3]>,
}

impl TriangleMesh {
    /// Appends another mesh, offsetting its indices.
    #[allow(clippy::cast_possible_truncation)]
    pub fn merge(&mut self, other: &TriangleMesh) {
        let offset = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&other.vertices);
        self.normals.extend_from_slice(&other.normals);
        self.indices.extend(
            other
                .indices
                .iter()
                .map(|t| [t[0] + offset, t[1] + offset, t[2] + offset]),
        );
    }

    /// Number of triangles.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len()
    }

    /// Total triangle area.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.indices
            .iter()
            .map(|t| {
                let [a, b, c] = t.map(|i| self.vertices[i as usize]);
                (b - a).cross(&(c - a)).norm() * 0.5
            })
            .sum()
    }

    /// Every triangle side as a positional segment, shared sides once.
    ///
    /// This is the loose edge soup a triangulated mesh presents to footprint
    /// extraction.
    #[must_use]
    pub fn edge_segments(&self) -> Vec<(Point3, Point3)> {
        let mut seen: Vec<(Point3, Point3)> = Vec::new();
        for t in &self.indices {
            for k in 0..3 {
                let a = self.vertices[t[k] as usize];
                let b = self.vertices[t[(k + 1) % 3] as usize];
                let same = |s: &(Point3, Point3)| {
                    ((s.0 - a).norm() < 1e-9 && (s.1 - b).norm() < 1e-9)
                        || ((s.0 - b).norm() < 1e-9 && (s.1 - a).norm() < 1e-9)
                };
                if !seen.iter().any(same) {
                    seen.push((a, b));
                }
            }
        }
        seen
    }
}
