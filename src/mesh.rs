use crate::geometry::LoopRange;
use crate::math::{Point3, Vector3};

/// A generated roof: polygonal facets over a footprint.
///
/// Footprint vertices come first in `vertices`, laid out as described by
/// `footprint`; skeleton nodes follow. Indices are only meaningful within one
/// generation: every regeneration builds a fresh mesh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoofMesh {
    /// Vertex positions.
    pub vertices: Vec<Point3>,
    /// Undirected edges as vertex index pairs.
    pub edges: Vec<[usize; 2]>,
    /// Facets as ordered vertex index lists, counter-clockwise seen from above.
    pub faces: Vec<Vec<usize>>,
    /// Footprint rings within `vertices`, outer ring first.
    pub footprint: Vec<LoopRange>,
}

impl RoofMesh {
    /// Number of footprint (eave-level) vertices.
    #[must_use]
    pub fn footprint_vertex_count(&self) -> usize {
        self.footprint.iter().map(|l| l.count).sum()
    }

    /// Eave edges, one per footprint ring segment, in ring order.
    #[must_use]
    pub fn footprint_edges(&self) -> Vec<[usize; 2]> {
        self.footprint
            .iter()
            .flat_map(|l| l.indices().map(move |i| [i, l.next(i)]))
            .collect()
    }

    /// Indices of faces containing both `a` and `b` as consecutive vertices.
    #[must_use]
    pub fn faces_containing_edge(&self, a: usize, b: usize) -> Vec<usize> {
        self.faces
            .iter()
            .enumerate()
            .filter(|(_, face)| {
                let n = face.len();
                (0..n).any(|i| {
                    let (u, v) = (face[i], face[(i + 1) % n]);
                    (u == a && v == b) || (u == b && v == a)
                })
            })
            .map(|(i, _)| i)
            .collect()
    }

    /// Vertices of `face` other than `a` and `b`.
    #[must_use]
    pub fn opposite_vertices(&self, face: usize, a: usize, b: usize) -> Vec<usize> {
        self.faces
            .get(face)
            .map(|f| f.iter().copied().filter(|&v| v != a && v != b).collect())
            .unwrap_or_default()
    }

    /// Lowest vertex height, the eave level.
    #[must_use]
    pub fn min_z(&self) -> f64 {
        self.vertices.iter().map(|p| p.z).fold(f64::INFINITY, f64::min)
    }

    /// Highest vertex height.
    #[must_use]
    pub fn apex_height(&self) -> f64 {
        self.vertices.iter().map(|p| p.z).fold(f64::NEG_INFINITY, f64::max)
    }

    /// Vertices strictly above the eave level.
    #[must_use]
    pub fn ridge_vertices(&self, tolerance: f64) -> Vec<usize> {
        let base = self.min_z();
        (0..self.vertices.len())
            .filter(|&i| self.vertices[i].z - base > tolerance)
            .collect()
    }

    /// Unnormalized facet normal (Newell's method).
    #[must_use]
    pub fn face_normal(&self, face: usize) -> Vector3 {
        let Some(f) = self.faces.get(face) else {
            return Vector3::zeros();
        };
        let n = f.len();
        let mut normal = Vector3::zeros();
        for i in 0..n {
            let p = self.vertices[f[i]];
            let q = self.vertices[f[(i + 1) % n]];
            normal.x += (p.y - q.y) * (p.z + q.z);
            normal.y += (p.z - q.z) * (p.x + q.x);
            normal.z += (p.x - q.x) * (p.y + q.y);
        }
        normal
    }

    /// Total facet area.
    #[must_use]
    pub fn surface_area(&self) -> f64 {
        (0..self.faces.len())
            .map(|f| self.face_normal(f).norm() * 0.5)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pyramid() -> RoofMesh {
        RoofMesh {
            vertices: vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(2.0, 0.0, 0.0),
                Point3::new(2.0, 2.0, 0.0),
                Point3::new(0.0, 2.0, 0.0),
                Point3::new(1.0, 1.0, 1.0),
            ],
            edges: vec![[0, 1], [1, 2], [2, 3], [3, 0], [0, 4], [1, 4], [2, 4], [3, 4]],
            faces: vec![vec![0, 1, 4], vec![1, 2, 4], vec![2, 3, 4], vec![3, 0, 4]],
            footprint: vec![LoopRange::new(0, 4)],
        }
    }

    #[test]
    fn footprint_edges_wrap_rings() {
        assert_eq!(pyramid().footprint_edges(), vec![[0, 1], [1, 2], [2, 3], [3, 0]]);
    }

    #[test]
    fn faces_containing_edge_ignores_direction() {
        let mesh = pyramid();
        assert_eq!(mesh.faces_containing_edge(1, 0), vec![0]);
        assert_eq!(mesh.faces_containing_edge(0, 4), vec![0, 3]);
        assert_eq!(mesh.opposite_vertices(0, 0, 1), vec![4]);
    }

    #[test]
    fn heights_and_normals() {
        let mesh = pyramid();
        assert!((mesh.apex_height() - 1.0).abs() < 1e-12);
        assert!((mesh.min_z()).abs() < 1e-12);
        assert_eq!(mesh.ridge_vertices(1e-4), vec![4]);
        assert!(mesh.face_normal(0).z > 0.0);
    }
}
