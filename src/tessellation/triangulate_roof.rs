use std::collections::{HashMap, HashSet, VecDeque};

use spade::handles::FixedFaceHandle;
use spade::{
    ConstrainedDelaunayTriangulation, InsertionError, Point2 as SpadePoint2, Triangulation,
};
use tracing::warn;

use crate::error::{Result, TessellationError};
use crate::math::{Point3, Vector3};
use crate::mesh::RoofMesh;

use super::TriangleMesh;

/// Triangulates every facet of a roof mesh.
///
/// Each facet is projected onto its own plane and triangulated with a
/// constrained Delaunay triangulation, so non-convex facets are handled.
/// Vertices are duplicated per facet and carry the flat facet normal.
pub struct TriangulateRoof<'a> {
    mesh: &'a RoofMesh,
}

impl<'a> TriangulateRoof<'a> {
    /// Creates a new `TriangulateRoof` operation.
    #[must_use]
    pub fn new(mesh: &'a RoofMesh) -> Self {
        Self { mesh }
    }

    /// Executes the triangulation, returning a combined triangle mesh.
    ///
    /// Facets that have collapsed to a line are skipped.
    ///
    /// # Errors
    ///
    /// Returns `TessellationError::Failed` if a facet vertex cannot be
    /// inserted into the triangulation.
    pub fn execute(&self) -> Result<TriangleMesh> {
        let mut combined = TriangleMesh::default();
        for (index, face) in self.mesh.faces.iter().enumerate() {
            let normal = self.mesh.face_normal(index);
            let Some(normal) = normal.try_normalize(1e-12) else {
                warn!("skipping facet {index}: no area");
                continue;
            };
            let points: Vec<Point3> = face.iter().map(|&v| self.mesh.vertices[v]).collect();
            combined.merge(&triangulate_facet(&points, &normal)?);
        }
        Ok(combined)
    }
}

/// Triangulates one planar polygon with the given unit normal.
#[allow(clippy::cast_possible_truncation)]
fn triangulate_facet(points: &[Point3], normal: &Vector3) -> Result<TriangleMesh> {
    let origin = points[0];
    let u_dir = points
        .iter()
        .skip(1)
        .find_map(|p| {
            let d = p - origin;
            (d - normal * d.dot(normal)).try_normalize(1e-12)
        })
        .ok_or_else(|| TessellationError::Failed("facet has no extent".into()))?;
    let v_dir = normal.cross(&u_dir);

    let project = |p: &Point3| -> SpadePoint2<f64> {
        let d = p - origin;
        SpadePoint2::new(d.dot(&u_dir), d.dot(&v_dir))
    };
    let ring: Vec<_> = points.iter().map(project).collect();

    let mut cdt = ConstrainedDelaunayTriangulation::<SpadePoint2<f64>>::new();
    insert_constraint_loop(&mut cdt, &ring)?;
    let interior = classify_interior_faces(&cdt);

    let mut mesh = TriangleMesh::default();
    let mut vertex_map: HashMap<usize, u32> = HashMap::new();
    for face_handle in cdt.inner_faces() {
        if !interior.contains(&face_handle.fix().index()) {
            continue;
        }
        let mut tri = [0u32; 3];
        for (slot, vh) in face_handle.vertices().iter().enumerate() {
            let idx = vh.fix().index();
            tri[slot] = *vertex_map.entry(idx).or_insert_with(|| {
                let pos = vh.position();
                mesh.vertices.push(origin + u_dir * pos.x + v_dir * pos.y);
                mesh.normals.push(*normal);
                (mesh.vertices.len() - 1) as u32
            });
        }
        mesh.indices.push(tri);
    }
    Ok(mesh)
}

fn insert_constraint_loop(
    cdt: &mut ConstrainedDelaunayTriangulation<SpadePoint2<f64>>,
    points: &[SpadePoint2<f64>],
) -> Result<()> {
    if points.len() < 3 {
        return Err(
            TessellationError::Failed("constraint loop needs at least 3 points".into()).into(),
        );
    }

    let mut handles = Vec::with_capacity(points.len());
    for &pt in points {
        let h = cdt
            .insert(pt)
            .map_err(|e: InsertionError| TessellationError::Failed(format!("CDT insert: {e}")))?;
        handles.push(h);
    }

    for i in 0..handles.len() {
        let from = handles[i];
        let to = handles[(i + 1) % handles.len()];
        if from != to {
            cdt.add_constraint(from, to);
        }
    }
    Ok(())
}

/// Flood-fills from the outer face; crossing a constraint edge flips
/// inside/outside, so odd depth means interior.
fn classify_interior_faces(
    cdt: &ConstrainedDelaunayTriangulation<SpadePoint2<f64>>,
) -> HashSet<usize> {
    let mut interior = HashSet::new();
    let mut depth_map: HashMap<usize, u32> = HashMap::new();
    let mut queue: VecDeque<(FixedFaceHandle<spade::handles::InnerTag>, u32)> = VecDeque::new();

    let outer_fix = cdt.outer_face().fix();
    for edge in cdt.directed_edges() {
        if edge.face().fix() != outer_fix {
            continue;
        }
        let Some(inner) = edge.rev().face().as_inner() else {
            continue;
        };
        let idx = inner.fix().index();
        if depth_map.contains_key(&idx) {
            continue;
        }
        let depth = u32::from(cdt.is_constraint_edge(edge.as_undirected().fix()));
        depth_map.insert(idx, depth);
        if depth % 2 == 1 {
            interior.insert(idx);
        }
        queue.push_back((inner.fix(), depth));
    }

    while let Some((face_fix, depth)) = queue.pop_front() {
        for edge in cdt.face(face_fix).adjacent_edges() {
            let Some(neighbor) = edge.rev().face().as_inner() else {
                continue;
            };
            let idx = neighbor.fix().index();
            if depth_map.contains_key(&idx) {
                continue;
            }
            let next = depth + u32::from(cdt.is_constraint_edge(edge.as_undirected().fix()));
            depth_map.insert(idx, next);
            if next % 2 == 1 {
                interior.insert(idx);
            }
            queue.push_back((neighbor.fix(), next));
        }
    }
    interior
}
