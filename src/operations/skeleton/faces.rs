use std::f64::consts::TAU;

use crate::error::{Result, SkeletonError};
use crate::geometry::{FlatFootprint, SlopeSpec};
use crate::math::{is_near_zero_eps, Point2, Point3};
use crate::mesh::RoofMesh;

use super::wavefront::Skeleton;

/// Turns skeleton arcs into one roof facet per footprint edge.
///
/// Nodes closer than `eps` in position and time are merged. Facet `i` is
/// bounded by footprint edge `i` and the arcs that carry face `i`.
///
/// # Errors
///
/// Returns `SkeletonError::Divergence` if the arcs of some face do not form
/// a closed chain back to its eave edge.
pub fn assemble(
    footprint: &FlatFootprint,
    skeleton: &Skeleton,
    slope: &SlopeSpec,
    eps: f64,
) -> Result<RoofMesh> {
    let base = footprint.vertices.len();
    let base_z = footprint.vertices.first().map_or(0.0, |p| p.z);

    // (xy, time) per output vertex; footprint vertices keep their slots.
    let mut merged: Vec<(Point2, f64)> = skeleton.nodes[..base]
        .iter()
        .map(|n| (n.point, n.time))
        .collect();
    let mut remap = Vec::with_capacity(skeleton.nodes.len());
    for (i, node) in skeleton.nodes.iter().enumerate() {
        if i < base {
            remap.push(i);
            continue;
        }
        let found = merged
            .iter()
            .position(|&(p, t)| (p - node.point).norm() <= eps && is_near_zero_eps(t - node.time, eps));
        remap.push(found.unwrap_or_else(|| {
            merged.push((node.point, node.time));
            merged.len() - 1
        }));
    }

    let mut arcs: Vec<(usize, usize, [usize; 2])> = Vec::with_capacity(skeleton.arcs.len());
    for arc in &skeleton.arcs {
        let (a, b) = (remap[arc.from], remap[arc.to]);
        if a == b {
            continue;
        }
        let duplicate = arcs.iter().any(|&(x, y, f)| {
            ((x == a && y == b) || (x == b && y == a)) && same_faces(f, arc.faces)
        });
        if !duplicate {
            arcs.push((a, b, arc.faces));
        }
    }

    let mut faces = Vec::with_capacity(base);
    for ring in &footprint.loops {
        for edge in ring.indices() {
            faces.push(walk_face(edge, edge, ring.next(edge), &merged, &arcs)?);
        }
    }

    let max_time = merged.iter().map(|&(_, t)| t).fold(0.0, f64::max);
    let vertices = merged
        .iter()
        .enumerate()
        .map(|(i, &(p, t))| {
            if i < base {
                footprint.vertices[i]
            } else {
                Point3::new(p.x, p.y, base_z + slope.height_at(t, max_time))
            }
        })
        .collect();

    let mut edges: Vec<[usize; 2]> = footprint
        .loops
        .iter()
        .flat_map(|l| l.indices().map(move |i| [i, l.next(i)]))
        .collect();
    for &(a, b, _) in &arcs {
        if !edges.iter().any(|e| (e[0] == a && e[1] == b) || (e[0] == b && e[1] == a)) {
            edges.push([a, b]);
        }
    }

    Ok(RoofMesh {
        vertices,
        edges,
        faces,
        footprint: footprint.loops.clone(),
    })
}

fn same_faces(a: [usize; 2], b: [usize; 2]) -> bool {
    (a[0] == b[0] && a[1] == b[1]) || (a[0] == b[1] && a[1] == b[0])
}

/// Walks the arcs of face `edge` from the eave end `end` back to `start`.
///
/// Where several arcs leave a node, the first one clockwise from the
/// reversed incoming direction is taken, which keeps the face on the left.
fn walk_face(
    edge: usize,
    start: usize,
    end: usize,
    points: &[(Point2, f64)],
    arcs: &[(usize, usize, [usize; 2])],
) -> Result<Vec<usize>> {
    let own: Vec<(usize, usize)> = arcs
        .iter()
        .filter(|(_, _, f)| f.contains(&edge))
        .map(|&(a, b, _)| (a, b))
        .collect();
    let mut used = vec![false; own.len()];
    let mut face = vec![start, end];
    let (mut prev, mut cur) = (start, end);

    for _ in 0..=own.len() {
        let back = points[prev].0 - points[cur].0;
        let back_angle = back.y.atan2(back.x);
        let choice = own
            .iter()
            .enumerate()
            .filter(|&(k, _)| !used[k])
            .filter_map(|(k, &(a, b))| {
                let other = if a == cur {
                    b
                } else if b == cur {
                    a
                } else {
                    return None;
                };
                let d = points[other].0 - points[cur].0;
                let mut turn = (back_angle - d.y.atan2(d.x)).rem_euclid(TAU);
                if turn < 1e-12 {
                    turn = TAU;
                }
                Some((k, other, turn))
            })
            .min_by(|x, y| x.2.total_cmp(&y.2));

        let Some((k, other, _)) = choice else {
            break;
        };
        used[k] = true;
        if other == start {
            return Ok(face);
        }
        face.push(other);
        prev = cur;
        cur = other;
    }

    Err(SkeletonError::Divergence(format!("face of footprint edge {edge} does not close")).into())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geometry::FootprintPolygon;
    use crate::operations::skeleton::wavefront::Wavefront;

    fn mesh(outer: &[(f64, f64)]) -> RoofMesh {
        let ring = outer.iter().map(|&(x, y)| Point3::new(x, y, 0.0)).collect();
        let flat = FootprintPolygon::new(ring, Vec::new()).flatten();
        let skeleton = Wavefront::new(&flat, 1e-6).unwrap().run().unwrap();
        assemble(&flat, &skeleton, &SlopeSpec::from_degrees(45.0), 1e-6).unwrap()
    }

    #[test]
    fn square_has_four_triangles_and_one_apex() {
        let m = mesh(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]);
        assert_eq!(m.vertices.len(), 5);
        assert_eq!(m.faces.len(), 4);
        assert!(m.faces.iter().all(|f| f.len() == 3));
        assert_eq!(m.edges.len(), 8);
    }

    #[test]
    fn faces_start_with_their_eave_edge() {
        let m = mesh(&[(0.0, 0.0), (10.0, 0.0), (10.0, 4.0), (0.0, 4.0)]);
        for (i, face) in m.faces.iter().enumerate() {
            assert_eq!(face[0], i);
            assert_eq!(face[1], (i + 1) % 4);
        }
        assert_eq!(m.faces[0].len(), 4);
        assert_eq!(m.faces[1].len(), 3);
    }

    #[test]
    fn faces_wind_counter_clockwise_from_above() {
        let m = mesh(&[(0.0, 0.0), (4.0, 0.0), (4.0, 2.0), (2.0, 2.0), (2.0, 4.0), (0.0, 4.0)]);
        for f in 0..m.faces.len() {
            assert!(m.face_normal(f).z > 0.0, "face {f} is not upward");
        }
    }
}
