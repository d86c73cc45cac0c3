use crate::math::polygon_2d::{point_in_polygon_2d, signed_area_2d};
use crate::math::{Point2, Point3};

use super::noding::Arrangement;

/// A closed polygon found in an arrangement: one shell and its holes.
#[derive(Debug, Clone)]
pub struct Region {
    /// Counter-clockwise shell.
    pub shell: Vec<Point3>,
    /// Hole rings (orientation not yet normalized).
    pub holes: Vec<Vec<Point3>>,
    /// Shell area minus hole areas.
    pub area: f64,
}

/// Polygonizes an arrangement into regions.
///
/// Dangling edges are pruned first. Each connected component contributes one
/// region bounded by its outer shell, so edges interior to a component do not
/// split it. Shells of other components nested inside a region become its
/// holes; components nested inside those holes are not.
pub fn regions(arrangement: &Arrangement) -> Vec<Region> {
    let edges = prune_dangles(arrangement.points.len(), &arrangement.edges);
    if edges.is_empty() {
        return Vec::new();
    }

    let cycles = trace_face_cycles(&arrangement.points, &edges);
    let component = label_components(arrangement.points.len(), &edges);

    // The most negative cycle of each component is its unbounded face, i.e.
    // the component's outer shell traversed clockwise.
    let mut shells: Vec<(usize, Vec<usize>, f64)> = Vec::new();
    for cycle in cycles {
        let Some(&first) = cycle.first() else {
            continue;
        };
        let c = component[first];
        let area = signed_area_2d(&to_points(arrangement, &cycle));
        if area >= 0.0 {
            continue;
        }
        match shells.iter_mut().find(|(comp, _, _)| *comp == c) {
            Some(entry) if area < entry.2 => *entry = (c, cycle, area),
            Some(_) => {}
            None => shells.push((c, cycle, area)),
        }
    }

    let rings: Vec<Vec<Point3>> = shells
        .iter()
        .map(|(_, cycle, _)| {
            let mut ring = to_points(arrangement, cycle);
            ring.reverse();
            ring
        })
        .collect();

    let mut result = Vec::with_capacity(rings.len());
    for (i, shell) in rings.iter().enumerate() {
        let inside: Vec<usize> = (0..rings.len())
            .filter(|&j| j != i && contains(shell, &rings[j]))
            .collect();
        let holes: Vec<Vec<Point3>> = inside
            .iter()
            .filter(|&&j| !inside.iter().any(|&k| k != j && contains(&rings[k], &rings[j])))
            .map(|&j| rings[j].clone())
            .collect();
        let hole_area: f64 = holes.iter().map(|h| signed_area_2d(h).abs()).sum();
        result.push(Region {
            shell: shell.clone(),
            area: signed_area_2d(shell) - hole_area,
            holes,
        });
    }
    result
}

/// Returns `true` if ring `inner` lies inside ring `outer`.
///
/// Rings come from different components and so never touch; testing one
/// vertex is enough.
fn contains(outer: &[Point3], inner: &[Point3]) -> bool {
    inner
        .first()
        .is_some_and(|p| point_in_polygon_2d(&Point2::new(p.x, p.y), outer))
}

fn to_points(arrangement: &Arrangement, cycle: &[usize]) -> Vec<Point3> {
    cycle
        .iter()
        .map(|&i| {
            let p = arrangement.points[i];
            Point3::new(p.x, p.y, arrangement.heights[i])
        })
        .collect()
}

/// Repeatedly removes edges that end in a degree-1 vertex.
fn prune_dangles(point_count: usize, edges: &[(usize, usize)]) -> Vec<(usize, usize)> {
    let mut alive = vec![true; edges.len()];
    loop {
        let mut degree = vec![0usize; point_count];
        for (k, &(a, b)) in edges.iter().enumerate() {
            if alive[k] {
                degree[a] += 1;
                degree[b] += 1;
            }
        }
        let mut changed = false;
        for (k, &(a, b)) in edges.iter().enumerate() {
            if alive[k] && (degree[a] == 1 || degree[b] == 1) {
                alive[k] = false;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
    edges
        .iter()
        .zip(alive)
        .filter_map(|(&e, keep)| keep.then_some(e))
        .collect()
}

/// Traces every face boundary of the planar graph.
///
/// Half-edge `2k` runs along edge `k` forward, `2k + 1` backward. The walk
/// keeps the face on its left: from `u -> v` it continues with the first
/// outgoing edge of `v` clockwise from `v -> u`.
fn trace_face_cycles(points: &[Point2], edges: &[(usize, usize)]) -> Vec<Vec<usize>> {
    let origin = |h: usize| {
        let (a, b) = edges[h / 2];
        if h % 2 == 0 {
            a
        } else {
            b
        }
    };
    let target = |h: usize| origin(h ^ 1);

    let mut outgoing: Vec<Vec<usize>> = vec![Vec::new(); points.len()];
    for h in 0..edges.len() * 2 {
        outgoing[origin(h)].push(h);
    }
    let angle = |h: usize| {
        let (p, q) = (points[origin(h)], points[target(h)]);
        (q.y - p.y).atan2(q.x - p.x)
    };
    for list in &mut outgoing {
        list.sort_by(|&a, &b| angle(a).total_cmp(&angle(b)));
    }

    let next = |h: usize| {
        let twin = h ^ 1;
        let around = &outgoing[target(h)];
        let pos = around.iter().position(|&o| o == twin).unwrap_or(0);
        around[(pos + around.len() - 1) % around.len()]
    };

    let mut visited = vec![false; edges.len() * 2];
    let mut cycles = Vec::new();
    for start in 0..edges.len() * 2 {
        if visited[start] {
            continue;
        }
        let mut cycle = Vec::new();
        let mut h = start;
        while !visited[h] {
            visited[h] = true;
            cycle.push(origin(h));
            h = next(h);
        }
        cycles.push(cycle);
    }
    cycles
}

/// Labels each point with the index of its connected component.
fn label_components(point_count: usize, edges: &[(usize, usize)]) -> Vec<usize> {
    let mut parent: Vec<usize> = (0..point_count).collect();
    for &(a, b) in edges {
        let (ra, rb) = (find(&mut parent, a), find(&mut parent, b));
        if ra != rb {
            parent[ra] = rb;
        }
    }
    (0..point_count).map(|x| find(&mut parent, x)).collect()
}

/// Union-find root lookup with path halving.
fn find(parent: &mut [usize], mut x: usize) -> usize {
    while parent[x] != x {
        parent[x] = parent[parent[x]];
        x = parent[x];
    }
    x
}

#[cfg(test)]
mod tests {
    use super::super::noding;
    use super::*;

    fn seg(ax: f64, ay: f64, bx: f64, by: f64) -> (Point3, Point3) {
        (Point3::new(ax, ay, 0.0), Point3::new(bx, by, 0.0))
    }

    fn square(x0: f64, y0: f64, size: f64) -> Vec<(Point3, Point3)> {
        let (x1, y1) = (x0 + size, y0 + size);
        vec![
            seg(x0, y0, x1, y0),
            seg(x1, y0, x1, y1),
            seg(x1, y1, x0, y1),
            seg(x0, y1, x0, y0),
        ]
    }

    #[test]
    fn single_loop_gives_one_region() {
        let arr = noding::build(&square(0.0, 0.0, 10.0), 1e-6);
        let regions = regions(&arr);
        assert_eq!(regions.len(), 1);
        assert!((regions[0].area - 100.0).abs() < 1e-9);
        assert!(signed_area_2d(&regions[0].shell) > 0.0);
    }

    #[test]
    fn nested_loop_becomes_hole() {
        let mut segments = square(0.0, 0.0, 10.0);
        segments.extend(square(3.0, 3.0, 2.0));
        let arr = noding::build(&segments, 1e-6);
        let regions = regions(&arr);
        let outer = regions
            .iter()
            .max_by(|a, b| a.area.total_cmp(&b.area))
            .map(|r| (r.holes.len(), r.area));
        assert_eq!(outer.map(|o| o.0), Some(1));
        assert!((outer.map_or(0.0, |o| o.1) - 96.0).abs() < 1e-9);
    }

    #[test]
    fn island_inside_hole_is_not_a_hole() {
        let mut segments = square(0.0, 0.0, 10.0);
        segments.extend(square(2.0, 2.0, 6.0));
        segments.extend(square(4.0, 4.0, 2.0));
        let arr = noding::build(&segments, 1e-6);
        let regions = regions(&arr);
        let outer = regions
            .iter()
            .max_by(|a, b| a.area.total_cmp(&b.area))
            .map(|r| r.holes.len());
        assert_eq!(outer, Some(1));
    }

    #[test]
    fn interior_diagonal_does_not_split_region() {
        let mut segments = square(0.0, 0.0, 4.0);
        segments.push(seg(0.0, 0.0, 4.0, 4.0));
        let arr = noding::build(&segments, 1e-6);
        let regions = regions(&arr);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].shell.len(), 4);
    }

    #[test]
    fn dangling_edges_are_pruned() {
        let mut segments = square(0.0, 0.0, 4.0);
        segments.push(seg(4.0, 4.0, 8.0, 8.0));
        let arr = noding::build(&segments, 1e-6);
        let regions = regions(&arr);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].shell.len(), 4);
    }

    #[test]
    fn open_polyline_gives_nothing() {
        let arr = noding::build(&[seg(0.0, 0.0, 1.0, 0.0), seg(1.0, 0.0, 1.0, 1.0)], 1e-6);
        assert!(regions(&arr).is_empty());
    }
}
