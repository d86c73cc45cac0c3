use tracing::debug;

use super::{EdgeData, PathStore, VertexId};
use crate::math::polygon_2d::{cross_2d, segment_direction};

impl PathStore {
    /// Merges vertices closer than `dist` into the first one encountered.
    ///
    /// Edges are reattached to the surviving vertex; edges that collapse to a
    /// point or duplicate an existing edge are removed. Returns the number of
    /// vertices removed.
    pub fn remove_doubles(&mut self, dist: f64) -> usize {
        let ids: Vec<VertexId> = self.vertices.keys().collect();
        let mut removed = 0;
        for (i, &keep) in ids.iter().enumerate() {
            let Some(keep_point) = self.vertices.get(keep).map(|v| v.point) else {
                continue;
            };
            for &other in &ids[i + 1..] {
                let Some(v) = self.vertices.get(other) else {
                    continue;
                };
                if (v.point - keep_point).norm() > dist {
                    continue;
                }
                for e in self.edges.values_mut() {
                    if e.start == other {
                        e.start = keep;
                    }
                    if e.end == other {
                        e.end = keep;
                    }
                }
                self.vertices.remove(other);
                removed += 1;
            }
        }
        self.edges.retain(|_, e| e.start != e.end);
        self.dedupe_edges();
        if removed > 0 {
            debug!("merged {removed} duplicate path vertices");
        }
        removed
    }

    /// Dissolves vertices that join exactly two nearly collinear edges.
    ///
    /// A vertex is dissolved when the direction change between its two edges
    /// is at most `angle_limit` radians. The two edges are replaced by one; a
    /// non-zero override on either edge is kept. Returns the number of
    /// vertices dissolved.
    pub fn dissolve_limited(&mut self, angle_limit: f64) -> usize {
        let mut dissolved = 0;
        loop {
            let candidate = self
                .vertices
                .keys()
                .find(|&v| self.is_dissolvable(v, angle_limit));
            let Some(v) = candidate else {
                break;
            };
            let incident: Vec<_> = self
                .edges
                .iter()
                .filter(|(_, e)| e.start == v || e.end == v)
                .map(|(id, e)| (id, e.clone()))
                .collect();
            let [(id_a, a), (id_b, b)] = incident.as_slice() else {
                break;
            };
            let mut merged = EdgeData::new(a.other(v), b.other(v));
            merged.crease = if a.crease.abs() > 0.0 { a.crease } else { b.crease };
            merged.gable_angle = a.gable_angle.or(b.gable_angle);
            self.edges.remove(*id_a);
            self.edges.remove(*id_b);
            self.vertices.remove(v);
            if merged.start != merged.end {
                self.edges.insert(merged);
            }
            dissolved += 1;
        }
        self.dedupe_edges();
        if dissolved > 0 {
            debug!("dissolved {dissolved} collinear path vertices");
        }
        dissolved
    }

    fn is_dissolvable(&self, v: VertexId, angle_limit: f64) -> bool {
        let mut neighbours = self.edges.values().filter_map(|e| {
            if e.start == v {
                Some(e.end)
            } else if e.end == v {
                Some(e.start)
            } else {
                None
            }
        });
        let (Some(a), Some(b), None) = (neighbours.next(), neighbours.next(), neighbours.next())
        else {
            return false;
        };
        if a == b {
            return false;
        }
        let (Some(pa), Some(pv), Some(pb)) = (
            self.vertices.get(a).map(|d| d.point),
            self.vertices.get(v).map(|d| d.point),
            self.vertices.get(b).map(|d| d.point),
        ) else {
            return false;
        };
        let (Ok(d_in), Ok(d_out)) = (segment_direction(&pa, &pv), segment_direction(&pv, &pb)) else {
            return false;
        };
        let turn = cross_2d(&d_in, &d_out).atan2(d_in.dot(&d_out)).abs();
        turn <= angle_limit
    }

    /// Removes edges that connect the same pair of vertices as an earlier edge.
    fn dedupe_edges(&mut self) {
        let mut seen: Vec<(VertexId, VertexId)> = Vec::new();
        self.edges.retain(|_, e| {
            if seen.iter().any(|&(a, b)| e.connects(a, b)) {
                false
            } else {
                seen.push((e.start, e.end));
                true
            }
        });
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::math::Point3;
    use crate::topology::PathStore;

    fn p(x: f64, y: f64) -> Point3 {
        Point3::new(x, y, 0.0)
    }

    fn ring(store: &mut PathStore, pts: &[Point3]) {
        let ids: Vec<_> = pts.iter().map(|pt| store.add_vertex(*pt)).collect();
        for i in 0..ids.len() {
            store.add_edge(ids[i], ids[(i + 1) % ids.len()]).unwrap();
        }
    }

    #[test]
    fn remove_doubles_merges_close_vertices() {
        let mut store = PathStore::new();
        let a = store.add_vertex(p(0.0, 0.0));
        let b = store.add_vertex(p(1.0, 0.0));
        let b2 = store.add_vertex(p(1.0, 0.000_01));
        let c = store.add_vertex(p(1.0, 1.0));
        store.add_edge(a, b).unwrap();
        store.add_edge(b2, c).unwrap();
        store.add_edge(b, b2).unwrap();
        assert_eq!(store.remove_doubles(1e-4), 1);
        assert_eq!(store.vertex_count(), 3);
        assert_eq!(store.edge_count(), 2);
        assert_eq!(store.degree(b), 2);
    }

    #[test]
    fn dissolve_limited_removes_midpoints() {
        let mut store = PathStore::new();
        ring(
            &mut store,
            &[p(0.0, 0.0), p(5.0, 0.0), p(10.0, 0.0), p(10.0, 10.0), p(0.0, 10.0)],
        );
        assert_eq!(store.dissolve_limited(0.087_266_5), 1);
        assert_eq!(store.vertex_count(), 4);
        assert_eq!(store.edge_count(), 4);
    }

    #[test]
    fn dissolve_limited_keeps_corners() {
        let mut store = PathStore::new();
        ring(&mut store, &[p(0.0, 0.0), p(10.0, 0.0), p(10.0, 10.0), p(0.0, 10.0)]);
        assert_eq!(store.dissolve_limited(0.087_266_5), 0);
    }

    #[test]
    fn dissolve_carries_crease_to_merged_edge() {
        let mut store = PathStore::new();
        ring(
            &mut store,
            &[p(0.0, 0.0), p(5.0, 0.0), p(10.0, 0.0), p(10.0, 10.0), p(0.0, 10.0)],
        );
        let a = store
            .vertices()
            .find(|(_, v)| v.point == p(5.0, 0.0))
            .map(|(id, _)| id)
            .unwrap();
        let b = store
            .vertices()
            .find(|(_, v)| v.point == p(10.0, 0.0))
            .map(|(id, _)| id)
            .unwrap();
        let e = store.find_edge(a, b).unwrap();
        store.set_crease(e, 0.5).unwrap();
        store.dissolve_limited(0.087_266_5);
        assert!(store.edges().any(|(_, e)| (e.crease - 0.5).abs() < 1e-12));
    }
}
