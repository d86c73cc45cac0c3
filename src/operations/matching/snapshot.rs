use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::geometry::RoofKind;
use crate::math::{is_near_zero_eps, Point3, TOLERANCE};
use crate::mesh::RoofMesh;
use crate::topology::PathStore;

use super::apply::MatchReport;

/// Unordered pair of snapshot vertex ids identifying an edge.
///
/// `EdgeKey::new(a, b) == EdgeKey::new(b, a)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeKey(usize, usize);

impl EdgeKey {
    /// Creates a key from two vertex ids in any order.
    #[must_use]
    pub fn new(a: usize, b: usize) -> Self {
        Self(a.min(b), a.max(b))
    }

    /// The two vertex ids, smaller first.
    #[must_use]
    pub fn endpoints(&self) -> (usize, usize) {
        (self.0, self.1)
    }
}

/// A per-edge user override carried across regenerations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EdgeOverride {
    /// Hip crease weight; `1` pulls the hip facet into a vertical gable.
    Crease(f64),
    /// Gable end angle in degrees.
    GableAngle(f64),
}

impl EdgeOverride {
    /// Returns `true` if applying the override would deform the roof.
    #[must_use]
    pub fn is_active(&self) -> bool {
        match *self {
            Self::Crease(c) => c.abs() > 0.0,
            Self::GableAngle(a) => a > 0.0 && a <= 90.0,
        }
    }

    /// Magnitude used to pick between two overrides for the same edge.
    fn strength(&self) -> f64 {
        match *self {
            Self::Crease(v) | Self::GableAngle(v) => v.abs(),
        }
    }
}

/// Override values keyed by edge, with the positions needed to find those
/// edges again after the mesh has been rebuilt.
///
/// Vertex positions are deduplicated on insertion, so one position has one id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "SnapshotData", into = "SnapshotData")]
pub struct EdgeOverrideSnapshot {
    vertices: Vec<Point3>,
    overrides: HashMap<EdgeKey, EdgeOverride>,
    tolerance: f64,
}

impl EdgeOverrideSnapshot {
    /// Creates an empty snapshot merging positions closer than `tolerance`.
    #[must_use]
    pub fn new(tolerance: f64) -> Self {
        Self {
            vertices: Vec::new(),
            overrides: HashMap::new(),
            tolerance,
        }
    }

    /// Captures the overrides of every path edge for the given roof kind.
    ///
    /// Edges without an override are recorded with a zero value: they still
    /// take part in matching but never deform the roof.
    #[must_use]
    pub fn capture(path: &PathStore, kind: RoofKind, tolerance: f64) -> Self {
        let mut snapshot = Self::new(tolerance);
        for (id, edge) in path.edges() {
            let Ok((a, b)) = path.edge_points(id) else {
                continue;
            };
            let value = match kind {
                RoofKind::Hipped => EdgeOverride::Crease(edge.crease),
                RoofKind::Gabled => EdgeOverride::GableAngle(edge.gable_angle.unwrap_or(0.0)),
            };
            snapshot.insert(a, b, value);
        }
        snapshot
    }

    /// Captures the overrides a match assigned to the eave edges of `mesh`.
    ///
    /// Eave edges are the edges whose endpoints both lie at the lowest height
    /// of the mesh.
    #[must_use]
    pub fn capture_footprint(mesh: &RoofMesh, report: &MatchReport, tolerance: f64) -> Self {
        let base = mesh.min_z();
        let at_eave = |i: usize| is_near_zero_eps(mesh.vertices[i].z - base, tolerance);
        let mut snapshot = Self::new(tolerance);
        for [a, b] in mesh.footprint_edges() {
            if !(at_eave(a) && at_eave(b)) {
                continue;
            }
            if let Some(value) = report.override_for(a, b) {
                snapshot.insert(mesh.vertices[a], mesh.vertices[b], value);
            }
        }
        snapshot
    }

    /// Records `value` for the edge between two positions.
    ///
    /// When the edge is already present the stronger active override wins,
    /// so the result does not depend on insertion order.
    pub fn insert(&mut self, a: Point3, b: Point3, value: EdgeOverride) -> Option<EdgeKey> {
        let ia = self.ensure_vertex(a);
        let ib = self.ensure_vertex(b);
        if ia == ib {
            return None;
        }
        let key = EdgeKey::new(ia, ib);
        let keep_old = self.overrides.get(&key).is_some_and(|old| {
            (old.is_active() && !value.is_active())
                || (old.is_active() == value.is_active() && old.strength() >= value.strength())
        });
        if !keep_old {
            self.overrides.insert(key, value);
        }
        Some(key)
    }

    fn ensure_vertex(&mut self, p: Point3) -> usize {
        if let Some(i) = self
            .vertices
            .iter()
            .position(|v| (v - p).norm() <= self.tolerance)
        {
            return i;
        }
        self.vertices.push(p);
        self.vertices.len() - 1
    }

    /// The override recorded for `key`.
    #[must_use]
    pub fn get(&self, key: &EdgeKey) -> Option<EdgeOverride> {
        self.overrides.get(key).copied()
    }

    /// Snapshot vertex positions, indexed by id.
    #[must_use]
    pub fn vertices(&self) -> &[Point3] {
        &self.vertices
    }

    /// Iterates all recorded edges.
    pub fn iter(&self) -> impl Iterator<Item = (&EdgeKey, &EdgeOverride)> {
        self.overrides.iter()
    }

    /// Number of recorded edges.
    #[must_use]
    pub fn len(&self) -> usize {
        self.overrides.len()
    }

    /// Returns `true` if no edge is recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }

    /// Returns `true` if any recorded override would deform a roof.
    #[must_use]
    pub fn has_active(&self) -> bool {
        self.overrides.values().any(EdgeOverride::is_active)
    }

    /// Merge tolerance of the snapshot.
    #[must_use]
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Scales all positions by `factor`.
    #[must_use]
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            vertices: self
                .vertices
                .iter()
                .map(|p| Point3::from(p.coords * factor))
                .collect(),
            overrides: self.overrides.clone(),
            tolerance: self.tolerance,
        }
    }
}

impl Default for EdgeOverrideSnapshot {
    fn default() -> Self {
        Self::new(TOLERANCE)
    }
}

/// Serialized form: positions plus a flat edge list, sorted by key.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SnapshotData {
    verts: Vec<Point3>,
    edges: Vec<SnapshotEdge>,
    tolerance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SnapshotEdge {
    a: usize,
    b: usize,
    value: EdgeOverride,
}

impl From<EdgeOverrideSnapshot> for SnapshotData {
    fn from(snapshot: EdgeOverrideSnapshot) -> Self {
        let mut edges: Vec<SnapshotEdge> = snapshot
            .overrides
            .iter()
            .map(|(key, &value)| SnapshotEdge {
                a: key.0,
                b: key.1,
                value,
            })
            .collect();
        edges.sort_by_key(|e| (e.a, e.b));
        Self {
            verts: snapshot.vertices,
            edges,
            tolerance: snapshot.tolerance,
        }
    }
}

impl From<SnapshotData> for EdgeOverrideSnapshot {
    fn from(data: SnapshotData) -> Self {
        let count = data.verts.len();
        Self {
            overrides: data
                .edges
                .into_iter()
                .filter(|e| e.a < count && e.b < count && e.a != e.b)
                .map(|e| (EdgeKey::new(e.a, e.b), e.value))
                .collect(),
            vertices: data.verts,
            tolerance: data.tolerance,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geometry::FootprintPolygon;

    fn p(x: f64, y: f64) -> Point3 {
        Point3::new(x, y, 0.0)
    }

    #[test]
    fn edge_key_is_unordered() {
        assert_eq!(EdgeKey::new(3, 1), EdgeKey::new(1, 3));
        assert_eq!(EdgeKey::new(3, 1).endpoints(), (1, 3));
    }

    #[test]
    fn positions_are_deduplicated() {
        let mut snapshot = EdgeOverrideSnapshot::new(1e-4);
        let k1 = snapshot.insert(p(0.0, 0.0), p(1.0, 0.0), EdgeOverride::Crease(0.5));
        let k2 = snapshot.insert(p(1.0, 0.000_01), p(1.0, 1.0), EdgeOverride::Crease(0.0));
        assert_eq!(snapshot.vertices().len(), 3);
        assert_eq!(k1.unwrap().endpoints().1, k2.unwrap().endpoints().0);
    }

    #[test]
    fn stronger_override_wins_regardless_of_order() {
        let mut first = EdgeOverrideSnapshot::new(1e-4);
        first.insert(p(0.0, 0.0), p(1.0, 0.0), EdgeOverride::Crease(0.0));
        first.insert(p(1.0, 0.0), p(0.0, 0.0), EdgeOverride::Crease(0.7));
        let mut second = EdgeOverrideSnapshot::new(1e-4);
        second.insert(p(1.0, 0.0), p(0.0, 0.0), EdgeOverride::Crease(0.7));
        second.insert(p(0.0, 0.0), p(1.0, 0.0), EdgeOverride::Crease(0.0));
        let key = EdgeKey::new(0, 1);
        assert_eq!(first.get(&key), Some(EdgeOverride::Crease(0.7)));
        assert_eq!(second.get(&key), Some(EdgeOverride::Crease(0.7)));
    }

    #[test]
    fn capture_reads_the_active_kind() {
        let mut path = PathStore::from_footprint(&FootprintPolygon::rectangle(2.0));
        let (id, _) = path.edges().next().unwrap();
        path.set_crease(id, 1.0).unwrap();
        path.set_gable_angle(id, Some(60.0)).unwrap();

        let hipped = EdgeOverrideSnapshot::capture(&path, RoofKind::Hipped, 1e-4);
        assert_eq!(hipped.len(), 4);
        assert_eq!(hipped.iter().filter(|(_, v)| v.is_active()).count(), 1);
        assert!(hipped.iter().all(|(_, v)| matches!(v, EdgeOverride::Crease(_))));

        let gabled = EdgeOverrideSnapshot::capture(&path, RoofKind::Gabled, 1e-4);
        assert!(gabled
            .iter()
            .any(|(_, v)| *v == EdgeOverride::GableAngle(60.0)));
    }

    #[test]
    fn gable_angle_range() {
        assert!(EdgeOverride::GableAngle(90.0).is_active());
        assert!(!EdgeOverride::GableAngle(0.0).is_active());
        assert!(!EdgeOverride::GableAngle(120.0).is_active());
        assert!(EdgeOverride::Crease(-0.5).is_active());
    }

    #[test]
    fn json_round_trip_preserves_keys() {
        let mut snapshot = EdgeOverrideSnapshot::new(1e-4);
        snapshot.insert(p(0.0, 0.0), p(4.0, 0.0), EdgeOverride::GableAngle(45.0));
        snapshot.insert(p(4.0, 0.0), p(4.0, 4.0), EdgeOverride::Crease(0.25));
        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(json.contains("\"GABLE_ANGLE\""));
        let back: EdgeOverrideSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
    }
}
