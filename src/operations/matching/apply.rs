use std::collections::HashMap;

use tracing::{debug, warn};

use crate::math::edge_frame::EdgeFrame;
use crate::math::{is_near_zero, is_near_zero_eps, Point3, TOLERANCE};
use crate::mesh::RoofMesh;

use super::snapshot::{EdgeKey, EdgeOverride, EdgeOverrideSnapshot};
use super::vertex_match::VertexMatcher;

/// One eave edge of a new mesh re-identified in a snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeMatch {
    /// Mesh vertex indices of the eave edge.
    pub edge: [usize; 2],
    /// Snapshot key the edge matched.
    pub key: EdgeKey,
    /// Override recorded for that key.
    pub value: EdgeOverride,
    /// Whether a tie-break decided one of the endpoint matches.
    pub ambiguous: bool,
}

/// Outcome of matching a new mesh against a snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchReport {
    /// Eave edges found in the snapshot.
    pub matched: Vec<EdgeMatch>,
    /// Eave edges with no counterpart; they are new and carry no override.
    pub unmatched: Vec<[usize; 2]>,
    /// Mesh vertices that had several snapshot candidates.
    pub ambiguous_vertices: Vec<usize>,
    /// Number of roof vertices moved by overrides.
    pub moved_vertices: usize,
    /// Roof angle in degrees measured at the first eave edge before any
    /// override was applied.
    pub roof_angle: Option<f64>,
}

impl MatchReport {
    /// Override matched onto the eave edge `a`-`b`, in either direction.
    #[must_use]
    pub fn override_for(&self, a: usize, b: usize) -> Option<EdgeOverride> {
        self.matched
            .iter()
            .find(|m| (m.edge[0] == a && m.edge[1] == b) || (m.edge[0] == b && m.edge[1] == a))
            .map(|m| m.value)
    }

    /// Returns `true` if any match relied on a tie-break.
    #[must_use]
    pub fn is_ambiguous(&self) -> bool {
        !self.ambiguous_vertices.is_empty()
    }
}

/// Re-identifies the eave edges of `mesh` in `snapshot` by position.
///
/// Each endpoint is matched on its own, so the result does not depend on the
/// order in which old or new edges are enumerated.
#[must_use]
pub fn match_edges(mesh: &RoofMesh, snapshot: &EdgeOverrideSnapshot, tolerance: f64) -> MatchReport {
    let matcher = VertexMatcher::new(snapshot.vertices()).with_tolerance(tolerance);
    let mut report = MatchReport::default();
    let mut lookup = HashMap::new();
    let mut find = |v: usize, report: &mut MatchReport| {
        *lookup.entry(v).or_insert_with(|| {
            let found = matcher.find(&mesh.vertices[v]);
            if let Some(m) = found.filter(|m| m.is_ambiguous()) {
                let p = mesh.vertices[v];
                warn!(
                    "vertex ({:.4}, {:.4}, {:.4}) has {} snapshot candidates, using {}",
                    p.x, p.y, p.z, m.candidates, m.id
                );
                report.ambiguous_vertices.push(v);
            }
            found
        })
    };

    for edge in mesh.footprint_edges() {
        let (Some(ma), Some(mb)) = (find(edge[0], &mut report), find(edge[1], &mut report)) else {
            report.unmatched.push(edge);
            continue;
        };
        let key = EdgeKey::new(ma.id, mb.id);
        match snapshot.get(&key).filter(|_| ma.id != mb.id) {
            Some(value) => report.matched.push(EdgeMatch {
                edge,
                key,
                value,
                ambiguous: ma.is_ambiguous() || mb.is_ambiguous(),
            }),
            None => report.unmatched.push(edge),
        }
    }
    debug!(
        "matched {} eave edges, {} new",
        report.matched.len(),
        report.unmatched.len()
    );
    report
}

/// Re-applies recorded per-edge overrides to a freshly generated roof.
///
/// Crease weights pull the roof vertices opposite an eave toward it
/// (`1` makes the facet vertical); gable angles re-pitch the facet to the
/// requested angle. Heights are never changed. Overrides on successive edges
/// compose on already-moved positions.
#[derive(Debug)]
pub struct ApplyOverrides<'a> {
    snapshot: &'a EdgeOverrideSnapshot,
    tolerance: f64,
}

impl<'a> ApplyOverrides<'a> {
    /// Creates a new application of `snapshot`.
    #[must_use]
    pub fn new(snapshot: &'a EdgeOverrideSnapshot) -> Self {
        Self {
            snapshot,
            tolerance: TOLERANCE,
        }
    }

    /// Sets the matching tolerance.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Matches and deforms `mesh` in place, returning the match report.
    ///
    /// Overrides that cannot be applied are skipped with a warning; the mesh
    /// is then left as generated for that edge.
    pub fn execute(&self, mesh: &mut RoofMesh) -> MatchReport {
        let mut report = match_edges(mesh, self.snapshot, self.tolerance);
        report.roof_angle = roof_angle(mesh);

        let mut moved: HashMap<usize, Point3> = HashMap::new();
        for m in &report.matched {
            if !m.value.is_active() {
                if let EdgeOverride::GableAngle(angle) = m.value {
                    if !is_near_zero(angle) {
                        warn!("ignoring gable angle {angle} outside (0, 90] degrees");
                    }
                }
                continue;
            }
            let [a, b] = m.edge;
            let Ok(frame) = EdgeFrame::new(&mesh.vertices[a], &mesh.vertices[b]) else {
                warn!("eave edge {a}-{b} has no length, override skipped");
                continue;
            };
            let Some(&face) = mesh.faces_containing_edge(a, b).first() else {
                warn!("eave edge {a}-{b} bounds no facet, override skipped");
                continue;
            };
            for v in mesh.opposite_vertices(face, a, b) {
                let current = moved.get(&v).copied().unwrap_or(mesh.vertices[v]);
                if is_near_zero_eps(frame.project(&current).height, self.tolerance) {
                    continue;
                }
                let factor = match m.value {
                    EdgeOverride::Crease(c) => 1.0 - c.abs().clamp(0.0, 1.0),
                    EdgeOverride::GableAngle(theta) => gable_factor(&frame, &current, theta),
                };
                moved.insert(v, frame.scale_offset(&current, factor));
            }
        }

        report.moved_vertices = moved.len();
        for (v, p) in moved {
            mesh.vertices[v] = p;
        }
        if report.moved_vertices > 0 {
            debug!("overrides moved {} roof vertices", report.moved_vertices);
        }
        report
    }
}

/// Offset factor that turns the current elevation angle into `theta`.
fn gable_factor(frame: &EdgeFrame, point: &Point3, theta: f64) -> f64 {
    if theta >= 90.0 {
        return 0.0;
    }
    let phi = frame.elevation_angle(point);
    phi.to_radians().tan() / theta.to_radians().tan()
}

/// Elevation angle between the first eave edge and a vertex opposite it.
fn roof_angle(mesh: &RoofMesh) -> Option<f64> {
    let [a, b] = *mesh.footprint_edges().first()?;
    let face = *mesh.faces_containing_edge(a, b).first()?;
    let top = *mesh.opposite_vertices(face, a, b).first()?;
    let frame = EdgeFrame::new(&mesh.vertices[a], &mesh.vertices[b]).ok()?;
    Some(frame.elevation_angle(&mesh.vertices[top]))
}
