use crate::math::{Point3, TOLERANCE};

/// Result of looking up one position among snapshot vertices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexMatch {
    /// Id of the chosen snapshot vertex.
    pub id: usize,
    /// Number of snapshot vertices within tolerance; more than one means the
    /// match was ambiguous and a tie-break decided.
    pub candidates: usize,
}

impl VertexMatch {
    /// Returns `true` if more than one snapshot vertex was within tolerance.
    #[must_use]
    pub fn is_ambiguous(&self) -> bool {
        self.candidates > 1
    }
}

/// Finds the snapshot vertex at a given position.
///
/// Among vertices within tolerance the nearest one wins; equal distances are
/// resolved by the smallest position (x, then y, then z), then by the lowest
/// id, so the choice never depends on enumeration order.
#[derive(Debug, Clone, Copy)]
pub struct VertexMatcher<'a> {
    vertices: &'a [Point3],
    tolerance: f64,
}

impl<'a> VertexMatcher<'a> {
    /// Creates a matcher over snapshot vertex positions.
    #[must_use]
    pub fn new(vertices: &'a [Point3]) -> Self {
        Self {
            vertices,
            tolerance: TOLERANCE,
        }
    }

    /// Sets the match radius.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Looks up the snapshot vertex matching `point`.
    #[must_use]
    pub fn find(&self, point: &Point3) -> Option<VertexMatch> {
        let candidates: Vec<(usize, f64)> = self
            .vertices
            .iter()
            .enumerate()
            .map(|(i, v)| (i, (v - point).norm()))
            .filter(|&(_, d)| d <= self.tolerance)
            .collect();
        let &(id, _) = candidates.iter().min_by(|&&(ia, da), &&(ib, db)| {
            let (pa, pb) = (&self.vertices[ia], &self.vertices[ib]);
            da.total_cmp(&db)
                .then(pa.x.total_cmp(&pb.x))
                .then(pa.y.total_cmp(&pb.y))
                .then(pa.z.total_cmp(&pb.z))
                .then(ia.cmp(&ib))
        })?;
        Some(VertexMatch {
            id,
            candidates: candidates.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearest_within_tolerance() {
        let verts = [Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)];
        let m = VertexMatcher::new(&verts).find(&Point3::new(1.0, 0.000_05, 0.0));
        assert_eq!(m, Some(VertexMatch { id: 1, candidates: 1 }));
        assert!(VertexMatcher::new(&verts)
            .find(&Point3::new(0.5, 0.0, 0.0))
            .is_none());
    }

    #[test]
    fn equidistant_candidates_pick_smallest_position() {
        let verts = [Point3::new(0.1, 0.0, 0.0), Point3::new(-0.1, 0.0, 0.0)];
        let matcher = VertexMatcher::new(&verts).with_tolerance(0.2);
        let m = matcher.find(&Point3::origin()).map(|m| (m.id, m.is_ambiguous()));
        assert_eq!(m, Some((1, true)));

        let reversed = [verts[1], verts[0]];
        let m = VertexMatcher::new(&reversed)
            .with_tolerance(0.2)
            .find(&Point3::origin())
            .map(|m| reversed[m.id]);
        assert_eq!(m, Some(verts[1]));
    }
}
