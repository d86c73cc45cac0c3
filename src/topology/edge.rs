use super::vertex::VertexId;

slotmap::new_key_type! {
    /// Unique identifier for an edge in the path store.
    pub struct EdgeId;
}

/// Data associated with a path edge.
///
/// Besides its endpoints, an edge carries the per-edge roof overrides a user
/// can set on an eave: a crease weight for hipped roofs and a gable end angle
/// for gabled roofs.
#[derive(Debug, Clone)]
pub struct EdgeData {
    /// Start vertex of the edge.
    pub start: VertexId,
    /// End vertex of the edge.
    pub end: VertexId,
    /// Crease weight in `[0, 1]`; `0` leaves the generated slope untouched.
    pub crease: f64,
    /// Gable end angle in degrees, if one was set.
    pub gable_angle: Option<f64>,
}

impl EdgeData {
    /// Creates a plain edge without overrides.
    #[must_use]
    pub fn new(start: VertexId, end: VertexId) -> Self {
        Self {
            start,
            end,
            crease: 0.0,
            gable_angle: None,
        }
    }

    /// Returns `true` if the edge connects `a` and `b` in either direction.
    #[must_use]
    pub fn connects(&self, a: VertexId, b: VertexId) -> bool {
        (self.start == a && self.end == b) || (self.start == b && self.end == a)
    }

    /// Returns the endpoint opposite to `v`.
    #[must_use]
    pub fn other(&self, v: VertexId) -> VertexId {
        if self.start == v {
            self.end
        } else {
            self.start
        }
    }
}
