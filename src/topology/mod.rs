pub mod edge;
mod simplify;
pub mod vertex;

pub use edge::{EdgeData, EdgeId};
pub use vertex::{VertexData, VertexId};

use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

use crate::error::TopologyError;
use crate::geometry::FootprintPolygon;
use crate::math::Point3;

/// Arena holding the editable roof path: the line loops a user draws and
/// reshapes before a roof is generated over them.
///
/// Vertices and edges reference each other via typed IDs (generational
/// indices); removing a vertex removes its incident edges.
#[derive(Debug, Default, Clone)]
pub struct PathStore {
    vertices: SlotMap<VertexId, VertexData>,
    edges: SlotMap<EdgeId, EdgeData>,
}

impl PathStore {
    /// Creates a new, empty path store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a path from the rings of a footprint.
    #[must_use]
    pub fn from_footprint(footprint: &FootprintPolygon) -> Self {
        let mut store = Self::new();
        for ring in std::iter::once(&footprint.outer).chain(footprint.holes.iter()) {
            let ids: Vec<VertexId> = ring.iter().map(|p| store.add_vertex(*p)).collect();
            for i in 0..ids.len() {
                let (a, b) = (ids[i], ids[(i + 1) % ids.len()]);
                store.edges.insert(EdgeData::new(a, b));
            }
        }
        store
    }

    /// Rebuilds a path from its serialized form.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::EntityNotFound` if an edge references a vertex
    /// index outside `data.verts`.
    pub fn from_path_data(data: &PathData) -> Result<Self, TopologyError> {
        let mut store = Self::new();
        let ids: Vec<VertexId> = data.verts.iter().map(|p| store.add_vertex(*p)).collect();
        for &[a, b] in &data.edges {
            let (Some(&va), Some(&vb)) = (ids.get(a), ids.get(b)) else {
                return Err(TopologyError::EntityNotFound(format!(
                    "path vertex {} of {}",
                    a.max(b),
                    ids.len()
                )));
            };
            store.add_edge(va, vb)?;
        }
        Ok(store)
    }

    /// Serializes the path with dense vertex indices.
    #[must_use]
    pub fn to_path_data(&self) -> PathData {
        let mut index = slotmap::SecondaryMap::new();
        let mut verts = Vec::with_capacity(self.vertices.len());
        for (id, v) in &self.vertices {
            index.insert(id, verts.len());
            verts.push(v.point);
        }
        let edges = self
            .edges
            .values()
            .filter_map(|e| Some([*index.get(e.start)?, *index.get(e.end)?]))
            .collect();
        PathData { verts, edges }
    }

    // --- Vertex operations ---

    /// Inserts a vertex and returns its ID.
    pub fn add_vertex(&mut self, point: Point3) -> VertexId {
        self.vertices.insert(VertexData::new(point))
    }

    /// Returns a reference to the vertex data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn vertex(&self, id: VertexId) -> Result<&VertexData, TopologyError> {
        self.vertices
            .get(id)
            .ok_or_else(|| TopologyError::EntityNotFound("vertex".into()))
    }

    /// Returns a mutable reference to the vertex data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn vertex_mut(&mut self, id: VertexId) -> Result<&mut VertexData, TopologyError> {
        self.vertices
            .get_mut(id)
            .ok_or_else(|| TopologyError::EntityNotFound("vertex".into()))
    }

    /// Removes a vertex together with its incident edges.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn remove_vertex(&mut self, id: VertexId) -> Result<VertexData, TopologyError> {
        let data = self
            .vertices
            .remove(id)
            .ok_or_else(|| TopologyError::EntityNotFound("vertex".into()))?;
        self.edges.retain(|_, e| e.start != id && e.end != id);
        Ok(data)
    }

    /// Iterates all vertices.
    pub fn vertices(&self) -> impl Iterator<Item = (VertexId, &VertexData)> {
        self.vertices.iter()
    }

    /// Number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    // --- Edge operations ---

    /// Connects two existing vertices and returns the new edge's ID.
    ///
    /// # Errors
    ///
    /// Returns `EntityNotFound` if either vertex is missing, or
    /// `InvalidTopology` if both ends are the same vertex.
    pub fn add_edge(&mut self, start: VertexId, end: VertexId) -> Result<EdgeId, TopologyError> {
        self.vertex(start)?;
        self.vertex(end)?;
        if start == end {
            return Err(TopologyError::InvalidTopology(
                "edge endpoints must differ".into(),
            ));
        }
        Ok(self.edges.insert(EdgeData::new(start, end)))
    }

    /// Returns a reference to the edge data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn edge(&self, id: EdgeId) -> Result<&EdgeData, TopologyError> {
        self.edges
            .get(id)
            .ok_or_else(|| TopologyError::EntityNotFound("edge".into()))
    }

    /// Returns a mutable reference to the edge data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn edge_mut(&mut self, id: EdgeId) -> Result<&mut EdgeData, TopologyError> {
        self.edges
            .get_mut(id)
            .ok_or_else(|| TopologyError::EntityNotFound("edge".into()))
    }

    /// Removes an edge, leaving its vertices in place.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn remove_edge(&mut self, id: EdgeId) -> Result<EdgeData, TopologyError> {
        self.edges
            .remove(id)
            .ok_or_else(|| TopologyError::EntityNotFound("edge".into()))
    }

    /// Iterates all edges.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &EdgeData)> {
        self.edges.iter()
    }

    /// Number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Returns the edge connecting `a` and `b`, if any.
    #[must_use]
    pub fn find_edge(&self, a: VertexId, b: VertexId) -> Option<EdgeId> {
        self.edges
            .iter()
            .find_map(|(id, e)| e.connects(a, b).then_some(id))
    }

    /// Sets the crease weight of an edge, clamped to `[0, 1]`.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn set_crease(&mut self, id: EdgeId, crease: f64) -> Result<(), TopologyError> {
        self.edge_mut(id)?.crease = crease.clamp(0.0, 1.0);
        Ok(())
    }

    /// Sets or clears the gable end angle (degrees) of an edge.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn set_gable_angle(&mut self, id: EdgeId, angle: Option<f64>) -> Result<(), TopologyError> {
        self.edge_mut(id)?.gable_angle = angle;
        Ok(())
    }

    /// Endpoint positions of an edge.
    ///
    /// # Errors
    ///
    /// Returns an error if the edge or one of its vertices is missing.
    pub fn edge_points(&self, id: EdgeId) -> Result<(Point3, Point3), TopologyError> {
        let e = self.edge(id)?;
        Ok((self.vertex(e.start)?.point, self.vertex(e.end)?.point))
    }

    /// All edges as positional line segments, the input of footprint extraction.
    #[must_use]
    pub fn segments(&self) -> Vec<(Point3, Point3)> {
        self.edges
            .keys()
            .filter_map(|id| self.edge_points(id).ok())
            .collect()
    }

    /// Vertex degree (number of incident edges).
    #[must_use]
    pub fn degree(&self, id: VertexId) -> usize {
        self.edges
            .values()
            .filter(|e| e.start == id || e.end == id)
            .count()
    }
}

/// Serialized path: vertex positions and index pairs.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PathData {
    /// Vertex positions.
    pub verts: Vec<Point3>,
    /// Edges as index pairs into `verts`.
    pub edges: Vec<[usize; 2]>,
}

impl PathData {
    /// Returns `true` if the path has no usable geometry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.verts.is_empty() || self.edges.is_empty()
    }

    /// Scales all coordinates by `factor`.
    #[must_use]
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            verts: self.verts.iter().map(|p| Point3::from(p.coords * factor)).collect(),
            edges: self.edges.clone(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point3 {
        Point3::new(x, y, 0.0)
    }

    #[test]
    fn footprint_path_has_one_edge_per_side() {
        let store = PathStore::from_footprint(&FootprintPolygon::rectangle(5.0));
        assert_eq!(store.vertex_count(), 4);
        assert_eq!(store.edge_count(), 4);
        assert!(store.vertices().all(|(id, _)| store.degree(id) == 2));
    }

    #[test]
    fn removing_vertex_drops_incident_edges() {
        let mut store = PathStore::new();
        let a = store.add_vertex(p(0.0, 0.0));
        let b = store.add_vertex(p(1.0, 0.0));
        let c = store.add_vertex(p(1.0, 1.0));
        store.add_edge(a, b).unwrap();
        store.add_edge(b, c).unwrap();
        store.remove_vertex(b).unwrap();
        assert_eq!(store.edge_count(), 0);
        assert!(store.vertex(b).is_err());
    }

    #[test]
    fn self_loop_is_rejected() {
        let mut store = PathStore::new();
        let a = store.add_vertex(p(0.0, 0.0));
        assert!(store.add_edge(a, a).is_err());
    }

    #[test]
    fn crease_is_clamped() {
        let mut store = PathStore::from_footprint(&FootprintPolygon::rectangle(1.0));
        let (id, _) = store.edges().next().unwrap();
        store.set_crease(id, 3.0).unwrap();
        assert!((store.edge(id).unwrap().crease - 1.0).abs() < 1e-12);
    }

    #[test]
    fn path_data_round_trip() {
        let store = PathStore::from_footprint(&FootprintPolygon::rectangle(2.0));
        let data = store.to_path_data();
        assert_eq!(data.verts.len(), 4);
        assert_eq!(data.edges.len(), 4);
        let rebuilt = PathStore::from_path_data(&data).unwrap();
        assert_eq!(rebuilt.to_path_data(), data);
    }

    #[test]
    fn path_data_with_bad_index_fails() {
        let data = PathData {
            verts: vec![p(0.0, 0.0)],
            edges: vec![[0, 3]],
        };
        assert!(PathStore::from_path_data(&data).is_err());
    }

    #[test]
    fn find_edge_ignores_direction() {
        let mut store = PathStore::new();
        let a = store.add_vertex(p(0.0, 0.0));
        let b = store.add_vertex(p(1.0, 0.0));
        let e = store.add_edge(a, b).unwrap();
        assert_eq!(store.find_edge(b, a), Some(e));
    }
}
