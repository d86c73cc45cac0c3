//! Carries per-edge user overrides across roof regenerations.
//!
//! Generated meshes have no stable identity, so eave edges are found again
//! by the positions of their endpoints.

mod apply;
mod snapshot;
mod vertex_match;

pub use apply::{match_edges, ApplyOverrides, EdgeMatch, MatchReport};
pub use snapshot::{EdgeKey, EdgeOverride, EdgeOverrideSnapshot};
pub use vertex_match::{VertexMatch, VertexMatcher};
