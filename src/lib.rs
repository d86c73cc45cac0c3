//! Roof surface synthesis over user-drawn footprints.
//!
//! A footprint path is reduced to a polygon, a hipped roof is raised over it
//! with a straight skeleton, and per-edge overrides (crease, gable angle)
//! are re-identified by position and re-applied after every regeneration.

pub mod error;
pub mod geometry;
pub mod math;
pub mod mesh;
pub mod operations;
pub mod session;
pub mod tessellation;
pub mod topology;

pub use error::{Result, RoofError};
pub use geometry::{FootprintPolygon, RoofKind, SlopeSpec};
pub use mesh::RoofMesh;
pub use session::{RoofConfig, RoofRecord, RoofSession, SessionState};
