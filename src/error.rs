use thiserror::Error;

/// Top-level error type for roof synthesis.
#[derive(Debug, Error)]
pub enum RoofError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Topology(#[from] TopologyError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Skeleton(#[from] SkeletonError),

    #[error(transparent)]
    Tessellation(#[from] TessellationError),

    #[error(transparent)]
    Match(#[from] MatchError),

    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Errors related to geometric computations.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("degenerate geometry: {0}")]
    Degenerate(String),
}

/// Errors related to the editable path arena.
#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("entity not found: {0}")]
    EntityNotFound(String),

    #[error("invalid topology: {0}")]
    InvalidTopology(String),
}

/// Errors raised while reducing an edge soup to a footprint.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("no closed boundary found among {segments} segments")]
    NoBoundary { segments: usize },
}

/// Errors raised by the straight-skeleton wavefront.
#[derive(Debug, Error)]
pub enum SkeletonError {
    #[error("skeleton did not converge: {0}")]
    Divergence(String),
}

/// Errors related to tessellation.
#[derive(Debug, Error)]
pub enum TessellationError {
    #[error("tessellation failed: {0}")]
    Failed(String),
}

/// Errors raised while re-identifying edges across regenerations.
#[derive(Debug, Error)]
pub enum MatchError {
    /// Reserved: ambiguous matches are currently resolved by a deterministic
    /// tie-break and only reported.
    #[error("{candidates} candidates within tolerance of ({x}, {y}, {z})")]
    Ambiguous {
        candidates: usize,
        x: f64,
        y: f64,
        z: f64,
    },
}

/// Errors related to the editing session and its persisted record.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("cannot {operation} while {state}")]
    InvalidState {
        operation: &'static str,
        state: &'static str,
    },

    #[error("roof record serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience type alias for results using [`RoofError`].
pub type Result<T> = std::result::Result<T, RoofError>;
