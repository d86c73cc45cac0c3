use serde::{Deserialize, Serialize};

use crate::error::{Result, SessionError};
use crate::geometry::{RoofKind, SlopeSpec};
use crate::operations::matching::EdgeOverrideSnapshot;
use crate::topology::PathData;

/// The committed state of a roof, in stored units.
///
/// This is the blob a host persists alongside the roof element; its layout
/// is opaque to the host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoofRecord {
    /// Roof kind.
    pub kind: RoofKind,
    /// Slope the roof was generated with.
    pub slope: SlopeSpec,
    /// Footprint path.
    pub path: PathData,
    /// Per-edge overrides of the active kind.
    pub overrides: EdgeOverrideSnapshot,
}

impl RoofRecord {
    /// Serializes the record to JSON.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Serialization` if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self).map_err(SessionError::from)?)
    }

    /// Parses a record from JSON.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Serialization` for malformed input.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json).map_err(SessionError::from)?)
    }

    /// Scales every length (path, override positions, ridge height).
    #[must_use]
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            kind: self.kind,
            slope: self.slope.scaled(factor),
            path: self.path.scaled(factor),
            overrides: self.overrides.scaled(factor),
        }
    }
}
