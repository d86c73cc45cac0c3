use serde::{Deserialize, Serialize};

use crate::math::TOLERANCE;

/// Parameters controlling an editing session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoofConfig {
    /// Distance below which points are considered identical.
    pub tolerance: f64,
    /// Largest direction change (radians) at which a path vertex between two
    /// edges is dissolved before generation.
    pub dissolve_angle_limit: f64,
    /// Distance below which path vertices are merged before generation.
    pub merge_distance: f64,
    /// Half side length of the square footprint used when the path encloses
    /// nothing.
    pub default_half_extent: f64,
    /// Whether to fall back to the default square instead of failing when
    /// the path encloses nothing.
    pub fallback_to_default_footprint: bool,
    /// Working units per stored unit. Must be positive.
    pub unit_scale: f64,
}

impl Default for RoofConfig {
    fn default() -> Self {
        Self {
            tolerance: TOLERANCE,
            dissolve_angle_limit: 0.087_266_5,
            merge_distance: TOLERANCE,
            default_half_extent: 5.0,
            fallback_to_default_footprint: true,
            unit_scale: 1.0,
        }
    }
}

impl RoofConfig {
    /// Sets the matching tolerance.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Sets the dissolve angle limit in radians.
    #[must_use]
    pub fn with_dissolve_angle_limit(mut self, limit: f64) -> Self {
        self.dissolve_angle_limit = limit;
        self
    }

    /// Sets the vertex merge distance.
    #[must_use]
    pub fn with_merge_distance(mut self, distance: f64) -> Self {
        self.merge_distance = distance;
        self
    }

    /// Sets the half extent of the fallback footprint.
    #[must_use]
    pub fn with_default_half_extent(mut self, half_extent: f64) -> Self {
        self.default_half_extent = half_extent;
        self
    }

    /// Enables or disables the fallback footprint.
    #[must_use]
    pub fn with_fallback(mut self, enabled: bool) -> Self {
        self.fallback_to_default_footprint = enabled;
        self
    }

    /// Sets the working-to-stored unit scale.
    #[must_use]
    pub fn with_unit_scale(mut self, scale: f64) -> Self {
        self.unit_scale = scale;
        self
    }

    /// Scale back from working units to stored units.
    pub(crate) fn inverse_unit_scale(&self) -> f64 {
        if self.unit_scale.is_normal() && self.unit_scale > 0.0 {
            1.0 / self.unit_scale
        } else {
            1.0
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config: RoofConfig = serde_json::from_str(r#"{"unit_scale": 0.001}"#).unwrap();
        assert!((config.unit_scale - 0.001).abs() < 1e-15);
        assert!(config.fallback_to_default_footprint);
        assert!((config.default_half_extent - 5.0).abs() < 1e-15);
    }

    #[test]
    fn inverse_scale_guards_zero() {
        assert!((RoofConfig::default().with_unit_scale(4.0).inverse_unit_scale() - 0.25).abs() < 1e-15);
        assert!((RoofConfig::default().with_unit_scale(0.0).inverse_unit_scale() - 1.0).abs() < 1e-15);
    }
}
