mod faces;
mod wavefront;

use std::f64::consts::FRAC_PI_2;

use tracing::{debug, info};

use crate::error::{GeometryError, Result};
use crate::geometry::{FlatFootprint, FootprintPolygon, SlopeSpec};
use crate::math::polygon_2d::signed_area_2d;
use crate::math::{is_near_zero_eps, TOLERANCE};
use crate::mesh::RoofMesh;

use wavefront::Wavefront;

/// Generates a hipped roof over a footprint from its straight skeleton.
///
/// Every footprint edge rises at the same slope; the facets meet along hips
/// and ridges. Heights follow the [`SlopeSpec`]: angle mode multiplies the
/// inward offset distance by the slope tangent, height mode rescales so the
/// highest node lies exactly at the requested height above the eaves.
#[derive(Debug)]
pub struct RoofSkeleton {
    footprint: FlatFootprint,
    slope: SlopeSpec,
    tolerance: f64,
}

impl RoofSkeleton {
    /// Creates a new skeleton operation over a flattened footprint.
    #[must_use]
    pub fn new(footprint: FlatFootprint, slope: SlopeSpec) -> Self {
        Self {
            footprint,
            slope,
            tolerance: TOLERANCE,
        }
    }

    /// Creates a new skeleton operation over a footprint polygon.
    #[must_use]
    pub fn from_polygon(footprint: &FootprintPolygon, slope: SlopeSpec) -> Self {
        Self::new(footprint.clone().normalized().flatten(), slope)
    }

    /// Sets the distance below which skeleton nodes are merged.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Executes the skeleton and builds the roof mesh.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::Degenerate` if the outer ring has no area or the
    /// slope is unusable, and `SkeletonError::Divergence` if the wavefront
    /// fails to collapse into a consistent skeleton.
    pub fn execute(&self) -> Result<RoofMesh> {
        self.validate()?;

        let skeleton = Wavefront::new(&self.footprint, self.tolerance)?.run()?;
        let mesh = faces::assemble(&self.footprint, &skeleton, &self.slope, self.tolerance)?;

        info!(
            "roof generated: {} faces, {} vertices, apex {:.4}",
            mesh.faces.len(),
            mesh.vertices.len(),
            mesh.apex_height() - mesh.min_z()
        );
        Ok(mesh)
    }

    fn validate(&self) -> Result<()> {
        let Some(outer) = self.footprint.outer() else {
            return Err(GeometryError::Degenerate("footprint has no outer ring".into()).into());
        };
        let ring = &self.footprint.vertices[outer.indices()];
        let area = signed_area_2d(ring);
        debug!("outer ring: {} vertices, area {area:.6}", ring.len());
        if ring.len() < 3 || is_near_zero_eps(area, self.tolerance * self.tolerance) {
            return Err(GeometryError::Degenerate(format!("outer ring area {area}")).into());
        }
        match self.slope {
            SlopeSpec::Height(h) if !h.is_finite() || h < 0.0 => {
                Err(GeometryError::Degenerate(format!("roof height {h}")).into())
            }
            SlopeSpec::Angle(a) if !a.is_finite() || !(0.0..FRAC_PI_2).contains(&a) => {
                Err(GeometryError::Degenerate(format!("slope angle {a} rad")).into())
            }
            _ => Ok(()),
        }
    }
}
