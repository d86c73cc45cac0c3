//! The roof editing session: path editing, regeneration and commit.

mod config;
mod record;

pub use config::RoofConfig;
pub use record::RoofRecord;

use tracing::{debug, info, warn};

use crate::error::{ExtractionError, Result, RoofError, SessionError};
use crate::geometry::{FootprintPolygon, RoofKind, SlopeSpec};
use crate::mesh::RoofMesh;
use crate::operations::extract::ExtractFootprint;
use crate::operations::matching::{
    ApplyOverrides, EdgeKey, EdgeOverride, EdgeOverrideSnapshot, MatchReport, VertexMatcher,
};
use crate::operations::skeleton::RoofSkeleton;
use crate::topology::PathStore;

/// Where a session is in its edit cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Nothing is being edited.
    #[default]
    Idle,
    /// The footprint path is being edited.
    PathEditing,
    /// A roof has been generated from the working path.
    Generated,
    /// The generated roof has been stored as the new baseline.
    Committed,
}

impl SessionState {
    fn name(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::PathEditing => "editing the path",
            Self::Generated => "showing a generated roof",
            Self::Committed => "committed",
        }
    }
}

/// Parameters of the last successful generation.
#[derive(Debug, Clone)]
struct Generation {
    slope: SlopeSpec,
    kind: RoofKind,
    overrides: EdgeOverrideSnapshot,
    report: MatchReport,
}

/// An explicit editing session over one roof.
///
/// The session owns the committed [`RoofRecord`] (in stored units), the
/// working path (in working units) and the live mesh. A regeneration either
/// replaces the live mesh completely or leaves it untouched.
#[derive(Debug)]
pub struct RoofSession {
    config: RoofConfig,
    state: SessionState,
    record: RoofRecord,
    baseline_mesh: Option<RoofMesh>,
    path: Option<PathStore>,
    mesh: Option<RoofMesh>,
    generation: Option<Generation>,
}

impl RoofSession {
    /// Opens a session over a committed record.
    ///
    /// A record with a stored path gets its roof rebuilt right away, so the
    /// committed roof is on display and `cancel` has a baseline to restore.
    #[must_use]
    pub fn new(record: RoofRecord, config: RoofConfig) -> Self {
        let mut session = Self {
            config,
            state: SessionState::Idle,
            record,
            baseline_mesh: None,
            path: None,
            mesh: None,
            generation: None,
        };
        session.rebuild_baseline();
        session
    }

    /// Opens a session over a record stored as JSON.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Serialization` for malformed input.
    pub fn from_json(json: &str, config: RoofConfig) -> Result<Self> {
        Ok(Self::new(RoofRecord::from_json(json)?, config))
    }

    /// Serializes the committed record.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Serialization` if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        self.record.to_json()
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Session configuration.
    #[must_use]
    pub fn config(&self) -> &RoofConfig {
        &self.config
    }

    /// The committed record, in stored units.
    #[must_use]
    pub fn record(&self) -> &RoofRecord {
        &self.record
    }

    /// The live mesh, for display.
    #[must_use]
    pub fn current_mesh(&self) -> Option<&RoofMesh> {
        self.mesh.as_ref()
    }

    /// Match report of the last successful regeneration.
    #[must_use]
    pub fn last_report(&self) -> Option<&MatchReport> {
        self.generation.as_ref().map(|g| &g.report)
    }

    /// Overrides as they landed on the eave edges of the live mesh.
    #[must_use]
    pub fn applied_overrides(&self) -> Option<EdgeOverrideSnapshot> {
        let (mesh, generation) = (self.mesh.as_ref()?, self.generation.as_ref()?);
        Some(EdgeOverrideSnapshot::capture_footprint(
            mesh,
            &generation.report,
            self.config.tolerance,
        ))
    }

    /// The working path, while editing.
    #[must_use]
    pub fn path(&self) -> Option<&PathStore> {
        self.path.as_ref()
    }

    /// Mutable access to the working path.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidState` unless the path is being edited.
    pub fn path_mut(&mut self) -> Result<&mut PathStore> {
        if self.state != SessionState::PathEditing {
            return Err(self.invalid("edit the path"));
        }
        self.path
            .as_mut()
            .ok_or_else(|| SessionError::InvalidState {
                operation: "edit the path",
                state: "without a working path",
            })
            .map_err(RoofError::from)
    }

    /// Starts editing the footprint path.
    ///
    /// Coming from `Generated`, the working path is kept. Otherwise the
    /// committed path is loaded, scaled to working units, and its saved
    /// overrides are put back on the matching path edges.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidState` if the path is already being
    /// edited, or a topology error if the stored path is corrupt.
    pub fn begin_path_edit(&mut self) -> Result<()> {
        match self.state {
            SessionState::PathEditing => return Err(self.invalid("begin path editing")),
            SessionState::Generated if self.path.is_some() => {}
            _ => self.path = Some(self.load_committed_path()?),
        }
        self.transition(SessionState::PathEditing);
        Ok(())
    }

    /// Regenerates the roof from the working path.
    ///
    /// The path is simplified, its overrides captured, the footprint
    /// extracted, the roof generated and the overrides re-applied. On failure
    /// the session returns to path editing and the previous mesh is kept.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidState` outside path editing or a
    /// generated state, and any extraction, geometry or skeleton error from
    /// the pipeline.
    pub fn regenerate(&mut self, slope: SlopeSpec, kind: RoofKind) -> Result<&RoofMesh> {
        if !matches!(self.state, SessionState::PathEditing | SessionState::Generated) {
            return Err(self.invalid("regenerate"));
        }
        let Some(path) = self.path.as_ref() else {
            return Err(self.invalid("regenerate"));
        };

        match synthesize(path, &self.config, slope, kind) {
            Ok((mesh, generation, simplified)) => {
                self.path = Some(simplified);
                self.generation = Some(generation);
                self.transition(SessionState::Generated);
                Ok(&*self.mesh.insert(mesh))
            }
            Err(e) => {
                warn!("regeneration failed: {e}");
                self.transition(SessionState::PathEditing);
                Err(e)
            }
        }
    }

    /// Stores the generated roof as the new baseline.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidState` unless a roof has been generated.
    pub fn commit(&mut self) -> Result<()> {
        if self.state != SessionState::Generated {
            return Err(self.invalid("commit"));
        }
        let (Some(path), Some(generation)) = (self.path.as_ref(), self.generation.as_ref()) else {
            return Err(self.invalid("commit"));
        };
        let inverse = self.config.inverse_unit_scale();
        self.record = RoofRecord {
            kind: generation.kind,
            slope: generation.slope,
            path: path.to_path_data(),
            overrides: generation.overrides.clone(),
        }
        .scaled(inverse);
        self.baseline_mesh.clone_from(&self.mesh);
        self.path = None;
        info!(
            "roof committed: {} path edges, {} overrides",
            self.record.path.edges.len(),
            self.record.overrides.len()
        );
        self.transition(SessionState::Committed);
        Ok(())
    }

    /// Drops all uncommitted edits and restores the baseline.
    pub fn cancel(&mut self) {
        self.path = None;
        self.generation = None;
        self.mesh.clone_from(&self.baseline_mesh);
        self.transition(SessionState::Idle);
    }

    /// Loads the committed path in working units with its saved overrides.
    fn load_committed_path(&self) -> Result<PathStore> {
        let scale = self.config.unit_scale;
        let mut path = PathStore::from_path_data(&self.record.path.scaled(scale))?;
        let restored = restore_overrides(
            &mut path,
            &self.record.overrides.scaled(scale),
            self.config.tolerance,
        );
        debug!(
            "loaded path: {} vertices, {} edges, {restored} overrides restored",
            path.vertex_count(),
            path.edge_count()
        );
        Ok(path)
    }

    /// Regenerates the committed roof into the baseline and live mesh.
    fn rebuild_baseline(&mut self) {
        if self.record.path.is_empty() {
            return;
        }
        let built = self.load_committed_path().and_then(|path| {
            synthesize(&path, &self.config, self.record.slope, self.record.kind)
        });
        match built {
            Ok((mesh, _, _)) => {
                info!("committed roof rebuilt: {} faces", mesh.faces.len());
                self.baseline_mesh = Some(mesh.clone());
                self.mesh = Some(mesh);
            }
            Err(e) => warn!("committed roof could not be rebuilt: {e}"),
        }
    }

    fn transition(&mut self, to: SessionState) {
        if self.state != to {
            debug!("session: {} -> {}", self.state.name(), to.name());
        }
        self.state = to;
    }

    fn invalid(&self, operation: &'static str) -> RoofError {
        SessionError::InvalidState {
            operation,
            state: self.state.name(),
        }
        .into()
    }
}

/// Runs the generation pipeline on a copy of the working path.
///
/// Returns the roof, its generation parameters and the simplified path that
/// should replace the working one. `path` itself is never modified.
fn synthesize(
    path: &PathStore,
    config: &RoofConfig,
    slope: SlopeSpec,
    kind: RoofKind,
) -> Result<(RoofMesh, Generation, PathStore)> {
    let mut path = path.clone();
    path.remove_doubles(config.merge_distance);
    path.dissolve_limited(config.dissolve_angle_limit);
    let overrides = EdgeOverrideSnapshot::capture(&path, kind, config.tolerance);
    debug!(
        "captured {} path edges, active overrides: {}",
        overrides.len(),
        overrides.has_active()
    );

    let footprint = match ExtractFootprint::new(path.segments())
        .with_tolerance(config.tolerance)
        .execute()
    {
        Ok(footprint) => footprint,
        Err(RoofError::Extraction(ExtractionError::NoBoundary { segments }))
            if config.fallback_to_default_footprint =>
        {
            warn!(
                "no closed boundary among {segments} path segments, using a {0}x{0} square",
                config.default_half_extent * 2.0
            );
            let fallback = FootprintPolygon::rectangle(config.default_half_extent);
            path = PathStore::from_footprint(&fallback);
            fallback
        }
        Err(e) => return Err(e),
    };

    let mut mesh = RoofSkeleton::from_polygon(&footprint, slope)
        .with_tolerance(config.tolerance)
        .execute()?;
    let report = ApplyOverrides::new(&overrides)
        .with_tolerance(config.tolerance)
        .execute(&mut mesh);

    Ok((
        mesh,
        Generation {
            slope,
            kind,
            overrides,
            report,
        },
        path,
    ))
}

/// Puts saved override values back on the path edges at the same positions.
/// Returns the number of edges that received a value.
fn restore_overrides(path: &mut PathStore, saved: &EdgeOverrideSnapshot, tolerance: f64) -> usize {
    let matcher = VertexMatcher::new(saved.vertices()).with_tolerance(tolerance);
    let ids: Vec<_> = path.edges().map(|(id, _)| id).collect();
    let mut restored = 0;
    for id in ids {
        let Ok((a, b)) = path.edge_points(id) else {
            continue;
        };
        let (Some(ma), Some(mb)) = (matcher.find(&a), matcher.find(&b)) else {
            continue;
        };
        let applied = match saved.get(&EdgeKey::new(ma.id, mb.id)) {
            Some(EdgeOverride::Crease(c)) => path.set_crease(id, c.abs()),
            Some(EdgeOverride::GableAngle(angle)) => path.set_gable_angle(id, Some(angle)),
            None => continue,
        };
        if applied.is_ok() {
            restored += 1;
        }
    }
    restored
}
