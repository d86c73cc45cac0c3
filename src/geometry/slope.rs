use serde::{Deserialize, Serialize};

/// How the roof pitch is specified for one synthesis call.
///
/// The two modes are mutually exclusive: a roof is either generated at a
/// uniform slope angle or scaled to reach an absolute ridge height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SlopeSpec {
    /// Apex height above the eaves.
    Height(f64),
    /// Uniform slope angle in radians.
    Angle(f64),
}

impl SlopeSpec {
    /// Angle mode from a user-entered angle in degrees.
    ///
    /// The value is rounded to 4 decimal places first so that degrees typed in
    /// a UI and radians stored internally do not drift apart.
    #[must_use]
    pub fn from_degrees(degrees: f64) -> Self {
        let rounded = (degrees * 1e4).round() / 1e4;
        Self::Angle(rounded.to_radians())
    }

    /// Wavefront slope: height gained per unit of inward offset.
    ///
    /// Height mode uses unit slope and rescales the result afterwards.
    #[must_use]
    pub fn wavefront_slope(&self) -> f64 {
        match *self {
            Self::Height(_) => 1.0,
            Self::Angle(angle) => angle.tan(),
        }
    }

    /// Converts a skeleton time (inward offset distance) to a height.
    ///
    /// `max_time` is the time of the last skeleton event.
    #[must_use]
    pub fn height_at(&self, time: f64, max_time: f64) -> f64 {
        match *self {
            Self::Height(height) => {
                if max_time > f64::EPSILON {
                    time * height / max_time
                } else {
                    0.0
                }
            }
            Self::Angle(_) => time * self.wavefront_slope(),
        }
    }

    /// Scales linear quantities (the height) by `factor`; angles are unitless.
    #[must_use]
    pub fn scaled(self, factor: f64) -> Self {
        match self {
            Self::Height(height) => Self::Height(height * factor),
            angle @ Self::Angle(_) => angle,
        }
    }
}

impl Default for SlopeSpec {
    fn default() -> Self {
        Self::from_degrees(45.0)
    }
}

/// The kind of roof being edited; selects how per-edge overrides are carried
/// across regenerations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoofKind {
    /// Hipped roof; overrides are crease weights.
    #[default]
    Hipped,
    /// Gabled roof; overrides are gable end angles.
    Gabled,
}
