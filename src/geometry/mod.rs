mod footprint;
mod slope;

pub use footprint::{FlatFootprint, FootprintPolygon, LoopRange};
pub use slope::{RoofKind, SlopeSpec};
