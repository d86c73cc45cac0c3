pub mod extract;
pub mod matching;
pub mod skeleton;

pub use extract::ExtractFootprint;
pub use matching::{ApplyOverrides, EdgeOverrideSnapshot};
pub use skeleton::RoofSkeleton;
