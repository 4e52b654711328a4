//! Mixing of synthesized clips onto the timeline, and loudness normalization.

pub mod normalize;
pub mod plan;

pub use normalize::LoudnessNormalizer;
pub use plan::{DelayedTrack, MixPlan, MixPlanner};
