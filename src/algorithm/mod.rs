//! Pipeline orchestration

/// Tileable synthesis pipeline, options and stages
pub mod synthesis;

pub use synthesis::{Stage, SynthesisOptions, TileableSynthesizer};
