pub mod cells;
pub mod engine;
pub mod patterns;

pub use cells::{InferiorCells, VulnerableKiller};
pub use engine::{ALL_COLORS, CaptureColors, IceEngine, IceParams, only};
pub use patterns::IcePatternSet;
