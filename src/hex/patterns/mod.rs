pub mod board;
pub mod godel;
pub mod hashed;
pub mod pattern;

pub use board::{MatchMode, PatternBoard, PatternHit, PatternState};
pub use godel::{PatternRingGodel, RingGodel};
pub use hashed::HashedPatternSet;
pub use pattern::{Pattern, PatternType, RotatedPattern};
