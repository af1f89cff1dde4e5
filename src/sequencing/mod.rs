pub mod duration;
pub mod grid;
pub mod harmony;
pub mod pattern;
pub mod pitch;

pub use duration::Duration;
pub use grid::{StepGrid, StepHit};
pub use harmony::{Chord, HarmonicVariation, HarmonyTrack};
pub use pattern::{HitSlot, Pattern, PatternSlot};
