pub mod composition; // Role rules, pattern library, density gating
pub mod config;
pub mod engine; // Scheduler, clock, instrument binding, poll timer
pub mod error;
pub mod performer; // Gesture snapshots and the parameter feed
pub mod sequencing; // Step grid, patterns, harmony
pub mod voices; // Per-performer lifecycle and registry

pub use config::EngineConfig;
pub use error::EngineError;

/// Sixteenth-note steps in one bar. Fixed: every template is written against it.
pub const STEPS_PER_BAR: u8 = 16;
