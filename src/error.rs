use thiserror::Error;

/// Errors surfaced by the engine.
///
/// Normal operation has no error path: everything here happens at startup,
/// before the first step is dispatched.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The hardware audio clock is not running (device missing or not yet activated)
    #[error("audio clock unavailable: {0}")]
    ClockUnavailable(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to query output config: {0}")]
    DeviceConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("failed to build output stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start output stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[error("failed to spawn scheduler thread: {0}")]
    TimerSpawn(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
