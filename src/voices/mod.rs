//! Voices - the role-bound musical identity of each performer.
//!
//! Every tracked performer gets one voice: a melodic role plus a lifecycle
//! that fades the voice in and out as the performer arrives and leaves.
//! The kick is the exception; it belongs to the whole ensemble.
//!
//! ```text
//! SILENT --(active)--> INTRO --(t > intro)--> MAIN --(inactive for grace)--> OUTRO
//!    ^                   ^                                                    |
//!    |                   +------------------(active)--------------------------+
//!    +---------------------------(t > outro)----------------------------------+
//! ```

mod lifecycle;
mod registry;

pub use lifecycle::{LifecycleTiming, Phase, VoiceLifecycle};
pub use registry::{Voice, VoiceRegistry};

/// Instrument role. Each sits in its own octave register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Role {
    Bass,
    Ostinato,
    Arp,
    Kick,
}

impl Role {
    /// Roles a performer can be assigned, in assignment preference order
    pub const MELODIC: [Role; 3] = [Role::Bass, Role::Ostinato, Role::Arp];

    pub fn name(&self) -> &'static str {
        match self {
            Role::Bass => "bass",
            Role::Ostinato => "ostinato",
            Role::Arp => "arp",
            Role::Kick => "kick",
        }
    }
}
