//! Pattern library - the fixed rhythmic vocabulary of every role.

use crate::pattern;
use crate::sequencing::pattern::slot::{accented, hit, rest, sub, weighted};
use crate::sequencing::{Duration, Pattern, StepGrid};

/// Bass degrees
pub const ROOT: u8 = 0;
pub const FIFTH: u8 = 1;

/// Chord degrees the ostinato walks on density-gated steps, one per step
pub const OSTINATO_DEGREES: [u8; 16] = [0, 2, 1, 2, 0, 2, 1, 3, 0, 2, 1, 2, 4, 2, 1, 2];

/// Velocity lift on the strong strokes of the drive and clave templates
pub const DOWNBEAT_ACCENT: f32 = 1.2;

/// Note lengths per role
pub const BASS_INTRO_LENGTH: Duration = Duration::HALF;
pub const BASS_MAIN_LENGTH: Duration = Duration::EIGHTH;
pub const BASS_OUTRO_LENGTH: Duration = Duration::QUARTER;
pub const BASS_DRIVE_LENGTH: Duration = Duration::SIXTEENTH;
pub const OSTINATO_LENGTH: Duration = Duration::EIGHTH;
pub const ARP_LENGTH: Duration = Duration::SIXTEENTH;
pub const KICK_LENGTH: Duration = Duration::EIGHTH;

#[derive(Debug, Clone)]
pub struct PatternLibrary {
    /// Root on 1 and 3, fifth on the last sixteenth before each
    pub bass_main: StepGrid,
    /// Downbeat only
    pub bass_intro: StepGrid,
    /// Two sparse hits
    pub bass_outro: StepGrid,
    /// Driving eighths for high-energy performers
    pub bass_drive: StepGrid,
    /// 3-2 son clave
    pub ostinato_main: StepGrid,
    /// Off-beat eighths. Only the rhythm and accent are read; the arp
    /// picks its own climbing degree per step.
    pub arp_main: StepGrid,
    /// Four on the floor
    pub kick: StepGrid,
}

impl PatternLibrary {
    pub fn new() -> Self {
        Self {
            bass_main: pattern![[ROOT, _, _, _], [_, _, FIFTH, _], [ROOT, _, _, _], [_, _, FIFTH, _]].to_grid(),
            bass_intro: pattern![ROOT, _, _, _].to_grid(),
            bass_outro: pattern![ROOT, _, ROOT, _].to_grid(),
            bass_drive: bass_drive().to_grid(),
            ostinato_main: son_clave().to_grid(),
            arp_main: pattern![[_, _, 0, _], [_, _, 0, _], [_, _, 0, _], [_, _, 0, _]].to_grid(),
            kick: pattern![0, 0, 0, 0].to_grid(),
        }
    }
}

/// Driving eighths with the roots on beats 1 and 3 pushed
fn bass_drive() -> Pattern {
    let strong = || sub(vec![accented(ROOT, DOWNBEAT_ACCENT), rest(), hit(ROOT), rest()]);
    let weak = || sub(vec![hit(ROOT), rest(), hit(FIFTH), rest()]);
    Pattern::new(vec![strong(), weak(), strong(), weak()])
}

/// 3-2 son clave: a dotted-eighth first stroke, the last stroke leaned on
fn son_clave() -> Pattern {
    Pattern::new(vec![
        sub(vec![weighted(0, 3), hit(2)]),
        sub(vec![rest(), rest(), hit(1), rest()]),
        sub(vec![rest(), rest(), hit(2), rest()]),
        accented(1, DOWNBEAT_ACCENT),
    ])
}

impl Default for PatternLibrary {
    fn default() -> Self {
        Self::new()
    }
}
