/// Musical note duration represented as a rational fraction of a whole note.
/// Conversion to seconds happens once, at the edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Duration {
    /// Numerator: how many parts
    pub numerator: u32,
    /// Denominator: of what size (4 = quarter, 8 = eighth, etc.)
    pub denominator: u32,
}

impl Duration {
    // Standard note values
    pub const HALF: Duration = Duration {
        numerator: 1,
        denominator: 2,
    };
    pub const QUARTER: Duration = Duration {
        numerator: 1,
        denominator: 4,
    };
    pub const EIGHTH: Duration = Duration {
        numerator: 1,
        denominator: 8,
    };
    pub const SIXTEENTH: Duration = Duration {
        numerator: 1,
        denominator: 16,
    };

    /// Length in seconds at the given tempo (quarter note = one beat).
    pub fn to_seconds(&self, tempo_bpm: f64) -> f64 {
        let beats = 4.0 * self.numerator as f64 / self.denominator as f64;
        beats * 60.0 / tempo_bpm
    }
}
