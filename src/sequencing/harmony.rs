//! Harmony track - a fixed cyclic chord progression locked to bars.
//!
//! The track holds no clock of its own. Everything is a function of the bar
//! index the scheduler hands it, so chord changes can only ever happen on a
//! bar boundary, and every `chord_change_every_n_bars` bars one "cycle" passes.
//! The cycle index drives harmonic variation in the bass (inversions and a
//! pedal tone) so repeated rounds of the progression don't sound identical.

/// A chord as semitone offsets from the session root
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chord {
    pub name: &'static str,
    /// Chord tones in voicing order, lowest first
    pub intervals: &'static [i32],
    /// Bass note for root position
    pub bass_interval: i32,
}

impl Chord {
    pub const fn new(name: &'static str, intervals: &'static [i32], bass_interval: i32) -> Self {
        Self {
            name,
            intervals,
            bass_interval,
        }
    }

    /// Interval for `degree`, wrapping up an octave past the last chord tone.
    ///
    /// Degree 3 of a triad is the root an octave up, degree 4 the third, etc.
    pub fn tone(&self, degree: u8) -> i32 {
        let len = self.intervals.len().max(1);
        let index = degree as usize % len;
        let octave = (degree as usize / len) as i32;
        self.intervals.get(index).copied().unwrap_or(self.bass_interval) + 12 * octave
    }

    /// The chord's third (second tone of the voicing), for first inversion
    pub fn third(&self) -> i32 {
        self.intervals.get(1).copied().unwrap_or(self.bass_interval)
    }
}

/// i - VI - III - VII in D minor, relative to D
pub const D_MINOR: Chord = Chord::new("Dm", &[0, 3, 7], 0);
pub const B_FLAT: Chord = Chord::new("Bb", &[-4, 0, 3], -4);
pub const F_MAJOR: Chord = Chord::new("F", &[3, 7, 10], 3);
pub const C_MAJOR: Chord = Chord::new("C", &[-2, 2, 5], -2);

pub fn default_progression() -> Vec<Chord> {
    vec![D_MINOR, B_FLAT, F_MAJOR, C_MAJOR]
}

/// How the bass voices the current chord for this cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarmonicVariation {
    /// Bass on the chord's own bass note
    Root,
    /// Bass on the chord's third
    Inversion,
    /// Bass holds the progression tonic under the chord
    Pedal,
}

impl HarmonicVariation {
    pub fn for_cycle(cycle_index: u64) -> Self {
        match cycle_index % 4 {
            1 => HarmonicVariation::Inversion,
            3 => HarmonicVariation::Pedal,
            _ => HarmonicVariation::Root,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HarmonyTrack {
    progression: Vec<Chord>,
    bars_per_chord: u64,
}

impl HarmonyTrack {
    /// Callers validate that the progression is non-empty and `bars_per_chord > 0`
    /// (see `EngineConfig::validate`); a zero is clamped to one here.
    pub fn new(progression: Vec<Chord>, bars_per_chord: u32) -> Self {
        Self {
            progression,
            bars_per_chord: bars_per_chord.max(1) as u64,
        }
    }

    pub fn bars_per_chord(&self) -> u64 {
        self.bars_per_chord
    }

    pub fn cycle_index(&self, bar_index: u64) -> u64 {
        bar_index / self.bars_per_chord
    }

    pub fn chord_index(&self, bar_index: u64) -> usize {
        (self.cycle_index(bar_index) % self.progression.len().max(1) as u64) as usize
    }

    /// The chord sounding during `bar_index`
    pub fn current_chord(&self, bar_index: u64) -> &Chord {
        self.progression
            .get(self.chord_index(bar_index))
            .unwrap_or(&D_MINOR)
    }

    pub fn variation(&self, bar_index: u64) -> HarmonicVariation {
        HarmonicVariation::for_cycle(self.cycle_index(bar_index))
    }

    pub fn len(&self) -> usize {
        self.progression.len()
    }

    pub fn is_empty(&self) -> bool {
        self.progression.is_empty()
    }
}

impl Default for HarmonyTrack {
    fn default() -> Self {
        Self::new(default_progression(), 4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chord_changes_every_n_bars() {
        let track = HarmonyTrack::new(default_progression(), 4);

        let names: Vec<_> = (0..20).map(|bar| track.current_chord(bar).name).collect();
        assert_eq!(
            names,
            vec![
                "Dm", "Dm", "Dm", "Dm", "Bb", "Bb", "Bb", "Bb", "F", "F", "F", "F", "C", "C", "C",
                "C", "Dm", "Dm", "Dm", "Dm"
            ]
        );
    }

    #[test]
    fn test_chord_index_advances_once_per_n_bars() {
        let track = HarmonyTrack::new(default_progression(), 3);
        let changes = (1..300u64)
            .filter(|&bar| track.chord_index(bar) != track.chord_index(bar - 1))
            .count();
        // Bars 3, 6, ..., 297
        assert_eq!(changes, 99);
    }

    #[test]
    fn test_cycle_index_and_variation() {
        let track = HarmonyTrack::default();
        assert_eq!(track.cycle_index(0), 0);
        assert_eq!(track.cycle_index(7), 1);
        assert_eq!(track.variation(0), HarmonicVariation::Root);
        assert_eq!(track.variation(4), HarmonicVariation::Inversion);
        assert_eq!(track.variation(8), HarmonicVariation::Root);
        assert_eq!(track.variation(12), HarmonicVariation::Pedal);
        assert_eq!(track.variation(17), HarmonicVariation::Root);
        assert_eq!(track.variation(20), HarmonicVariation::Inversion);
    }

    #[test]
    fn test_single_bar_chords() {
        let track = HarmonyTrack::new(vec![D_MINOR, F_MAJOR], 1);
        assert_eq!(track.current_chord(0).name, "Dm");
        assert_eq!(track.current_chord(1).name, "F");
        assert_eq!(track.current_chord(2).name, "Dm");
    }

    #[test]
    fn test_chord_tone_wraps_octave() {
        assert_eq!(D_MINOR.tone(0), 0);
        assert_eq!(D_MINOR.tone(2), 7);
        assert_eq!(D_MINOR.tone(3), 12);
        assert_eq!(D_MINOR.tone(5), 19);
        assert_eq!(B_FLAT.third(), 0);
    }
}
