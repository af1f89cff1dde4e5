use super::library::{self, FIFTH};
use super::{CompositionRules, NoteEvent, StepContext, VoiceInput};
use crate::sequencing::{Chord, Duration, HarmonicVariation, StepGrid};
use crate::voices::Phase;

const FIFTH_SEMITONES: i32 = 7;

pub(super) fn compose(
    rules: &CompositionRules,
    ctx: &StepContext,
    voice: &VoiceInput,
    out: &mut Vec<NoteEvent>,
) {
    let Some((grid, length)) = template(rules, voice) else {
        return;
    };
    let Some(hit) = grid.hit(ctx.step.step_index) else {
        return;
    };

    let root = bass_root(ctx.chord, ctx.variation);
    let interval = if hit.degree == FIFTH {
        root + FIFTH_SEMITONES
    } else {
        root
    };

    out.push(voice.note(
        rules.frequency(voice.role, interval),
        ctx.step.time,
        rules.seconds(length),
        voice.velocity(hit.accent),
    ));
}

fn template<'a>(rules: &'a CompositionRules, voice: &VoiceInput) -> Option<(&'a StepGrid, Duration)> {
    let lib = rules.library();
    match voice.phase {
        Phase::Silent => None,
        Phase::Intro => Some((&lib.bass_intro, library::BASS_INTRO_LENGTH)),
        Phase::Main if voice.snapshot.energy >= rules.drive_energy_threshold => {
            Some((&lib.bass_drive, library::BASS_DRIVE_LENGTH))
        }
        Phase::Main => Some((&lib.bass_main, library::BASS_MAIN_LENGTH)),
        Phase::Outro => Some((&lib.bass_outro, library::BASS_OUTRO_LENGTH)),
    }
}

/// Bass note under `chord` for this cycle's variation
fn bass_root(chord: &Chord, variation: HarmonicVariation) -> i32 {
    match variation {
        HarmonicVariation::Root => chord.bass_interval,
        // Third above the bass, kept within the octave over it
        HarmonicVariation::Inversion => {
            chord.bass_interval + (chord.third() - chord.bass_interval).rem_euclid(12)
        }
        HarmonicVariation::Pedal => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composition::tests::{bar, rules, step};
    use crate::performer::PerformerSnapshot;
    use crate::sequencing::harmony::{B_FLAT, D_MINOR, F_MAJOR};
    use crate::sequencing::pitch::freq_to_interval;
    use crate::voices::Role;
    use approx::assert_relative_eq;

    fn steps(notes: &[(u8, NoteEvent)]) -> Vec<u8> {
        notes.iter().map(|(s, _)| *s).collect()
    }

    fn calm(id: u32) -> PerformerSnapshot {
        PerformerSnapshot::new(id, 0.5, 0.0, 0.2)
    }

    #[test]
    fn test_bass_follows_phase_template() {
        let rules = rules();
        let snap = calm(0);
        assert_eq!(steps(&bar(&rules, &D_MINOR, 0, Role::Bass, Phase::Intro, &snap)), vec![0]);
        assert_eq!(
            steps(&bar(&rules, &D_MINOR, 0, Role::Bass, Phase::Main, &snap)),
            vec![0, 6, 8, 14]
        );
        assert_eq!(steps(&bar(&rules, &D_MINOR, 0, Role::Bass, Phase::Outro, &snap)), vec![0, 8]);
    }

    #[test]
    fn test_energetic_main_bass_drives() {
        let rules = rules();
        let snap = PerformerSnapshot::new(0, 0.5, 0.0, 0.7);
        let notes = bar(&rules, &D_MINOR, 0, Role::Bass, Phase::Main, &snap);
        assert_eq!(steps(&notes), vec![0, 2, 4, 6, 8, 10, 12, 14]);
        assert_relative_eq!(notes[0].1.duration, 0.125);

        // Roots on 1 and 3 are pushed above the eighths between them
        assert_relative_eq!(
            notes[0].1.velocity,
            notes[1].1.velocity * library::DOWNBEAT_ACCENT,
            epsilon = 1e-6
        );
        assert_relative_eq!(notes[4].1.velocity, notes[0].1.velocity, epsilon = 1e-6);

        // Drive only applies in Main
        let intro = bar(&rules, &D_MINOR, 0, Role::Bass, Phase::Intro, &snap);
        assert_eq!(steps(&intro), vec![0]);
    }

    #[test]
    fn test_bass_root_and_fifth() {
        let rules = rules();
        let notes = bar(&rules, &D_MINOR, 0, Role::Bass, Phase::Main, &calm(0));
        assert_relative_eq!(notes[0].1.frequency_hz, 73.42, epsilon = 1e-3);
        let fifth = freq_to_interval(73.42, notes[1].1.frequency_hz);
        assert_relative_eq!(fifth, 7.0, epsilon = 1e-3);
    }

    #[test]
    fn test_bass_variations() {
        assert_eq!(bass_root(&F_MAJOR, HarmonicVariation::Root), 3);
        assert_eq!(bass_root(&F_MAJOR, HarmonicVariation::Inversion), 7);
        assert_eq!(bass_root(&F_MAJOR, HarmonicVariation::Pedal), 0);
        // Bb: bass -4, third 0
        assert_eq!(bass_root(&B_FLAT, HarmonicVariation::Inversion), 0);
    }

    #[test]
    fn test_pedal_cycle_holds_tonic() {
        let rules = rules();
        let ctx = StepContext {
            step: step(12, 0),
            chord: &F_MAJOR,
            variation: HarmonicVariation::Pedal,
        };
        let mut out = Vec::new();
        let snap = calm(0);
        rules.compose(&ctx, 0, Role::Bass, Phase::Main, &snap, &mut out);
        assert_eq!(out.len(), 1);
        assert_relative_eq!(out[0].frequency_hz, 73.42, epsilon = 1e-3);
    }
}
