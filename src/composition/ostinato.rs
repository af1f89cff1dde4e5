use super::density::mask_draw;
use super::library::{OSTINATO_DEGREES, OSTINATO_LENGTH};
use super::{CompositionRules, NoteEvent, StepContext, VoiceInput};
use crate::voices::Phase;

/// Fixed degree walk into the chord, clave-accented in Main and
/// density-gated on the eighth-note grid
pub(super) fn compose(
    rules: &CompositionRules,
    ctx: &StepContext,
    voice: &VoiceInput,
    out: &mut Vec<NoteEvent>,
) {
    let step = ctx.step.step_index;
    let template = if voice.phase == Phase::Main {
        rules.library().ostinato_main.hit(step)
    } else {
        None
    };

    let (degree, accent) = match template {
        Some(hit) => (hit.degree, hit.accent),
        None => {
            if step % 2 != 0 {
                return;
            }
            let density = rules.ostinato_density.density(voice.phase, voice.snapshot.expression);
            let draw = mask_draw(rules.seed, ctx.step.bar_index, step, voice.lane());
            if draw.gate >= density {
                return;
            }
            let degree = OSTINATO_DEGREES.get(step as usize).copied().unwrap_or(0);
            (degree, 1.0)
        }
    };

    out.push(voice.note(
        rules.frequency(voice.role, ctx.chord.tone(degree)),
        ctx.step.time,
        rules.seconds(OSTINATO_LENGTH),
        voice.velocity(accent),
    ));
}
