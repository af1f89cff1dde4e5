use super::density::mask_draw;
use super::library::ARP_LENGTH;
use super::{CompositionRules, NoteEvent, StepContext, VoiceInput};
use crate::voices::Phase;

/// Velocity humanization bound, as a fraction of the velocity
const HUMANIZE: f32 = 0.15;

/// Two octaves of chord tones climbing across the bar
pub(super) fn compose(
    rules: &CompositionRules,
    ctx: &StepContext,
    voice: &VoiceInput,
    out: &mut Vec<NoteEvent>,
) {
    let step = ctx.step.step_index;
    let draw = mask_draw(rules.seed, ctx.step.bar_index, step, voice.lane());

    let template = if voice.phase == Phase::Main {
        rules.library().arp_main.hit(step)
    } else {
        None
    };
    let accent = match template {
        Some(hit) => hit.accent,
        None => {
            let density = rules.arp_density.density(voice.phase, voice.snapshot.expression);
            if draw.gate >= density {
                return;
            }
            1.0
        }
    };

    let span = 2 * ctx.chord.intervals.len().max(1);
    let degree = (step as usize % span) as u8;
    let velocity = (voice.velocity(accent) * (1.0 + HUMANIZE * draw.jitter)).clamp(0.0, 1.0);

    out.push(voice.note(
        rules.frequency(voice.role, ctx.chord.tone(degree)),
        ctx.step.time,
        rules.seconds(ARP_LENGTH),
        velocity,
    ));
}
