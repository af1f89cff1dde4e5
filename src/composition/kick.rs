use super::library::KICK_LENGTH;
use super::{CompositionRules, NoteEvent};
use crate::engine::ScheduledStep;
use crate::voices::Role;

/// Below this the kick stays quiet
pub const KICK_GATE: f32 = 0.05;

/// Ensemble intensity the kick follows
///
/// Approaches a target set by how many voices are engaged (Intro or Main)
/// with a first-order exponential, so the groove swells in and out as people
/// join and leave instead of switching on.
#[derive(Debug, Clone, Copy)]
pub struct KickIntensity {
    level: f32,
    time_constant: f64,
}

impl KickIntensity {
    pub fn new(time_constant: f64) -> Self {
        Self {
            level: 0.0,
            time_constant,
        }
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn target(engaged: usize) -> f32 {
        match engaged {
            0 | 1 => 0.0,
            2 => 0.4,
            _ => 1.0,
        }
    }

    /// Move toward the target for `engaged` voices over `dt` seconds
    pub fn update(&mut self, engaged: usize, dt: f64) -> f32 {
        let target = Self::target(engaged);
        if self.time_constant <= 0.0 {
            self.level = target;
            return self.level;
        }
        if dt > 0.0 {
            let alpha = 1.0 - (-dt / self.time_constant).exp();
            self.level += (target - self.level) * alpha as f32;
        }
        self.level
    }
}

pub(super) fn compose(
    rules: &CompositionRules,
    step: &ScheduledStep,
    intensity: f32,
    out: &mut Vec<NoteEvent>,
) {
    if intensity <= KICK_GATE {
        return;
    }
    let Some(hit) = rules.library().kick.hit(step.step_index) else {
        return;
    };

    out.push(NoteEvent {
        role: Role::Kick,
        performer_id: None,
        frequency_hz: rules.frequency(Role::Kick, 0),
        start_time: step.time,
        duration: rules.seconds(KICK_LENGTH),
        velocity: (intensity * hit.accent).clamp(0.0, 1.0),
        pan: 0.0,
    });
}
