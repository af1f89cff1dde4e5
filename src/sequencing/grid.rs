use crate::STEPS_PER_BAR;

/// A hit placed on one step of the grid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepHit {
    /// Scale degree, resolved against the active chord
    pub degree: u8,
    /// Velocity multiplier
    pub accent: f32,
}

/// One bar of hits on the sixteenth-note grid
#[derive(Debug, Clone, PartialEq)]
pub struct StepGrid {
    steps: [Option<StepHit>; STEPS_PER_BAR as usize],
}

impl StepGrid {
    pub fn empty() -> Self {
        Self {
            steps: [None; STEPS_PER_BAR as usize],
        }
    }

    /// Hit at `step`, if any. Steps outside the bar never hit.
    pub fn hit(&self, step: u8) -> Option<&StepHit> {
        self.steps.get(step as usize).and_then(Option::as_ref)
    }

    pub(crate) fn set(&mut self, step: u8, hit: StepHit) {
        if let Some(slot) = self.steps.get_mut(step as usize) {
            *slot = Some(hit);
        }
    }

    /// All hits in step order
    pub fn hits(&self) -> impl Iterator<Item = (u8, &StepHit)> {
        self.steps
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|hit| (i as u8, hit)))
    }
}
