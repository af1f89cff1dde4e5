#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Phase {
    Silent, // Nothing plays
    Intro,  // Performer just arrived, sparse material
    Main,   // Full pattern
    Outro,  // Performer left, fading at half velocity
}

impl Phase {
    /// Uniform level multiplier applied to velocity and brightness downstream
    pub fn gain(&self) -> f32 {
        match self {
            Phase::Silent => 0.0,
            Phase::Intro | Phase::Main => 1.0,
            Phase::Outro => 0.5,
        }
    }

    pub fn is_sounding(&self) -> bool {
        !matches!(self, Phase::Silent)
    }

    /// Present and not on the way out
    pub fn is_engaged(&self) -> bool {
        matches!(self, Phase::Intro | Phase::Main)
    }
}

/// Lifecycle durations in seconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LifecycleTiming {
    pub intro: f64,
    pub outro: f64,
    /// Sustained inactivity required before leaving; 0 disables the window
    pub grace: f64,
}

impl Default for LifecycleTiming {
    fn default() -> Self {
        Self {
            intro: 8.0,
            outro: 4.0,
            grace: 2.0,
        }
    }
}

/// Per-performer phase state machine
///
/// A pure function of its input history: feeding the same `(now, active)`
/// sequence always yields the same phases. At most one transition happens per
/// update, so a caller sampling too coarsely sees each phase at least once.
#[derive(Debug, Clone)]
pub struct VoiceLifecycle {
    phase: Phase,
    phase_start: f64,
    /// Start of the current run of inactivity while Intro/Main. Survives the
    /// Intro to Main change so the grace window measures the whole dropout.
    inactive_since: Option<f64>,
    timing: LifecycleTiming,
}

impl VoiceLifecycle {
    pub fn new(timing: LifecycleTiming) -> Self {
        Self {
            phase: Phase::Silent,
            phase_start: 0.0,
            inactive_since: None,
            timing,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn phase_start(&self) -> f64 {
        self.phase_start
    }

    pub fn elapsed(&self, now: f64) -> f64 {
        now - self.phase_start
    }

    /// Advance the state machine to `now` given current activity
    pub fn update(&mut self, now: f64, active: bool) -> Phase {
        match self.phase {
            Phase::Silent => {
                if active {
                    self.enter(Phase::Intro, now);
                }
            }
            Phase::Intro | Phase::Main => {
                if active {
                    self.inactive_since = None;
                } else {
                    let since = *self.inactive_since.get_or_insert(now);
                    if now - since >= self.timing.grace {
                        self.enter(Phase::Outro, now);
                        return self.phase;
                    }
                }

                if self.phase == Phase::Intro && self.elapsed(now) > self.timing.intro {
                    self.enter(Phase::Main, now);
                }
            }
            Phase::Outro => {
                if active {
                    self.enter(Phase::Intro, now);
                } else if self.elapsed(now) > self.timing.outro {
                    self.enter(Phase::Silent, now);
                }
            }
        }

        self.phase
    }

    fn enter(&mut self, phase: Phase, now: f64) {
        log::debug!("voice phase {:?} -> {:?} at {:.3}s", self.phase, phase, now);
        self.phase = phase;
        self.phase_start = now;
        if phase != Phase::Main {
            self.inactive_since = None;
        }
    }
}
