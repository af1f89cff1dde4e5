//! Engine configuration.
//!
//! Built once before the engine starts and never changed while it runs.
//! Defaults are the installation's tuning; the builder setters exist for
//! tests and for alternate rigs.

use std::time::Duration;

use crate::error::{EngineError, Result};
use crate::sequencing::harmony::{default_progression, Chord};
use crate::voices::{LifecycleTiming, Phase, Role};

/// Density baseline per phase plus how strongly expression pushes it up
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DensityCurve {
    pub intro: f32,
    pub main: f32,
    pub outro: f32,
    pub expression_scale: f32,
}

impl DensityCurve {
    pub fn baseline(&self, phase: Phase) -> f32 {
        match phase {
            Phase::Silent => 0.0,
            Phase::Intro => self.intro,
            Phase::Main => self.main,
            Phase::Outro => self.outro,
        }
    }

    /// Per-step trigger probability threshold for a voice
    pub fn density(&self, phase: Phase, expression: f32) -> f32 {
        if !phase.is_sounding() {
            return 0.0;
        }
        (self.baseline(phase) + expression * self.expression_scale).clamp(0.0, 1.0)
    }
}

/// Octave multipliers on the root frequency, one register per role
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Registers {
    pub kick: f32,
    pub bass: f32,
    pub ostinato: f32,
    pub arp: f32,
}

impl Registers {
    pub fn of(&self, role: Role) -> f32 {
        match role {
            Role::Kick => self.kick,
            Role::Bass => self.bass,
            Role::Ostinato => self.ostinato,
            Role::Arp => self.arp,
        }
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self {
            kick: 0.5,
            bass: 1.0,
            ostinato: 4.0,
            arp: 8.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub tempo_bpm: f64,
    pub lifecycle: LifecycleTiming,
    pub chord_change_every_n_bars: u32,
    /// How far ahead of the hardware clock steps are dispatched
    pub schedule_ahead: f64,
    /// Wall-clock interval between scheduler polls
    pub poll_interval: Duration,
    pub root_frequency_hz: f32,
    pub progression: Vec<Chord>,
    pub registers: Registers,
    pub ostinato_density: DensityCurve,
    pub arp_density: DensityCurve,
    /// Energy at or above which a Main bass switches to driving eighths
    pub drive_energy_threshold: f32,
    /// Time constant of the kick intensity's exponential approach, seconds
    pub kick_time_constant: f64,
    /// Silent voices unobserved this long are dropped, seconds
    pub eviction_cooldown: f64,
    /// Seed of the deterministic trigger mask
    pub pattern_seed: u64,
}

impl EngineConfig {
    pub fn new() -> Self {
        Self {
            tempo_bpm: 120.0,
            lifecycle: LifecycleTiming::default(),
            chord_change_every_n_bars: 4,
            schedule_ahead: 0.1,
            poll_interval: Duration::from_millis(25),
            root_frequency_hz: 73.42, // D2
            progression: default_progression(),
            registers: Registers::default(),
            ostinato_density: DensityCurve {
                intro: 0.1,
                main: 0.25,
                outro: 0.1,
                expression_scale: 0.35,
            },
            arp_density: DensityCurve {
                intro: 0.15,
                main: 0.35,
                outro: 0.1,
                expression_scale: 0.5,
            },
            drive_energy_threshold: 0.7,
            kick_time_constant: 1.5,
            eviction_cooldown: 10.0,
            pattern_seed: 0x5EED_0F_5C0E,
        }
    }

    /// Set the tempo in beats per minute
    pub fn bpm(mut self, bpm: f64) -> Self {
        self.tempo_bpm = bpm;
        self
    }

    pub fn lifecycle(mut self, timing: LifecycleTiming) -> Self {
        self.lifecycle = timing;
        self
    }

    pub fn root(mut self, hz: f32) -> Self {
        self.root_frequency_hz = hz;
        self
    }

    pub fn progression(mut self, chords: Vec<Chord>, bars_per_chord: u32) -> Self {
        self.progression = chords;
        self.chord_change_every_n_bars = bars_per_chord;
        self
    }

    pub fn schedule_ahead(mut self, seconds: f64) -> Self {
        self.schedule_ahead = seconds;
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.pattern_seed = seed;
        self
    }

    /// Length of one sixteenth-note step in seconds
    pub fn step_seconds(&self) -> f64 {
        (60.0 / self.tempo_bpm) / 4.0
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| Err(EngineError::InvalidConfig(msg.to_string()));

        if !(self.tempo_bpm.is_finite() && self.tempo_bpm > 0.0) {
            return invalid("tempo must be a positive number of BPM");
        }
        if self.progression.is_empty() {
            return invalid("chord progression is empty");
        }
        if self.progression.iter().any(|c| c.intervals.is_empty()) {
            return invalid("every chord needs at least one interval");
        }
        if self.chord_change_every_n_bars == 0 {
            return invalid("chords must last at least one bar");
        }
        if !(self.schedule_ahead > 0.0) {
            return invalid("schedule-ahead window must be positive");
        }
        if self.poll_interval.is_zero() {
            return invalid("poll interval must be non-zero");
        }
        if self.poll_interval.as_secs_f64() >= self.schedule_ahead {
            // Each poll has to cover the gap until the next one
            return invalid("poll interval must be shorter than the schedule-ahead window");
        }
        if !(self.root_frequency_hz.is_finite() && self.root_frequency_hz > 0.0) {
            return invalid("root frequency must be positive");
        }
        let timing = &self.lifecycle;
        if [timing.intro, timing.outro, timing.grace, self.eviction_cooldown, self.kick_time_constant]
            .iter()
            .any(|v| !(v.is_finite() && *v >= 0.0))
        {
            return invalid("durations must be finite and non-negative");
        }

        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_defaults_validate() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_relative_eq!(config.step_seconds(), 0.125);
    }

    #[test]
    fn test_rejects_bad_tempo() {
        let err = EngineConfig::default().bpm(0.0).validate();
        assert!(matches!(err, Err(EngineError::InvalidConfig(_))));
        assert!(EngineConfig::default().bpm(f64::NAN).validate().is_err());
    }

    #[test]
    fn test_rejects_empty_progression() {
        assert!(EngineConfig::default().progression(vec![], 4).validate().is_err());
    }

    #[test]
    fn test_rejects_poll_slower_than_lookahead() {
        let config = EngineConfig::default()
            .schedule_ahead(0.02)
            .poll_interval(Duration::from_millis(25));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_density_curve() {
        let curve = EngineConfig::default().arp_density;
        assert_eq!(curve.density(Phase::Silent, 1.0), 0.0);
        assert_relative_eq!(curve.density(Phase::Main, 0.0), 0.35);
        assert_relative_eq!(curve.density(Phase::Main, 1.0), 0.85);
        assert_eq!(curve.density(Phase::Main, 5.0), 1.0);
    }
}
