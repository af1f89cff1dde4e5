//! Composition rules - turn one scheduled step into note events.
//!
//! Everything here is a pure function of its inputs: the step, the chord and
//! variation the harmony track gives for that bar, a voice's role and phase,
//! and the performer's snapshot. Same inputs, same notes. The only randomness
//! is the seeded mask in [`density`], which is itself a pure function.

mod arp;
mod bass;
pub mod density;
mod kick;
pub mod library;
mod ostinato;

pub use kick::KickIntensity;
pub use library::PatternLibrary;

use crate::config::{DensityCurve, EngineConfig, Registers};
use crate::engine::ScheduledStep;
use crate::performer::{PerformerId, PerformerSnapshot};
use crate::sequencing::{pitch, Chord, Duration, HarmonicVariation};
use crate::voices::{Phase, Role};

/// One note handed to the instrument layer
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NoteEvent {
    pub role: Role,
    /// None for ensemble roles (the kick)
    pub performer_id: Option<PerformerId>,
    pub frequency_hz: f32,
    /// Hardware clock time in seconds
    pub start_time: f64,
    /// Seconds
    pub duration: f64,
    pub velocity: f32,
    pub pan: f32,
}

/// Harmonic context of one step
#[derive(Debug, Clone, Copy)]
pub struct StepContext<'a> {
    pub step: ScheduledStep,
    pub chord: &'a Chord,
    pub variation: HarmonicVariation,
}

/// Floor so a still-but-present performer is still heard
const VELOCITY_FLOOR: f32 = 0.3;

pub struct CompositionRules {
    library: PatternLibrary,
    tempo_bpm: f64,
    root_hz: f32,
    registers: Registers,
    ostinato_density: DensityCurve,
    arp_density: DensityCurve,
    drive_energy_threshold: f32,
    seed: u64,
}

impl CompositionRules {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            library: PatternLibrary::new(),
            tempo_bpm: config.tempo_bpm,
            root_hz: config.root_frequency_hz,
            registers: config.registers,
            ostinato_density: config.ostinato_density,
            arp_density: config.arp_density,
            drive_energy_threshold: config.drive_energy_threshold,
            seed: config.pattern_seed,
        }
    }

    pub fn library(&self) -> &PatternLibrary {
        &self.library
    }

    /// Notes one performer's voice plays on this step, appended to `out`
    pub fn compose(
        &self,
        ctx: &StepContext,
        performer_id: PerformerId,
        role: Role,
        phase: Phase,
        snapshot: &PerformerSnapshot,
        out: &mut Vec<NoteEvent>,
    ) {
        if !phase.is_sounding() {
            return;
        }

        let voice = VoiceInput {
            performer_id,
            role,
            phase,
            snapshot,
        };
        match role {
            Role::Bass => bass::compose(self, ctx, &voice, out),
            Role::Ostinato => ostinato::compose(self, ctx, &voice, out),
            Role::Arp => arp::compose(self, ctx, &voice, out),
            // The kick follows the ensemble, see `compose_kick`
            Role::Kick => {}
        }
    }

    /// The ensemble kick at the given smoothed intensity
    pub fn compose_kick(&self, step: &ScheduledStep, intensity: f32, out: &mut Vec<NoteEvent>) {
        kick::compose(self, step, intensity, out)
    }

    fn frequency(&self, role: Role, interval: i32) -> f32 {
        pitch::interval_to_freq(self.root_hz, self.registers.of(role), interval)
    }

    fn seconds(&self, length: Duration) -> f64 {
        length.to_seconds(self.tempo_bpm)
    }
}

/// The voice-specific half of a compose call
struct VoiceInput<'a> {
    performer_id: PerformerId,
    role: Role,
    phase: Phase,
    snapshot: &'a PerformerSnapshot,
}

impl VoiceInput<'_> {
    /// Expression and energy blended, scaled by template accent and phase gain
    fn velocity(&self, accent: f32) -> f32 {
        let drive = 0.6 * self.snapshot.expression + 0.4 * self.snapshot.energy;
        let base = VELOCITY_FLOOR + (1.0 - VELOCITY_FLOOR) * drive;
        (base * accent * self.phase.gain()).clamp(0.0, 1.0)
    }

    fn lane(&self) -> u64 {
        density::lane(self.role, Some(self.performer_id))
    }

    fn note(&self, frequency_hz: f32, start_time: f64, duration: f64, velocity: f32) -> NoteEvent {
        NoteEvent {
            role: self.role,
            performer_id: Some(self.performer_id),
            frequency_hz,
            start_time,
            duration,
            velocity,
            pan: self.snapshot.pan,
        }
    }
}
