//! The engine - scheduler, harmony, voices and rules wired to a clock and an
//! instrument.
//!
//! Each poll reads the hardware clock once and does everything against that
//! instant: take the newest performer batch, step every voice lifecycle, move
//! the kick intensity, send continuous modulation, then compose and trigger
//! every step inside the look-ahead window.
//!
//! # Example
//!
//! ```ignore
//! use gesture_score::engine::{instrument_ring, Engine};
//! use gesture_score::performer::parameter_feed;
//! use gesture_score::EngineConfig;
//!
//! let audio = AudioContext::open(render)?;
//! let (instrument, notes_rx) = instrument_ring(1024);
//! let (mut feed_tx, feed_rx) = parameter_feed(64);
//!
//! let handle = Engine::start(EngineConfig::default(), audio.clock(), instrument)?
//!     .with_feed(feed_rx)
//!     .spawn()?;
//! // ... publish snapshot batches through feed_tx ...
//! handle.stop();
//! ```

pub mod clock;
pub mod instrument;
pub mod offline;
pub mod scheduler;
pub mod timer;

pub use clock::{AudioContext, DeviceClock, HardwareClock, ManualClock, RenderBlock};
#[cfg(feature = "rtrb")]
pub use instrument::{instrument_ring, RingInstrument};
pub use instrument::{Instrument, InstrumentMessage, MessageReceiver, ModulationParams, NoteLog};
pub use scheduler::{ScheduledStep, Scheduler};
pub use timer::PollTimer;

use crate::composition::{CompositionRules, KickIntensity, NoteEvent, StepContext};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::performer::{PerformerSnapshot, SnapshotSource};
use crate::sequencing::HarmonyTrack;
use crate::voices::{Voice, VoiceRegistry};

pub struct Engine<C, I> {
    config: EngineConfig,
    clock: C,
    instrument: I,
    scheduler: Scheduler,
    harmony: HarmonyTrack,
    registry: VoiceRegistry,
    rules: CompositionRules,
    kick: KickIntensity,
    feed: Option<Box<dyn SnapshotSource>>,
    last_tick: f64,
    /// Scratch buffer reused for every step
    notes: Vec<NoteEvent>,
}

impl<C: HardwareClock, I: Instrument> Engine<C, I> {
    /// Validate the config and anchor the step grid at the clock's current
    /// time. Fails if the clock isn't running.
    pub fn start(config: EngineConfig, clock: C, instrument: I) -> Result<Self> {
        config.validate()?;
        let scheduler = Scheduler::start(&config, &clock)?;

        log::info!(
            "engine started at {:.3}s: {} bpm, {} chords every {} bars",
            scheduler.origin(),
            config.tempo_bpm,
            config.progression.len(),
            config.chord_change_every_n_bars
        );

        Ok(Self {
            harmony: HarmonyTrack::new(config.progression.clone(), config.chord_change_every_n_bars),
            registry: VoiceRegistry::new(config.lifecycle, config.eviction_cooldown),
            rules: CompositionRules::new(&config),
            kick: KickIntensity::new(config.kick_time_constant),
            last_tick: scheduler.origin(),
            scheduler,
            clock,
            instrument,
            feed: None,
            notes: Vec::with_capacity(16),
            config,
        })
    }

    /// Pull performer batches from `source` at the start of every poll
    pub fn with_feed(mut self, source: impl SnapshotSource + 'static) -> Self {
        self.feed = Some(Box::new(source));
        self
    }

    /// Replace the current performer input
    pub fn update_performers(&mut self, batch: &[PerformerSnapshot]) {
        let now = self.clock.now();
        self.registry.observe(batch, now);
    }

    /// Run one poll at the clock's current time.
    /// Returns how many steps were dispatched.
    pub fn poll(&mut self) -> usize {
        let now = self.clock.now();
        self.tick(now)
    }

    /// Run one poll at `now`
    pub fn tick(&mut self, now: f64) -> usize {
        // Destructure so the dispatch closure can borrow fields independently
        let Engine {
            clock: _,
            config: _,
            instrument,
            scheduler,
            harmony,
            registry,
            rules,
            kick,
            feed,
            last_tick,
            notes,
        } = self;

        if let Some(batch) = feed.as_mut().and_then(|f| f.latest()) {
            registry.observe(&batch, now);
        }

        let evicted = registry.advance(now);
        if evicted > 0 {
            log::debug!("{} voices evicted, {} remain", evicted, registry.len());
        }

        kick.update(registry.engaged_count(), now - *last_tick);
        *last_tick = now;

        for voice in registry.iter() {
            instrument.continuous_modulate(&modulation(voice));
        }

        let intensity = kick.level();
        scheduler.poll(now, |step| {
            let ctx = StepContext {
                step,
                chord: harmony.current_chord(step.bar_index),
                variation: harmony.variation(step.bar_index),
            };
            if step.step_index == 0 && step.bar_index % harmony.bars_per_chord() == 0 {
                log::debug!("bar {}: {} ({:?})", step.bar_index, ctx.chord.name, ctx.variation);
            }

            notes.clear();
            for voice in registry.iter() {
                rules.compose(
                    &ctx,
                    voice.performer_id,
                    voice.role,
                    voice.phase(),
                    voice.snapshot(),
                    notes,
                );
            }
            rules.compose_kick(&step, intensity, notes);

            for note in notes.iter() {
                instrument.trigger(note);
            }
        })
    }

    /// Hand the engine to a timer thread polling every `poll_interval`
    pub fn spawn(self) -> Result<EngineHandle>
    where
        C: 'static,
        I: 'static,
    {
        let interval = self.config.poll_interval;
        let mut engine = self;
        let timer = PollTimer::spawn("score-scheduler", interval, move || {
            engine.poll();
        })?;
        Ok(EngineHandle { timer })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn registry(&self) -> &VoiceRegistry {
        &self.registry
    }

    pub fn harmony(&self) -> &HarmonyTrack {
        &self.harmony
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn kick_level(&self) -> f32 {
        self.kick.level()
    }

    pub fn instrument(&self) -> &I {
        &self.instrument
    }

    pub fn into_instrument(self) -> I {
        self.instrument
    }
}

/// Continuous controls for one voice at its current phase
fn modulation(voice: &Voice) -> ModulationParams {
    let snapshot = voice.snapshot();
    let gain = voice.phase().gain();
    ModulationParams {
        performer_id: voice.performer_id,
        role: voice.role,
        phase: voice.phase(),
        brightness: ((0.3 + 0.7 * snapshot.expression) * gain).clamp(0.0, 1.0),
        level: ((0.5 + 0.5 * snapshot.energy) * gain).clamp(0.0, 1.0),
        pan: snapshot.pan,
    }
}

/// A running engine on its timer thread
pub struct EngineHandle {
    timer: PollTimer,
}

impl EngineHandle {
    /// False once stopped, or if a poll panicked and took the thread down
    pub fn is_running(&self) -> bool {
        !self.timer.is_cancelled() && !self.timer.is_finished()
    }

    /// Stop polling and wait for the thread. Notes already handed to the
    /// instrument still play.
    pub fn stop(self) {
        self.timer.join();
        log::info!("engine stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::voices::{Phase, Role};

    fn engine() -> (ManualClock, Engine<ManualClock, NoteLog>) {
        let clock = ManualClock::new();
        let engine = Engine::start(EngineConfig::default(), clock.clone(), NoteLog::new()).expect("engine starts");
        (clock, engine)
    }

    #[test]
    fn test_start_rejects_unavailable_clock() {
        let result = Engine::start(EngineConfig::default(), ManualClock::unavailable(), NoteLog::new());
        assert!(matches!(result, Err(EngineError::ClockUnavailable(_))));
    }

    #[test]
    fn test_start_rejects_invalid_config() {
        let config = EngineConfig::default().bpm(-1.0);
        let result = Engine::start(config, ManualClock::new(), NoteLog::new());
        assert!(matches!(result, Err(EngineError::InvalidConfig(_))));
    }

    #[test]
    fn test_no_performers_no_notes() {
        let (clock, mut engine) = engine();
        for _ in 0..400 {
            engine.poll();
            clock.advance(0.025);
        }
        assert!(engine.scheduler().dispatched() > 70);
        assert!(engine.instrument().notes().is_empty());
    }

    #[test]
    fn test_modulation_follows_phase() {
        let (clock, mut engine) = engine();
        engine.update_performers(&[PerformerSnapshot::new(1, 1.0, -0.5, 1.0)]);
        engine.poll();

        let params = engine.instrument().modulation(1).copied().expect("modulated");
        assert_eq!(params.phase, Phase::Intro);
        assert_eq!(params.role, Role::Bass);
        approx::assert_relative_eq!(params.brightness, 1.0, epsilon = 1e-6);
        assert_eq!(params.pan, -0.5);

        // Leave, wait out the grace window, land in Outro at half level
        engine.update_performers(&[]);
        clock.set(1.0);
        engine.poll();
        clock.set(3.5);
        engine.poll();
        let params = engine.instrument().modulation(1).copied().expect("modulated");
        assert_eq!(params.phase, Phase::Outro);
        // Last energy (1.0) carried into the outro
        assert_eq!(params.level, 0.5);
    }

    #[test]
    fn test_feed_batches_reach_registry() {
        struct Fixed(Vec<PerformerSnapshot>);
        impl SnapshotSource for Fixed {
            fn latest(&mut self) -> Option<Vec<PerformerSnapshot>> {
                Some(self.0.clone())
            }
        }

        let (_clock, engine) = engine();
        let mut engine = engine.with_feed(Fixed(vec![
            PerformerSnapshot::new(3, 0.5, 0.0, 0.5),
            PerformerSnapshot::new(8, 0.5, 0.0, 0.5),
        ]));
        engine.poll();
        assert_eq!(engine.registry().len(), 2);
        assert_eq!(engine.registry().engaged_count(), 2);
    }

    #[test]
    fn test_spawned_engine_stops() {
        let clock = ManualClock::new();
        let engine = Engine::start(EngineConfig::default(), clock.clone(), NoteLog::new()).expect("engine starts");
        let handle = engine.spawn().expect("timer thread");
        assert!(handle.is_running());
        clock.advance(1.0);
        std::thread::sleep(std::time::Duration::from_millis(50));
        handle.stop();
    }

    #[test]
    fn test_panicked_poll_is_not_running() {
        struct Exploding;
        impl Instrument for Exploding {
            fn trigger(&mut self, _note: &NoteEvent) {}
            fn continuous_modulate(&mut self, _params: &ModulationParams) {
                panic!("instrument failed");
            }
        }

        let clock = ManualClock::new();
        let mut engine = Engine::start(EngineConfig::default(), clock, Exploding).expect("engine starts");
        engine.update_performers(&[PerformerSnapshot::new(1, 0.5, 0.0, 0.5)]);
        let handle = engine.spawn().expect("timer thread");

        let start = std::time::Instant::now();
        while handle.is_running() && start.elapsed() < std::time::Duration::from_secs(5) {
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
        assert!(!handle.is_running());
        handle.stop();
    }
}
