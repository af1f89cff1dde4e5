//! Look-ahead step scheduler.
//!
//! The hardware clock is the only time authority. Each poll dispatches every
//! step whose time falls inside `[.., now + schedule_ahead)`. Step times are
//! computed from the origin and the step count, never accumulated, so they
//! don't drift and a late poll catches up with the steps still carrying their
//! original times.

use super::clock::HardwareClock;
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::STEPS_PER_BAR;

/// One sixteenth-note step bound to a hardware time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledStep {
    pub bar_index: u64,
    /// 0..16
    pub step_index: u8,
    /// Hardware clock time in seconds
    pub time: f64,
}

#[derive(Debug, Clone)]
pub struct Scheduler {
    origin: f64,
    step_seconds: f64,
    schedule_ahead: f64,
    /// Absolute index of the next step to dispatch
    next_step: u64,
}

impl Scheduler {
    /// Anchor the step grid at the clock's current time
    pub fn start(config: &EngineConfig, clock: &dyn HardwareClock) -> Result<Self> {
        if !clock.is_available() {
            return Err(EngineError::ClockUnavailable(
                "hardware clock is not running".to_string(),
            ));
        }
        Ok(Self::at(config, clock.now()))
    }

    pub fn at(config: &EngineConfig, origin: f64) -> Self {
        Self {
            origin,
            step_seconds: config.step_seconds(),
            schedule_ahead: config.schedule_ahead,
            next_step: 0,
        }
    }

    pub fn origin(&self) -> f64 {
        self.origin
    }

    pub fn step_seconds(&self) -> f64 {
        self.step_seconds
    }

    /// Time of the next step to be dispatched
    pub fn next_step_time(&self) -> f64 {
        self.step_time(self.next_step)
    }

    /// Steps dispatched so far
    pub fn dispatched(&self) -> u64 {
        self.next_step
    }

    /// Dispatch every step due before `now + schedule_ahead`, in order.
    /// Returns how many were dispatched.
    pub fn poll(&mut self, now: f64, mut dispatch: impl FnMut(ScheduledStep)) -> usize {
        let horizon = now + self.schedule_ahead;
        let mut count = 0;

        while self.next_step_time() < horizon {
            dispatch(self.step(self.next_step));
            self.next_step += 1;
            count += 1;
        }

        // More than a window's worth at once means the poller stalled
        let window_steps = (self.schedule_ahead / self.step_seconds).ceil() as usize + 1;
        if count > window_steps {
            log::warn!(
                "scheduler fell behind, caught up {} steps (now {:.3}s)",
                count,
                now
            );
        }

        count
    }

    fn step_time(&self, n: u64) -> f64 {
        self.origin + n as f64 * self.step_seconds
    }

    fn step(&self, n: u64) -> ScheduledStep {
        let per_bar = STEPS_PER_BAR as u64;
        ScheduledStep {
            bar_index: n / per_bar,
            step_index: (n % per_bar) as u8,
            time: self.step_time(n),
        }
    }
}
