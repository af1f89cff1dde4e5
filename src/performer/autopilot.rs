//! Autopilot - simulated performers for when nobody is in front of the camera.
//!
//! Each simulated performer wanders in and out of the space on a seeded
//! schedule and moves its parameters along slow sine sweeps. Output depends
//! only on the seed and the sample times, never on how often it is sampled.

use std::f64::consts::TAU;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::{PerformerId, PerformerSnapshot};

/// Seconds a simulated performer stays, then stays away
const PRESENT_SECONDS: std::ops::Range<f64> = 20.0..60.0;
const ABSENT_SECONDS: std::ops::Range<f64> = 5.0..20.0;

struct SimPerformer {
    id: PerformerId,
    rng: ChaCha8Rng,
    active: bool,
    next_toggle: f64,
    /// Base sweep rate in Hz
    rate: f64,
    phases: [f64; 3],
}

pub struct Autopilot {
    performers: Vec<SimPerformer>,
}

impl Autopilot {
    /// `count` simulated performers with ids `0..count`, all initially absent.
    pub fn new(count: usize, seed: u64) -> Self {
        let performers = (0..count)
            .map(|i| {
                // One stream per performer so draws never interleave
                let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(i as u64));
                SimPerformer {
                    id: i as PerformerId,
                    active: false,
                    // Stagger arrivals so the ensemble builds up
                    next_toggle: i as f64 * rng.random_range(2.0..8.0),
                    rate: rng.random_range(0.02..0.08),
                    phases: [
                        rng.random_range(0.0..TAU),
                        rng.random_range(0.0..TAU),
                        rng.random_range(0.0..TAU),
                    ],
                    rng,
                }
            })
            .collect();

        Self { performers }
    }

    /// Snapshots for every simulated performer at time `now` (seconds).
    ///
    /// `now` must not go backwards between calls. A non-finite `now` leaves
    /// every presence schedule where it was.
    pub fn sample(&mut self, now: f64) -> Vec<PerformerSnapshot> {
        self.performers
            .iter_mut()
            .map(|p| {
                while now.is_finite() && now >= p.next_toggle {
                    p.active = !p.active;
                    let span = if p.active {
                        PRESENT_SECONDS
                    } else {
                        ABSENT_SECONDS
                    };
                    p.next_toggle += p.rng.random_range(span);
                }

                let sweep = |multiplier: f64, phase: f64| (TAU * p.rate * multiplier * now + phase).sin();
                let expression = 0.5 + 0.5 * sweep(1.0, p.phases[0]);
                let pan = 0.8 * sweep(0.37, p.phases[1]);
                let energy = (0.5 + 0.5 * sweep(1.7, p.phases[2])).powf(1.5);

                PerformerSnapshot {
                    id: p.id,
                    active: p.active,
                    expression: expression as f32,
                    pan: pan as f32,
                    energy: energy as f32,
                }
            })
            .collect()
    }
}
