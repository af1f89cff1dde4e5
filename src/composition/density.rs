//! Deterministic trigger mask.
//!
//! Generative roles decide per step whether to play by comparing a mask value
//! against their density. The mask is a pure function of
//! `(seed, bar, step, lane)`: the four are folded through the SplitMix64
//! finalizer into one key, the key seeds a ChaCha8 generator, and the first
//! `f32` draw is the gate. The second draw is the humanization jitter, so
//! velocity variation is reproducible too and never affects gating.
//!
//! A lane is the role plus the performer id, so two performers on the same
//! role don't fire in lockstep.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::performer::PerformerId;
use crate::voices::Role;

/// The two values drawn for one step of one lane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaskDraw {
    /// Uniform in [0, 1); the step fires when this is below the density
    pub gate: f32,
    /// Uniform in [-1, 1); scaled by the caller into a velocity offset
    pub jitter: f32,
}

pub fn lane(role: Role, performer: Option<PerformerId>) -> u64 {
    let role_bits = (role as u64 + 1) << 40;
    role_bits | performer.map(|id| id as u64 + 1).unwrap_or(0)
}

pub fn mask_draw(seed: u64, bar_index: u64, step_index: u8, lane: u64) -> MaskDraw {
    let mut key = splitmix64(seed);
    key = splitmix64(key ^ bar_index);
    key = splitmix64(key ^ step_index as u64);
    key = splitmix64(key ^ lane);

    let mut rng = ChaCha8Rng::seed_from_u64(key);
    let gate: f32 = rng.random();
    let jitter: f32 = rng.random_range(-1.0..1.0);
    MaskDraw { gate, jitter }
}

/// SplitMix64 output function (Steele, Lea & Flood)
fn splitmix64(x: u64) -> u64 {
    let mut z = x.wrapping_add(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}
