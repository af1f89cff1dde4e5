/*
Pattern API
===========

Patterns describe one bar of a role's rhythm where timing is implicit in
position. Top-level slots divide the bar equally; brackets subdivide a slot.
Everything is quantized to the sixteenth-note step grid the scheduler runs on.

Slots carry a scale degree rather than a pitch: the composition rules resolve
the degree against whatever chord is active when the step fires. For the bass
that is 0 = root, 1 = fifth; generative roles index into the chord intervals.

Example mental model:
    [0, _, 0, _]             = hits on steps 0 and 8
    [[0, _, _, 1], _, _, _]  = step 0 and step 3
    [[0, 0], [0, 0], ..]     = eighth notes

This module provides:
- `PatternSlot` - A single slot that can be a hit, rest, or subdivision
- `Pattern` - One bar of slots
- Conversion to the `StepGrid` the rules read per step
*/

use super::grid::{StepGrid, StepHit};
use crate::STEPS_PER_BAR;

/// A slot in a pattern - can be a hit, rest, or subdivision
#[derive(Debug, Clone, PartialEq)]
pub enum PatternSlot {
    /// A hit on a scale degree
    Hit(HitSlot),
    /// Silence for this slot
    Rest,
    /// Subdivide this slot into smaller parts
    Subdivision(Vec<PatternSlot>),
}

/// A hit with optional accent and weight for uneven subdivisions
#[derive(Debug, Clone, PartialEq)]
pub struct HitSlot {
    /// Scale degree, resolved against the active chord
    pub degree: u8,
    /// Velocity multiplier, defaults to 1.0
    pub accent: f32,
    /// Weight for uneven subdivisions (default 1)
    /// In a subdivision like [0@3, 1], the first hit gets 3/4 of the time
    pub weight: u8,
}

impl HitSlot {
    pub fn new(degree: u8) -> Self {
        Self {
            degree,
            accent: 1.0,
            weight: 1,
        }
    }

    pub fn with_accent(mut self, accent: f32) -> Self {
        self.accent = accent;
        self
    }

    pub fn with_weight(mut self, weight: u8) -> Self {
        self.weight = weight;
        self
    }
}

/// Convenient conversion from a degree to PatternSlot
impl From<u8> for PatternSlot {
    fn from(degree: u8) -> Self {
        PatternSlot::Hit(HitSlot::new(degree))
    }
}

/// One bar of rhythm
#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    pub slots: Vec<PatternSlot>,
}

impl Pattern {
    pub fn new(slots: Vec<PatternSlot>) -> Self {
        Self { slots }
    }

    /// Quantize to the 16-step grid.
    ///
    /// When two hits land on the same step the later one wins.
    pub fn to_grid(&self) -> StepGrid {
        let mut grid = StepGrid::empty();
        let slot_count = self.slots.len() as u32;

        if slot_count == 0 {
            return grid;
        }

        let bar_steps = STEPS_PER_BAR as u32;
        let mut cursor = 0u32;
        for (i, slot) in self.slots.iter().enumerate() {
            // Integer boundaries so the slots tile the bar exactly
            let end = bar_steps * (i as u32 + 1) / slot_count;
            Self::expand_slot(slot, cursor, end - cursor, &mut grid);
            cursor = end;
        }

        grid
    }

    /// Recursively place a slot spanning `[start, start + length)` steps
    fn expand_slot(slot: &PatternSlot, start: u32, length: u32, grid: &mut StepGrid) {
        match slot {
            PatternSlot::Hit(hit) => {
                // Slots narrower than a step collapse onto their start step
                grid.set(
                    start as u8,
                    StepHit {
                        degree: hit.degree,
                        accent: hit.accent,
                    },
                );
            }
            PatternSlot::Rest => {}
            PatternSlot::Subdivision(sub_slots) => {
                assert!(
                    !sub_slots.is_empty(),
                    "Empty subdivision is not allowed - use PatternSlot::Rest for silence"
                );

                let weight_of = |s: &PatternSlot| match s {
                    PatternSlot::Hit(h) => h.weight.max(1) as u32,
                    _ => 1,
                };
                let total_weight: u32 = sub_slots.iter().map(weight_of).sum();

                let mut acc = 0u32;
                let mut sub_cursor = start;
                for sub_slot in sub_slots {
                    acc += weight_of(sub_slot);
                    let end = start + length * acc / total_weight;
                    Self::expand_slot(sub_slot, sub_cursor, end - sub_cursor, grid);
                    sub_cursor = end;
                }
            }
        }
    }
}

/// Macro for writing one-bar patterns
///
/// # Examples
///
/// ```
/// use gesture_score::pattern;
///
/// // Four on the floor
/// let kick = pattern![0, 0, 0, 0];
///
/// // Root on the downbeat, fifth on the last sixteenth of beat 2
/// let bass = pattern![[0, _, _, _], [_, _, _, 1], _, _];
///
/// let grid = bass.to_grid();
/// assert!(grid.hit(0).is_some());
/// assert_eq!(grid.hit(7).map(|h| h.degree), Some(1));
/// ```
#[macro_export]
macro_rules! pattern {
    // Rest slot
    (@slot _) => {
        $crate::sequencing::PatternSlot::Rest
    };

    // Subdivision slot (brackets)
    (@slot [$($inner:tt),* $(,)?]) => {
        $crate::sequencing::PatternSlot::Subdivision(
            vec![$($crate::pattern!(@slot $inner)),*]
        )
    };

    // Hit slot (any other degree expression)
    (@slot $degree:expr) => {
        $crate::sequencing::PatternSlot::from($degree as u8)
    };

    ($($slot:tt),* $(,)?) => {
        $crate::sequencing::Pattern::new(vec![$($crate::pattern!(@slot $slot)),*])
    };
}

/// Helper functions for building pattern slots
pub mod slot {
    use super::*;

    pub fn hit(degree: u8) -> PatternSlot {
        PatternSlot::Hit(HitSlot::new(degree))
    }

    pub fn accented(degree: u8, accent: f32) -> PatternSlot {
        PatternSlot::Hit(HitSlot::new(degree).with_accent(accent))
    }

    pub fn weighted(degree: u8, weight: u8) -> PatternSlot {
        PatternSlot::Hit(HitSlot::new(degree).with_weight(weight))
    }

    pub fn rest() -> PatternSlot {
        PatternSlot::Rest
    }

    pub fn sub(slots: Vec<PatternSlot>) -> PatternSlot {
        PatternSlot::Subdivision(slots)
    }
}
