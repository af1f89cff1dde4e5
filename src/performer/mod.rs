//! Performer input - the gesture parameters that drive the music.
//!
//! Snapshots arrive from outside the engine (pose tracking, or the autopilot
//! when nobody is tracked) once per caller tick. The engine never trusts them:
//! everything passes through [`PerformerSnapshot::sanitized`] first.

pub mod autopilot;
pub mod feed;

pub use autopilot::Autopilot;
pub use feed::SnapshotSource;
#[cfg(feature = "rtrb")]
pub use feed::{parameter_feed, FeedReceiver, FeedSender};

pub type PerformerId = u32;

/// One performer's gesture parameters at one caller tick
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PerformerSnapshot {
    pub id: PerformerId,
    /// Performer is present and tracked
    pub active: bool,
    /// How expressive the gesture is (0.0-1.0)
    pub expression: f32,
    /// Stereo position (-1.0 left, 1.0 right)
    pub pan: f32,
    /// Overall movement energy (0.0-1.0)
    pub energy: f32,
}

impl PerformerSnapshot {
    pub fn new(id: PerformerId, expression: f32, pan: f32, energy: f32) -> Self {
        Self {
            id,
            active: true,
            expression,
            pan,
            energy,
        }
    }

    /// A snapshot standing in for a performer we have no data for
    pub fn inactive(id: PerformerId) -> Self {
        Self {
            id,
            active: false,
            expression: 0.0,
            pan: 0.0,
            energy: 0.0,
        }
    }

    /// Clamp every field into range. Any non-finite field marks the
    /// performer inactive rather than guessing a value.
    pub fn sanitized(&self) -> Self {
        let finite = self.expression.is_finite() && self.pan.is_finite() && self.energy.is_finite();
        if !finite {
            return Self::inactive(self.id);
        }

        Self {
            id: self.id,
            active: self.active,
            expression: self.expression.clamp(0.0, 1.0),
            pan: self.pan.clamp(-1.0, 1.0),
            energy: self.energy.clamp(0.0, 1.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_clamps_ranges() {
        let snap = PerformerSnapshot::new(3, 1.4, -2.0, -0.1).sanitized();
        assert!(snap.active);
        assert_eq!(snap.expression, 1.0);
        assert_eq!(snap.pan, -1.0);
        assert_eq!(snap.energy, 0.0);
    }

    #[test]
    fn test_non_finite_snapshot_is_inactive() {
        let snap = PerformerSnapshot::new(7, f32::NAN, 0.0, 0.5).sanitized();
        assert!(!snap.active);
        assert_eq!(snap.id, 7);

        let snap = PerformerSnapshot::new(7, 0.5, f32::INFINITY, 0.5).sanitized();
        assert!(!snap.active);
    }
}
