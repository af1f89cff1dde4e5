use std::collections::BTreeMap;

use super::{LifecycleTiming, Phase, Role, VoiceLifecycle};
use crate::performer::{PerformerId, PerformerSnapshot};

/// One performer's voice
#[derive(Debug, Clone)]
pub struct Voice {
    pub performer_id: PerformerId,
    pub role: Role,
    lifecycle: VoiceLifecycle,
    /// Latest input, already sanitized. Inactive while the performer is missing.
    snapshot: PerformerSnapshot,
    /// Last time a snapshot for this performer arrived
    last_seen: f64,
}

impl Voice {
    pub fn phase(&self) -> Phase {
        self.lifecycle.phase()
    }

    pub fn lifecycle(&self) -> &VoiceLifecycle {
        &self.lifecycle
    }

    pub fn snapshot(&self) -> &PerformerSnapshot {
        &self.snapshot
    }
}

/// Every known voice, keyed (and iterated) by performer id
///
/// Voices appear the first time a performer is observed and are evicted once
/// they have gone silent and no snapshot has named them for the cooldown.
#[derive(Debug, Clone)]
pub struct VoiceRegistry {
    voices: BTreeMap<PerformerId, Voice>,
    timing: LifecycleTiming,
    eviction_cooldown: f64,
}

impl VoiceRegistry {
    pub fn new(timing: LifecycleTiming, eviction_cooldown: f64) -> Self {
        Self {
            voices: BTreeMap::new(),
            timing,
            eviction_cooldown,
        }
    }

    /// Replace the current input with `batch`.
    ///
    /// Known performers missing from the batch count as inactive but keep
    /// their last parameters, so an outro fades from where they left off. If
    /// an id appears twice the later snapshot wins.
    pub fn observe(&mut self, batch: &[PerformerSnapshot], now: f64) {
        for voice in self.voices.values_mut() {
            voice.snapshot.active = false;
        }

        for raw in batch {
            let snapshot = raw.sanitized();
            if !self.voices.contains_key(&snapshot.id) {
                let role = self.next_role();
                log::debug!("new voice for performer {} as {}", snapshot.id, role.name());
                self.voices.insert(
                    snapshot.id,
                    Voice {
                        performer_id: snapshot.id,
                        role,
                        lifecycle: VoiceLifecycle::new(self.timing),
                        snapshot,
                        last_seen: now,
                    },
                );
            }

            if let Some(voice) = self.voices.get_mut(&snapshot.id) {
                voice.snapshot = snapshot;
                voice.last_seen = now;
            }
        }
    }

    /// Step every lifecycle to `now`, then evict stale silent voices.
    /// Returns how many voices were evicted.
    pub fn advance(&mut self, now: f64) -> usize {
        for voice in self.voices.values_mut() {
            voice.lifecycle.update(now, voice.snapshot.active);
        }

        let cooldown = self.eviction_cooldown;
        let before = self.voices.len();
        self.voices.retain(|id, voice| {
            let stale = voice.phase() == Phase::Silent && now - voice.last_seen > cooldown;
            if stale {
                log::debug!("evicting voice for performer {}", id);
            }
            !stale
        });
        before - self.voices.len()
    }

    /// Voices in Intro or Main - the count the kick follows
    pub fn engaged_count(&self) -> usize {
        self.voices.values().filter(|v| v.phase().is_engaged()).count()
    }

    pub fn get(&self, id: PerformerId) -> Option<&Voice> {
        self.voices.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Voice> {
        self.voices.values()
    }

    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    /// Least-used melodic role, ties broken by `Role::MELODIC` order
    fn next_role(&self) -> Role {
        Role::MELODIC
            .into_iter()
            .min_by_key(|role| self.voices.values().filter(|v| v.role == *role).count())
            .unwrap_or(Role::Bass)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> VoiceRegistry {
        VoiceRegistry::new(LifecycleTiming::default(), 10.0)
    }

    fn active(id: PerformerId) -> PerformerSnapshot {
        PerformerSnapshot::new(id, 0.5, 0.0, 0.5)
    }

    #[test]
    fn test_roles_fill_least_used_first() {
        let mut reg = registry();
        reg.observe(&[active(10), active(4), active(7), active(1)], 0.0);

        // Created in batch order: 10, 4, 7, 1
        assert_eq!(reg.get(10).map(|v| v.role), Some(Role::Bass));
        assert_eq!(reg.get(4).map(|v| v.role), Some(Role::Ostinato));
        assert_eq!(reg.get(7).map(|v| v.role), Some(Role::Arp));
        assert_eq!(reg.get(1).map(|v| v.role), Some(Role::Bass));
    }

    #[test]
    fn test_iteration_is_ordered_by_id() {
        let mut reg = registry();
        reg.observe(&[active(9), active(2), active(5)], 0.0);
        let ids: Vec<_> = reg.iter().map(|v| v.performer_id).collect();
        assert_eq!(ids, vec![2, 5, 9]);
    }

    #[test]
    fn test_missing_snapshot_counts_as_inactive() {
        let mut reg = registry();
        reg.observe(&[active(1)], 0.0);
        reg.advance(0.0);
        assert_eq!(reg.get(1).map(|v| v.phase()), Some(Phase::Intro));

        reg.observe(&[], 0.5);
        assert!(!reg.get(1).map(|v| v.snapshot().active).unwrap_or(true));
        assert_eq!(reg.get(1).map(|v| v.snapshot().expression), Some(0.5));

        // Grace window passes, voice heads out
        reg.advance(0.5);
        reg.advance(2.6);
        assert_eq!(reg.get(1).map(|v| v.phase()), Some(Phase::Outro));
    }

    #[test]
    fn test_malformed_snapshot_counts_as_inactive() {
        let mut reg = registry();
        reg.observe(&[PerformerSnapshot::new(3, f32::NAN, 0.0, 0.0)], 0.0);
        reg.advance(0.0);
        assert_eq!(reg.get(3).map(|v| v.phase()), Some(Phase::Silent));
    }

    #[test]
    fn test_eviction_after_silence_and_cooldown() {
        let mut reg = registry();
        reg.observe(&[active(1)], 0.0);
        reg.advance(0.0);

        // Performer disappears at t=1
        reg.observe(&[], 1.0);
        let mut t = 1.0;
        while t < 30.0 {
            reg.advance(t);
            t += 0.25;
        }
        assert!(reg.is_empty());
    }

    #[test]
    fn test_silent_but_observed_voice_is_kept() {
        let mut reg = registry();
        let mut t = 0.0;
        while t < 60.0 {
            reg.observe(&[PerformerSnapshot::inactive(4)], t);
            reg.advance(t);
            t += 0.5;
        }
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_engaged_count() {
        let mut reg = registry();
        reg.observe(&[active(1), active(2), PerformerSnapshot::inactive(3)], 0.0);
        reg.advance(0.0);
        assert_eq!(reg.engaged_count(), 2);
    }
}
