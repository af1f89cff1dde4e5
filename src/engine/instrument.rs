//! Instrument binding - where notes leave the engine.

use std::collections::BTreeMap;

#[cfg(feature = "rtrb")]
use rtrb::{Consumer, Producer, RingBuffer};

use crate::composition::NoteEvent;
use crate::performer::PerformerId;
use crate::voices::{Phase, Role};

/// Per-voice continuous controls, sent every poll
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModulationParams {
    pub performer_id: PerformerId,
    pub role: Role,
    pub phase: Phase,
    /// Timbre openness (0.0-1.0)
    pub brightness: f32,
    /// Output level (0.0-1.0)
    pub level: f32,
    pub pan: f32,
}

/// The sound-producing side. Triggers are fire-and-forget: once a note is
/// handed over the engine never revokes it.
pub trait Instrument: Send {
    fn trigger(&mut self, note: &NoteEvent);
    fn continuous_modulate(&mut self, params: &ModulationParams);
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum InstrumentMessage {
    Note(NoteEvent),
    Modulate(ModulationParams),
}

/// Audio-thread end of an instrument ring
pub trait MessageReceiver {
    fn pop(&mut self) -> Option<InstrumentMessage>;
}

#[cfg(feature = "rtrb")]
impl MessageReceiver for Consumer<InstrumentMessage> {
    fn pop(&mut self) -> Option<InstrumentMessage> {
        Consumer::pop(self).ok()
    }
}

/// Create an instrument that forwards everything over a lock-free ring to
/// whoever holds the consumer (normally the audio callback).
#[cfg(feature = "rtrb")]
pub fn instrument_ring(capacity: usize) -> (RingInstrument, Consumer<InstrumentMessage>) {
    let (tx, rx) = RingBuffer::new(capacity.max(1));
    (RingInstrument { tx, dropped: 0 }, rx)
}

#[cfg(feature = "rtrb")]
pub struct RingInstrument {
    tx: Producer<InstrumentMessage>,
    dropped: u64,
}

#[cfg(feature = "rtrb")]
impl RingInstrument {
    /// Notes lost to a full ring
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

#[cfg(feature = "rtrb")]
impl Instrument for RingInstrument {
    fn trigger(&mut self, note: &NoteEvent) {
        if self.tx.push(InstrumentMessage::Note(*note)).is_err() {
            self.dropped += 1;
            log::warn!("instrument ring full, dropping {} note", note.role.name());
        }
    }

    fn continuous_modulate(&mut self, params: &ModulationParams) {
        // Superseded next poll, not worth a warning
        let _ = self.tx.push(InstrumentMessage::Modulate(*params));
    }
}

/// Records everything it is sent. Used for offline bounces and tests.
#[derive(Debug, Clone, Default)]
pub struct NoteLog {
    notes: Vec<NoteEvent>,
    modulation: BTreeMap<PerformerId, ModulationParams>,
}

impl NoteLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notes(&self) -> &[NoteEvent] {
        &self.notes
    }

    pub fn into_notes(self) -> Vec<NoteEvent> {
        self.notes
    }

    /// Most recent modulation for a performer
    pub fn modulation(&self, id: PerformerId) -> Option<&ModulationParams> {
        self.modulation.get(&id)
    }
}

impl Instrument for NoteLog {
    fn trigger(&mut self, note: &NoteEvent) {
        self.notes.push(*note);
    }

    fn continuous_modulate(&mut self, params: &ModulationParams) {
        self.modulation.insert(params.performer_id, *params);
    }
}
