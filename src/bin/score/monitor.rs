//! Monitor - renders triggered notes as decaying sines so the score is audible
//!
//! Lives on the audio thread. Notes arrive ahead of time through the
//! instrument ring and wait in `pending` until the device reaches their start
//! frame, so playback is sample-accurate to the scheduler's timing.

use std::f32::consts::{FRAC_PI_4, TAU};

use gesture_score::composition::NoteEvent;
use gesture_score::engine::{InstrumentMessage, MessageReceiver, RenderBlock};
use gesture_score::voices::Role;

const MAX_VOICES: usize = 32;
const MAX_PENDING: usize = 256;
const MASTER_GAIN: f32 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlipState {
    Free,
    Sounding,
}

/// One decaying sine
struct Blip {
    state: BlipState,
    phase: f32,
    increment: f32,
    amplitude: f32,
    /// Per-sample amplitude multiplier
    decay: f32,
    left: f32,
    right: f32,
    age: u64,
}

impl Blip {
    fn new() -> Self {
        Self {
            state: BlipState::Free,
            phase: 0.0,
            increment: 0.0,
            amplitude: 0.0,
            decay: 0.0,
            left: 0.0,
            right: 0.0,
            age: 0,
        }
    }

    fn start(&mut self, note: &NoteEvent, sample_rate: f32, age: u64) {
        // Fall to -60 dB over the note's length; the kick gets a fixed thump
        let length = match note.role {
            Role::Kick => 0.25,
            _ => (note.duration as f32).max(0.05),
        };
        self.decay = (0.001f32.ln() / (length * sample_rate)).exp();
        self.phase = 0.0;
        self.increment = TAU * note.frequency_hz / sample_rate;
        self.amplitude = note.velocity;

        // Equal-power pan
        let angle = (note.pan.clamp(-1.0, 1.0) + 1.0) * FRAC_PI_4;
        self.left = angle.cos();
        self.right = angle.sin();

        self.state = BlipState::Sounding;
        self.age = age;
    }

    fn next(&mut self) -> f32 {
        let sample = self.phase.sin() * self.amplitude;
        self.phase = (self.phase + self.increment) % TAU;
        self.amplitude *= self.decay;
        if self.amplitude < 1e-4 {
            self.state = BlipState::Free;
        }
        sample
    }
}

pub struct Monitor<R: MessageReceiver> {
    rx: R,
    blips: Vec<Blip>,
    pending: Vec<(u64, NoteEvent)>,
}

impl<R: MessageReceiver> Monitor<R> {
    pub fn new(rx: R) -> Self {
        Self {
            rx,
            blips: (0..MAX_VOICES).map(|_| Blip::new()).collect(),
            pending: Vec::with_capacity(MAX_PENDING),
        }
    }

    /// Fill one interleaved output block
    pub fn render(&mut self, out: &mut [f32], block: RenderBlock) {
        while let Some(msg) = self.rx.pop() {
            match msg {
                InstrumentMessage::Note(note) => {
                    let start = (note.start_time * block.sample_rate as f64).max(0.0) as u64;
                    if self.pending.len() < MAX_PENDING {
                        self.pending.push((start, note));
                    }
                }
                // Blips have fixed timbre
                InstrumentMessage::Modulate(_) => {}
            }
        }

        let channels = block.channels.max(1);
        for (i, frame) in out.chunks_mut(channels).enumerate() {
            let position = block.frame_position + i as u64;
            self.start_due(position, block.sample_rate);

            let (mut left, mut right) = (0.0, 0.0);
            for blip in self.blips.iter_mut().filter(|b| b.state == BlipState::Sounding) {
                let s = blip.next();
                left += s * blip.left;
                right += s * blip.right;
            }

            match frame {
                [mono] => *mono = (left + right) * 0.5 * MASTER_GAIN,
                [l, r, rest @ ..] => {
                    *l = left * MASTER_GAIN;
                    *r = right * MASTER_GAIN;
                    rest.fill(0.0);
                }
                [] => {}
            }
        }
    }

    fn start_due(&mut self, position: u64, sample_rate: f32) {
        let mut i = 0;
        while i < self.pending.len() {
            if self.pending[i].0 <= position {
                let (_, note) = self.pending.swap_remove(i);
                if let Some(blip) = self.allocate() {
                    blip.start(&note, sample_rate, position);
                }
            } else {
                i += 1;
            }
        }
    }

    fn allocate(&mut self) -> Option<&mut Blip> {
        // First pass: find a free blip
        if let Some(idx) = self.blips.iter().position(|b| b.state == BlipState::Free) {
            return self.blips.get_mut(idx);
        }

        // Second pass: steal the oldest
        let oldest = self
            .blips
            .iter()
            .enumerate()
            .min_by_key(|(_, b)| b.age)
            .map(|(idx, _)| idx);
        oldest.and_then(|idx| self.blips.get_mut(idx))
    }
}
