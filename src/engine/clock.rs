//! Hardware time sources.
//!
//! The engine only ever asks a clock two things: is it running, and what time
//! is it. [`AudioContext`] owns the output stream and counts rendered frames,
//! which is the time base notes are scheduled against. [`ManualClock`] is set
//! by hand for offline rendering and tests.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use crate::error::{EngineError, Result};

/// Monotonic time in seconds from an audio device (or a stand-in)
pub trait HardwareClock: Send + Sync {
    fn is_available(&self) -> bool;
    fn now(&self) -> f64;
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    bits: Arc<AtomicU64>,
    available: bool,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            bits: Arc::new(AtomicU64::new(0.0f64.to_bits())),
            available: true,
        }
    }

    /// A clock reporting itself unavailable, like a device that failed to open
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    pub fn set(&self, seconds: f64) {
        self.bits.store(seconds.to_bits(), Ordering::Release);
    }

    pub fn advance(&self, seconds: f64) {
        self.set(self.now() + seconds);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl HardwareClock for ManualClock {
    fn is_available(&self) -> bool {
        self.available
    }

    fn now(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Acquire))
    }
}

/// Time as seen by the audio callback: frames rendered over the sample rate
#[derive(Debug, Clone)]
pub struct DeviceClock {
    frames: Arc<AtomicU64>,
    running: Arc<AtomicBool>,
    sample_rate: u32,
}

impl DeviceClock {
    fn new(sample_rate: u32) -> Self {
        Self {
            frames: Arc::new(AtomicU64::new(0)),
            running: Arc::new(AtomicBool::new(false)),
            sample_rate,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Frames rendered so far
    pub fn frame_position(&self) -> u64 {
        self.frames.load(Ordering::Acquire)
    }
}

impl HardwareClock for DeviceClock {
    fn is_available(&self) -> bool {
        self.running.load(Ordering::Acquire) && self.sample_rate > 0
    }

    fn now(&self) -> f64 {
        self.frame_position() as f64 / self.sample_rate.max(1) as f64
    }
}

/// Where the current output block sits on the device timeline
#[derive(Debug, Clone, Copy)]
pub struct RenderBlock {
    pub channels: usize,
    pub sample_rate: f32,
    /// Device frame index of the block's first frame
    pub frame_position: u64,
}

/// An open audio output device
///
/// Opening builds and starts the default output stream; the caller's render
/// function fills every interleaved block. Closing (or dropping) stops the
/// stream and marks the clock unavailable.
pub struct AudioContext {
    stream: Option<cpal::Stream>,
    clock: DeviceClock,
    channels: usize,
}

impl AudioContext {
    pub fn open<F>(mut render: F) -> Result<Self>
    where
        F: FnMut(&mut [f32], RenderBlock) + Send + 'static,
    {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| EngineError::ClockUnavailable("no default output device".to_string()))?;
        let config = device.default_output_config()?;

        let sample_rate = config.sample_rate().0;
        let channels = config.channels() as usize;
        let clock = DeviceClock::new(sample_rate);

        let frames = clock.frames.clone();
        let stream = device.build_output_stream(
            &config.into(),
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                let block = RenderBlock {
                    channels,
                    sample_rate: sample_rate as f32,
                    frame_position: frames.load(Ordering::Acquire),
                };
                render(data, block);
                let rendered = (data.len() / channels.max(1)) as u64;
                frames.fetch_add(rendered, Ordering::AcqRel);
            },
            |err| log::error!("audio stream error: {}", err),
            None,
        )?;
        stream.play()?;
        clock.running.store(true, Ordering::Release);

        log::info!("audio context open: {} Hz, {} channels", sample_rate, channels);

        Ok(Self {
            stream: Some(stream),
            clock,
            channels,
        })
    }

    /// A handle to the device clock, shareable with the scheduler thread
    pub fn clock(&self) -> DeviceClock {
        self.clock.clone()
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.clock.sample_rate
    }

    pub fn close(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.clock.running.store(false, Ordering::Release);
        if let Some(stream) = self.stream.take() {
            if let Err(err) = stream.pause() {
                log::warn!("failed to pause audio stream: {}", err);
            }
            log::info!("audio context closed at {:.3}s", self.clock.now());
        }
    }
}

impl Drop for AudioContext {
    fn drop(&mut self) {
        self.shutdown();
    }
}
