//! Equal-tempered pitch math relative to the session root frequency.

/// Frequency of a semitone offset from `root_hz`.
///
/// `register` is the role's octave multiplier (1.0 = root octave, 2.0 = one up).
#[inline]
pub fn interval_to_freq(root_hz: f32, register: f32, interval: i32) -> f32 {
    root_hz * register * 2.0_f32.powf(interval as f32 / 12.0)
}

/// Semitone offset of `freq_hz` above `root_hz` (fractional, may be negative).
#[inline]
pub fn freq_to_interval(root_hz: f32, freq_hz: f32) -> f32 {
    12.0 * (freq_hz / root_hz).log2()
}
