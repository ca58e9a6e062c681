//! Shared lowpass filter
//!
//! A cascaded pair of one-pole smoothers with a resonance-driven
//! cross-feedback term. One instance colors the whole polyphonic mix; its
//! state carries across notes and blocks and is only cleared by `reset`.
//!
//! High resonance together with a high cutoff can self-oscillate. Only the
//! normalized cutoff is clamped.

use super::{sanitize_sample_rate, Effect};

/// Lowest cutoff frequency in Hz
pub const MIN_CUTOFF_HZ: f32 = 20.0;
/// Highest cutoff frequency in Hz
pub const MAX_CUTOFF_HZ: f32 = 20_000.0;
/// Resonance range
pub const MIN_RESONANCE: f32 = 0.1;
pub const MAX_RESONANCE: f32 = 10.0;

/// Two-pole lowpass filter
#[derive(Debug, Clone)]
pub struct LowpassFilter {
    cutoff: f32,
    resonance: f32,
    z1: f32,
    z2: f32,
    sample_rate: f32,
}

impl Default for LowpassFilter {
    fn default() -> Self {
        Self::new(44100.0)
    }
}

impl LowpassFilter {
    /// Create a filter at 1 kHz, resonance 1.0
    pub fn new(sample_rate: f32) -> Self {
        Self {
            cutoff: 1000.0,
            resonance: 1.0,
            z1: 0.0,
            z2: 0.0,
            sample_rate: sanitize_sample_rate(sample_rate),
        }
    }

    /// Set cutoff frequency in Hz (20 - 20000); non-finite values are ignored
    pub fn set_cutoff(&mut self, hz: f32) {
        if !hz.is_finite() {
            return;
        }
        self.cutoff = hz.clamp(MIN_CUTOFF_HZ, MAX_CUTOFF_HZ);
    }

    pub fn cutoff(&self) -> f32 {
        self.cutoff
    }

    /// Set resonance (0.1 - 10); non-finite values are ignored
    pub fn set_resonance(&mut self, resonance: f32) {
        if !resonance.is_finite() {
            return;
        }
        self.resonance = resonance.clamp(MIN_RESONANCE, MAX_RESONANCE);
    }

    pub fn resonance(&self) -> f32 {
        self.resonance
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }
}

impl Effect for LowpassFilter {
    #[inline]
    fn process_sample(&mut self, sample: f32) -> f32 {
        let nyquist = self.sample_rate / 2.0;
        let alpha = (self.cutoff / nyquist).clamp(0.001, 0.99);
        let feedback = self.resonance * 0.1;

        self.z1 += alpha * (sample - self.z1 + feedback * (self.z1 - self.z2));
        self.z2 += alpha * (self.z1 - self.z2);

        // A non-finite input would otherwise stick in the state forever
        if !self.z2.is_finite() {
            self.reset();
        }
        self.z2
    }

    /// Only the rate changes; filter state is kept
    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sanitize_sample_rate(sample_rate);
    }

    fn reset(&mut self) {
        self.z1 = 0.0;
        self.z2 = 0.0;
    }

    fn name(&self) -> &'static str {
        "Lowpass"
    }
}
