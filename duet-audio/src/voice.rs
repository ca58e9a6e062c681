//! Dual-oscillator voice
//!
//! Two oscillators per note, the second detuned in cents, blended by a
//! crossfade amount and scaled by note velocity. There is no envelope:
//! a voice is either sounding at full velocity or silent.

use crate::oscillator::{Oscillator, Waveform};

/// Detune range in cents
pub const DETUNE_RANGE_CENTS: f32 = 100.0;

/// Global oscillator settings applied to every new voice
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoiceSettings {
    pub osc1_waveform: Waveform,
    pub osc2_waveform: Waveform,
    /// Detune of oscillator 2 in cents (-100 to +100)
    pub detune: f32,
    /// Oscillator crossfade (0.0 = osc1 only, 1.0 = osc2 only)
    pub mix: f32,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            osc1_waveform: Waveform::Sine,
            osc2_waveform: Waveform::Sine,
            detune: 0.0,
            mix: 0.5,
        }
    }
}

/// Convert cents to a frequency ratio: 2^(cents / 1200)
#[inline]
pub fn cents_to_ratio(cents: f32) -> f32 {
    2.0_f32.powf(cents / 1200.0)
}

/// One sounding note with two oscillators
#[derive(Debug, Clone)]
pub struct DualOscVoice {
    osc1: Oscillator,
    osc2: Oscillator,
    velocity: f32,
    detune: f32,
    mix: f32,
    active: bool,
}

impl Default for DualOscVoice {
    fn default() -> Self {
        Self::new()
    }
}

impl DualOscVoice {
    pub fn new() -> Self {
        Self {
            osc1: Oscillator::new(),
            osc2: Oscillator::new(),
            velocity: 0.0,
            detune: 0.0,
            mix: 0.5,
            active: false,
        }
    }

    /// Copy waveforms, detune and mix from the global settings
    pub fn apply_settings(&mut self, settings: &VoiceSettings) {
        self.set_osc1_waveform(settings.osc1_waveform);
        self.set_osc2_waveform(settings.osc2_waveform);
        self.set_detune(settings.detune);
        self.set_mix(settings.mix);
    }

    /// Start a note: set both frequencies and restart both cycles
    ///
    /// A non-finite velocity is treated as 0.
    pub fn note_on(&mut self, frequency: f32, velocity: f32) {
        self.velocity = if velocity.is_finite() { velocity } else { 0.0 };
        self.active = true;

        self.osc1.set_frequency(frequency);
        self.osc2.set_frequency(frequency * cents_to_ratio(self.detune));

        self.osc1.reset();
        self.osc2.reset();
    }

    /// Silence the voice; oscillator phase is left where it is
    pub fn note_off(&mut self) {
        self.active = false;
        self.velocity = 0.0;
    }

    #[inline]
    pub fn generate_sample(&mut self, sample_rate: f32) -> f32 {
        if !self.active {
            return 0.0;
        }

        let s1 = self.osc1.generate_sample(sample_rate);
        let s2 = self.osc2.generate_sample(sample_rate);

        (s1 * (1.0 - self.mix) + s2 * self.mix) * self.velocity
    }

    pub fn set_osc1_waveform(&mut self, waveform: Waveform) {
        self.osc1.set_waveform(waveform);
    }

    pub fn set_osc2_waveform(&mut self, waveform: Waveform) {
        self.osc2.set_waveform(waveform);
    }

    /// Set detune in cents (-100 to +100)
    ///
    /// Retunes oscillator 2 of a live voice immediately.
    pub fn set_detune(&mut self, cents: f32) {
        if !cents.is_finite() {
            return;
        }
        self.detune = cents.clamp(-DETUNE_RANGE_CENTS, DETUNE_RANGE_CENTS);
        self.osc2
            .set_frequency(self.osc1.frequency() * cents_to_ratio(self.detune));
    }

    /// Set oscillator mix (0.0 - 1.0)
    pub fn set_mix(&mut self, mix: f32) {
        if !mix.is_finite() {
            return;
        }
        self.mix = mix.clamp(0.0, 1.0);
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    pub fn detune(&self) -> f32 {
        self.detune
    }

    pub fn mix(&self) -> f32 {
        self.mix
    }

    pub fn osc1(&self) -> &Oscillator {
        &self.osc1
    }

    pub fn osc2(&self) -> &Oscillator {
        &self.osc2
    }
}
