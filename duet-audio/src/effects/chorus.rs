//! Multi-voice chorus
//!
//! Two to four short delay lines whose read taps are swept by sine LFOs.
//! Voice base delays are spread evenly between 5 and 20 ms, and each voice's
//! LFO runs a quarter cycle ahead of the previous one.

use super::delay_line::DelayLine;
use super::{sanitize_sample_rate, Effect};
use std::f32::consts::PI;

const TWO_PI: f32 = 2.0 * PI;

/// Shortest voice base delay in ms
const MIN_DELAY_MS: f32 = 5.0;
/// Longest voice base delay in ms
const MAX_DELAY_MS: f32 = 20.0;

/// Voice count range
pub const MIN_VOICES: usize = 2;
pub const MAX_VOICES: usize = 4;

/// Feedback ceiling, kept well below the delay's for stability
pub const MAX_FEEDBACK: f32 = 0.3;

/// One modulated delay tap
#[derive(Debug, Clone)]
struct ChorusVoice {
    line: DelayLine,
    /// Base delay in samples
    base_delay: f32,
    /// LFO phase in radians
    lfo_phase: f32,
}

impl ChorusVoice {
    fn new(capacity: usize) -> Self {
        Self {
            line: DelayLine::new(capacity),
            base_delay: 0.0,
            lfo_phase: 0.0,
        }
    }
}

/// Chorus effect with LFO-modulated delay voices
pub struct ChorusEffect {
    /// Always holds `MAX_VOICES` lines; only the first `num_voices` run
    voices: [ChorusVoice; MAX_VOICES],
    num_voices: usize,
    sample_rate: f32,
    /// LFO rate in Hz (0.1 - 5.0)
    rate: f32,
    /// Modulation depth (0.0 - 1.0)
    depth: f32,
    /// Feedback amount (0.0 - 0.3)
    feedback: f32,
    wet_level: f32,
    dry_level: f32,
    enabled: bool,
    /// Master LFO phase in radians
    master_phase: f32,
}

impl Default for ChorusEffect {
    fn default() -> Self {
        Self::new(44100.0)
    }
}

impl ChorusEffect {
    pub const PARAM_RATE: u32 = 0;
    pub const PARAM_DEPTH: u32 = 1;
    pub const PARAM_VOICES: u32 = 2;
    pub const PARAM_FEEDBACK: u32 = 3;
    pub const PARAM_WET: u32 = 4;
    pub const PARAM_DRY: u32 = 5;
    pub const PARAM_ENABLED: u32 = 6;

    /// Create a new chorus (1.5 Hz, 40% depth, two voices, disabled)
    pub fn new(sample_rate: f32) -> Self {
        let sample_rate = sanitize_sample_rate(sample_rate);
        let capacity = Self::capacity_for(sample_rate);

        let mut chorus = Self {
            voices: std::array::from_fn(|_| ChorusVoice::new(capacity)),
            num_voices: MIN_VOICES,
            sample_rate,
            rate: 1.5,
            depth: 0.4,
            feedback: 0.2,
            wet_level: 0.5,
            dry_level: 0.8,
            enabled: false,
            master_phase: 0.0,
        };
        chorus.update_base_delays();
        chorus
    }

    /// Line length: twice the longest base delay, for modulation headroom
    fn capacity_for(sample_rate: f32) -> usize {
        (sample_rate * (MAX_DELAY_MS / 1000.0) * 2.0) as usize
    }

    fn ms_to_samples(&self, ms: f32) -> f32 {
        ((ms / 1000.0) * self.sample_rate).trunc()
    }

    /// Spread the running voices evenly across the base delay range
    fn update_base_delays(&mut self) {
        let n = self.num_voices;
        for i in 0..n {
            let ms = MIN_DELAY_MS + i as f32 * (MAX_DELAY_MS - MIN_DELAY_MS) / (n - 1) as f32;
            self.voices[i].base_delay = self.ms_to_samples(ms);
        }
    }

    /// Set LFO rate in Hz (0.1 - 5.0)
    pub fn set_rate(&mut self, rate: f32) {
        if !rate.is_finite() {
            return;
        }
        self.rate = rate.clamp(0.1, 5.0);
    }

    pub fn rate(&self) -> f32 {
        self.rate
    }

    /// Set modulation depth (0.0 - 1.0)
    pub fn set_depth(&mut self, depth: f32) {
        if !depth.is_finite() {
            return;
        }
        self.depth = depth.clamp(0.0, 1.0);
    }

    pub fn depth(&self) -> f32 {
        self.depth
    }

    /// Set the number of voices (2 - 4)
    ///
    /// Re-spreads base delays and clears every line.
    pub fn set_voices(&mut self, voices: usize) {
        self.num_voices = voices.clamp(MIN_VOICES, MAX_VOICES);
        self.update_base_delays();
        self.reset();
    }

    pub fn voices(&self) -> usize {
        self.num_voices
    }

    /// Set feedback amount (0.0 - 0.3)
    pub fn set_feedback(&mut self, feedback: f32) {
        if !feedback.is_finite() {
            return;
        }
        self.feedback = feedback.clamp(0.0, MAX_FEEDBACK);
    }

    pub fn feedback(&self) -> f32 {
        self.feedback
    }

    /// Set wet level (0.0 - 1.0)
    pub fn set_wet_level(&mut self, wet: f32) {
        if !wet.is_finite() {
            return;
        }
        self.wet_level = wet.clamp(0.0, 1.0);
    }

    pub fn wet_level(&self) -> f32 {
        self.wet_level
    }

    /// Set dry level (0.0 - 1.0)
    pub fn set_dry_level(&mut self, dry: f32) {
        if !dry.is_finite() {
            return;
        }
        self.dry_level = dry.clamp(0.0, 1.0);
    }

    pub fn dry_level(&self) -> f32 {
        self.dry_level
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Base delay of a running voice, in samples
    pub fn base_delay(&self, voice: usize) -> Option<f32> {
        self.voices[..self.num_voices]
            .get(voice)
            .map(|v| v.base_delay)
    }

    pub fn master_phase(&self) -> f32 {
        self.master_phase
    }
}

impl Effect for ChorusEffect {
    #[inline]
    fn process_sample(&mut self, sample: f32) -> f32 {
        if !self.enabled {
            return sample;
        }

        self.master_phase += TWO_PI * self.rate / self.sample_rate;
        if self.master_phase >= TWO_PI {
            self.master_phase -= TWO_PI;
        }

        let voice_gain = self.wet_level / self.num_voices as f32;
        let mut output = sample * self.dry_level;

        for (index, voice) in self.voices[..self.num_voices].iter_mut().enumerate() {
            voice.lfo_phase = self.master_phase + index as f32 * PI / 2.0;
            if voice.lfo_phase >= TWO_PI {
                voice.lfo_phase -= TWO_PI;
            }

            let lfo = voice.lfo_phase.sin();
            let swing = voice.base_delay * self.depth * 0.5;
            let max_delay = (voice.line.capacity() as f32 - 1.0).max(1.0);
            let delay = (voice.base_delay + lfo * swing).clamp(1.0, max_delay) as usize;

            let delayed = voice.line.process_tap(sample, delay, self.feedback);
            output += delayed * voice_gain;
        }

        output
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sanitize_sample_rate(sample_rate);
        let capacity = Self::capacity_for(self.sample_rate);
        for voice in self.voices.iter_mut() {
            voice.line.resize(capacity);
        }
        self.update_base_delays();
        self.reset();
    }

    fn reset(&mut self) {
        for voice in self.voices.iter_mut() {
            voice.line.clear();
            voice.lfo_phase = 0.0;
        }
        self.master_phase = 0.0;
    }

    fn set_parameter(&mut self, id: u32, value: f32) {
        if !value.is_finite() {
            return;
        }
        match id {
            Self::PARAM_RATE => self.set_rate(value),
            Self::PARAM_DEPTH => self.set_depth(value),
            Self::PARAM_VOICES => self.set_voices(value.max(0.0) as usize),
            Self::PARAM_FEEDBACK => self.set_feedback(value),
            Self::PARAM_WET => self.set_wet_level(value),
            Self::PARAM_DRY => self.set_dry_level(value),
            Self::PARAM_ENABLED => self.set_enabled(value > 0.5),
            _ => {}
        }
    }

    fn is_active(&self) -> bool {
        self.enabled
    }

    fn name(&self) -> &'static str {
        "Chorus"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chorus_defaults() {
        let chorus = ChorusEffect::new(44100.0);
        assert!(!chorus.is_enabled());
        assert!(!chorus.is_active());
        assert_eq!(chorus.voices(), 2);
        assert_eq!(chorus.rate(), 1.5);
        assert_eq!(chorus.voices[0].line.capacity(), 1764);
    }

    #[test]
    fn test_disabled_is_identity_and_lfo_frozen() {
        let mut chorus = ChorusEffect::new(44100.0);
        for x in [-1.0, 0.0, 0.25, 0.9, 3.0] {
            assert_eq!(chorus.process_sample(x), x);
        }
        assert_eq!(chorus.master_phase(), 0.0);
        assert_eq!(chorus.voices[0].line.write_pos(), 0);
    }

    #[test]
    fn test_base_delays_spread() {
        let mut chorus = ChorusEffect::new(44100.0);
        assert_eq!(chorus.base_delay(0), Some(220.0)); // 5 ms
        assert_eq!(chorus.base_delay(1), Some(882.0)); // 20 ms
        assert_eq!(chorus.base_delay(2), None);

        chorus.set_voices(4);
        assert_eq!(chorus.base_delay(0), Some(220.0)); // 5 ms
        assert_eq!(chorus.base_delay(1), Some(441.0)); // 10 ms
        assert_eq!(chorus.base_delay(2), Some(661.0)); // 15 ms
        assert_eq!(chorus.base_delay(3), Some(882.0)); // 20 ms
    }

    #[test]
    fn test_parameter_clamping() {
        let mut chorus = ChorusEffect::new(48000.0);

        chorus.set_parameter(ChorusEffect::PARAM_RATE, 20.0);
        assert_eq!(chorus.rate(), 5.0);
        chorus.set_parameter(ChorusEffect::PARAM_RATE, 0.0);
        assert_eq!(chorus.rate(), 0.1);

        chorus.set_parameter(ChorusEffect::PARAM_DEPTH, 1.5);
        assert_eq!(chorus.depth(), 1.0);

        chorus.set_parameter(ChorusEffect::PARAM_FEEDBACK, 0.9);
        assert_eq!(chorus.feedback(), 0.3);

        chorus.set_parameter(ChorusEffect::PARAM_VOICES, 9.0);
        assert_eq!(chorus.voices(), 4);
        chorus.set_parameter(ChorusEffect::PARAM_VOICES, -3.0);
        assert_eq!(chorus.voices(), 2);
        chorus.set_parameter(ChorusEffect::PARAM_VOICES, 3.7);
        assert_eq!(chorus.voices(), 3);

        chorus.set_parameter(ChorusEffect::PARAM_ENABLED, 1.0);
        assert!(chorus.is_active());

        chorus.set_parameter(42, 1.0);
    }

    #[test]
    fn test_non_finite_parameters_are_ignored() {
        let mut chorus = ChorusEffect::new(44100.0);
        chorus.set_enabled(true);
        chorus.set_voices(3);
        chorus.set_rate(f32::NAN);
        chorus.set_depth(f32::INFINITY);
        chorus.set_feedback(f32::NAN);
        chorus.set_parameter(ChorusEffect::PARAM_VOICES, f32::NAN);
        chorus.set_parameter(ChorusEffect::PARAM_WET, f32::NAN);
        chorus.set_parameter(ChorusEffect::PARAM_ENABLED, f32::NAN);

        assert_eq!(chorus.rate(), 1.5);
        assert_eq!(chorus.depth(), 0.4);
        assert_eq!(chorus.feedback(), 0.2);
        assert_eq!(chorus.voices(), 3);
        assert_eq!(chorus.wet_level(), 0.5);
        assert!(chorus.is_enabled());

        for n in 0..4410 {
            assert!(chorus.process_sample((n as f32 * 0.05).sin()).is_finite());
        }
    }

    #[test]
    fn test_dry_path_before_first_echo() {
        let mut chorus = ChorusEffect::new(44100.0);
        chorus.set_enabled(true);
        chorus.set_dry_level(0.6);

        // Lines are empty for at least the shortest modulated delay
        let out = chorus.process_sample(1.0);
        assert!((out - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_output_stays_bounded() {
        let mut chorus = ChorusEffect::new(44100.0);
        chorus.set_enabled(true);
        chorus.set_voices(4);
        chorus.set_depth(1.0);
        chorus.set_feedback(0.3);
        chorus.set_rate(5.0);
        chorus.set_wet_level(1.0);
        chorus.set_dry_level(1.0);

        for n in 0..44100 {
            let x = (n as f32 * 0.05).sin();
            let y = chorus.process_sample(x);
            assert!(y.is_finite() && y.abs() < 4.0, "sample {} = {}", n, y);
        }
        assert!((0.0..TWO_PI).contains(&chorus.master_phase()));
    }

    #[test]
    fn test_reset_clears_lfo() {
        let mut chorus = ChorusEffect::new(44100.0);
        chorus.set_enabled(true);
        for _ in 0..100 {
            chorus.process_sample(0.5);
        }
        assert!(chorus.master_phase() > 0.0);
        chorus.reset();
        assert_eq!(chorus.master_phase(), 0.0);
        assert_eq!(chorus.rate(), 1.5);
    }
}
