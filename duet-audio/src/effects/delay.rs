//! Feedback delay (echo)
//!
//! A single delay line sized for the longest supported delay. The delayed
//! sample is read before the input (plus feedback) is written, so an impulse
//! reappears exactly `delay_time * sample_rate` samples later.

use super::delay_line::DelayLine;
use super::{sanitize_sample_rate, Effect};

/// Maximum delay time in seconds
pub const MAX_DELAY_SECS: f32 = 2.0;
/// Minimum delay time in seconds
pub const MIN_DELAY_SECS: f32 = 0.001;
/// Feedback ceiling (prevents runaway)
pub const MAX_FEEDBACK: f32 = 0.95;

/// Mono feedback delay
pub struct DelayEffect {
    line: DelayLine,
    sample_rate: f32,
    /// Delay time in seconds (0.001 - 2.0)
    delay_time: f32,
    /// Feedback amount (0.0 - 0.95)
    feedback: f32,
    wet_level: f32,
    dry_level: f32,
    enabled: bool,
}

impl Default for DelayEffect {
    fn default() -> Self {
        Self::new(44100.0)
    }
}

impl DelayEffect {
    pub const PARAM_TIME: u32 = 0;
    pub const PARAM_FEEDBACK: u32 = 1;
    pub const PARAM_WET: u32 = 2;
    pub const PARAM_DRY: u32 = 3;
    pub const PARAM_ENABLED: u32 = 4;

    /// Create a new delay effect (250ms, 30% feedback, enabled)
    pub fn new(sample_rate: f32) -> Self {
        let sample_rate = sanitize_sample_rate(sample_rate);
        Self {
            line: DelayLine::new(Self::capacity_for(sample_rate)),
            sample_rate,
            delay_time: 0.25,
            feedback: 0.3,
            wet_level: 0.5,
            dry_level: 0.5,
            enabled: true,
        }
    }

    fn capacity_for(sample_rate: f32) -> usize {
        (sample_rate * MAX_DELAY_SECS) as usize
    }

    /// Delay in whole samples at the current rate
    pub fn delay_samples(&self) -> usize {
        (self.delay_time * self.sample_rate) as usize
    }

    /// Set delay time in seconds (0.001 - 2.0)
    pub fn set_delay_time(&mut self, seconds: f32) {
        if !seconds.is_finite() {
            return;
        }
        self.delay_time = seconds.clamp(MIN_DELAY_SECS, MAX_DELAY_SECS);
    }

    pub fn delay_time(&self) -> f32 {
        self.delay_time
    }

    /// Set feedback amount (0.0 - 0.95)
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

    pub fn buffer_len(&self) -> usize {
        self.line.capacity()
    }
}

impl Effect for DelayEffect {
    #[inline]
    fn process_sample(&mut self, sample: f32) -> f32 {
        if !self.enabled {
            return sample;
        }

        let delayed = self
            .line
            .process_tap(sample, self.delay_samples(), self.feedback);

        sample * self.dry_level + delayed * self.wet_level
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sanitize_sample_rate(sample_rate);
        self.line.resize(Self::capacity_for(self.sample_rate));
        self.reset();
    }

    fn reset(&mut self) {
        self.line.clear();
    }

    fn set_parameter(&mut self, id: u32, value: f32) {
        if !value.is_finite() {
            return;
        }
        match id {
            Self::PARAM_TIME => self.set_delay_time(value),
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
        "Delay"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_impulse_reappears_after_delay_time() {
        let mut delay = DelayEffect::new(44100.0);
        delay.set_delay_time(0.01);
        delay.set_feedback(0.0);
        delay.set_wet_level(0.8);
        delay.set_dry_level(0.0);

        let expected_at = (0.01_f32 * 44100.0) as usize;
        for n in 0..2000 {
            let input = if n == 0 { 1.0 } else { 0.0 };
            let out = delay.process_sample(input);
            if n == expected_at {
                assert!((out - 0.8).abs() < 1e-6, "echo at {} was {}", n, out);
            } else {
                assert_eq!(out, 0.0, "unexpected output {} at sample {}", out, n);
            }
        }
    }

    #[test]
    fn test_feedback_repeats_decay() {
        let mut delay = DelayEffect::new(1000.0);
        delay.set_delay_time(0.01); // 10 samples
        delay.set_feedback(0.5);
        delay.set_wet_level(1.0);
        delay.set_dry_level(0.0);

        let out: Vec<f32> = (0..31)
            .map(|n| delay.process_sample(if n == 0 { 1.0 } else { 0.0 }))
            .collect();
        assert_eq!(out[10], 1.0);
        assert_eq!(out[20], 0.5);
        assert_eq!(out[30], 0.25);
    }

    #[test]
    fn test_disabled_is_identity_and_frozen() {
        let mut delay = DelayEffect::new(44100.0);
        delay.set_enabled(false);
        for x in [-1.0, -0.3, 0.0, 0.42, 1.0, 7.5] {
            assert_eq!(delay.process_sample(x), x);
        }
        assert_eq!(delay.line.write_pos(), 0);
        assert!(!delay.is_active());
    }

    #[test]
    fn test_parameter_clamping_and_ids() {
        let mut delay = DelayEffect::new(48000.0);

        delay.set_parameter(DelayEffect::PARAM_TIME, 10.0);
        assert_eq!(delay.delay_time(), 2.0);
        delay.set_parameter(DelayEffect::PARAM_TIME, 0.0);
        assert_eq!(delay.delay_time(), 0.001);

        delay.set_parameter(DelayEffect::PARAM_FEEDBACK, 1.5);
        assert_eq!(delay.feedback(), 0.95);

        delay.set_parameter(DelayEffect::PARAM_WET, -1.0);
        assert_eq!(delay.wet_level(), 0.0);
        delay.set_parameter(DelayEffect::PARAM_DRY, 2.0);
        assert_eq!(delay.dry_level(), 1.0);

        delay.set_parameter(DelayEffect::PARAM_ENABLED, 0.2);
        assert!(!delay.is_enabled());
        delay.set_parameter(DelayEffect::PARAM_ENABLED, 0.9);
        assert!(delay.is_enabled());

        // Unknown id is ignored
        delay.set_parameter(99, 0.0);
        assert!(delay.is_enabled());
    }

    #[test]
    fn test_non_finite_parameters_are_ignored() {
        let mut delay = DelayEffect::new(44100.0);
        delay.set_feedback(f32::NAN);
        delay.set_parameter(DelayEffect::PARAM_TIME, f32::INFINITY);
        delay.set_parameter(DelayEffect::PARAM_WET, f32::NAN);
        delay.set_parameter(DelayEffect::PARAM_ENABLED, f32::NAN);
        delay.set_dry_level(f32::NEG_INFINITY);

        assert_eq!(delay.feedback(), 0.3);
        assert_eq!(delay.delay_time(), 0.25);
        assert_eq!(delay.wet_level(), 0.5);
        assert_eq!(delay.dry_level(), 0.5);
        assert!(delay.is_enabled());

        for n in 0..44100 {
            let x = (n as f32 * 0.01).sin();
            assert!(delay.process_sample(x).is_finite(), "sample {}", n);
        }
    }

    #[test]
    fn test_sample_rate_resizes_buffer() {
        let mut delay = DelayEffect::new(44100.0);
        assert_eq!(delay.buffer_len(), 88200);
        delay.set_sample_rate(48000.0);
        assert_eq!(delay.buffer_len(), 96000);
        assert_eq!(delay.delay_samples(), 12000);
    }

    #[test]
    fn test_reset_keeps_parameters() {
        let mut delay = DelayEffect::new(44100.0);
        delay.set_delay_time(0.5);
        delay.set_feedback(0.7);
        delay.process_sample(1.0);
        delay.reset();
        assert_eq!(delay.delay_time(), 0.5);
        assert_eq!(delay.feedback(), 0.7);
    }
}
