//! Four-line feedback reverb
//!
//! Four parallel delay lines of fixed, mutually prime lengths so their
//! comb resonances do not line up. All lines share one feedback gain of
//! `room_size * damping`, and the wet signal is their average.

use super::delay_line::DelayLine;
use super::Effect;

/// Line lengths in samples (primes, independent of sample rate)
const LINE_LENGTHS: [usize; 4] = [1051, 1399, 1777, 2003];

/// Simple comb-bank reverb
///
/// Parameters are stored as given; keeping them in 0.0 - 1.0 is up to the
/// caller. Non-finite values are ignored.
pub struct ReverbEffect {
    lines: [DelayLine; 4],
    room_size: f32,
    damping: f32,
    wet_level: f32,
    dry_level: f32,
    sample_rate: f32,
}

impl Default for ReverbEffect {
    fn default() -> Self {
        Self::new()
    }
}

impl ReverbEffect {
    pub const PARAM_ROOM_SIZE: u32 = 0;
    pub const PARAM_DAMPING: u32 = 1;
    pub const PARAM_WET: u32 = 2;
    pub const PARAM_DRY: u32 = 3;

    pub fn new() -> Self {
        Self {
            lines: LINE_LENGTHS.map(DelayLine::new),
            room_size: 0.5,
            damping: 0.5,
            wet_level: 0.3,
            dry_level: 0.7,
            sample_rate: 44100.0,
        }
    }

    pub fn set_room_size(&mut self, room_size: f32) {
        if !room_size.is_finite() {
            return;
        }
        self.room_size = room_size;
    }

    pub fn room_size(&self) -> f32 {
        self.room_size
    }

    pub fn set_damping(&mut self, damping: f32) {
        if !damping.is_finite() {
            return;
        }
        self.damping = damping;
    }

    pub fn damping(&self) -> f32 {
        self.damping
    }

    pub fn set_wet_level(&mut self, wet: f32) {
        if !wet.is_finite() {
            return;
        }
        self.wet_level = wet;
    }

    pub fn wet_level(&self) -> f32 {
        self.wet_level
    }

    pub fn set_dry_level(&mut self, dry: f32) {
        if !dry.is_finite() {
            return;
        }
        self.dry_level = dry;
    }

    pub fn dry_level(&self) -> f32 {
        self.dry_level
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Shared feedback gain of the four lines
    pub fn feedback(&self) -> f32 {
        self.room_size * self.damping
    }
}

impl Effect for ReverbEffect {
    #[inline]
    fn process_sample(&mut self, sample: f32) -> f32 {
        let feedback = self.feedback();
        let reverb: f32 = self
            .lines
            .iter_mut()
            .map(|line| line.process(sample, feedback))
            .sum::<f32>()
            * 0.25;

        sample * self.dry_level + reverb * self.wet_level
    }

    /// Line lengths are fixed, so this only records the rate and clears
    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.reset();
    }

    fn reset(&mut self) {
        for line in self.lines.iter_mut() {
            line.clear();
        }
    }

    fn set_parameter(&mut self, id: u32, value: f32) {
        match id {
            Self::PARAM_ROOM_SIZE => self.set_room_size(value),
            Self::PARAM_DAMPING => self.set_damping(value),
            Self::PARAM_WET => self.set_wet_level(value),
            Self::PARAM_DRY => self.set_dry_level(value),
            _ => {}
        }
    }

    fn is_active(&self) -> bool {
        self.wet_level > 0.0
    }

    fn name(&self) -> &'static str {
        "Reverb"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_lengths() {
        let reverb = ReverbEffect::new();
        let lengths: Vec<usize> = reverb.lines.iter().map(|l| l.capacity()).collect();
        assert_eq!(lengths, LINE_LENGTHS.to_vec());
    }

    #[test]
    fn test_activity_follows_wet_level() {
        let mut reverb = ReverbEffect::new();
        assert!(reverb.is_active());
        reverb.set_parameter(ReverbEffect::PARAM_WET, 0.0);
        assert!(!reverb.is_active());
        reverb.set_parameter(ReverbEffect::PARAM_WET, 0.01);
        assert!(reverb.is_active());
    }

    #[test]
    fn test_zero_wet_leaves_scaled_dry_path() {
        // Not an identity: the default dry level still scales the input
        let mut reverb = ReverbEffect::new();
        reverb.set_wet_level(0.0);
        for n in 0..5000 {
            let x = (n as f32 * 0.01).sin();
            assert_eq!(reverb.process_sample(x), x * 0.7);
        }
    }

    #[test]
    fn test_impulse_echoes_at_each_line_length() {
        let mut reverb = ReverbEffect::new();
        reverb.set_dry_level(0.0);
        reverb.set_wet_level(1.0);

        let out: Vec<f32> = (0..2100)
            .map(|n| reverb.process_sample(if n == 0 { 1.0 } else { 0.0 }))
            .collect();

        for &len in &LINE_LENGTHS {
            assert!((out[len] - 0.25).abs() < 1e-6, "no echo at {}", len);
        }
        assert_eq!(out[1000], 0.0);
    }

    #[test]
    fn test_parameters_are_not_clamped() {
        let mut reverb = ReverbEffect::new();
        reverb.set_parameter(ReverbEffect::PARAM_ROOM_SIZE, 1.5);
        reverb.set_parameter(ReverbEffect::PARAM_DAMPING, 0.4);
        assert_eq!(reverb.room_size(), 1.5);
        assert!((reverb.feedback() - 0.6).abs() < 1e-6);
        reverb.set_parameter(7, 0.0);
        assert_eq!(reverb.dry_level(), 0.7);
    }

    #[test]
    fn test_non_finite_parameters_are_ignored() {
        let mut reverb = ReverbEffect::new();
        reverb.set_parameter(ReverbEffect::PARAM_ROOM_SIZE, f32::NAN);
        reverb.set_parameter(ReverbEffect::PARAM_DAMPING, f32::INFINITY);
        reverb.set_parameter(ReverbEffect::PARAM_WET, f32::NAN);
        reverb.set_dry_level(f32::NEG_INFINITY);

        assert_eq!(reverb.room_size(), 0.5);
        assert_eq!(reverb.damping(), 0.5);
        assert_eq!(reverb.wet_level(), 0.3);
        assert_eq!(reverb.dry_level(), 0.7);
        assert!(reverb.process_sample(1.0).is_finite());
    }

    #[test]
    fn test_reset_keeps_parameters() {
        let mut reverb = ReverbEffect::new();
        reverb.set_room_size(0.9);
        reverb.process_sample(1.0);
        reverb.set_sample_rate(48000.0);
        assert_eq!(reverb.room_size(), 0.9);
        assert_eq!(reverb.sample_rate(), 48000.0);
        reverb.set_dry_level(0.0);
        for _ in 0..2100 {
            assert_eq!(reverb.process_sample(0.0), 0.0);
        }
    }
}
