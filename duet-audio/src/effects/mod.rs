//! Audio effects for Duet

mod chain;
mod chorus;
mod delay;
mod delay_line;
mod filter;
mod reverb;

pub use chain::EffectsChain;
pub use chorus::ChorusEffect;
pub use delay::DelayEffect;
pub use delay_line::DelayLine;
pub use filter::LowpassFilter;
pub use reverb::ReverbEffect;

/// Effects that can sit in the post-filter chain, in processing order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectKind {
    /// Modulation
    Chorus,
    /// Time-based
    Delay,
    /// Spatial
    Reverb,
}

impl EffectKind {
    /// Fixed chain order: modulation, then time-based, then spatial
    pub const ORDER: [EffectKind; 3] = [EffectKind::Chorus, EffectKind::Delay, EffectKind::Reverb];

    pub fn name(self) -> &'static str {
        match self {
            EffectKind::Chorus => "Chorus",
            EffectKind::Delay => "Delay",
            EffectKind::Reverb => "Reverb",
        }
    }
}

/// Trait for mono sample processors
pub trait Effect: Send {
    /// Process a single sample
    fn process_sample(&mut self, sample: f32) -> f32;

    /// Process a block of samples in place
    fn process(&mut self, samples: &mut [f32]) {
        for sample in samples.iter_mut() {
            *sample = self.process_sample(*sample);
        }
    }

    /// Adopt a new sample rate, reallocating buffers and clearing state
    fn set_sample_rate(&mut self, sample_rate: f32);

    /// Clear internal state without touching parameters
    fn reset(&mut self);

    /// Set a parameter by effect-local id; unknown ids are ignored
    fn set_parameter(&mut self, _id: u32, _value: f32) {}

    /// Whether the effect currently alters the signal
    fn is_active(&self) -> bool {
        true
    }

    /// Get effect name
    fn name(&self) -> &'static str;
}

/// Guard against zero or negative rates before deriving buffer sizes
#[inline]
pub(crate) fn sanitize_sample_rate(sample_rate: f32) -> f32 {
    if sample_rate.is_finite() && sample_rate >= 1.0 {
        sample_rate
    } else {
        1.0
    }
}
