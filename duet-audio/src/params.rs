//! Lock-free parameter cells shared between control and render threads

use std::sync::atomic::{AtomicU32, Ordering};

/// `f32` stored as bits in an `AtomicU32`
#[derive(Debug)]
pub struct AtomicF32(AtomicU32);

impl AtomicF32 {
    pub fn new(value: f32) -> Self {
        Self(AtomicU32::new(value.to_bits()))
    }

    #[inline]
    pub fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn store(&self, value: f32) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }
}

/// Continuous controls read by the renderer once per block
#[derive(Debug)]
pub struct SharedParams {
    /// Filter cutoff in Hz (clamped by the filter)
    pub cutoff: AtomicF32,
    /// Filter resonance (clamped by the filter)
    pub resonance: AtomicF32,
}

impl SharedParams {
    pub fn new(cutoff: f32, resonance: f32) -> Self {
        Self {
            cutoff: AtomicF32::new(cutoff),
            resonance: AtomicF32::new(resonance),
        }
    }
}

impl Default for SharedParams {
    fn default() -> Self {
        Self::new(1000.0, 1.0)
    }
}
