//! Oscilloscope tap on the engine output
//!
//! The renderer pushes every output sample into a fixed ring of atomics
//! while the tap is enabled. Readers copy the most recent samples out
//! without touching render state and without blocking the writer. A read
//! that races a block may mix samples from adjacent blocks, which is fine
//! for a display.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};

/// Default number of samples kept for display
pub const SCOPE_SAMPLES_SIZE: usize = 1024;

/// Ring of recent output samples
#[derive(Debug)]
pub struct Oscilloscope {
    samples: Box<[AtomicU32]>,
    /// Total samples written (the ring index is this modulo capacity)
    written: AtomicUsize,
    enabled: AtomicBool,
}

impl Default for Oscilloscope {
    fn default() -> Self {
        Self::new(SCOPE_SAMPLES_SIZE)
    }
}

impl Oscilloscope {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: (0..capacity.max(1)).map(|_| AtomicU32::new(0)).collect(),
            written: AtomicUsize::new(0),
            enabled: AtomicBool::new(false),
        }
    }

    pub fn capacity(&self) -> usize {
        self.samples.len()
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Record one output sample (render thread only)
    #[inline]
    pub fn push(&self, sample: f32) {
        let n = self.written.load(Ordering::Relaxed);
        self.samples[n % self.samples.len()].store(sample.to_bits(), Ordering::Relaxed);
        self.written.store(n.wrapping_add(1), Ordering::Release);
    }

    /// Copy up to `out.len()` of the most recent samples, oldest first
    ///
    /// Returns the number of samples written to `out`.
    pub fn read_into(&self, out: &mut [f32]) -> usize {
        let written = self.written.load(Ordering::Acquire);
        let available = written.min(self.samples.len());
        let count = available.min(out.len());

        let start = written.wrapping_sub(count);
        for (i, slot) in out[..count].iter_mut().enumerate() {
            let index = start.wrapping_add(i) % self.samples.len();
            *slot = f32::from_bits(self.samples[index].load(Ordering::Relaxed));
        }
        count
    }

    /// Forget everything recorded so far
    pub fn clear(&self) {
        for sample in self.samples.iter() {
            sample.store(0, Ordering::Relaxed);
        }
        self.written.store(0, Ordering::Release);
    }
}
