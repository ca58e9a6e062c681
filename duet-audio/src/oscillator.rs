//! Phase-accumulating oscillator
//!
//! Naive (non band-limited) waveforms driven by a normalized phase in [0, 1).
//! The sample rate is passed per call so that a voice can be rendered at
//! whatever rate the host is currently running.

use std::f32::consts::PI;
use std::fmt;
use std::str::FromStr;

/// Oscillator waveform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum Waveform {
    #[default]
    Sine,
    Square,
    Saw,
    Triangle,
}

impl Waveform {
    /// All waveforms, in index order
    pub const ALL: [Waveform; 4] = [
        Waveform::Sine,
        Waveform::Square,
        Waveform::Saw,
        Waveform::Triangle,
    ];

    /// Map a numeric selector (0 = sine, 1 = square, 2 = saw, 3 = triangle)
    pub fn from_index(index: i32) -> Option<Self> {
        usize::try_from(index)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
    }

    /// Lowercase name, as used in config files
    pub fn name(self) -> &'static str {
        match self {
            Waveform::Sine => "sine",
            Waveform::Square => "square",
            Waveform::Saw => "saw",
            Waveform::Triangle => "triangle",
        }
    }

    /// Evaluate the waveform at `phase`
    #[inline]
    fn evaluate(self, phase: f32) -> f32 {
        match self {
            Waveform::Sine => (phase * 2.0 * PI).sin(),
            Waveform::Square => {
                if (phase * 2.0 * PI).sin() >= 0.0 {
                    1.0
                } else {
                    -1.0
                }
            }
            // Centered: 0 at phase 0, jumps from +1 to -1 at phase 0.5
            Waveform::Saw => 2.0 * (phase - (phase + 0.5).floor()),
            Waveform::Triangle => {
                let p = phase - phase.floor();
                if p < 0.5 {
                    4.0 * p - 1.0
                } else {
                    3.0 - 4.0 * p
                }
            }
        }
    }
}

impl fmt::Display for Waveform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Waveform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        if let Ok(index) = s.parse::<i32>() {
            return Self::from_index(index)
                .ok_or_else(|| format!("waveform index {} out of range", index));
        }
        match s.as_str() {
            "sine" => Ok(Waveform::Sine),
            "square" => Ok(Waveform::Square),
            "saw" | "sawtooth" => Ok(Waveform::Saw),
            "triangle" | "tri" => Ok(Waveform::Triangle),
            other => Err(format!("unknown waveform '{}'", other)),
        }
    }
}

/// Convert a MIDI note number to frequency in Hz (A4 = note 69 = 440 Hz)
pub fn midi_note_to_frequency(note: i32) -> f32 {
    440.0 * 2.0_f32.powf((note - 69) as f32 / 12.0)
}

/// Single oscillator owned by a voice
#[derive(Debug, Clone)]
pub struct Oscillator {
    frequency: f32,
    /// Normalized phase, kept in [0, 1) for positive frequencies below Nyquist
    phase: f32,
    waveform: Waveform,
}

impl Default for Oscillator {
    fn default() -> Self {
        Self::new()
    }
}

impl Oscillator {
    pub fn new() -> Self {
        Self {
            frequency: 440.0,
            phase: 0.0,
            waveform: Waveform::Sine,
        }
    }

    /// Set frequency in Hz; non-finite values are ignored
    pub fn set_frequency(&mut self, frequency: f32) {
        if !frequency.is_finite() {
            return;
        }
        self.frequency = frequency;
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn set_waveform(&mut self, waveform: Waveform) {
        self.waveform = waveform;
    }

    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Restart the cycle at phase 0
    pub fn reset(&mut self) {
        self.phase = 0.0;
    }

    /// Generate the sample at the current phase, then advance
    ///
    /// The wrap subtracts a single cycle, which is exact as long as
    /// `frequency / sample_rate < 1`.
    #[inline]
    pub fn generate_sample(&mut self, sample_rate: f32) -> f32 {
        let sample = self.waveform.evaluate(self.phase);

        self.phase += self.frequency / sample_rate;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }

        sample
    }
}
