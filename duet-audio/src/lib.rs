//! Audio engine for Duet - a polyphonic dual-oscillator synthesizer
//!
//! This crate provides the whole render pipeline:
//! - Oscillator / DualOscVoice: two detunable, mixable oscillators per note
//! - VoicePool: one voice per MIDI note, swept when released
//! - Effects: shared lowpass filter, then chorus, delay and reverb
//! - Limiter: polyphony gain compensation and soft limiting
//! - Engine: lock-free command queue between control and audio threads

pub mod config;
pub mod effects;
mod engine;
mod limiter;
mod oscillator;
mod params;
mod pool;
mod scope;
mod voice;

pub use config::{ConfigError, SynthConfig};
pub use effects::{
    ChorusEffect, DelayEffect, DelayLine, Effect, EffectKind, EffectsChain, LowpassFilter,
    ReverbEffect,
};
pub use engine::{create_engine, ControlError, EngineEvent, SynthCommand, SynthController, SynthEngine};
pub use limiter::{soft_limit, total_gain, LIMIT_THRESHOLD, MASTER_GAIN};
pub use oscillator::{midi_note_to_frequency, Oscillator, Waveform};
pub use params::{AtomicF32, SharedParams};
pub use pool::{VoicePool, VoiceState};
pub use scope::{Oscilloscope, SCOPE_SAMPLES_SIZE};
pub use voice::{cents_to_ratio, DualOscVoice, VoiceSettings, DETUNE_RANGE_CENTS};
