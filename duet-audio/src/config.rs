//! Engine configuration
//!
//! Stored as a simple `key = value` text file. Unknown keys are ignored so
//! older and newer builds can share a file.

use crate::oscillator::Waveform;
use crate::scope::SCOPE_SAMPLES_SIZE;
use crate::voice::VoiceSettings;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Invalid value for '{key}': {value}")]
    InvalidValue { key: String, value: String },
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq)]
pub struct SynthConfig {
    /// Control -> render command queue slots
    pub command_capacity: usize,
    /// Render -> control event channel slots
    pub event_capacity: usize,
    /// Samples kept by the oscilloscope tap
    pub scope_size: usize,
    /// Maximum simultaneous notes
    pub max_voices: usize,
    /// Initial oscillator settings for new voices
    pub voice: VoiceSettings,
    /// Initial filter cutoff in Hz
    pub cutoff: f32,
    /// Initial filter resonance
    pub resonance: f32,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            command_capacity: 1024,
            event_capacity: 256,
            scope_size: SCOPE_SAMPLES_SIZE,
            max_voices: 128,
            voice: VoiceSettings::default(),
            cutoff: 1000.0,
            resonance: 1.0,
        }
    }
}

impl SynthConfig {
    /// Load config from the default location
    ///
    /// Returns the default config if the file is missing or can't be parsed.
    pub fn load() -> Self {
        let path = Self::config_path();
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(ConfigError::Io(e)) if e.kind() == io::ErrorKind::NotFound => Self::default(),
            Err(e) => {
                tracing::warn!("Ignoring config at {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Load config from a specific path
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    /// Save config to a specific path
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.serialize())?;
        Ok(())
    }

    /// Get the default config file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("duet")
            .join("config.txt")
    }

    /// Parse config from `key = value` lines
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let key = key.trim();
            let value = value.trim();

            match key {
                "command_capacity" => config.command_capacity = parse_value(key, value)?,
                "event_capacity" => config.event_capacity = parse_value(key, value)?,
                "scope_size" => config.scope_size = parse_value(key, value)?,
                "max_voices" => config.max_voices = parse_value(key, value)?,
                "osc1_waveform" => config.voice.osc1_waveform = parse_value(key, value)?,
                "osc2_waveform" => config.voice.osc2_waveform = parse_value(key, value)?,
                "detune" => config.voice.detune = parse_value(key, value)?,
                "osc_mix" => config.voice.mix = parse_value(key, value)?,
                "cutoff" => config.cutoff = parse_value(key, value)?,
                "resonance" => config.resonance = parse_value(key, value)?,
                _ => {} // Ignore unknown keys
            }
        }

        Ok(config.validated())
    }

    /// Serialize config to `key = value` lines
    pub fn serialize(&self) -> String {
        format!(
            "# Duet synth configuration\n\
             command_capacity = {}\n\
             event_capacity = {}\n\
             scope_size = {}\n\
             max_voices = {}\n\
             osc1_waveform = {}\n\
             osc2_waveform = {}\n\
             detune = {}\n\
             osc_mix = {}\n\
             cutoff = {}\n\
             resonance = {}\n",
            self.command_capacity,
            self.event_capacity,
            self.scope_size,
            self.max_voices,
            self.voice.osc1_waveform,
            self.voice.osc2_waveform,
            self.voice.detune,
            self.voice.mix,
            self.cutoff,
            self.resonance,
        )
    }

    /// Keep capacities usable and replace non-finite numbers with defaults
    ///
    /// Ranged values are clamped where they are applied.
    pub fn validated(mut self) -> Self {
        let defaults = Self::default();
        self.command_capacity = self.command_capacity.max(1);
        self.event_capacity = self.event_capacity.max(1);
        self.scope_size = self.scope_size.max(1);
        self.max_voices = self.max_voices.max(1);

        let finite_or = |value: f32, fallback: f32| {
            if value.is_finite() {
                value
            } else {
                fallback
            }
        };
        self.voice.detune = finite_or(self.voice.detune, defaults.voice.detune);
        self.voice.mix = finite_or(self.voice.mix, defaults.voice.mix);
        self.cutoff = finite_or(self.cutoff, defaults.cutoff);
        self.resonance = finite_or(self.resonance, defaults.resonance);
        self
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}
