//! Synth engine - voice pool, shared filter and effects chain
//!
//! The engine is split in two halves:
//! - `SynthEngine` lives on the audio callback. It owns every piece of DSP
//!   state and renders one block per call.
//! - `SynthController` lives on the control side. It pushes commands into a
//!   single-producer/single-consumer queue and writes continuous controls
//!   into atomic cells.
//!
//! The renderer drains the queue only at block boundaries, then rebuilds the
//! effects chain, so structural changes are never visible mid-block. Nothing
//! on the render path locks, allocates or logs.

use crate::config::SynthConfig;
use crate::effects::{
    ChorusEffect, DelayEffect, Effect, EffectKind, EffectsChain, LowpassFilter, ReverbEffect,
};
use crate::limiter::{soft_limit, total_gain};
use crate::oscillator::{midi_note_to_frequency, Waveform};
use crate::params::SharedParams;
use crate::pool::VoicePool;
use crate::scope::Oscilloscope;
use crate::voice::{VoiceSettings, DETUNE_RANGE_CENTS};
use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;
use ringbuf::traits::{Consumer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};
use std::sync::Arc;
use thiserror::Error;

/// Default sample rate until `prepare_to_play` is called
const DEFAULT_SAMPLE_RATE: f32 = 44100.0;

/// Commands sent to the render side
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SynthCommand {
    NoteOn { note: i32, velocity: f32 },
    NoteOff { note: i32 },
    /// Release every held note
    AllNotesOff,
    SetOsc1Waveform(Waveform),
    SetOsc2Waveform(Waveform),
    /// Detune in cents (-100 to +100)
    SetDetune(f32),
    /// Oscillator mix (0.0 = osc1, 1.0 = osc2)
    SetOscMix(f32),
    EnableChorus(bool),
    EnableDelay(bool),
    /// Engine-level reverb switch (reverb also needs a non-zero wet level)
    EnableReverb(bool),
    /// Effect-local parameter id, see the `PARAM_*` constants on each effect
    SetEffectParameter { effect: EffectKind, id: u32, value: f32 },
    /// Clear the shared filter's state
    ResetFilter,
}

/// Notifications sent from the render side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineEvent {
    /// A released note was swept from the voice pool
    NoteRemoved { note: i32 },
    /// A note-on was ignored because every voice slot is taken
    NoteDropped { note: i32 },
    /// The set of running effects changed
    EffectsChanged { chorus: bool, delay: bool, reverb: bool },
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ControlError {
    #[error("Command queue is full")]
    QueueFull,
}

/// Create a connected controller/engine pair
pub fn create_engine(config: &SynthConfig) -> (SynthController, SynthEngine) {
    let config = config.clone().validated();

    let (command_tx, command_rx) = HeapRb::<SynthCommand>::new(config.command_capacity).split();
    let (event_tx, event_rx) = bounded(config.event_capacity);
    let params = Arc::new(SharedParams::new(config.cutoff, config.resonance));
    let scope = Arc::new(Oscilloscope::new(config.scope_size));

    let controller = SynthController {
        commands: Arc::new(Mutex::new(command_tx)),
        events: event_rx,
        params: params.clone(),
        scope: scope.clone(),
    };
    let engine = SynthEngine::new(&config, command_rx, event_tx, params, scope);

    (controller, engine)
}

/// Render-side engine state (held by the audio callback)
pub struct SynthEngine {
    pool: VoicePool,
    /// One filter for the whole mix, not per voice
    filter: LowpassFilter,
    chorus: ChorusEffect,
    delay: DelayEffect,
    reverb: ReverbEffect,
    reverb_enabled: bool,
    chain: EffectsChain,
    /// Defaults applied to every note-on
    settings: VoiceSettings,
    sample_rate: f32,
    block_size: usize,
    block_gain: f32,
    commands: HeapCons<SynthCommand>,
    events: Sender<EngineEvent>,
    params: Arc<SharedParams>,
    scope: Arc<Oscilloscope>,
}

impl SynthEngine {
    fn new(
        config: &SynthConfig,
        commands: HeapCons<SynthCommand>,
        events: Sender<EngineEvent>,
        params: Arc<SharedParams>,
        scope: Arc<Oscilloscope>,
    ) -> Self {
        let mut filter = LowpassFilter::new(DEFAULT_SAMPLE_RATE);
        filter.set_cutoff(config.cutoff);
        filter.set_resonance(config.resonance);

        let mut settings = config.voice;
        settings.detune = settings.detune.clamp(-DETUNE_RANGE_CENTS, DETUNE_RANGE_CENTS);
        settings.mix = settings.mix.clamp(0.0, 1.0);

        let mut engine = Self {
            pool: VoicePool::new(config.max_voices),
            filter,
            chorus: ChorusEffect::new(DEFAULT_SAMPLE_RATE),
            delay: DelayEffect::new(DEFAULT_SAMPLE_RATE),
            reverb: ReverbEffect::new(),
            reverb_enabled: false,
            chain: EffectsChain::new(),
            settings,
            sample_rate: DEFAULT_SAMPLE_RATE,
            block_size: 0,
            block_gain: 0.0,
            commands,
            events,
            params,
            scope,
        };
        engine.rebuild_chain();
        engine
    }

    /// Adopt a new sample rate and block size before rendering
    ///
    /// Reallocates every effect buffer, so call it from the setup thread,
    /// never from inside the audio callback.
    pub fn prepare_to_play(&mut self, block_size: usize, sample_rate: f32) {
        let sample_rate = if sample_rate.is_finite() && sample_rate > 0.0 {
            sample_rate
        } else {
            tracing::warn!("Invalid sample rate {}, keeping {}", sample_rate, self.sample_rate);
            self.sample_rate
        };

        self.sample_rate = sample_rate;
        self.block_size = block_size;
        self.filter.set_sample_rate(sample_rate);
        for kind in EffectKind::ORDER {
            let effect = self.effect_mut(kind);
            effect.set_sample_rate(sample_rate);
            tracing::debug!("{} buffers sized for {} Hz", effect.name(), sample_rate);
        }

        tracing::info!("Prepared to play: {} samples at {} Hz", block_size, sample_rate);
    }

    /// Drop every voice (the host stopped the stream)
    pub fn release_resources(&mut self) {
        self.pool.clear();
        tracing::info!("Audio resources released");
    }

    /// Apply a command immediately
    ///
    /// Queued commands go through here at the start of each block; hosts that
    /// own the engine on a single thread may call it directly.
    pub fn handle_command(&mut self, cmd: SynthCommand) {
        match cmd {
            SynthCommand::NoteOn { note, velocity } => {
                if !self.pool.note_on(note, velocity, &self.settings) {
                    self.notify(EngineEvent::NoteDropped { note });
                }
            }
            SynthCommand::NoteOff { note } => {
                self.pool.note_off(note);
            }
            SynthCommand::AllNotesOff => self.pool.note_off_all(),

            SynthCommand::SetOsc1Waveform(waveform) => {
                self.settings.osc1_waveform = waveform;
                self.pool.for_each_voice(|v| v.set_osc1_waveform(waveform));
            }
            SynthCommand::SetOsc2Waveform(waveform) => {
                self.settings.osc2_waveform = waveform;
                self.pool.for_each_voice(|v| v.set_osc2_waveform(waveform));
            }
            SynthCommand::SetDetune(cents) if cents.is_finite() => {
                let cents = cents.clamp(-DETUNE_RANGE_CENTS, DETUNE_RANGE_CENTS);
                self.settings.detune = cents;
                self.pool.for_each_voice(|v| v.set_detune(cents));
            }
            SynthCommand::SetOscMix(mix) if mix.is_finite() => {
                let mix = mix.clamp(0.0, 1.0);
                self.settings.mix = mix;
                self.pool.for_each_voice(|v| v.set_mix(mix));
            }
            SynthCommand::SetDetune(_) | SynthCommand::SetOscMix(_) => {}

            SynthCommand::EnableChorus(enabled) => self.chorus.set_enabled(enabled),
            SynthCommand::EnableDelay(enabled) => self.delay.set_enabled(enabled),
            SynthCommand::EnableReverb(enabled) => {
                self.reverb_enabled = enabled;
                if enabled {
                    // Don't resume a stale tail
                    self.reverb.reset();
                }
            }
            SynthCommand::SetEffectParameter { effect, id, value } => {
                self.effect_mut(effect).set_parameter(id, value);
            }
            SynthCommand::ResetFilter => self.filter.reset(),
        }
    }

    fn effect_mut(&mut self, kind: EffectKind) -> &mut dyn Effect {
        match kind {
            EffectKind::Chorus => &mut self.chorus,
            EffectKind::Delay => &mut self.delay,
            EffectKind::Reverb => &mut self.reverb,
        }
    }

    fn effect_is_active(&self, kind: EffectKind) -> bool {
        match kind {
            EffectKind::Chorus => self.chorus.is_active(),
            EffectKind::Delay => self.delay.is_active(),
            EffectKind::Reverb => self.reverb_enabled && self.reverb.is_active(),
        }
    }

    /// Recompute the running effects from their live activity
    fn rebuild_chain(&mut self) {
        let active = EffectKind::ORDER.map(|kind| self.effect_is_active(kind));
        let previous = self.chain;
        self.chain.rebuild(|kind| active[kind as usize]);

        if self.chain != previous {
            self.notify(EngineEvent::EffectsChanged {
                chorus: active[EffectKind::Chorus as usize],
                delay: active[EffectKind::Delay as usize],
                reverb: active[EffectKind::Reverb as usize],
            });
        }
    }

    #[inline]
    fn notify(&self, event: EngineEvent) {
        // Dropped if nobody is draining events
        let _ = self.events.try_send(event);
    }

    /// Block boundary: apply queued commands and continuous controls
    fn begin_block(&mut self) {
        while let Some(cmd) = self.commands.try_pop() {
            self.handle_command(cmd);
        }

        self.filter.set_cutoff(self.params.cutoff.load());
        self.filter.set_resonance(self.params.resonance.load());

        self.rebuild_chain();
    }

    /// Block boundary: free released voices
    fn end_block(&mut self) {
        let events = &self.events;
        self.pool.sweep(|note| {
            let _ = events.try_send(EngineEvent::NoteRemoved { note });
        });
    }

    #[inline]
    fn process_chain(&mut self, mut sample: f32) -> f32 {
        let chain = self.chain;
        for kind in chain.iter() {
            sample = self.effect_mut(kind).process_sample(sample);
        }
        sample
    }

    /// Render `frames` mono samples, handing each to `write`
    ///
    /// `write` must leave slots untouched when the block is silent; callers
    /// zero their buffers first.
    fn render(&mut self, frames: usize, mut write: impl FnMut(usize, f32)) {
        self.begin_block();

        let active = self.pool.active_count();
        let scope_enabled = self.scope.is_enabled();

        if active == 0 {
            self.block_gain = 0.0;
            if scope_enabled {
                for _ in 0..frames {
                    self.scope.push(0.0);
                }
            }
            self.end_block();
            return;
        }

        // Fixed for the whole block
        let gain = total_gain(active);
        self.block_gain = gain;

        for frame in 0..frames {
            let mut sample = self.pool.next_sample(self.sample_rate) * gain;
            sample = self.filter.process_sample(sample);
            sample = self.process_chain(sample);
            sample = soft_limit(sample);

            write(frame, sample);
            if scope_enabled {
                self.scope.push(sample);
            }
        }

        self.end_block();
    }

    /// Render into planar channel buffers; every channel gets the same signal
    pub fn render_block(&mut self, outputs: &mut [&mut [f32]], frames: usize) {
        for channel in outputs.iter_mut() {
            let len = frames.min(channel.len());
            channel[..len].fill(0.0);
        }

        self.render(frames, |frame, sample| {
            for channel in outputs.iter_mut() {
                if let Some(slot) = channel.get_mut(frame) {
                    *slot = sample;
                }
            }
        });
    }

    /// Render into an interleaved buffer with `channels` samples per frame
    pub fn render_interleaved(&mut self, output: &mut [f32], channels: usize) {
        let channels = channels.max(1);
        let frames = output.len() / channels;
        output.fill(0.0);

        self.render(frames, |frame, sample| {
            let start = frame * channels;
            output[start..start + channels].fill(sample);
        });
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Block size hint from the last `prepare_to_play`
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Gain applied to the voice sum in the last rendered block
    pub fn block_gain(&self) -> f32 {
        self.block_gain
    }

    pub fn settings(&self) -> &VoiceSettings {
        &self.settings
    }

    pub fn pool(&self) -> &VoicePool {
        &self.pool
    }

    pub fn chain(&self) -> &EffectsChain {
        &self.chain
    }

    pub fn filter(&self) -> &LowpassFilter {
        &self.filter
    }

    pub fn chorus(&self) -> &ChorusEffect {
        &self.chorus
    }

    pub fn delay(&self) -> &DelayEffect {
        &self.delay
    }

    pub fn reverb(&self) -> &ReverbEffect {
        &self.reverb
    }

    pub fn reverb_enabled(&self) -> bool {
        self.reverb_enabled
    }
}

/// Handle to control the engine from any non-audio thread
#[derive(Clone)]
pub struct SynthController {
    commands: Arc<Mutex<HeapProd<SynthCommand>>>,
    events: Receiver<EngineEvent>,
    params: Arc<SharedParams>,
    scope: Arc<Oscilloscope>,
}

impl SynthController {
    /// Queue a command for the next block boundary
    pub fn send(&self, cmd: SynthCommand) -> Result<(), ControlError> {
        self.commands.lock().try_push(cmd).map_err(|_| {
            tracing::warn!("Command queue full, dropping {:?}", cmd);
            ControlError::QueueFull
        })
    }

    pub fn note_on(&self, note: i32, velocity: f32) -> Result<(), ControlError> {
        tracing::debug!(
            "Note ON: {} (freq: {:.2} Hz)",
            note,
            midi_note_to_frequency(note)
        );
        self.send(SynthCommand::NoteOn { note, velocity })
    }

    pub fn note_off(&self, note: i32) -> Result<(), ControlError> {
        tracing::debug!("Note OFF: {}", note);
        self.send(SynthCommand::NoteOff { note })
    }

    pub fn all_notes_off(&self) -> Result<(), ControlError> {
        self.send(SynthCommand::AllNotesOff)
    }

    pub fn set_osc1_waveform(&self, waveform: Waveform) -> Result<(), ControlError> {
        self.send(SynthCommand::SetOsc1Waveform(waveform))
    }

    pub fn set_osc2_waveform(&self, waveform: Waveform) -> Result<(), ControlError> {
        self.send(SynthCommand::SetOsc2Waveform(waveform))
    }

    pub fn set_detune(&self, cents: f32) -> Result<(), ControlError> {
        self.send(SynthCommand::SetDetune(cents))
    }

    pub fn set_osc_mix(&self, mix: f32) -> Result<(), ControlError> {
        self.send(SynthCommand::SetOscMix(mix))
    }

    /// Set filter cutoff in Hz; picked up at the next block
    pub fn set_cutoff(&self, hz: f32) {
        if !hz.is_finite() {
            tracing::warn!("Ignoring non-finite cutoff {}", hz);
            return;
        }
        self.params.cutoff.store(hz);
    }

    /// Set filter resonance; picked up at the next block
    pub fn set_resonance(&self, resonance: f32) {
        if !resonance.is_finite() {
            tracing::warn!("Ignoring non-finite resonance {}", resonance);
            return;
        }
        self.params.resonance.store(resonance);
    }

    pub fn reset_filter(&self) -> Result<(), ControlError> {
        self.send(SynthCommand::ResetFilter)
    }

    pub fn set_effect_parameter(
        &self,
        effect: EffectKind,
        id: u32,
        value: f32,
    ) -> Result<(), ControlError> {
        self.send(SynthCommand::SetEffectParameter { effect, id, value })
    }

    // Chorus

    pub fn enable_chorus(&self, enabled: bool) -> Result<(), ControlError> {
        tracing::debug!("Chorus {}", if enabled { "enabled" } else { "disabled" });
        self.send(SynthCommand::EnableChorus(enabled))
    }

    pub fn set_chorus_rate(&self, hz: f32) -> Result<(), ControlError> {
        self.set_effect_parameter(EffectKind::Chorus, ChorusEffect::PARAM_RATE, hz)
    }

    pub fn set_chorus_depth(&self, depth: f32) -> Result<(), ControlError> {
        self.set_effect_parameter(EffectKind::Chorus, ChorusEffect::PARAM_DEPTH, depth)
    }

    pub fn set_chorus_voices(&self, voices: usize) -> Result<(), ControlError> {
        self.set_effect_parameter(EffectKind::Chorus, ChorusEffect::PARAM_VOICES, voices as f32)
    }

    pub fn set_chorus_feedback(&self, feedback: f32) -> Result<(), ControlError> {
        self.set_effect_parameter(EffectKind::Chorus, ChorusEffect::PARAM_FEEDBACK, feedback)
    }

    pub fn set_chorus_wet_level(&self, wet: f32) -> Result<(), ControlError> {
        self.set_effect_parameter(EffectKind::Chorus, ChorusEffect::PARAM_WET, wet)
    }

    pub fn set_chorus_dry_level(&self, dry: f32) -> Result<(), ControlError> {
        self.set_effect_parameter(EffectKind::Chorus, ChorusEffect::PARAM_DRY, dry)
    }

    // Delay

    pub fn enable_delay(&self, enabled: bool) -> Result<(), ControlError> {
        tracing::debug!("Delay {}", if enabled { "enabled" } else { "disabled" });
        self.send(SynthCommand::EnableDelay(enabled))
    }

    pub fn set_delay_time(&self, seconds: f32) -> Result<(), ControlError> {
        self.set_effect_parameter(EffectKind::Delay, DelayEffect::PARAM_TIME, seconds)
    }

    pub fn set_delay_feedback(&self, feedback: f32) -> Result<(), ControlError> {
        self.set_effect_parameter(EffectKind::Delay, DelayEffect::PARAM_FEEDBACK, feedback)
    }

    pub fn set_delay_wet_level(&self, wet: f32) -> Result<(), ControlError> {
        self.set_effect_parameter(EffectKind::Delay, DelayEffect::PARAM_WET, wet)
    }

    pub fn set_delay_dry_level(&self, dry: f32) -> Result<(), ControlError> {
        self.set_effect_parameter(EffectKind::Delay, DelayEffect::PARAM_DRY, dry)
    }

    // Reverb

    pub fn enable_reverb(&self, enabled: bool) -> Result<(), ControlError> {
        tracing::debug!("Reverb {}", if enabled { "enabled" } else { "disabled" });
        self.send(SynthCommand::EnableReverb(enabled))
    }

    /// Set a reverb parameter by id (0 room size, 1 damping, 2 wet, 3 dry)
    pub fn set_reverb_parameter(&self, id: u32, value: f32) -> Result<(), ControlError> {
        self.set_effect_parameter(EffectKind::Reverb, id, value)
    }

    pub fn set_reverb_room_size(&self, room_size: f32) -> Result<(), ControlError> {
        self.set_reverb_parameter(ReverbEffect::PARAM_ROOM_SIZE, room_size)
    }

    pub fn set_reverb_damping(&self, damping: f32) -> Result<(), ControlError> {
        self.set_reverb_parameter(ReverbEffect::PARAM_DAMPING, damping)
    }

    pub fn set_reverb_wet_level(&self, wet: f32) -> Result<(), ControlError> {
        self.set_reverb_parameter(ReverbEffect::PARAM_WET, wet)
    }

    pub fn set_reverb_dry_level(&self, dry: f32) -> Result<(), ControlError> {
        self.set_reverb_parameter(ReverbEffect::PARAM_DRY, dry)
    }

    // Oscilloscope

    pub fn enable_oscilloscope(&self, enabled: bool) {
        self.scope.set_enabled(enabled);
        if !enabled {
            self.scope.clear();
        }
        tracing::debug!("Oscilloscope {}", if enabled { "enabled" } else { "disabled" });
    }

    /// Copy recent output samples (oldest first); returns how many were copied
    pub fn waveform_data(&self, out: &mut [f32]) -> usize {
        self.scope.read_into(out)
    }

    // Events

    pub fn try_recv_event(&self) -> Option<EngineEvent> {
        self.events.try_recv().ok()
    }

    pub fn events(&self) -> &Receiver<EngineEvent> {
        &self.events
    }
}
