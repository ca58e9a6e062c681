//! Duet - dual-oscillator synth demo host
//!
//! Opens the default output device, moves the render engine into the audio
//! callback and plays a short phrase from the control thread, touching the
//! oscillator, filter and effect controls along the way.
//!
//! `duet --write-config` saves the current (or default) config and exits.

use std::thread;
use std::time::Duration;

use anyhow::Context;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tracing_subscriber::EnvFilter;

use duet_audio::{create_engine, EffectKind, EngineEvent, SynthConfig, SynthController, Waveform};

/// Block size hint until the device reports its own
const BLOCK_SIZE_HINT: usize = 512;

/// Samples pulled from the oscilloscope per poll
const SCOPE_READ: usize = 256;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = SynthConfig::load();

    if std::env::args().any(|arg| arg == "--write-config") {
        config.save()?;
        tracing::info!("Config written to {}", SynthConfig::config_path().display());
        return Ok(());
    }

    let (controller, mut engine) = create_engine(&config);

    // Get audio host and device
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .context("No audio output device found")?;
    let stream_config = device
        .default_output_config()
        .context("Failed to get audio config")?;

    let sample_rate = stream_config.sample_rate().0 as f32;
    let channels = stream_config.channels() as usize;
    tracing::info!(
        "Output: {} ({} ch, {} Hz)",
        device.name().unwrap_or_else(|_| "unknown".into()),
        channels,
        sample_rate
    );

    engine.prepare_to_play(BLOCK_SIZE_HINT, sample_rate);

    let stream = device
        .build_output_stream(
            &stream_config.into(),
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                engine.render_interleaved(data, channels);
            },
            |err| {
                tracing::error!("Audio stream error: {}", err);
            },
            None,
        )
        .context("Failed to create audio stream")?;

    stream.play().context("Failed to start audio")?;

    controller.enable_oscilloscope(true);
    play_demo(&controller)?;

    // Silent blocks skip the effects, so releasing everything cuts any tail;
    // the pause only collects the last voice-freed events
    controller.all_notes_off()?;
    pause(&controller, 400);

    drop(stream);
    tracing::info!("Stopped");
    Ok(())
}

fn play_demo(controller: &SynthController) -> anyhow::Result<()> {
    controller.set_osc1_waveform(Waveform::Saw)?;
    controller.set_osc2_waveform(Waveform::Square)?;
    controller.set_detune(7.0)?;
    controller.set_osc_mix(0.4)?;
    controller.set_cutoff(1800.0);
    controller.set_resonance(2.0);

    // Plain arpeggio with the default delay
    for note in [60, 64, 67, 72] {
        controller.note_on(note, 0.8)?;
        pause(controller, 180);
        controller.note_off(note)?;
        pause(controller, 60);
    }

    // Chord through chorus and reverb, opening the filter as it sustains
    controller.enable_chorus(true)?;
    controller.set_chorus_voices(3)?;
    controller.enable_reverb(true)?;
    controller.set_reverb_room_size(0.8)?;
    controller.set_reverb_wet_level(0.35)?;
    controller.set_delay_time(0.375)?;
    controller.set_delay_feedback(0.4)?;

    for note in [48, 55, 60, 64] {
        controller.note_on(note, 0.7)?;
    }
    for step in 0..20 {
        controller.set_cutoff(400.0 + step as f32 * 300.0);
        pause(controller, 60);
    }
    for note in [48, 55, 60, 64] {
        controller.note_off(note)?;
    }
    pause(controller, 600);

    // Dry lead with wide detune
    controller.enable_chorus(false)?;
    controller.enable_delay(false)?;
    controller.enable_reverb(false)?;
    controller.set_osc2_waveform(Waveform::Triangle)?;
    controller.set_detune(-25.0)?;
    for note in [72, 71, 67, 64, 60] {
        controller.note_on(note, 0.9)?;
        pause(controller, 150);
        controller.note_off(note)?;
    }

    Ok(())
}

/// Sleep on the control thread while draining engine events
fn pause(controller: &SynthController, ms: u64) {
    thread::sleep(Duration::from_millis(ms));

    while let Some(event) = controller.try_recv_event() {
        match event {
            EngineEvent::NoteRemoved { note } => tracing::debug!("Voice freed: {}", note),
            EngineEvent::NoteDropped { note } => tracing::warn!("No free voice for note {}", note),
            EngineEvent::EffectsChanged {
                chorus,
                delay,
                reverb,
            } => {
                let running: Vec<&str> = EffectKind::ORDER
                    .into_iter()
                    .zip([chorus, delay, reverb])
                    .filter(|&(_, on)| on)
                    .map(|(kind, _)| kind.name())
                    .collect();
                if running.is_empty() {
                    tracing::info!("Effects chain: bypassed");
                } else {
                    tracing::info!("Effects chain: {}", running.join(" -> "));
                }
            }
        }
    }

    let mut scope = [0.0f32; SCOPE_READ];
    let count = controller.waveform_data(&mut scope);
    let peak = scope[..count].iter().fold(0.0f32, |peak, s| peak.max(s.abs()));
    tracing::debug!("Output peak: {:.3}", peak);
}
