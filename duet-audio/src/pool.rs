//! Polyphonic voice pool
//!
//! A fixed set of preallocated slots, each keyed by a note identifier.
//! Slots move Idle -> Sounding on note-on, Sounding -> PendingRemoval on
//! note-off, and PendingRemoval -> Idle when the engine sweeps the pool at
//! the end of a block. Nothing here allocates after construction.

use crate::oscillator::midi_note_to_frequency;
use crate::voice::{DualOscVoice, VoiceSettings};

/// Lifecycle of a pool slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VoiceState {
    /// Free slot
    #[default]
    Idle,
    /// Note is held and generating audio
    Sounding,
    /// Note released; silent, removed at the next block boundary
    PendingRemoval,
}

#[derive(Debug, Clone, Default)]
struct VoiceSlot {
    note: i32,
    state: VoiceState,
    voice: DualOscVoice,
}

/// Voice pool with at most one voice per note
pub struct VoicePool {
    slots: Box<[VoiceSlot]>,
}

impl VoicePool {
    /// Create a pool holding up to `capacity` simultaneous notes
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![VoiceSlot::default(); capacity.max(1)].into_boxed_slice(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    fn find(&self, note: i32) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| slot.state != VoiceState::Idle && slot.note == note)
    }

    /// Start (or restart) `note`
    ///
    /// A held or pending note is retriggered in place. Returns `false` when
    /// the note is new and every slot is in use.
    pub fn note_on(&mut self, note: i32, velocity: f32, settings: &VoiceSettings) -> bool {
        let index = match self.find(note) {
            Some(index) => index,
            None => match self.slots.iter().position(|s| s.state == VoiceState::Idle) {
                Some(index) => index,
                None => return false,
            },
        };

        let slot = &mut self.slots[index];
        slot.note = note;
        slot.state = VoiceState::Sounding;
        slot.voice.apply_settings(settings);
        slot.voice.note_on(midi_note_to_frequency(note), velocity);
        true
    }

    /// Release `note`; unknown notes are ignored
    pub fn note_off(&mut self, note: i32) -> bool {
        match self.find(note) {
            Some(index) => {
                let slot = &mut self.slots[index];
                slot.voice.note_off();
                slot.state = VoiceState::PendingRemoval;
                true
            }
            None => false,
        }
    }

    /// Release every held note
    pub fn note_off_all(&mut self) {
        for slot in self.slots.iter_mut().filter(|s| s.state == VoiceState::Sounding) {
            slot.voice.note_off();
            slot.state = VoiceState::PendingRemoval;
        }
    }

    /// Drop every entry immediately
    pub fn clear(&mut self) {
        for slot in self.slots.iter_mut() {
            slot.voice.note_off();
            slot.state = VoiceState::Idle;
        }
    }

    pub fn state(&self, note: i32) -> VoiceState {
        self.find(note)
            .map(|index| self.slots[index].state)
            .unwrap_or(VoiceState::Idle)
    }

    pub fn contains(&self, note: i32) -> bool {
        self.find(note).is_some()
    }

    /// Number of pool entries, sounding or pending removal
    pub fn len(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| s.state != VoiceState::Idle)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of voices currently generating audio
    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|s| s.voice.is_active()).count()
    }

    /// Apply `f` to every voice still in the pool
    pub fn for_each_voice(&mut self, mut f: impl FnMut(&mut DualOscVoice)) {
        for slot in self.slots.iter_mut().filter(|s| s.state != VoiceState::Idle) {
            f(&mut slot.voice);
        }
    }

    /// Sum one sample from every entry (released entries contribute silence)
    #[inline]
    pub fn next_sample(&mut self, sample_rate: f32) -> f32 {
        self.slots
            .iter_mut()
            .filter(|s| s.state != VoiceState::Idle)
            .map(|s| s.voice.generate_sample(sample_rate))
            .sum()
    }

    /// Free every inactive entry, calling `on_removed` with its note
    pub fn sweep(&mut self, mut on_removed: impl FnMut(i32)) {
        for slot in self.slots.iter_mut() {
            if slot.state != VoiceState::Idle && !slot.voice.is_active() {
                slot.state = VoiceState::Idle;
                on_removed(slot.note);
            }
        }
    }
}
