use crate::acf::{loudest_detection, Detection};
use crate::common::NOTE_COUNT;
use crate::notes::config::TrackerConfig;
use crate::notes::event::NoteTransition;

/// Room for releasing every note plus a note-off and a note-on.
const MAX_TRANSITIONS_PER_BLOCK: usize = NOTE_COUNT + 2;

/// Maps a block RMS level to a note-on velocity between 0 and 1,
/// in steps of 1/127 and no lower than `min_velocity / 127`. The result is
/// never below 1/127, matching the lowest MIDI note-on velocity.
pub fn velocity_from_rms(rms: f32, min_velocity: u8) -> f32 {
    let max = (NOTE_COUNT - 1) as f32;
    let min = (min_velocity.max(1) as f32).min(max);
    let level = if rms.is_finite() { rms.max(0.0) } else { 0.0 };
    (level * max).round().clamp(min, max) / max
}

/// Turns a stream of per block pitch detections into debounced,
/// monophonic note-on and note-off transitions.
///
/// * A pitch must be held for longer than the minimum hold time before its note-on.
/// * A change of pitch releases the previous note.
/// * Silence longer than the decay time releases the active note.
/// * Notes sounding for longer than the maximum note length are released.
///
/// Note-offs are only emitted for notes whose note-on was actually emitted.
pub struct NoteTracker {
    config: TrackerConfig,
    active_note: Option<u8>,
    /// The sample at which the active note was first detected.
    active_note_start: i64,
    silence_run: i64,
    /// True if a note-on has been emitted for the note since it became active.
    requested: [bool; NOTE_COUNT],
    /// True if a note-on has been emitted for the note without a matching note-off.
    pending: [bool; NOTE_COUNT],
    note_on_timestamps: [i64; NOTE_COUNT],
    transitions: Vec<NoteTransition>,
}

impl Default for NoteTracker {
    fn default() -> Self {
        NoteTracker::new(TrackerConfig::default())
    }
}

impl NoteTracker {
    pub fn new(config: TrackerConfig) -> Self {
        NoteTracker {
            config,
            active_note: None,
            active_note_start: 0,
            silence_run: 0,
            requested: [false; NOTE_COUNT],
            pending: [false; NOTE_COUNT],
            note_on_timestamps: [0; NOTE_COUNT],
            transitions: Vec::with_capacity(MAX_TRANSITIONS_PER_BLOCK),
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Updates the timing rules. Takes effect from the next block.
    pub fn set_config(&mut self, config: TrackerConfig) {
        self.config = config;
    }

    /// The most recently detected note, if any. Its note-on may not have
    /// been emitted yet.
    pub fn active_note(&self) -> Option<u8> {
        self.active_note
    }

    /// Returns true if a note-on for `note` has been emitted without a matching note-off.
    pub fn is_sounding(&self, note: u8) -> bool {
        self.pending.get(note as usize).copied().unwrap_or(false)
    }

    /// Forgets all state without emitting anything.
    pub fn reset(&mut self) {
        self.clear_state();
        self.transitions.clear();
    }

    /// Emits note-offs at `sample_offset` for all sounding notes, then
    /// forgets all state.
    pub fn release_all(&mut self, sample_offset: usize) -> &[NoteTransition] {
        self.transitions.clear();
        for note in 0..NOTE_COUNT {
            if self.pending[note] {
                self.push(NoteTransition::note_off(note as u8, sample_offset));
            }
        }
        self.clear_state();
        &self.transitions
    }

    fn clear_state(&mut self) {
        self.active_note = None;
        self.active_note_start = 0;
        self.silence_run = 0;
        self.requested = [false; NOTE_COUNT];
        self.pending = [false; NOTE_COUNT];
        self.note_on_timestamps = [0; NOTE_COUNT];
    }

    /// Advances the tracker by one block.
    ///
    /// `detections` are the detections of the block (the loudest one is used),
    /// `block_start` is the index of the first sample of the block since
    /// processing started, and `rms` is the RMS level of the block, used for
    /// note-on velocities. Returns the transitions of the block, ordered by
    /// sample offset with note-offs before note-ons at equal offsets.
    pub fn process_block(
        &mut self,
        detections: &[Detection],
        block_start: i64,
        block_len: usize,
        rms: f32,
    ) -> &[NoteTransition] {
        self.transitions.clear();
        let block_end = block_start + block_len as i64;

        match loudest_detection(detections) {
            None => {
                self.expire_notes(block_start, block_end);
                self.on_silence(block_len);
            }
            Some(detection) => {
                let offset = detection.sample_offset.min(block_len.saturating_sub(1));
                let now = block_start + offset as i64;
                self.expire_notes(block_start, now + 1);
                self.on_pitch(detection.midi_note(), offset, now, rms);
            }
        }

        self.expire_notes(block_start, block_end);

        self.transitions
            .sort_unstable_by_key(|transition| (transition.sample_offset, transition.is_onset));
        &self.transitions
    }

    fn on_silence(&mut self, block_len: usize) {
        self.silence_run = self.silence_run.saturating_add(block_len as i64);
        if self.silence_run <= self.config.silence_threshold() {
            return;
        }
        if let Some(note) = self.active_note.take() {
            let index = note as usize;
            if self.pending[index] {
                self.pending[index] = false;
                self.push(NoteTransition::note_off(note, block_len.saturating_sub(1)));
            }
            self.requested[index] = false;
        }
    }

    fn on_pitch(&mut self, note: u8, offset: usize, now: i64, rms: f32) {
        self.silence_run = 0;
        let index = note as usize;

        match self.active_note {
            None => {
                self.active_note_start = now;
            }
            Some(active) if active != note => {
                let active_index = active as usize;
                if self.pending[active_index] {
                    self.pending[active_index] = false;
                    self.push(NoteTransition::note_off(active, offset));
                }
                self.requested[active_index] = false;
                self.active_note_start = now;
            }
            Some(_) => {
                let held = now - self.active_note_start;
                if held > self.config.min_hold_samples && !self.requested[index] {
                    let velocity = velocity_from_rms(rms, self.config.min_velocity);
                    self.requested[index] = true;
                    self.pending[index] = true;
                    self.note_on_timestamps[index] = now;
                    self.push(NoteTransition::note_on(note, velocity, offset));
                }
            }
        }

        self.active_note = Some(note);
    }

    /// Releases sounding notes whose maximum length ends before the sample `limit`.
    /// The notes stay requested, so a sustained pitch does not re-trigger.
    fn expire_notes(&mut self, block_start: i64, limit: i64) {
        let max_length = self.config.max_note_length_samples;
        if max_length <= 0 {
            return;
        }
        for note in 0..NOTE_COUNT {
            if !self.pending[note] {
                continue;
            }
            let deadline = self.note_on_timestamps[note].saturating_add(max_length);
            if deadline < limit {
                self.pending[note] = false;
                let offset = (deadline - block_start).max(0) as usize;
                self.push(NoteTransition::note_off(note as u8, offset));
            }
        }
    }

    fn push(&mut self, transition: NoteTransition) {
        // Never grow on the audio thread.
        if self.transitions.len() < self.transitions.capacity() {
            self.transitions.push(transition);
        }
    }
}
