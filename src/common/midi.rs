use core::fmt;

use micromath::F32Ext;

/// The number of MIDI note numbers.
pub const NOTE_COUNT: usize = 128;

/// Converts a frequency in Hz to a [MIDI](https://en.wikipedia.org/wiki/MIDI) note number (with a fractional part).
pub fn freq_to_midi_note(freq: f32) -> f32 {
    12.0 * F32Ext::log2(freq) - 36.376316562295926
}

/// Rounds a fractional MIDI note number to the nearest note, halfway
/// cases away from zero, clamped to `0..=127`.
pub fn round_midi_note(note_number: f32) -> u8 {
    if note_number.is_nan() {
        return 0;
    }
    note_number.round().clamp(0.0, (NOTE_COUNT - 1) as f32) as u8
}

/// Maps a frequency in Hz to the nearest MIDI note. Out of range
/// (including non-positive) frequencies are clamped to `0..=127`.
pub fn nearest_midi_note(freq: f32) -> u8 {
    if !(freq > 0.0) {
        return 0;
    }
    round_midi_note(freq_to_midi_note(freq))
}

/// Displays a MIDI note number as a note name with octave, e.g `A4` or `C#5`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NoteName(pub u8);

impl fmt::Display for NoteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [&str; 12] = [
            "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
        ];
        let octave = (self.0 / 12) as i32 - 1;
        write!(f, "{}{}", NAMES[(self.0 % 12) as usize], octave)
    }
}
