//! Common algorithms and utilities.

mod autocorr;
mod f32_array_ext;
mod midi;

pub use autocorr::{lagged_sum, log2_ceil, octave_step};
pub use f32_array_ext::F32ArrayExt;
pub use midi::{freq_to_midi_note, nearest_midi_note, NoteName, NOTE_COUNT};
