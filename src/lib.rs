//! Real time conversion of monophonic audio to sample accurate MIDI notes.
//!
//! The conversion happens in two stages:
//! * [`acf::PitchDetector`] finds the pitch of the input using octave aware
//!   autocorrelation, producing a median filtered frequency estimate at a fixed rate.
//! * [`notes::NoteTracker`] turns the estimates into note-on and note-off events,
//!   debouncing short glitches and releasing notes on pitch changes, silence
//!   and timeouts.
//!
//! [`NoteProcessor`] ties the stages together for use in an audio callback.
//! It mixes the input channels down to mono, writes note messages to a
//! [`MidiBuffer`] and forwards note events to a [`NoteMonitor`] living on
//! another thread. Nothing is allocated or locked while processing.
//!
//! # Example
//! ```
//! use micro_note::{MidiBuffer, MidiMessageKind, NoteProcessor, Params};
//!
//! let sample_rate = 44100.0;
//! let block_size = 512;
//! let params = Params {
//!     exec_freq: 100.0,
//!     median_size: 1,
//!     ..Params::default()
//! };
//!
//! let (mut processor, mut monitor) = NoteProcessor::new(128);
//! processor.prepare(sample_rate, block_size, &params).unwrap();
//!
//! // A 440 Hz tone.
//! let input: Vec<f32> = (0..20 * block_size)
//!     .map(|i| 0.5 * (2.0 * core::f32::consts::PI * 440.0 * (i as f32) / sample_rate).sin())
//!     .collect();
//!
//! let mut midi = MidiBuffer::with_capacity(64);
//! let mut note_ons = 0;
//! for block in input.chunks(block_size) {
//!     processor.process(&[block], &params, &mut midi);
//!     for message in midi.iter() {
//!         if let MidiMessageKind::NoteOn { note, .. } = message.kind {
//!             assert_eq!(note, 69);
//!             note_ons += 1;
//!         }
//!     }
//! }
//! assert_eq!(note_ons, 1);
//!
//! // Typically polled from a GUI thread.
//! let events = monitor.pull_note_events(16);
//! assert_eq!(events.len(), 1);
//! assert!(events[0].is_onset);
//! ```

pub mod acf;
pub mod bridge;
mod common;
pub mod error;
pub mod midi;
pub mod notes;
pub mod params;
mod processor;

pub use bridge::{monitor_channel, NoteEventSender, NoteMonitor};
pub use common::{freq_to_midi_note, nearest_midi_note, NoteName};
pub use error::{PrepareError, Result};
pub use midi::{MidiBuffer, MidiMessage, MidiMessageKind};
pub use notes::NoteEvent;
pub use params::Params;
pub use processor::{NoteProcessor, DEFAULT_QUEUE_CAPACITY};
