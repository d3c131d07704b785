//! Conversion of pitch detections to sample accurate note-on and note-off events.
//!
//! [`NoteTracker`] is a monophonic state machine fed once per block. A pitch
//! has to be held for a minimum time before its note-on is emitted, which
//! filters out short glitches in the detected pitch. The sounding note is
//! released when the pitch changes, after a period of silence, or when it
//! has been sounding for longer than a maximum note length.
//!
//! # Example
//! ```
//! use micro_note::acf::Detection;
//! use micro_note::notes::{NoteTracker, TrackerConfig};
//!
//! let sample_rate = 44100.0;
//! let config = TrackerConfig::from_seconds(sample_rate, 0.005, 5.0, 0.05, 1);
//! let mut tracker = NoteTracker::new(config);
//!
//! let detection = Detection { frequency: 440.0, amplitude: 0.5, confidence: 1.0, sample_offset: 100 };
//! assert!(tracker.process_block(&[detection], 0, 512, 0.3).is_empty());
//!
//! let transitions = tracker.process_block(&[detection], 512, 512, 0.3);
//! assert_eq!(transitions.len(), 1);
//! assert_eq!(transitions[0].note, 69);
//! assert!(transitions[0].is_onset);
//! ```

mod config;
mod event;
mod tracker;

pub use config::{seconds_to_samples, TrackerConfig};
pub use event::{NoteEvent, NoteTransition};
pub use tracker::{velocity_from_rms, NoteTracker};
