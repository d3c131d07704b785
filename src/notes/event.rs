/// A note-on or note-off produced by [`NoteTracker`](super::NoteTracker),
/// positioned within the processed block.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NoteTransition {
    /// MIDI note number, `0..=127`.
    pub note: u8,
    /// Between 0 and 1. Always 0 for note-offs.
    pub velocity: f32,
    pub is_onset: bool,
    /// The offset from the start of the block, in samples.
    pub sample_offset: usize,
}

impl NoteTransition {
    pub fn note_on(note: u8, velocity: f32, sample_offset: usize) -> Self {
        NoteTransition {
            note,
            velocity,
            is_onset: true,
            sample_offset,
        }
    }

    pub fn note_off(note: u8, sample_offset: usize) -> Self {
        NoteTransition {
            note,
            velocity: 0.0,
            is_onset: false,
            sample_offset,
        }
    }
}

/// A timestamped note-on or note-off, as handed to a monitor on another thread.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct NoteEvent {
    /// MIDI note number, `0..=127`.
    pub note: u8,
    /// Between 0 and 1. Always 0 for note-offs.
    pub velocity: f32,
    pub is_onset: bool,
    /// Seconds since processing started.
    pub time_seconds: f64,
}

impl NoteEvent {
    /// Timestamps a transition of the block starting at sample `block_start`.
    pub fn from_transition(transition: &NoteTransition, block_start: i64, sample_rate: f32) -> Self {
        let sample = block_start + transition.sample_offset as i64;
        let time_seconds = if sample_rate > 0.0 {
            sample as f64 / sample_rate as f64
        } else {
            0.0
        };
        NoteEvent {
            note: transition.note,
            velocity: transition.velocity,
            is_onset: transition.is_onset,
            time_seconds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_from_transition() {
        let transition = NoteTransition::note_on(69, 0.5, 100);
        let event = NoteEvent::from_transition(&transition, 44000, 44100.0);
        assert_eq!(event.note, 69);
        assert_eq!(event.velocity, 0.5);
        assert!(event.is_onset);
        assert_relative_eq!(event.time_seconds, 1.0);

        let off = NoteEvent::from_transition(&NoteTransition::note_off(60, 0), 0, 0.0);
        assert!(!off.is_onset);
        assert_eq!(off.velocity, 0.0);
        assert_eq!(off.time_seconds, 0.0);
    }
}
