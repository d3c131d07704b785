//! Sample accurate [MIDI](https://en.wikipedia.org/wiki/MIDI) output.

use crate::common::NOTE_COUNT;
use crate::notes::NoteTransition;

/// The channel (1-16) note messages are sent on.
pub const MIDI_CHANNEL: u8 = 1;

const NOTE_OFF_STATUS: u8 = 0x80;
const NOTE_ON_STATUS: u8 = 0x90;

/// Quantizes a velocity between 0 and 1 to a 7 bit note-on velocity.
/// The result is at least 1, since a note-on with velocity 0 is a note-off.
pub fn quantize_velocity(velocity: f32) -> u8 {
    if !velocity.is_finite() {
        return 1;
    }
    (velocity * 127.0).round().clamp(1.0, 127.0) as u8
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MidiMessageKind {
    NoteOn { note: u8, velocity: u8 },
    NoteOff { note: u8 },
    /// Any other short message, e.g passed through from the input.
    Other([u8; 3]),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MidiMessage {
    /// The offset from the start of the block, in samples.
    pub sample_offset: usize,
    pub kind: MidiMessageKind,
}

impl MidiMessage {
    pub fn from_transition(transition: &NoteTransition) -> Self {
        let note = transition.note.min(127);
        let kind = if transition.is_onset {
            MidiMessageKind::NoteOn {
                note,
                velocity: quantize_velocity(transition.velocity),
            }
        } else {
            MidiMessageKind::NoteOff { note }
        };
        MidiMessage {
            sample_offset: transition.sample_offset,
            kind,
        }
    }

    /// The raw message bytes.
    pub fn to_bytes(&self) -> [u8; 3] {
        let channel = (MIDI_CHANNEL - 1) & 0x0f;
        match self.kind {
            MidiMessageKind::NoteOn { note, velocity } => {
                [NOTE_ON_STATUS | channel, note & 0x7f, velocity & 0x7f]
            }
            MidiMessageKind::NoteOff { note } => [NOTE_OFF_STATUS | channel, note & 0x7f, 0],
            MidiMessageKind::Other(bytes) => bytes,
        }
    }
}

/// Room kept for note messages on top of the requested capacity: a
/// note-off for every note, plus a note-off and a note-on.
const NOTE_RESERVE: usize = NOTE_COUNT + 2;

/// A fixed capacity list of MIDI messages, ordered by sample offset.
/// Messages with equal offsets keep their insertion order.
///
/// Note messages have extra reserved room, so a full buffer of other
/// messages never blocks a note-off. When even the reserve is used up,
/// the latest other message is evicted to make room for a note message.
pub struct MidiBuffer {
    messages: Vec<MidiMessage>,
    /// The number of other messages that fit.
    capacity: usize,
    dropped_messages: usize,
}

impl MidiBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        MidiBuffer {
            messages: Vec::with_capacity(capacity + NOTE_RESERVE),
            capacity,
            dropped_messages: 0,
        }
    }

    /// Inserts a message at its sample position. Returns false if the
    /// message was dropped because the buffer is full.
    pub fn add(&mut self, message: MidiMessage) -> bool {
        let is_note = !matches!(message.kind, MidiMessageKind::Other(_));
        let limit = if is_note {
            self.capacity + NOTE_RESERVE
        } else {
            self.capacity
        };
        if self.messages.len() >= limit {
            let evicted = if is_note {
                self.messages
                    .iter()
                    .rposition(|m| matches!(m.kind, MidiMessageKind::Other(_)))
            } else {
                None
            };
            self.dropped_messages += 1;
            match evicted {
                Some(index) => {
                    self.messages.remove(index);
                }
                None => return false,
            }
        }
        let index = self
            .messages
            .partition_point(|m| m.sample_offset <= message.sample_offset);
        self.messages.insert(index, message);
        true
    }

    /// The number of messages dropped or evicted because the buffer was full.
    pub fn dropped_messages(&self) -> usize {
        self.dropped_messages
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn messages(&self) -> &[MidiMessage] {
        &self.messages
    }

    pub fn iter(&self) -> impl Iterator<Item = &MidiMessage> {
        self.messages.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantize_velocity() {
        assert_eq!(quantize_velocity(0.0), 1);
        assert_eq!(quantize_velocity(-1.0), 1);
        assert_eq!(quantize_velocity(f32::NAN), 1);
        assert_eq!(quantize_velocity(64.0 / 127.0), 64);
        assert_eq!(quantize_velocity(1.0), 127);
        assert_eq!(quantize_velocity(3.0), 127);
    }

    #[test]
    fn test_to_bytes() {
        let on = MidiMessage::from_transition(&NoteTransition::note_on(69, 1.0, 10));
        assert_eq!(on.sample_offset, 10);
        assert_eq!(on.to_bytes(), [0x90, 69, 127]);

        let off = MidiMessage::from_transition(&NoteTransition::note_off(69, 20));
        assert_eq!(off.kind, MidiMessageKind::NoteOff { note: 69 });
        assert_eq!(off.to_bytes(), [0x80, 69, 0]);

        let other = MidiMessage {
            sample_offset: 0,
            kind: MidiMessageKind::Other([0xb0, 1, 64]),
        };
        assert_eq!(other.to_bytes(), [0xb0, 1, 64]);
    }

    #[test]
    fn test_buffer_ordering() {
        let mut buffer = MidiBuffer::with_capacity(8);
        assert!(buffer.add(MidiMessage::from_transition(&NoteTransition::note_on(60, 0.5, 100))));
        assert!(buffer.add(MidiMessage::from_transition(&NoteTransition::note_off(57, 10))));
        assert!(buffer.add(MidiMessage::from_transition(&NoteTransition::note_off(59, 100))));
        let offsets: Vec<usize> = buffer.iter().map(|m| m.sample_offset).collect();
        assert_eq!(offsets, vec![10, 100, 100]);
        // Equal offsets keep insertion order.
        assert!(matches!(
            buffer.messages()[1].kind,
            MidiMessageKind::NoteOn { note: 60, .. }
        ));
        buffer.clear();
        assert!(buffer.is_empty());
    }

    fn thru(sample_offset: usize) -> MidiMessage {
        MidiMessage {
            sample_offset,
            kind: MidiMessageKind::Other([0xb0, 1, 64]),
        }
    }

    #[test]
    fn test_full_buffer_drops_other_messages() {
        let mut buffer = MidiBuffer::with_capacity(2);
        assert!(buffer.add(thru(0)));
        assert!(buffer.add(thru(1)));
        assert!(!buffer.add(thru(2)));
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.dropped_messages(), 1);
    }

    #[test]
    fn test_note_offs_fit_in_buffer_full_of_other_messages() {
        let mut buffer = MidiBuffer::with_capacity(2);
        buffer.add(thru(0));
        buffer.add(thru(5));
        for note in 0..NOTE_COUNT as u8 {
            assert!(buffer.add(MidiMessage::from_transition(&NoteTransition::note_off(note, 3))));
        }
        assert!(buffer.add(MidiMessage::from_transition(&NoteTransition::note_on(60, 0.5, 3))));
        assert!(buffer.add(MidiMessage::from_transition(&NoteTransition::note_off(60, 4))));
        assert_eq!(buffer.dropped_messages(), 0);
        assert_eq!(buffer.len(), 2 + NOTE_COUNT + 2);

        // Beyond the reserve, other messages make room for notes, latest first.
        assert!(buffer.add(MidiMessage::from_transition(&NoteTransition::note_off(61, 4))));
        assert_eq!(buffer.dropped_messages(), 1);
        let others: Vec<usize> = buffer
            .iter()
            .filter(|m| matches!(m.kind, MidiMessageKind::Other(_)))
            .map(|m| m.sample_offset)
            .collect();
        assert_eq!(others, vec![0]);
    }

    #[test]
    fn test_full_buffer_of_notes_drops_notes() {
        let mut buffer = MidiBuffer::with_capacity(0);
        for i in 0..NOTE_RESERVE {
            assert!(buffer.add(MidiMessage::from_transition(&NoteTransition::note_off(60, i))));
        }
        assert!(!buffer.add(MidiMessage::from_transition(&NoteTransition::note_off(61, 0))));
        assert_eq!(buffer.len(), NOTE_RESERVE);
        assert_eq!(buffer.dropped_messages(), 1);
    }
}
