use crate::common::nearest_midi_note;

/// A pitch estimate produced by one analysis cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Detection {
    /// The (median filtered) frequency in Hz.
    pub frequency: f32,
    /// Compressed autocorrelation amplitude, between 0 and 1.
    pub amplitude: f32,
    /// Detection reliability, between 0 and 1. Always 1 unless the
    /// detector runs in clarity mode.
    pub confidence: f32,
    /// The index, within the processed block, of the input sample
    /// that completed the analyzed window.
    pub sample_offset: usize,
}

impl Detection {
    /// The nearest MIDI note number, clamped to `0..=127`.
    pub fn midi_note(&self) -> u8 {
        nearest_midi_note(self.frequency)
    }
}

/// Picks the detection with the highest amplitude. Ties go to the
/// most recent detection.
pub fn loudest_detection(detections: &[Detection]) -> Option<&Detection> {
    detections
        .iter()
        .max_by(|a, b| a.amplitude.total_cmp(&b.amplitude))
}
