/// Converts a duration in seconds to a whole number of samples,
/// rounding to the nearest sample. Negative durations map to 0.
pub fn seconds_to_samples(seconds: f32, sample_rate: f32) -> i64 {
    let samples = (seconds.max(0.0) as f64) * (sample_rate.max(0.0) as f64);
    samples.round() as i64
}

/// Timing and velocity rules of a [`NoteTracker`](super::NoteTracker).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrackerConfig {
    /// A pitch must be held for more than this many samples before its note-on.
    pub min_hold_samples: i64,
    /// Sounding notes are released after this many samples. 0 means no limit.
    pub max_note_length_samples: i64,
    /// Silence must last longer than this (or `min_hold_samples`, whichever is
    /// longer) before the active note is released.
    pub decay_samples: i64,
    /// The lowest note-on velocity, `0..=127`.
    pub min_velocity: u8,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        TrackerConfig {
            min_hold_samples: 0,
            max_note_length_samples: 0,
            decay_samples: 0,
            min_velocity: 0,
        }
    }
}

impl TrackerConfig {
    pub fn from_seconds(
        sample_rate: f32,
        min_hold_time: f32,
        max_note_length: f32,
        decay_time: f32,
        min_velocity: u8,
    ) -> Self {
        TrackerConfig {
            min_hold_samples: seconds_to_samples(min_hold_time, sample_rate),
            max_note_length_samples: seconds_to_samples(max_note_length, sample_rate),
            decay_samples: seconds_to_samples(decay_time, sample_rate),
            min_velocity,
        }
    }

    /// The number of silent samples after which the active note is released.
    pub fn silence_threshold(&self) -> i64 {
        self.min_hold_samples.max(self.decay_samples)
    }
}
