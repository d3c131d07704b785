//! Host facing parameters of [`NoteProcessor`](crate::NoteProcessor).

use core::ops::RangeInclusive;

use crate::acf::Settings;
use crate::notes::TrackerConfig;

pub const INIT_FREQ_RANGE: RangeInclusive<f32> = 20.0..=2000.0;
pub const MIN_FREQ_RANGE: RangeInclusive<f32> = 20.0..=1000.0;
pub const MAX_FREQ_RANGE: RangeInclusive<f32> = 100.0..=8000.0;
pub const EXEC_FREQ_RANGE: RangeInclusive<f32> = 10.0..=500.0;
pub const MAX_BINS_PER_OCTAVE_RANGE: RangeInclusive<usize> = 1..=32;
pub const MEDIAN_SIZE_RANGE: RangeInclusive<usize> = 1..=31;
pub const AMP_THRESHOLD_RANGE: RangeInclusive<f32> = 0.0..=0.02;
pub const AMP_SCALE_RANGE: RangeInclusive<f32> = 0.0..=10.0;
pub const MIN_VELOCITY_RANGE: RangeInclusive<u8> = 0..=64;
pub const MIN_HOLD_TIME_RANGE: RangeInclusive<f32> = 0.0..=0.25;
pub const PEAK_THRESHOLD_RANGE: RangeInclusive<f32> = 0.1..=1.0;
pub const DOWN_SAMPLE_RANGE: RangeInclusive<usize> = 1..=32;
pub const MAX_NOTE_LENGTH_RANGE: RangeInclusive<f32> = 3.0..=10.0;
pub const DECAY_TIME_RANGE: RangeInclusive<f32> = 0.0..=0.5;

fn clamp_f32(value: f32, range: &RangeInclusive<f32>, fallback: f32) -> f32 {
    if value.is_nan() {
        return fallback;
    }
    value.max(*range.start()).min(*range.end())
}

fn clamp_ord<T: Ord + Copy>(value: T, range: &RangeInclusive<T>) -> T {
    value.clamp(*range.start(), *range.end())
}

/// The full parameter set, as exposed to a host. Read once per block.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct Params {
    /// The frequency the median filter starts out with, in Hz.
    pub init_freq: f32,
    /// The lowest detectable frequency in Hz.
    pub min_freq: f32,
    /// The highest detectable frequency in Hz.
    pub max_freq: f32,
    /// Pitch detection cycles per second.
    pub exec_freq: f32,
    pub max_bins_per_octave: usize,
    pub median_size: usize,
    /// Input peak level below which a window is considered silent.
    pub amp_threshold: f32,
    /// Input gain, applied before analysis.
    pub amp_scale: f32,
    /// The lowest note-on velocity, `0..=127`.
    pub min_velocity: u8,
    /// Seconds a pitch has to be held before its note-on.
    pub min_hold_time: f32,
    pub peak_threshold: f32,
    pub down_sample: usize,
    pub clarity: bool,
    /// Seconds after which a sounding note is released.
    pub max_note_length: f32,
    /// Seconds of silence after which the sounding note is released.
    pub decay_time: f32,
    /// If true, incoming MIDI is passed through to the output.
    pub midi_thru: bool,
    /// Asks monitors to freeze their display.
    pub freeze: bool,
}

impl Default for Params {
    fn default() -> Self {
        Params {
            init_freq: 440.0,
            min_freq: 60.0,
            max_freq: 2000.0,
            exec_freq: 10.0,
            max_bins_per_octave: 16,
            median_size: 7,
            amp_threshold: 0.02,
            amp_scale: 1.0,
            min_velocity: 0,
            min_hold_time: 0.001,
            peak_threshold: 0.5,
            down_sample: 1,
            clarity: true,
            max_note_length: 5.0,
            decay_time: 0.001,
            midi_thru: false,
            freeze: false,
        }
    }
}

impl Params {
    /// Returns a copy with every value clamped to its range. NaN values
    /// are replaced by their defaults.
    pub fn clamped(&self) -> Params {
        let defaults = Params::default();
        Params {
            init_freq: clamp_f32(self.init_freq, &INIT_FREQ_RANGE, defaults.init_freq),
            min_freq: clamp_f32(self.min_freq, &MIN_FREQ_RANGE, defaults.min_freq),
            max_freq: clamp_f32(self.max_freq, &MAX_FREQ_RANGE, defaults.max_freq),
            exec_freq: clamp_f32(self.exec_freq, &EXEC_FREQ_RANGE, defaults.exec_freq),
            max_bins_per_octave: clamp_ord(self.max_bins_per_octave, &MAX_BINS_PER_OCTAVE_RANGE),
            median_size: clamp_ord(self.median_size, &MEDIAN_SIZE_RANGE),
            amp_threshold: clamp_f32(self.amp_threshold, &AMP_THRESHOLD_RANGE, defaults.amp_threshold),
            amp_scale: clamp_f32(self.amp_scale, &AMP_SCALE_RANGE, defaults.amp_scale),
            min_velocity: clamp_ord(self.min_velocity, &MIN_VELOCITY_RANGE),
            min_hold_time: clamp_f32(self.min_hold_time, &MIN_HOLD_TIME_RANGE, defaults.min_hold_time),
            peak_threshold: clamp_f32(self.peak_threshold, &PEAK_THRESHOLD_RANGE, defaults.peak_threshold),
            down_sample: clamp_ord(self.down_sample, &DOWN_SAMPLE_RANGE),
            clarity: self.clarity,
            max_note_length: clamp_f32(self.max_note_length, &MAX_NOTE_LENGTH_RANGE, defaults.max_note_length),
            decay_time: clamp_f32(self.decay_time, &DECAY_TIME_RANGE, defaults.decay_time),
            midi_thru: self.midi_thru,
            freeze: self.freeze,
        }
    }

    /// The pitch detector part of the parameters.
    pub fn detector_settings(&self) -> Settings {
        Settings {
            init_freq: self.init_freq,
            min_freq: self.min_freq,
            max_freq: self.max_freq,
            exec_freq: self.exec_freq,
            max_bins_per_octave: self.max_bins_per_octave,
            median_size: self.median_size,
            amp_threshold: self.amp_threshold,
            peak_threshold: self.peak_threshold,
            down_sample: self.down_sample,
            clarity: self.clarity,
        }
    }

    /// The note tracker part of the parameters, with times converted to samples.
    pub fn tracker_config(&self, sample_rate: f32) -> TrackerConfig {
        TrackerConfig::from_seconds(
            sample_rate,
            self.min_hold_time,
            self.max_note_length,
            self.decay_time,
            self.min_velocity,
        )
    }
}
