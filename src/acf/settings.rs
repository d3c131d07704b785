/// The tolerance used when comparing floating point settings.
pub const SETTINGS_EPSILON: f32 = 1.0e-4;

fn nearly_equal(a: f32, b: f32) -> bool {
    (a - b).abs() <= SETTINGS_EPSILON
}

/// Pitch detector configuration. Changing any of these requires a call to
/// [`PitchDetector::prepare`](super::PitchDetector::prepare).
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct Settings {
    /// The frequency in Hz the median filter is primed with.
    pub init_freq: f32,
    /// The lowest detectable frequency in Hz. Determines the analysis window size.
    pub min_freq: f32,
    /// The highest detectable frequency in Hz.
    pub max_freq: f32,
    /// The number of analysis cycles per second, clamped to `[min_freq, max_freq]`.
    pub exec_freq: f32,
    /// The number of lags evaluated per octave before the search step starts growing.
    pub max_bins_per_octave: usize,
    /// The median filter length, clamped to `1..=31`. 1 disables smoothing.
    pub median_size: usize,
    /// Windows without a sample at least this loud are considered silent.
    pub amp_threshold: f32,
    /// Autocorrelation peaks must exceed this fraction of the zero lag energy.
    pub peak_threshold: f32,
    /// Only every `down_sample`:th input sample is analyzed.
    pub down_sample: usize,
    /// If true, the confidence of a detection is the normalized autocorrelation
    /// peak value. If false, it is always 1.
    pub clarity: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            init_freq: 440.0,
            min_freq: 60.0,
            max_freq: 2000.0,
            exec_freq: 100.0,
            max_bins_per_octave: 16,
            median_size: 1,
            amp_threshold: 0.02,
            peak_threshold: 0.5,
            down_sample: 1,
            clarity: false,
        }
    }
}

impl Settings {
    /// Compares two sets of settings, allowing a small difference
    /// between floating point values. Used to avoid re-preparing
    /// the detector (and losing its analysis state) when host
    /// parameters have not actually changed.
    pub fn approx_eq(&self, other: &Settings) -> bool {
        nearly_equal(self.init_freq, other.init_freq)
            && nearly_equal(self.min_freq, other.min_freq)
            && nearly_equal(self.max_freq, other.max_freq)
            && nearly_equal(self.exec_freq, other.exec_freq)
            && self.max_bins_per_octave == other.max_bins_per_octave
            && self.median_size == other.median_size
            && nearly_equal(self.amp_threshold, other.amp_threshold)
            && nearly_equal(self.peak_threshold, other.peak_threshold)
            && self.down_sample == other.down_sample
            && self.clarity == other.clarity
    }
}
