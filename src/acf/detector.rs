use crate::acf::detection::Detection;
use crate::acf::median::MedianFilter;
use crate::acf::settings::Settings;
use crate::common::{lagged_sum, log2_ceil, octave_step, F32ArrayExt};
use crate::error::{PrepareError, Result};

const LOG_TARGET: &str = "micro_note::acf";

/// Amplitudes are mapped through `log1p(k * x) / log1p(k)` using this `k`.
const AMPLITUDE_CURVE: f32 = 20.0;

/// Parabolic interpolation is skipped for flatter peaks than this.
const MIN_PEAK_CURVATURE: f32 = 1.0e-6;

/// The outcome of a successful analysis cycle.
struct Estimate {
    frequency: f32,
    amplitude: f32,
    confidence: f32,
}

/// An autocorrelation peak, refined to sub-sample precision.
#[derive(Debug, PartialEq)]
struct Peak {
    /// The (fractional) lag of the peak.
    period: f32,
    /// The integer lag of the peak.
    lag: usize,
    /// The autocorrelation at `lag`.
    value: f32,
    /// The autocorrelation at `lag - 1`.
    prev: f32,
}

/// * Collects (optionally downsampled) input samples into a sliding analysis window
/// * Runs an octave aware autocorrelation pitch search every `exec_period` samples
/// * Median filters the resulting frequencies
///
/// All buffers are allocated in [`prepare`](PitchDetector::prepare), so
/// [`process`](PitchDetector::process) is suitable for real time use.
pub struct PitchDetector {
    settings: Settings,
    /// The input sample rate in Hz.
    sample_rate: f32,
    /// The sample rate after downsampling.
    analysis_rate: f32,
    /// Analysis window. Empty if the detector is degenerate.
    buffer: Box<[f32]>,
    /// The write index into `buffer`.
    index: usize,
    down_sample: usize,
    down_sample_counter: usize,
    /// The shortest period (in analysis samples) considered a pitch.
    min_period: usize,
    /// The longest period (in analysis samples) considered a pitch. Also the
    /// number of lagged products summed per autocorrelation value.
    max_period: usize,
    /// The number of analysis samples between consecutive analysis cycles.
    exec_period: usize,
    max_log2_bins: u32,
    median: MedianFilter,
    freq: f32,
    amp: f32,
    confidence: f32,
}

impl Default for PitchDetector {
    fn default() -> Self {
        let settings = Settings::default();
        PitchDetector {
            settings,
            sample_rate: 0.0,
            analysis_rate: 0.0,
            buffer: Box::default(),
            index: 0,
            down_sample: 1,
            down_sample_counter: 0,
            min_period: 0,
            max_period: 0,
            exec_period: 1,
            max_log2_bins: 0,
            median: MedianFilter::new(settings.median_size, settings.init_freq),
            freq: settings.init_freq,
            amp: 0.0,
            confidence: 0.0,
        }
    }
}

impl PitchDetector {
    /// Creates a detector prepared for a given sample rate and settings.
    pub fn new(sample_rate: f32, settings: &Settings) -> Result<Self> {
        let mut detector = PitchDetector::default();
        detector.prepare(sample_rate, 0, settings)?;
        Ok(detector)
    }

    /// Derives periods and buffer sizes from the sample rate and settings,
    /// discarding all analysis state.
    ///
    /// Settings that cannot produce a pitch (a non-positive `max_freq`, or
    /// `min_freq >= max_freq`) leave the detector in a degenerate state
    /// where it never detects anything. So does an allocation failure, which
    /// is the only error returned.
    pub fn prepare(
        &mut self,
        sample_rate: f32,
        _block_size_hint: usize,
        settings: &Settings,
    ) -> Result<()> {
        self.settings = *settings;
        self.sample_rate = sample_rate;
        self.down_sample = settings.down_sample.max(1);
        self.analysis_rate = sample_rate / (self.down_sample as f32);
        self.freq = settings.init_freq;
        self.median = MedianFilter::new(settings.median_size, settings.init_freq);
        self.buffer = Box::default();
        self.index = 0;
        self.down_sample_counter = 0;
        self.min_period = 0;
        self.max_period = 0;
        self.exec_period = 1;
        self.amp = 0.0;
        self.confidence = 0.0;

        let degenerate = !(sample_rate > 0.0)
            || !(settings.max_freq > 0.0)
            || !(settings.min_freq < settings.max_freq);
        if degenerate {
            log::warn!(
                target: LOG_TARGET,
                "pitch detection disabled: sample rate {} Hz, frequency range [{}, {}] Hz",
                sample_rate,
                settings.min_freq,
                settings.max_freq
            );
            return Ok(());
        }

        let exec_freq = settings.exec_freq.max(settings.min_freq).min(settings.max_freq);
        self.max_log2_bins = log2_ceil(settings.max_bins_per_octave.max(1));
        self.min_period = (self.analysis_rate / settings.max_freq.max(1.0)) as usize;
        self.max_period = (self.analysis_rate / settings.min_freq.max(1.0)) as usize;
        self.exec_period = ((self.analysis_rate / exec_freq.max(1.0)) as usize).max(1);

        let size = self.max_period.saturating_mul(2).max(self.exec_period);
        let mut buffer: Vec<f32> = Vec::new();
        if buffer.try_reserve_exact(size).is_err() {
            return Err(PrepareError::Allocation {
                what: "analysis buffer",
                len: size,
            });
        }
        buffer.resize(size, 0.0);
        self.buffer = buffer.into_boxed_slice();

        log::debug!(
            target: LOG_TARGET,
            "prepared pitch detector: analysis rate {} Hz, periods [{}, {}], exec period {}, buffer size {}",
            self.analysis_rate,
            self.min_period,
            self.max_period,
            self.exec_period,
            size
        );
        Ok(())
    }

    /// Clears the analysis window and primes the median filter with the
    /// most recently detected frequency.
    pub fn reset(&mut self) {
        for sample in self.buffer.iter_mut() {
            *sample = 0.0;
        }
        self.median.fill(self.freq);
        self.index = 0;
        self.down_sample_counter = 0;
        self.confidence = 0.0;
    }

    /// Consumes a block of input samples, invoking `handler` for each
    /// detected pitch. Typically zero or one detection per block, depending
    /// on the block size and the exec period.
    pub fn process<F>(&mut self, samples: &[f32], mut handler: F)
    where
        F: FnMut(Detection),
    {
        let size = self.buffer.len();
        if size == 0 {
            return;
        }

        for (sample_offset, sample) in samples.iter().enumerate() {
            if self.down_sample_counter == 0 {
                self.buffer[self.index] = *sample;
                self.index += 1;

                if self.index >= size {
                    match self.analyse() {
                        Some(estimate) => {
                            self.freq = estimate.frequency;
                            self.amp = estimate.amplitude;
                            self.confidence = estimate.confidence;
                            if estimate.confidence > 0.0 {
                                handler(Detection {
                                    frequency: estimate.frequency,
                                    amplitude: estimate.amplitude,
                                    confidence: estimate.confidence,
                                    sample_offset,
                                });
                            }
                        }
                        None => self.confidence = 0.0,
                    }

                    // Slide the window, keeping the overlap.
                    self.buffer.copy_within(self.exec_period.., 0);
                    self.index = size - self.exec_period;
                }
            }

            self.down_sample_counter += 1;
            if self.down_sample_counter >= self.down_sample {
                self.down_sample_counter = 0;
            }
        }
    }

    fn analyse(&mut self) -> Option<Estimate> {
        let min_period = self.min_period;
        let max_period = self.max_period;
        if min_period == 0 || max_period == 0 {
            return None;
        }

        let window = &self.buffer[..];
        if window[..max_period].peak_level() < self.settings.amp_threshold {
            return None;
        }

        let zero_lag = window[..max_period].energy();
        if !(zero_lag > 0.0) {
            return None;
        }

        let threshold = zero_lag * self.settings.peak_threshold;
        let peak = find_peak(window, min_period, max_period, self.max_log2_bins, threshold)?;
        if !(peak.period > 0.0) {
            return None;
        }

        let frequency = self.analysis_rate / peak.period;
        if frequency < self.settings.min_freq || frequency > self.settings.max_freq {
            return None;
        }

        let frequency = self.median.insert(frequency);

        let confidence = if self.settings.clarity {
            peak.value / zero_lag
        } else {
            1.0
        };

        let raw_amplitude = if peak.lag > 0 {
            (peak.prev / peak.lag as f32).max(0.0)
        } else {
            0.0
        };

        Some(Estimate {
            frequency,
            amplitude: compress_amplitude(raw_amplitude),
            confidence,
        })
    }

    /// Returns the settings passed to the last call to `prepare`.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Returns the input sample rate in Hz.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Returns the sample rate of the analyzed, downsampled signal.
    pub fn analysis_rate(&self) -> f32 {
        self.analysis_rate
    }

    pub fn min_period(&self) -> usize {
        self.min_period
    }

    pub fn max_period(&self) -> usize {
        self.max_period
    }

    /// The number of analysis samples between analysis cycles.
    pub fn exec_period(&self) -> usize {
        self.exec_period
    }

    /// The number of input samples between analysis cycles.
    pub fn input_exec_period(&self) -> usize {
        self.exec_period * self.down_sample
    }

    /// The analysis window size.
    pub fn buffer_size(&self) -> usize {
        self.buffer.len()
    }

    /// Returns true if the detector can produce detections.
    pub fn is_active(&self) -> bool {
        !self.buffer.is_empty() && self.min_period > 0 && self.max_period > 0
    }

    /// The most recently accepted frequency in Hz.
    pub fn frequency(&self) -> f32 {
        self.freq
    }

    /// The most recently accepted amplitude.
    pub fn amplitude(&self) -> f32 {
        self.amp
    }

    /// The confidence of the last analysis cycle, 0 if it found no pitch.
    pub fn confidence(&self) -> f32 {
        self.confidence
    }
}

/// Searches the autocorrelation of `window` for the first peak above
/// `threshold` with a lag in `[min_period, max_period]`.
///
/// The search first skips the zero lag peak, then tracks the maximum of
/// the first region above the threshold. Lags are visited with an octave
/// aware step, so the found maximum is then hill climbed to the true local
/// maximum and refined using parabolic interpolation.
///
/// `window` must hold at least `2 * max_period` samples.
fn find_peak(
    window: &[f32],
    min_period: usize,
    max_period: usize,
    max_log2_bins: u32,
    threshold: f32,
) -> Option<Peak> {
    let sum_at = |lag: usize| {
        if lag <= max_period {
            lagged_sum(window, lag, max_period)
        } else {
            0.0
        }
    };

    // Skip past the peak at lag 0.
    let mut lag = 1;
    while lag <= max_period && sum_at(lag) >= threshold {
        lag = lag.saturating_add(octave_step(lag, max_log2_bins));
    }

    let mut period = lag;
    let mut max_sum = threshold;
    let mut found_peak = false;
    while lag <= max_period {
        if lag >= min_period {
            let sum = sum_at(lag);
            if sum > threshold {
                if sum > max_sum {
                    found_peak = true;
                    max_sum = sum;
                    period = lag;
                }
            } else if found_peak {
                break;
            }
        }
        lag = lag.saturating_add(octave_step(lag, max_log2_bins));
    }

    if !found_peak {
        return None;
    }

    // Climb to the nearest local maximum.
    let mut prev = if period > 0 { sum_at(period - 1) } else { 0.0 };
    let mut next = sum_at(period + 1);
    while prev > max_sum && period > 0 {
        next = max_sum;
        max_sum = prev;
        period -= 1;
        prev = if period > 0 { sum_at(period - 1) } else { 0.0 };
    }
    while next > max_sum && period < max_period {
        prev = max_sum;
        max_sum = next;
        period += 1;
        next = sum_at(period + 1);
    }

    // Fit a parabola through (-1, prev), (0, max_sum), (1, next)
    let beta = 0.5 * (next - prev);
    let gamma = 2.0 * max_sum - next - prev;
    let mut refined_period = period as f32;
    if gamma.abs() > MIN_PEAK_CURVATURE {
        refined_period += beta / gamma;
    }

    Some(Peak {
        period: refined_period,
        lag: period,
        value: max_sum,
        prev,
    })
}

/// Maps a raw amplitude through a log like curve: a fast rise for
/// low values, compressed towards 1 at the top. The result is clamped to `[0, 1]`.
fn compress_amplitude(raw: f32) -> f32 {
    let mapped = (AMPLITUDE_CURVE * raw.max(0.0)).ln_1p() / AMPLITUDE_CURVE.ln_1p();
    mapped.clamp(0.0, 1.0)
}
