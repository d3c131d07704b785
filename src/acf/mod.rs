//! Streaming, octave aware autocorrelation [pitch](https://en.wikipedia.org/wiki/Pitch_%28music%29)
//! detection for monophonic sounds.
//!
//! Input samples are (optionally downsampled and) collected into a sliding
//! analysis window. Every `exec_period` samples, the autocorrelation of the window
//! is searched for the first peak above a fraction of the zero lag energy.
//! The search evaluates every lag at short periods and increasingly sparse lags
//! at long periods, after which the found peak is refined to sub-sample
//! precision using a hill climb followed by parabolic interpolation.
//! Accepted frequencies are smoothed by a running median.
//!
//! The implementation is suitable for real time use:
//! * Memory is only allocated in [`PitchDetector::prepare`].
//! * Processing never fails. Silent input and degenerate settings produce no detections.
//!
//! # Example
//! ```
//! use micro_note::acf::{PitchDetector, Settings};
//!
//! let sample_rate = 44100.0;
//! let chunk: Vec<f32> = (0..8820)
//!     .map(|i| 0.5 * (2.0 * core::f32::consts::PI * 440.0 * (i as f32) / sample_rate).sin())
//!     .collect();
//!
//! let mut detector = PitchDetector::new(sample_rate, &Settings::default()).unwrap();
//! detector.process(&chunk[..], |detection| {
//!     println!("{} Hz at sample {}", detection.frequency, detection.sample_offset);
//!     assert_eq!(detection.midi_note(), 69);
//! });
//! ```

mod detection;
mod detector;
mod median;
mod settings;

pub use detection::{loudest_detection, Detection};
pub use detector::PitchDetector;
pub use median::{MedianFilter, MAX_MEDIAN_SIZE};
pub use settings::{Settings, SETTINGS_EPSILON};
