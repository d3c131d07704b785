use crate::acf::{Detection, PitchDetector, Settings};
use crate::bridge::{monitor_channel, NoteEventSender, NoteMonitor};
use crate::common::F32ArrayExt;
use crate::error::{PrepareError, Result};
use crate::midi::{MidiBuffer, MidiMessage};
use crate::notes::{NoteEvent, NoteTracker};
use crate::params::Params;

const LOG_TARGET: &str = "micro_note::processor";

/// A reasonable monitor queue capacity for monitors polling at GUI rates.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// The maximum number of pitch detections considered per block.
const MAX_DETECTIONS_PER_BLOCK: usize = 128;

/// Converts blocks of (multichannel) audio to MIDI note messages and
/// forwards the resulting note events to a [`NoteMonitor`].
///
/// Call [`prepare`](NoteProcessor::prepare) whenever the sample rate or the
/// maximum block size changes, then [`process`](NoteProcessor::process) once
/// per block from the audio thread.
pub struct NoteProcessor {
    detector: PitchDetector,
    tracker: NoteTracker,
    sender: NoteEventSender,
    /// The detector settings the detector was last prepared with.
    settings: Settings,
    sample_rate: f32,
    block_size: usize,
    mono: Vec<f32>,
    detections: Vec<Detection>,
    /// The index of the first sample of the next block.
    sample_position: i64,
    has_logged_prepare_error: bool,
}

impl NoteProcessor {
    /// Creates an unprepared processor and the monitor end of its event queue.
    pub fn new(queue_capacity: usize) -> (Self, NoteMonitor) {
        let (sender, monitor) = monitor_channel(queue_capacity);
        let params = Params::default();
        let processor = NoteProcessor {
            detector: PitchDetector::default(),
            tracker: NoteTracker::new(params.tracker_config(0.0)),
            sender,
            settings: params.detector_settings(),
            sample_rate: 0.0,
            block_size: 0,
            mono: Vec::new(),
            detections: Vec::with_capacity(MAX_DETECTIONS_PER_BLOCK),
            sample_position: 0,
            has_logged_prepare_error: false,
        };
        (processor, monitor)
    }

    /// Allocates buffers for blocks of up to `block_size` samples and resets
    /// all note state. Not real time safe.
    pub fn prepare(&mut self, sample_rate: f32, block_size: usize, params: &Params) -> Result<()> {
        let params = params.clamped();
        self.sample_rate = sample_rate;
        self.block_size = block_size;
        self.sample_position = 0;
        self.tracker.reset();
        self.tracker.set_config(params.tracker_config(sample_rate));
        self.settings = params.detector_settings();

        self.mono.clear();
        if self.mono.try_reserve_exact(block_size).is_err() {
            let error = PrepareError::Allocation {
                what: "mono buffer",
                len: block_size,
            };
            self.report_prepare_error(&error);
            return Err(error);
        }
        self.mono.resize(block_size, 0.0);

        log::debug!(
            target: LOG_TARGET,
            "preparing for {} Hz, {} samples per block",
            sample_rate,
            block_size
        );
        self.prepare_detector()
    }

    fn prepare_detector(&mut self) -> Result<()> {
        let result = self
            .detector
            .prepare(self.sample_rate, self.block_size, &self.settings);
        if let Err(error) = &result {
            self.report_prepare_error(error);
        }
        result
    }

    fn report_prepare_error(&mut self, error: &PrepareError) {
        if !self.has_logged_prepare_error {
            self.has_logged_prepare_error = true;
            log::error!(target: LOG_TARGET, "{}, note detection disabled", error);
        }
    }

    /// Processes one block. `channels` holds the input channels, which are
    /// mixed down to mono. Note messages for the block are added to `midi`,
    /// which is cleared first unless MIDI thru is enabled.
    pub fn process(&mut self, channels: &[&[f32]], params: &Params, midi: &mut MidiBuffer) {
        let params = params.clamped();
        if !params.midi_thru {
            midi.clear();
        }
        self.sender.set_frozen(params.freeze);

        let block_len = channels.iter().map(|channel| channel.len()).min().unwrap_or(0);
        if block_len == 0 {
            return;
        }

        let settings = params.detector_settings();
        if !settings.approx_eq(&self.settings) {
            log::debug!(target: LOG_TARGET, "detector settings changed, re-preparing");
            self.settings = settings;
            // Failures are logged, leaving the detector silent.
            let _ = self.prepare_detector();
        }
        self.tracker.set_config(params.tracker_config(self.sample_rate));

        if self.mono.len() < block_len {
            log::debug!(
                target: LOG_TARGET,
                "block of {} samples exceeds the prepared size {}",
                block_len,
                self.mono.len()
            );
            self.mono.resize(block_len, 0.0);
        }

        let mono = &mut self.mono[..block_len];
        let gain = params.amp_scale / channels.len() as f32;
        for (i, sample) in mono.iter_mut().enumerate() {
            let mixed: f32 = channels.iter().map(|channel| channel[i]).sum();
            *sample = gain * mixed;
        }
        let rms = mono.rms_level();
        self.sender.set_rms_level(rms);

        let detections = &mut self.detections;
        detections.clear();
        self.detector.process(mono, |detection| {
            if detections.len() < detections.capacity() {
                detections.push(detection);
            }
        });

        let block_start = self.sample_position;
        let transitions = self
            .tracker
            .process_block(&self.detections, block_start, block_len, rms);
        for transition in transitions {
            midi.add(MidiMessage::from_transition(transition));
            self.sender
                .push(NoteEvent::from_transition(transition, block_start, self.sample_rate));
        }

        self.sample_position += block_len as i64;
    }

    /// Releases all sounding notes at the start of the block and clears
    /// the analysis state, e.g when the host transport restarts.
    ///
    /// The note-offs are added to `midi` at offset 0. Send them before the
    /// next call to [`process`](NoteProcessor::process), which clears `midi`
    /// unless MIDI thru is enabled.
    pub fn reset(&mut self, midi: &mut MidiBuffer) {
        let block_start = self.sample_position;
        for transition in self.tracker.release_all(0) {
            midi.add(MidiMessage::from_transition(transition));
            self.sender
                .push(NoteEvent::from_transition(transition, block_start, self.sample_rate));
        }
        self.detector.reset();
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// The number of samples processed since the last call to `prepare`.
    pub fn sample_position(&self) -> i64 {
        self.sample_position
    }

    pub fn detector(&self) -> &PitchDetector {
        &self.detector
    }

    pub fn tracker(&self) -> &NoteTracker {
        &self.tracker
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi::MidiMessageKind;

    const SAMPLE_RATE: f32 = 44100.0;
    const BLOCK: usize = 512;

    fn test_params() -> Params {
        Params {
            exec_freq: 100.0,
            median_size: 1,
            min_hold_time: 0.01,
            decay_time: 0.05,
            ..Params::default()
        }
    }

    fn sine(frequency: f32, amplitude: f32, start: usize, len: usize) -> Vec<f32> {
        (start..start + len)
            .map(|i| {
                amplitude * (2.0 * core::f32::consts::PI * frequency * (i as f32) / SAMPLE_RATE).sin()
            })
            .collect()
    }

    fn prepared() -> (NoteProcessor, NoteMonitor) {
        let (mut processor, monitor) = NoteProcessor::new(DEFAULT_QUEUE_CAPACITY);
        processor.prepare(SAMPLE_RATE, BLOCK, &test_params()).unwrap();
        (processor, monitor)
    }

    #[test]
    fn test_note_on_for_sine() {
        let (mut processor, mut monitor) = prepared();
        let params = test_params();
        let mut midi = MidiBuffer::with_capacity(16);
        let mut note_ons = Vec::new();
        for block in 0..20 {
            let left = sine(440.0, 0.5, block * BLOCK, BLOCK);
            processor.process(&[&left[..], &left[..]], &params, &mut midi);
            note_ons.extend(midi.iter().filter(|m| matches!(m.kind, MidiMessageKind::NoteOn { .. })).copied());
        }
        assert_eq!(note_ons.len(), 1);
        match note_ons[0].kind {
            MidiMessageKind::NoteOn { note, velocity } => {
                assert_eq!(note, 69);
                // The RMS of a 0.5 amplitude sine is about 0.35.
                assert!((43..=46).contains(&velocity));
            }
            _ => unreachable!(),
        }

        let events = monitor.pull_note_events(16);
        assert_eq!(events.len(), 1);
        assert!(events[0].is_onset);
        assert!(events[0].time_seconds > 0.0 && events[0].time_seconds < 0.1);
        assert!((monitor.rms_level() - 0.3536).abs() < 0.01);
        assert_eq!(processor.sample_position(), 20 * BLOCK as i64);
    }

    #[test]
    fn test_gain_is_applied() {
        let (mut processor, monitor) = prepared();
        let params = Params {
            amp_scale: 2.0,
            ..test_params()
        };
        let mut midi = MidiBuffer::with_capacity(16);
        let input = vec![0.25; BLOCK];
        processor.process(&[&input[..]], &params, &mut midi);
        assert!((monitor.rms_level() - 0.5).abs() < 1e-3);
    }

    #[test]
    fn test_midi_thru() {
        let (mut processor, _monitor) = prepared();
        let silence = vec![0.0; BLOCK];
        let thru = MidiMessage {
            sample_offset: 3,
            kind: MidiMessageKind::Other([0xb0, 1, 64]),
        };

        let mut midi = MidiBuffer::with_capacity(16);
        midi.add(thru);
        processor.process(&[&silence[..]], &test_params(), &mut midi);
        assert!(midi.is_empty());

        let params = Params {
            midi_thru: true,
            ..test_params()
        };
        midi.add(thru);
        processor.process(&[&silence[..]], &params, &mut midi);
        assert_eq!(midi.messages(), &[thru]);
    }

    #[test]
    fn test_thru_messages_do_not_block_note_offs() {
        let (mut processor, mut monitor) = prepared();
        let params = Params {
            midi_thru: true,
            ..test_params()
        };
        let mut midi = MidiBuffer::with_capacity(2);
        let (mut note_ons, mut note_offs) = (0, 0);
        for block in 0..45 {
            let input = if block < 17 {
                sine(440.0, 0.5, block * BLOCK, BLOCK)
            } else {
                vec![0.0; BLOCK]
            };
            midi.clear();
            let forwarded = if block < 17 { 1 } else { 2 };
            for offset in 0..forwarded {
                midi.add(MidiMessage {
                    sample_offset: offset,
                    kind: MidiMessageKind::Other([0xb0, 1, 64]),
                });
            }
            processor.process(&[&input[..]], &params, &mut midi);
            for message in midi.iter() {
                match message.kind {
                    MidiMessageKind::NoteOn { .. } => note_ons += 1,
                    MidiMessageKind::NoteOff { .. } => note_offs += 1,
                    MidiMessageKind::Other(_) => {}
                }
            }
            assert_eq!(midi.dropped_messages(), 0);
        }
        assert_eq!(note_ons, 1);
        assert_eq!(note_offs, 1);

        let events: Vec<bool> = monitor.pull_note_events(16).iter().map(|e| e.is_onset).collect();
        assert_eq!(events, vec![true, false]);
    }

    #[test]
    fn test_freeze_flag() {
        let (mut processor, monitor) = prepared();
        let mut midi = MidiBuffer::with_capacity(16);
        let params = Params {
            freeze: true,
            ..test_params()
        };
        processor.process(&[], &params, &mut midi);
        assert!(monitor.is_frozen());
    }

    #[test]
    fn test_empty_input_is_ignored() {
        let (mut processor, _monitor) = prepared();
        let mut midi = MidiBuffer::with_capacity(16);
        processor.process(&[], &test_params(), &mut midi);
        let empty: [f32; 0] = [];
        processor.process(&[&empty[..]], &test_params(), &mut midi);
        assert_eq!(processor.sample_position(), 0);
    }

    #[test]
    fn test_settings_change_reprepares_detector() {
        let (mut processor, _monitor) = prepared();
        let mut midi = MidiBuffer::with_capacity(16);
        assert_eq!(processor.detector().max_period(), 735);

        let params = Params {
            min_freq: 100.0,
            ..test_params()
        };
        let silence = vec![0.0; BLOCK];
        processor.process(&[&silence[..]], &params, &mut midi);
        assert_eq!(processor.detector().max_period(), 441);
    }

    #[test]
    fn test_reset_releases_notes() {
        let (mut processor, mut monitor) = prepared();
        let params = test_params();
        let mut midi = MidiBuffer::with_capacity(16);
        for block in 0..10 {
            let input = sine(440.0, 0.5, block * BLOCK, BLOCK);
            processor.process(&[&input[..]], &params, &mut midi);
        }
        assert!(processor.tracker().is_sounding(69));
        monitor.pull_note_events(16);

        midi.clear();
        processor.reset(&mut midi);
        assert_eq!(midi.len(), 1);
        assert_eq!(midi.messages()[0].to_bytes(), [0x80, 69, 0]);
        let events = monitor.pull_note_events(16);
        assert_eq!(events.len(), 1);
        assert!(!events[0].is_onset);
        assert!(!processor.tracker().is_sounding(69));
    }

    #[test]
    fn test_unprepared_processor_is_silent() {
        let (mut processor, mut monitor) = NoteProcessor::new(8);
        let mut midi = MidiBuffer::with_capacity(16);
        for block in 0..10 {
            let input = sine(440.0, 0.5, block * BLOCK, BLOCK);
            processor.process(&[&input[..]], &test_params(), &mut midi);
            assert!(midi.is_empty());
        }
        assert!(monitor.pull_note_events(16).is_empty());
    }
}
