use criterion::{black_box, criterion_group, criterion_main, Criterion};
use micro_note::acf::{PitchDetector, Settings};
use micro_note::notes::{NoteTracker, TrackerConfig};
use micro_note::{MidiBuffer, NoteProcessor, Params};

const SAMPLE_RATE: f32 = 44100.0;

fn sine(frequency: f32, sample_count: usize) -> Vec<f32> {
    (0..sample_count)
        .map(|i| 0.5 * (2.0 * core::f32::consts::PI * frequency * (i as f32) / SAMPLE_RATE).sin())
        .collect()
}

fn run_detector_benchmark(id: &str, c: &mut Criterion, settings: Settings) {
    let mut detector = PitchDetector::new(SAMPLE_RATE, &settings).unwrap();
    // One analysis cycle per iteration.
    let input_buffer = sine(220.0, detector.input_exec_period());

    c.bench_function(id, |b| {
        b.iter(|| detector.process(black_box(&input_buffer[..]), |detection| {
            black_box(detection);
        }))
    });
}

fn detector_benchmarks(c: &mut Criterion) {
    for bins in [4, 16, 32].iter() {
        let settings = Settings {
            max_bins_per_octave: *bins,
            ..Settings::default()
        };
        run_detector_benchmark(&format!("Min freq 60, {} bins per octave", bins), c, settings);
    }
    for down_sample in [2, 4, 8].iter() {
        let settings = Settings {
            down_sample: *down_sample,
            ..Settings::default()
        };
        run_detector_benchmark(&format!("Min freq 60, downsampling {}", down_sample), c, settings);
    }
    let settings = Settings {
        min_freq: 30.0,
        ..Settings::default()
    };
    run_detector_benchmark("Min freq 30, 16 bins per octave", c, settings);
}

fn tracker_benchmarks(c: &mut Criterion) {
    let mut tracker = NoteTracker::new(TrackerConfig::from_seconds(SAMPLE_RATE, 0.01, 5.0, 0.05, 0));
    let detection = micro_note::acf::Detection {
        frequency: 440.0,
        amplitude: 0.5,
        confidence: 1.0,
        sample_offset: 100,
    };
    let mut block_start = 0;
    c.bench_function("Tracker block", |b| {
        b.iter(|| {
            black_box(tracker.process_block(&[detection], block_start, 512, 0.3));
            block_start += 512;
        })
    });
}

fn processor_benchmarks(c: &mut Criterion) {
    let params = Params::default();
    let block_size = 512;
    let (mut processor, _monitor) = NoteProcessor::new(16);
    processor.prepare(SAMPLE_RATE, block_size, &params).unwrap();
    let input = sine(440.0, block_size);
    let mut midi = MidiBuffer::with_capacity(16);
    c.bench_function("Processor, stereo block 512", |b| {
        b.iter(|| processor.process(black_box(&[&input[..], &input[..]]), &params, &mut midi))
    });
}

criterion_group!(benches, detector_benchmarks, tracker_benchmarks, processor_benchmarks);
criterion_main!(benches);
