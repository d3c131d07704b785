//! Communication between the audio thread and a (non real time) monitor,
//! such as a GUI drawing a piano roll.
//!
//! Note events are passed through a wait free single producer, single consumer
//! queue. The RMS level and the freeze flag are shared through atomics.
//! The audio thread never blocks: if the queue is full, new events are dropped.

use atomic_float::AtomicF32;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::notes::NoteEvent;

/// Scalar state shared by both ends of a monitor channel.
#[derive(Debug, Default)]
pub struct MonitorState {
    rms_level: AtomicF32,
    frozen: AtomicBool,
    dropped_events: AtomicUsize,
}

/// Creates a connected sender (for the audio thread) and monitor (for any
/// other thread). The queue holds at least one event.
pub fn monitor_channel(capacity: usize) -> (NoteEventSender, NoteMonitor) {
    let (producer, consumer) = rtrb::RingBuffer::<NoteEvent>::new(capacity.max(1)).split();
    let state = Arc::new(MonitorState::default());
    (
        NoteEventSender {
            producer,
            state: Arc::clone(&state),
        },
        NoteMonitor { consumer, state },
    )
}

/// The audio thread end of a monitor channel.
pub struct NoteEventSender {
    producer: rtrb::Producer<NoteEvent>,
    state: Arc<MonitorState>,
}

impl NoteEventSender {
    /// Queues an event. Returns false, dropping the event, if the queue is full.
    pub fn push(&mut self, event: NoteEvent) -> bool {
        match self.producer.push(event) {
            Ok(()) => true,
            Err(_) => {
                self.state.dropped_events.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    pub fn set_rms_level(&self, rms_level: f32) {
        self.state.rms_level.store(rms_level, Ordering::Relaxed);
    }

    pub fn set_frozen(&self, frozen: bool) {
        self.state.frozen.store(frozen, Ordering::Relaxed);
    }
}

/// The monitor end of a monitor channel.
pub struct NoteMonitor {
    consumer: rtrb::Consumer<NoteEvent>,
    state: Arc<MonitorState>,
}

impl NoteMonitor {
    /// Drains up to `max_count` queued events, oldest first.
    pub fn pull_note_events(&mut self, max_count: usize) -> Vec<NoteEvent> {
        let mut events = Vec::new();
        while events.len() < max_count {
            match self.consumer.pop() {
                Ok(event) => events.push(event),
                Err(_) => break,
            }
        }
        events
    }

    /// Drains queued events into `events`, oldest first, without allocating.
    /// Returns the number of events written.
    pub fn pull_into(&mut self, events: &mut [NoteEvent]) -> usize {
        let mut count = 0;
        for slot in events.iter_mut() {
            match self.consumer.pop() {
                Ok(event) => *slot = event,
                Err(_) => break,
            }
            count += 1;
        }
        count
    }

    /// The RMS level of the most recently processed block.
    pub fn rms_level(&self) -> f32 {
        self.state.rms_level.load(Ordering::Relaxed)
    }

    /// True if the monitor display should be frozen.
    pub fn is_frozen(&self) -> bool {
        self.state.frozen.load(Ordering::Relaxed)
    }

    /// The total number of events dropped because the queue was full.
    pub fn dropped_events(&self) -> usize {
        self.state.dropped_events.load(Ordering::Relaxed)
    }
}
