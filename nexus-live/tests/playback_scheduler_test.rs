/// Integration tests for gapless playback scheduling
///
/// Exercises the scheduler through the public `AudioSink` seam with a
/// hand-cranked clock, covering gapless chaining, interruption and the
/// fallen-behind path.

use nexus_live::audio::error::AudioResult;
use nexus_live::codec::DecodedChunk;
use nexus_live::playback::{AudioSink, PlaybackScheduler};
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
struct TestSink {
    clock: Arc<Mutex<f64>>,
    submits: Arc<Mutex<Vec<(f64, f64)>>>,
    discards: Arc<Mutex<usize>>,
}

impl TestSink {
    fn advance(&self, seconds: f64) {
        *self.clock.lock().unwrap() += seconds;
    }

    fn submitted(&self) -> Vec<(f64, f64)> {
        self.submits.lock().unwrap().clone()
    }
}

impl AudioSink for TestSink {
    fn now(&self) -> f64 {
        *self.clock.lock().unwrap()
    }

    fn submit(&mut self, start: f64, chunk: &DecodedChunk) -> AudioResult<()> {
        self.submits
            .lock()
            .unwrap()
            .push((start, chunk.duration()));
        Ok(())
    }

    fn discard_pending(&mut self) {
        *self.discards.lock().unwrap() += 1;
    }
}

fn chunk(seconds: f64) -> DecodedChunk {
    DecodedChunk {
        samples: vec![0.1; (seconds * 24000.0).round() as usize],
        sample_rate: 24000,
        channels: 1,
    }
}

#[test]
fn test_streaming_turn_is_gapless() {
    println!("\n=== Gapless Turn Scheduling ===");

    let sink = TestSink::default();
    let mut scheduler = PlaybackScheduler::new(sink.clone());

    // A turn arrives as many small chunks while the clock runs slower
    // than the audio accumulates.
    for _ in 0..10 {
        scheduler.schedule(&chunk(0.1)).unwrap();
        sink.advance(0.05);
    }

    let submits = sink.submitted();
    println!("Submitted {} chunks", submits.len());

    // Every chunk starts exactly where the previous one ends.
    for window in submits.windows(2) {
        let (start_a, dur_a) = window[0];
        let (start_b, _) = window[1];
        assert!((start_b - (start_a + dur_a)).abs() < 1e-9);
    }

    println!("✓ No gaps between consecutive chunks");
}

#[test]
fn test_late_chunk_starts_at_clock() {
    let sink = TestSink::default();
    let mut scheduler = PlaybackScheduler::new(sink.clone());

    scheduler.schedule(&chunk(0.2)).unwrap();

    // Long silence from the model: the clock sails past the cursor.
    sink.advance(3.0);
    scheduler.schedule(&chunk(0.2)).unwrap();

    let submits = sink.submitted();
    assert_eq!(submits[1].0, 3.0);
    assert_eq!(scheduler.cursor(), 3.2);
}

#[test]
fn test_interrupt_mid_turn() {
    println!("\n=== Mid-Turn Interruption ===");

    let sink = TestSink::default();
    let mut scheduler = PlaybackScheduler::new(sink.clone());

    for _ in 0..5 {
        scheduler.schedule(&chunk(0.5)).unwrap();
    }
    sink.advance(0.3); // inside the first chunk
    assert_eq!(scheduler.live_units(), 5);

    scheduler.interrupt();

    assert_eq!(scheduler.live_units(), 0);
    assert_eq!(*sink.discards.lock().unwrap(), 1);
    assert_eq!(scheduler.cursor(), 0.3);

    // The next turn starts right where the interruption happened.
    scheduler.schedule(&chunk(0.4)).unwrap();
    assert_eq!(sink.submitted().last().unwrap().0, 0.3);

    println!("✓ Interruption cleared queue and reset cursor");
}

#[test]
fn test_repeated_interrupts_are_safe() {
    let sink = TestSink::default();
    let mut scheduler = PlaybackScheduler::new(sink.clone());

    scheduler.interrupt();
    scheduler.interrupt();
    scheduler.schedule(&chunk(0.1)).unwrap();
    scheduler.interrupt();

    assert_eq!(scheduler.live_units(), 0);
    assert_eq!(*sink.discards.lock().unwrap(), 3);
}

#[test]
fn test_live_units_reflect_playback_progress() {
    let sink = TestSink::default();
    let mut scheduler = PlaybackScheduler::new(sink.clone());

    scheduler.schedule(&chunk(0.2)).unwrap();
    scheduler.schedule(&chunk(0.2)).unwrap();
    scheduler.schedule(&chunk(0.2)).unwrap();
    assert_eq!(scheduler.live_units(), 3);

    sink.advance(0.25); // first unit finished
    assert_eq!(scheduler.live_units(), 2);

    sink.advance(0.5); // everything finished
    assert_eq!(scheduler.live_units(), 0);
}

#[test]
fn test_schedule_after_shutdown_fails() {
    let sink = TestSink::default();
    let mut scheduler = PlaybackScheduler::new(sink.clone());

    scheduler.schedule(&chunk(0.1)).unwrap();
    scheduler.shutdown();

    assert!(scheduler.is_shut_down());
    assert!(scheduler.schedule(&chunk(0.1)).is_err());
    assert_eq!(scheduler.live_units(), 0);
}
