use crate::audio::error::{AudioError, AudioResult};
use crate::codec::DecodedChunk;
use crate::playback::sink::AudioSink;
use tracing::{debug, info};

/// A chunk that is scheduled-in-future or playing-now.
///
/// Finished units are reaped from the live set; the scheduler owns the
/// set exclusively.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackUnit {
    /// Monotonic identifier, for logging
    pub id: u64,
    /// Start time on the playback clock, seconds
    pub start: f64,
    /// End time on the playback clock, seconds
    pub end: f64,
}

/// Gapless, interruptible playback scheduler
///
/// Accepts decoded chunks in arrival order and lines them up back to
/// back on the sink's playback clock. A single cursor tracks where the
/// next chunk begins; when the clock has already passed the cursor the
/// chunk starts immediately instead (the gap is audible silence, not an
/// error). `interrupt` drops everything queued and resets the cursor to
/// now.
pub struct PlaybackScheduler<S: AudioSink> {
    /// Output sink (None once shut down)
    sink: Option<S>,
    /// Where the next chunk should begin, seconds on the playback clock
    cursor: f64,
    /// Live units: scheduled-in-future or playing-now
    live: Vec<PlaybackUnit>,
    next_id: u64,
}

impl<S: AudioSink> PlaybackScheduler<S> {
    /// Wrap a sink with a fresh cursor at the current clock time.
    pub fn new(sink: S) -> Self {
        let cursor = sink.now();
        Self {
            sink: Some(sink),
            cursor,
            live: Vec::new(),
            next_id: 0,
        }
    }

    /// Schedule a chunk for gapless playback after everything already
    /// scheduled.
    ///
    /// # Errors
    /// `AudioError::StreamError` if the scheduler has been shut down;
    /// sink submission errors pass through.
    pub fn schedule(&mut self, chunk: &DecodedChunk) -> AudioResult<()> {
        let Some(sink) = self.sink.as_mut() else {
            return Err(AudioError::StreamError(
                "playback scheduler is shut down".to_string(),
            ));
        };

        let now = sink.now();
        self.live.retain(|unit| unit.end > now);

        if chunk.is_empty() {
            return Ok(());
        }

        // Never schedule in the past: if the clock overtook the cursor,
        // the chunk starts immediately.
        let start = self.cursor.max(now);
        sink.submit(start, chunk)?;

        let end = start + chunk.duration();
        self.cursor = end;

        let id = self.next_id;
        self.next_id += 1;
        debug!(
            "Scheduled unit #{}: {:.3}s..{:.3}s ({} frames)",
            id,
            start,
            end,
            chunk.frames()
        );
        self.live.push(PlaybackUnit { id, start, end });

        Ok(())
    }

    /// Stop every live unit, clear the set and reset the cursor to now.
    ///
    /// Safe to call with nothing scheduled.
    pub fn interrupt(&mut self) {
        if let Some(sink) = self.sink.as_mut() {
            sink.discard_pending();
            self.cursor = sink.now();
        }
        if !self.live.is_empty() {
            info!("Interrupted {} live playback units", self.live.len());
        }
        self.live.clear();
    }

    /// Interrupt, then release the sink. Idempotent.
    pub fn shutdown(&mut self) {
        if self.sink.is_some() {
            self.interrupt();
            self.sink = None;
            info!("Playback scheduler shut down");
        }
    }

    /// Number of units scheduled-in-future or playing-now.
    pub fn live_units(&mut self) -> usize {
        if let Some(sink) = self.sink.as_ref() {
            let now = sink.now();
            self.live.retain(|unit| unit.end > now);
        }
        self.live.len()
    }

    /// Where the next chunk will begin (seconds, playback clock).
    pub fn cursor(&self) -> f64 {
        self.cursor
    }

    /// True once `shutdown` has released the sink.
    pub fn is_shut_down(&self) -> bool {
        self.sink.is_none()
    }
}
