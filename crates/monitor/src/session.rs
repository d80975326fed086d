//! Monitoring session state machine

use crate::{MonitorError, Sample, SampleSource, SessionDuration, Verdict};
use camera_capture::VideoFrame;
use chrono::{DateTime, Utc};
use ring_buffer::RingBuffer;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Session shared between the capture loop and request handlers.
///
/// Every start, tick and verdict goes through this one lock.
pub type SharedSession = Arc<Mutex<MonitoringSession>>;

/// Session phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    #[default]
    Idle,
    Monitoring,
}

/// Most recent monitoring window; kept after expiry for the final verdict
#[derive(Debug, Clone)]
struct Window {
    id: Uuid,
    started_at: Instant,
    started_at_utc: DateTime<Utc>,
    duration: SessionDuration,
}

/// What a tick did with its frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// No window open; frame not classified
    Idle,
    /// Sample appended to the buffer
    Recorded { sample: Sample, expired: bool },
    /// No usable face (or classifier failure); buffer unchanged
    Skipped { expired: bool },
}

impl TickOutcome {
    /// Whether this tick closed the window
    pub fn expired(&self) -> bool {
        match self {
            TickOutcome::Idle => false,
            TickOutcome::Recorded { expired, .. } | TickOutcome::Skipped { expired } => *expired,
        }
    }
}

/// Read-only snapshot of the session
#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
    pub state: SessionPhase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<SessionDuration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_secs: Option<f64>,
    pub remaining_secs: f64,
    pub samples: usize,
    pub capacity: usize,
    pub total_samples: usize,
}

/// Emotion monitoring session.
///
/// Idle until `start`; while monitoring, each tick classifies its frame and
/// the first tick at or past the window length returns it to idle.
pub struct MonitoringSession {
    buffer: RingBuffer<Sample>,
    phase: SessionPhase,
    window: Option<Window>,
}

impl MonitoringSession {
    /// Create an idle session with the given buffer capacity
    pub fn new(capacity: usize) -> Result<Self, MonitorError> {
        Ok(Self {
            buffer: RingBuffer::new(capacity)?,
            phase: SessionPhase::Idle,
            window: None,
        })
    }

    /// Wrap into the shared handle used by the capture loop and the API
    pub fn into_shared(self) -> SharedSession {
        Arc::new(Mutex::new(self))
    }

    /// Open a new window now, discarding any previous one
    pub fn start(&mut self, duration: SessionDuration) -> Uuid {
        self.start_at(duration, Instant::now())
    }

    /// Open a new window at `now`, discarding any previous one
    pub fn start_at(&mut self, duration: SessionDuration, now: Instant) -> Uuid {
        if self.phase == SessionPhase::Monitoring {
            info!("Restarting monitoring; discarding {} samples", self.buffer.len());
        }

        let id = Uuid::new_v4();
        self.buffer.clear();
        self.window = Some(Window {
            id,
            started_at: now,
            started_at_utc: Utc::now(),
            duration,
        });
        self.phase = SessionPhase::Monitoring;

        metrics::counter!("emotion_monitor_sessions_started_total").increment(1);
        metrics::gauge!("emotion_monitor_buffer_len").set(0.0);
        info!("Monitoring session {} started for {}s", id, duration);
        id
    }

    /// Classify `frame` if a window is open, then check for expiry
    pub fn tick<S>(&mut self, frame: &VideoFrame, source: &mut S) -> TickOutcome
    where
        S: SampleSource + ?Sized,
    {
        self.tick_at(frame, source, Instant::now())
    }

    pub fn tick_at<S>(&mut self, frame: &VideoFrame, source: &mut S, now: Instant) -> TickOutcome
    where
        S: SampleSource + ?Sized,
    {
        if self.phase != SessionPhase::Monitoring {
            return TickOutcome::Idle;
        }

        let sample = match source.sample(frame) {
            Ok(sample) => sample,
            Err(e) => {
                warn!("Frame {} classification failed: {}", frame.sequence, e);
                None
            }
        };
        self.record(sample, now)
    }

    /// Apply an already classified frame outcome at `now`
    pub fn record(&mut self, sample: Option<Sample>, now: Instant) -> TickOutcome {
        if self.phase != SessionPhase::Monitoring {
            return TickOutcome::Idle;
        }

        if let Some(sample) = sample {
            self.buffer.push(sample);
            metrics::counter!("emotion_monitor_samples_total").increment(1);
            metrics::gauge!("emotion_monitor_buffer_len").set(self.buffer.len() as f64);
            debug!("Sample {} {:.3} ({} buffered)", sample.emotion, sample.score, self.buffer.len());
        } else {
            metrics::counter!("emotion_monitor_frames_skipped_total").increment(1);
        }

        let expired = self.expire_if_elapsed(now);
        match sample {
            Some(sample) => TickOutcome::Recorded { sample, expired },
            None => TickOutcome::Skipped { expired },
        }
    }

    fn expire_if_elapsed(&mut self, now: Instant) -> bool {
        let Some(window) = &self.window else {
            return false;
        };
        if now.saturating_duration_since(window.started_at) < window.duration.as_duration() {
            return false;
        }

        self.phase = SessionPhase::Idle;
        metrics::counter!("emotion_monitor_sessions_expired_total").increment(1);
        info!(
            "Monitoring session {} finished with {} samples",
            window.id,
            self.buffer.len()
        );
        true
    }

    /// Verdict over the current buffer; `None` until a sample is buffered
    pub fn verdict(&self) -> Option<Verdict> {
        let window = self.window.as_ref()?;
        Verdict::from_samples(&self.buffer, window.duration)
    }

    /// Close the window; buffered samples stay readable
    pub fn stop(&mut self) {
        if self.phase == SessionPhase::Monitoring {
            info!("Monitoring stopped");
        }
        self.phase = SessionPhase::Idle;
    }

    pub fn is_monitoring(&self) -> bool {
        self.phase == SessionPhase::Monitoring
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn session_id(&self) -> Option<Uuid> {
        self.window.as_ref().map(|w| w.id)
    }

    pub fn duration(&self) -> Option<SessionDuration> {
        self.window.as_ref().map(|w| w.duration)
    }

    /// Number of buffered samples
    pub fn sample_count(&self) -> usize {
        self.buffer.len()
    }

    /// Buffered samples, oldest first
    pub fn samples(&self) -> impl Iterator<Item = &Sample> {
        self.buffer.iter()
    }

    /// Most recently buffered sample
    pub fn latest_sample(&self) -> Option<&Sample> {
        self.buffer.latest()
    }

    pub fn status(&self) -> SessionStatus {
        self.status_at(Instant::now())
    }

    pub fn status_at(&self, now: Instant) -> SessionStatus {
        let elapsed = self
            .window
            .as_ref()
            .map(|w| now.saturating_duration_since(w.started_at).as_secs_f64());
        let remaining = match (&self.window, elapsed) {
            (Some(w), Some(elapsed)) if self.is_monitoring() => {
                (w.duration.as_secs_f64() - elapsed).max(0.0)
            }
            _ => 0.0,
        };

        SessionStatus {
            state: self.phase,
            session_id: self.session_id(),
            started_at: self.window.as_ref().map(|w| w.started_at_utc),
            duration_secs: self.duration(),
            elapsed_secs: elapsed,
            remaining_secs: remaining,
            samples: self.buffer.len(),
            capacity: self.buffer.capacity(),
            total_samples: self.buffer.total_written(),
        }
    }
}

impl Default for MonitoringSession {
    fn default() -> Self {
        Self {
            buffer: RingBuffer::with_default_capacity(),
            phase: SessionPhase::Idle,
            window: None,
        }
    }
}
