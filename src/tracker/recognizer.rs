//! Core modality tracker implementation
//!
//! Maintains an append-only log of confidence-gated samples behind a single
//! lock and answers "what is the current modality" with the most recent entry.

use std::sync::Mutex;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use tracing::{debug, info};

use super::modality::{Modality, Sample};

/// Errors surfaced by tracker administration calls
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("minimum confidence must be within 0-100, got {0}")]
    InvalidConfidence(u8),
}

/// What happened to a submitted observation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The sample passed the gate and was appended to the log.
    /// `changed` is true when it differs from the previous accepted sample
    /// (modality or confidence; timestamps are never compared).
    Accepted {
        sample: Sample,
        /// Last accepted sample before this one, None when the log was empty
        previous: Option<Sample>,
        changed: bool,
    },
    /// Tracking is not active; the sample was dropped
    Inactive,
    /// The sample's confidence fell below the configured gate
    BelowConfidence { sample: Sample, min_confidence: u8 },
}

/// Point-in-time view of the tracker, for status reporting
#[derive(Debug, Clone, Copy)]
pub struct TrackerSnapshot {
    pub active: bool,
    pub min_confidence: u8,
    pub interval_hint_ms: u64,
    pub accepted: u64,
    pub discarded: u64,
}

/// State guarded by the tracker's lock
struct TrackerState {
    active: bool,
    min_confidence: u8,
    interval_hint_ms: u64,
    /// Accepted samples in arrival order; append-only between resets
    samples: Vec<Sample>,
    /// Samples dropped since the last start (gate or inactive)
    discarded: u64,
    /// When the current tracking session began
    started_at: Option<Instant>,
}

/// Thread-safe tracker of the user's current movement modality.
///
/// Producers call [`submit`](Self::submit) with raw activity observations;
/// readers call [`current`](Self::current). Every mutation runs under one
/// mutex covering the full read-modify-write, so a submit racing a stop
/// either sees the tracker inactive or lands before the clear.
pub struct ModalityTracker {
    state: Mutex<TrackerState>,
}

impl ModalityTracker {
    /// Create an inactive tracker with an empty log
    pub fn new() -> Self {
        Self {
            state: Mutex::new(TrackerState {
                active: false,
                min_confidence: 0,
                interval_hint_ms: 0,
                samples: Vec::new(),
                discarded: 0,
                started_at: None,
            }),
        }
    }

    /// Begin tracking, discarding observations below `min_confidence`.
    ///
    /// `interval_hint_ms` is the cadence requested of the activity source; the
    /// tracker records it for status reporting but runs no timer of its own.
    /// Calling start while already active restarts the log.
    pub fn start(&self, interval_hint_ms: u64, min_confidence: u8) -> Result<(), TrackerError> {
        if min_confidence > 100 {
            return Err(TrackerError::InvalidConfidence(min_confidence));
        }

        let mut state = self.lock();
        if state.active {
            debug!("tracker already active, restarting log");
        }
        state.active = true;
        state.min_confidence = min_confidence;
        state.interval_hint_ms = interval_hint_ms;
        state.samples = Vec::new();
        state.discarded = 0;
        state.started_at = Some(Instant::now());

        info!(interval_hint_ms, min_confidence, "modality tracking started");
        Ok(())
    }

    /// Stop tracking and clear the log.
    ///
    /// Stopping a tracker that was never started (or is already stopped) is
    /// a logged no-op. Returns how long the session was active, or None when
    /// the call was a no-op.
    pub fn stop(&self) -> Option<u64> {
        let mut state = self.lock();
        if !state.active {
            debug!("stop called on inactive tracker, ignoring");
            return None;
        }
        state.active = false;
        state.samples.clear();
        let duration_ms = state
            .started_at
            .take()
            .map(|t| t.elapsed().as_millis() as u64)
            .unwrap_or(0);

        info!(duration_ms, "modality tracking stopped");
        Some(duration_ms)
    }

    /// Submit a raw activity observation.
    ///
    /// The code is mapped through the fixed lookup (unmapped codes become
    /// [`Modality::Unknown`]); observations below the gate or arriving while
    /// inactive are dropped without error. Accepted samples are appended even
    /// when they duplicate the previous one.
    pub fn submit(&self, code: i32, confidence: u8, timestamp_ms: i64) -> SubmitOutcome {
        let sample = Sample::from_raw(code, confidence, timestamp_ms);

        let mut state = self.lock();
        if !state.active {
            state.discarded += 1;
            debug!(%sample, "tracker inactive, dropping sample");
            return SubmitOutcome::Inactive;
        }
        if confidence < state.min_confidence {
            state.discarded += 1;
            debug!(
                %sample,
                min_confidence = state.min_confidence,
                "dropping sample below confidence gate"
            );
            return SubmitOutcome::BelowConfidence {
                sample,
                min_confidence: state.min_confidence,
            };
        }

        let previous = state.samples.last().copied();
        let changed = previous.map_or(true, |last| last != sample);
        state.samples.push(sample);

        debug!(%sample, changed, "sample accepted");
        SubmitOutcome::Accepted {
            sample,
            previous,
            changed,
        }
    }

    /// The most recently accepted sample.
    ///
    /// An empty log (fresh, restarted, or stopped tracker) yields the
    /// sentinel `Unknown` at full confidence, stamped with the current time.
    pub fn current(&self) -> Sample {
        let state = self.lock();
        match state.samples.last() {
            Some(sample) => *sample,
            None => Sample {
                modality: Modality::Unknown,
                confidence: 100,
                timestamp_ms: now_ms(),
            },
        }
    }

    /// Whether tracking is active
    pub fn is_active(&self) -> bool {
        self.lock().active
    }

    /// Snapshot of the tracker's administrative state and counters
    pub fn snapshot(&self) -> TrackerSnapshot {
        let state = self.lock();
        TrackerSnapshot {
            active: state.active,
            min_confidence: state.min_confidence,
            interval_hint_ms: state.interval_hint_ms,
            accepted: state.samples.len() as u64,
            discarded: state.discarded,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, TrackerState> {
        // Every mutation is a single append or flag flip, so the state stays
        // consistent even across a panic; a poisoned guard is still usable.
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Default for ModalityTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Current wall-clock time in milliseconds since the epoch
pub fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
