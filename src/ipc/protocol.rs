//! IPC message protocol definitions
//!
//! All messages are JSON-encoded, prefixed with a 4-byte little-endian length.

use serde::{Deserialize, Serialize};

use crate::events::TrackerEvent;
use crate::tracker::{Sample, TrackerSnapshot};

/// Requests from clients to the daemon
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Ping to check connectivity
    Ping,

    /// Request current daemon status
    GetStatus,

    /// Begin modality tracking
    StartTracking {
        /// Update cadence to request of the activity source, milliseconds
        interval_hint_ms: u64,
        /// Discard samples below this confidence, 0-100
        min_confidence: u8,
    },

    /// Stop modality tracking and clear the sample log
    StopTracking,

    /// Fetch the most recent accepted modality sample
    GetCurrent,

    /// Push one raw activity observation (the activity source's delivery path)
    Submit {
        /// Raw platform activity code
        code: i32,
        /// Classification certainty, 0-100
        confidence: u8,
        /// Observation time, milliseconds since the epoch
        timestamp: i64,
    },

    /// Subscribe to tracker event notifications
    Subscribe,
}

/// Responses from daemon to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Pong response to ping
    Pong,

    /// Current daemon status
    Status(TrackerStatus),

    /// Tracking started
    Started,

    /// Tracking stopped (or was already stopped)
    Stopped,

    /// The most recent accepted sample, or the Unknown sentinel
    Current(Sample),

    /// Observation enqueued for the tracker
    Submitted,

    /// Subscription confirmed
    Subscribed,

    /// Error response
    Error { code: String, message: String },
}

/// Push notification to subscribed clients.
///
/// Tagged with `kind` so the envelope does not collide with the inner
/// event's own `type` tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    /// A tracker event occurred
    Event(TrackerEvent),
}

/// Full daemon status snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerStatus {
    /// Daemon version
    pub version: String,

    /// Whether tracking is active
    pub active: bool,

    /// Confidence gate applied to incoming samples
    pub min_confidence: u8,

    /// Update cadence requested of the activity source, milliseconds
    pub interval_hint_ms: u64,

    /// Samples accepted into the log this session
    pub accepted: u64,

    /// Samples dropped this session (gate or inactive)
    pub discarded: u64,

    /// Daemon uptime in seconds
    pub uptime_secs: u64,
}

impl TrackerStatus {
    /// Build a status message from a tracker snapshot
    pub fn from_snapshot(snapshot: TrackerSnapshot, uptime_secs: u64) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            active: snapshot.active,
            min_confidence: snapshot.min_confidence,
            interval_hint_ms: snapshot.interval_hint_ms,
            accepted: snapshot.accepted,
            discarded: snapshot.discarded,
            uptime_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::Modality;

    #[test]
    fn test_request_serialization() {
        let req = Request::StartTracking {
            interval_hint_ms: 1000,
            min_confidence: 70,
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("start_tracking"));
        assert!(json.contains("70"));
    }

    #[test]
    fn test_submit_request_roundtrip() {
        let json = r#"{"type":"submit","code":8,"confidence":80,"timestamp":1000}"#;
        let req: Request = serde_json::from_str(json).unwrap();
        assert!(matches!(
            req,
            Request::Submit {
                code: 8,
                confidence: 80,
                timestamp: 1000
            }
        ));
    }

    #[test]
    fn test_current_response_serialization() {
        let resp = Response::Current(Sample {
            modality: Modality::Cycling,
            confidence: 90,
            timestamp_ms: 42,
        });
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("current"));
        assert!(json.contains("\"modality\":\"cycling\""));
    }

    #[test]
    fn test_notification_serialization() {
        let notification = Notification::Event(TrackerEvent::TrackingStopped { duration_ms: 10 });
        let json = serde_json::to_string(&notification).unwrap();
        assert!(json.contains("\"kind\":\"event\""));
        assert!(json.contains("\"type\":\"tracking_stopped\""));
    }
}
