//! Events broadcast as the tracker's observable state changes
//!
//! Subscribed IPC clients receive these as push notifications; internally
//! they ride a tokio broadcast channel from the recognizer task.

use serde::{Deserialize, Serialize};

use crate::tracker::{Modality, Sample};

/// Events emitted by the recognizer as tracking state evolves
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TrackerEvent {
    /// Tracking was started (or restarted)
    TrackingStarted {
        /// Update cadence requested of the activity source, milliseconds
        interval_hint_ms: u64,
        /// Confidence gate applied to incoming samples
        min_confidence: u8,
    },

    /// Tracking was stopped and the log cleared
    TrackingStopped {
        /// Duration in milliseconds that tracking was active
        duration_ms: u64,
    },

    /// An accepted sample differed from the previous one
    ModalityChanged {
        /// Modality before this sample (Unknown when the log was empty)
        previous: Modality,
        /// The newly accepted sample
        sample: Sample,
    },
}

impl std::fmt::Display for TrackerEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackerEvent::TrackingStarted {
                interval_hint_ms,
                min_confidence,
            } => {
                write!(
                    f,
                    "TRACKING_STARTED (interval {}ms, gate {})",
                    interval_hint_ms, min_confidence
                )
            }
            TrackerEvent::TrackingStopped { duration_ms } => {
                write!(f, "TRACKING_STOPPED ({}ms)", duration_ms)
            }
            TrackerEvent::ModalityChanged { previous, sample } => {
                write!(f, "MODALITY_CHANGED ({} -> {})", previous, sample)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let event = TrackerEvent::TrackingStarted {
            interval_hint_ms: 1000,
            min_confidence: 70,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("tracking_started"));
        assert!(json.contains("1000"));
        assert!(json.contains("70"));
    }

    #[test]
    fn test_event_deserialization() {
        let json = r#"{"type":"tracking_stopped","duration_ms":2500}"#;
        let event: TrackerEvent = serde_json::from_str(json).unwrap();
        assert!(matches!(
            event,
            TrackerEvent::TrackingStopped { duration_ms: 2500 }
        ));
    }

    #[test]
    fn test_modality_changed_carries_sample() {
        let event = TrackerEvent::ModalityChanged {
            previous: Modality::Walking,
            sample: Sample {
                modality: Modality::Running,
                confidence: 85,
                timestamp_ms: 123,
            },
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("modality_changed"));
        assert!(json.contains("\"previous\":\"walking\""));
        assert!(json.contains("\"modality\":\"running\""));
    }
}
