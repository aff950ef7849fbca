//! Raw activity-code constants and the update tuple the source delivers
//!
//! The numeric values follow the platform activity-recognition service that
//! feeds the daemon; the tracker never interprets them beyond the fixed
//! code-to-modality mapping.

use serde::{Deserialize, Serialize};

/// The device is in a road vehicle
pub const IN_VEHICLE: i32 = 0;
/// The device is on a bicycle
pub const ON_BICYCLE: i32 = 1;
/// The device is on foot (walking or running, unspecified)
pub const ON_FOOT: i32 = 2;
/// The device is still
pub const STILL: i32 = 3;
/// The service could not classify the activity
pub const UNKNOWN: i32 = 4;
/// The device angle changed sharply (picked up, turned over)
pub const TILTING: i32 = 5;
/// The device is on a walking user
pub const WALKING: i32 = 7;
/// The device is on a running user
pub const RUNNING: i32 = 8;

/// One raw observation as delivered by the activity source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityUpdate {
    /// Raw platform activity code
    pub code: i32,
    /// Classification certainty, 0-100
    pub confidence: u8,
    /// Wall-clock time of the observation, milliseconds since the epoch
    #[serde(rename = "timestamp")]
    pub timestamp_ms: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_serialization() {
        let update = ActivityUpdate {
            code: ON_BICYCLE,
            confidence: 90,
            timestamp_ms: 42,
        };
        let json = serde_json::to_string(&update).unwrap();
        assert!(json.contains("\"code\":1"));
        assert!(json.contains("\"timestamp\":42"));
    }
}
