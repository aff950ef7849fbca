//! Modality labels and the samples that carry them
//!
//! The label set is closed: it mirrors what the upstream activity-recognition
//! service can produce plus the transport modes the query surface promises.

use serde::{Deserialize, Serialize};

use crate::activity::codes;

/// A classified mode of movement or transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modality {
    /// Classification is unknown or ambiguous (tilting, unmapped codes)
    Unknown,
    /// Stationary or still
    Stationary,
    /// Walking
    Walking,
    /// Running
    Running,
    /// Riding a regular bike
    Cycling,
    /// Riding a sports bike
    SportsCycling,
    /// Riding an electric bike
    EBike,
    /// Riding a motorcycle
    Motorcycle,
    /// Riding a car
    Car,
    /// Taking the bus
    Bus,
    /// Taking the train
    Train,
    /// Taking the tram
    Tram,
    /// Taking the subway
    Subway,
}

impl Default for Modality {
    fn default() -> Self {
        Self::Unknown
    }
}

impl std::fmt::Display for Modality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Modality::Unknown => "Unknown",
            Modality::Stationary => "Stationary",
            Modality::Walking => "Walking",
            Modality::Running => "Running",
            Modality::Cycling => "Cycling",
            Modality::SportsCycling => "SportsCycling",
            Modality::EBike => "EBike",
            Modality::Motorcycle => "Motorcycle",
            Modality::Car => "Car",
            Modality::Bus => "Bus",
            Modality::Train => "Train",
            Modality::Tram => "Tram",
            Modality::Subway => "Subway",
        };
        write!(f, "{name}")
    }
}

impl Modality {
    /// Map a raw platform activity code to a modality.
    ///
    /// Total over all codes: anything outside the known set maps to Unknown.
    pub fn from_activity_code(code: i32) -> Self {
        match code {
            codes::IN_VEHICLE => Modality::Car,
            codes::ON_BICYCLE => Modality::Cycling,
            codes::ON_FOOT | codes::WALKING => Modality::Walking,
            codes::STILL => Modality::Stationary,
            codes::RUNNING => Modality::Running,
            codes::TILTING | codes::UNKNOWN => Modality::Unknown,
            _ => Modality::Unknown,
        }
    }
}

/// One timestamped modality observation.
///
/// Immutable once constructed. Two samples are considered equal when their
/// modality and confidence match; the timestamp is deliberately excluded so
/// that back-to-back identical classifications compare equal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Sample {
    /// The classified modality
    pub modality: Modality,
    /// Classification certainty, 0-100
    pub confidence: u8,
    /// Wall-clock time of the observation, milliseconds since the epoch
    #[serde(rename = "timestamp")]
    pub timestamp_ms: i64,
}

impl Sample {
    /// Build a sample directly from a raw activity code.
    pub fn from_raw(code: i32, confidence: u8, timestamp_ms: i64) -> Self {
        Self {
            modality: Modality::from_activity_code(code),
            confidence,
            timestamp_ms,
        }
    }
}

impl PartialEq for Sample {
    fn eq(&self, other: &Self) -> bool {
        self.modality == other.modality && self.confidence == other.confidence
    }
}

impl Eq for Sample {}

impl std::fmt::Display for Sample {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({}% @ {})",
            self.modality, self.confidence, self.timestamp_ms
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_code_mapping() {
        assert_eq!(
            Modality::from_activity_code(codes::ON_BICYCLE),
            Modality::Cycling
        );
        assert_eq!(Modality::from_activity_code(codes::IN_VEHICLE), Modality::Car);
        assert_eq!(Modality::from_activity_code(codes::ON_FOOT), Modality::Walking);
        assert_eq!(Modality::from_activity_code(codes::WALKING), Modality::Walking);
        assert_eq!(Modality::from_activity_code(codes::RUNNING), Modality::Running);
        assert_eq!(Modality::from_activity_code(codes::STILL), Modality::Stationary);
        assert_eq!(Modality::from_activity_code(codes::TILTING), Modality::Unknown);
        assert_eq!(Modality::from_activity_code(codes::UNKNOWN), Modality::Unknown);
    }

    #[test]
    fn test_unmapped_code_is_unknown() {
        assert_eq!(Modality::from_activity_code(9999), Modality::Unknown);
        assert_eq!(Modality::from_activity_code(-1), Modality::Unknown);
    }

    #[test]
    fn test_sample_equality_ignores_timestamp() {
        let a = Sample::from_raw(codes::RUNNING, 80, 1_000);
        let b = Sample::from_raw(codes::RUNNING, 80, 2_000);
        let c = Sample::from_raw(codes::RUNNING, 81, 1_000);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_sample_serialization_field_names() {
        let sample = Sample::from_raw(codes::STILL, 95, 1_700_000_000_000);
        let json = serde_json::to_string(&sample).unwrap();
        assert!(json.contains("\"modality\":\"stationary\""));
        assert!(json.contains("\"confidence\":95"));
        assert!(json.contains("\"timestamp\":1700000000000"));
    }
}
