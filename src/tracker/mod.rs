//! Modality tracking module
//!
//! Holds the confidence-gated, most-recent-wins sample log and the closed
//! set of modality labels it classifies into.

mod modality;
mod recognizer;

pub use modality::{Modality, Sample};
pub use recognizer::{now_ms, ModalityTracker, SubmitOutcome, TrackerError, TrackerSnapshot};
