//! Ingestion boundary between the activity source and the tracker
//!
//! Raw updates arrive over an mpsc channel (pushed by IPC clients or any
//! in-process producer) and a single feed task drains them into the tracker,
//! broadcasting a change event whenever the accepted modality moves.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info};

use crate::events::TrackerEvent;
use crate::tracker::{Modality, ModalityTracker, SubmitOutcome};

use super::codes::ActivityUpdate;

/// Drains raw activity updates into the tracker
pub struct ActivityFeed {
    tracker: Arc<ModalityTracker>,
    event_tx: broadcast::Sender<TrackerEvent>,
}

impl ActivityFeed {
    /// Create a feed over the shared tracker
    pub fn new(tracker: Arc<ModalityTracker>, event_tx: broadcast::Sender<TrackerEvent>) -> Self {
        Self { tracker, event_tx }
    }

    /// Run the feed, consuming updates until the channel closes
    pub async fn run(&self, mut update_rx: mpsc::Receiver<ActivityUpdate>) {
        info!("activity feed started");

        while let Some(update) = update_rx.recv().await {
            self.handle_update(update);
        }

        info!("activity feed stopped");
    }

    /// Submit one update and broadcast a change event if warranted
    fn handle_update(&self, update: ActivityUpdate) {
        match self
            .tracker
            .submit(update.code, update.confidence, update.timestamp_ms)
        {
            SubmitOutcome::Accepted {
                sample,
                previous,
                changed: true,
            } => {
                let previous = previous.map(|p| p.modality).unwrap_or(Modality::Unknown);
                info!(%sample, %previous, "modality changed");
                // Send failures just mean nobody is subscribed
                let _ = self.event_tx.send(TrackerEvent::ModalityChanged {
                    previous,
                    sample,
                });
            }
            SubmitOutcome::Accepted { .. } => {}
            SubmitOutcome::Inactive => {
                debug!(code = update.code, "update while inactive, dropped");
            }
            SubmitOutcome::BelowConfidence {
                sample,
                min_confidence,
            } => {
                debug!(%sample, min_confidence, "low-confidence update dropped");
            }
        }
    }
}
