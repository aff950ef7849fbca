//! modality-trackerd: Background daemon tracking the user's movement modality
//!
//! The daemon accepts raw activity-recognition observations, gates them by
//! confidence, and republishes the most recent classification:
//! - Confidence-gated, append-only sample log behind a single lock
//! - Activity feed draining pushed observations into the tracker
//! - IPC server for start/stop/query and event subscriptions
//!
//! Sensing itself is out of scope: whatever platform service classifies
//! motion pushes its (code, confidence, timestamp) tuples over the socket.

mod activity;
mod config;
mod events;
mod ipc;
mod lifecycle;
mod tracker;

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::{broadcast, mpsc};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::activity::ActivityFeed;
use crate::config::Config;
use crate::events::TrackerEvent;
use crate::ipc::Server;
use crate::tracker::ModalityTracker;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "modality-trackerd starting"
    );

    // Load configuration
    let config = Config::load()?;
    config.ensure_dirs()?;
    info!(?config.socket_path, "configuration loaded");

    // The tracker is shared by the feed (writes) and the IPC server (queries)
    let tracker = Arc::new(ModalityTracker::new());

    // Create channels for inter-component communication
    // IPC submit path -> activity feed
    let (update_tx, update_rx) = mpsc::channel(64);
    // Feed and server -> subscribed IPC clients
    let (event_tx, _event_rx) = broadcast::channel::<TrackerEvent>(64);

    if config.start_on_launch {
        tracker
            .start(config.interval_hint_ms, config.min_confidence)
            .context("configured confidence gate is invalid")?;
        let _ = event_tx.send(TrackerEvent::TrackingStarted {
            interval_hint_ms: config.interval_hint_ms,
            min_confidence: config.min_confidence,
        });
    }

    // Create the activity feed over the shared tracker
    let feed = ActivityFeed::new(Arc::clone(&tracker), event_tx.clone());

    // Create the IPC server
    let server = Server::new(
        &config.socket_path,
        Arc::clone(&tracker),
        update_tx,
        event_tx,
    )?;

    info!("daemon initialized, entering main loop");

    // Main event loop
    tokio::select! {
        // Drain pushed observations into the tracker
        _ = feed.run(update_rx) => {
            info!("activity feed exited");
        }

        // Run the IPC server (accepts client connections)
        result = server.run() => {
            if let Err(e) = result {
                error!(?e, "IPC server error");
            }
        }

        // Wait for shutdown signal
        result = lifecycle::wait_for_shutdown() => {
            match result {
                Ok(()) => info!("shutdown signal received"),
                Err(e) => error!(?e, "signal handler failed"),
            }
        }
    }

    // Cleanup
    info!("shutting down...");

    tracker.stop();
    server.shutdown().await;

    info!("modality-trackerd stopped");

    Ok(())
}
