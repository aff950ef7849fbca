//! Unix domain socket server for IPC
//!
//! Serves request-response queries against the shared tracker, forwards
//! submitted observations into the activity feed, and pushes tracker events
//! to subscribed clients.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{unix::OwnedWriteHalf, UnixListener, UnixStream};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};

use crate::activity::ActivityUpdate;
use crate::events::TrackerEvent;
use crate::tracker::ModalityTracker;

use super::protocol::{Notification, Request, Response, TrackerStatus};

/// Upper bound on a single IPC message body
const MAX_MESSAGE_LEN: usize = 1024 * 1024;

/// IPC server handling client connections
pub struct Server {
    socket_path: PathBuf,
    listener: Option<UnixListener>,
    ctx: Arc<ServerCtx>,
    shutdown_tx: broadcast::Sender<()>,
}

/// Shared handles every client task needs
struct ServerCtx {
    tracker: Arc<ModalityTracker>,
    /// Submitted observations go to the activity feed through here
    update_tx: mpsc::Sender<ActivityUpdate>,
    /// Administrative transitions and modality changes broadcast from here
    event_tx: broadcast::Sender<TrackerEvent>,
    start_time: Instant,
}

impl Server {
    /// Bind the server socket
    pub fn new(
        socket_path: &Path,
        tracker: Arc<ModalityTracker>,
        update_tx: mpsc::Sender<ActivityUpdate>,
        event_tx: broadcast::Sender<TrackerEvent>,
    ) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent).context("failed to create socket directory")?;
        }

        // Remove stale socket if it exists
        if socket_path.exists() {
            std::fs::remove_file(socket_path).context("failed to remove stale socket")?;
        }

        let listener = UnixListener::bind(socket_path).context("failed to bind Unix socket")?;

        // Owner-only socket (0600)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(socket_path, std::fs::Permissions::from_mode(0o600))?;
        }

        let (shutdown_tx, _) = broadcast::channel(1);

        info!(?socket_path, "IPC server listening");

        Ok(Self {
            socket_path: socket_path.to_owned(),
            listener: Some(listener),
            ctx: Arc::new(ServerCtx {
                tracker,
                update_tx,
                event_tx,
                start_time: Instant::now(),
            }),
            shutdown_tx,
        })
    }

    /// Run the server, accepting connections
    pub async fn run(&self) -> Result<()> {
        let listener = self.listener.as_ref().context("server not initialized")?;

        loop {
            match listener.accept().await {
                Ok((stream, _addr)) => {
                    debug!("client connected");
                    let ctx = Arc::clone(&self.ctx);
                    let mut shutdown_rx = self.shutdown_tx.subscribe();

                    tokio::spawn(async move {
                        tokio::select! {
                            result = handle_client(stream, ctx) => {
                                if let Err(e) = result {
                                    warn!(?e, "client handler error");
                                }
                            }
                            _ = shutdown_rx.recv() => {
                                debug!("client handler shutting down");
                            }
                        }
                    });
                }
                Err(e) => {
                    error!(?e, "accept error");
                }
            }
        }
    }

    /// Gracefully shutdown the server
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());

        // Remove socket file
        if self.socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.socket_path) {
                warn!(?e, "failed to remove socket file");
            }
        }

        info!("IPC server shutdown complete");
    }
}

/// Handle a single client connection.
///
/// Requests are answered in order on the read loop; a dedicated writer task
/// owns the write half so that event notifications never interleave with a
/// response mid-frame.
async fn handle_client(stream: UnixStream, ctx: Arc<ServerCtx>) -> Result<()> {
    let (mut reader, writer) = stream.into_split();
    let (out_tx, out_rx) = mpsc::channel::<Vec<u8>>(32);
    tokio::spawn(write_outbound(writer, out_rx));

    let mut len_buf = [0u8; 4];
    let mut is_subscribed = false;

    loop {
        // Read message length (4-byte little-endian)
        match reader.read_exact(&mut len_buf).await {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                debug!("client disconnected");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        }

        let len = u32::from_le_bytes(len_buf) as usize;
        if len > MAX_MESSAGE_LEN {
            warn!(len, "message too large, disconnecting");
            return Ok(());
        }

        // Read message body
        let mut msg_buf = vec![0u8; len];
        reader.read_exact(&mut msg_buf).await?;

        // Parse request
        let request: Request =
            serde_json::from_slice(&msg_buf).context("failed to parse request")?;

        debug!(?request, "received request");

        // Process request
        let (response, subscribe) = process_request(request, &ctx).await;
        if subscribe && !is_subscribed {
            is_subscribed = true;
            spawn_event_forwarder(&ctx, out_tx.clone());
            debug!("client subscribed to notifications");
        }

        // Send response
        if out_tx.send(serde_json::to_vec(&response)?).await.is_err() {
            debug!("writer closed, disconnecting");
            return Ok(());
        }
    }
}

/// Writer task: frames and writes every outbound message for one client
async fn write_outbound(mut writer: OwnedWriteHalf, mut out_rx: mpsc::Receiver<Vec<u8>>) {
    while let Some(msg_bytes) = out_rx.recv().await {
        let msg_len = (msg_bytes.len() as u32).to_le_bytes();
        let write = async {
            writer.write_all(&msg_len).await?;
            writer.write_all(&msg_bytes).await
        };
        if let Err(e) = write.await {
            debug!(?e, "client write failed");
            return;
        }
    }
}

/// Forward broadcast tracker events to one subscribed client
fn spawn_event_forwarder(ctx: &ServerCtx, out_tx: mpsc::Sender<Vec<u8>>) {
    let mut event_rx = ctx.event_tx.subscribe();

    tokio::spawn(async move {
        loop {
            match event_rx.recv().await {
                Ok(event) => {
                    let notification = Notification::Event(event);
                    let bytes = match serde_json::to_vec(&notification) {
                        Ok(bytes) => bytes,
                        Err(e) => {
                            error!(?e, "failed to encode notification");
                            continue;
                        }
                    };
                    if out_tx.send(bytes).await.is_err() {
                        // Client gone
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(skipped = n, "event forwarder lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    break;
                }
            }
        }
    });
}

/// Process a request and return a response.
/// Returns (Response, should_subscribe)
async fn process_request(request: Request, ctx: &ServerCtx) -> (Response, bool) {
    match request {
        Request::Ping => (Response::Pong, false),

        Request::GetStatus => {
            let status = TrackerStatus::from_snapshot(
                ctx.tracker.snapshot(),
                ctx.start_time.elapsed().as_secs(),
            );
            (Response::Status(status), false)
        }

        Request::StartTracking {
            interval_hint_ms,
            min_confidence,
        } => match ctx.tracker.start(interval_hint_ms, min_confidence) {
            Ok(()) => {
                let _ = ctx.event_tx.send(TrackerEvent::TrackingStarted {
                    interval_hint_ms,
                    min_confidence,
                });
                (Response::Started, false)
            }
            Err(e) => (
                Response::Error {
                    code: "invalid_argument".to_string(),
                    message: e.to_string(),
                },
                false,
            ),
        },

        Request::StopTracking => {
            if let Some(duration_ms) = ctx.tracker.stop() {
                let _ = ctx
                    .event_tx
                    .send(TrackerEvent::TrackingStopped { duration_ms });
            }
            (Response::Stopped, false)
        }

        Request::GetCurrent => (Response::Current(ctx.tracker.current()), false),

        Request::Submit {
            code,
            confidence,
            timestamp,
        } => {
            let update = ActivityUpdate {
                code,
                confidence,
                timestamp_ms: timestamp,
            };
            if ctx.update_tx.send(update).await.is_err() {
                (
                    Response::Error {
                        code: "unavailable".to_string(),
                        message: "activity feed is not running".to_string(),
                    },
                    false,
                )
            } else {
                (Response::Submitted, false)
            }
        }

        Request::Subscribe => (Response::Subscribed, true),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::Modality;

    fn create_ctx() -> (Arc<ServerCtx>, mpsc::Receiver<ActivityUpdate>) {
        let (update_tx, update_rx) = mpsc::channel(8);
        let (event_tx, _) = broadcast::channel(16);
        let ctx = Arc::new(ServerCtx {
            tracker: Arc::new(ModalityTracker::new()),
            update_tx,
            event_tx,
            start_time: Instant::now(),
        });
        (ctx, update_rx)
    }

    #[tokio::test]
    async fn test_ping_pong() {
        let (ctx, _update_rx) = create_ctx();
        let (response, subscribe) = process_request(Request::Ping, &ctx).await;
        assert!(matches!(response, Response::Pong));
        assert!(!subscribe);
    }

    #[tokio::test]
    async fn test_start_then_current_via_requests() {
        let (ctx, _update_rx) = create_ctx();

        let (response, _) = process_request(
            Request::StartTracking {
                interval_hint_ms: 1000,
                min_confidence: 70,
            },
            &ctx,
        )
        .await;
        assert!(matches!(response, Response::Started));

        ctx.tracker.submit(8, 80, 1_000); // RUNNING
        let (response, _) = process_request(Request::GetCurrent, &ctx).await;
        match response {
            Response::Current(sample) => {
                assert_eq!(sample.modality, Modality::Running);
                assert_eq!(sample.confidence, 80);
            }
            other => panic!("unexpected response {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_invalid_gate_is_error_response() {
        let (ctx, _update_rx) = create_ctx();

        let (response, _) = process_request(
            Request::StartTracking {
                interval_hint_ms: 1000,
                min_confidence: 130,
            },
            &ctx,
        )
        .await;
        match response {
            Response::Error { code, .. } => assert_eq!(code, "invalid_argument"),
            other => panic!("unexpected response {other:?}"),
        }
        assert!(!ctx.tracker.is_active());
    }

    #[tokio::test]
    async fn test_submit_forwards_to_feed_channel() {
        let (ctx, mut update_rx) = create_ctx();

        let (response, _) = process_request(
            Request::Submit {
                code: 1,
                confidence: 90,
                timestamp: 42,
            },
            &ctx,
        )
        .await;
        assert!(matches!(response, Response::Submitted));

        let update = update_rx.recv().await.unwrap();
        assert_eq!(update.code, 1);
        assert_eq!(update.confidence, 90);
        assert_eq!(update.timestamp_ms, 42);
    }

    #[tokio::test]
    async fn test_stop_emits_event_once() {
        let (ctx, _update_rx) = create_ctx();
        let mut event_rx = ctx.event_tx.subscribe();

        ctx.tracker.start(1000, 50).unwrap();
        let (response, _) = process_request(Request::StopTracking, &ctx).await;
        assert!(matches!(response, Response::Stopped));
        assert!(matches!(
            event_rx.try_recv().unwrap(),
            TrackerEvent::TrackingStopped { .. }
        ));

        // Stopping again: still Stopped, but no second event
        let (response, _) = process_request(Request::StopTracking, &ctx).await;
        assert!(matches!(response, Response::Stopped));
        assert!(event_rx.try_recv().is_err());
    }
}
