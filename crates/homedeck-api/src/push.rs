//! Push channel with auto-reconnect.
//!
//! Connects to the dashboard backend's websocket endpoint and streams
//! decoded [`PushMessage`] frames through a [`tokio::sync::broadcast`]
//! channel. On connection loss it schedules exactly one reconnection
//! attempt after a fixed delay and retries forever -- dashboards are
//! long-lived operator consoles, so there is no retry cap and no
//! backoff growth.
//!
//! # Example
//!
//! ```rust,ignore
//! use homedeck_api::push::{PushChannel, RetryPolicy, push_endpoint};
//! use tokio_util::sync::CancellationToken;
//! use url::Url;
//!
//! let base = Url::parse("http://localhost:8083")?;
//! let cancel = CancellationToken::new();
//! let channel = PushChannel::open(
//!     push_endpoint(&base)?,
//!     RetryPolicy::fixed(std::time::Duration::from_secs(3)),
//!     cancel.clone(),
//! );
//! let mut rx = channel.subscribe();
//!
//! while let Ok(msg) = rx.recv().await {
//!     println!("{msg:?}");
//! }
//!
//! channel.shutdown();
//! ```

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::{broadcast, watch};
use tokio_tungstenite::tungstenite;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::Error;
use crate::types::PushMessage;

// ── Broadcast channel capacity ───────────────────────────────────────

const MESSAGE_CHANNEL_CAPACITY: usize = 1024;

// ── ConnectionState ──────────────────────────────────────────────────

/// Observable state of the push connection.
///
/// `Closed` is only reached at shutdown; while the channel is alive a
/// lost connection goes straight back to `Connecting` (with the retry
/// delay interposed).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
}

// ── RetryPolicy ──────────────────────────────────────────────────────

/// Reconnection delay policy, kept as a pure function of the attempt
/// number so it is testable apart from the socket plumbing.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    delay: Duration,
}

impl RetryPolicy {
    /// Fixed delay for every attempt. Production configuration for
    /// both dashboard profiles.
    pub const fn fixed(delay: Duration) -> Self {
        Self { delay }
    }

    /// Delay to wait before the given reconnection attempt.
    pub fn delay_for(&self, _attempt: u32) -> Duration {
        self.delay
    }
}

// ── Endpoint derivation ──────────────────────────────────────────────

/// Derive the websocket endpoint from the dashboard base URL:
/// `http` becomes `ws`, `https` becomes `wss`, path `/ws`.
pub fn push_endpoint(base_url: &Url) -> Result<Url, Error> {
    let mut url = base_url.clone();

    let scheme = match base_url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => {
            return Err(Error::PushConnect(format!(
                "unsupported scheme {other:?} for push endpoint"
            )));
        }
    };

    url.set_scheme(scheme)
        .map_err(|()| Error::PushConnect("cannot set websocket scheme".into()))?;
    url.set_path("/ws");
    url.set_query(None);
    url.set_fragment(None);

    Ok(url)
}

// ── PushChannel ──────────────────────────────────────────────────────

/// Handle to a running push-channel task.
///
/// Subscribe for decoded messages, watch the connection state, and
/// call [`shutdown`](Self::shutdown) to tear the task down.
pub struct PushChannel {
    message_rx: broadcast::Receiver<Arc<PushMessage>>,
    state_rx: watch::Receiver<ConnectionState>,
    cancel: CancellationToken,
}

impl PushChannel {
    /// Spawn the connect/read/reconnect loop against `ws_url`.
    ///
    /// Returns immediately; the first connection attempt happens
    /// asynchronously. Cancel `cancel` (or call `shutdown`) to stop.
    pub fn open(ws_url: Url, policy: RetryPolicy, cancel: CancellationToken) -> Self {
        let (message_tx, message_rx) = broadcast::channel(MESSAGE_CHANNEL_CAPACITY);
        let (state_tx, state_rx) = watch::channel(ConnectionState::Connecting);

        let task_cancel = cancel.clone();
        tokio::spawn(async move {
            channel_loop(ws_url, message_tx, state_tx, policy, task_cancel).await;
        });

        Self {
            message_rx,
            state_rx,
            cancel,
        }
    }

    /// Get a new broadcast receiver for decoded push messages.
    ///
    /// Multiple consumers can subscribe concurrently. A consumer that
    /// falls behind receives [`broadcast::error::RecvError::Lagged`].
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<PushMessage>> {
        self.message_rx.resubscribe()
    }

    /// Watch connection state transitions.
    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    /// Signal the background task to shut down.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

// ── Background reconnection loop ─────────────────────────────────────

/// Main loop: connect → read → on loss, wait the fixed delay → connect
/// again. A fresh disconnect replaces the pending delay (there is only
/// ever one sleep in flight) so close events can never stack attempts.
async fn channel_loop(
    ws_url: Url,
    message_tx: broadcast::Sender<Arc<PushMessage>>,
    state_tx: watch::Sender<ConnectionState>,
    policy: RetryPolicy,
    cancel: CancellationToken,
) {
    let mut attempt: u32 = 0;

    loop {
        let _ = state_tx.send(ConnectionState::Connecting);

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            result = connect_and_read(&ws_url, &message_tx, &state_tx, &cancel) => {
                match result {
                    Ok(()) => {
                        tracing::info!("push channel disconnected, reconnecting");
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, attempt, "push channel error");
                    }
                }

                // Back to `Connecting` for the duration of the delay --
                // the channel never parks in a terminal state while alive.
                let _ = state_tx.send(ConnectionState::Connecting);
                let delay = policy.delay_for(attempt);
                tracing::debug!(
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    attempt,
                    "waiting before reconnect"
                );

                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    () = tokio::time::sleep(delay) => {}
                }

                attempt = attempt.wrapping_add(1);
            }
        }
    }

    let _ = state_tx.send(ConnectionState::Closed);
    tracing::debug!("push channel loop exiting");
}

// ── Single connection lifecycle ──────────────────────────────────────

/// Establish one websocket connection and read frames until it drops.
async fn connect_and_read(
    url: &Url,
    message_tx: &broadcast::Sender<Arc<PushMessage>>,
    state_tx: &watch::Sender<ConnectionState>,
    cancel: &CancellationToken,
) -> Result<(), Error> {
    tracing::info!(url = %url, "connecting to push channel");

    let (ws_stream, _response) = tokio_tungstenite::connect_async(url.as_str())
        .await
        .map_err(|e| Error::PushConnect(e.to_string()))?;

    tracing::info!("push channel connected");
    let _ = state_tx.send(ConnectionState::Open);

    let (_write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(()),
            frame = read.next() => {
                match frame {
                    Some(Ok(tungstenite::Message::Text(text))) => {
                        decode_and_broadcast(&text, message_tx);
                    }
                    Some(Ok(tungstenite::Message::Ping(_))) => {
                        // tungstenite answers pings automatically
                        tracing::trace!("push channel ping");
                    }
                    Some(Ok(tungstenite::Message::Close(frame))) => {
                        if let Some(ref cf) = frame {
                            tracing::info!(
                                code = %cf.code,
                                reason = %cf.reason,
                                "push channel close frame received"
                            );
                        } else {
                            tracing::info!("push channel close frame received (no payload)");
                        }
                        return Ok(());
                    }
                    Some(Err(e)) => {
                        return Err(Error::PushConnect(e.to_string()));
                    }
                    None => {
                        tracing::info!("push channel stream ended");
                        return Ok(());
                    }
                    _ => {
                        // Binary, Pong, Frame -- ignore
                    }
                }
            }
        }
    }
}

// ── Frame decoding ───────────────────────────────────────────────────

/// Decode one text frame and broadcast it. Malformed frames are logged
/// and dropped; they never tear down the connection.
fn decode_and_broadcast(text: &str, message_tx: &broadcast::Sender<Arc<PushMessage>>) {
    match serde_json::from_str::<PushMessage>(text) {
        Ok(msg) => {
            // Send errors just mean no active subscribers right now
            let _ = message_tx.send(Arc::new(msg));
        }
        Err(e) => {
            tracing::debug!(error = %e, "dropping malformed push frame");
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────
