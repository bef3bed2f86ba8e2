//! WebSocket session loop.
//!
//! A session is Open from registration until the loop exits, then Closed
//! for good. The loop forwards fanout messages as `data` events, pings the
//! client periodically, and ends on client close, transport error, idle
//! timeout, a write that stalls longer than the idle timeout, or when the
//! fanout drops the session.

use std::time::Duration;

use axum::body::Bytes;
use axum::extract::ws::{Message as WsFrame, WebSocket};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::time::{Instant, MissedTickBehavior};

use super::messages::ServerEvent;
use crate::domain::{Fanout, Subscription};

const MIN_PING_INTERVAL: Duration = Duration::from_millis(100);

/// Keepalive settings for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeepAlive {
    ping_interval: Duration,
    idle_timeout: Duration,
}

impl KeepAlive {
    /// Creates keepalive settings. The ping interval is clamped to at least
    /// 100 ms and the idle timeout to at least one ping interval.
    #[must_use]
    pub fn new(ping_interval: Duration, idle_timeout: Duration) -> Self {
        let ping_interval = ping_interval.max(MIN_PING_INTERVAL);
        Self {
            ping_interval,
            idle_timeout: idle_timeout.max(ping_interval),
        }
    }

    /// Interval between pings.
    #[must_use]
    pub const fn ping_interval(&self) -> Duration {
        self.ping_interval
    }

    /// Silence after which the session is closed.
    #[must_use]
    pub const fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }
}

/// Why a session left the Open state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The client sent a close frame or hung up.
    ClientClosed,
    /// Reading or writing the socket failed.
    TransportError,
    /// Nothing was heard from the client within the idle timeout.
    IdleTimeout,
    /// A write did not complete within the idle timeout.
    WriteTimeout,
    /// The fanout dropped the session (failed delivery or shutdown).
    Dropped,
}

impl CloseReason {
    /// Short label used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ClientClosed => "client_closed",
            Self::TransportError => "transport_error",
            Self::IdleTimeout => "idle_timeout",
            Self::WriteTimeout => "write_timeout",
            Self::Dropped => "dropped",
        }
    }

    /// Whether the server should send a close frame before hanging up.
    ///
    /// A stalled writer gets none: its send buffer is already full.
    const fn server_initiated(self) -> bool {
        matches!(self, Self::IdleTimeout | Self::Dropped)
    }
}

/// Runs one realtime session from registration to close.
pub async fn run_session(socket: WebSocket, fanout: Fanout, keepalive: KeepAlive) {
    let Subscription { id, mut receiver } = fanout.register().await;
    tracing::info!(session = %id, "session open");

    let (mut ws_tx, mut ws_rx) = socket.split();
    let mut last_seen = Instant::now();
    let mut ping =
        tokio::time::interval_at(last_seen + keepalive.ping_interval, keepalive.ping_interval);
    ping.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let reason = loop {
        tokio::select! {
            // Frames from the client only count as liveness.
            frame = ws_rx.next() => {
                match frame {
                    Some(Ok(WsFrame::Close(_))) | None => break CloseReason::ClientClosed,
                    Some(Ok(WsFrame::Text(text))) => {
                        last_seen = Instant::now();
                        tracing::trace!(
                            session = %id,
                            len = text.as_str().len(),
                            "ignoring client message"
                        );
                    }
                    Some(Ok(_)) => last_seen = Instant::now(),
                    Some(Err(e)) => {
                        tracing::debug!(session = %id, error = %e, "session read failed");
                        break CloseReason::TransportError;
                    }
                }
            }
            // Messages from the fanout.
            next = receiver.recv() => {
                let Some(message) = next else {
                    break CloseReason::Dropped;
                };
                let json = match ServerEvent::data(&message).to_json() {
                    Ok(json) => json,
                    Err(e) => {
                        tracing::error!(session = %id, error = %e, "event encoding failed");
                        continue;
                    }
                };
                let frame = WsFrame::text(json);
                if let Err(reason) = send_frame(&mut ws_tx, frame, keepalive).await {
                    break reason;
                }
            }
            _ = ping.tick() => {
                if last_seen.elapsed() >= keepalive.idle_timeout {
                    break CloseReason::IdleTimeout;
                }
                let frame = WsFrame::Ping(Bytes::new());
                if let Err(reason) = send_frame(&mut ws_tx, frame, keepalive).await {
                    break reason;
                }
            }
        }
    };

    fanout.unregister(id).await;
    if reason.server_initiated() {
        let _ = send_frame(&mut ws_tx, WsFrame::Close(None), keepalive).await;
    }
    tracing::info!(session = %id, reason = reason.as_str(), "session closed");
}

/// Writes one frame, giving up once the idle timeout has passed.
async fn send_frame(
    ws_tx: &mut SplitSink<WebSocket, WsFrame>,
    frame: WsFrame,
    keepalive: KeepAlive,
) -> Result<(), CloseReason> {
    match tokio::time::timeout(keepalive.idle_timeout, ws_tx.send(frame)).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => {
            tracing::debug!(error = %e, "session write failed");
            Err(CloseReason::TransportError)
        }
        Err(_) => Err(CloseReason::WriteTimeout),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keepalive_clamps_values() {
        let ka = KeepAlive::new(Duration::ZERO, Duration::ZERO);
        assert_eq!(ka.ping_interval(), MIN_PING_INTERVAL);
        assert_eq!(ka.idle_timeout(), MIN_PING_INTERVAL);

        let ka = KeepAlive::new(Duration::from_secs(25), Duration::from_secs(60));
        assert_eq!(ka.ping_interval(), Duration::from_secs(25));
        assert_eq!(ka.idle_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn only_server_side_closes_send_close_frame() {
        assert!(CloseReason::Dropped.server_initiated());
        assert!(CloseReason::IdleTimeout.server_initiated());
        assert!(!CloseReason::ClientClosed.server_initiated());
        assert!(!CloseReason::TransportError.server_initiated());
        assert!(!CloseReason::WriteTimeout.server_initiated());
    }
}
