//! Broadcast of producer messages to every live client session.
//!
//! [`Fanout`] owns the [`SessionRegistry`]. The realtime gateway registers
//! and unregisters sessions; the producer listener calls
//! [`Fanout::publish`]. Both hold a clone of the same `Fanout`.

use std::sync::Arc;

use tokio::sync::mpsc;

use super::session_registry::{SessionHandle, SessionRegistry};
use super::{Message, SessionId};

/// Receiving side handed to a newly registered session.
#[derive(Debug)]
pub struct Subscription {
    /// Identifier assigned at registration.
    pub id: SessionId,
    /// Messages published while the session is registered, in publish order.
    pub receiver: mpsc::Receiver<Message>,
}

/// Process-wide fanout of [`Message`]s to client sessions.
///
/// Each session gets a bounded queue of `queue_capacity` messages. Publishing
/// never waits on a session: a full or closed queue counts as a failed
/// delivery, and the session is dropped from the registry. Dropping the
/// queue's sender is what closes the session on the gateway side.
#[derive(Debug, Clone)]
pub struct Fanout {
    registry: Arc<SessionRegistry>,
    queue_capacity: usize,
}

impl Fanout {
    /// Creates a fanout with an empty registry.
    ///
    /// A `queue_capacity` of zero is treated as one.
    #[must_use]
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            registry: Arc::new(SessionRegistry::new()),
            queue_capacity: queue_capacity.max(1),
        }
    }

    /// Registers a new session and returns its receiving side.
    ///
    /// The session only sees messages published after this call returns.
    /// After [`Fanout::close_all`] the returned receiver is already closed.
    pub async fn register(&self) -> Subscription {
        let id = SessionId::new();
        let (sender, receiver) = mpsc::channel(self.queue_capacity);
        if self.registry.insert(SessionHandle::new(id, sender)).await {
            tracing::debug!(session = %id, "session registered");
        } else {
            tracing::debug!(session = %id, "fanout closed, session refused");
        }
        Subscription { id, receiver }
    }

    /// Removes a session. Returns `false` if it was already gone.
    pub async fn unregister(&self, id: SessionId) -> bool {
        let removed = self.registry.remove(id).await;
        if removed {
            tracing::debug!(session = %id, "session unregistered");
        }
        removed
    }

    /// Delivers `message` to every session registered at call time.
    ///
    /// Sessions are visited in registration order. A failed delivery is not
    /// retried and does not affect the remaining sessions; the failing
    /// session is unregistered afterwards. With no sessions this is a no-op.
    ///
    /// Returns the number of sessions the message was handed to.
    pub async fn publish(&self, message: Message) -> usize {
        let sessions = self.registry.snapshot().await;
        let mut delivered = 0;
        let mut failed = Vec::new();

        for session in &sessions {
            match session.try_deliver(message.clone()) {
                Ok(()) => delivered += 1,
                Err(reason) => {
                    tracing::warn!(
                        session = %session.id(),
                        reason = reason.as_str(),
                        "delivery failed, closing session"
                    );
                    failed.push(session.id());
                }
            }
        }

        self.registry.remove_many(&failed).await;
        delivered
    }

    /// Returns the number of live sessions.
    pub async fn session_count(&self) -> usize {
        self.registry.count().await
    }

    /// Unregisters every session, closing them, and refuses any session
    /// registered later. Used on shutdown.
    pub async fn close_all(&self) -> usize {
        let closed = self.registry.close().await;
        if closed > 0 {
            tracing::info!(sessions = closed, "closed all sessions");
        }
        closed
    }
}
