//! Concurrent storage for live client sessions.
//!
//! [`SessionRegistry`] keeps one [`SessionHandle`] per open realtime
//! session behind a single [`tokio::sync::RwLock`]. Sessions are kept in
//! insertion order. The expected population is dozens of sessions, so a
//! coarse lock around a `Vec` is sufficient.

use tokio::sync::RwLock;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use super::{Message, SessionId};

/// Why a message could not be handed to a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryFailure {
    /// The session's outbound queue is full.
    QueueFull,
    /// The session's writer has gone away.
    Closed,
}

impl DeliveryFailure {
    /// Short label used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::QueueFull => "queue_full",
            Self::Closed => "closed",
        }
    }
}

/// Sending half of one session's outbound queue.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    id: SessionId,
    sender: mpsc::Sender<Message>,
}

impl SessionHandle {
    /// Wraps the sending half of a session queue.
    #[must_use]
    pub const fn new(id: SessionId, sender: mpsc::Sender<Message>) -> Self {
        Self { id, sender }
    }

    /// Returns the session identifier.
    #[must_use]
    pub const fn id(&self) -> SessionId {
        self.id
    }

    /// Enqueues `message` without waiting.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryFailure`] if the queue is full or the receiving
    /// side has been dropped.
    pub fn try_deliver(&self, message: Message) -> Result<(), DeliveryFailure> {
        self.sender.try_send(message).map_err(|e| match e {
            TrySendError::Full(_) => DeliveryFailure::QueueFull,
            TrySendError::Closed(_) => DeliveryFailure::Closed,
        })
    }
}

/// Registry contents guarded by the lock.
#[derive(Debug, Default)]
struct Sessions {
    handles: Vec<SessionHandle>,
    closed: bool,
}

/// Set of live sessions, in insertion order.
///
/// Once [`SessionRegistry::close`] has run the registry stays closed and
/// refuses new sessions.
#[derive(Debug)]
pub struct SessionRegistry {
    sessions: RwLock<Sessions>,
}

impl SessionRegistry {
    /// Creates an empty, open registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(Sessions::default()),
        }
    }

    /// Appends a session.
    ///
    /// Returns `false`, dropping the handle, if the registry is closed.
    pub async fn insert(&self, handle: SessionHandle) -> bool {
        let mut sessions = self.sessions.write().await;
        if sessions.closed {
            return false;
        }
        sessions.handles.push(handle);
        true
    }

    /// Removes the session with the given ID.
    ///
    /// Returns `false` if it was not registered.
    pub async fn remove(&self, id: SessionId) -> bool {
        self.remove_many(&[id]).await > 0
    }

    /// Removes every listed session, returning how many were present.
    pub async fn remove_many(&self, ids: &[SessionId]) -> usize {
        if ids.is_empty() {
            return 0;
        }
        let mut sessions = self.sessions.write().await;
        let before = sessions.handles.len();
        sessions.handles.retain(|handle| !ids.contains(&handle.id));
        before - sessions.handles.len()
    }

    /// Copies the current membership.
    ///
    /// Later inserts and removals do not affect the returned snapshot.
    pub async fn snapshot(&self) -> Vec<SessionHandle> {
        self.sessions.read().await.handles.clone()
    }

    /// Removes all sessions and refuses any later insert.
    ///
    /// Returns how many sessions were removed.
    pub async fn close(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        sessions.closed = true;
        let count = sessions.handles.len();
        sessions.handles.clear();
        count
    }

    /// Returns the number of live sessions.
    pub async fn count(&self) -> usize {
        self.sessions.read().await.handles.len()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
