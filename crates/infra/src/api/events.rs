//! Session lifecycle notifications
//!
//! The client never navigates or redirects; hosts subscribe and react.

use tokio::sync::broadcast;
use tracing::trace;

const DEFAULT_CAPACITY: usize = 16;

/// Change in the state of the stored session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Credentials accepted and the session persisted
    LoggedIn { username: String },
    /// Access token replaced after a 401
    TokenRefreshed,
    /// Explicit logout cleared a session
    LoggedOut,
    /// The session was cleared because it could not be renewed
    Terminated { reason: String },
}

/// Broadcast handle shared by the client and its subscribers
#[derive(Debug, Clone)]
pub(crate) struct SessionEvents {
    sender: broadcast::Sender<SessionEvent>,
}

impl SessionEvents {
    pub(crate) fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }

    /// Publish to current subscribers; having none is fine.
    pub(crate) fn publish(&self, event: SessionEvent) {
        match self.sender.send(event) {
            Ok(receivers) => trace!(receivers, "session event published"),
            Err(broadcast::error::SendError(event)) => {
                trace!(?event, "session event dropped, no subscribers");
            }
        }
    }
}

impl Default for SessionEvents {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
