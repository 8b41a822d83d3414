//! Connected-session registry.
//!
//! Sessions are registered when a client's real-time connection is
//! accepted and unregistered when it closes. The registry is injected into
//! the broadcaster (and anything else that needs it) rather than living in
//! a process-wide global, so it can be swapped for a distributed pub/sub
//! backend without touching the services that publish events.

use common::{Role, UserId};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::event::ServerEvent;

/// Unique identifier for one connected session. A user with several open
/// tabs holds several sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub(crate) struct Session {
    pub(crate) user_id: UserId,
    pub(crate) role: Role,
    pub(crate) sender: mpsc::UnboundedSender<ServerEvent>,
}

/// Registry of currently connected sessions.
#[derive(Default)]
pub struct SessionRegistry {
    pub(crate) sessions: DashMap<SessionId, Session>,
}

impl SessionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a session for a connected identity.
    ///
    /// Returns the session id and the receiving end of the session's event
    /// channel; the transport layer drains the receiver into the socket.
    pub fn register(
        &self,
        user_id: UserId,
        role: Role,
    ) -> (SessionId, mpsc::UnboundedReceiver<ServerEvent>) {
        let id = SessionId::new();
        let (sender, receiver) = mpsc::unbounded_channel();
        self.sessions.insert(
            id,
            Session {
                user_id,
                role,
                sender,
            },
        );
        tracing::debug!(session = %id, user = %user_id, "session registered");
        (id, receiver)
    }

    /// Removes a session. Safe to call twice; disconnect paths race with
    /// dead-session pruning.
    pub fn unregister(&self, id: SessionId) {
        if self.sessions.remove(&id).is_some() {
            tracing::debug!(session = %id, "session unregistered");
        }
    }

    /// Number of currently connected sessions.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_unregister() {
        let registry = SessionRegistry::new();
        let (id, _rx) = registry.register(UserId::new(), Role::Customer);
        assert_eq!(registry.session_count(), 1);

        registry.unregister(id);
        assert_eq!(registry.session_count(), 0);

        // second unregister is a no-op
        registry.unregister(id);
        assert_eq!(registry.session_count(), 0);
    }

    #[test]
    fn one_user_may_hold_several_sessions() {
        let registry = SessionRegistry::new();
        let user = UserId::new();
        let (a, _rx_a) = registry.register(user, Role::Customer);
        let (b, _rx_b) = registry.register(user, Role::Customer);
        assert_ne!(a, b);
        assert_eq!(registry.session_count(), 2);
    }
}
