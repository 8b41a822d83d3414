//! Audience-scoped event fan-out.

use std::sync::Arc;

use common::{Role, UserId};

use crate::event::ServerEvent;
use crate::registry::SessionRegistry;

/// Which sessions an event is delivered to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    /// Every connected session.
    All,
    /// All sessions of one user.
    User(UserId),
    /// All sessions whose identity carries the role.
    Role(Role),
    /// Sessions of one user plus all sessions with the role. Used for
    /// order events that both the owner and administrators watch; a session
    /// matching both still receives the event once.
    UserOrRole(UserId, Role),
}

impl Audience {
    fn matches(&self, user_id: UserId, role: Role) -> bool {
        match self {
            Audience::All => true,
            Audience::User(id) => *id == user_id,
            Audience::Role(r) => *r == role,
            Audience::UserOrRole(id, r) => *id == user_id || *r == role,
        }
    }
}

/// Fans domain events out to connected sessions.
///
/// Delivery is best-effort and at most once: a session whose channel is
/// closed is dropped from the registry and the event is simply not seen by
/// it. Publishing never fails into the caller.
#[derive(Clone)]
pub struct Broadcaster {
    registry: Arc<SessionRegistry>,
}

impl Broadcaster {
    /// Creates a broadcaster over an injected session registry.
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self { registry }
    }

    /// The registry this broadcaster delivers through.
    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Delivers `event` to every session in `audience`.
    ///
    /// Returns the number of sessions the event was handed to. Sessions
    /// with a closed channel are pruned, not reported as errors.
    pub fn publish(&self, audience: Audience, event: &ServerEvent) -> usize {
        let mut delivered = 0;
        let mut dead = Vec::new();

        for entry in self.registry.sessions.iter() {
            let session = entry.value();
            if !audience.matches(session.user_id, session.role) {
                continue;
            }
            if session.sender.send(event.clone()).is_ok() {
                delivered += 1;
            } else {
                dead.push(*entry.key());
            }
        }

        for id in dead {
            tracing::warn!(session = %id, kind = event.kind(), "dropping dead session");
            self.registry.unregister(id);
        }

        metrics::counter!("events_published_total", "kind" => event.kind()).increment(1);
        delivered
    }
}
