//! Real-time fan-out of domain events to connected sessions.
//!
//! The [`SessionRegistry`] tracks connected sessions with an explicit
//! register/unregister lifecycle; the [`Broadcaster`] delivers
//! [`ServerEvent`]s to an [`Audience`] best-effort, at most once, and prunes
//! sessions whose receiving side has gone away.

pub mod broadcaster;
pub mod event;
pub mod registry;

pub use broadcaster::{Audience, Broadcaster};
pub use event::{OrderNotice, ServerEvent};
pub use registry::{SessionId, SessionRegistry};
