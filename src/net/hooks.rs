//! Per-protocol connection hooks.
//!
//! Upper protocol layers register hooks to see every connection of their
//! protocol being opened and released, e.g. to account or refuse clients,
//! and to allocate the messages received on them.

use thiserror::Error;

use crate::net::connection::{Connection, ConnectionId, MessageRef};

/// Refusal returned by [`ConnectionHooks::on_init`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("connection rejected: {0}")]
pub struct HookError(pub String);

pub trait ConnectionHooks: Send + Sync {
    /// Called once a connection has been allocated, before it is bound to a
    /// peer. An error releases the connection.
    fn on_init(&self, _id: ConnectionId, _conn: &Connection) -> Result<(), HookError> {
        Ok(())
    }

    /// Produce the message the connection starts receiving next. `None`
    /// leaves the connection without a message.
    fn on_msg_alloc(&self, _id: ConnectionId, _conn: &Connection) -> Option<MessageRef> {
        None
    }

    /// Called right before a connection is released.
    fn on_destruct(&self, _id: ConnectionId, _conn: &Connection) {}
}
