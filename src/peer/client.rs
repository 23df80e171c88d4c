//! Clients handling.

use std::fmt;

use crate::net::{Connection, ConnectionId, Role};
use crate::peer::slab::SlotKey;
use crate::peer::{PeerHandle, PeerOps};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientId(pub(crate) SlotKey);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cli-{}", self.0)
    }
}

/// A client peer. Holds at most one connection.
#[derive(Debug)]
pub struct Client {
    id: ClientId,
    conn: Option<ConnectionId>,
}

impl Client {
    pub(crate) fn new(id: ClientId) -> Self {
        Self { id, conn: None }
    }

    pub fn id(&self) -> ClientId {
        self.id
    }

    pub fn conn(&self) -> Option<ConnectionId> {
        self.conn
    }

    fn validate(&self, id: ConnectionId, conn: &Connection) {
        assert!(
            conn.conn_type().has_role(Role::Client),
            "{id} of type {:?} cannot be bound to client {}",
            conn.conn_type(),
            self.id
        );

        // The client and the connection are either linked with each other or
        // not linked at all.
        assert_eq!(
            self.conn.is_none(),
            conn.peer().is_none(),
            "{} and {id} are half-linked (client.conn={:?}, conn.peer={:?})",
            self.id,
            self.conn,
            conn.peer()
        );
        if let Some(bound) = self.conn {
            assert_eq!(bound, id, "{} already holds {bound}, cannot take {id}", self.id);
            assert_eq!(conn.peer(), Some(self.handle()), "{id} points at {:?}, not {}", conn.peer(), self.id);
        }
    }
}

impl PeerOps for Client {
    fn handle(&self) -> PeerHandle {
        PeerHandle::Client(self.id)
    }

    fn connections(&self) -> &[ConnectionId] {
        self.conn.as_slice()
    }

    fn attach_conn(&mut self, id: ConnectionId, conn: &mut Connection) {
        self.validate(id, conn);

        tracing::debug!(client = %self.id, conn = %id, "Attach connection to client");

        self.conn = Some(id);
        conn.bind(self.handle());
    }

    fn detach_conn(&mut self, id: ConnectionId, conn: &mut Connection) {
        self.validate(id, conn);

        tracing::debug!(client = %self.id, conn = %id, "Detach connection from client");

        if self.conn.is_none() {
            tracing::warn!(client = %self.id, conn = %id, "The connection is not attached to the client");
        }

        conn.unbind();
        self.conn = None;
    }
}
