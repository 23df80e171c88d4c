//! Backend servers handling.
//!
//! A server owns a pool of outbound connections. Requests are dispatched
//! over the pool in round-robin order.

use std::fmt;
use std::net::SocketAddr;

use crate::load_balancer::RoundRobin;
use crate::net::{Connection, ConnectionId, Role};
use crate::peer::slab::{Slab, SlotKey};
use crate::peer::{PeerHandle, PeerOps};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ServerId(pub(crate) SlotKey);

impl fmt::Display for ServerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "srv-{}", self.0)
    }
}

#[derive(Debug)]
pub struct Server {
    id: ServerId,
    addr: SocketAddr,
    pool: Vec<ConnectionId>,
    rr: RoundRobin,
}

impl Server {
    pub(crate) fn new(id: ServerId, addr: SocketAddr) -> Self {
        Self {
            id,
            addr,
            pool: Vec::new(),
            rr: RoundRobin::new(),
        }
    }

    pub fn id(&self) -> ServerId {
        self.id
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Next pooled connection in round-robin order.
    pub fn pick_conn(&self) -> Option<ConnectionId> {
        self.rr.next(&self.pool).copied()
    }

    pub(crate) fn take_pool(&mut self) -> Vec<ConnectionId> {
        std::mem::take(&mut self.pool)
    }

    fn validate(&self, id: ConnectionId, conn: &Connection) {
        assert!(
            conn.conn_type().has_role(Role::Server),
            "{id} of type {:?} cannot be bound to server {}",
            conn.conn_type(),
            self.id
        );
        if let Some(peer) = conn.peer() {
            assert_eq!(peer, self.handle(), "{id} is bound to {peer}, not {}", self.id);
        }
    }

    /// Every pooled connection exists and points back at this server.
    pub(crate) fn validate_pool(&self, conns: &Slab<Connection>) {
        for &id in &self.pool {
            let conn = conns
                .get(id.0)
                .unwrap_or_else(|| panic!("{} pools freed connection {id}", self.id));
            assert_eq!(
                conn.peer(),
                Some(self.handle()),
                "{id} in the pool of {} points at {:?}",
                self.id,
                conn.peer()
            );
        }
    }
}

impl fmt::Display for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "srv {}: {}", self.id.0, self.addr)
    }
}

impl PeerOps for Server {
    fn handle(&self) -> PeerHandle {
        PeerHandle::Server(self.id)
    }

    fn connections(&self) -> &[ConnectionId] {
        &self.pool
    }

    fn attach_conn(&mut self, id: ConnectionId, conn: &mut Connection) {
        self.validate(id, conn);

        if conn.peer().is_some() {
            assert!(self.pool.contains(&id), "{id} points at {} but is not pooled", self.id);
            return;
        }

        tracing::debug!(server = %self, conn = %id, "Attach connection to server");

        self.pool.push(id);
        conn.bind(self.handle());
    }

    fn detach_conn(&mut self, id: ConnectionId, conn: &mut Connection) {
        self.validate(id, conn);

        let Some(pos) = self.pool.iter().position(|&c| c == id) else {
            tracing::warn!(server = %self, conn = %id, "The connection is not attached to the server");
            assert!(conn.peer().is_none(), "{id} points at {} but is not pooled", self.id);
            return;
        };

        tracing::debug!(server = %self, conn = %id, "Detach connection from server");

        self.pool.remove(pos);
        conn.unbind();
    }
}
