//! Peer and connection registry.
//!
//! # Responsibilities
//! - Own every client, server and connection in fixed-capacity slabs
//! - Keep both ends of a peer/connection binding in sync
//! - Index servers by address
//! - Run per-protocol connection hooks on open and release
//!
//! # Design Decisions
//! - All handles are generation-checked; a handle to a freed object is
//!   reported as `PeerError::StalePeer` / `PeerError::StaleConnection`
//! - Mutations take `&mut self`; callers sharing a registry wrap it in a lock
//! - Allocation never grows past the configured capacity

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use serde::Serialize;

use crate::config::PeerConfig;
use crate::net::{
    CloseAction, CloseCallback, ConnType, Connection, ConnectionHooks, ConnectionId, MessageRef, Protocol,
};
use crate::observability::metrics;
use crate::peer::client::{Client, ClientId};
use crate::peer::server::{Server, ServerId};
use crate::peer::slab::Slab;
use crate::peer::{PeerError, PeerHandle, PeerOps};

/// Snapshot of registry occupancy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistryStats {
    pub clients: usize,
    pub servers: usize,
    pub connections: usize,
    pub pools: Vec<PoolStats>,
}

/// Connection pool of one server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    pub server: String,
    pub address: SocketAddr,
    pub connections: usize,
}

pub struct PeerRegistry {
    clients: Slab<Client>,
    servers: Slab<Server>,
    conns: Slab<Connection>,
    server_addrs: HashMap<SocketAddr, ServerId>,
    hooks: HashMap<Protocol, Arc<dyn ConnectionHooks>>,
}

/// Resolve a peer handle to its binding operations.
fn peer_ops<'r>(
    clients: &'r mut Slab<Client>,
    servers: &'r mut Slab<Server>,
    peer: PeerHandle,
) -> Option<&'r mut dyn PeerOps> {
    match peer {
        PeerHandle::Client(id) => clients.get_mut(id.0).map(|c| c as &mut dyn PeerOps),
        PeerHandle::Server(id) => servers.get_mut(id.0).map(|s| s as &mut dyn PeerOps),
    }
}

fn exhausted(kind: &'static str, capacity: usize) -> PeerError {
    tracing::error!(kind, capacity, "Can't allocate a new {kind}");
    metrics::record_alloc_failure(kind);
    PeerError::Exhausted { kind, capacity }
}

impl PeerRegistry {
    pub fn new(config: &PeerConfig) -> Self {
        Self {
            clients: Slab::new(config.max_clients),
            servers: Slab::new(config.max_servers),
            conns: Slab::new(config.max_connections),
            server_addrs: HashMap::new(),
            hooks: HashMap::new(),
        }
    }

    /// Install the hooks for `protocol`, returning the ones they replace.
    pub fn register_hooks(
        &mut self,
        protocol: Protocol,
        hooks: Arc<dyn ConnectionHooks>,
    ) -> Option<Arc<dyn ConnectionHooks>> {
        tracing::debug!(?protocol, "Register connection hooks");
        self.hooks.insert(protocol, hooks)
    }

    pub fn create_client(&mut self) -> Result<ClientId, PeerError> {
        let key = self
            .clients
            .insert_with(|key| Client::new(ClientId(key)))
            .ok_or_else(|| exhausted("client", self.clients.capacity()))?;
        let id = ClientId(key);

        tracing::debug!(client = %id, "New client");
        metrics::record_objects("client", self.clients.len());
        Ok(id)
    }

    pub fn create_server(&mut self, addr: SocketAddr) -> Result<ServerId, PeerError> {
        if self.server_addrs.contains_key(&addr) {
            return Err(PeerError::DuplicateServer(addr));
        }

        let key = self
            .servers
            .insert_with(|key| Server::new(ServerId(key), addr))
            .ok_or_else(|| exhausted("server", self.servers.capacity()))?;
        let id = ServerId(key);
        self.server_addrs.insert(addr, id);

        tracing::debug!(server = %id, address = %addr, "New server");
        metrics::record_objects("server", self.servers.len());
        Ok(id)
    }

    pub fn client(&self, id: ClientId) -> Option<&Client> {
        self.clients.get(id.0)
    }

    pub fn server(&self, id: ServerId) -> Option<&Server> {
        self.servers.get(id.0)
    }

    pub fn find_server(&self, addr: SocketAddr) -> Option<ServerId> {
        self.server_addrs.get(&addr).copied()
    }

    pub fn clients(&self) -> impl Iterator<Item = &Client> + '_ {
        self.clients.iter().map(|(_, c)| c)
    }

    pub fn servers(&self) -> impl Iterator<Item = &Server> + '_ {
        self.servers.iter().map(|(_, s)| s)
    }

    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.conns.get(id.0)
    }

    /// Mutable access for message and session bookkeeping. The peer binding
    /// is only changed through [`attach_conn`](Self::attach_conn) and
    /// [`detach_conn`](Self::detach_conn).
    pub fn connection_mut(&mut self, id: ConnectionId) -> Option<&mut Connection> {
        self.conns.get_mut(id.0)
    }

    pub fn connection_ids(&self) -> Vec<ConnectionId> {
        self.conns.keys().into_iter().map(ConnectionId).collect()
    }

    /// Allocate a connection and pass it through the protocol's init hook.
    pub fn open_connection(
        &mut self,
        conn_type: ConnType,
        close_cb: Option<CloseCallback>,
    ) -> Result<ConnectionId, PeerError> {
        let key = self
            .conns
            .insert(Connection::new(conn_type, close_cb))
            .ok_or_else(|| exhausted("connection", self.conns.capacity()))?;
        let id = ConnectionId(key);

        let hooks = conn_type.protocol().and_then(|p| self.hooks.get(&p)).cloned();
        if let (Some(hooks), Some(conn)) = (hooks, self.conns.get(key)) {
            if let Err(e) = hooks.on_init(id, conn) {
                tracing::warn!(conn = %id, error = %e, "Connection refused by protocol hook");
                self.conns.remove(key);
                return Err(e.into());
            }
        }

        tracing::debug!(conn = %id, conn_type = conn_type.bits(), "New connection");
        metrics::record_objects("connection", self.conns.len());
        Ok(id)
    }

    /// Ask the protocol hooks for the next message of `conn` and make it the
    /// connection's current message.
    pub fn alloc_message(&mut self, conn: ConnectionId) -> Result<Option<MessageRef>, PeerError> {
        let c = self.conns.get_mut(conn.0).ok_or(PeerError::StaleConnection(conn))?;
        let Some(hooks) = c.conn_type().protocol().and_then(|p| self.hooks.get(&p)) else {
            return Ok(None);
        };
        let Some(msg) = hooks.on_msg_alloc(conn, c) else {
            tracing::debug!(conn = %conn, "No message allocated");
            return Ok(None);
        };

        if let Some(prev) = c.set_message(msg) {
            tracing::debug!(conn = %conn, prev = prev.0, "Replace unfinished message");
        }
        Ok(Some(msg))
    }

    /// Bind `conn` to `peer`.
    ///
    /// # Panics
    /// If the connection type does not fit the peer, the connection is bound
    /// to another peer, or a client already holds another connection.
    pub fn attach_conn(&mut self, peer: PeerHandle, conn: ConnectionId) -> Result<(), PeerError> {
        let c = self.conns.get_mut(conn.0).ok_or(PeerError::StaleConnection(conn))?;
        let ops = peer_ops(&mut self.clients, &mut self.servers, peer).ok_or(PeerError::StalePeer(peer))?;

        ops.attach_conn(conn, c);
        metrics::record_attach(peer.role().as_str());
        self.debug_validate(peer);
        Ok(())
    }

    /// Unbind `conn` from `peer`. Detaching an unbound connection is a no-op.
    ///
    /// # Panics
    /// If the connection type does not fit the peer or the connection is
    /// bound to another peer.
    pub fn detach_conn(&mut self, peer: PeerHandle, conn: ConnectionId) -> Result<(), PeerError> {
        let c = self.conns.get_mut(conn.0).ok_or(PeerError::StaleConnection(conn))?;
        let ops = peer_ops(&mut self.clients, &mut self.servers, peer).ok_or(PeerError::StalePeer(peer))?;

        ops.detach_conn(conn, c);
        metrics::record_detach(peer.role().as_str());
        self.debug_validate(peer);
        Ok(())
    }

    #[cfg(debug_assertions)]
    fn debug_validate(&self, peer: PeerHandle) {
        if let PeerHandle::Server(id) = peer {
            if let Some(server) = self.servers.get(id.0) {
                server.validate_pool(&self.conns);
            }
        }
    }

    #[cfg(not(debug_assertions))]
    fn debug_validate(&self, _peer: PeerHandle) {}

    /// Free a peer.
    ///
    /// A server releases every pooled connection first.
    ///
    /// # Panics
    /// If a client still holds a connection.
    pub fn destroy_peer(&mut self, peer: PeerHandle) -> Result<(), PeerError> {
        match peer {
            PeerHandle::Client(id) => {
                let client = self.clients.get(id.0).ok_or(PeerError::StalePeer(peer))?;
                assert!(
                    client.conn().is_none(),
                    "{id} destroyed with {:?} attached",
                    client.conn()
                );
                self.clients.remove(id.0);

                tracing::debug!(client = %id, "Free client");
                metrics::record_objects("client", self.clients.len());
            }
            PeerHandle::Server(id) => {
                let mut server = self.servers.remove(id.0).ok_or(PeerError::StalePeer(peer))?;
                for conn_id in server.take_pool() {
                    if let Some(mut conn) = self.conns.remove(conn_id.0) {
                        conn.unbind();
                        self.run_destruct(conn_id, &conn);
                    }
                }
                if self.server_addrs.get(&server.addr()) == Some(&id) {
                    self.server_addrs.remove(&server.addr());
                }

                tracing::debug!(server = %server, "Free server");
                metrics::record_objects("server", self.servers.len());
                metrics::record_objects("connection", self.conns.len());
            }
        }
        Ok(())
    }

    /// Next connection of `server` in round-robin order.
    pub fn server_conn(&self, server: ServerId) -> Option<ConnectionId> {
        self.servers.get(server.0)?.pick_conn()
    }

    /// The remote side closed `conn`. Its close callback decides whether the
    /// connection is released or kept for reconnection.
    pub fn remote_close(&mut self, conn: ConnectionId) -> Result<CloseAction, PeerError> {
        let action = self
            .conns
            .get(conn.0)
            .ok_or(PeerError::StaleConnection(conn))?
            .close_action();

        match action {
            CloseAction::Free => self.release_connection(conn)?,
            CloseAction::Retain => tracing::debug!(conn = %conn, "Keep remotely closed connection"),
        }
        Ok(action)
    }

    /// Detach `conn` from its peer, if any, and free it.
    pub fn release_connection(&mut self, conn: ConnectionId) -> Result<(), PeerError> {
        let peer = self
            .conns
            .get(conn.0)
            .ok_or(PeerError::StaleConnection(conn))?
            .peer();
        if let Some(peer) = peer {
            self.detach_conn(peer, conn)?;
        }

        if let Some(c) = self.conns.remove(conn.0) {
            self.run_destruct(conn, &c);
        }

        tracing::debug!(conn = %conn, "Free connection");
        metrics::record_objects("connection", self.conns.len());
        Ok(())
    }

    fn run_destruct(&self, id: ConnectionId, conn: &Connection) {
        if let Some(hooks) = conn.conn_type().protocol().and_then(|p| self.hooks.get(&p)) {
            hooks.on_destruct(id, conn);
        }
    }

    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            clients: self.clients.len(),
            servers: self.servers.len(),
            connections: self.conns.len(),
            pools: self
                .servers()
                .map(|s| PoolStats {
                    server: s.id().to_string(),
                    address: s.addr(),
                    connections: s.connections().len(),
                })
                .collect(),
        }
    }
}

impl std::fmt::Debug for PeerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeerRegistry")
            .field("clients", &self.clients.len())
            .field("servers", &self.servers.len())
            .field("connections", &self.conns.len())
            .field("hooks", &self.hooks.keys().collect::<Vec<_>>())
            .finish()
    }
}
