//! Peers: clients and backend servers that own connections.
//!
//! # Data Flow
//! ```text
//! Inbound connection
//!     → registry.rs create_client() (slab allocation)
//!     → registry.rs attach_conn(Client, conn)  → client.rs
//!
//! Startup
//!     → registry.rs create_server(addr)
//!     → attach_conn(Server, conn) per backend connection → server.rs pool
//!
//! Close / shutdown
//!     → detach_conn() then destroy_peer()
//! ```
//!
//! # Design Decisions
//! - `PeerHandle` is the sum type over peer kinds; each kind implements `PeerOps`
//! - Handles are generation-checked slab keys, never pointers
//! - The registry is the only writer of both ends of a binding and checks the
//!   symmetric-nullity invariant on every attach and detach
//! - Broken invariants panic: they are bugs in the caller, not runtime conditions

pub mod client;
pub mod registry;
pub mod server;
pub mod slab;

use std::fmt;
use std::net::SocketAddr;

use thiserror::Error;

use crate::net::{Connection, ConnectionId, HookError, Role};

pub use client::{Client, ClientId};
pub use registry::{PeerRegistry, PoolStats, RegistryStats};
pub use server::{Server, ServerId};

/// A client or a server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeerHandle {
    Client(ClientId),
    Server(ServerId),
}

impl PeerHandle {
    pub fn role(&self) -> Role {
        match self {
            PeerHandle::Client(_) => Role::Client,
            PeerHandle::Server(_) => Role::Server,
        }
    }
}

impl fmt::Display for PeerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeerHandle::Client(id) => id.fmt(f),
            PeerHandle::Server(id) => id.fmt(f),
        }
    }
}

impl From<ClientId> for PeerHandle {
    fn from(id: ClientId) -> Self {
        PeerHandle::Client(id)
    }
}

impl From<ServerId> for PeerHandle {
    fn from(id: ServerId) -> Self {
        PeerHandle::Server(id)
    }
}

/// Recoverable peer registry errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PeerError {
    #[error("{kind} registry exhausted ({capacity} slots)")]
    Exhausted { kind: &'static str, capacity: usize },

    #[error("{0} does not exist")]
    StalePeer(PeerHandle),

    #[error("{0} does not exist")]
    StaleConnection(ConnectionId),

    #[error("a server for {0} already exists")]
    DuplicateServer(SocketAddr),

    #[error(transparent)]
    Rejected(#[from] HookError),
}

/// Binding operations implemented by every peer kind.
///
/// Implementations receive both ends of the binding and must update them
/// together. They panic when the binding they find is inconsistent.
pub trait PeerOps {
    fn handle(&self) -> PeerHandle;

    /// Connections currently bound to this peer.
    fn connections(&self) -> &[ConnectionId];

    fn attach_conn(&mut self, id: ConnectionId, conn: &mut Connection);

    fn detach_conn(&mut self, id: ConnectionId, conn: &mut Connection);

    fn role(&self) -> Role {
        self.handle().role()
    }
}
