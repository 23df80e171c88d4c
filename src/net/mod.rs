//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Transport event (accept / connect) [external]
//!     → connection.rs (typed connection object, close policy)
//!     → hooks.rs (protocol layer may refuse it)
//!     → peer registry binds it to a client or server
//!
//! Remote close:
//!     close callback → Free (detach + release) | Retain (keep for reconnect)
//! ```
//!
//! # Design Decisions
//! - No I/O here; the transport owns sockets, we own the bookkeeping
//! - Each connection is bound to at most one peer

pub mod connection;
pub mod hooks;

pub use connection::{
    CloseAction, CloseCallback, ConnType, Connection, ConnectionId, MessageRef, Protocol, Role, SessionRef,
};
pub use hooks::{ConnectionHooks, HookError};
