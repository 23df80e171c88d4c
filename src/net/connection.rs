//! Transport connection objects.
//!
//! # Responsibilities
//! - Tag each connection with its role (client/server) and protocol
//! - Hold the back-reference to the peer the connection is bound to
//! - Track the message being received and the owning session
//! - Decide, on remote close, whether the connection is freed or kept
//!
//! # Design Decisions
//! - The peer back-reference is only written by the peer registry's
//!   attach/detach paths, so both sides of a binding change together
//! - Connections are addressed by generation-checked `ConnectionId`s

use crate::peer::slab::SlotKey;
use crate::peer::PeerHandle;

/// Unique identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(pub(crate) SlotKey);

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Which side of the proxy a connection faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Client,
    Server,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Client => "client",
            Role::Server => "server",
        }
    }

    fn bit(&self) -> u16 {
        match self {
            Role::Client => ConnType::CLIENT_BIT,
            Role::Server => ConnType::SERVER_BIT,
        }
    }
}

/// Application protocol spoken over a connection.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    Http = 0x1,
}

/// Connection type tag: role bits above the low 8 protocol bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnType(u16);

impl ConnType {
    const PROTO_BITS: u16 = 8;
    const PROTO_MASK: u16 = (1 << Self::PROTO_BITS) - 1;
    const CLIENT_BIT: u16 = 0x1 << Self::PROTO_BITS;
    const SERVER_BIT: u16 = 0x2 << Self::PROTO_BITS;

    pub const HTTP_CLIENT: ConnType = ConnType(Self::CLIENT_BIT | Protocol::Http as u16);
    pub const HTTP_SERVER: ConnType = ConnType(Self::SERVER_BIT | Protocol::Http as u16);

    pub fn new(role: Role, protocol: Protocol) -> Self {
        ConnType(role.bit() | protocol as u16)
    }

    /// Raw tag as handed over by the transport layer; may carry no role.
    pub fn from_bits(bits: u16) -> Self {
        ConnType(bits)
    }

    pub fn bits(&self) -> u16 {
        self.0
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.0 & role.bit() != 0
    }

    pub fn protocol(&self) -> Option<Protocol> {
        match self.0 & Self::PROTO_MASK {
            0x1 => Some(Protocol::Http),
            _ => None,
        }
    }
}

/// What to do with a connection closed by the remote side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseAction {
    /// Detach and release it.
    Free,
    /// Keep it, binding included, for reconnection.
    Retain,
}

/// Close-action callback. Connections without one are freed on remote close.
pub type CloseCallback = Box<dyn Fn(&Connection) -> CloseAction + Send + Sync>;

/// Message currently being received on a connection (owned by the parser).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageRef(pub u64);

/// Session a connection belongs to (owned by the session layer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionRef(pub u64);

/// A transport connection bound to at most one peer.
pub struct Connection {
    conn_type: ConnType,
    peer: Option<PeerHandle>,
    msg: Option<MessageRef>,
    session: Option<SessionRef>,
    close_cb: Option<CloseCallback>,
}

impl Connection {
    pub fn new(conn_type: ConnType, close_cb: Option<CloseCallback>) -> Self {
        Self {
            conn_type,
            peer: None,
            msg: None,
            session: None,
            close_cb,
        }
    }

    pub fn conn_type(&self) -> ConnType {
        self.conn_type
    }

    /// Peer this connection is bound to.
    pub fn peer(&self) -> Option<PeerHandle> {
        self.peer
    }

    pub(crate) fn bind(&mut self, peer: PeerHandle) {
        self.peer = Some(peer);
    }

    pub(crate) fn unbind(&mut self) {
        self.peer = None;
    }

    pub fn message(&self) -> Option<MessageRef> {
        self.msg
    }

    /// Start receiving `msg`, returning the one it replaces.
    pub fn set_message(&mut self, msg: MessageRef) -> Option<MessageRef> {
        self.msg.replace(msg)
    }

    pub fn take_message(&mut self) -> Option<MessageRef> {
        self.msg.take()
    }

    pub fn session(&self) -> Option<SessionRef> {
        self.session
    }

    pub fn set_session(&mut self, session: Option<SessionRef>) {
        self.session = session;
    }

    /// Ask the close callback what a remote close should do.
    pub fn close_action(&self) -> CloseAction {
        self.close_cb.as_ref().map_or(CloseAction::Free, |cb| cb(self))
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("conn_type", &self.conn_type)
            .field("peer", &self.peer)
            .field("msg", &self.msg)
            .field("session", &self.session)
            .field("close_cb", &self.close_cb.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conn_type_bits() {
        assert!(ConnType::HTTP_CLIENT.has_role(Role::Client));
        assert!(!ConnType::HTTP_CLIENT.has_role(Role::Server));
        assert!(ConnType::HTTP_SERVER.has_role(Role::Server));
        assert_eq!(ConnType::HTTP_SERVER.protocol(), Some(Protocol::Http));
        assert_eq!(ConnType::new(Role::Client, Protocol::Http), ConnType::HTTP_CLIENT);
        assert_eq!(ConnType::HTTP_CLIENT.bits(), 0x101);

        let bare = ConnType::from_bits(0x1);
        assert!(!bare.has_role(Role::Client) && !bare.has_role(Role::Server));
    }

    #[test]
    fn close_action_defaults_to_free() {
        let conn = Connection::new(ConnType::HTTP_CLIENT, None);
        assert_eq!(conn.close_action(), CloseAction::Free);

        let conn = Connection::new(ConnType::HTTP_SERVER, Some(Box::new(|_| CloseAction::Retain)));
        assert_eq!(conn.close_action(), CloseAction::Retain);
    }

    #[test]
    fn message_slot_holds_one() {
        let mut conn = Connection::new(ConnType::HTTP_CLIENT, None);
        assert_eq!(conn.set_message(MessageRef(1)), None);
        assert_eq!(conn.set_message(MessageRef(2)), Some(MessageRef(1)));
        assert_eq!(conn.take_message(), Some(MessageRef(2)));
        assert_eq!(conn.message(), None);
    }
}
