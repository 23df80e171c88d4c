//! Shared utilities for integration tests.

#![allow(dead_code)]

use proxy_core::config::PeerConfig;
use proxy_core::net::{CloseAction, ConnType, ConnectionId};
use proxy_core::{PeerRegistry, ScatteredStr};

/// Split `data` into chunks of 1, 2, 3, 0, 1, ... bytes.
pub fn chunked(data: &str) -> ScatteredStr<'_> {
    let mut rest = data.as_bytes();
    let mut s = ScatteredStr::compound();
    let mut step = 0;
    while !rest.is_empty() {
        step += 1;
        let n = rest.len().min(step % 4);
        let (chunk, tail) = rest.split_at(n);
        s.push_chunk(chunk);
        rest = tail;
    }
    s
}

/// Small registry with room for a handful of peers.
pub fn registry() -> PeerRegistry {
    PeerRegistry::new(&PeerConfig {
        max_clients: 4,
        max_servers: 4,
        max_connections: 8,
    })
}

pub fn open(reg: &mut PeerRegistry, conn_type: ConnType) -> ConnectionId {
    reg.open_connection(conn_type, None).unwrap()
}

pub fn open_with(reg: &mut PeerRegistry, conn_type: ConnType, action: CloseAction) -> ConnectionId {
    reg.open_connection(conn_type, Some(Box::new(move |_| action))).unwrap()
}
