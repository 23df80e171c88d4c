//! Shutdown of the proxy core.
//!
//! Servers go first and take their pooled connections with them. Whatever
//! connections remain are client-side or unbound; they are released before
//! the clients that may hold them.

use std::sync::PoisonError;

use serde::Serialize;

use crate::lifecycle::startup::ProxyContext;
use crate::peer::{PeerHandle, PeerOps};

/// What teardown had to release.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TeardownReport {
    pub servers: usize,
    pub server_connections: usize,
    pub other_connections: usize,
    pub clients: usize,
}

impl<A> ProxyContext<A> {
    /// Release every peer and connection.
    pub fn teardown(self) -> TeardownReport {
        let mut peers = self.peers.into_inner().unwrap_or_else(PoisonError::into_inner);
        let mut report = TeardownReport::default();

        let servers: Vec<_> = peers.servers().map(|s| (s.id(), s.connections().len())).collect();
        for (id, pooled) in servers {
            match peers.destroy_peer(PeerHandle::Server(id)) {
                Ok(()) => {
                    report.servers += 1;
                    report.server_connections += pooled;
                }
                Err(e) => tracing::warn!(server = %id, error = %e, "Failed to free server"),
            }
        }

        for id in peers.connection_ids() {
            match peers.release_connection(id) {
                Ok(()) => report.other_connections += 1,
                Err(e) => tracing::warn!(conn = %id, error = %e, "Failed to free connection"),
            }
        }
        if report.other_connections > 0 {
            tracing::warn!(count = report.other_connections, "Connections still open at teardown");
        }

        let clients: Vec<_> = peers.clients().map(|c| c.id()).collect();
        for id in clients {
            match peers.destroy_peer(PeerHandle::Client(id)) {
                Ok(()) => report.clients += 1,
                Err(e) => tracing::warn!(client = %id, error = %e, "Failed to free client"),
            }
        }

        tracing::info!(
            servers = report.servers,
            server_connections = report.server_connections,
            other_connections = report.other_connections,
            clients = report.clients,
            "Proxy context torn down"
        );
        report
    }
}
