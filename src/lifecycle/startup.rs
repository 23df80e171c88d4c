//! Startup orchestration.
//!
//! # Responsibilities
//! - Size the peer and connection registries from configuration
//! - Create the configured backend servers
//! - Hold the published rule list
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - No process-wide state; everything lives in the returned `ProxyContext`

use std::net::SocketAddr;
use std::sync::{Mutex, MutexGuard, PoisonError};

use thiserror::Error;

use crate::config::ProxyConfig;
use crate::peer::{PeerError, PeerRegistry};
use crate::routing::{RuleList, SharedRules};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("server '{name}' has invalid address '{address}'")]
    InvalidAddress { name: String, address: String },

    #[error("server '{name}': {source}")]
    Server {
        name: String,
        #[source]
        source: PeerError,
    },
}

/// Runtime state of the proxy core.
///
/// `A` is the action type carried by routing rules.
pub struct ProxyContext<A> {
    pub(crate) config: ProxyConfig,
    pub(crate) peers: Mutex<PeerRegistry>,
    pub(crate) rules: SharedRules<A>,
}

impl<A> ProxyContext<A> {
    pub fn init(config: ProxyConfig) -> Result<Self, StartupError> {
        let mut peers = PeerRegistry::new(&config.peers);

        for server in &config.servers {
            let addr: SocketAddr = server.address.parse().map_err(|_| StartupError::InvalidAddress {
                name: server.name.clone(),
                address: server.address.clone(),
            })?;
            let id = peers.create_server(addr).map_err(|source| StartupError::Server {
                name: server.name.clone(),
                source,
            })?;
            tracing::info!(name = %server.name, server = %id, address = %addr, "Server created");
        }

        tracing::info!(
            servers = config.servers.len(),
            max_clients = config.peers.max_clients,
            max_connections = config.peers.max_connections,
            "Proxy context initialized"
        );

        Ok(Self {
            rules: SharedRules::new(RuleList::new(config.match_limits.clone())),
            peers: Mutex::new(peers),
            config,
        })
    }

    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// Lock the registry. A panic in another holder does not make it unusable.
    pub fn peers(&self) -> MutexGuard<'_, PeerRegistry> {
        self.peers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn rules(&self) -> &SharedRules<A> {
        &self.rules
    }

    /// Empty rule list capped by the configured match limits.
    pub fn new_rule_list(&self) -> RuleList<A> {
        RuleList::new(self.config.match_limits.clone())
    }
}

impl<A> std::fmt::Debug for ProxyContext<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyContext")
            .field("peers", &self.peers)
            .field("rules", &self.rules.load().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;

    fn config(addrs: &[&str]) -> ProxyConfig {
        let mut config = ProxyConfig::default();
        for (i, addr) in addrs.iter().enumerate() {
            config.servers.push(ServerConfig {
                name: format!("backend-{i}"),
                address: addr.to_string(),
            });
        }
        config
    }

    #[test]
    fn test_init_creates_servers() {
        let ctx = ProxyContext::<()>::init(config(&["127.0.0.1:3000", "127.0.0.1:3001"])).unwrap();
        let peers = ctx.peers();

        assert_eq!(peers.stats().servers, 2);
        assert!(peers.find_server("127.0.0.1:3001".parse().unwrap()).is_some());
    }

    #[test]
    fn test_init_rejects_bad_address() {
        let err = ProxyContext::<()>::init(config(&["nowhere"])).unwrap_err();
        assert!(matches!(err, StartupError::InvalidAddress { ref address, .. } if address == "nowhere"));
    }

    #[test]
    fn test_init_rejects_duplicate_server() {
        let err = ProxyContext::<()>::init(config(&["127.0.0.1:3000", "127.0.0.1:3000"])).unwrap_err();
        assert!(matches!(
            err,
            StartupError::Server {
                source: PeerError::DuplicateServer(_),
                ..
            }
        ));
    }

    #[test]
    fn test_new_rule_list_uses_limits() {
        let mut cfg = config(&[]);
        cfg.match_limits.uri_max_len = 8;
        let ctx = ProxyContext::<u8>::init(cfg).unwrap();

        assert_eq!(ctx.new_rule_list().limits().uri_max_len, 8);
    }
}
