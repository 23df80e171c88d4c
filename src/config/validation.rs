//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (capacities and limits > 0)
//! - Check server addresses parse and are unique
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::ProxyConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("{count} servers configured but peers.max_servers is {max}")]
    TooManyServers { count: usize, max: usize },

    #[error("server '{name}' has invalid address '{address}'")]
    InvalidAddress { name: String, address: String },

    #[error("server '{name}' duplicates address {address}")]
    DuplicateAddress { name: String, address: SocketAddr },

    #[error("unknown log level '{0}'")]
    LogLevel(String),

    #[error("invalid metrics address '{0}'")]
    MetricsAddress(String),
}

pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let nonzero = [
        ("peers.max_clients", config.peers.max_clients),
        ("peers.max_servers", config.peers.max_servers),
        ("peers.max_connections", config.peers.max_connections),
        ("match_limits.uri_max_len", config.match_limits.uri_max_len),
        ("match_limits.host_max_len", config.match_limits.host_max_len),
        ("match_limits.header_max_len", config.match_limits.header_max_len),
    ];
    for (name, value) in nonzero {
        if value == 0 {
            errors.push(ValidationError::Zero(name));
        }
    }

    if config.servers.len() > config.peers.max_servers {
        errors.push(ValidationError::TooManyServers {
            count: config.servers.len(),
            max: config.peers.max_servers,
        });
    }

    let mut seen = HashSet::new();
    for server in &config.servers {
        match server.address.parse::<SocketAddr>() {
            Ok(addr) => {
                if !seen.insert(addr) {
                    errors.push(ValidationError::DuplicateAddress {
                        name: server.name.clone(),
                        address: addr,
                    });
                }
            }
            Err(_) => errors.push(ValidationError::InvalidAddress {
                name: server.name.clone(),
                address: server.address.clone(),
            }),
        }
    }

    let obs = &config.observability;
    if obs.log_level.parse::<tracing::Level>().is_err() {
        errors.push(ValidationError::LogLevel(obs.log_level.clone()));
    }
    if obs.metrics_enabled && obs.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::MetricsAddress(obs.metrics_address.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::ServerConfig;

    fn server(name: &str, address: &str) -> ServerConfig {
        ServerConfig {
            name: name.into(),
            address: address.into(),
        }
    }

    #[test]
    fn default_config_is_valid() {
        assert_eq!(validate_config(&ProxyConfig::default()), Ok(()));
    }

    #[test]
    fn collects_every_error() {
        let mut config = ProxyConfig::default();
        config.peers.max_clients = 0;
        config.peers.max_servers = 1;
        config.servers.push(server("a", "127.0.0.1:3000"));
        config.servers.push(server("b", "not-an-address"));
        config.observability.log_level = "loud".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::Zero("peers.max_clients"),
                ValidationError::TooManyServers { count: 2, max: 1 },
                ValidationError::InvalidAddress {
                    name: "b".into(),
                    address: "not-an-address".into()
                },
                ValidationError::LogLevel("loud".into()),
            ]
        );
    }

    #[test]
    fn rejects_duplicate_addresses() {
        let mut config = ProxyConfig::default();
        config.servers.push(server("a", "127.0.0.1:3000"));
        config.servers.push(server("b", "127.0.0.1:3000"));

        let errors = validate_config(&config).unwrap_err();
        assert!(matches!(errors[0], ValidationError::DuplicateAddress { ref name, .. } if name == "b"));
    }
}
