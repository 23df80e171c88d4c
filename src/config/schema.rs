//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the core.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::routing::MatchField;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Capacities of the peer and connection registries.
    pub peers: PeerConfig,

    /// Backend servers created at startup.
    pub servers: Vec<ServerConfig>,

    /// Per-field caps on rule argument length.
    pub match_limits: MatchLimits,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Registry capacities. Allocation fails once a registry is full.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PeerConfig {
    /// Maximum number of live clients.
    pub max_clients: usize,

    /// Maximum number of backend servers.
    pub max_servers: usize,

    /// Maximum number of live connections, client and server side together.
    pub max_connections: usize,
}

impl Default for PeerConfig {
    fn default() -> Self {
        Self {
            max_clients: 65_536,
            max_servers: 64,
            max_connections: 70_000,
        }
    }
}

/// Backend server definition.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Identifier used in logs.
    pub name: String,

    /// Resolved socket address (e.g., "127.0.0.1:3000").
    pub address: String,
}

/// Maximum stored argument length per rule field.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct MatchLimits {
    pub uri_max_len: usize,
    pub host_max_len: usize,
    /// Applies to every header field, raw lines included.
    pub header_max_len: usize,
}

impl MatchLimits {
    /// Cap for string arguments of `field`.
    pub fn max_arg_len(&self, field: MatchField) -> usize {
        match field {
            MatchField::Uri => self.uri_max_len,
            MatchField::Host => self.host_max_len,
            MatchField::HdrRaw | MatchField::HdrConn | MatchField::HdrHost => self.header_max_len,
            // Method rules never carry a string.
            MatchField::Method => 0,
        }
    }
}

impl Default for MatchLimits {
    fn default() -> Self {
        Self {
            uri_max_len: 2048,
            host_max_len: 255,
            header_max_len: 4096,
        }
    }
}

/// Log output style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output style.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Compact,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
