//! Proxy core library: peer/connection binding and HTTP request matching.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod load_balancer;
pub mod net;
pub mod observability;
pub mod peer;
pub mod routing;
pub mod scattered;

pub use config::schema::ProxyConfig;
pub use lifecycle::ProxyContext;
pub use peer::{PeerError, PeerHandle, PeerRegistry};
pub use routing::{match_request, RuleList, SharedRules};
pub use scattered::ScatteredStr;
