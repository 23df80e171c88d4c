//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Validated config → size registries → create servers → ProxyContext
//!
//! Shutdown (shutdown.rs):
//!     Signal received → destroy servers (and their pools)
//!     → release remaining connections → destroy clients
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → trigger shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then registries, then servers
//! - Teardown consumes the context, so nothing can use it afterwards

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::TeardownReport;
pub use signals::shutdown_signal;
pub use startup::{ProxyContext, StartupError};
