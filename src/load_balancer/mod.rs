//! Backend connection selection.
//!
//! # Data Flow
//! ```text
//! Request routed to a server [scheduler, external]
//!     → server connection pool
//!     → round_robin.rs (rotate through pooled connections)
//!     → Return pooled connection or None
//! ```
//!
//! # Design Decisions
//! - Selector is lock-free (one atomic counter per pool)
//! - Selection never mutates the pool

pub mod round_robin;

pub use round_robin::RoundRobin;
