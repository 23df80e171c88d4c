//! HTTP message views.
//!
//! # Data Flow
//! ```text
//! Client connection bytes
//!     → [parser, external] builds method, URI, host and header lines
//!     → request.rs (HttpRequest borrowing the input buffer)
//!     → routing::matcher evaluates a rule list against it
//! ```

pub mod request;

pub use request::{HeaderId, HeaderTable, HttpRequest, Method};
