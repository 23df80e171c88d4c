//! Request classification subsystem.
//!
//! # Data Flow
//! ```text
//! Parsed request (method, uri, host, header table)
//!     → router.rs (current rule list snapshot)
//!     → matcher.rs (evaluate rules in insertion order)
//!     → Return: first matching rule and its action, or None
//!
//! Rule list construction (before any evaluation):
//!     RuleList::new(limits)
//!     → rule.rs append() validates field/op/arg and the length cap
//!     → SharedRules::publish() freezes it for readers
//! ```
//!
//! # Design Decisions
//! - Rules are immutable at runtime; a new list replaces the old one whole
//! - Deterministic: same input always matches same rule
//! - First match wins (ordered by insertion)

pub mod matcher;
pub mod router;
pub mod rule;

pub use matcher::{match_request, Matcher};
pub use router::SharedRules;
pub use rule::{MatchArg, MatchField, MatchOp, MatchRule, RuleError, RuleId, RuleList};
