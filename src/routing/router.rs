//! Published rule lists.
//!
//! # Responsibilities
//! - Hold the rule list currently in force
//! - Let any number of workers evaluate requests against it without locking
//! - Replace it atomically with a fully built list
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - A list is only published once every rule has been appended
//! - Readers keep their snapshot alive for as long as they hold it

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::http::HttpRequest;
use crate::observability::metrics;
use crate::routing::rule::{MatchRule, RuleList};

/// Shared handle to the active rule list.
#[derive(Debug)]
pub struct SharedRules<A> {
    current: ArcSwap<RuleList<A>>,
}

impl<A> SharedRules<A> {
    /// Publish a finished list.
    pub fn new(list: RuleList<A>) -> Self {
        Self {
            current: ArcSwap::from_pointee(list),
        }
    }

    /// Snapshot of the list in force right now.
    pub fn load(&self) -> Arc<RuleList<A>> {
        self.current.load_full()
    }

    /// Replace the active list. Evaluations already running finish on the old one.
    pub fn publish(&self, list: RuleList<A>) {
        let rules = list.len();
        self.current.store(Arc::new(list));
        tracing::info!(rules, "Rule list published");
    }

    /// Evaluate `req` against the current list and hand the matching rule to `f`.
    pub fn evaluate<R>(&self, req: &HttpRequest<'_>, f: impl FnOnce(Option<&MatchRule<A>>) -> R) -> R {
        let list = self.current.load();
        let found = list.evaluate(req);
        metrics::record_match(found.is_some());
        f(found)
    }
}

impl<A> Default for SharedRules<A> {
    fn default() -> Self {
        Self::new(RuleList::default())
    }
}
