//! Request matching logic.
//!
//! # Responsibilities
//! - Extract the request attribute a rule selects
//! - Compare it with the rule argument using the rule's operator
//! - Walk a rule list and return the first rule that matches
//!
//! # Design Decisions
//! - First match wins: rules must be ordered from most to least specific
//! - Host and header values are case-insensitive (RFC 7230), URI follows the op
//! - Header keys are always compared exactly and case-sensitively
//! - Missing header means the rule cannot match, never an error

use crate::http::{HeaderId, HttpRequest};
use crate::routing::rule::{MatchArg, MatchField, MatchRule, RuleList};
use crate::scattered::{EqFlags, ScatteredStr};

/// Trait for matching requests against conditions.
pub trait Matcher {
    /// Returns true if the request matches this condition.
    fn matches(&self, req: &HttpRequest<'_>) -> bool;
}

impl<A> MatchRule<A> {
    fn str_flags(&self) -> EqFlags {
        let flags = self.op().flags();
        if self.field().forces_casei() {
            flags | EqFlags::CASEI
        } else {
            flags
        }
    }

    fn match_hdr(&self, req: &HttpRequest<'_>, id: HeaderId, arg: &[u8]) -> bool {
        req.headers
            .get(id)
            .is_some_and(|line| line.eq_kv(id.name(), b':', arg, self.str_flags()))
    }

    fn match_hdr_raw(&self, req: &HttpRequest<'_>, arg: &[u8]) -> bool {
        let flags = self.str_flags();
        match self.raw_sep {
            Some(at) => {
                let key = arg[..at].trim_ascii_end();
                let val = arg[at + 1..].trim_ascii();
                req.headers.iter().any(|line| line.eq_kv(key, b':', val, flags))
            }
            // A bare header name selects lines by key alone.
            None => {
                let key = arg.trim_ascii();
                req.headers.iter().any(|line| line.eq_key(key, b':', flags))
            }
        }
    }

    fn match_str(&self, value: &ScatteredStr<'_>, arg: &[u8]) -> bool {
        value.eq_bytes(arg, self.str_flags())
    }
}

impl<A> Matcher for MatchRule<A> {
    fn matches(&self, req: &HttpRequest<'_>) -> bool {
        let arg = match self.arg() {
            MatchArg::Method(method) => return self.field() == MatchField::Method && req.method == *method,
            MatchArg::Str(s) => &s[..],
        };

        match self.field() {
            MatchField::Method => false,
            MatchField::Uri => self.match_str(&req.uri, arg),
            MatchField::Host => self.match_str(&req.host, arg),
            MatchField::HdrConn => self.match_hdr(req, HeaderId::Connection, arg),
            MatchField::HdrHost => self.match_hdr(req, HeaderId::Host, arg),
            MatchField::HdrRaw => self.match_hdr_raw(req, arg),
        }
    }
}

impl<A> RuleList<A> {
    /// Return the first rule, in insertion order, that matches `req`.
    pub fn evaluate(&self, req: &HttpRequest<'_>) -> Option<&MatchRule<A>> {
        let found = self.iter().find(|rule| rule.matches(req));
        match found {
            Some(rule) => tracing::trace!(rule = rule.id().index(), field = ?rule.field(), "Request matched"),
            None => tracing::trace!(rules = self.len(), "No rule matched request"),
        }
        found
    }
}

/// Match `req` against `rules`; `None` is the normal "no rule applies" outcome.
pub fn match_request<'r, A>(req: &HttpRequest<'_>, rules: &'r RuleList<A>) -> Option<&'r MatchRule<A>> {
    rules.evaluate(req)
}
