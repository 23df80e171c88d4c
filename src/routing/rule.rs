//! Match rules and the append-only rule list.
//!
//! # Responsibilities
//! - Define what a rule selects (field), how it compares (op) and against what (arg)
//! - Validate rules when they are appended
//! - Keep rules in insertion order, which is also evaluation order
//!
//! # Design Decisions
//! - A rule is immutable once appended; the list only grows
//! - String arguments own a fixed-size buffer sized at append time
//! - Argument length is capped per field (see `MatchLimits`)

use thiserror::Error;

use crate::config::MatchLimits;
use crate::http::Method;
use crate::scattered::EqFlags;

/// Request attribute selected by a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchField {
    Method,
    Uri,
    Host,
    /// Any header line, argument is a whole `Name: value` line.
    HdrRaw,
    /// Value of the `Connection` header.
    HdrConn,
    /// Value of the `Host` header.
    HdrHost,
}

impl MatchField {
    /// Hosts and header values compare case-insensitively whatever the op says.
    pub(crate) fn forces_casei(&self) -> bool {
        !matches!(self, MatchField::Method | MatchField::Uri)
    }
}

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchOp {
    Eq,
    EqCasei,
    Prefix,
    PrefixCasei,
}

impl MatchOp {
    pub fn flags(&self) -> EqFlags {
        match self {
            MatchOp::Eq => EqFlags::DEFAULT,
            MatchOp::EqCasei => EqFlags::CASEI,
            MatchOp::Prefix => EqFlags::PREFIX,
            MatchOp::PrefixCasei => EqFlags::PREFIX_CASEI,
        }
    }
}

/// Typed rule argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchArg {
    Method(Method),
    Str(Box<[u8]>),
}

impl MatchArg {
    pub fn str(s: impl AsRef<[u8]>) -> Self {
        MatchArg::Str(s.as_ref().into())
    }

    /// Stored length in bytes; zero for non-string arguments.
    pub fn len(&self) -> usize {
        match self {
            MatchArg::Method(_) => 0,
            MatchArg::Str(s) => s.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn kind(&self) -> &'static str {
        match self {
            MatchArg::Method(_) => "method",
            MatchArg::Str(_) => "string",
        }
    }
}

/// Errors raised while building a rule list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    #[error("field {field:?} does not take a {arg} argument")]
    ArgMismatch { field: MatchField, arg: &'static str },

    #[error("operator {op:?} is not supported for field {field:?}")]
    UnsupportedOp { field: MatchField, op: MatchOp },

    #[error("argument of {len} bytes exceeds the {max} byte limit for field {field:?}")]
    ArgTooLong { field: MatchField, len: usize, max: usize },
}

/// Position of a rule in its list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleId(usize);

impl RuleId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// One (field, op, arg) triple plus the caller's data for it.
#[derive(Debug, Clone)]
pub struct MatchRule<A> {
    id: RuleId,
    field: MatchField,
    op: MatchOp,
    arg: MatchArg,
    /// For raw header rules: offset of ':' in the argument line.
    pub(crate) raw_sep: Option<usize>,
    action: A,
}

impl<A> MatchRule<A> {
    pub fn id(&self) -> RuleId {
        self.id
    }

    pub fn field(&self) -> MatchField {
        self.field
    }

    pub fn op(&self) -> MatchOp {
        self.op
    }

    pub fn arg(&self) -> &MatchArg {
        &self.arg
    }

    pub fn action(&self) -> &A {
        &self.action
    }
}

/// Ordered, append-only list of rules.
#[derive(Debug, Clone)]
pub struct RuleList<A> {
    rules: Vec<MatchRule<A>>,
    limits: MatchLimits,
}

impl<A> Default for RuleList<A> {
    fn default() -> Self {
        Self::new(MatchLimits::default())
    }
}

impl<A> RuleList<A> {
    /// Create an empty list whose string arguments are capped by `limits`.
    pub fn new(limits: MatchLimits) -> Self {
        Self {
            rules: Vec::new(),
            limits,
        }
    }

    /// Append a rule using the configured cap for its field.
    pub fn append(
        &mut self,
        field: MatchField,
        op: MatchOp,
        arg: MatchArg,
        action: A,
    ) -> Result<RuleId, RuleError> {
        let max = self.limits.max_arg_len(field);
        self.append_capped(field, op, arg, max, action)
    }

    /// Append a rule whose argument may be at most `max_arg_len` bytes long.
    pub fn append_capped(
        &mut self,
        field: MatchField,
        op: MatchOp,
        arg: MatchArg,
        max_arg_len: usize,
        action: A,
    ) -> Result<RuleId, RuleError> {
        match (field, &arg) {
            (MatchField::Method, MatchArg::Method(_)) => {
                if op != MatchOp::Eq {
                    return Err(RuleError::UnsupportedOp { field, op });
                }
            }
            (MatchField::Method, _) | (_, MatchArg::Method(_)) => {
                return Err(RuleError::ArgMismatch { field, arg: arg.kind() });
            }
            (_, MatchArg::Str(s)) if s.len() > max_arg_len => {
                return Err(RuleError::ArgTooLong {
                    field,
                    len: s.len(),
                    max: max_arg_len,
                });
            }
            _ => {}
        }

        let raw_sep = match (&arg, field) {
            (MatchArg::Str(s), MatchField::HdrRaw) => s.iter().position(|&b| b == b':'),
            _ => None,
        };

        let id = RuleId(self.rules.len());
        tracing::trace!(rule = id.0, ?field, ?op, arg_len = arg.len(), "Match rule appended");
        self.rules.push(MatchRule {
            id,
            field,
            op,
            arg,
            raw_sep,
            action,
        });
        Ok(id)
    }

    pub fn get(&self, id: RuleId) -> Option<&MatchRule<A>> {
        self.rules.get(id.0)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MatchRule<A>> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn limits(&self) -> &MatchLimits {
        &self.limits
    }
}

impl<'l, A> IntoIterator for &'l RuleList<A> {
    type Item = &'l MatchRule<A>;
    type IntoIter = std::slice::Iter<'l, MatchRule<A>>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_ids_follow_insertion_order() {
        let mut list = RuleList::default();
        let a = list.append(MatchField::Uri, MatchOp::Prefix, MatchArg::str("/a"), 'a').unwrap();
        let b = list.append(MatchField::Uri, MatchOp::Prefix, MatchArg::str("/b"), 'b').unwrap();

        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert_eq!(list.get(b).map(|r| *r.action()), Some('b'));
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn method_field_takes_only_method_eq() {
        let mut list = RuleList::default();

        let err = list
            .append(MatchField::Method, MatchOp::Prefix, MatchArg::Method(Method::Get), ())
            .unwrap_err();
        assert_eq!(err, RuleError::UnsupportedOp { field: MatchField::Method, op: MatchOp::Prefix });

        let err = list
            .append(MatchField::Method, MatchOp::Eq, MatchArg::str("GET"), ())
            .unwrap_err();
        assert_eq!(err, RuleError::ArgMismatch { field: MatchField::Method, arg: "string" });

        let err = list
            .append(MatchField::Host, MatchOp::Eq, MatchArg::Method(Method::Get), ())
            .unwrap_err();
        assert_eq!(err, RuleError::ArgMismatch { field: MatchField::Host, arg: "method" });

        assert!(list.is_empty());
    }

    #[test]
    fn string_argument_is_capped() {
        let mut list = RuleList::default();

        let err = list
            .append_capped(MatchField::Uri, MatchOp::Eq, MatchArg::str("/toolong"), 4, ())
            .unwrap_err();
        assert_eq!(err, RuleError::ArgTooLong { field: MatchField::Uri, len: 8, max: 4 });

        assert!(list
            .append_capped(MatchField::Uri, MatchOp::Eq, MatchArg::str("/abc"), 4, ())
            .is_ok());
    }

    #[test]
    fn configured_limits_apply_per_field() {
        let limits = MatchLimits {
            host_max_len: 8,
            ..MatchLimits::default()
        };
        let mut list = RuleList::new(limits);

        assert!(list.append(MatchField::Host, MatchOp::Eq, MatchArg::str("example.com"), ()).is_err());
        assert!(list.append(MatchField::Uri, MatchOp::Eq, MatchArg::str("example.com"), ()).is_ok());
    }

    #[test]
    fn raw_header_separator_is_recorded() {
        let mut list = RuleList::default();
        let id = list
            .append(MatchField::HdrRaw, MatchOp::Eq, MatchArg::str("Connection: close"), ())
            .unwrap();
        assert_eq!(list.get(id).unwrap().raw_sep, Some(10));
    }
}
