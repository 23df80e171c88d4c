//! Parsed request view consumed by the match engine.
//!
//! # Responsibilities
//! - Carry the method, URI and host extracted by the parser
//! - Hold the header table: one fixed slot per well-known header, then raw lines
//!
//! # Design Decisions
//! - Every string borrows the parser's input buffer (`ScatteredStr`)
//! - Header entries keep the full `Name: value` line; splitting happens at match time
//! - Well-known headers are reached by a fixed index, never by a name lookup

use std::str::FromStr;

use crate::scattered::ScatteredStr;

/// HTTP request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Method {
    #[default]
    Unknown,
    Get,
    Head,
    Post,
    Put,
    Delete,
    Options,
    Patch,
    Connect,
    Trace,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Unknown => "UNKNOWN",
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Options => "OPTIONS",
            Method::Patch => "PATCH",
            Method::Connect => "CONNECT",
            Method::Trace => "TRACE",
        }
    }
}

impl FromStr for Method {
    type Err = ();

    /// Methods are case-sensitive tokens (RFC 7230 3.1.1).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "GET" => Method::Get,
            "HEAD" => Method::Head,
            "POST" => Method::Post,
            "PUT" => Method::Put,
            "DELETE" => Method::Delete,
            "OPTIONS" => Method::Options,
            "PATCH" => Method::Patch,
            "CONNECT" => Method::Connect,
            "TRACE" => Method::Trace,
            _ => return Err(()),
        })
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Index of a well-known header in the header table.
#[repr(usize)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeaderId {
    Connection = 0,
    Host = 1,
    XForwardedFor = 2,
}

impl HeaderId {
    /// Number of fixed slots preceding raw headers.
    pub const COUNT: usize = 3;

    /// Field name as it appears on the wire.
    pub fn name(&self) -> &'static [u8] {
        match self {
            HeaderId::Connection => b"Connection",
            HeaderId::Host => b"Host",
            HeaderId::XForwardedFor => b"X-Forwarded-For",
        }
    }
}

/// Header lines of one request.
#[derive(Debug, Clone, Default)]
pub struct HeaderTable<'a> {
    special: [Option<ScatteredStr<'a>>; HeaderId::COUNT],
    raw: Vec<ScatteredStr<'a>>,
}

impl<'a> HeaderTable<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the line of a well-known header, replacing a previous one.
    pub fn set(&mut self, id: HeaderId, line: impl Into<ScatteredStr<'a>>) {
        self.special[id as usize] = Some(line.into());
    }

    /// Append a header line that has no fixed slot.
    pub fn push_raw(&mut self, line: impl Into<ScatteredStr<'a>>) {
        self.raw.push(line.into());
    }

    pub fn get(&self, id: HeaderId) -> Option<&ScatteredStr<'a>> {
        self.special[id as usize].as_ref()
    }

    pub fn clear(&mut self, id: HeaderId) {
        self.special[id as usize] = None;
    }

    /// Every present line: well-known headers first, then raw lines in order.
    pub fn iter(&self) -> impl Iterator<Item = &ScatteredStr<'a>> + '_ {
        self.special.iter().flatten().chain(self.raw.iter())
    }

    pub fn len(&self) -> usize {
        self.special.iter().flatten().count() + self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The parts of a parsed request that rules can select.
#[derive(Debug, Clone, Default)]
pub struct HttpRequest<'a> {
    pub method: Method,
    pub uri: ScatteredStr<'a>,
    pub host: ScatteredStr<'a>,
    pub headers: HeaderTable<'a>,
}

impl<'a> HttpRequest<'a> {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    pub fn with_uri(mut self, uri: impl Into<ScatteredStr<'a>>) -> Self {
        self.uri = uri.into();
        self
    }

    pub fn with_host(mut self, host: impl Into<ScatteredStr<'a>>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_header(mut self, id: HeaderId, line: impl Into<ScatteredStr<'a>>) -> Self {
        self.headers.set(id, line);
        self
    }
}
