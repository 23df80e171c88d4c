//! Scattered strings.
//!
//! # Responsibilities
//! - Represent a value that the parser may have split across several
//!   non-contiguous buffer chunks
//! - Expose the logical byte sequence without copying
//! - Compare against flat buffers (see `compare.rs`)
//!
//! # Design Decisions
//! - Borrowed only: the parser's input buffer or rule storage owns the bytes
//! - Lengths are always explicit, nothing is assumed to be NUL terminated
//! - Empty chunks are valid anywhere in a compound value

pub mod compare;

pub use compare::EqFlags;

/// A string value stored as one span or as an ordered list of chunks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ScatteredStr<'a> {
    /// Single contiguous span.
    Plain(&'a [u8]),
    /// Chunks concatenated left to right.
    Compound(Vec<&'a [u8]>),
    /// No bytes at all (absent value).
    #[default]
    Empty,
}

impl<'a> ScatteredStr<'a> {
    /// Create a compound string with no chunks yet.
    pub fn compound() -> Self {
        ScatteredStr::Compound(Vec::new())
    }

    /// Build a compound string from a list of chunks.
    pub fn from_chunks<I>(chunks: I) -> Self
    where
        I: IntoIterator<Item = &'a [u8]>,
    {
        ScatteredStr::Compound(chunks.into_iter().collect())
    }

    /// Append a chunk, converting a plain or empty value into a compound one.
    pub fn push_chunk(&mut self, chunk: &'a [u8]) {
        match self {
            ScatteredStr::Compound(chunks) => chunks.push(chunk),
            ScatteredStr::Plain(span) => {
                let first = *span;
                *self = ScatteredStr::Compound(vec![first, chunk]);
            }
            ScatteredStr::Empty => *self = ScatteredStr::Compound(vec![chunk]),
        }
    }

    /// Whether the value is stored as a chunk list.
    pub fn is_compound(&self) -> bool {
        matches!(self, ScatteredStr::Compound(_))
    }

    /// Total logical length in bytes.
    pub fn len(&self) -> usize {
        self.chunks().map(<[u8]>::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks().all(<[u8]>::is_empty)
    }

    /// Iterate over the underlying spans in order.
    pub fn chunks(&self) -> Chunks<'_, 'a> {
        match self {
            ScatteredStr::Plain(span) => Chunks::Plain(Some(span)),
            ScatteredStr::Compound(chunks) => Chunks::Compound(chunks.iter()),
            ScatteredStr::Empty => Chunks::Plain(None),
        }
    }

    /// Iterate over the logical bytes, crossing chunk boundaries.
    pub fn bytes(&self) -> Bytes<'_, 'a> {
        self.chunks().flatten().copied()
    }

    /// Copy the logical value into one buffer. Used for logging only.
    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len());
        for chunk in self.chunks() {
            out.extend_from_slice(chunk);
        }
        out
    }
}

impl<'a> From<&'a [u8]> for ScatteredStr<'a> {
    fn from(span: &'a [u8]) -> Self {
        ScatteredStr::Plain(span)
    }
}

impl<'a> From<&'a str> for ScatteredStr<'a> {
    fn from(s: &'a str) -> Self {
        ScatteredStr::Plain(s.as_bytes())
    }
}

impl std::fmt::Display for ScatteredStr<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for chunk in self.chunks() {
            write!(f, "{}", String::from_utf8_lossy(chunk))?;
        }
        Ok(())
    }
}

/// Iterator over the logical bytes of a [`ScatteredStr`].
pub type Bytes<'s, 'a> = std::iter::Copied<std::iter::Flatten<Chunks<'s, 'a>>>;

/// Iterator over the spans of a [`ScatteredStr`].
#[derive(Debug)]
pub enum Chunks<'s, 'a> {
    Plain(Option<&'s &'a [u8]>),
    Compound(std::slice::Iter<'s, &'a [u8]>),
}

impl<'s, 'a> Iterator for Chunks<'s, 'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Chunks::Plain(span) => span.take().copied(),
            Chunks::Compound(iter) => iter.next().copied(),
        }
    }
}
