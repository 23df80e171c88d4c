//! Comparison of scattered strings against flat buffers.
//!
//! Both entry points walk the logical bytes of the scattered string in
//! lockstep with the flat buffer, so chunk boundaries never affect the result.
//! Neither side is read past its explicit length.

use std::ops::BitOr;

use super::ScatteredStr;

/// Comparison mode flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EqFlags(u8);

impl EqFlags {
    /// Exact, case-sensitive.
    pub const DEFAULT: EqFlags = EqFlags(0);
    /// ASCII case folding.
    pub const CASEI: EqFlags = EqFlags(0x1);
    /// Only the needle's length has to match.
    pub const PREFIX: EqFlags = EqFlags(0x2);
    pub const PREFIX_CASEI: EqFlags = EqFlags(0x1 | 0x2);

    pub fn casei(self) -> bool {
        self.0 & Self::CASEI.0 != 0
    }

    pub fn prefix(self) -> bool {
        self.0 & Self::PREFIX.0 != 0
    }
}

impl BitOr for EqFlags {
    type Output = EqFlags;

    fn bitor(self, rhs: EqFlags) -> EqFlags {
        EqFlags(self.0 | rhs.0)
    }
}

/// Optional whitespace around header separators and values.
fn is_ows(b: u8) -> bool {
    b == b' ' || b == b'\t'
}

fn bytes_eq<I>(haystack: I, needle: &[u8], casei: bool) -> bool
where
    I: Iterator<Item = u8>,
{
    haystack.zip(needle).all(|(a, &b)| {
        if casei {
            a.eq_ignore_ascii_case(&b)
        } else {
            a == b
        }
    })
}

/// Returns `(start, end)` of the non-whitespace part, `(0, 0)` if there is none.
fn trimmed_span<I>(bytes: I) -> (usize, usize)
where
    I: Iterator<Item = u8>,
{
    let mut start = None;
    let mut end = 0;
    for (i, b) in bytes.enumerate() {
        if !is_ows(b) {
            start.get_or_insert(i);
            end = i + 1;
        }
    }
    (start.unwrap_or(0), end)
}

fn len_fits(have: usize, want: usize, flags: EqFlags) -> bool {
    if flags.prefix() {
        want <= have
    } else {
        want == have
    }
}

impl ScatteredStr<'_> {
    /// Compare with `needle` as a whole value or, with [`EqFlags::PREFIX`], as
    /// a prefix of this string. An empty needle is always a prefix.
    pub fn eq_bytes(&self, needle: &[u8], flags: EqFlags) -> bool {
        if !len_fits(self.len(), needle.len(), flags) {
            return false;
        }
        bytes_eq(self.bytes(), needle, flags.casei())
    }

    /// Compare a `key<sep>value` string.
    ///
    /// The key runs up to the first `sep` (trailing whitespace dropped) and is
    /// always compared exactly and case-sensitively. The value is trimmed of
    /// surrounding whitespace and compared according to `flags`.
    pub fn eq_kv(&self, key: &[u8], sep: u8, val: &[u8], flags: EqFlags) -> bool {
        let Some(sep_at) = self.bytes().position(|b| b == sep) else {
            return false;
        };

        let (_, key_len) = trimmed_span(self.bytes().take(sep_at));
        if key_len != key.len() || !bytes_eq(self.bytes().take(key_len), key, false) {
            return false;
        }

        let val_from = sep_at + 1;
        let (start, end) = trimmed_span(self.bytes().skip(val_from));
        if !len_fits(end - start, val.len(), flags) {
            return false;
        }
        bytes_eq(self.bytes().skip(val_from + start), val, flags.casei())
    }

    /// Compare only the key of a `key<sep>value` string.
    ///
    /// The key is always compared case-sensitively; [`EqFlags::CASEI`] is
    /// ignored. With [`EqFlags::PREFIX`] the key only has to start with `key`.
    pub fn eq_key(&self, key: &[u8], sep: u8, flags: EqFlags) -> bool {
        let Some(sep_at) = self.bytes().position(|b| b == sep) else {
            return false;
        };

        let (_, key_len) = trimmed_span(self.bytes().take(sep_at));
        len_fits(key_len, key.len(), flags) && bytes_eq(self.bytes().take(key_len), key, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Split `data` into chunks of 1, 2, 3, 0, 1, ... bytes.
    fn compound(data: &str) -> ScatteredStr<'_> {
        let mut rest = data.as_bytes();
        let mut s = ScatteredStr::compound();
        let mut step = 0;
        loop {
            step += 1;
            let n = rest.len().min(step % 4);
            let (chunk, tail) = rest.split_at(n);
            s.push_chunk(chunk);
            rest = tail;
            if rest.is_empty() {
                break;
            }
        }
        s
    }

    #[test]
    fn eq_bytes_only_for_equal_strings() {
        let cstr = b"foo123 barbaz";

        assert!(compound("foo123 barbaz").eq_bytes(cstr, EqFlags::DEFAULT));
        assert!(!compound("aoo123 barbaz").eq_bytes(cstr, EqFlags::DEFAULT));
        assert!(!compound("foo123 barbaa").eq_bytes(cstr, EqFlags::DEFAULT));
        assert!(!compound("Foo123 barbaz").eq_bytes(cstr, EqFlags::DEFAULT));
        assert!(!compound("foo123 barba").eq_bytes(cstr, EqFlags::DEFAULT));
        assert!(!compound("foo123 barbazz").eq_bytes(cstr, EqFlags::DEFAULT));
    }

    #[test]
    fn eq_bytes_plain() {
        let s1 = ScatteredStr::from("foo");
        let s2 = ScatteredStr::from("bar baz");

        assert!(s1.eq_bytes(b"foo", EqFlags::DEFAULT));
        assert!(s2.eq_bytes(b"bar baz", EqFlags::DEFAULT));
        assert!(!s1.eq_bytes(b"bar baz", EqFlags::DEFAULT));
        assert!(!s2.eq_bytes(b"foo", EqFlags::DEFAULT));
    }

    #[test]
    fn eq_bytes_respects_explicit_lengths() {
        let input = b"foobarbaz [ANOTHER GARBAGE]";
        let expected = b"foobarbaz [SOME GARBAGE]";
        let s = ScatteredStr::from(&input[..9]);

        assert!(s.eq_bytes(&expected[..9], EqFlags::DEFAULT));
    }

    #[test]
    fn eq_bytes_empty() {
        let s1 = ScatteredStr::from(&b"garbage"[..0]);
        let s2 = ScatteredStr::Empty;
        let s3 = ScatteredStr::from_chunks([&b"garbage"[..0], &b""[..]]);
        let s_ne = ScatteredStr::from("foo");

        assert!(s1.eq_bytes(b"", EqFlags::DEFAULT));
        assert!(s2.eq_bytes(b"", EqFlags::DEFAULT));
        assert!(s3.eq_bytes(b"", EqFlags::DEFAULT));
        assert!(!s_ne.eq_bytes(b"", EqFlags::DEFAULT));
        assert!(!s1.eq_bytes(b"bar", EqFlags::DEFAULT));
        assert!(!s2.eq_bytes(b"bar", EqFlags::DEFAULT));
        assert!(!s3.eq_bytes(b"bar", EqFlags::DEFAULT));
    }

    #[test]
    fn eq_bytes_casei() {
        let s = compound("FooBarBaz 123");

        assert!(s.eq_bytes(b"FooBarBaz 123", EqFlags::CASEI));
        assert!(s.eq_bytes(b"fooBarBaz 123", EqFlags::CASEI));
        assert!(s.eq_bytes(b"FooBarBaZ 123", EqFlags::CASEI));
        assert!(!s.eq_bytes(b"fooBarBaz 123", EqFlags::DEFAULT));
        assert!(!s.eq_bytes(b"FooBarBaZ 123", EqFlags::DEFAULT));
    }

    #[test]
    fn eq_bytes_prefix() {
        let s = compound("/foo/bar/baz.test");

        for p in ["/foo/bar/baz.test", "/foo/bar/baz.tes", "/foo/bar/baz", "/foo/bar/", "/foo", "/", ""] {
            assert!(s.eq_bytes(p.as_bytes(), EqFlags::PREFIX), "prefix {p:?}");
        }

        assert!(!s.eq_bytes(b"/foo/bar/baz.test1", EqFlags::PREFIX));
        assert!(!s.eq_bytes(b"/foo/bar/baz.tesT", EqFlags::PREFIX));
        assert!(!s.eq_bytes(b"/Foo", EqFlags::PREFIX));

        assert!(s.eq_bytes(b"/foo/bar/baz.tesT", EqFlags::PREFIX_CASEI));
        assert!(s.eq_bytes(b"/Foo", EqFlags::PREFIX_CASEI));
    }

    #[test]
    fn eq_kv_only_for_equal_kv() {
        let key = b"Cache-Control";
        let val = b"max-age=3600, public";
        let kv = |s: &str| compound(s).eq_kv(key, b':', val, EqFlags::DEFAULT);

        assert!(kv("Cache-Control: max-age=3600, public"));
        assert!(!kv("Cache-Cootrol: max-age=3600, public"));
        assert!(!kv("Cache-Controll: max-age=3600, public"));
        assert!(!kv("Cache-Contro: max-age=3600, public"));
        assert!(!kv("Cache-Control= max-age=3600, public"));
        assert!(!kv("Cache-Control:: max-age=3600, public"));
        assert!(!kv("Cache-Control max-age=3600, public"));
        assert!(!kv("Cache-Control: max-age=3600, publi"));
        assert!(!kv("Cache-Control: max-age=3601, public"));
    }

    #[test]
    fn eq_kv_plain() {
        let s1 = ScatteredStr::from("Cache-Control: max-age=3600, public");
        let s2 = ScatteredStr::from("Cache-Control: no-cache");
        let k = b"Cache-Control";

        assert!(s1.eq_kv(k, b':', b"max-age=3600, public", EqFlags::DEFAULT));
        assert!(s2.eq_kv(k, b':', b"no-cache", EqFlags::DEFAULT));
        assert!(!s1.eq_kv(k, b':', b"no-cache", EqFlags::DEFAULT));
        assert!(!s2.eq_kv(k, b':', b"max-age=3600, public", EqFlags::DEFAULT));
    }

    #[test]
    fn eq_kv_respects_explicit_lengths() {
        let line = b"Cache-Control: max-age=3600, public [GARBAGE1]";
        let k = b"Cache-Control [GARBAGE2]";
        let v = b"max-age=3600, public [GARBAGE3]";
        let s = ScatteredStr::from(&line[..35]);

        assert!(s.eq_kv(&k[..13], b':', &v[..20], EqFlags::DEFAULT));
    }

    #[test]
    fn eq_key_ignores_value() {
        let s = compound("Host :  example.com");

        assert!(s.eq_key(b"Host", b':', EqFlags::DEFAULT));
        assert!(s.eq_key(b"Ho", b':', EqFlags::PREFIX));
        assert!(!s.eq_key(b"Ho", b':', EqFlags::DEFAULT));
        assert!(!s.eq_key(b"Hostname", b':', EqFlags::PREFIX));
        assert!(!s.eq_key(b"HOST", b':', EqFlags::CASEI));
        assert!(!s.eq_key(b"HO", b':', EqFlags::PREFIX_CASEI));
        assert!(!compound("Host").eq_key(b"Host", b':', EqFlags::DEFAULT));
    }

    #[test]
    fn eq_kv_empty_value() {
        let k = b"Cache-Control";
        let empty = |s: &str| compound(s).eq_kv(k, b':', b"", EqFlags::DEFAULT);

        assert!(empty("Cache-Control:"));
        assert!(empty("Cache-Control:    "));

        for s in [
            "Cache-Control: max-age=3600, public",
            "Cache-Control=",
            "Cache-Control= ",
            "Cache-Control=     ",
            "Cache-Contro:",
            "Cache-Contr:",
            "Cache-Cont:",
            "",
            "Other-Key:",
            "Other-Key: ",
            "Other-Key:    ",
        ] {
            assert!(!empty(s), "{s:?} must not match an empty value");
        }
    }

    #[test]
    fn eq_kv_key_is_case_sensitive() {
        let k = b"Cache-Control";
        let v = b"max-age=3600, public";
        let keycase = compound("cache-control: max-age=3600, public");
        let valcase1 = compound("Cache-Control: Max-age=3600, public");
        let valcase2 = compound("Cache-Control: Max-age=3600, publiC");

        assert!(!keycase.eq_kv(k, b':', v, EqFlags::CASEI));
        assert!(!keycase.eq_kv(k, b':', v, EqFlags::DEFAULT));

        assert!(valcase1.eq_kv(k, b':', v, EqFlags::CASEI));
        assert!(valcase2.eq_kv(k, b':', v, EqFlags::CASEI));
        assert!(!valcase1.eq_kv(k, b':', v, EqFlags::DEFAULT));
        assert!(!valcase2.eq_kv(k, b':', v, EqFlags::DEFAULT));
    }

    #[test]
    fn eq_kv_prefix_value() {
        let s = compound("Cache-Control: max-age=3600, public");
        let k = b"Cache-Control";
        let kv = |v: &str, flags| s.eq_kv(k, b':', v.as_bytes(), flags);

        assert!(kv("max-age=3600, public", EqFlags::PREFIX));
        assert!(kv("max-age=3600", EqFlags::PREFIX));
        assert!(kv("m", EqFlags::PREFIX));
        assert!(kv("", EqFlags::PREFIX));
        assert!(!kv("max-age=3600, publicc", EqFlags::PREFIX));
        assert!(!kv("max-age=3601, public", EqFlags::PREFIX));
        assert!(!kv("Max-Age=3600", EqFlags::PREFIX));
        assert!(kv("Max-Age=3600", EqFlags::PREFIX_CASEI));
    }

    #[test]
    fn eq_kv_space_separator() {
        let s = compound("key v a l u e");
        assert!(s.eq_kv(b"key", b' ', b"v a l u e", EqFlags::DEFAULT));
    }

    #[test]
    fn eq_kv_trims_around_separator() {
        let s = compound("Host :        eXample.com  ");
        assert!(s.eq_kv(b"Host", b':', b"example.com", EqFlags::CASEI));
        assert!(s.eq_kv(b"Host", b':', b"ex", EqFlags::PREFIX_CASEI));
        assert!(!s.eq_kv(b"Host", b':', b"example.com", EqFlags::DEFAULT));
    }

    #[test]
    fn chunking_never_changes_outcome() {
        let text = "Connection: Keep-Alive";
        let plain = ScatteredStr::from(text);
        let chunked = compound(text);
        let needles = ["Connection: Keep-Alive", "connection: keep-alive", "Conn", "CONN", "", "Connection: Keep-Alive!"];
        let modes = [EqFlags::DEFAULT, EqFlags::CASEI, EqFlags::PREFIX, EqFlags::PREFIX_CASEI];

        for needle in needles {
            for flags in modes {
                assert_eq!(
                    plain.eq_bytes(needle.as_bytes(), flags),
                    chunked.eq_bytes(needle.as_bytes(), flags),
                    "needle {needle:?} flags {flags:?}"
                );
            }
            for flags in modes {
                assert_eq!(
                    plain.eq_kv(b"Connection", b':', needle.as_bytes(), flags),
                    chunked.eq_kv(b"Connection", b':', needle.as_bytes(), flags),
                );
            }
        }
    }
}
