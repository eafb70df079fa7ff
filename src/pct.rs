//! Percent-encoding and decoding.
//!
//! Encode sets follow RFC 3986: each set keeps a component's allowed
//! characters and percent-encodes the rest. Decoding is strict on the
//! write path (`validate`, `decode`) and lossy on the read path
//! (`decode_lossy`), where content has already been validated.

use crate::compat::{Cow, String, ToString, Vec};
use crate::error::{ParseError, Result};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Userinfo percent-encode set.
/// Keeps `unreserved / sub-delims / ":"`.
pub const USERINFO_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'!')
    .remove(b'$')
    .remove(b'&')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'*')
    .remove(b'+')
    .remove(b',')
    .remove(b';')
    .remove(b'=')
    .remove(b':');

/// Host (reg-name) percent-encode set.
/// Keeps `unreserved / sub-delims`.
pub const HOST_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'!')
    .remove(b'$')
    .remove(b'&')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'*')
    .remove(b'+')
    .remove(b',')
    .remove(b';')
    .remove(b'=');

/// Path percent-encode set.
/// Keeps `pchar / "/"`.
pub const PATH_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'!')
    .remove(b'$')
    .remove(b'&')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'*')
    .remove(b'+')
    .remove(b',')
    .remove(b';')
    .remove(b'=')
    .remove(b':')
    .remove(b'@')
    .remove(b'/');

/// Query and fragment percent-encode set.
/// Keeps `pchar / "/" / "?"`.
pub const QUERY_SET: &AsciiSet = &PATH_SET.remove(b'?');

/// Fragment percent-encode set (same characters as the query)
pub const FRAGMENT_SET: &AsciiSet = QUERY_SET;

/// Encode set for a single query key or value.
/// Like [`QUERY_SET`] but also encodes the `&` and `=` separators so the
/// result cannot split a param.
pub const QUERY_VALUE_SET: &AsciiSet = &QUERY_SET.add(b'&').add(b'=');

/// Percent-encode a string using the given encode set
pub fn encode(input: &str, set: &'static AsciiSet) -> String {
    utf8_percent_encode(input, set).to_string()
}

/// Write a percent-encoded string directly into a buffer
pub fn encode_into(buffer: &mut String, input: &str, set: &'static AsciiSet) {
    buffer.reserve(input.len());
    for chunk in utf8_percent_encode(input, set) {
        buffer.push_str(chunk);
    }
}

/// Encode a query key or value for application/x-www-form-urlencoded:
/// space becomes `+`, unreserved bytes pass through, everything else
/// becomes `%HH`.
pub fn encode_form(input: &str) -> String {
    use core::fmt::Write;

    let mut result = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                result.push(byte as char);
            }
            b' ' => result.push('+'),
            _ => {
                let _ = write!(result, "%{byte:02X}");
            }
        }
    }
    result
}

/// Decode one hex digit, or None
#[inline]
fn hex_val(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Check that every `%` in the input begins a well-formed `%HH` escape
pub fn validate(input: &str) -> Result<()> {
    let bytes = input.as_bytes();
    let mut i = 0;
    while let Some(rel) = memchr::memchr(b'%', &bytes[i..]) {
        let at = i + rel;
        if at + 2 >= bytes.len()
            || hex_val(bytes[at + 1]).is_none()
            || hex_val(bytes[at + 2]).is_none()
        {
            return Err(ParseError::InvalidEncoding);
        }
        i = at + 3;
    }
    Ok(())
}

/// Strictly decode a percent-encoded string to bytes.
/// Fails with `InvalidEncoding` on a truncated or non-hex escape.
/// If `plus_as_space`, `+` decodes to a space.
pub fn decode(input: &str, plus_as_space: bool) -> Result<Vec<u8>> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                if i + 2 >= bytes.len() {
                    return Err(ParseError::InvalidEncoding);
                }
                let (hi, lo) = (hex_val(bytes[i + 1]), hex_val(bytes[i + 2]));
                match (hi, lo) {
                    (Some(hi), Some(lo)) => out.push((hi << 4) | lo),
                    _ => return Err(ParseError::InvalidEncoding),
                }
                i += 3;
            }
            b'+' if plus_as_space => {
                out.push(b' ');
                i += 1;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    Ok(out)
}

/// Decode pre-validated content for a read accessor.
/// Malformed escapes pass through literally; invalid UTF-8 is replaced.
pub fn decode_lossy(input: &str, plus_as_space: bool) -> Cow<'_, str> {
    if !plus_as_space || memchr::memchr(b'+', input.as_bytes()).is_none() {
        return percent_encoding::percent_decode_str(input).decode_utf8_lossy();
    }
    let mut out = Vec::with_capacity(input.len());
    let mut cursor = Cursor::new(input.as_bytes(), true);
    while let Some(b) = cursor.next_byte() {
        out.push(b);
    }
    Cow::Owned(String::from_utf8_lossy(&out).into_owned())
}

/// Walks a percent-encoded byte string, yielding decoded bytes without
/// allocating. Malformed escapes yield the literal `%`.
struct Cursor<'a> {
    bytes: &'a [u8],
    i: usize,
    plus_as_space: bool,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8], plus_as_space: bool) -> Self {
        Cursor {
            bytes,
            i: 0,
            plus_as_space,
        }
    }

    fn next_byte(&mut self) -> Option<u8> {
        let b = *self.bytes.get(self.i)?;
        if b == b'%' && self.i + 2 < self.bytes.len() {
            if let (Some(hi), Some(lo)) = (
                hex_val(self.bytes[self.i + 1]),
                hex_val(self.bytes[self.i + 2]),
            ) {
                self.i += 3;
                return Some((hi << 4) | lo);
            }
        }
        self.i += 1;
        if b == b'+' && self.plus_as_space {
            Some(b' ')
        } else {
            Some(b)
        }
    }
}

fn eq_impl(a: &str, b: &str, case_insensitive: bool, plus_as_space: bool) -> bool {
    let mut ca = Cursor::new(a.as_bytes(), plus_as_space);
    let mut cb = Cursor::new(b.as_bytes(), plus_as_space);
    loop {
        match (ca.next_byte(), cb.next_byte()) {
            (None, None) => return true,
            (Some(x), Some(y)) => {
                let (x, y) = if case_insensitive {
                    (x.to_ascii_lowercase(), y.to_ascii_lowercase())
                } else {
                    (x, y)
                };
                if x != y {
                    return false;
                }
            }
            _ => return false,
        }
    }
}

/// Compare two percent-encoded strings by decoding on the fly.
/// No allocation. If `case_insensitive`, ASCII letters are folded after
/// decoding.
pub fn eq(a: &str, b: &str, case_insensitive: bool) -> bool {
    eq_impl(a, b, case_insensitive, false)
}

/// Like [`eq`] but treats `+` as an encoded space on both sides
/// (application/x-www-form-urlencoded)
pub fn eq_form(a: &str, b: &str, case_insensitive: bool) -> bool {
    eq_impl(a, b, case_insensitive, true)
}
