//! Small parser-combinator layer used by the RFC 3986 rules.
//!
//! A [`Rule`] consumes bytes from a [`Reader`] and yields a typed output
//! or a positional error. Every combinator here rewinds the reader to
//! its starting position on failure, so alternatives can be tried in
//! sequence.

use crate::charset::{CharSet, HEXDIG};
use crate::error::{ParseError, Result};

/// Byte span into the input being parsed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn len(&self) -> usize {
        self.end - self.start
    }
}

/// Cursor over the input bytes.
///
/// `pos` is non-decreasing except through [`Reader::rewind`].
pub(crate) struct Reader<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Reader { input, pos: 0 }
    }

    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn has_remaining(&self) -> bool {
        self.pos < self.input.len()
    }

    #[inline]
    pub fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    #[inline]
    pub fn peek_at(&self, ahead: usize) -> Option<u8> {
        self.input.get(self.pos + ahead).copied()
    }

    /// Restore a position previously obtained from [`Reader::pos`]
    #[inline]
    pub fn rewind(&mut self, pos: usize) {
        debug_assert!(pos <= self.pos);
        self.pos = pos;
    }

    /// Consume one byte unconditionally
    pub fn bump(&mut self) {
        debug_assert!(self.has_remaining());
        self.pos += 1;
    }

    /// Consume one byte if it equals `b`
    pub fn eat(&mut self, b: u8) -> bool {
        if self.peek() == Some(b) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Consume `s` if the remaining input starts with it
    pub fn eat_str(&mut self, s: &str) -> bool {
        if self.input[self.pos..].starts_with(s.as_bytes()) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }

    /// Consume bytes in `set`, returning the span consumed
    pub fn take_while(&mut self, set: &CharSet) -> Span {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if !set.contains(b) {
                break;
            }
            self.pos += 1;
        }
        Span {
            start,
            end: self.pos,
        }
    }

    /// Consume bytes in `set` or well-formed `%HH` escapes.
    /// Fails with `InvalidEncoding` on a truncated or non-hex escape.
    pub fn take_while_pct(&mut self, set: &CharSet) -> Result<Span> {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b == b'%' {
                match (self.peek_at(1), self.peek_at(2)) {
                    (Some(hi), Some(lo)) if HEXDIG.contains(hi) && HEXDIG.contains(lo) => {
                        self.pos += 3;
                    }
                    _ => return Err(ParseError::InvalidEncoding),
                }
            } else if set.contains(b) {
                self.pos += 1;
            } else {
                break;
            }
        }
        Ok(Span {
            start,
            end: self.pos,
        })
    }
}

/// A grammar rule: parses a value from the reader, or fails after
/// rewinding the reader to where it started.
pub(crate) trait Rule {
    type Output;

    fn parse(&self, r: &mut Reader<'_>) -> Result<Self::Output>;
}

/// Rule matching exactly one delimiter byte
pub(crate) struct Delim(pub u8);

impl Rule for Delim {
    type Output = ();

    fn parse(&self, r: &mut Reader<'_>) -> Result<()> {
        if r.eat(self.0) {
            Ok(())
        } else {
            Err(ParseError::Syntax {
                pos: r.pos(),
                rule: "delim",
            })
        }
    }
}

pub(crate) fn delim(b: u8) -> Delim {
    Delim(b)
}

/// Rule matching `min..` bytes from a character set, with optional
/// `%HH` escapes. Yields the matched span.
pub(crate) struct CharSetRule {
    name: &'static str,
    set: &'static CharSet,
    min: usize,
    pct: bool,
}

impl Rule for CharSetRule {
    type Output = Span;

    fn parse(&self, r: &mut Reader<'_>) -> Result<Span> {
        let start = r.pos();
        let span = if self.pct {
            match r.take_while_pct(self.set) {
                Ok(span) => span,
                Err(e) => {
                    r.rewind(start);
                    return Err(e);
                }
            }
        } else {
            r.take_while(self.set)
        };
        if span.len() < self.min {
            r.rewind(start);
            return Err(ParseError::Syntax {
                pos: span.end,
                rule: self.name,
            });
        }
        Ok(span)
    }
}

/// Repeated members of `set`, at least `min` of them
pub(crate) fn char_set(name: &'static str, set: &'static CharSet, min: usize) -> CharSetRule {
    CharSetRule {
        name,
        set,
        min,
        pct: false,
    }
}

/// Like [`char_set`] but also accepting percent escapes
pub(crate) fn pct_set(name: &'static str, set: &'static CharSet, min: usize) -> CharSetRule {
    CharSetRule {
        name,
        set,
        min,
        pct: true,
    }
}

/// Wraps a rule so that failure yields `None` instead of an error.
/// Never consumes input on failure.
pub(crate) struct Optional<R>(pub R);

impl<R: Rule> Rule for Optional<R> {
    type Output = Option<R::Output>;

    fn parse(&self, r: &mut Reader<'_>) -> Result<Option<R::Output>> {
        let start = r.pos();
        match self.0.parse(r) {
            Ok(v) => Ok(Some(v)),
            Err(_) => {
                r.rewind(start);
                Ok(None)
            }
        }
    }
}

pub(crate) fn optional<R: Rule>(rule: R) -> Optional<R> {
    Optional(rule)
}

/// Keeps a rule's consumption but discards its output
pub(crate) struct Squelch<R>(pub R);

impl<R: Rule> Rule for Squelch<R> {
    type Output = ();

    fn parse(&self, r: &mut Reader<'_>) -> Result<()> {
        self.0.parse(r).map(|_| ())
    }
}

pub(crate) fn squelch<R: Rule>(rule: R) -> Squelch<R> {
    Squelch(rule)
}

/// Sequencing: a tuple of rules parses each in order. If any element
/// fails, the reader is rewound to the start of the tuple.
impl<A: Rule, B: Rule> Rule for (A, B) {
    type Output = (A::Output, B::Output);

    fn parse(&self, r: &mut Reader<'_>) -> Result<Self::Output> {
        let start = r.pos();
        let a = self.0.parse(r)?;
        match self.1.parse(r) {
            Ok(b) => Ok((a, b)),
            Err(e) => {
                r.rewind(start);
                Err(e)
            }
        }
    }
}

impl<A: Rule, B: Rule, C: Rule> Rule for (A, B, C) {
    type Output = (A::Output, B::Output, C::Output);

    fn parse(&self, r: &mut Reader<'_>) -> Result<Self::Output> {
        let start = r.pos();
        let a = self.0.parse(r)?;
        let rest = (|| {
            let b = self.1.parse(r)?;
            let c = self.2.parse(r)?;
            Ok((b, c))
        })();
        match rest {
            Ok((b, c)) => Ok((a, b, c)),
            Err(e) => {
                r.rewind(start);
                Err(e)
            }
        }
    }
}
