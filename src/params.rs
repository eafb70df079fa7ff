//! The query params engine: an index-stable, percent-encoding-aware
//! view over the `key[=value][&...]` structure of the query.
//!
//! [`ParamsIter`] walks the encoded query in either direction without
//! allocating. [`Params`] additionally borrows the URL mutably and
//! rewrites the query in place through the storage shift primitive;
//! every edit keeps the serialized query byte-for-byte consistent with
//! the param sequence.
//!
//! Key matching decodes both sides on the fly, so `count("x")` finds
//! `%78` spellings too.

use crate::charset::{CharSet, QUERY};
use crate::compat::{Cow, String, Vec};
use crate::components::Part;
use crate::error::Result;
use crate::pct;
use crate::url::Url;
use crate::view::UriBase;
use memchr::{memchr, memchr_iter, memrchr};

/// Everything a query byte may be, except the param separator
const VALUE_CS: &CharSet = &QUERY.sub(&CharSet::new(b"&"));

/// Everything a key byte may be: no separator, no `=`
const KEY_CS: &CharSet = &QUERY.sub(&CharSet::new(b"&="));

/// One query parameter in percent-encoded form.
///
/// `value` is `None` when the param has no `=` at all; `Some("")` when
/// it ends in a bare `=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Param<'a> {
    pub key: &'a str,
    pub value: Option<&'a str>,
}

impl<'a> Param<'a> {
    /// A param without a value (serializes as just `key`)
    pub fn new(key: &'a str) -> Self {
        Param { key, value: None }
    }

    /// A key/value param (serializes as `key=value`)
    pub fn with_value(key: &'a str, value: &'a str) -> Self {
        Param {
            key,
            value: Some(value),
        }
    }

    pub fn has_value(&self) -> bool {
        self.value.is_some()
    }

    /// The key with percent-escapes decoded
    pub fn decoded_key(&self) -> Cow<'a, str> {
        pct::decode_lossy(self.key, false)
    }

    /// The value with percent-escapes decoded
    pub fn decoded_value(&self) -> Option<Cow<'a, str>> {
        self.value.map(|v| pct::decode_lossy(v, false))
    }
}

/// Split one `key[=value]` unit at the first `=`
fn split_param(s: &str) -> Param<'_> {
    match memchr(b'=', s.as_bytes()) {
        Some(i) => Param::with_value(&s[..i], &s[i + 1..]),
        None => Param::new(s),
    }
}

/// Byte offset where param `index` starts within the query content
fn start_of(query: &str, index: usize) -> usize {
    if index == 0 {
        0
    } else {
        memchr_iter(b'&', query.as_bytes())
            .nth(index - 1)
            .map_or(query.len(), |i| i + 1)
    }
}

/// Byte offset one past param content beginning at `start`
fn end_of(query: &str, start: usize) -> usize {
    memchr(b'&', &query.as_bytes()[start..]).map_or(query.len(), |i| start + i)
}

/// Double-ended iterator over the params of an encoded query.
///
/// Stepping is O(1) amortized: the cursor keeps byte offsets at both
/// ends and jumps between `&` separators.
#[derive(Debug, Clone)]
pub struct ParamsIter<'a> {
    query: &'a str,
    front: usize,
    back: usize,
    remaining: usize,
}

impl<'a> ParamsIter<'a> {
    /// Iterator over `query` content with the cached param count;
    /// `None` (an absent query) iterates nothing.
    pub(crate) fn over(query: Option<&'a str>, count: usize) -> Self {
        match query {
            Some(q) => ParamsIter {
                query: q,
                front: 0,
                back: q.len(),
                remaining: count,
            },
            None => ParamsIter {
                query: "",
                front: 0,
                back: 0,
                remaining: 0,
            },
        }
    }
}

impl<'a> Iterator for ParamsIter<'a> {
    type Item = Param<'a>;

    fn next(&mut self) -> Option<Param<'a>> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let region = &self.query[self.front..self.back];
        if self.remaining == 0 {
            self.front = self.back;
            return Some(split_param(region));
        }
        match memchr(b'&', region.as_bytes()) {
            Some(i) => {
                self.front += i + 1;
                Some(split_param(&region[..i]))
            }
            None => {
                self.front = self.back;
                self.remaining = 0;
                Some(split_param(region))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a> DoubleEndedIterator for ParamsIter<'a> {
    fn next_back(&mut self) -> Option<Param<'a>> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let region = &self.query[self.front..self.back];
        if self.remaining == 0 {
            self.back = self.front;
            return Some(split_param(region));
        }
        match memrchr(b'&', region.as_bytes()) {
            Some(i) => {
                self.back = self.front + i;
                Some(split_param(&region[i + 1..]))
            }
            None => {
                self.back = self.front;
                self.remaining = 0;
                Some(split_param(region))
            }
        }
    }
}

impl ExactSizeIterator for ParamsIter<'_> {}

impl core::iter::FusedIterator for ParamsIter<'_> {}

/// Mutable params facade over a [`Url`]'s query.
///
/// Obtained from [`Url::encoded_params`] (plain percent-encoding) or
/// [`Url::form_params`] (application/x-www-form-urlencoded: `+` reads
/// as an encoded space and the `*_pair` helpers write spaces as `+`).
///
/// Positions are indices; methods taking an index panic when it is out
/// of range. Inputs are taken already percent-encoded and validated:
/// malformed escapes or raw `&`/`#` (or `=` inside a key) fail with
/// `InvalidEncoding`/`Syntax` and leave the URL unchanged.
pub struct Params<'u> {
    url: &'u mut Url,
    form: bool,
}

impl<'u> Params<'u> {
    pub(crate) fn new(url: &'u mut Url, form: bool) -> Self {
        Params { url, form }
    }

    /// The URL this engine edits
    pub fn url(&self) -> &Url {
        self.url
    }

    /// Cached number of params. A present query always has at least
    /// one (`"?"` is one empty param); zero means the query is absent.
    pub fn len(&self) -> usize {
        self.url.core.table.nparams as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn has_query(&self) -> bool {
        self.url.core.table.is_present(Part::Query)
    }

    fn query_str(&self) -> &str {
        self.url.core.content(Part::Query)
    }

    pub fn iter(&self) -> ParamsIter<'_> {
        ParamsIter::over(self.url.encoded_query(), self.len())
    }

    /// The param at `index`, if in range
    pub fn get(&self, index: usize) -> Option<Param<'_>> {
        if index >= self.len() {
            return None;
        }
        let q = self.query_str();
        let start = start_of(q, index);
        Some(split_param(&q[start..end_of(q, start)]))
    }

    fn matches(&self, candidate: &str, key: &str, case_insensitive: bool) -> bool {
        if self.form {
            pct::eq_form(candidate, key, case_insensitive)
        } else {
            pct::eq(candidate, key, case_insensitive)
        }
    }

    fn find_impl(&self, from: usize, key: &str, ci: bool) -> Option<usize> {
        self.iter()
            .enumerate()
            .skip(from)
            .find(|(_, p)| self.matches(key, p.key, ci))
            .map(|(i, _)| i)
    }

    /// Index of the first param whose decoded key equals `key`
    pub fn find(&self, key: &str) -> Option<usize> {
        self.find_impl(0, key, false)
    }

    /// Like [`Params::find`], folding ASCII case after decoding
    pub fn find_ci(&self, key: &str) -> Option<usize> {
        self.find_impl(0, key, true)
    }

    /// First match at or after `from`
    pub fn find_from(&self, from: usize, key: &str) -> Option<usize> {
        self.find_impl(from, key, false)
    }

    pub fn find_from_ci(&self, from: usize, key: &str) -> Option<usize> {
        self.find_impl(from, key, true)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.find(key).is_some()
    }

    pub fn contains_ci(&self, key: &str) -> bool {
        self.find_ci(key).is_some()
    }

    /// Number of params whose decoded key equals `key`
    pub fn count(&self, key: &str) -> usize {
        self.iter().filter(|p| self.matches(key, p.key, false)).count()
    }

    pub fn count_ci(&self, key: &str) -> usize {
        self.iter().filter(|p| self.matches(key, p.key, true)).count()
    }

    /// Decoded value of the first param matching `key`; a valueless
    /// param yields an empty string
    pub fn value_of(&self, key: &str) -> Option<Cow<'_, str>> {
        let index = self.find(key)?;
        let q = self.query_str();
        let start = start_of(q, index);
        let param = split_param(&q[start..end_of(q, start)]);
        Some(match param.value {
            Some(v) => pct::decode_lossy(v, self.form),
            None => Cow::Borrowed(""),
        })
    }

    // ---- mutation ----

    /// Remove the query entirely; the `?` disappears
    pub fn clear(&mut self) {
        self.url.remove_query();
    }

    /// Replace the whole query with the serialized list.
    /// An empty list removes the query.
    pub fn assign(&mut self, params: &[Param<'_>]) -> Result<()> {
        validate_list(params)?;
        if params.is_empty() {
            self.url.remove_query();
            return Ok(());
        }
        let text = serialize(params);
        self.url.core.make_present(Part::Query, &text)?;
        self.url.core.table.nparams = params.len() as u32;
        Ok(())
    }

    /// Append one param; returns its index
    pub fn append(&mut self, param: Param<'_>) -> Result<usize> {
        self.append_all(&[param])
    }

    /// Append params; returns the index of the first appended (or the
    /// current length for an empty list).
    ///
    /// Appending to a present-but-empty query (`"?"`) inserts a `&`
    /// first, preserving the existing empty param: `"?"` becomes
    /// `"?&y"`.
    pub fn append_all(&mut self, params: &[Param<'_>]) -> Result<usize> {
        validate_list(params)?;
        if params.is_empty() {
            return Ok(self.len());
        }
        self.append_raw(params)
    }

    /// Insert one param before `index`; returns `index`
    pub fn insert(&mut self, index: usize, param: Param<'_>) -> Result<usize> {
        self.insert_all(index, &[param])
    }

    /// Insert params before `index`; returns the index of the first
    /// inserted.
    ///
    /// # Panics
    ///
    /// Panics if `index > len()`.
    pub fn insert_all(&mut self, index: usize, params: &[Param<'_>]) -> Result<usize> {
        assert!(index <= self.len(), "insert index out of range");
        validate_list(params)?;
        if params.is_empty() {
            return Ok(index);
        }
        if !self.has_query() || index == self.len() {
            return self.append_raw(params).map(|_| index);
        }
        let mut text = serialize(params);
        text.push('&');
        let at = start_of(self.query_str(), index);
        self.url.core.splice_in(Part::Query, at..at, &text)?;
        self.url.core.table.nparams += params.len() as u32;
        Ok(index)
    }

    /// Append pre-validated params
    fn append_raw(&mut self, params: &[Param<'_>]) -> Result<usize> {
        let old_len = self.len();
        if !self.has_query() {
            let text = serialize(params);
            self.url.core.make_present(Part::Query, &text)?;
            self.url.core.table.nparams = params.len() as u32;
            return Ok(0);
        }
        let mut text = String::from("&");
        text.push_str(&serialize(params));
        let qlen = self.url.core.table.len(Part::Query);
        self.url.core.splice_in(Part::Query, qlen..qlen, &text)?;
        self.url.core.table.nparams += params.len() as u32;
        Ok(old_len)
    }

    /// Remove the param at `index`; returns the index now holding its
    /// successor (i.e. `index`). Removing the last remaining param
    /// leaves the query absent.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    pub fn erase(&mut self, index: usize) -> usize {
        assert!(index < self.len(), "erase index out of range");
        if self.len() == 1 {
            self.url.remove_query();
            return 0;
        }
        let (bstart, bend) = {
            let q = self.query_str();
            let start = start_of(q, index);
            if index + 1 < self.len() {
                // take the trailing separator
                (start, end_of(q, start) + 1)
            } else {
                // last param: take the preceding separator
                (start - 1, q.len())
            }
        };
        // Shrinking cannot overflow
        let _ = self.url.core.splice_in(Part::Query, bstart..bend, "");
        self.url.core.table.nparams -= 1;
        index
    }

    /// Remove `range`; returns the index now holding the first param
    /// after the removed range. Removing every param leaves the query
    /// absent.
    ///
    /// # Panics
    ///
    /// Panics if the range is out of bounds.
    pub fn erase_range(&mut self, range: core::ops::Range<usize>) -> usize {
        assert!(range.start <= range.end && range.end <= self.len());
        let n = range.len();
        if n == 0 {
            return range.start;
        }
        if n == self.len() {
            self.url.remove_query();
            return 0;
        }
        let (bstart, bend) = {
            let q = self.query_str();
            let start = start_of(q, range.start);
            if range.end < self.len() {
                (start, start_of(q, range.end))
            } else {
                (start - 1, q.len())
            }
        };
        let _ = self.url.core.splice_in(Part::Query, bstart..bend, "");
        self.url.core.table.nparams -= n as u32;
        range.start
    }

    /// Remove every param whose decoded key equals `key`; returns how
    /// many were removed
    pub fn erase_key(&mut self, key: &str) -> usize {
        self.erase_key_impl(key, false)
    }

    /// Like [`Params::erase_key`], folding ASCII case after decoding
    pub fn erase_key_ci(&mut self, key: &str) -> usize {
        self.erase_key_impl(key, true)
    }

    fn erase_key_impl(&mut self, key: &str, ci: bool) -> usize {
        let matches: Vec<usize> = self
            .iter()
            .enumerate()
            .filter(|(_, p)| self.matches(key, p.key, ci))
            .map(|(i, _)| i)
            .collect();
        // back to front keeps the earlier indices stable
        for &i in matches.iter().rev() {
            self.erase(i);
        }
        matches.len()
    }

    /// Replace the param at `index`
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    pub fn replace(&mut self, index: usize, param: Param<'_>) -> Result<()> {
        assert!(index < self.len(), "replace index out of range");
        validate_param(&param)?;
        let (bstart, bend) = {
            let q = self.query_str();
            let start = start_of(q, index);
            (start, end_of(q, start))
        };
        let text = serialize(&[param]);
        self.url.core.splice_in(Part::Query, bstart..bend, &text)
    }

    /// Replace `range` with the serialized list; returns the index of
    /// the first replacement. Replacing everything with an empty list
    /// removes the query.
    ///
    /// # Panics
    ///
    /// Panics if the range is out of bounds.
    pub fn replace_range(
        &mut self,
        range: core::ops::Range<usize>,
        params: &[Param<'_>],
    ) -> Result<usize> {
        assert!(range.start <= range.end && range.end <= self.len());
        validate_list(params)?;
        if params.is_empty() {
            return Ok(self.erase_range(range));
        }
        if range.is_empty() {
            return self.insert_all(range.start, params);
        }
        let (bstart, bend) = {
            let q = self.query_str();
            let start = start_of(q, range.start);
            let end = if range.end < self.len() {
                // keep the separator before the successor
                start_of(q, range.end) - 1
            } else {
                q.len()
            };
            (start, end)
        };
        let text = serialize(params);
        self.url.core.splice_in(Part::Query, bstart..bend, &text)?;
        self.url.core.table.nparams += params.len() as u32;
        self.url.core.table.nparams -= range.len() as u32;
        Ok(range.start)
    }

    /// Give the param at `index` the given value (`has_value` becomes
    /// true; an empty value serializes as `key=`)
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    pub fn set_value(&mut self, index: usize, value: &str) -> Result<()> {
        assert!(index < self.len(), "set_value index out of range");
        crate::rfc::validate_component(value, VALUE_CS, "query-value")?;
        let (bstart, bend, needs_eq) = {
            let q = self.query_str();
            let start = start_of(q, index);
            let end = end_of(q, start);
            match memchr(b'=', q[start..end].as_bytes()) {
                Some(eq) => (start + eq + 1, end, false),
                None => (end, end, true),
            }
        };
        let mut text = String::with_capacity(value.len() + 1);
        if needs_eq {
            text.push('=');
        }
        text.push_str(value);
        self.url.core.splice_in(Part::Query, bstart..bend, &text)
    }

    /// Drop the param's value: the `=` and everything after it go away,
    /// the key remains. Idempotent.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    pub fn unset(&mut self, index: usize) {
        assert!(index < self.len(), "unset index out of range");
        let range = {
            let q = self.query_str();
            let start = start_of(q, index);
            let end = end_of(q, start);
            memchr(b'=', q[start..end].as_bytes()).map(|eq| (start + eq, end))
        };
        if let Some((bstart, bend)) = range {
            let _ = self.url.core.splice_in(Part::Query, bstart..bend, "");
        }
    }

    /// Set `key` to `value`: the first matching param keeps its key
    /// spelling and receives the value, every other match is erased;
    /// with no match the pair is appended. Returns the index of the
    /// single match.
    pub fn set(&mut self, key: &str, value: &str) -> Result<usize> {
        self.set_impl(key, value, false)
    }

    /// Like [`Params::set`], matching keys case-insensitively
    pub fn set_ci(&mut self, key: &str, value: &str) -> Result<usize> {
        self.set_impl(key, value, true)
    }

    fn set_impl(&mut self, key: &str, value: &str, ci: bool) -> Result<usize> {
        crate::rfc::validate_component(key, KEY_CS, "query-key")?;
        crate::rfc::validate_component(value, VALUE_CS, "query-value")?;
        let matches: Vec<usize> = self
            .iter()
            .enumerate()
            .filter(|(_, p)| self.matches(key, p.key, ci))
            .map(|(i, _)| i)
            .collect();
        match matches.split_first() {
            Some((&first, rest)) => {
                self.set_value(first, value)?;
                for &i in rest.iter().rev() {
                    self.erase(i);
                }
                Ok(first)
            }
            None => {
                let index = self.len();
                self.append_raw(&[Param::with_value(key, value)])?;
                Ok(index)
            }
        }
    }

    // ---- decoded-input helpers ----

    /// Append a decoded key/value pair, encoding it for the query
    /// (form mode writes spaces as `+`); returns the new index
    pub fn append_pair(&mut self, key: &str, value: &str) -> Result<usize> {
        let (k, v) = self.encode_pair(key, value);
        self.append(Param::with_value(&k, &v))
    }

    /// [`Params::set`] with a decoded key/value pair
    pub fn set_pair(&mut self, key: &str, value: &str) -> Result<usize> {
        let (k, v) = self.encode_pair(key, value);
        self.set_impl(&k, &v, false)
    }

    fn encode_pair(&self, key: &str, value: &str) -> (String, String) {
        if self.form {
            (pct::encode_form(key), pct::encode_form(value))
        } else {
            (
                pct::encode(key, pct::QUERY_VALUE_SET),
                pct::encode(value, pct::QUERY_VALUE_SET),
            )
        }
    }
}

impl<'a> IntoIterator for &'a Params<'_> {
    type Item = Param<'a>;
    type IntoIter = ParamsIter<'a>;

    fn into_iter(self) -> ParamsIter<'a> {
        self.iter()
    }
}

impl core::fmt::Debug for Params<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

fn serialize(params: &[Param<'_>]) -> String {
    let mut out = String::new();
    for (i, p) in params.iter().enumerate() {
        if i > 0 {
            out.push('&');
        }
        out.push_str(p.key);
        if let Some(v) = p.value {
            out.push('=');
            out.push_str(v);
        }
    }
    out
}

fn validate_param(p: &Param<'_>) -> Result<()> {
    crate::rfc::validate_component(p.key, KEY_CS, "query-key")?;
    if let Some(v) = p.value {
        crate::rfc::validate_component(v, VALUE_CS, "query-value")?;
    }
    Ok(())
}

fn validate_list(params: &[Param<'_>]) -> Result<()> {
    params.iter().try_for_each(validate_param)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_iter_forward() {
        let u = url("?k0=0&k1=1&k2=&k3&k4=4444");
        let params: Vec<Param<'_>> = u.params().collect();
        assert_eq!(
            params,
            [
                Param::with_value("k0", "0"),
                Param::with_value("k1", "1"),
                Param::with_value("k2", ""),
                Param::new("k3"),
                Param::with_value("k4", "4444"),
            ]
        );
    }

    #[test]
    fn test_iter_backward() {
        let u = url("?a=1&b&c=3");
        let back: Vec<Param<'_>> = u.params().rev().collect();
        assert_eq!(
            back,
            [
                Param::with_value("c", "3"),
                Param::new("b"),
                Param::with_value("a", "1"),
            ]
        );
    }

    #[test]
    fn test_iter_meet_in_middle() {
        let u = url("?a&b&c");
        let mut it = u.params();
        assert_eq!(it.next().unwrap().key, "a");
        assert_eq!(it.next_back().unwrap().key, "c");
        assert_eq!(it.next().unwrap().key, "b");
        assert!(it.next().is_none());
        assert!(it.next_back().is_none());
    }

    #[test]
    fn test_empty_query_is_one_param() {
        let u = url("?");
        let params: Vec<Param<'_>> = u.params().collect();
        assert_eq!(params, [Param::new("")]);

        let u = url("?&");
        let params: Vec<Param<'_>> = u.params().collect();
        assert_eq!(params, [Param::new(""), Param::new("")]);
    }

    #[test]
    fn test_absent_query_iterates_nothing() {
        let u = url("/p");
        assert_eq!(u.params().count(), 0);
    }

    #[test]
    fn test_exact_size() {
        let u = url("?a&b&c");
        let it = u.params();
        assert_eq!(it.len(), 3);
    }

    #[test]
    fn test_get_and_value_of() {
        let mut u = url("?a=1&b&c=x%20y");
        let p = u.encoded_params();
        assert_eq!(p.get(0), Some(Param::with_value("a", "1")));
        assert_eq!(p.get(1), Some(Param::new("b")));
        assert_eq!(p.get(3), None);
        assert_eq!(p.value_of("c").unwrap(), "x y");
        assert_eq!(p.value_of("b").unwrap(), "");
        assert!(p.value_of("zz").is_none());
    }

    #[test]
    fn test_pct_decoded_matching() {
        let mut u = url("?%78=1&%79=2&%78=3&%7a=4");
        let p = u.encoded_params();
        assert_eq!(p.count("x"), 2);
        assert_eq!(p.count("%78"), 2);
        assert_eq!(p.count("%58"), 0);
        assert_eq!(p.count_ci("%58"), 2);
        assert_eq!(p.find("x"), Some(0));
        assert_eq!(p.find_from(1, "x"), Some(2));
        assert!(p.contains("z"));
        assert!(!p.contains("Z"));
        assert!(p.contains_ci("Z"));
    }

    #[test]
    fn test_validation_failures_leave_url_unchanged() {
        let mut u = url("?a=1");
        let before = u.as_str().to_string();
        let mut p = u.encoded_params();
        assert!(p.append(Param::new("bad%zz")).is_err());
        assert!(p.append(Param::new("a&b")).is_err());
        assert!(p.append(Param::new("a=b")).is_err());
        assert!(p.append(Param::with_value("k", "v&w")).is_err());
        // "=" is fine inside a value
        assert!(p.append(Param::with_value("k", "v=w")).is_ok());
        assert!(u.as_str().starts_with(&before));
    }

    #[test]
    fn test_form_mode_matching() {
        let mut u = url("?a+b=1");
        assert_eq!(u.encoded_params().count("a%20b"), 0);
        assert_eq!(u.form_params().count("a%20b"), 1);
    }

    #[test]
    fn test_form_mode_pairs() {
        let mut u = url("/p");
        let mut p = u.form_params();
        p.append_pair("key", "value with spaces").unwrap();
        p.append_pair("math", "1+1=2").unwrap();
        drop(p);
        assert_eq!(
            u.as_str(),
            "/p?key=value+with+spaces&math=1%2B1%3D2"
        );
        assert_eq!(
            u.form_params().value_of("math").unwrap(),
            "1+1=2"
        );
    }
}
