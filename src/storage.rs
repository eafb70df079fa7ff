//! Aggregated URL storage: one canonical buffer plus the component
//! position table. All mutation funnels through [`UrlCore::splice`],
//! which relocates every later component and keeps the table coherent.

use crate::compat::String;
use crate::components::{Part, PartTable};
use crate::error::{ParseError, Result};

/// Owned URL storage. The buffer always holds the canonical serialized
/// form; the table indexes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct UrlCore {
    buffer: String,
    pub table: PartTable,
}

impl UrlCore {
    /// An empty URL: no components, empty (but existing) path
    pub fn new() -> Self {
        let mut table = PartTable::new();
        table.set(Part::Path, 0, 0);
        UrlCore {
            buffer: String::new(),
            table,
        }
    }

    pub fn from_parts(buffer: String, table: PartTable) -> Self {
        let core = UrlCore { buffer, table };
        core.check();
        core
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.buffer
    }

    /// Borrow the content of a present part
    pub fn content(&self, p: Part) -> &str {
        &self.buffer[self.table.span(p)]
    }

    /// The shift primitive: replace `range` with `text`, then shift the
    /// offsets of every part after `edited` by the length delta. The
    /// caller updates the edited part's own table entry.
    fn splice(&mut self, edited: Part, range: core::ops::Range<usize>, text: &str) -> Result<()> {
        let delta = text.len() as isize - range.len() as isize;
        if delta > 0 && self.buffer.len() + delta as usize > u32::MAX as usize {
            return Err(ParseError::Oversize);
        }
        self.buffer.replace_range(range, text);
        self.table.shift_after(edited, delta);
        Ok(())
    }

    /// Replace the content of a present part
    pub fn set_content(&mut self, p: Part, text: &str) -> Result<()> {
        let range = self.table.span(p);
        self.splice(p, range, text)?;
        let off = self.table.offset(p);
        self.table.set(p, off, text.len());
        self.check();
        Ok(())
    }

    /// Make a part present with the given content, inserting its
    /// separators; replaces the content if already present.
    ///
    /// For [`Part::Host`] the caller must ensure userinfo and port are
    /// absent or already positioned inside an existing authority.
    pub fn make_present(&mut self, p: Part, text: &str) -> Result<()> {
        if self.table.is_present(p) {
            return self.set_content(p, text);
        }
        let anchor = self.table.offset(p);
        let mut insertion = String::with_capacity(text.len() + 2);
        match p {
            Part::Scheme => {
                insertion.push_str(text);
                insertion.push(':');
            }
            Part::Userinfo => {
                insertion.push_str(text);
                insertion.push('@');
            }
            Part::Host => {
                insertion.push_str("//");
                insertion.push_str(text);
            }
            Part::Port => {
                insertion.push(':');
                insertion.push_str(text);
            }
            // The path always exists; it never transitions to present.
            Part::Path => unreachable!("path is always present"),
            Part::Query => {
                insertion.push('?');
                insertion.push_str(text);
            }
            Part::Fragment => {
                insertion.push('#');
                insertion.push_str(text);
            }
        }
        self.splice(p, anchor..anchor, &insertion)?;
        self.table
            .set(p, anchor + p.sep_prefix() as usize, text.len());
        if p == Part::Host {
            // userinfo would now be inserted between "//" and the host
            self.table
                .set_absent(Part::Userinfo, anchor + Part::Host.sep_prefix() as usize);
        }
        self.check();
        Ok(())
    }

    /// Remove a part and the separators it owns.
    ///
    /// Removing the host assumes userinfo and port were removed first.
    pub fn remove_part(&mut self, p: Part) {
        if !self.table.is_present(p) {
            return;
        }
        let span = self.table.span(p);
        let start = span.start - p.sep_prefix() as usize;
        let end = span.start + span.len() + (p.sep_len() - p.sep_prefix()) as usize;
        // Shrinking cannot fail the size guard
        let _ = self.splice(p, start..end, "");
        self.table.set_absent(p, start);
        if p == Part::Host {
            self.table.set_absent(Part::Userinfo, start);
            self.table.set_absent(Part::Port, start);
        }
        self.check();
    }

    /// Edit a byte range inside a present part's content. `rel` is
    /// relative to the content start. Element counts are the caller's
    /// responsibility.
    pub fn splice_in(&mut self, p: Part, rel: core::ops::Range<usize>, text: &str) -> Result<()> {
        let span = self.table.span(p);
        debug_assert!(rel.end <= span.len());
        let abs = span.start + rel.start..span.start + rel.end;
        let new_len = span.len() - rel.len() + text.len();
        self.splice(p, abs, text)?;
        let off = self.table.offset(p);
        self.table.set(p, off, new_len);
        self.check();
        Ok(())
    }

    #[inline]
    pub fn check(&self) {
        #[cfg(debug_assertions)]
        self.table.check(self.buffer.len());
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn empty() -> UrlCore {
        UrlCore::new()
    }

    #[test]
    fn test_build_up_from_empty() {
        let mut u = empty();
        u.make_present(Part::Scheme, "http").unwrap();
        assert_eq!(u.as_str(), "http:");

        u.make_present(Part::Host, "example.com").unwrap();
        assert_eq!(u.as_str(), "http://example.com");

        u.make_present(Part::Userinfo, "user").unwrap();
        assert_eq!(u.as_str(), "http://user@example.com");

        u.make_present(Part::Port, "8080").unwrap();
        assert_eq!(u.as_str(), "http://user@example.com:8080");

        u.set_content(Part::Path, "/path").unwrap();
        assert_eq!(u.as_str(), "http://user@example.com:8080/path");

        u.make_present(Part::Query, "k=v").unwrap();
        assert_eq!(u.as_str(), "http://user@example.com:8080/path?k=v");

        u.make_present(Part::Fragment, "f").unwrap();
        assert_eq!(u.as_str(), "http://user@example.com:8080/path?k=v#f");

        assert_eq!(u.content(Part::Host), "example.com");
        assert_eq!(u.content(Part::Query), "k=v");
    }

    #[test]
    fn test_remove_parts() {
        let mut u = empty();
        u.make_present(Part::Scheme, "http").unwrap();
        u.make_present(Part::Host, "h").unwrap();
        u.make_present(Part::Userinfo, "u").unwrap();
        u.make_present(Part::Port, "80").unwrap();
        u.set_content(Part::Path, "/p").unwrap();
        u.make_present(Part::Query, "q").unwrap();
        u.make_present(Part::Fragment, "f").unwrap();
        assert_eq!(u.as_str(), "http://u@h:80/p?q#f");

        u.remove_part(Part::Query);
        assert_eq!(u.as_str(), "http://u@h:80/p#f");

        u.remove_part(Part::Port);
        u.remove_part(Part::Userinfo);
        u.remove_part(Part::Host);
        assert_eq!(u.as_str(), "http:/p#f");

        u.remove_part(Part::Scheme);
        assert_eq!(u.as_str(), "/p#f");

        u.remove_part(Part::Fragment);
        assert_eq!(u.as_str(), "/p");
    }

    #[test]
    fn test_reinsert_after_removal() {
        let mut u = empty();
        u.make_present(Part::Scheme, "s").unwrap();
        u.set_content(Part::Path, "/a").unwrap();
        u.make_present(Part::Fragment, "f").unwrap();
        assert_eq!(u.as_str(), "s:/a#f");

        // query lands between path and fragment
        u.make_present(Part::Query, "x=1").unwrap();
        assert_eq!(u.as_str(), "s:/a?x=1#f");

        u.remove_part(Part::Query);
        assert_eq!(u.as_str(), "s:/a#f");
        u.make_present(Part::Query, "").unwrap();
        assert_eq!(u.as_str(), "s:/a?#f");
    }

    #[test]
    fn test_content_resize_relocates_neighbors() {
        let mut u = empty();
        u.make_present(Part::Host, "h").unwrap();
        u.set_content(Part::Path, "/p").unwrap();
        u.make_present(Part::Query, "q").unwrap();
        assert_eq!(u.as_str(), "//h/p?q");

        u.set_content(Part::Host, "example.com").unwrap();
        assert_eq!(u.as_str(), "//example.com/p?q");
        assert_eq!(u.content(Part::Query), "q");

        u.set_content(Part::Host, "").unwrap();
        assert_eq!(u.as_str(), "///p?q");
    }

    #[test]
    fn test_splice_in() {
        let mut u = empty();
        u.make_present(Part::Query, "a=1&b=2").unwrap();
        assert_eq!(u.as_str(), "?a=1&b=2");

        // replace "b=2" with "bee=22"
        u.splice_in(Part::Query, 4..7, "bee=22").unwrap();
        assert_eq!(u.as_str(), "?a=1&bee=22");

        // insert at front
        u.splice_in(Part::Query, 0..0, "z&").unwrap();
        assert_eq!(u.as_str(), "?z&a=1&bee=22");
    }
}
