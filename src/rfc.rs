//! RFC 3986 grammar rules and parse entry points.
//!
//! Each entry point validates its production over the whole input and
//! returns a [`UrlView`] whose component table indexes the input bytes.
//! Nothing is copied.

use crate::charset::{
    DIGIT, FRAGMENT, HEXDIG, IPV_FUTURE, PATH, QUERY, REG_NAME, SCHEME, SEGMENT_NZ_NC, USERINFO,
};
use crate::components::{Part, PartTable};
use crate::error::{ParseError, Result};
use crate::grammar::{char_set, delim, optional, pct_set, squelch, Reader, Rule};
use crate::view::{UriBase, UrlView};
use crate::{ipv4, ipv6};

/// Which URI production an entry point enforces
#[derive(Clone, Copy, PartialEq, Eq)]
enum RefKind {
    /// `URI-reference = URI / relative-ref`
    UriReference,
    /// `relative-ref` only: a scheme is a syntax error
    RelativeRef,
}

fn guard(input: &str) -> Result<()> {
    if input.len() > u32::MAX as usize {
        return Err(ParseError::Oversize);
    }
    if memchr::memchr(0, input.as_bytes()).is_some() {
        return Err(ParseError::IllegalNull);
    }
    Ok(())
}

/// Number of path segments. The empty path has none; `"/"` has one
/// (empty) segment; a leading slash does not add a segment of its own.
pub(crate) fn count_segments(path: &str) -> u32 {
    if path.is_empty() {
        return 0;
    }
    let rel = path.strip_prefix('/').unwrap_or(path);
    rel.split('/').count() as u32
}

/// Number of query params: one more than the number of `&` separators.
/// Only meaningful for a present query; `""` (a lone `?`) is one empty
/// param.
pub(crate) fn count_params(query: &str) -> u32 {
    1 + memchr::memchr_iter(b'&', query.as_bytes()).count() as u32
}

/// Parse a `URI-reference`
pub fn parse_uri_reference(input: &str) -> Result<UrlView<'_>> {
    guard(input)?;
    let table = parse_ref(input, RefKind::UriReference)?;
    Ok(UrlView::new(input, table))
}

/// Parse a `URI`: a URI-reference with a scheme
pub fn parse_uri(input: &str) -> Result<UrlView<'_>> {
    let view = parse_uri_reference(input)?;
    if !view.has_scheme() {
        return Err(ParseError::MissingScheme);
    }
    Ok(view)
}

/// Parse an `absolute-URI`: a URI without a fragment
pub fn parse_absolute_uri(input: &str) -> Result<UrlView<'_>> {
    let view = parse_uri(input)?;
    if view.has_fragment() {
        return Err(ParseError::Syntax {
            pos: view.table().offset(Part::Fragment) - 1,
            rule: "absolute-URI",
        });
    }
    Ok(view)
}

/// Parse a `relative-ref`: a URI-reference without a scheme
pub fn parse_relative_ref(input: &str) -> Result<UrlView<'_>> {
    guard(input)?;
    let table = parse_ref(input, RefKind::RelativeRef)?;
    Ok(UrlView::new(input, table))
}

/// Parse an `origin-form` request target: `absolute-path [ "?" query ]`
pub fn parse_origin_form(input: &str) -> Result<UrlView<'_>> {
    guard(input)?;
    let mut r = Reader::new(input.as_bytes());
    let mut t = PartTable::new();

    if r.peek() != Some(b'/') {
        return Err(ParseError::Syntax {
            pos: 0,
            rule: "origin-form",
        });
    }
    let path = r.take_while_pct(PATH)?;
    t.set(Part::Path, path.start, path.len());
    t.nsegments = count_segments(&input[path.start..path.end]);

    if r.eat(b'?') {
        let q = r.take_while_pct(QUERY)?;
        t.set(Part::Query, q.start, q.len());
        t.nparams = count_params(&input[q.start..q.end]);
    } else {
        t.set_absent(Part::Query, r.pos());
    }
    t.set_absent(Part::Fragment, r.pos());

    if r.has_remaining() {
        return Err(ParseError::Syntax {
            pos: r.pos(),
            rule: "origin-form",
        });
    }
    Ok(UrlView::new(input, t))
}

/// Parse an `authority` component alone:
/// `[ userinfo "@" ] host [ ":" port ]`
pub fn parse_authority(input: &str) -> Result<UrlView<'_>> {
    guard(input)?;
    let mut r = Reader::new(input.as_bytes());
    let mut t = PartTable::new();
    t.set_absent(Part::Scheme, 0);

    parse_authority_inner(&mut r, &mut t, input)?;
    t.set(Part::Path, r.pos(), 0);
    t.set_absent(Part::Query, r.pos());
    t.set_absent(Part::Fragment, r.pos());

    if r.has_remaining() {
        return Err(ParseError::Syntax {
            pos: r.pos(),
            rule: "authority",
        });
    }
    Ok(UrlView::new(input, t))
}

/// Parse a path alone (any of the RFC path variants)
pub fn parse_path(input: &str) -> Result<UrlView<'_>> {
    guard(input)?;
    let mut r = Reader::new(input.as_bytes());
    let mut t = PartTable::new();

    let path = r.take_while_pct(PATH)?;
    if r.has_remaining() {
        return Err(ParseError::Syntax {
            pos: r.pos(),
            rule: "path",
        });
    }
    t.set(Part::Path, path.start, path.len());
    t.nsegments = count_segments(input);
    t.set_absent(Part::Query, r.pos());
    t.set_absent(Part::Fragment, r.pos());
    Ok(UrlView::new(input, t))
}

/// Parse query content alone (no leading `?`).
/// The query is present on the resulting view, even when empty.
pub fn parse_query(input: &str) -> Result<UrlView<'_>> {
    guard(input)?;
    let mut r = Reader::new(input.as_bytes());
    let mut t = PartTable::new();
    t.set(Part::Path, 0, 0);

    let q = r.take_while_pct(QUERY)?;
    if r.has_remaining() {
        return Err(ParseError::Syntax {
            pos: r.pos(),
            rule: "query",
        });
    }
    t.set(Part::Query, q.start, q.len());
    t.nparams = count_params(input);
    t.set_absent(Part::Fragment, r.pos());
    Ok(UrlView::new(input, t))
}

/// The URI-reference driver
fn parse_ref(input: &str, kind: RefKind) -> Result<PartTable> {
    let bytes = input.as_bytes();
    let mut r = Reader::new(bytes);
    let mut t = PartTable::new();

    // scheme = ALPHA *( ALPHA / DIGIT / "+" / "-" / "." )
    let mut has_scheme = false;
    if kind == RefKind::UriReference {
        let span = r.take_while(SCHEME);
        if span.len() > 0 && r.peek() == Some(b':') {
            if !bytes[0].is_ascii_alphabetic() {
                return Err(ParseError::Syntax {
                    pos: 0,
                    rule: "scheme",
                });
            }
            t.set(Part::Scheme, 0, span.len());
            r.eat(b':');
            has_scheme = true;
        } else {
            r.rewind(0);
        }
    }
    if !has_scheme {
        t.set_absent(Part::Scheme, 0);
    }

    // hier-part / relative-part: authority comes after "//"
    let has_authority = r.eat_str("//");
    if has_authority {
        parse_authority_inner(&mut r, &mut t, input)?;
    } else {
        let anchor = r.pos();
        t.set_absent(Part::Userinfo, anchor);
        t.set_absent(Part::Host, anchor);
        t.set_absent(Part::Port, anchor);
    }

    // path
    let path_start = r.pos();
    if has_authority {
        // path-abempty: empty or beginning with "/"
        let span = r.take_while_pct(PATH)?;
        if span.len() > 0 && bytes[span.start] != b'/' {
            return Err(ParseError::Syntax {
                pos: span.start,
                rule: "path-abempty",
            });
        }
    } else if has_scheme || r.peek() == Some(b'/') {
        // path-absolute / path-rootless / path-empty
        r.take_while_pct(PATH)?;
    } else {
        // path-noscheme: the first segment must not contain ":"
        r.take_while_pct(SEGMENT_NZ_NC)?;
        if r.peek() == Some(b':') {
            return Err(ParseError::Syntax {
                pos: r.pos(),
                rule: "segment-nz-nc",
            });
        }
        r.take_while_pct(PATH)?;
    }
    t.set(Part::Path, path_start, r.pos() - path_start);
    t.nsegments = count_segments(&input[path_start..r.pos()]);

    // query
    if r.eat(b'?') {
        let span = r.take_while_pct(QUERY)?;
        t.set(Part::Query, span.start, span.len());
        t.nparams = count_params(&input[span.start..span.end]);
    } else {
        t.set_absent(Part::Query, r.pos());
    }

    // fragment
    let mut last_rule = if t.is_present(Part::Query) {
        "query"
    } else {
        "path"
    };
    if r.eat(b'#') {
        let frag_start = r.pos();
        r.take_while_pct(FRAGMENT)?;
        t.set(Part::Fragment, frag_start, r.pos() - frag_start);
        last_rule = "fragment";
    } else {
        t.set_absent(Part::Fragment, r.pos());
    }

    if r.has_remaining() {
        return Err(ParseError::Syntax {
            pos: r.pos(),
            rule: last_rule,
        });
    }
    Ok(t)
}

/// `authority = [ userinfo "@" ] host [ ":" port ]`
///
/// The reader sits right after the `//`; on success it rests at the
/// first byte after the authority (`/`, `?`, `#`, or end).
fn parse_authority_inner(r: &mut Reader<'_>, t: &mut PartTable, input: &str) -> Result<()> {
    let auth_start = r.pos();

    // Probe for userinfo: scan userinfo chars (which include ":") and
    // see whether an "@" terminates them.
    let probe = r.take_while_pct(USERINFO)?;
    if r.peek() == Some(b'@') {
        t.set(Part::Userinfo, probe.start, probe.len());
        r.eat(b'@');
    } else {
        r.rewind(auth_start);
        t.set_absent(Part::Userinfo, auth_start);
    }

    // host = IP-literal / IPv4address / reg-name
    let host_start = r.pos();
    if r.eat(b'[') {
        scan_ip_literal(r, input, host_start)?;
    } else {
        r.take_while_pct(REG_NAME)?;
    }
    t.set(Part::Host, host_start, r.pos() - host_start);

    // port = *DIGIT
    let port_rule = optional((squelch(delim(b':')), char_set("port", DIGIT, 0)));
    match port_rule.parse(r)? {
        Some(((), span)) => t.set(Part::Port, span.start, span.len()),
        None => t.set_absent(Part::Port, r.pos()),
    }
    Ok(())
}

/// Validate a bracketed IP literal. The reader sits right after `[`.
fn scan_ip_literal(r: &mut Reader<'_>, input: &str, lit_start: usize) -> Result<()> {
    let inner_start = r.pos();
    loop {
        match r.peek() {
            Some(b']') => break,
            // An unclosed bracket cannot extend past the authority
            Some(b'/') | Some(b'?') | Some(b'#') | None => {
                return Err(ParseError::Syntax {
                    pos: lit_start,
                    rule: "IP-literal",
                });
            }
            Some(_) => r.bump(),
        }
    }
    let inner = &input[inner_start..r.pos()];
    r.eat(b']');

    validate_ip_literal_inner(inner).map_err(|e| match e {
        ParseError::Syntax { rule, .. } => ParseError::Syntax {
            pos: lit_start,
            rule,
        },
        other => other,
    })
}

/// Validate the content of a bracketed IP literal
fn validate_ip_literal_inner(inner: &str) -> Result<()> {
    if inner.starts_with(['v', 'V']) {
        // IPvFuture = "v" 1*HEXDIG "." 1*( unreserved / sub-delims / ":" )
        let rule = (
            char_set("HEXDIG", HEXDIG, 1),
            delim(b'.'),
            char_set("IPvFuture", IPV_FUTURE, 1),
        );
        let mut vr = Reader::new(inner[1..].as_bytes());
        match rule.parse(&mut vr) {
            Ok(_) if !vr.has_remaining() => Ok(()),
            _ => Err(ParseError::Syntax {
                pos: 0,
                rule: "IPvFuture",
            }),
        }
    } else {
        ipv6::parse_ipv6(inner).map(|_| ())
    }
}

/// Validate that the whole input is drawn from `set` plus well-formed
/// percent escapes. Used by the encoded-component setters.
pub(crate) fn validate_component(
    s: &str,
    set: &'static crate::charset::CharSet,
    rule: &'static str,
) -> Result<()> {
    let mut r = Reader::new(s.as_bytes());
    pct_set(rule, set, 0).parse(&mut r)?;
    if r.has_remaining() {
        return Err(ParseError::Syntax {
            pos: r.pos(),
            rule,
        });
    }
    Ok(())
}

/// Validate a host for `set_encoded_host`: a bracketed IP literal or a
/// reg-name
pub(crate) fn validate_host(s: &str) -> Result<()> {
    if let Some(rest) = s.strip_prefix('[') {
        let inner = rest.strip_suffix(']').ok_or(ParseError::Syntax {
            pos: 0,
            rule: "IP-literal",
        })?;
        validate_ip_literal_inner(inner)
    } else {
        validate_component(s, REG_NAME, "reg-name")
    }
}

/// Host classification used by the views
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostKind {
    /// A registered name (possibly empty)
    RegName,
    /// A dotted-decimal IPv4 address
    Ipv4,
    /// A bracketed IPv6 literal
    Ipv6,
    /// A bracketed IPvFuture literal
    IpvFuture,
}

/// Classify an already-validated host
pub(crate) fn classify_host(host: &str) -> HostKind {
    if host.starts_with('[') {
        if host[1..].starts_with(['v', 'V']) {
            HostKind::IpvFuture
        } else {
            HostKind::Ipv6
        }
    } else if ipv4::is_ipv4(host) {
        HostKind::Ipv4
    } else {
        HostKind::RegName
    }
}
