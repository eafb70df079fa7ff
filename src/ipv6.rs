//! IPv6 address parsing for bracketed host literals, per RFC 3986.

use crate::compat::Vec;
use crate::error::{ParseError, Result};
use crate::ipv4::parse_ipv4;

fn err() -> ParseError {
    ParseError::Syntax {
        pos: 0,
        rule: "IPv6address",
    }
}

/// Parse an IPv6 address (without brackets).
/// Returns the 8 u16 segments if valid, or an error if malformed.
pub(crate) fn parse_ipv6(input: &str) -> Result<[u16; 8]> {
    // Zone identifiers (RFC 6874 "%25...") are not part of the RFC 3986
    // grammar and are rejected here.
    if input.contains('%') {
        return Err(err());
    }

    // Check for embedded IPv4 (e.g., "::ffff:192.168.1.1")
    let has_embedded_ipv4 = input
        .rfind(':')
        .is_some_and(|pos| input[pos + 1..].contains('.'));

    if has_embedded_ipv4 {
        parse_ipv6_with_ipv4(input)
    } else {
        parse_ipv6_pure(input)
    }
}

/// Parse pure IPv6 (no embedded IPv4)
fn parse_ipv6_pure(input: &str) -> Result<[u16; 8]> {
    let mut segments = [0u16; 8];

    let Some(double_colon_pos) = input.find("::") else {
        // No :: compression - must have exactly 8 segments
        let parsed = parse_segments(input)?;
        if parsed.len() != 8 {
            return Err(err());
        }
        segments.copy_from_slice(&parsed);
        return Ok(segments);
    };

    let before = &input[..double_colon_pos];
    let after = &input[double_colon_pos + 2..];
    if after.contains("::") {
        return Err(err());
    }
    let before_segments = parse_segments(before)?;
    let after_segments = parse_segments(after)?;

    // The compression must elide at least one zero group
    let total = before_segments.len() + after_segments.len();
    if total > 7 {
        return Err(err());
    }

    fill(&mut segments, &before_segments, &after_segments, 8);
    Ok(segments)
}

/// Parse IPv6 ending in an embedded IPv4 address.
/// The IPv4 part must be strict dotted decimal and fills the last two
/// segments.
fn parse_ipv6_with_ipv4(input: &str) -> Result<[u16; 8]> {
    let last_colon = input.rfind(':').ok_or_else(err)?;
    let ipv4_part = &input[last_colon + 1..];
    let ipv4_addr = parse_ipv4(ipv4_part).ok_or_else(err)?;

    let mut segments = [0u16; 8];
    segments[6] = (ipv4_addr >> 16) as u16;
    segments[7] = (ipv4_addr & 0xFFFF) as u16;

    // Hex groups, possibly still carrying half of a "::" that abuts the
    // IPv4 part (the boundary colon above consumed the other half).
    let head = &input[..last_colon];
    if head.is_empty() {
        // ":1.2.3.4" has a lone colon
        return Err(err());
    }
    if head == ":" {
        // "::1.2.3.4"
        return Ok(segments);
    }

    let (before_segments, after_segments) = if let Some(pos) = head.find("::") {
        if head.ends_with(':') {
            // a third colon adjoins the boundary, or a second compression
            return Err(err());
        }
        let before = parse_segments(&head[..pos])?;
        let after = parse_segments(&head[pos + 2..])?;
        (before, after)
    } else if let Some(stripped) = head.strip_suffix(':') {
        // "1:2::1.2.3.4" - the "::" sits right before the IPv4 part
        (parse_segments(stripped)?, Vec::new())
    } else {
        // No compression: exactly 6 hex groups before the IPv4 part
        let parsed = parse_segments(head)?;
        if parsed.len() != 6 {
            return Err(err());
        }
        segments[..6].copy_from_slice(&parsed);
        return Ok(segments);
    };

    // The compression must elide at least one of the 6 hex groups
    if before_segments.len() + after_segments.len() > 5 {
        return Err(err());
    }

    fill(&mut segments, &before_segments, &after_segments, 6);
    Ok(segments)
}

/// Place `before` at the front and right-align `after` at `width`
fn fill(segments: &mut [u16; 8], before: &[u16], after: &[u16], width: usize) {
    for (i, &seg) in before.iter().enumerate() {
        segments[i] = seg;
    }
    let after_start = width - after.len();
    for (i, &seg) in after.iter().enumerate() {
        segments[after_start + i] = seg;
    }
}

/// Parse colon-separated hex groups ("" yields no groups)
fn parse_segments(input: &str) -> Result<Vec<u16>> {
    if input.is_empty() {
        return Ok(Vec::new());
    }
    input
        .split(':')
        .map(|seg| {
            if seg.is_empty() || seg.len() > 4 || !seg.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(err());
            }
            u16::from_str_radix(seg, 16).map_err(|_| err())
        })
        .collect()
}
