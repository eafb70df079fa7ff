#![cfg_attr(not(feature = "std"), no_std)]
//! RFC 3986 URI parsing and manipulation.
//!
//! URLs are stored in a single canonical buffer with a component
//! position table, so reads are zero-copy and edits relocate the
//! neighboring components in place instead of reparsing. The query is
//! additionally editable as a sequence of params through
//! [`Url::encoded_params`].

#[cfg(not(feature = "std"))]
extern crate alloc;

// Compatibility layer for std/no_std
mod compat;

// Internal modules (not public API)
mod components;
mod error;
mod grammar;
mod ipv4;
mod ipv6;
mod params;
mod rfc;
mod segments;
mod storage;
mod url;
mod view;

/// RFC 3986 character classes
pub mod charset;

/// Percent-encoding and decoding
pub mod pct;

// Public API
pub use error::{ParseError, Result};
pub use params::{Param, Params, ParamsIter};
pub use rfc::{
    parse_absolute_uri, parse_authority, parse_origin_form, parse_path, parse_query,
    parse_relative_ref, parse_uri, parse_uri_reference, HostKind,
};
pub use segments::Segments;
pub use url::Url;
pub use view::{UriBase, UrlView};
