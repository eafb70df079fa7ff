/// Errors produced when parsing or editing a URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    /// Truncated or non-hexadecimal percent escape
    InvalidEncoding,
    /// Input byte not allowed by the grammar.
    /// `pos` is the offset of the offending byte, `rule` the name of the
    /// grammar rule that rejected it.
    Syntax { pos: usize, rule: &'static str },
    /// A scheme was required but the input has none
    MissingScheme,
    /// Raw NUL byte in the input
    IllegalNull,
    /// Port is not a sequence of decimal digits that fits in u16
    BadPort,
    /// Input or edit would exceed the maximum supported length
    Oversize,
}

impl core::fmt::Display for ParseError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InvalidEncoding => f.write_str("invalid percent encoding"),
            Self::Syntax { pos, rule } => {
                write!(f, "syntax error in {rule} at offset {pos}")
            }
            Self::MissingScheme => f.write_str("missing scheme"),
            Self::IllegalNull => f.write_str("illegal NUL byte"),
            Self::BadPort => f.write_str("invalid port"),
            Self::Oversize => f.write_str("input too large"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ParseError {}

/// Result type for URL parsing and editing operations
pub type Result<T> = core::result::Result<T, ParseError>;
