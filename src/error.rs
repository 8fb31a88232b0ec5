//! The error taxonomy returned by the parsing engine.
//!
//! Kept dependency-light on purpose, in the same spirit as the rest of this
//! lineage of parsers: a hand-written `Display`/`std::error::Error` impl
//! rather than a macro-generated one, so the crate never forces a particular
//! error-handling crate on its callers.

use core::fmt;
use core::result;

/// Everything that can go wrong while parsing a Mach-O or fat buffer.
///
/// Each variant is a fatal condition for the slice or buffer it occurs in;
/// recoverable, per-record issues become [`Warning`]s instead.
#[derive(Debug)]
pub enum Error {
    /// A read would have crossed the end of the declared buffer.
    TruncatedInput(String),
    /// Neither a Mach-O nor a fat magic was found where one was expected.
    UnknownMagic(u32),
    /// The fat header or its arch table violated an invariant.
    MalformedFat(String),
    /// A load-command record's `cmdsize` was zero, too small, or overran
    /// the load-command region.
    MalformedLoadCommand(String),
    /// The symtab's offsets did not fit inside the buffer.
    MalformedSymbolTable(String),
    /// The code-signature super-blob (or one of its slots) had a bad magic.
    MalformedCodeSignature(String),
    /// A slice's header or load-command region was too damaged to produce
    /// an `ArchReport`; the slice is skipped, not fatal to the whole parse.
    MalformedSlice(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::TruncatedInput(msg) => write!(f, "truncated input: {msg}"),
            Error::UnknownMagic(magic) => write!(f, "unknown magic: {magic:#x}"),
            Error::MalformedFat(msg) => write!(f, "malformed fat header: {msg}"),
            Error::MalformedLoadCommand(msg) => write!(f, "malformed load command: {msg}"),
            Error::MalformedSymbolTable(msg) => write!(f, "malformed symbol table: {msg}"),
            Error::MalformedCodeSignature(msg) => write!(f, "malformed code signature: {msg}"),
            Error::MalformedSlice(msg) => write!(f, "malformed slice: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<scroll::Error> for Error {
    fn from(err: scroll::Error) -> Self {
        Error::TruncatedInput(err.to_string())
    }
}

pub type Result<T> = result::Result<T, Error>;

/// A non-fatal, per-record diagnostic collected while parsing a slice.
///
/// Every "recorded but does not abort" outcome in the component design
/// ends up here, attached to the owning [`crate::report::ArchReport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning(pub String);

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Warning {
    pub fn new(msg: impl Into<String>) -> Self {
        Warning(msg.into())
    }
}
