//! A byte-accurate, memory-safe static analyzer for Mach-O and fat/universal
//! binaries.
//!
//! The crate exposes two entry points: [`parse`], which walks a byte buffer
//! and produces a structured [`report::Report`], and [`parse_with`], the
//! same walk under caller-supplied [`options::ParseOptions`]. Everything
//! else here — the fat demultiplexer, header reader, load-command walker,
//! and the per-load-command decoders under [`mach`] — is implementation
//! detail reachable for callers who want finer-grained access, but `parse`
//! is the contract.

pub mod cursor;
pub mod error;
pub mod mach;
pub mod options;
mod parse;
pub mod report;

pub use error::{Error, Result, Warning};
pub use options::{EntitlementsScan, ParseOptions};
pub use parse::{parse, parse_with};
pub use report::{
    Architecture, ArchReport, DylibEntry, FileType, HeaderFlags, Report, SecurityRecord,
    StringEntry, SymbolClassification, SymbolEntry,
};
