//! The structured output of a parse: [`Report`] and everything it owns.
//!
//! Every value here is produced once, by the assembler in [`crate::parse`],
//! and never mutated afterward — entries are pushed in file order and left
//! alone. There is no `destroy` function; the ordinary `Drop` of `Report`
//! (and everything it transitively owns) is the whole of the lifecycle.

use crate::error::Warning;

/// Top-level result of one [`crate::parse`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    /// Whether the input was a fat/universal wrapper rather than a thin
    /// Mach-O image.
    pub is_fat: bool,
    /// One entry per successfully parsed slice, in on-disk fat order (or a
    /// single entry at index 0 for a thin image).
    pub arches: Vec<ArchReport>,
    /// Slices whose header or load-command region was too damaged to
    /// produce an `ArchReport`. Recorded as `(fat arch index, message)` so a
    /// skipped slice is observable rather than silently absent from
    /// `arches`.
    pub slice_errors: Vec<(usize, String)>,
}

impl Report {
    pub(crate) fn new(is_fat: bool) -> Self {
        Report {
            is_fat,
            arches: Vec::new(),
            slice_errors: Vec::new(),
        }
    }
}

/// The fixed set of CPU kinds this crate distinguishes; anything else
/// decodes to `Unknown` rather than failing the parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Architecture {
    X86,
    X86_64,
    Arm,
    Arm64,
    Unknown,
}

impl Architecture {
    pub fn as_str(&self) -> &'static str {
        match self {
            Architecture::X86 => "x86",
            Architecture::X86_64 => "x86_64",
            Architecture::Arm => "ARM",
            Architecture::Arm64 => "ARM64",
            Architecture::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for Architecture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mach-O `filetype` field, decoded into the subset of roles the report
/// distinguishes; unrecognized values map to `NotSupported`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileType {
    Object,
    Executable,
    FvmLib,
    Core,
    Preload,
    Dylib,
    Dylinker,
    Bundle,
    DylibStub,
    Dsym,
    KextBundle,
    NotSupported,
}

/// The header flag bits this report surfaces, each the AND of the raw
/// `flags` word with its mask.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeaderFlags {
    pub no_undefined_refs: bool,
    pub dyld_compatible: bool,
    pub defines_weak_symbols: bool,
    pub uses_weak_symbols: bool,
    pub allows_stack_execution: bool,
    pub enforce_no_heap_exec: bool,
}

/// A dynamically linked library named by an `LC_*_DYLIB` load command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DylibEntry {
    /// UTF-8 lossily decoded path, or the raw bytes' lossy rendering if the
    /// path was not valid UTF-8 — the raw bytes are always available via
    /// `path_bytes`.
    pub path: String,
    /// The exact bytes of the path, not including the terminating NUL.
    pub path_bytes: Vec<u8>,
    /// True when the path ran to the 256-byte scan limit without finding a
    /// NUL.
    pub is_truncated: bool,
    /// `"MAJOR.MINOR.PATCH"`, decoded from the packed `current_version`
    /// word using the three-8-bit-lane scheme the source uses, not the
    /// canonical `u16.u8.u8` Mach-O layout and
    /// [`crate::mach::dylib::decode_version`].
    pub version: String,
}

/// One C-string literal recovered from a designated read-only section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringEntry {
    /// Exact bytes of the string, not including the trailing NUL.
    pub content: Vec<u8>,
    /// Byte length including the trailing NUL.
    pub size: usize,
    /// e.g. `"__TEXT"`.
    pub original_segment: String,
    /// e.g. `"__cstring"`.
    pub original_section: String,
    /// Absolute file offset (relative to the containing slice) of the
    /// string's first byte.
    pub original_offset: usize,
}

/// How a symbol-table entry's `n_type` classifies it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolClassification {
    Stab,
    External,
    PrivateExternal,
}

/// One `nlist` entry with a non-empty name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolEntry {
    pub name: String,
    pub name_bytes: Vec<u8>,
    pub classification: SymbolClassification,
    /// True when `n_sect == 0`, the "no section" sentinel.
    pub has_no_section: bool,
}

/// Code-signing posture, present iff an `LC_CODE_SIGNATURE` command was
/// found and its super-blob magic recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityRecord {
    /// Always `true` when a `SecurityRecord` exists.
    pub is_signed: bool,
    pub has_hardened_runtime: bool,
    pub is_library_validation_disabled: bool,
    pub is_dylib_env_var_allowed: bool,
    /// Raw entitlements plist XML, if an entitlements slot was present and
    /// well-formed.
    pub entitlements_xml: Option<Vec<u8>>,
}

/// One parsed Mach-O slice (a thin image, or one member of a fat archive).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchReport {
    pub architecture: Architecture,
    pub filetype: FileType,
    pub flags: HeaderFlags,
    pub dylibs: Vec<DylibEntry>,
    pub strings: Vec<StringEntry>,
    pub symbols: Vec<SymbolEntry>,
    pub security: Option<SecurityRecord>,
    /// Non-fatal per-record diagnostics collected while parsing this slice.
    pub warnings: Vec<Warning>,
}

impl ArchReport {
    pub(crate) fn new() -> Self {
        ArchReport {
            architecture: Architecture::Unknown,
            filetype: FileType::NotSupported,
            flags: HeaderFlags::default(),
            dylibs: Vec::new(),
            strings: Vec::new(),
            symbols: Vec::new(),
            security: None,
            warnings: Vec::new(),
        }
    }
}
