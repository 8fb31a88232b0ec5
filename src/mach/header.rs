//! Identifies a Mach-O slice's magic, bitness and endianness, then decodes
//! the fixed header fields.
//!
//! Uses the same `MH_*` constants and flag-masking style as the rest of
//! this crate's `mach` module, built over [`crate::cursor::ByteCursor`]
//! rather than a `mem`/`File`-based reader.

use crate::cursor::ByteCursor;
use crate::error::{Error, Result};
use crate::mach::constants::{cputype, filetype, flags, MH_CIGAM, MH_CIGAM_64, MH_MAGIC, MH_MAGIC_64};
use crate::report::{Architecture, FileType, HeaderFlags};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderInfo {
    pub is_64: bool,
    pub little_endian: bool,
    pub cputype: u32,
    pub filetype: u32,
    pub ncmds: u32,
    pub sizeofcmds: u32,
    pub flags: u32,
    /// Byte offset, from the start of the slice, at which the
    /// load-command region begins.
    pub load_commands_offset: usize,
}

/// Tries both byte orders against the first 4 bytes and keeps whichever
/// interpretation matches a known Mach-O magic, rather than trusting host
/// byte order.
fn detect_magic(cursor: &ByteCursor) -> Result<(bool, bool)> {
    let be = cursor.read_u32_be(0)?;
    let le = cursor.read_u32_le(0)?;
    // (is_64, little_endian): the magic as stored tells us the endianness
    // of everything that follows it.
    if be == MH_MAGIC {
        Ok((false, false))
    } else if be == MH_CIGAM {
        Ok((false, true))
    } else if be == MH_MAGIC_64 {
        Ok((true, false))
    } else if be == MH_CIGAM_64 {
        Ok((true, true))
    } else if le == MH_MAGIC {
        Ok((false, true))
    } else if le == MH_CIGAM {
        Ok((false, false))
    } else if le == MH_MAGIC_64 {
        Ok((true, true))
    } else if le == MH_CIGAM_64 {
        Ok((true, false))
    } else {
        Err(Error::UnknownMagic(be))
    }
}

pub fn read_header(cursor: &ByteCursor) -> Result<HeaderInfo> {
    let (is_64, little_endian) = detect_magic(cursor)?;
    let le = little_endian;

    let cputype = cursor.read_u32(4, le)?;
    let _cpusubtype = cursor.read_u32(8, le)?;
    let filetype = cursor.read_u32(12, le)?;
    let ncmds = cursor.read_u32(16, le)?;
    let sizeofcmds = cursor.read_u32(20, le)?;
    let flags = cursor.read_u32(24, le)?;

    let load_commands_offset = if is_64 {
        crate::mach::constants::SIZEOF_MACH_HEADER_64
    } else {
        crate::mach::constants::SIZEOF_MACH_HEADER_32
    };

    Ok(HeaderInfo {
        is_64,
        little_endian,
        cputype,
        filetype,
        ncmds,
        sizeofcmds,
        flags,
        load_commands_offset,
    })
}

/// CPU-type mapping; anything not in the fixed set decodes to `Unknown`
/// rather than failing the parse.
pub fn architecture_of(cputype: u32) -> Architecture {
    match cputype {
        cputype::CPU_TYPE_X86_64 => Architecture::X86_64,
        cputype::CPU_TYPE_X86 => Architecture::X86,
        cputype::CPU_TYPE_ARM64 => Architecture::Arm64,
        cputype::CPU_TYPE_ARM => Architecture::Arm,
        _ => Architecture::Unknown,
    }
}

/// File-type mapping; any unrecognized value maps to `NotSupported`.
pub fn filetype_of(filetype: u32) -> FileType {
    match filetype {
        filetype::MH_OBJECT => FileType::Object,
        filetype::MH_EXECUTE => FileType::Executable,
        filetype::MH_FVMLIB => FileType::FvmLib,
        filetype::MH_CORE => FileType::Core,
        filetype::MH_PRELOAD => FileType::Preload,
        filetype::MH_DYLIB => FileType::Dylib,
        filetype::MH_DYLINKER => FileType::Dylinker,
        filetype::MH_BUNDLE => FileType::Bundle,
        filetype::MH_DYLIB_STUB => FileType::DylibStub,
        filetype::MH_DSYM => FileType::Dsym,
        filetype::MH_KEXT_BUNDLE => FileType::KextBundle,
        _ => FileType::NotSupported,
    }
}

/// Decodes the six header-flag booleans: each is the AND of the raw
/// `flags` word with its bit mask.
pub fn flags_of(raw: u32) -> HeaderFlags {
    HeaderFlags {
        no_undefined_refs: raw & flags::MH_NOUNDEFS != 0,
        dyld_compatible: raw & flags::MH_DYLDLINK != 0,
        defines_weak_symbols: raw & flags::MH_WEAK_DEFINES != 0,
        uses_weak_symbols: raw & flags::MH_BINDS_TO_WEAK != 0,
        allows_stack_execution: raw & flags::MH_ALLOW_STACK_EXECUTION != 0,
        enforce_no_heap_exec: raw & flags::MH_NO_HEAP_EXECUTION != 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn le32(v: u32) -> [u8; 4] {
        v.to_le_bytes()
    }

    #[test]
    fn reads_64_bit_little_endian_header() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&le32(MH_MAGIC_64));
        bytes.extend_from_slice(&le32(cputype::CPU_TYPE_ARM64));
        bytes.extend_from_slice(&le32(0)); // cpusubtype
        bytes.extend_from_slice(&le32(filetype::MH_EXECUTE));
        bytes.extend_from_slice(&le32(3)); // ncmds
        bytes.extend_from_slice(&le32(100)); // sizeofcmds
        bytes.extend_from_slice(&le32(flags::MH_NOUNDEFS | flags::MH_DYLDLINK));
        bytes.extend_from_slice(&le32(0)); // reserved
        let cursor = ByteCursor::new(&bytes);
        let info = read_header(&cursor).unwrap();
        assert!(info.is_64);
        assert!(info.little_endian);
        assert_eq!(info.load_commands_offset, 32);
        assert_eq!(architecture_of(info.cputype), Architecture::Arm64);
        assert_eq!(filetype_of(info.filetype), FileType::Executable);
        let decoded = flags_of(info.flags);
        assert!(decoded.no_undefined_refs);
        assert!(decoded.dyld_compatible);
        assert!(!decoded.allows_stack_execution);
    }

    #[test]
    fn unknown_magic_is_an_error() {
        let bytes = [0u8; 32];
        let cursor = ByteCursor::new(&bytes);
        assert!(matches!(read_header(&cursor), Err(Error::UnknownMagic(_))));
    }

    #[test]
    fn unmapped_cputype_is_unknown_architecture() {
        assert_eq!(architecture_of(0xdead_beef), Architecture::Unknown);
    }
}
