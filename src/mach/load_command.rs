//! Iterates the load-command region and fans records out to the per-kind
//! decoders. Recognized-but-malformed records become [`Warning`]s and the
//! walk continues; only a zero, undersized, misaligned, or out-of-region
//! `cmdsize` is fatal to the whole slice.

use crate::cursor::ByteCursor;
use crate::error::{Error, Result, Warning};
use crate::mach::codesign::{self, LinkeditFields};
use crate::mach::constants::lc;
use crate::mach::dylib;
use crate::mach::header::HeaderInfo;
use crate::mach::segment;
use crate::mach::symtab::{self, SymtabCommandFields};
use crate::options::ParseOptions;
use crate::report::{DylibEntry, SecurityRecord, StringEntry, SymbolEntry};

/// Everything the walker accumulates while fanning out load commands.
#[derive(Default)]
pub struct WalkOutput {
    pub dylibs: Vec<DylibEntry>,
    pub strings: Vec<StringEntry>,
    pub symbols: Vec<SymbolEntry>,
    pub security: Option<SecurityRecord>,
    pub warnings: Vec<Warning>,
}

fn is_dylib_command(cmd: u32) -> bool {
    matches!(
        cmd,
        lc::LC_LOAD_DYLIB
            | lc::LC_LOAD_WEAK_DYLIB
            | lc::LC_ID_DYLIB
            | lc::LC_REEXPORT_DYLIB
            | lc::LC_LOAD_UPWARD_DYLIB
            | lc::LC_LAZY_LOAD_DYLIB
    )
}

pub fn walk(slice: &ByteCursor, header: &HeaderInfo, options: ParseOptions) -> Result<WalkOutput> {
    let mut out = WalkOutput::default();
    let region_start = header.load_commands_offset;
    let region_end = region_start
        .checked_add(header.sizeofcmds as usize)
        .ok_or_else(|| Error::MalformedLoadCommand("sizeofcmds overflows the slice".into()))?;

    let mut offset = region_start;
    for _ in 0..header.ncmds {
        if offset + 8 > region_end || offset + 8 > slice.len() {
            return Err(Error::MalformedLoadCommand(format!(
                "load command at {offset} would read past the {region_end}-byte command region"
            )));
        }

        let cmd = slice.read_u32(offset, header.little_endian)?;
        let cmdsize = slice.read_u32(offset + 4, header.little_endian)? as usize;

        if cmdsize == 0 {
            return Err(Error::MalformedLoadCommand(format!(
                "load command at {offset} has cmdsize 0"
            )));
        }
        if cmdsize < 8 || cmdsize % 4 != 0 {
            // Without a sane cmdsize we cannot know where the next record
            // starts, so this is fatal to the whole walk, not a per-record
            // warning.
            return Err(Error::MalformedLoadCommand(format!(
                "load command at {offset} (cmd {cmd:#x}) has cmdsize {cmdsize}, not a multiple of 4 or too small"
            )));
        }
        if offset + cmdsize > region_end {
            return Err(Error::MalformedLoadCommand(format!(
                "load command at {offset} (cmd {cmd:#x}): cmdsize {cmdsize} overruns the {region_end}-byte command region"
            )));
        }

        let command_cursor = slice.subrange(offset, cmdsize).map_err(|_| {
            Error::MalformedLoadCommand(format!(
                "load command at {offset}: cmdsize {cmdsize} exceeds the {}-byte buffer",
                slice.len()
            ))
        })?;

        dispatch(slice, &command_cursor, offset, cmd, header, options, &mut out);

        offset += cmdsize;
    }

    Ok(out)
}

fn dispatch(
    slice: &ByteCursor,
    command_cursor: &ByteCursor,
    offset: usize,
    cmd: u32,
    header: &HeaderInfo,
    options: ParseOptions,
    out: &mut WalkOutput,
) {
    if is_dylib_command(cmd) {
        match dylib::decode_dylib(command_cursor, header.little_endian) {
            Ok(entry) => out.dylibs.push(entry),
            Err(e) => out.warnings.push(Warning::new(format!("dylib command: {e}"))),
        }
        return;
    }

    match cmd {
        lc::LC_SEGMENT => handle_segment(slice, command_cursor, offset, header, false, out),
        lc::LC_SEGMENT_64 => handle_segment(slice, command_cursor, offset, header, true, out),
        lc::LC_SYMTAB => handle_symtab(slice, command_cursor, header, out),
        lc::LC_CODE_SIGNATURE => handle_code_signature(slice, command_cursor, header, options, out),
        _ => {} // Unrecognized tags are skipped, not an error.
    }
}

fn handle_segment(
    slice: &ByteCursor,
    command_cursor: &ByteCursor,
    offset: usize,
    header: &HeaderInfo,
    is_64: bool,
    out: &mut WalkOutput,
) {
    // Layout after (cmd, cmdsize): segname[16], then either 32- or 64-bit
    // vmaddr/vmsize/fileoff/filesize, maxprot, initprot, nsects, flags.
    let segname = match command_cursor.read_bytes(8, 16) {
        Ok(b) => b,
        Err(e) => {
            out.warnings.push(Warning::new(format!("segment command: {e}")));
            return;
        }
    };

    let (nsects_offset, header_len) = if is_64 {
        (8 + 16 + 8 * 4 + 4 * 2, 8 + 16 + 8 * 4 + 4 * 4)
    } else {
        (8 + 16 + 4 * 4 + 4 * 2, 8 + 16 + 4 * 4 + 4 * 4)
    };

    let nsects = match command_cursor.read_u32(nsects_offset, header.little_endian) {
        Ok(n) => n,
        Err(e) => {
            out.warnings.push(Warning::new(format!("segment command: {e}")));
            return;
        }
    };

    match segment::scan_segment(
        slice,
        segname,
        offset + header_len,
        nsects,
        is_64,
        header.little_endian,
        &mut out.warnings,
    ) {
        Ok(entries) => out.strings.extend(entries),
        Err(e) => out.warnings.push(Warning::new(format!("segment command: {e}"))),
    }
}

fn handle_symtab(slice: &ByteCursor, command_cursor: &ByteCursor, header: &HeaderInfo, out: &mut WalkOutput) {
    let fields: SymtabCommandFields = match symtab::read_symtab_command_fields(command_cursor, header.little_endian) {
        Ok(f) => f,
        Err(e) => {
            out.warnings.push(Warning::new(format!("symtab command: {e}")));
            return;
        }
    };

    match symtab::read_symbols(slice, &fields, header.is_64, header.little_endian) {
        Ok(symbols) => out.symbols.extend(symbols),
        Err(e) => out.warnings.push(Warning::new(format!("symtab: {e}"))),
    }
}

fn handle_code_signature(
    slice: &ByteCursor,
    command_cursor: &ByteCursor,
    header: &HeaderInfo,
    options: ParseOptions,
    out: &mut WalkOutput,
) {
    let fields: LinkeditFields = match codesign::read_linkedit_fields(command_cursor, header.little_endian) {
        Ok(f) => f,
        Err(e) => {
            out.warnings.push(Warning::new(format!("code signature command: {e}")));
            return;
        }
    };

    match codesign::parse_code_signature(slice, &fields, options, &mut out.warnings) {
        Ok(Some(record)) => out.security = Some(record),
        Ok(None) => {}
        Err(e) => out.warnings.push(Warning::new(format!("code signature: {e}"))),
    }
}
