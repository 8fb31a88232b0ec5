//! Drives the fat demultiplexer, then the header reader and load-command
//! walker for each inner slice, composing the results into a [`Report`].

use crate::cursor::ByteCursor;
use crate::error::Result;
use crate::mach::{fat, header, load_command};
use crate::options::ParseOptions;
use crate::report::{ArchReport, Report};

/// Parses `bytes` with the default [`ParseOptions`] (the permissive
/// entitlements scan).
pub fn parse(bytes: &[u8]) -> Result<Report> {
    parse_with(bytes, ParseOptions::default())
}

/// Parses `bytes`, a Mach-O image or fat/universal archive thereof, into a
/// [`Report`].
///
/// Fatal errors in the fat header abort the whole parse. A fatal error in
/// one inner slice's header or load-command region aborts only that
/// slice's report (recorded in [`Report::slice_errors`]); the parse
/// continues with the remaining slices.
pub fn parse_with(bytes: &[u8], options: ParseOptions) -> Result<Report> {
    let input = ByteCursor::new(bytes);
    let magic = input.read_u32_be(0).unwrap_or(0);
    let is_fat = fat::is_fat_magic(magic);

    log::debug!(
        "parsing {}-byte buffer ({})",
        bytes.len(),
        if is_fat { "fat" } else { "thin" }
    );

    let slices = fat::demultiplex(input)?;
    let mut report = Report::new(is_fat);

    for (index, (_arch_entry, slice)) in slices.into_iter().enumerate() {
        match parse_slice(&slice, options) {
            Ok(arch_report) => report.arches.push(arch_report),
            Err(e) => {
                log::warn!("slice {index}: {e}, skipping");
                report.slice_errors.push((index, e.to_string()));
            }
        }
    }

    Ok(report)
}

fn parse_slice(slice: &ByteCursor, options: ParseOptions) -> Result<ArchReport> {
    let info = header::read_header(slice)?;
    log::debug!(
        "slice: {}-bit, {}-endian, cputype {:#x}, {} load commands",
        if info.is_64 { 64 } else { 32 },
        if info.little_endian { "little" } else { "big" },
        info.cputype,
        info.ncmds
    );

    let walked = load_command::walk(slice, &info, options)?;

    let mut arch = ArchReport::new();
    arch.architecture = header::architecture_of(info.cputype);
    arch.filetype = header::filetype_of(info.filetype);
    arch.flags = header::flags_of(info.flags);
    arch.dylibs = walked.dylibs;
    arch.strings = walked.strings;
    arch.symbols = walked.symbols;
    arch.security = walked.security;
    arch.warnings = walked.warnings;

    for warning in &arch.warnings {
        log::warn!("{warning}");
    }

    Ok(arch)
}
