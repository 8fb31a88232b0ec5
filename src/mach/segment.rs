//! Walks a segment command's inline section array and hands sections on
//! the per-segment allow-list to [`crate::mach::strings::extract_strings`].
//!
//! Section record sizes (68 bytes 32-bit, 80 bytes 64-bit) match the real
//! on-disk `struct section`/`struct section_64` layouts; see `DESIGN.md`
//! for why these values rather than a commonly misquoted 32-bit size.

use crate::cursor::ByteCursor;
use crate::error::{Result, Warning};
use crate::mach::constants::segnames;
use crate::mach::strings::extract_strings;
use crate::report::StringEntry;

const SEGNAME_LEN: usize = 16;
const SECTNAME_LEN: usize = 16;

const SIZEOF_SECTION_32: usize = 68;
const SIZEOF_SECTION_64: usize = 80;

fn fixed_name(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

fn allow_list_for(segname: &str) -> &'static [&'static str] {
    match segname {
        segnames::SEG_TEXT => &["__cstring", "__const", "__oslogstring"],
        segnames::SEG_DATA => &["__const", "__cfstring"],
        segnames::SEG_DATA_CONST => &["__const"],
        _ => &[],
    }
}

/// Scans one `LC_SEGMENT`/`LC_SEGMENT_64` command, given a cursor over the
/// whole slice and the command's own header fields already decoded by the
/// caller. `sections_offset` is the slice-relative offset of the first
/// section record; `is_64` selects the record width.
pub fn scan_segment(
    slice: &ByteCursor,
    segname_bytes: &[u8],
    sections_offset: usize,
    nsects: u32,
    is_64: bool,
    little_endian: bool,
    warnings: &mut Vec<Warning>,
) -> Result<Vec<StringEntry>> {
    let segname = fixed_name(segname_bytes);
    let allow_list = allow_list_for(&segname);
    if allow_list.is_empty() {
        return Ok(Vec::new());
    }

    let record_size = if is_64 { SIZEOF_SECTION_64 } else { SIZEOF_SECTION_32 };
    let mut out = Vec::new();

    for i in 0..nsects as usize {
        let rec_offset = sections_offset + i * record_size;
        let sectname_bytes = match slice.read_bytes(rec_offset, SECTNAME_LEN) {
            Ok(b) => b,
            Err(_) => {
                warnings.push(Warning::new(format!(
                    "segment {segname}: section record {i} out of range, stopping scan"
                )));
                break;
            }
        };
        let sectname = fixed_name(sectname_bytes);
        if !allow_list.contains(&sectname.as_str()) {
            continue;
        }

        let (file_offset, size) = if is_64 {
            let off = slice.read_u32(rec_offset + SECTNAME_LEN * 2 + 16, little_endian)?;
            let sz = slice.read_u64(rec_offset + SECTNAME_LEN * 2 + 8, little_endian)?;
            (off as usize, sz as usize)
        } else {
            let off = slice.read_u32(rec_offset + SECTNAME_LEN * 2 + 8, little_endian)?;
            let sz = slice.read_u32(rec_offset + SECTNAME_LEN * 2 + 4, little_endian)?;
            (off as usize, sz as usize)
        };

        match file_offset.checked_add(size) {
            Some(end) if end <= slice.len() => {
                out.extend(extract_strings(slice, file_offset, size, &segname, &sectname));
            }
            _ => {
                warnings.push(Warning::new(format!(
                    "segment {segname} section {sectname}: range {file_offset}..{} exceeds slice, skipping",
                    file_offset + size
                )));
            }
        }
    }

    Ok(out)
}
