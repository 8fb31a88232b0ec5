//! Splits a section's file-backed byte range into non-empty,
//! NUL-terminated C-strings.

use crate::cursor::ByteCursor;
use crate::report::StringEntry;

/// Scans `[file_offset, file_offset + size)` of `slice`, emitting one
/// [`StringEntry`] per non-empty NUL-terminated run. Leading NULs (e.g. the
/// section's first byte, conventionally empty) are skipped without
/// emitting an entry.
pub fn extract_strings(
    slice: &ByteCursor,
    file_offset: usize,
    size: usize,
    segment: &str,
    section: &str,
) -> Vec<StringEntry> {
    let mut out = Vec::new();
    let mut pos = 0usize;

    while pos < size {
        // Skip a run of leading NULs without emitting empty entries.
        while pos < size {
            match slice.read_u8(file_offset + pos) {
                Ok(0) => pos += 1,
                _ => break,
            }
        }
        if pos >= size {
            break;
        }

        let remaining = size - pos;
        let (content, found_nul) = slice.as_cstr_limit(file_offset + pos, remaining);
        if !found_nul {
            // Ran out of section before finding a terminator; not a
            // complete C-string, nothing left to emit.
            break;
        }
        let len = content.len();
        if len == 0 {
            break;
        }

        out.push(StringEntry {
            content: content.to_vec(),
            size: len + 1,
            original_segment: segment.to_string(),
            original_section: section.to_string(),
            original_offset: file_offset + pos,
        });

        pos += len + 1;
    }

    out
}
