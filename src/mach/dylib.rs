//! Extracts the path and packed version word from a `LC_*_DYLIB` load
//! command's payload.

use crate::cursor::ByteCursor;
use crate::error::Result;
use crate::report::DylibEntry;

const PATH_LIMIT: usize = 256;

/// `dylib_command` payload fields, all read at the command's own
/// endianness. `name_offset` is relative to `command_base`.
pub struct DylibCommandFields {
    pub name_offset: u32,
    pub current_version: u32,
}

pub fn read_dylib_command_fields(
    cmd_cursor: &ByteCursor,
    little_endian: bool,
) -> Result<DylibCommandFields> {
    // Layout after (cmd, cmdsize): lib_path_offset, timestamp,
    // current_version, compatibility_version — each a u32.
    let name_offset = cmd_cursor.read_u32(8, little_endian)?;
    let current_version = cmd_cursor.read_u32(16, little_endian)?;
    Ok(DylibCommandFields {
        name_offset,
        current_version,
    })
}

/// Decodes the packed `current_version` word as `MAJOR.MINOR.PATCH`.
///
/// Uses a three-8-bit-lane interpretation
/// (`((v>>24)&0xFF).((v>>16)&0xFF).(v&0xFF)`) rather than the canonical
/// Mach-O `u16.u8.u8` layout. Both schemes agree on the patch lane; they
/// disagree on how major/minor are split out of the top 24 bits. Kept this
/// way deliberately for compatibility with callers already reading
/// versions in this form — see `DESIGN.md`.
pub fn decode_version(v: u32) -> String {
    let major = (v >> 24) & 0xFF;
    let minor = (v >> 16) & 0xFF;
    let patch = v & 0xFF;
    format!("{major}.{minor}.{patch}")
}

/// Reads the dylib's path from its own command payload, applying the
/// 256-byte scan limit, and builds a [`DylibEntry`].
pub fn decode_dylib(
    command_cursor: &ByteCursor,
    little_endian: bool,
) -> Result<DylibEntry> {
    let fields = read_dylib_command_fields(command_cursor, little_endian)?;
    let (raw, found_nul) = command_cursor.as_cstr_limit(fields.name_offset as usize, PATH_LIMIT);
    let is_truncated = raw.len() == PATH_LIMIT && !found_nul;

    Ok(DylibEntry {
        path: String::from_utf8_lossy(raw).into_owned(),
        path_bytes: raw.to_vec(),
        is_truncated,
        version: decode_version(fields.current_version),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_command(name_offset: u32, path: &[u8], current_version: u32) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&0xcu32.to_le_bytes()); // cmd
        out.extend_from_slice(&0u32.to_le_bytes()); // cmdsize, unused here
        out.extend_from_slice(&name_offset.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes()); // timestamp
        out.extend_from_slice(&current_version.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes()); // compat version
        out.extend_from_slice(path);
        out.push(0);
        out
    }

    #[test]
    fn decodes_path_and_version() {
        let bytes = build_command(24, b"/usr/lib/libSystem.B.dylib", 0x0105_0000);
        let cursor = ByteCursor::new(&bytes);
        let entry = decode_dylib(&cursor, true).unwrap();
        assert_eq!(entry.path, "/usr/lib/libSystem.B.dylib");
        assert!(!entry.is_truncated);
        assert_eq!(entry.version, "1.5.0");
    }

    #[test]
    fn version_uses_three_byte_lanes_not_canonical_layout() {
        // v = 0x00010203 canonically decodes to 1.2.3 (u16.u8.u8); the
        // source's lane split instead yields 0.1.2 — preserved on purpose.
        assert_eq!(decode_version(0x0001_0203), "0.1.2");
    }

    #[test]
    fn path_running_to_the_limit_without_nul_is_truncated() {
        let long_path = vec![b'a'; 300];
        let bytes = build_command(24, &long_path, 0);
        let cursor = ByteCursor::new(&bytes);
        let entry = decode_dylib(&cursor, true).unwrap();
        assert!(entry.is_truncated);
        assert_eq!(entry.path_bytes.len(), 256);
    }
}
