//! Walks the `nlist` array named by an `LC_SYMTAB` command and the string
//! pool it indexes into, classifying each named symbol.

use crate::cursor::ByteCursor;
use crate::error::{Error, Result};
use crate::mach::constants::nlist;
use crate::report::{SymbolClassification, SymbolEntry};

const NLIST_32_SIZE: usize = 12;
const NLIST_64_SIZE: usize = 16;

pub struct SymtabCommandFields {
    pub symoff: u32,
    pub nsyms: u32,
    pub stroff: u32,
    pub strsize: u32,
}

/// Reads the four `symtab_command` fields that follow `(cmd, cmdsize)`.
pub fn read_symtab_command_fields(cmd_cursor: &ByteCursor, little_endian: bool) -> Result<SymtabCommandFields> {
    Ok(SymtabCommandFields {
        symoff: cmd_cursor.read_u32(8, little_endian)?,
        nsyms: cmd_cursor.read_u32(12, little_endian)?,
        stroff: cmd_cursor.read_u32(16, little_endian)?,
        strsize: cmd_cursor.read_u32(20, little_endian)?,
    })
}

fn classify(n_type: u8) -> SymbolClassification {
    if n_type & nlist::N_STAB != 0 {
        SymbolClassification::Stab
    } else if n_type & nlist::N_EXT != 0 {
        SymbolClassification::External
    } else {
        SymbolClassification::PrivateExternal
    }
}

/// Walks the `nsyms`-entry `nlist` array at `symoff` and the string pool at
/// `stroff`/`strsize`, both relative to `slice`. Entries with `n_strx == 0`
/// are skipped silently; a name index at or past `strsize` aborts the whole
/// pass with `MalformedSymbolTable`.
pub fn read_symbols(
    slice: &ByteCursor,
    fields: &SymtabCommandFields,
    is_64: bool,
    little_endian: bool,
) -> Result<Vec<SymbolEntry>> {
    let entry_size = if is_64 { NLIST_64_SIZE } else { NLIST_32_SIZE };
    let mut out = Vec::with_capacity(fields.nsyms as usize);

    for i in 0..fields.nsyms as usize {
        let rec_offset = fields.symoff as usize + i * entry_size;
        let n_strx = slice.read_u32(rec_offset, little_endian)?;
        let n_type = slice.read_u8(rec_offset + 4)?;
        let n_sect = slice.read_u8(rec_offset + 5)?;

        if n_strx == 0 {
            continue;
        }
        if n_strx >= fields.strsize {
            return Err(Error::MalformedSymbolTable(format!(
                "entry {i}: n_strx {n_strx} is outside the {}-byte string pool",
                fields.strsize
            )));
        }

        let name_offset = fields.stroff as usize + n_strx as usize;
        let remaining = (fields.strsize - n_strx) as usize;
        let (name_bytes, _found_nul) = slice.as_cstr_limit(name_offset, remaining);
        if name_offset + name_bytes.len() > slice.len() {
            return Err(Error::MalformedSymbolTable(format!(
                "entry {i}: name at {name_offset} runs past the buffer"
            )));
        }

        out.push(SymbolEntry {
            name: String::from_utf8_lossy(name_bytes).into_owned(),
            name_bytes: name_bytes.to_vec(),
            classification: classify(n_type),
            has_no_section: n_sect == nlist::NO_SECT,
        });
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_nlist32(n_strx: u32, n_type: u8, n_sect: u8) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&n_strx.to_le_bytes());
        out.push(n_type);
        out.push(n_sect);
        out.extend_from_slice(&0u16.to_le_bytes()); // n_desc
        out.extend_from_slice(&0u32.to_le_bytes()); // n_value
        out
    }

    #[test]
    fn classifies_stab_external_and_private() {
        let mut strtab = Vec::new();
        strtab.push(0u8); // index 0 is always empty
        let radr_off = strtab.len();
        strtab.extend_from_slice(b"radr://5614542\0");
        let ext_off = strtab.len();
        strtab.extend_from_slice(b"__mh_execute_header\0");
        let priv_off = strtab.len();
        strtab.extend_from_slice(b"_local_symbol\0");

        let mut syms = Vec::new();
        syms.extend_from_slice(&build_nlist32(radr_off as u32, 0xe0, 0)); // STAB, no section
        syms.extend_from_slice(&build_nlist32(ext_off as u32, 0x01, 1)); // EXTERNAL, has section
        syms.extend_from_slice(&build_nlist32(priv_off as u32, 0x00, 0)); // PRIVATE_EXTERNAL

        let symoff = 0usize;
        let stroff = syms.len();
        let mut buf = syms.clone();
        buf.extend_from_slice(&strtab);

        let cursor = ByteCursor::new(&buf);
        let fields = SymtabCommandFields {
            symoff: symoff as u32,
            nsyms: 3,
            stroff: stroff as u32,
            strsize: strtab.len() as u32,
        };
        let symbols = read_symbols(&cursor, &fields, false, true).unwrap();
        assert_eq!(symbols.len(), 3);
        assert_eq!(symbols[0].name, "radr://5614542");
        assert_eq!(symbols[0].classification, SymbolClassification::Stab);
        assert!(symbols[0].has_no_section);
        assert_eq!(symbols[1].name, "__mh_execute_header");
        assert_eq!(symbols[1].classification, SymbolClassification::External);
        assert!(!symbols[1].has_no_section);
        assert_eq!(symbols[2].classification, SymbolClassification::PrivateExternal);
    }

    #[test]
    fn zero_strx_entries_are_skipped() {
        let syms = build_nlist32(0, 0x01, 1);
        let mut buf = syms.clone();
        buf.extend_from_slice(b"\0");
        let cursor = ByteCursor::new(&buf);
        let fields = SymtabCommandFields {
            symoff: 0,
            nsyms: 1,
            stroff: syms.len() as u32,
            strsize: 1,
        };
        let symbols = read_symbols(&cursor, &fields, false, true).unwrap();
        assert!(symbols.is_empty());
    }

    #[test]
    fn strx_past_strsize_is_malformed_symbol_table() {
        let syms = build_nlist32(50, 0x01, 1);
        let mut buf = syms.clone();
        buf.extend_from_slice(b"\0\0\0");
        let cursor = ByteCursor::new(&buf);
        let fields = SymtabCommandFields {
            symoff: 0,
            nsyms: 1,
            stroff: syms.len() as u32,
            strsize: 3,
        };
        assert!(matches!(
            read_symbols(&cursor, &fields, false, true),
            Err(Error::MalformedSymbolTable(_))
        ));
    }
}
