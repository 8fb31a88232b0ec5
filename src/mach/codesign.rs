//! Parses the code-signing super-blob named by an `LC_CODE_SIGNATURE`
//! command, always big-endian regardless of the containing image's own
//! endianness.

use crate::cursor::ByteCursor;
use crate::error::{Error, Result, Warning};
use crate::mach::constants::codesign::{
    CSMAGIC_EMBEDDED_ENTITLEMENTS, CSMAGIC_EMBEDDED_SIGNATURE, CSSLOT_CODEDIRECTORY,
    CSSLOT_ENTITLEMENTS, CS_RUNTIME,
};
use crate::options::{EntitlementsScan, ParseOptions};
use crate::report::SecurityRecord;

const SUPERBLOB_HEADER_SIZE: usize = 12;
const INDEX_ENTRY_SIZE: usize = 8;

pub struct LinkeditFields {
    pub dataoff: u32,
    pub datasize: u32,
}

pub fn read_linkedit_fields(cmd_cursor: &ByteCursor, little_endian: bool) -> Result<LinkeditFields> {
    Ok(LinkeditFields {
        dataoff: cmd_cursor.read_u32(8, little_endian)?,
        datasize: cmd_cursor.read_u32(12, little_endian)?,
    })
}

/// Parses the super-blob at `dataoff`/`datasize` within `slice`. Returns
/// `Ok(None)` if the magic is unrecognized — the signature is considered
/// absent, never an error for that case.
pub fn parse_code_signature(
    slice: &ByteCursor,
    fields: &LinkeditFields,
    options: ParseOptions,
    warnings: &mut Vec<Warning>,
) -> Result<Option<SecurityRecord>> {
    let base = fields.dataoff as usize;
    let blob = slice.subrange(base, fields.datasize as usize)?;

    let magic = blob.read_u32_be(0)?;
    if magic != CSMAGIC_EMBEDDED_SIGNATURE {
        return Ok(None);
    }

    let count = blob.read_u32_be(8)?;

    let mut has_hardened_runtime = false;
    let mut entitlements_xml: Option<Vec<u8>> = None;
    let mut is_library_validation_disabled = false;
    let mut is_dylib_env_var_allowed = false;

    for i in 0..count as usize {
        let index_offset = SUPERBLOB_HEADER_SIZE + i * INDEX_ENTRY_SIZE;
        let slot_type = match blob.read_u32_be(index_offset) {
            Ok(v) => v,
            Err(_) => {
                warnings.push(Warning::new(format!(
                    "code signature: index entry {i} out of range, stopping scan"
                )));
                break;
            }
        };
        let slot_offset = blob.read_u32_be(index_offset + 4)? as usize;

        if slot_type == CSSLOT_CODEDIRECTORY {
            match read_code_directory_flags(&blob, slot_offset) {
                Ok(flags) => has_hardened_runtime = flags & CS_RUNTIME != 0,
                Err(e) => warnings.push(Warning::new(format!("code directory slot: {e}"))),
            }
        } else if slot_type == CSSLOT_ENTITLEMENTS {
            match read_entitlements_blob(&blob, slot_offset) {
                Ok(xml) => {
                    is_library_validation_disabled = scan_capability(
                        &xml,
                        "com.apple.security.cs.disable-library-validation",
                        options.entitlements_scan,
                    );
                    is_dylib_env_var_allowed = scan_capability(
                        &xml,
                        "com.apple.security.cs.allow-dyld-environment-variables",
                        options.entitlements_scan,
                    );
                    entitlements_xml = Some(xml);
                }
                Err(e) => warnings.push(Warning::new(format!("entitlements slot: {e}"))),
            }
        }
        // CSSLOT_REQUIREMENTS and anything else: ignored.
    }

    Ok(Some(SecurityRecord {
        is_signed: true,
        has_hardened_runtime,
        is_library_validation_disabled,
        is_dylib_env_var_allowed,
        entitlements_xml,
    }))
}

fn read_code_directory_flags(blob: &ByteCursor, offset: usize) -> Result<u32> {
    // (magic, length, version, flags), all big-endian u32s.
    blob.read_u32_be(offset + 12)
}

fn read_entitlements_blob(blob: &ByteCursor, offset: usize) -> Result<Vec<u8>> {
    let magic = blob.read_u32_be(offset)?;
    if magic != CSMAGIC_EMBEDDED_ENTITLEMENTS {
        return Err(Error::MalformedCodeSignature(format!(
            "entitlements blob at {offset} has magic {magic:#x}, expected {CSMAGIC_EMBEDDED_ENTITLEMENTS:#x}"
        )));
    }
    let length = blob.read_u32_be(offset + 4)? as usize;
    let payload_len = length
        .checked_sub(8)
        .ok_or_else(|| Error::MalformedCodeSignature(format!("entitlements blob length {length} underflows header")))?;
    Ok(blob.read_bytes(offset + 8, payload_len)?.to_vec())
}

/// Decides whether `<key>{key}</key>` is followed by a `<true/>` value.
/// `Permissive` (the default policy) matches `<true/>` anywhere after the
/// key; `Strict` requires it to be the value immediately adjacent to the
/// key's closing tag.
fn scan_capability(xml: &[u8], key: &str, mode: EntitlementsScan) -> bool {
    let text = String::from_utf8_lossy(xml);
    let needle = format!("<key>{key}</key>");
    let Some(key_pos) = text.find(&needle) else {
        return false;
    };

    match mode {
        EntitlementsScan::Permissive => text[key_pos..].contains("<true/>"),
        EntitlementsScan::Strict => {
            let after_key = &text[key_pos + needle.len()..];
            let trimmed = after_key.trim_start();
            trimmed.starts_with("<true/>")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_entitlements_blob(xml: &str) -> Vec<u8> {
        let mut out = Vec::new();
        let length = 8 + xml.len();
        out.extend_from_slice(&CSMAGIC_EMBEDDED_ENTITLEMENTS.to_be_bytes());
        out.extend_from_slice(&(length as u32).to_be_bytes());
        out.extend_from_slice(xml.as_bytes());
        out
    }

    fn build_code_directory(flags: u32) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&0xfade_0c02u32.to_be_bytes()); // magic
        out.extend_from_slice(&44u32.to_be_bytes()); // length
        out.extend_from_slice(&0x2_0400u32.to_be_bytes()); // version
        out.extend_from_slice(&flags.to_be_bytes());
        out
    }

    fn build_superblob(slots: &[(u32, Vec<u8>)]) -> Vec<u8> {
        let header_and_index = SUPERBLOB_HEADER_SIZE + slots.len() * INDEX_ENTRY_SIZE;
        let mut out = Vec::new();
        out.extend_from_slice(&CSMAGIC_EMBEDDED_SIGNATURE.to_be_bytes());
        let mut payload = Vec::new();
        let mut index = Vec::new();
        let mut cursor = header_and_index;
        for (slot_type, bytes) in slots {
            index.push((*slot_type, cursor as u32));
            payload.extend_from_slice(bytes);
            cursor += bytes.len();
        }
        out.extend_from_slice(&(cursor as u32).to_be_bytes()); // length
        out.extend_from_slice(&(slots.len() as u32).to_be_bytes()); // count
        for (slot_type, offset) in index {
            out.extend_from_slice(&slot_type.to_be_bytes());
            out.extend_from_slice(&offset.to_be_bytes());
        }
        out.extend_from_slice(&payload);
        out
    }

    #[test]
    fn recognizes_hardened_runtime_and_entitlements() {
        let xml = "<plist><dict><key>com.apple.security.cs.disable-library-validation</key><true/></dict></plist>";
        let superblob = build_superblob(&[
            (CSSLOT_CODEDIRECTORY, build_code_directory(CS_RUNTIME)),
            (CSSLOT_ENTITLEMENTS, build_entitlements_blob(xml)),
        ]);
        let cursor = ByteCursor::new(&superblob);
        let fields = LinkeditFields {
            dataoff: 0,
            datasize: superblob.len() as u32,
        };
        let mut warnings = Vec::new();
        let record = parse_code_signature(&cursor, &fields, ParseOptions::default(), &mut warnings)
            .unwrap()
            .unwrap();
        assert!(record.is_signed);
        assert!(record.has_hardened_runtime);
        assert!(record.is_library_validation_disabled);
        assert!(!record.is_dylib_env_var_allowed);
        assert!(record.entitlements_xml.is_some());
        assert!(warnings.is_empty());
    }

    #[test]
    fn wrong_superblob_magic_is_absent_not_an_error() {
        let mut bytes = vec![0u8; 12];
        bytes[0..4].copy_from_slice(&0xdead_beefu32.to_be_bytes());
        let cursor = ByteCursor::new(&bytes);
        let fields = LinkeditFields {
            dataoff: 0,
            datasize: bytes.len() as u32,
        };
        let mut warnings = Vec::new();
        let record = parse_code_signature(&cursor, &fields, ParseOptions::default(), &mut warnings).unwrap();
        assert!(record.is_none());
        assert!(warnings.is_empty());
    }

    #[test]
    fn wrong_entitlements_magic_warns_and_is_skipped() {
        let mut bad_blob = Vec::new();
        bad_blob.extend_from_slice(&0xbad0_0badu32.to_be_bytes());
        bad_blob.extend_from_slice(&8u32.to_be_bytes());
        let superblob = build_superblob(&[(CSSLOT_ENTITLEMENTS, bad_blob)]);
        let cursor = ByteCursor::new(&superblob);
        let fields = LinkeditFields {
            dataoff: 0,
            datasize: superblob.len() as u32,
        };
        let mut warnings = Vec::new();
        let record = parse_code_signature(&cursor, &fields, ParseOptions::default(), &mut warnings)
            .unwrap()
            .unwrap();
        assert!(record.is_signed);
        assert!(record.entitlements_xml.is_none());
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn strict_scan_rejects_a_later_unrelated_true() {
        let xml = "<key>com.apple.security.cs.disable-library-validation</key><false/><key>other</key><true/>";
        assert!(!scan_capability(
            xml.as_bytes(),
            "com.apple.security.cs.disable-library-validation",
            EntitlementsScan::Strict
        ));
        assert!(scan_capability(
            xml.as_bytes(),
            "com.apple.security.cs.disable-library-validation",
            EntitlementsScan::Permissive
        ));
    }
}
