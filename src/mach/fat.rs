//! Detects a fat/universal wrapper and yields the inner Mach-O slices it
//! describes, or falls through to a single slice covering the whole input
//! for thin images.
//!
//! The arch table is always read big-endian regardless of the inner
//! images' own byte order. Both the 32- and 64-bit arch-table variants are
//! accepted, and malformed input is reported rather than indexed into
//! directly.

use crate::cursor::ByteCursor;
use crate::error::{Error, Result};
use crate::mach::constants::{
    FAT_CIGAM, FAT_CIGAM_64, FAT_MAGIC, FAT_MAGIC_64, SIZEOF_FAT_ARCH, SIZEOF_FAT_ARCH_64,
    SIZEOF_FAT_HEADER,
};

/// One arch-table record, word-width-normalized regardless of whether the
/// on-disk magic used 32- or 64-bit offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FatArchEntry {
    pub cputype: u32,
    pub cpusubtype: u32,
    pub offset: u64,
    pub size: u64,
}

/// Either a fat wrapper's arch table, or a single entry spanning the whole
/// buffer for a thin image.
pub fn demultiplex<'a>(input: ByteCursor<'a>) -> Result<Vec<(FatArchEntry, ByteCursor<'a>)>> {
    let magic = input.read_u32_be(0)?;

    let wide = match magic {
        FAT_MAGIC | FAT_CIGAM => false,
        FAT_MAGIC_64 | FAT_CIGAM_64 => true,
        _ => return Ok(vec![(thin_entry(&input), input)]),
    };

    let nfat_arch = input.read_u32_be(4)? as usize;
    let record_size = if wide { SIZEOF_FAT_ARCH_64 } else { SIZEOF_FAT_ARCH };

    let table_bytes = nfat_arch
        .checked_mul(record_size)
        .ok_or_else(|| Error::MalformedFat(format!("nfat_arch {nfat_arch} overflows")))?;
    let table_end = SIZEOF_FAT_HEADER
        .checked_add(table_bytes)
        .ok_or_else(|| Error::MalformedFat("arch table offset overflows".into()))?;
    if table_end > input.len() {
        return Err(Error::MalformedFat(format!(
            "arch table of {nfat_arch} entries ({table_bytes} bytes) runs past buffer of length {}",
            input.len()
        )));
    }

    let mut out = Vec::with_capacity(nfat_arch);
    let mut offset = SIZEOF_FAT_HEADER;
    for i in 0..nfat_arch {
        let cputype = input.read_u32_be(offset)?;
        let cpusubtype = input.read_u32_be(offset + 4)?;
        let (arch_offset, arch_size) = if wide {
            (input.read_u64(offset + 8, false)?, input.read_u64(offset + 16, false)?)
        } else {
            (input.read_u32_be(offset + 8)? as u64, input.read_u32_be(offset + 12)? as u64)
        };

        let entry = FatArchEntry {
            cputype,
            cpusubtype,
            offset: arch_offset,
            size: arch_size,
        };

        let slice = input
            .subrange(
                usize::try_from(arch_offset)
                    .map_err(|_| Error::MalformedFat(format!("arch {i} offset {arch_offset} out of range")))?,
                usize::try_from(arch_size)
                    .map_err(|_| Error::MalformedFat(format!("arch {i} size {arch_size} out of range")))?,
            )
            .map_err(|_| {
                Error::MalformedFat(format!(
                    "arch {i} range {arch_offset}..{} exceeds buffer of length {}",
                    arch_offset + arch_size,
                    input.len()
                ))
            })?;

        out.push((entry, slice));
        offset += record_size;
    }

    Ok(out)
}

pub fn is_fat_magic(magic: u32) -> bool {
    matches!(magic, FAT_MAGIC | FAT_CIGAM | FAT_MAGIC_64 | FAT_CIGAM_64)
}

fn thin_entry(input: &ByteCursor) -> FatArchEntry {
    FatArchEntry {
        cputype: 0,
        cpusubtype: 0,
        offset: 0,
        size: input.len() as u64,
    }
}
