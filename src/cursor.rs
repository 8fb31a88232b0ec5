//! Bounds-checked, endian-aware reads over a borrowed byte buffer.
//!
//! Every other component in this crate touches the input only through a
//! `ByteCursor`; none of them index a slice or compute a pointer offset
//! directly. This is the one place that layers `scroll::Pread` over raw
//! bytes (`bytes.pread_with::<T>(offset, endian)`), so a read past the
//! declared length is a `Result::Err` rather than a panic or out-of-bounds
//! access.

use scroll::Pread;

use crate::error::{Error, Result};

/// An immutable, bounds-checked view over a byte slice.
///
/// Cheap to copy (it's just a fat pointer); `subrange` derives a new cursor
/// over a validated sub-range without copying the underlying bytes.
#[derive(Debug, Clone, Copy)]
pub struct ByteCursor<'a> {
    bytes: &'a [u8],
}

impl<'a> ByteCursor<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        ByteCursor { bytes }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_slice(&self) -> &'a [u8] {
        self.bytes
    }

    pub fn read_u8(&self, offset: usize) -> Result<u8> {
        Ok(self.bytes.pread(offset)?)
    }

    pub fn read_u16(&self, offset: usize, little_endian: bool) -> Result<u16> {
        let endian = if little_endian { scroll::LE } else { scroll::BE };
        Ok(self.bytes.pread_with(offset, endian)?)
    }

    pub fn read_u32(&self, offset: usize, little_endian: bool) -> Result<u32> {
        let endian = if little_endian { scroll::LE } else { scroll::BE };
        Ok(self.bytes.pread_with(offset, endian)?)
    }

    pub fn read_u32_le(&self, offset: usize) -> Result<u32> {
        self.read_u32(offset, true)
    }

    pub fn read_u32_be(&self, offset: usize) -> Result<u32> {
        self.read_u32(offset, false)
    }

    pub fn read_u64(&self, offset: usize, little_endian: bool) -> Result<u64> {
        let endian = if little_endian { scroll::LE } else { scroll::BE };
        Ok(self.bytes.pread_with(offset, endian)?)
    }

    /// Returns `n` bytes starting at `offset`, failing with
    /// [`Error::TruncatedInput`] if the range runs past the buffer.
    pub fn read_bytes(&self, offset: usize, n: usize) -> Result<&'a [u8]> {
        let end = offset.checked_add(n).ok_or_else(|| {
            Error::TruncatedInput(format!("offset {offset} + length {n} overflows"))
        })?;
        if end > self.bytes.len() {
            return Err(Error::TruncatedInput(format!(
                "range {offset}..{end} exceeds buffer of length {}",
                self.bytes.len()
            )));
        }
        Ok(&self.bytes[offset..end])
    }

    /// Derives a new cursor over `[offset, offset + len)` of this one.
    pub fn subrange(&self, offset: usize, len: usize) -> Result<ByteCursor<'a>> {
        Ok(ByteCursor::new(self.read_bytes(offset, len)?))
    }

    /// Scans up to `max` bytes starting at `offset` for a NUL terminator.
    ///
    /// Returns `(bytes_before_nul, found_nul)`. An absent NUL is not an
    /// error — the caller decides whether that constitutes truncation. An
    /// `offset` at or past the end of the buffer yields an empty slice and
    /// `found_nul = false`.
    pub fn as_cstr_limit(&self, offset: usize, max: usize) -> (&'a [u8], bool) {
        if offset >= self.bytes.len() {
            return (&[], false);
        }
        let available = self.bytes.len() - offset;
        let scan_len = available.min(max);
        let window = &self.bytes[offset..offset + scan_len];
        match window.iter().position(|&b| b == 0) {
            Some(pos) => (&window[..pos], true),
            None => (window, false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_within_bounds() {
        let data = [0x01, 0x02, 0x03, 0x04, 0xde, 0xad, 0xbe, 0xef];
        let cursor = ByteCursor::new(&data);
        assert_eq!(cursor.read_u32_le(0).unwrap(), 0x0403_0201);
        assert_eq!(cursor.read_u32_be(4).unwrap(), 0xdead_beef);
    }

    #[test]
    fn read_past_end_is_truncated_input() {
        let data = [0x00, 0x01];
        let cursor = ByteCursor::new(&data);
        assert!(cursor.read_u32_le(0).is_err());
    }

    #[test]
    fn subrange_bounds_checks() {
        let data = [0u8; 16];
        let cursor = ByteCursor::new(&data);
        assert!(cursor.subrange(10, 10).is_err());
        assert!(cursor.subrange(4, 4).is_ok());
    }

    #[test]
    fn cstr_limit_stops_at_nul() {
        let data = b"hello\0world";
        let cursor = ByteCursor::new(data);
        let (bytes, found) = cursor.as_cstr_limit(0, 256);
        assert_eq!(bytes, b"hello");
        assert!(found);
    }

    #[test]
    fn cstr_limit_without_nul_reports_truncation() {
        let data = [b'x'; 10];
        let cursor = ByteCursor::new(&data);
        let (bytes, found) = cursor.as_cstr_limit(0, 4);
        assert_eq!(bytes.len(), 4);
        assert!(!found);
    }

    #[test]
    fn cstr_limit_offset_at_end_is_empty() {
        let data = [1u8, 2, 3];
        let cursor = ByteCursor::new(&data);
        let (bytes, found) = cursor.as_cstr_limit(3, 16);
        assert!(bytes.is_empty());
        assert!(!found);
    }
}
