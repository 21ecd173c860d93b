// Copyright 2024 Simo Sorce
// See LICENSE.txt file for terms

//! Small helpers for CK_ULONG sized wire integers.

use crate::error::{Error, Result};
use crate::pkcs11::*;

/// Width in bytes of the native CK_ULONG
pub const CK_ULONG_SIZE: usize = std::mem::size_of::<CK_ULONG>();

/// Appends `val` as a little-endian CK_ULONG
pub fn put_ulong(buf: &mut Vec<u8>, val: CK_ULONG) {
    buf.extend_from_slice(&val.to_le_bytes());
}

/// Overwrites the CK_ULONG found at byte offset `off`
pub fn set_ulong(buf: &mut [u8], off: usize, val: CK_ULONG) -> Result<()> {
    let end = off.checked_add(CK_ULONG_SIZE).unwrap_or(usize::MAX);
    match buf.get_mut(off..end) {
        Some(s) => {
            s.copy_from_slice(&val.to_le_bytes());
            Ok(())
        }
        None => Err(Error::protocol(format!(
            "offset {} is out of bounds for a {} bytes buffer",
            off,
            buf.len()
        ))),
    }
}

/// Reads the little-endian CK_ULONG found at byte offset `off`
pub fn get_ulong(buf: &[u8], off: usize) -> Result<CK_ULONG> {
    let end = off.checked_add(CK_ULONG_SIZE).unwrap_or(usize::MAX);
    match buf.get(off..end) {
        Some(s) => Ok(CK_ULONG::from_le_bytes(s.try_into()?)),
        None => Err(Error::protocol(format!(
            "offset {} is out of bounds for a {} bytes buffer",
            off,
            buf.len()
        ))),
    }
}

/// Converts a buffer length to a CK_ULONG
pub fn ulong_len(len: usize) -> Result<CK_ULONG> {
    Ok(CK_ULONG::try_from(len)?)
}

/// Converts a CK_ULONG reported by the module to a usize
pub fn usize_len(len: CK_ULONG) -> Result<usize> {
    Ok(usize::try_from(len)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ulong_at_offsets() {
        let mut buf = Vec::new();
        put_ulong(&mut buf, 7);
        put_ulong(&mut buf, CK_ULONG::MAX);
        assert_eq!(buf.len(), 2 * CK_ULONG_SIZE);
        assert_eq!(buf[0], 7);
        assert_eq!(get_ulong(&buf, CK_ULONG_SIZE).unwrap(), CK_ULONG::MAX);
        set_ulong(&mut buf, 0, 0x0102).unwrap();
        assert_eq!(&buf[..2], &[0x02, 0x01]);
        assert!(get_ulong(&buf, CK_ULONG_SIZE + 1).is_err());
        let end = buf.len();
        assert!(set_ulong(&mut buf, end, 1).is_err());
    }
}
