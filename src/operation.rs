// Copyright 2024 Simo Sorce
// See LICENSE.txt file for terms

//! Streaming cryptographic operations.
//!
//! Each operation type owns a [Session] clone and tracks an [OpState].
//! `init` is accepted from any state but Initialized, `update` and
//! `finalize` only when Initialized, and `finalize` always ends in
//! Finalized. A failing `update` cancels the operation on the token with
//! a best effort final call before the error is returned. `once` runs the
//! single part variant of the call and cannot interleave with a streaming
//! operation on the same handle.

use crate::error::{Error, Result};
use crate::misc::usize_len;
use crate::pkcs11::*;

mod cipher;
mod digest;
mod sign;
mod verify;

pub use cipher::{Cipher, Decipher};
pub use digest::Digest;
pub use sign::Sign;
pub use verify::Verify;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpState {
    Uninitialized,
    Initialized,
    Finalized,
}

impl OpState {
    /// Errors if an operation is in progress
    pub(crate) fn check_idle(self) -> Result<()> {
        match self {
            OpState::Initialized => Err(Error::already_initialized()),
            _ => Ok(()),
        }
    }

    /// Errors unless an operation is in progress
    pub(crate) fn check_active(self) -> Result<()> {
        match self {
            OpState::Initialized => Ok(()),
            _ => Err(Error::not_initialized()),
        }
    }
}

/// Runs a call that follows the two-call output convention: a length
/// query without buffer, then the real call into a buffer of exactly the
/// reported size. The result is truncated to the returned length.
pub(crate) fn output<F>(call: &'static str, mut f: F) -> Result<Vec<u8>>
where
    F: FnMut(Option<&mut [u8]>, &mut CK_ULONG) -> CK_RV,
{
    let mut len: CK_ULONG = 0;
    match f(None, &mut len) {
        CKR_OK => (),
        rv => return Err(Error::ck_call(call, rv)),
    }
    let mut out = vec![0u8; usize_len(len)?];
    match f(Some(out.as_mut_slice()), &mut len) {
        CKR_OK => (),
        rv => return Err(Error::ck_call(call, rv)),
    }
    let len = usize_len(len)?;
    if len > out.len() {
        return Err(Error::protocol(format!(
            "{} produced {} bytes in a {} bytes buffer",
            call,
            len,
            out.len()
        )));
    }
    out.truncate(len);
    Ok(out)
}

/// Runs an update step. On error the operation is terminated with
/// `cancel`, whose outcome is ignored, and the state becomes Finalized.
pub(crate) fn guarded<T, U, C>(state: &mut OpState, update: U, cancel: C) -> Result<T>
where
    U: FnOnce() -> Result<T>,
    C: FnOnce(),
{
    state.check_active()?;
    match update() {
        Ok(r) => Ok(r),
        Err(e) => {
            cancel();
            *state = OpState::Finalized;
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_truncates() {
        let out = output("C_Test", |buf, len| match buf {
            None => {
                *len = 8;
                CKR_OK
            }
            Some(b) => {
                b[..3].copy_from_slice(b"abc");
                *len = 3;
                CKR_OK
            }
        })
        .unwrap();
        assert_eq!(out, b"abc");
    }

    #[test]
    fn output_query_failure() {
        let err = output("C_Test", |_, _| CKR_DEVICE_ERROR).unwrap_err();
        assert_eq!(err.call(), Some("C_Test"));
        assert_eq!(err.rv(), CKR_DEVICE_ERROR);
    }

    #[test]
    fn states() {
        assert!(OpState::Uninitialized.check_idle().is_ok());
        assert!(OpState::Finalized.check_idle().is_ok());
        assert!(OpState::Initialized.check_idle().is_err());
        assert!(OpState::Finalized.check_active().is_err());
    }
}
