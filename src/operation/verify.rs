// Copyright 2024 Simo Sorce
// See LICENSE.txt file for terms

use crate::error::{Error, Result};
use crate::mechanism::Mechanism;
use crate::object::AsObjectHandle;
use crate::pkcs11::*;
use crate::session::Session;

use super::{guarded, OpState};

/// A signature verification operation
#[derive(Debug)]
pub struct Verify {
    session: Session,
    state: OpState,
}

/// CKR_SIGNATURE_INVALID is a verdict, not a failure
fn verdict(call: &'static str, rv: CK_RV) -> Result<bool> {
    match rv {
        CKR_OK => Ok(true),
        CKR_SIGNATURE_INVALID => Ok(false),
        _ => Err(Error::ck_call(call, rv)),
    }
}

impl Verify {
    pub fn new(session: Session) -> Verify {
        Verify {
            session: session,
            state: OpState::Uninitialized,
        }
    }

    pub fn state(&self) -> OpState {
        self.state
    }

    /// C_VerifyInit
    pub fn init<K: AsObjectHandle + ?Sized>(
        &mut self,
        mechanism: &Mechanism,
        key: &K,
    ) -> Result<()> {
        self.state.check_idle()?;
        match self.session.backend().verify_init(
            self.session.handle(),
            mechanism,
            key.object_handle(),
        ) {
            CKR_OK => (),
            rv => return Err(Error::ck_call("C_VerifyInit", rv)),
        }
        self.state = OpState::Initialized;
        Ok(())
    }

    /// C_VerifyUpdate
    pub fn update(&mut self, data: &[u8]) -> Result<()> {
        let session = &self.session;
        guarded(
            &mut self.state,
            || match session.backend().verify_update(session.handle(), data) {
                CKR_OK => Ok(()),
                rv => Err(Error::ck_call("C_VerifyUpdate", rv)),
            },
            || {
                /* an empty signature is enough to terminate the operation */
                let _ = session.backend().verify_final(session.handle(), &[]);
            },
        )
    }

    /// C_VerifyFinal, Ok(false) means the signature does not match
    pub fn finalize(&mut self, signature: &[u8]) -> Result<bool> {
        self.state.check_active()?;
        self.state = OpState::Finalized;
        let rv = self
            .session
            .backend()
            .verify_final(self.session.handle(), signature);
        verdict("C_VerifyFinal", rv)
    }

    /// C_VerifyInit followed by the single part C_Verify
    pub fn once<K: AsObjectHandle + ?Sized>(
        &mut self,
        mechanism: &Mechanism,
        key: &K,
        data: &[u8],
        signature: &[u8],
    ) -> Result<bool> {
        self.init(mechanism, key)?;
        self.state = OpState::Finalized;
        let rv = self.session.backend().verify(
            self.session.handle(),
            data,
            signature,
        );
        verdict("C_Verify", rv)
    }
}
