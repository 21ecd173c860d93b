// Copyright 2024 Simo Sorce
// See LICENSE.txt file for terms

use crate::error::{Error, Result};
use crate::mechanism::Mechanism;
use crate::object::AsObjectHandle;
use crate::pkcs11::*;
use crate::session::Session;

use super::{guarded, output, OpState};

/// A signature (or MAC) generation operation
#[derive(Debug)]
pub struct Sign {
    session: Session,
    state: OpState,
}

impl Sign {
    pub fn new(session: Session) -> Sign {
        Sign {
            session: session,
            state: OpState::Uninitialized,
        }
    }

    pub fn state(&self) -> OpState {
        self.state
    }

    /// C_SignInit
    pub fn init<K: AsObjectHandle + ?Sized>(
        &mut self,
        mechanism: &Mechanism,
        key: &K,
    ) -> Result<()> {
        self.state.check_idle()?;
        match self.session.backend().sign_init(
            self.session.handle(),
            mechanism,
            key.object_handle(),
        ) {
            CKR_OK => (),
            rv => return Err(Error::ck_call("C_SignInit", rv)),
        }
        self.state = OpState::Initialized;
        Ok(())
    }

    /// C_SignUpdate
    pub fn update(&mut self, data: &[u8]) -> Result<()> {
        let session = &self.session;
        guarded(
            &mut self.state,
            || match session.backend().sign_update(session.handle(), data) {
                CKR_OK => Ok(()),
                rv => Err(Error::ck_call("C_SignUpdate", rv)),
            },
            || {
                let _ = Self::final_call(session);
            },
        )
    }

    /// C_SignFinal, returns the signature
    pub fn finalize(&mut self) -> Result<Vec<u8>> {
        self.state.check_active()?;
        self.state = OpState::Finalized;
        Self::final_call(&self.session)
    }

    /// C_SignInit followed by the single part C_Sign
    pub fn once<K: AsObjectHandle + ?Sized>(
        &mut self,
        mechanism: &Mechanism,
        key: &K,
        data: &[u8],
    ) -> Result<Vec<u8>> {
        self.init(mechanism, key)?;
        self.state = OpState::Finalized;
        let session = &self.session;
        output("C_Sign", |buf, len| {
            session.backend().sign(session.handle(), data, buf, len)
        })
    }

    fn final_call(session: &Session) -> Result<Vec<u8>> {
        output("C_SignFinal", |buf, len| {
            session.backend().sign_final(session.handle(), buf, len)
        })
    }
}
