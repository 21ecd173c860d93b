// Copyright 2024 Simo Sorce
// See LICENSE.txt file for terms

use crate::error::{Error, Result};
use crate::mechanism::Mechanism;
use crate::pkcs11::*;
use crate::session::Session;

use super::{guarded, output, OpState};

/// A message digest operation
#[derive(Debug)]
pub struct Digest {
    session: Session,
    state: OpState,
}

impl Digest {
    pub fn new(session: Session) -> Digest {
        Digest {
            session: session,
            state: OpState::Uninitialized,
        }
    }

    pub fn state(&self) -> OpState {
        self.state
    }

    /// C_DigestInit
    pub fn init(&mut self, mechanism: &Mechanism) -> Result<()> {
        self.state.check_idle()?;
        match self
            .session
            .backend()
            .digest_init(self.session.handle(), mechanism)
        {
            CKR_OK => (),
            rv => return Err(Error::ck_call("C_DigestInit", rv)),
        }
        self.state = OpState::Initialized;
        Ok(())
    }

    /// C_DigestUpdate
    pub fn update(&mut self, data: &[u8]) -> Result<()> {
        let session = &self.session;
        guarded(
            &mut self.state,
            || match session.backend().digest_update(session.handle(), data) {
                CKR_OK => Ok(()),
                rv => Err(Error::ck_call("C_DigestUpdate", rv)),
            },
            || {
                let _ = Self::final_call(session);
            },
        )
    }

    /// C_DigestFinal, returns the digest
    pub fn finalize(&mut self) -> Result<Vec<u8>> {
        self.state.check_active()?;
        self.state = OpState::Finalized;
        Self::final_call(&self.session)
    }

    /// C_DigestInit followed by the single part C_Digest
    pub fn once(&mut self, mechanism: &Mechanism, data: &[u8]) -> Result<Vec<u8>> {
        self.init(mechanism)?;
        self.state = OpState::Finalized;
        let session = &self.session;
        output("C_Digest", |buf, len| {
            session.backend().digest(session.handle(), data, buf, len)
        })
    }

    fn final_call(session: &Session) -> Result<Vec<u8>> {
        output("C_DigestFinal", |buf, len| {
            session.backend().digest_final(session.handle(), buf, len)
        })
    }
}
