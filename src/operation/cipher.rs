// Copyright 2024 Simo Sorce
// See LICENSE.txt file for terms

use crate::error::{Error, Result};
use crate::mechanism::Mechanism;
use crate::object::AsObjectHandle;
use crate::pkcs11::*;
use crate::session::Session;

use super::{guarded, output, OpState};

/// Encryption and decryption share the exact same call shape, only the
/// backend functions differ
macro_rules! cipher_operation {
    (
        $(#[$doc:meta])*
        $op:ident;
        $init:ident as $init_name:literal;
        $update:ident as $update_name:literal;
        $fin:ident as $final_name:literal;
        $once:ident as $once_name:literal
    ) => {
        $(#[$doc])*
        #[derive(Debug)]
        pub struct $op {
            session: Session,
            state: OpState,
        }

        impl $op {
            pub fn new(session: Session) -> $op {
                $op {
                    session: session,
                    state: OpState::Uninitialized,
                }
            }

            pub fn state(&self) -> OpState {
                self.state
            }

            #[doc = $init_name]
            pub fn init<K: AsObjectHandle + ?Sized>(
                &mut self,
                mechanism: &Mechanism,
                key: &K,
            ) -> Result<()> {
                self.state.check_idle()?;
                match self.session.backend().$init(
                    self.session.handle(),
                    mechanism,
                    key.object_handle(),
                ) {
                    CKR_OK => (),
                    rv => return Err(Error::ck_call($init_name, rv)),
                }
                self.state = OpState::Initialized;
                Ok(())
            }

            #[doc = concat!($update_name, ", returns the bytes produced so far")]
            pub fn update(&mut self, data: &[u8]) -> Result<Vec<u8>> {
                let session = &self.session;
                guarded(
                    &mut self.state,
                    || {
                        output($update_name, |buf, len| {
                            session.backend().$update(
                                session.handle(),
                                data,
                                buf,
                                len,
                            )
                        })
                    },
                    || {
                        let _ = Self::final_call(session);
                    },
                )
            }

            #[doc = concat!($final_name, ", returns the remaining bytes")]
            pub fn finalize(&mut self) -> Result<Vec<u8>> {
                self.state.check_active()?;
                self.state = OpState::Finalized;
                Self::final_call(&self.session)
            }

            #[doc = concat!($init_name, " followed by the single part ", $once_name)]
            pub fn once<K: AsObjectHandle + ?Sized>(
                &mut self,
                mechanism: &Mechanism,
                key: &K,
                data: &[u8],
            ) -> Result<Vec<u8>> {
                self.init(mechanism, key)?;
                self.state = OpState::Finalized;
                let session = &self.session;
                output($once_name, |buf, len| {
                    session.backend().$once(session.handle(), data, buf, len)
                })
            }

            fn final_call(session: &Session) -> Result<Vec<u8>> {
                output($final_name, |buf, len| {
                    session.backend().$fin(session.handle(), buf, len)
                })
            }
        }
    };
}

cipher_operation! {
    /// An encryption operation
    Cipher;
    encrypt_init as "C_EncryptInit";
    encrypt_update as "C_EncryptUpdate";
    encrypt_final as "C_EncryptFinal";
    encrypt as "C_Encrypt"
}

cipher_operation! {
    /// A decryption operation
    Decipher;
    decrypt_init as "C_DecryptInit";
    decrypt_update as "C_DecryptUpdate";
    decrypt_final as "C_DecryptFinal";
    decrypt as "C_Decrypt"
}
