// Copyright 2023 Simo Sorce
// See LICENSE.txt file for terms

pub use crate::attribute::{decode, encode};
pub use crate::error::ErrorKind;
pub use crate::object::factory::CertificateView;
pub use crate::object::{
    DataObject, KeyPair, PrivateKey, PublicKey, SecretKey, X509Certificate,
};
pub use crate::pkcs11::*;
pub use crate::template::parse;
pub use crate::*;

pub use chrono::NaiveDate;
pub use std::sync::Arc;

pub use mock::*;

/// Shorthand for building templates in tests
macro_rules! template {
    ($($attr:ident: $val:expr),* $(,)?) => {{
        let mut t = Template::new();
        $(t.add(Attr::$attr, $val).unwrap();)*
        t
    }};
}

/// A mock token holding one generic secret usable for every operation
pub fn token_with_key(
    value: &[u8],
) -> (Arc<MockToken>, Session, CK_OBJECT_HANDLE) {
    let token = MockToken::new();
    let key = token.add_object(&template! {
        Class: CKO_SECRET_KEY,
        KeyType: CKK_GENERIC_SECRET,
        Label: "secret",
        Value: value,
    });
    let session = token.session();
    (token, session, key)
}

mod ciphers;
mod hashes;
mod keys;
mod session;
mod signatures;

#[cfg(feature = "async")]
mod asynchronous;
