// Copyright 2023 Simo Sorce
// See LICENSE.txt file for terms

//! This is p11client
//!
//! A typed client layer for driving PKCS #11 tokens: attribute templates,
//! mechanism parameters, typed object views and streaming cryptographic
//! operations on top of a pluggable [Backend].

pub use pkcs11;

pub mod attribute;
pub mod backend;
pub mod config;
pub mod error;
pub mod mechanism;
pub mod misc;
pub mod object;
pub mod operation;
pub mod session;
pub mod template;

#[cfg(feature = "trace")]
mod logger;

#[cfg(feature = "trace")]
pub use logger::log_init;

pub use attribute::{Attr, AttrType, AttrValue, Attribute, Payload};
pub use backend::Backend;
pub use config::Config;
pub use error::{Error, ErrorKind, Result};
pub use mechanism::{
    AesCbcEncryptDataParams, CcmParams, Ecdh1DeriveParams, GcmParams,
    Mechanism, MechanismParams, ParamBlock, RsaOaepParams, RsaPssParams,
};
pub use object::{
    AsObjectHandle, CertificateObject, KeyObject, ObjectView, SessionObject,
    StorageObject,
};
pub use operation::{Cipher, Decipher, Digest, OpState, Sign, Verify};
pub use session::Session;
pub use template::{KeyUsage, Template, TemplateBuffer};

#[cfg(test)]
mod tests;
