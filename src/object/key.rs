// Copyright 2023-2026 Simo Sorce
// See LICENSE.txt file for terms

use crate::attribute::Attr;
use crate::error::Result;
use crate::pkcs11::*;

use super::{SessionObject, StorageObject};

use chrono::NaiveDate;

/// Attributes shared by public, private and secret keys
pub trait KeyObject: StorageObject {
    attr_accessors! {[]
        key_type: KeyType => get_ulong -> CK_KEY_TYPE;
        id / set_id(&[u8]): Id => get_bytes -> Vec<u8>;
        start_date / set_start_date(NaiveDate):
            StartDate => get_date -> Option<NaiveDate>;
        end_date / set_end_date(NaiveDate):
            EndDate => get_date -> Option<NaiveDate>;
        derive / set_derive(bool): Derive => get_bool -> bool;
        local: Local => get_bool -> bool;
        key_gen_mechanism: KeyGenMechanism => get_ulong -> CK_MECHANISM_TYPE;
    }
}

#[derive(Debug, Clone)]
pub struct PrivateKey {
    obj: SessionObject,
}

object_view!(PrivateKey);

impl KeyObject for PrivateKey {}

impl PrivateKey {
    attr_accessors! {[pub]
        subject / set_subject(&[u8]): Subject => get_bytes -> Vec<u8>;
        sensitive / set_sensitive(bool): Sensitive => get_bool -> bool;
        decrypt / set_decrypt(bool): Decrypt => get_bool -> bool;
        sign / set_sign(bool): Sign => get_bool -> bool;
        sign_recover / set_sign_recover(bool): SignRecover => get_bool -> bool;
        unwrap / set_unwrap(bool): Unwrap => get_bool -> bool;
        extractable / set_extractable(bool): Extractable => get_bool -> bool;
        wrap_with_trusted / set_wrap_with_trusted(bool):
            WrapWithTrusted => get_bool -> bool;
        always_authenticate / set_always_authenticate(bool):
            AlwaysAuthenticate => get_bool -> bool;
        always_sensitive: AlwaysSensitive => get_bool -> bool;
        never_extractable: NeverExtractable => get_bool -> bool;
        public_key_info: PublicKeyInfo => get_bytes -> Vec<u8>;
        modulus: Modulus => get_bytes -> Vec<u8>;
        public_exponent: PublicExponent => get_bytes -> Vec<u8>;
        ec_params: EcParams => get_bytes -> Vec<u8>;
    }
}

#[derive(Debug, Clone)]
pub struct PublicKey {
    obj: SessionObject,
}

object_view!(PublicKey);

impl KeyObject for PublicKey {}

impl PublicKey {
    attr_accessors! {[pub]
        subject / set_subject(&[u8]): Subject => get_bytes -> Vec<u8>;
        encrypt / set_encrypt(bool): Encrypt => get_bool -> bool;
        verify / set_verify(bool): Verify => get_bool -> bool;
        verify_recover / set_verify_recover(bool):
            VerifyRecover => get_bool -> bool;
        wrap / set_wrap(bool): Wrap => get_bool -> bool;
        trusted / set_trusted(bool): Trusted => get_bool -> bool;
        public_key_info: PublicKeyInfo => get_bytes -> Vec<u8>;
        modulus: Modulus => get_bytes -> Vec<u8>;
        modulus_bits: ModulusBits => get_ulong -> CK_ULONG;
        public_exponent: PublicExponent => get_bytes -> Vec<u8>;
        ec_params: EcParams => get_bytes -> Vec<u8>;
        ec_point: EcPoint => get_bytes -> Vec<u8>;
    }
}

#[derive(Debug, Clone)]
pub struct SecretKey {
    obj: SessionObject,
}

object_view!(SecretKey);

impl KeyObject for SecretKey {}

impl SecretKey {
    attr_accessors! {[pub]
        sensitive / set_sensitive(bool): Sensitive => get_bool -> bool;
        encrypt / set_encrypt(bool): Encrypt => get_bool -> bool;
        decrypt / set_decrypt(bool): Decrypt => get_bool -> bool;
        sign / set_sign(bool): Sign => get_bool -> bool;
        verify / set_verify(bool): Verify => get_bool -> bool;
        wrap / set_wrap(bool): Wrap => get_bool -> bool;
        unwrap / set_unwrap(bool): Unwrap => get_bool -> bool;
        extractable / set_extractable(bool): Extractable => get_bool -> bool;
        wrap_with_trusted / set_wrap_with_trusted(bool):
            WrapWithTrusted => get_bool -> bool;
        trusted / set_trusted(bool): Trusted => get_bool -> bool;
        always_sensitive: AlwaysSensitive => get_bool -> bool;
        never_extractable: NeverExtractable => get_bool -> bool;
        check_value: CheckValue => get_bytes -> Vec<u8>;
        value: Value => get_bytes -> Vec<u8>;
        value_len: ValueLen => get_ulong -> CK_ULONG;
    }
}

/// The two halves returned by key pair generation
#[derive(Debug, Clone)]
pub struct KeyPair {
    pub public: PublicKey,
    pub private: PrivateKey,
}
