// Copyright 2023-2026 Simo Sorce
// See LICENSE.txt file for terms

use crate::attribute::Attr;
use crate::error::Result;
use crate::pkcs11::*;

use super::{SessionObject, StorageObject};

use chrono::NaiveDate;

/// Attributes shared by all objects of class CKO_CERTIFICATE
///
/// [Certificate objects](https://docs.oasis-open.org/pkcs11/pkcs11-spec/v3.1/os/pkcs11-spec-v3.1-os.html#_Toc111203221)
/// (Version 3.1)
pub trait CertificateObject: StorageObject {
    attr_accessors! {[]
        certificate_type: CertificateType => get_ulong -> CK_CERTIFICATE_TYPE;
        trusted / set_trusted(bool): Trusted => get_bool -> bool;
        category / set_category(CK_ULONG):
            CertificateCategory => get_ulong -> CK_ULONG;
        start_date / set_start_date(NaiveDate):
            StartDate => get_date -> Option<NaiveDate>;
        end_date / set_end_date(NaiveDate):
            EndDate => get_date -> Option<NaiveDate>;
        check_value: CheckValue => get_bytes -> Vec<u8>;
        public_key_info: PublicKeyInfo => get_bytes -> Vec<u8>;
    }
}

/// A CKC_X_509 certificate
#[derive(Debug, Clone)]
pub struct X509Certificate {
    obj: SessionObject,
}

object_view!(X509Certificate);

impl CertificateObject for X509Certificate {}

impl X509Certificate {
    attr_accessors! {[pub]
        subject / set_subject(&[u8]): Subject => get_bytes -> Vec<u8>;
        id / set_id(&[u8]): Id => get_bytes -> Vec<u8>;
        issuer / set_issuer(&[u8]): Issuer => get_bytes -> Vec<u8>;
        serial_number / set_serial_number(&[u8]):
            SerialNumber => get_bytes -> Vec<u8>;
        value / set_value(&[u8]): Value => get_bytes -> Vec<u8>;
        url / set_url(&str): Url => get_string -> String;
        hash_of_subject_public_key / set_hash_of_subject_public_key(&[u8]):
            HashOfSubjectPublicKey => get_bytes -> Vec<u8>;
        hash_of_issuer_public_key / set_hash_of_issuer_public_key(&[u8]):
            HashOfIssuerPublicKey => get_bytes -> Vec<u8>;
        java_midp_security_domain / set_java_midp_security_domain(CK_ULONG):
            JavaMidpSecurityDomain => get_ulong -> CK_ULONG;
        name_hash_algorithm / set_name_hash_algorithm(CK_MECHANISM_TYPE):
            NameHashAlgorithm => get_ulong -> CK_MECHANISM_TYPE;
    }
}

/// A CKC_WTLS certificate
#[derive(Debug, Clone)]
pub struct WtlsCertificate {
    obj: SessionObject,
}

object_view!(WtlsCertificate);

impl CertificateObject for WtlsCertificate {}

impl WtlsCertificate {
    attr_accessors! {[pub]
        subject / set_subject(&[u8]): Subject => get_bytes -> Vec<u8>;
        issuer / set_issuer(&[u8]): Issuer => get_bytes -> Vec<u8>;
        url / set_url(&str): Url => get_string -> String;
        value / set_value(&[u8]): Value => get_bytes -> Vec<u8>;
        hash_of_subject_public_key / set_hash_of_subject_public_key(&[u8]):
            HashOfSubjectPublicKey => get_bytes -> Vec<u8>;
        hash_of_issuer_public_key / set_hash_of_issuer_public_key(&[u8]):
            HashOfIssuerPublicKey => get_bytes -> Vec<u8>;
        name_hash_algorithm / set_name_hash_algorithm(CK_MECHANISM_TYPE):
            NameHashAlgorithm => get_ulong -> CK_MECHANISM_TYPE;
    }
}

/// A CKC_X_509_ATTR_CERT attribute certificate
#[derive(Debug, Clone)]
pub struct AttributeCertificate {
    obj: SessionObject,
}

object_view!(AttributeCertificate);

impl CertificateObject for AttributeCertificate {}

impl AttributeCertificate {
    attr_accessors! {[pub]
        owner / set_owner(&[u8]): Owner => get_bytes -> Vec<u8>;
        ac_issuer / set_ac_issuer(&[u8]): AcIssuer => get_bytes -> Vec<u8>;
        serial_number / set_serial_number(&[u8]):
            SerialNumber => get_bytes -> Vec<u8>;
        attr_types / set_attr_types(&[u8]): AttrTypes => get_bytes -> Vec<u8>;
        value / set_value(&[u8]): Value => get_bytes -> Vec<u8>;
    }
}
