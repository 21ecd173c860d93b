// Copyright 2023-2026 Simo Sorce
// See LICENSE.txt file for terms

use crate::attribute::Attr;
use crate::error::{Error, Result};
use crate::pkcs11::*;

use super::certs::{AttributeCertificate, WtlsCertificate, X509Certificate};
use super::key::{PrivateKey, PublicKey, SecretKey};
use super::{SessionObject, StorageObject};

use log::debug;

/// A CKO_DATA object
#[derive(Debug, Clone)]
pub struct DataObject {
    obj: SessionObject,
}

object_view!(DataObject);

impl DataObject {
    attr_accessors! {[pub]
        application / set_application(&str):
            Application => get_string -> String;
        object_id / set_object_id(&[u8]): ObjectId => get_bytes -> Vec<u8>;
        value / set_value(&[u8]): Value => get_bytes -> Vec<u8>;
    }
}

/// A CKO_DOMAIN_PARAMETERS object
#[derive(Debug, Clone)]
pub struct DomainParameters {
    obj: SessionObject,
}

object_view!(DomainParameters);

impl DomainParameters {
    attr_accessors! {[pub]
        key_type: KeyType => get_ulong -> CK_KEY_TYPE;
        local: Local => get_bool -> bool;
        prime / set_prime(&[u8]): Prime => get_bytes -> Vec<u8>;
        subprime / set_subprime(&[u8]): Subprime => get_bytes -> Vec<u8>;
        base / set_base(&[u8]): Base => get_bytes -> Vec<u8>;
        prime_bits / set_prime_bits(CK_ULONG): PrimeBits => get_ulong -> CK_ULONG;
    }
}

/// The typed certificate views
#[derive(Debug, Clone)]
pub enum CertificateView {
    X509(X509Certificate),
    Wtls(WtlsCertificate),
    Attribute(AttributeCertificate),
}

impl CertificateView {
    pub fn object(&self) -> &SessionObject {
        match self {
            CertificateView::X509(c) => c.object(),
            CertificateView::Wtls(c) => c.object(),
            CertificateView::Attribute(c) => c.object(),
        }
    }

    pub fn certificate_type(&self) -> CK_CERTIFICATE_TYPE {
        match self {
            CertificateView::X509(_) => CKC_X_509,
            CertificateView::Wtls(_) => CKC_WTLS,
            CertificateView::Attribute(_) => CKC_X_509_ATTR_CERT,
        }
    }
}

/// An object classified by its class and, for certificates, its type
#[derive(Debug, Clone)]
pub enum ObjectView {
    Data(DataObject),
    DomainParameters(DomainParameters),
    Certificate(CertificateView),
    PrivateKey(PrivateKey),
    PublicKey(PublicKey),
    SecretKey(SecretKey),
}

impl ObjectView {
    /// The generic handle behind the view
    pub fn object(&self) -> &SessionObject {
        match self {
            ObjectView::Data(o) => o.object(),
            ObjectView::DomainParameters(o) => o.object(),
            ObjectView::Certificate(c) => c.object(),
            ObjectView::PrivateKey(k) => k.object(),
            ObjectView::PublicKey(k) => k.object(),
            ObjectView::SecretKey(k) => k.object(),
        }
    }

    pub fn class(&self) -> CK_OBJECT_CLASS {
        match self {
            ObjectView::Data(_) => CKO_DATA,
            ObjectView::DomainParameters(_) => CKO_DOMAIN_PARAMETERS,
            ObjectView::Certificate(_) => CKO_CERTIFICATE,
            ObjectView::PrivateKey(_) => CKO_PRIVATE_KEY,
            ObjectView::PublicKey(_) => CKO_PUBLIC_KEY,
            ObjectView::SecretKey(_) => CKO_SECRET_KEY,
        }
    }
}

impl super::AsObjectHandle for ObjectView {
    fn object_handle(&self) -> CK_OBJECT_HANDLE {
        self.object().handle()
    }
}

/// Inspects the class (and certificate type) of `obj` and wraps it in
/// the matching view. There is no fallback view.
pub fn classify(obj: SessionObject) -> Result<ObjectView> {
    let class = obj.get_ulong(Attr::Class)?;
    let view = match class {
        CKO_DATA => ObjectView::Data(DataObject::new(obj)),
        CKO_DOMAIN_PARAMETERS => {
            ObjectView::DomainParameters(DomainParameters::new(obj))
        }
        CKO_PRIVATE_KEY => ObjectView::PrivateKey(PrivateKey::new(obj)),
        CKO_PUBLIC_KEY => ObjectView::PublicKey(PublicKey::new(obj)),
        CKO_SECRET_KEY => ObjectView::SecretKey(SecretKey::new(obj)),
        CKO_CERTIFICATE => {
            let ctype = obj.get_ulong(Attr::CertificateType)?;
            ObjectView::Certificate(match ctype {
                CKC_X_509 => CertificateView::X509(X509Certificate::new(obj)),
                CKC_WTLS => CertificateView::Wtls(WtlsCertificate::new(obj)),
                CKC_X_509_ATTR_CERT => {
                    CertificateView::Attribute(AttributeCertificate::new(obj))
                }
                _ => {
                    debug!(
                        "object {} has unknown certificate type {:#x}",
                        obj.handle(),
                        ctype
                    );
                    return Err(Error::unrecognized(class, Some(ctype)));
                }
            })
        }
        _ => {
            debug!("object {} has unknown class {:#x}", obj.handle(), class);
            return Err(Error::unrecognized(class, None));
        }
    };
    Ok(view)
}
