// Copyright 2023-2026 Simo Sorce
// See LICENSE.txt file for terms

//! This module defines the client side representation of token objects.
//!
//! A [SessionObject] is a handle bound to the [Session] it was found or
//! created in. Nothing is cached: every accessor goes to the module.
//! Typed views ([DataObject], [X509Certificate], [PrivateKey], ...) wrap a
//! [SessionObject] and expose one getter (and, where the attribute is
//! modifiable, one setter) per attribute relevant to the object class.
//! The [classify] function inspects a handle and returns the matching
//! view as an [ObjectView].

use crate::attribute::{AttrType, AttrValue, Attr, Attribute, Payload};
use crate::error::{Error, Result};
use crate::pkcs11::*;
use crate::session::Session;
use crate::template::Template;

use chrono::NaiveDate;

/// Helper macro that generates getters (and optional setters) bound to
/// one attribute each. The visibility is given in brackets so the same
/// macro serves trait default methods and inherent impls.
///
/// `name / setter(type): Attr => getter -> type;`
macro_rules! attr_accessors {
    ([] $($rest:tt)*) => {
        attr_accessors! {@emit , $($rest)*}
    };
    ([$vis:vis] $($rest:tt)*) => {
        attr_accessors! {@emit $vis, $($rest)*}
    };
    (@emit $vis:vis, $($name:ident $(/ $setter:ident($vt:ty))?:
        $attr:ident => $get:ident -> $ret:ty;)*) => {
        $(
            #[doc = concat!("Reads the `", stringify!($attr), "` attribute")]
            $vis fn $name(&self) -> Result<$ret> {
                self.object().$get(Attr::$attr)
            }
            $(
                #[doc = concat!("Writes the `", stringify!($attr), "` attribute")]
                $vis fn $setter(&self, value: $vt) -> Result<()> {
                    self.object().set_attr(Attr::$attr, value)
                }
            )?
        )*
    };
}

/// Implements the plumbing shared by every typed view
macro_rules! object_view {
    ($view:ident) => {
        impl $view {
            /// Wraps `obj` without checking its class
            pub fn new(obj: SessionObject) -> $view {
                $view { obj: obj }
            }

            pub fn into_object(self) -> SessionObject {
                self.obj
            }
        }

        impl $crate::object::StorageObject for $view {
            fn object(&self) -> &SessionObject {
                &self.obj
            }
        }

        impl $crate::object::AsObjectHandle for $view {
            fn object_handle(&self) -> CK_OBJECT_HANDLE {
                self.obj.handle()
            }
        }
    };
}

pub mod certs;
pub mod factory;
pub mod key;

pub use certs::{
    AttributeCertificate, CertificateObject, WtlsCertificate, X509Certificate,
};
pub use factory::{
    classify, CertificateView, DataObject, DomainParameters, ObjectView,
};
pub use key::{KeyObject, KeyPair, PrivateKey, PublicKey, SecretKey};

/// Anything that designates an object on the token
pub trait AsObjectHandle {
    fn object_handle(&self) -> CK_OBJECT_HANDLE;
}

impl AsObjectHandle for CK_OBJECT_HANDLE {
    fn object_handle(&self) -> CK_OBJECT_HANDLE {
        *self
    }
}

/// An object handle bound to the session it belongs to
#[derive(Debug, Clone)]
pub struct SessionObject {
    session: Session,
    handle: CK_OBJECT_HANDLE,
}

impl AsObjectHandle for SessionObject {
    fn object_handle(&self) -> CK_OBJECT_HANDLE {
        self.handle
    }
}

impl SessionObject {
    pub fn new(session: Session, handle: CK_OBJECT_HANDLE) -> SessionObject {
        SessionObject {
            session: session,
            handle: handle,
        }
    }

    pub fn handle(&self) -> CK_OBJECT_HANDLE {
        self.handle
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Reads a single attribute
    pub fn get_attr(&self, attr: Attr) -> Result<Attribute> {
        let mut read = self
            .session
            .get_attributes(self.handle, &Template::probes(&[attr]))?
            .into_vec();
        match read.pop() {
            Some(a) => Ok(a),
            None => Err(Error::protocol(format!("{} was not returned", attr))),
        }
    }

    fn checked_attr(&self, attr: Attr, atype: AttrType) -> Result<Attribute> {
        if attr.attrtype() != atype {
            return Err(Error::unsupported_kind(format!(
                "{} holds {:?} values, not {:?}",
                attr,
                attr.attrtype(),
                atype
            )));
        }
        self.get_attr(attr)
    }

    pub fn get_bool(&self, attr: Attr) -> Result<bool> {
        self.checked_attr(attr, AttrType::BoolType)?.to_bool()
    }

    pub fn get_ulong(&self, attr: Attr) -> Result<CK_ULONG> {
        self.checked_attr(attr, AttrType::NumType)?.to_ulong()
    }

    pub fn get_string(&self, attr: Attr) -> Result<String> {
        self.checked_attr(attr, AttrType::StringType)?.to_string()
    }

    pub fn get_bytes(&self, attr: Attr) -> Result<Vec<u8>> {
        self.checked_attr(attr, AttrType::BytesType)?.to_bytes()
    }

    /// Dates may legitimately be empty, that is returned as None
    pub fn get_date(&self, attr: Attr) -> Result<Option<NaiveDate>> {
        let a = self.checked_attr(attr, AttrType::DateType)?;
        match a.payload() {
            Payload::Empty => Ok(None),
            _ => Ok(Some(a.to_date()?)),
        }
    }

    /// Writes a single attribute
    pub fn set_attr<V: Into<AttrValue>>(&self, attr: Attr, value: V) -> Result<()> {
        let mut t = Template::new();
        t.add(attr, value)?;
        self.session.set_attributes(self.handle, &t)
    }

    /// Reads an arbitrary set of attributes in one round trip
    pub fn get_attributes(&self, template: &Template) -> Result<Template> {
        self.session.get_attributes(self.handle, template)
    }

    pub fn set_attributes(&self, template: &Template) -> Result<()> {
        self.session.set_attributes(self.handle, template)
    }

    /// The object class
    pub fn class(&self) -> Result<CK_OBJECT_CLASS> {
        self.get_ulong(Attr::Class)
    }

    /// C_GetObjectSize
    pub fn size(&self) -> Result<CK_ULONG> {
        self.session.get_object_size(self.handle)
    }

    /// C_CopyObject, `template` holds the attributes to change
    pub fn copy(&self, template: &Template) -> Result<SessionObject> {
        self.session.copy_object(self.handle, template)
    }

    pub fn destroy(self) -> Result<()> {
        self.session.destroy_object(self.handle)
    }
}

/// Attributes common to every object class
pub trait StorageObject {
    fn object(&self) -> &SessionObject;

    attr_accessors! {[]
        token / set_token(bool): Token => get_bool -> bool;
        private / set_private(bool): Private => get_bool -> bool;
        modifiable / set_modifiable(bool): Modifiable => get_bool -> bool;
        copyable / set_copyable(bool): Copyable => get_bool -> bool;
        destroyable / set_destroyable(bool): Destroyable => get_bool -> bool;
        label / set_label(&str): Label => get_string -> String;
        unique_id: UniqueId => get_string -> String;
    }
}
