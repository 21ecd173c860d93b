// Copyright 2024 Simo Sorce
// See LICENSE.txt file for terms

//! The native calling surface consumed by this crate.
//!
//! An implementation forwards each call to a loaded PKCS #11 module (or
//! emulates one). Templates and mechanism parameters arrive already
//! encoded, see [TemplateBuffer] and [Mechanism]. Calls that produce
//! output follow the two-call convention: with `None` as output only the
//! required length is stored in `len`, with a buffer the output is written
//! and `len` is set to the number of bytes produced.

use std::fmt::Debug;

use crate::mechanism::Mechanism;
use crate::pkcs11::*;
use crate::template::TemplateBuffer;

pub trait Backend: Debug + Send + Sync {
    /// C_GetAttributeValue. Entries with a null offset receive their
    /// length, others receive the value, unavailable entries get
    /// CK_UNAVAILABLE_INFORMATION as length.
    fn get_attribute_value(
        &self,
        _session: CK_SESSION_HANDLE,
        _object: CK_OBJECT_HANDLE,
        _template: &mut TemplateBuffer,
    ) -> CK_RV {
        CKR_FUNCTION_NOT_SUPPORTED
    }
    fn set_attribute_value(
        &self,
        _session: CK_SESSION_HANDLE,
        _object: CK_OBJECT_HANDLE,
        _template: &TemplateBuffer,
    ) -> CK_RV {
        CKR_FUNCTION_NOT_SUPPORTED
    }

    fn create_object(
        &self,
        _session: CK_SESSION_HANDLE,
        _template: &TemplateBuffer,
        _object: &mut CK_OBJECT_HANDLE,
    ) -> CK_RV {
        CKR_FUNCTION_NOT_SUPPORTED
    }
    fn copy_object(
        &self,
        _session: CK_SESSION_HANDLE,
        _object: CK_OBJECT_HANDLE,
        _template: &TemplateBuffer,
        _new_object: &mut CK_OBJECT_HANDLE,
    ) -> CK_RV {
        CKR_FUNCTION_NOT_SUPPORTED
    }
    fn destroy_object(
        &self,
        _session: CK_SESSION_HANDLE,
        _object: CK_OBJECT_HANDLE,
    ) -> CK_RV {
        CKR_FUNCTION_NOT_SUPPORTED
    }
    fn get_object_size(
        &self,
        _session: CK_SESSION_HANDLE,
        _object: CK_OBJECT_HANDLE,
        _size: &mut CK_ULONG,
    ) -> CK_RV {
        CKR_FUNCTION_NOT_SUPPORTED
    }

    fn find_objects_init(
        &self,
        _session: CK_SESSION_HANDLE,
        _template: &TemplateBuffer,
    ) -> CK_RV {
        CKR_FUNCTION_NOT_SUPPORTED
    }
    /// Fills `objects` from the front, `count` is set to the number of
    /// handles stored
    fn find_objects(
        &self,
        _session: CK_SESSION_HANDLE,
        _objects: &mut [CK_OBJECT_HANDLE],
        _count: &mut CK_ULONG,
    ) -> CK_RV {
        CKR_FUNCTION_NOT_SUPPORTED
    }
    fn find_objects_final(&self, _session: CK_SESSION_HANDLE) -> CK_RV {
        CKR_FUNCTION_NOT_SUPPORTED
    }

    fn digest_init(
        &self,
        _session: CK_SESSION_HANDLE,
        _mechanism: &Mechanism,
    ) -> CK_RV {
        CKR_FUNCTION_NOT_SUPPORTED
    }
    fn digest_update(&self, _session: CK_SESSION_HANDLE, _data: &[u8]) -> CK_RV {
        CKR_FUNCTION_NOT_SUPPORTED
    }
    fn digest_final(
        &self,
        _session: CK_SESSION_HANDLE,
        _digest: Option<&mut [u8]>,
        _len: &mut CK_ULONG,
    ) -> CK_RV {
        CKR_FUNCTION_NOT_SUPPORTED
    }
    fn digest(
        &self,
        _session: CK_SESSION_HANDLE,
        _data: &[u8],
        _digest: Option<&mut [u8]>,
        _len: &mut CK_ULONG,
    ) -> CK_RV {
        CKR_FUNCTION_NOT_SUPPORTED
    }

    fn sign_init(
        &self,
        _session: CK_SESSION_HANDLE,
        _mechanism: &Mechanism,
        _key: CK_OBJECT_HANDLE,
    ) -> CK_RV {
        CKR_FUNCTION_NOT_SUPPORTED
    }
    fn sign_update(&self, _session: CK_SESSION_HANDLE, _data: &[u8]) -> CK_RV {
        CKR_FUNCTION_NOT_SUPPORTED
    }
    fn sign_final(
        &self,
        _session: CK_SESSION_HANDLE,
        _signature: Option<&mut [u8]>,
        _len: &mut CK_ULONG,
    ) -> CK_RV {
        CKR_FUNCTION_NOT_SUPPORTED
    }
    fn sign(
        &self,
        _session: CK_SESSION_HANDLE,
        _data: &[u8],
        _signature: Option<&mut [u8]>,
        _len: &mut CK_ULONG,
    ) -> CK_RV {
        CKR_FUNCTION_NOT_SUPPORTED
    }

    fn verify_init(
        &self,
        _session: CK_SESSION_HANDLE,
        _mechanism: &Mechanism,
        _key: CK_OBJECT_HANDLE,
    ) -> CK_RV {
        CKR_FUNCTION_NOT_SUPPORTED
    }
    fn verify_update(&self, _session: CK_SESSION_HANDLE, _data: &[u8]) -> CK_RV {
        CKR_FUNCTION_NOT_SUPPORTED
    }
    fn verify_final(
        &self,
        _session: CK_SESSION_HANDLE,
        _signature: &[u8],
    ) -> CK_RV {
        CKR_FUNCTION_NOT_SUPPORTED
    }
    fn verify(
        &self,
        _session: CK_SESSION_HANDLE,
        _data: &[u8],
        _signature: &[u8],
    ) -> CK_RV {
        CKR_FUNCTION_NOT_SUPPORTED
    }

    fn encrypt_init(
        &self,
        _session: CK_SESSION_HANDLE,
        _mechanism: &Mechanism,
        _key: CK_OBJECT_HANDLE,
    ) -> CK_RV {
        CKR_FUNCTION_NOT_SUPPORTED
    }
    fn encrypt_update(
        &self,
        _session: CK_SESSION_HANDLE,
        _data: &[u8],
        _encrypted: Option<&mut [u8]>,
        _len: &mut CK_ULONG,
    ) -> CK_RV {
        CKR_FUNCTION_NOT_SUPPORTED
    }
    fn encrypt_final(
        &self,
        _session: CK_SESSION_HANDLE,
        _encrypted: Option<&mut [u8]>,
        _len: &mut CK_ULONG,
    ) -> CK_RV {
        CKR_FUNCTION_NOT_SUPPORTED
    }
    fn encrypt(
        &self,
        _session: CK_SESSION_HANDLE,
        _data: &[u8],
        _encrypted: Option<&mut [u8]>,
        _len: &mut CK_ULONG,
    ) -> CK_RV {
        CKR_FUNCTION_NOT_SUPPORTED
    }

    fn decrypt_init(
        &self,
        _session: CK_SESSION_HANDLE,
        _mechanism: &Mechanism,
        _key: CK_OBJECT_HANDLE,
    ) -> CK_RV {
        CKR_FUNCTION_NOT_SUPPORTED
    }
    fn decrypt_update(
        &self,
        _session: CK_SESSION_HANDLE,
        _encrypted: &[u8],
        _data: Option<&mut [u8]>,
        _len: &mut CK_ULONG,
    ) -> CK_RV {
        CKR_FUNCTION_NOT_SUPPORTED
    }
    fn decrypt_final(
        &self,
        _session: CK_SESSION_HANDLE,
        _data: Option<&mut [u8]>,
        _len: &mut CK_ULONG,
    ) -> CK_RV {
        CKR_FUNCTION_NOT_SUPPORTED
    }
    fn decrypt(
        &self,
        _session: CK_SESSION_HANDLE,
        _encrypted: &[u8],
        _data: Option<&mut [u8]>,
        _len: &mut CK_ULONG,
    ) -> CK_RV {
        CKR_FUNCTION_NOT_SUPPORTED
    }

    fn generate_key(
        &self,
        _session: CK_SESSION_HANDLE,
        _mechanism: &Mechanism,
        _template: &TemplateBuffer,
        _key: &mut CK_OBJECT_HANDLE,
    ) -> CK_RV {
        CKR_FUNCTION_NOT_SUPPORTED
    }
    fn generate_key_pair(
        &self,
        _session: CK_SESSION_HANDLE,
        _mechanism: &Mechanism,
        _public_template: &TemplateBuffer,
        _private_template: &TemplateBuffer,
        _public_key: &mut CK_OBJECT_HANDLE,
        _private_key: &mut CK_OBJECT_HANDLE,
    ) -> CK_RV {
        CKR_FUNCTION_NOT_SUPPORTED
    }
    fn wrap_key(
        &self,
        _session: CK_SESSION_HANDLE,
        _mechanism: &Mechanism,
        _wrapping_key: CK_OBJECT_HANDLE,
        _key: CK_OBJECT_HANDLE,
        _wrapped: Option<&mut [u8]>,
        _len: &mut CK_ULONG,
    ) -> CK_RV {
        CKR_FUNCTION_NOT_SUPPORTED
    }
    fn unwrap_key(
        &self,
        _session: CK_SESSION_HANDLE,
        _mechanism: &Mechanism,
        _unwrapping_key: CK_OBJECT_HANDLE,
        _wrapped: &[u8],
        _template: &TemplateBuffer,
        _key: &mut CK_OBJECT_HANDLE,
    ) -> CK_RV {
        CKR_FUNCTION_NOT_SUPPORTED
    }
    fn derive_key(
        &self,
        _session: CK_SESSION_HANDLE,
        _mechanism: &Mechanism,
        _base_key: CK_OBJECT_HANDLE,
        _template: &TemplateBuffer,
        _key: &mut CK_OBJECT_HANDLE,
    ) -> CK_RV {
        CKR_FUNCTION_NOT_SUPPORTED
    }
}
