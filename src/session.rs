// Copyright 2023 Simo Sorce
// See LICENSE.txt file for terms

//! The session layer: every call a client makes goes through a [Session],
//! which encodes the request, forwards it to the [Backend] and decodes
//! the answer.

use std::sync::Arc;

use crate::backend::Backend;
use crate::check_rv;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::mechanism::Mechanism;
use crate::misc::usize_len;
use crate::object::{
    classify, AsObjectHandle, KeyPair, ObjectView, PrivateKey, PublicKey,
    SecretKey, SessionObject,
};
use crate::operation::{output, Cipher, Decipher, Digest, Sign, Verify};
use crate::pkcs11::*;
use crate::template::{parse, Template, TemplateBuffer};

use log::trace;

/// An open session on a token, cheap to clone
#[derive(Debug, Clone)]
pub struct Session {
    backend: Arc<dyn Backend>,
    handle: CK_SESSION_HANDLE,
    config: Arc<Config>,
}

fn ckcall(call: &'static str, rv: CK_RV) -> Result<()> {
    check_rv!(rv, call)
}

/// Templates sent to the module must carry a value for every entry
fn require_values(template: &Template) -> Result<()> {
    for a in template {
        if a.value().is_none() {
            return Err(Error::invalid_parameter(format!(
                "{} has no value",
                a.attr()
            )));
        }
    }
    Ok(())
}

fn trace_template(what: &str, template: &Template) {
    for a in template {
        trace!("{} {}", what, a);
    }
}

impl Session {
    /// Wraps an already open session handle
    pub fn new(backend: Arc<dyn Backend>, handle: CK_SESSION_HANDLE) -> Session {
        Session {
            backend: backend,
            handle: handle,
            config: Arc::new(Config::default()),
        }
    }

    /// Like [Session::new], with `config` checked by [Config::validate]
    pub fn with_config(
        backend: Arc<dyn Backend>,
        handle: CK_SESSION_HANDLE,
        config: Config,
    ) -> Result<Session> {
        config.validate()?;
        Ok(Session {
            backend: backend,
            handle: handle,
            config: Arc::new(config),
        })
    }

    pub fn handle(&self) -> CK_SESSION_HANDLE {
        self.handle
    }

    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Binds an object handle to this session
    pub fn object(&self, handle: CK_OBJECT_HANDLE) -> SessionObject {
        SessionObject::new(self.clone(), handle)
    }

    /// Reads the attributes named in `template` (values in it are
    /// ignored) with a length query followed, when any value is not
    /// empty, by a fetch sized exactly on the reported lengths
    pub fn get_attributes(
        &self,
        object: CK_OBJECT_HANDLE,
        template: &Template,
    ) -> Result<Template> {
        let attrs: Vec<_> = template.iter().map(|a| a.attr()).collect();
        let request = Template::probes(&attrs);
        trace_template("probe", &request);

        let mut probe = TemplateBuffer::build(&request)?;
        ckcall(
            "C_GetAttributeValue",
            self.backend
                .get_attribute_value(self.handle, object, &mut probe),
        )?;

        let lengths = probe.lengths()?;
        for (attr, len) in attrs.iter().zip(lengths.iter()) {
            if *len == CK_UNAVAILABLE_INFORMATION {
                return Err(Error::protocol(format!(
                    "{} reported as unavailable",
                    attr
                )));
            }
            if usize_len(*len)? > self.config.max_attribute_len {
                return Err(Error::protocol(format!(
                    "{} reported a length of {} bytes",
                    attr, len
                )));
            }
        }

        let result = if lengths.iter().all(|l| *l == 0) {
            parse(&probe, &request)?
        } else {
            let mut fetch = TemplateBuffer::allocate(&probe)?;
            ckcall(
                "C_GetAttributeValue",
                self.backend
                    .get_attribute_value(self.handle, object, &mut fetch),
            )?;
            parse(&fetch, &request)?
        };
        trace_template("read", &result);
        Ok(result)
    }

    /// C_SetAttributeValue, every entry must carry a value
    pub fn set_attributes(
        &self,
        object: CK_OBJECT_HANDLE,
        template: &Template,
    ) -> Result<()> {
        require_values(template)?;
        trace_template("write", template);
        let buf = TemplateBuffer::build(template)?;
        ckcall(
            "C_SetAttributeValue",
            self.backend.set_attribute_value(self.handle, object, &buf),
        )
    }

    /// C_CreateObject
    pub fn create_object(&self, template: &Template) -> Result<SessionObject> {
        require_values(template)?;
        trace_template("create", template);
        let buf = TemplateBuffer::build(template)?;
        let mut handle = CK_INVALID_HANDLE;
        ckcall(
            "C_CreateObject",
            self.backend.create_object(self.handle, &buf, &mut handle),
        )?;
        Ok(self.object(handle))
    }

    /// C_CopyObject
    pub fn copy_object(
        &self,
        object: CK_OBJECT_HANDLE,
        template: &Template,
    ) -> Result<SessionObject> {
        require_values(template)?;
        let buf = TemplateBuffer::build(template)?;
        let mut handle = CK_INVALID_HANDLE;
        ckcall(
            "C_CopyObject",
            self.backend
                .copy_object(self.handle, object, &buf, &mut handle),
        )?;
        Ok(self.object(handle))
    }

    /// C_DestroyObject
    pub fn destroy_object(&self, object: CK_OBJECT_HANDLE) -> Result<()> {
        ckcall(
            "C_DestroyObject",
            self.backend.destroy_object(self.handle, object),
        )
    }

    /// C_GetObjectSize
    pub fn get_object_size(&self, object: CK_OBJECT_HANDLE) -> Result<CK_ULONG> {
        let mut size: CK_ULONG = 0;
        ckcall(
            "C_GetObjectSize",
            self.backend.get_object_size(self.handle, object, &mut size),
        )?;
        Ok(size)
    }

    fn find_all(&self) -> Result<Vec<CK_OBJECT_HANDLE>> {
        let batch = self.config.find_batch;
        let mut handles = Vec::new();
        loop {
            let mut chunk = vec![CK_INVALID_HANDLE; batch];
            let mut count: CK_ULONG = 0;
            ckcall(
                "C_FindObjects",
                self.backend.find_objects(self.handle, &mut chunk, &mut count),
            )?;
            let count = usize_len(count)?;
            if count > batch {
                return Err(Error::protocol(format!(
                    "C_FindObjects returned {} handles for a batch of {}",
                    count, batch
                )));
            }
            if count == 0 {
                return Ok(handles);
            }
            handles.extend_from_slice(&chunk[..count]);
        }
    }

    /// Finds all objects matching `template`. The search is always
    /// closed with C_FindObjectsFinal, even on failure.
    pub fn find_objects(&self, template: &Template) -> Result<Vec<SessionObject>> {
        require_values(template)?;
        trace_template("find", template);
        let buf = TemplateBuffer::build(template)?;
        ckcall(
            "C_FindObjectsInit",
            self.backend.find_objects_init(self.handle, &buf),
        )?;
        let found = self.find_all();
        let rv = self.backend.find_objects_final(self.handle);
        let found = found?;
        ckcall("C_FindObjectsFinal", rv)?;
        Ok(found.into_iter().map(|h| self.object(h)).collect())
    }

    /// Finds and classifies all objects matching `template`
    pub fn find(&self, template: &Template) -> Result<Vec<ObjectView>> {
        self.find_objects(template)?
            .into_iter()
            .map(classify)
            .collect()
    }

    /// Returns the typed view of `object`
    pub fn classify(&self, object: CK_OBJECT_HANDLE) -> Result<ObjectView> {
        classify(self.object(object))
    }

    /// C_GenerateKey
    pub fn generate_key(
        &self,
        mechanism: &Mechanism,
        template: &Template,
    ) -> Result<SecretKey> {
        require_values(template)?;
        let buf = TemplateBuffer::build(template)?;
        let mut handle = CK_INVALID_HANDLE;
        ckcall(
            "C_GenerateKey",
            self.backend
                .generate_key(self.handle, mechanism, &buf, &mut handle),
        )?;
        Ok(SecretKey::new(self.object(handle)))
    }

    /// C_GenerateKeyPair
    pub fn generate_key_pair(
        &self,
        mechanism: &Mechanism,
        public_template: &Template,
        private_template: &Template,
    ) -> Result<KeyPair> {
        require_values(public_template)?;
        require_values(private_template)?;
        let pubbuf = TemplateBuffer::build(public_template)?;
        let privbuf = TemplateBuffer::build(private_template)?;
        let mut pubh = CK_INVALID_HANDLE;
        let mut privh = CK_INVALID_HANDLE;
        ckcall(
            "C_GenerateKeyPair",
            self.backend.generate_key_pair(
                self.handle,
                mechanism,
                &pubbuf,
                &privbuf,
                &mut pubh,
                &mut privh,
            ),
        )?;
        Ok(KeyPair {
            public: PublicKey::new(self.object(pubh)),
            private: PrivateKey::new(self.object(privh)),
        })
    }

    /// C_WrapKey, returns the wrapped key bytes
    pub fn wrap_key<W, K>(
        &self,
        mechanism: &Mechanism,
        wrapping_key: &W,
        key: &K,
    ) -> Result<Vec<u8>>
    where
        W: AsObjectHandle + ?Sized,
        K: AsObjectHandle + ?Sized,
    {
        let wrapping = wrapping_key.object_handle();
        let key = key.object_handle();
        output("C_WrapKey", |buf, len| {
            self.backend
                .wrap_key(self.handle, mechanism, wrapping, key, buf, len)
        })
    }

    /// C_UnwrapKey, returns the classified new key
    pub fn unwrap_key<U: AsObjectHandle + ?Sized>(
        &self,
        mechanism: &Mechanism,
        unwrapping_key: &U,
        wrapped: &[u8],
        template: &Template,
    ) -> Result<ObjectView> {
        require_values(template)?;
        let buf = TemplateBuffer::build(template)?;
        let mut handle = CK_INVALID_HANDLE;
        ckcall(
            "C_UnwrapKey",
            self.backend.unwrap_key(
                self.handle,
                mechanism,
                unwrapping_key.object_handle(),
                wrapped,
                &buf,
                &mut handle,
            ),
        )?;
        self.classify(handle)
    }

    /// C_DeriveKey, returns the classified new key
    pub fn derive_key<B: AsObjectHandle + ?Sized>(
        &self,
        mechanism: &Mechanism,
        base_key: &B,
        template: &Template,
    ) -> Result<ObjectView> {
        require_values(template)?;
        let buf = TemplateBuffer::build(template)?;
        let mut handle = CK_INVALID_HANDLE;
        ckcall(
            "C_DeriveKey",
            self.backend.derive_key(
                self.handle,
                mechanism,
                base_key.object_handle(),
                &buf,
                &mut handle,
            ),
        )?;
        self.classify(handle)
    }

    pub fn digest(&self) -> Digest {
        Digest::new(self.clone())
    }

    pub fn sign(&self) -> Sign {
        Sign::new(self.clone())
    }

    pub fn verify(&self) -> Verify {
        Verify::new(self.clone())
    }

    pub fn cipher(&self) -> Cipher {
        Cipher::new(self.clone())
    }

    pub fn decipher(&self) -> Decipher {
        Decipher::new(self.clone())
    }
}

/// Non blocking entry points. Each call runs the blocking implementation
/// on tokio's blocking pool over a clone of the session. Calls on one
/// session are not ordered with respect to each other.
#[cfg(feature = "async")]
impl Session {
    /// Runs `f` with a clone of this session on the blocking pool
    pub async fn spawn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(Session) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let session = self.clone();
        tokio::task::spawn_blocking(move || f(session)).await?
    }

    pub async fn digest_async(
        &self,
        mechanism: Mechanism,
        data: Vec<u8>,
    ) -> Result<Vec<u8>> {
        self.spawn(move |s| s.digest().once(&mechanism, &data)).await
    }

    pub async fn sign_async<K: AsObjectHandle + ?Sized>(
        &self,
        mechanism: Mechanism,
        key: &K,
        data: Vec<u8>,
    ) -> Result<Vec<u8>> {
        let key = key.object_handle();
        self.spawn(move |s| s.sign().once(&mechanism, &key, &data))
            .await
    }

    pub async fn verify_async<K: AsObjectHandle + ?Sized>(
        &self,
        mechanism: Mechanism,
        key: &K,
        data: Vec<u8>,
        signature: Vec<u8>,
    ) -> Result<bool> {
        let key = key.object_handle();
        self.spawn(move |s| {
            s.verify().once(&mechanism, &key, &data, &signature)
        })
        .await
    }

    pub async fn encrypt_async<K: AsObjectHandle + ?Sized>(
        &self,
        mechanism: Mechanism,
        key: &K,
        data: Vec<u8>,
    ) -> Result<Vec<u8>> {
        let key = key.object_handle();
        self.spawn(move |s| s.cipher().once(&mechanism, &key, &data))
            .await
    }

    pub async fn decrypt_async<K: AsObjectHandle + ?Sized>(
        &self,
        mechanism: Mechanism,
        key: &K,
        data: Vec<u8>,
    ) -> Result<Vec<u8>> {
        let key = key.object_handle();
        self.spawn(move |s| s.decipher().once(&mechanism, &key, &data))
            .await
    }

    pub async fn generate_key_async(
        &self,
        mechanism: Mechanism,
        template: Template,
    ) -> Result<SecretKey> {
        self.spawn(move |s| s.generate_key(&mechanism, &template))
            .await
    }

    pub async fn generate_key_pair_async(
        &self,
        mechanism: Mechanism,
        public_template: Template,
        private_template: Template,
    ) -> Result<KeyPair> {
        self.spawn(move |s| {
            s.generate_key_pair(&mechanism, &public_template, &private_template)
        })
        .await
    }
}
