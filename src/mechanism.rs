// Copyright 2023 Simo Sorce
// See LICENSE.txt file for terms

//! Mechanisms and the encoding of their parameter structures.
//!
//! A [ParamBlock] reproduces a C parameter structure as a flat byte
//! block: CK_ULONG wide little-endian slots in field order, inline arrays
//! copied in place, and a trailing data area. Pointer slots hold the
//! absolute offset of their data in the block, or 0 for a null pointer.
//! Mechanism identifiers are never interpreted here.

use std::fmt::Debug;

use crate::error::{Error, Result};
use crate::misc::{
    get_ulong, put_ulong, set_ulong, ulong_len, usize_len, CK_ULONG_SIZE,
};
use crate::pkcs11::*;

/// An encoded mechanism parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamBlock {
    buf: Vec<u8>,
}

impl ParamBlock {
    /// Carries caller provided bytes verbatim
    pub fn from_raw(buf: Vec<u8>) -> ParamBlock {
        ParamBlock { buf: buf }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Reads the integer slot number `slot`
    pub fn ulong_at(&self, slot: usize) -> Result<CK_ULONG> {
        get_ulong(&self.buf, slot * CK_ULONG_SIZE)
    }

    /// Follows the pointer slot `ptr_slot` and returns `len` bytes of
    /// data, None for a null pointer
    pub fn data_at(&self, ptr_slot: usize, len: usize) -> Result<Option<&[u8]>> {
        let offset = usize_len(self.ulong_at(ptr_slot)?)?;
        if offset == 0 {
            return Ok(None);
        }
        self.inline_at(offset, len).map(Some)
    }

    /// Returns `len` bytes stored at byte `offset`
    pub fn inline_at(&self, offset: usize, len: usize) -> Result<&[u8]> {
        match offset.checked_add(len).and_then(|end| self.buf.get(offset..end)) {
            Some(s) => Ok(s),
            None => Err(Error::invalid_parameter(format!(
                "{} bytes at offset {} exceed the {} bytes parameter",
                len,
                offset,
                self.buf.len()
            ))),
        }
    }
}

/// One field of a parameter structure
enum Field<'a> {
    Ulong(CK_ULONG),
    /// Pointer to data placed in the data area, empty means null
    Ptr(&'a [u8]),
    /// Fixed size array embedded in the structure
    Inline(&'a [u8]),
}

fn field_size(f: &Field) -> usize {
    match f {
        Field::Ulong(_) | Field::Ptr(_) => CK_ULONG_SIZE,
        Field::Inline(b) => b.len(),
    }
}

/// Lays out `fields` in order and appends the pointed-to data
fn layout(fields: &[Field]) -> Result<ParamBlock> {
    let fixed: usize = fields.iter().map(field_size).sum();
    let mut buf = Vec::with_capacity(fixed);
    let mut data = Vec::new();
    let mut pointers = Vec::new();
    for f in fields {
        match f {
            Field::Ulong(v) => put_ulong(&mut buf, *v),
            Field::Ptr(d) => {
                if d.is_empty() {
                    put_ulong(&mut buf, 0);
                } else {
                    pointers.push((buf.len(), fixed + data.len()));
                    put_ulong(&mut buf, 0);
                    data.extend_from_slice(d);
                }
            }
            Field::Inline(d) => buf.extend_from_slice(d),
        }
    }
    for (slot, offset) in pointers {
        set_ulong(&mut buf, slot, ulong_len(offset)?)?;
    }
    buf.extend_from_slice(&data);
    Ok(ParamBlock { buf: buf })
}

/// Typed parameter structures that know their own encoding
pub trait MechanismParams: Debug {
    fn to_block(&self) -> Result<ParamBlock>;
}

/// A mechanism and its optional parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mechanism {
    mech_type: CK_MECHANISM_TYPE,
    params: Option<ParamBlock>,
}

impl Mechanism {
    /// A mechanism without parameters
    pub fn new(mech_type: CK_MECHANISM_TYPE) -> Mechanism {
        Mechanism {
            mech_type: mech_type,
            params: None,
        }
    }

    pub fn with_params<P: MechanismParams>(
        mech_type: CK_MECHANISM_TYPE,
        params: &P,
    ) -> Result<Mechanism> {
        Ok(Mechanism {
            mech_type: mech_type,
            params: Some(params.to_block()?),
        })
    }

    /// Parameter bytes passed through untouched
    pub fn with_raw(mech_type: CK_MECHANISM_TYPE, raw: Vec<u8>) -> Mechanism {
        Mechanism {
            mech_type: mech_type,
            params: Some(ParamBlock::from_raw(raw)),
        }
    }

    /// For mechanisms like CKM_AES_CBC whose parameter is just the IV
    pub fn with_iv(mech_type: CK_MECHANISM_TYPE, iv: &[u8]) -> Mechanism {
        Self::with_raw(mech_type, iv.to_vec())
    }

    pub fn mech_type(&self) -> CK_MECHANISM_TYPE {
        self.mech_type
    }

    pub fn params(&self) -> Option<&ParamBlock> {
        self.params.as_ref()
    }

    /// The parameter bytes, empty when there is no parameter
    pub fn param_bytes(&self) -> &[u8] {
        match &self.params {
            Some(p) => p.as_bytes(),
            None => &[],
        }
    }
}

const GCM_TAG_BITS: [CK_ULONG; 7] = [32, 64, 96, 104, 112, 120, 128];

/// CK_GCM_PARAMS
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GcmParams {
    iv: Vec<u8>,
    aad: Vec<u8>,
    tag_bits: CK_ULONG,
}

impl GcmParams {
    pub const IV_SLOT: usize = 0;
    pub const IV_LEN_SLOT: usize = 1;
    pub const IV_BITS_SLOT: usize = 2;
    pub const AAD_SLOT: usize = 3;
    pub const AAD_LEN_SLOT: usize = 4;
    pub const TAG_BITS_SLOT: usize = 5;

    /// A 16 bytes IV is recommended, any length is accepted
    pub fn new(
        iv: &[u8],
        aad: Option<&[u8]>,
        tag_bits: CK_ULONG,
    ) -> Result<GcmParams> {
        if !GCM_TAG_BITS.contains(&tag_bits) {
            return Err(Error::invalid_tag_length(tag_bits));
        }
        Ok(GcmParams {
            iv: iv.to_vec(),
            aad: aad.unwrap_or_default().to_vec(),
            tag_bits: tag_bits,
        })
    }

    pub fn iv(&self) -> &[u8] {
        &self.iv
    }

    pub fn aad(&self) -> &[u8] {
        &self.aad
    }

    pub fn tag_bits(&self) -> CK_ULONG {
        self.tag_bits
    }
}

impl MechanismParams for GcmParams {
    fn to_block(&self) -> Result<ParamBlock> {
        layout(&[
            Field::Ptr(&self.iv),
            Field::Ulong(ulong_len(self.iv.len())?),
            Field::Ulong(ulong_len(self.iv.len() * 8)?),
            Field::Ptr(&self.aad),
            Field::Ulong(ulong_len(self.aad.len())?),
            Field::Ulong(self.tag_bits),
        ])
    }
}

/// CK_CCM_PARAMS
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CcmParams {
    data_len: CK_ULONG,
    nonce: Vec<u8>,
    aad: Vec<u8>,
    mac_len: CK_ULONG,
}

impl CcmParams {
    pub const DATA_LEN_SLOT: usize = 0;
    pub const NONCE_SLOT: usize = 1;
    pub const NONCE_LEN_SLOT: usize = 2;
    pub const AAD_SLOT: usize = 3;
    pub const AAD_LEN_SLOT: usize = 4;
    pub const MAC_LEN_SLOT: usize = 5;

    pub fn new(
        data_len: CK_ULONG,
        nonce: &[u8],
        aad: Option<&[u8]>,
        mac_len: CK_ULONG,
    ) -> CcmParams {
        CcmParams {
            data_len: data_len,
            nonce: nonce.to_vec(),
            aad: aad.unwrap_or_default().to_vec(),
            mac_len: mac_len,
        }
    }
}

impl MechanismParams for CcmParams {
    fn to_block(&self) -> Result<ParamBlock> {
        layout(&[
            Field::Ulong(self.data_len),
            Field::Ptr(&self.nonce),
            Field::Ulong(ulong_len(self.nonce.len())?),
            Field::Ptr(&self.aad),
            Field::Ulong(ulong_len(self.aad.len())?),
            Field::Ulong(self.mac_len),
        ])
    }
}

/// CK_RSA_PKCS_OAEP_PARAMS, the source is always CKZ_DATA_SPECIFIED
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RsaOaepParams {
    pub hash_alg: CK_MECHANISM_TYPE,
    pub mgf: CK_RSA_PKCS_MGF_TYPE,
    pub source_data: Vec<u8>,
}

impl RsaOaepParams {
    pub const HASH_ALG_SLOT: usize = 0;
    pub const MGF_SLOT: usize = 1;
    pub const SOURCE_SLOT: usize = 2;
    pub const SOURCE_DATA_SLOT: usize = 3;
    pub const SOURCE_DATA_LEN_SLOT: usize = 4;

    pub fn new(
        hash_alg: CK_MECHANISM_TYPE,
        mgf: CK_RSA_PKCS_MGF_TYPE,
        source_data: Option<&[u8]>,
    ) -> RsaOaepParams {
        RsaOaepParams {
            hash_alg: hash_alg,
            mgf: mgf,
            source_data: source_data.unwrap_or_default().to_vec(),
        }
    }
}

impl Default for RsaOaepParams {
    fn default() -> RsaOaepParams {
        RsaOaepParams::new(CKM_SHA_1, CKG_MGF1_SHA1, None)
    }
}

impl MechanismParams for RsaOaepParams {
    fn to_block(&self) -> Result<ParamBlock> {
        layout(&[
            Field::Ulong(self.hash_alg),
            Field::Ulong(self.mgf),
            Field::Ulong(CKZ_DATA_SPECIFIED),
            Field::Ptr(&self.source_data),
            Field::Ulong(ulong_len(self.source_data.len())?),
        ])
    }
}

/// CK_RSA_PKCS_PSS_PARAMS
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RsaPssParams {
    pub hash_alg: CK_MECHANISM_TYPE,
    pub mgf: CK_RSA_PKCS_MGF_TYPE,
    pub salt_len: CK_ULONG,
}

impl RsaPssParams {
    pub fn new(
        hash_alg: CK_MECHANISM_TYPE,
        mgf: CK_RSA_PKCS_MGF_TYPE,
        salt_len: CK_ULONG,
    ) -> RsaPssParams {
        RsaPssParams {
            hash_alg: hash_alg,
            mgf: mgf,
            salt_len: salt_len,
        }
    }
}

impl Default for RsaPssParams {
    fn default() -> RsaPssParams {
        RsaPssParams::new(CKM_SHA_1, CKG_MGF1_SHA1, 20)
    }
}

impl MechanismParams for RsaPssParams {
    fn to_block(&self) -> Result<ParamBlock> {
        layout(&[
            Field::Ulong(self.hash_alg),
            Field::Ulong(self.mgf),
            Field::Ulong(self.salt_len),
        ])
    }
}

/// CK_ECDH1_DERIVE_PARAMS
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ecdh1DeriveParams {
    kdf: CK_EC_KDF_TYPE,
    shared_data: Vec<u8>,
    public_data: Vec<u8>,
}

impl Ecdh1DeriveParams {
    pub const KDF_SLOT: usize = 0;
    pub const SHARED_DATA_LEN_SLOT: usize = 1;
    pub const SHARED_DATA_SLOT: usize = 2;
    pub const PUBLIC_DATA_LEN_SLOT: usize = 3;
    pub const PUBLIC_DATA_SLOT: usize = 4;

    pub fn new(
        kdf: CK_EC_KDF_TYPE,
        shared_data: Option<&[u8]>,
        public_data: Option<&[u8]>,
    ) -> Ecdh1DeriveParams {
        Ecdh1DeriveParams {
            kdf: kdf,
            shared_data: shared_data.unwrap_or_default().to_vec(),
            public_data: public_data.unwrap_or_default().to_vec(),
        }
    }
}

impl MechanismParams for Ecdh1DeriveParams {
    fn to_block(&self) -> Result<ParamBlock> {
        layout(&[
            Field::Ulong(self.kdf),
            Field::Ulong(ulong_len(self.shared_data.len())?),
            Field::Ptr(&self.shared_data),
            Field::Ulong(ulong_len(self.public_data.len())?),
            Field::Ptr(&self.public_data),
        ])
    }
}

/// CK_AES_CBC_ENCRYPT_DATA_PARAMS
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AesCbcEncryptDataParams {
    iv: [u8; 16],
    data: Vec<u8>,
}

impl AesCbcEncryptDataParams {
    pub const IV_OFFSET: usize = 0;
    pub const DATA_SLOT: usize = 16 / CK_ULONG_SIZE;
    pub const LENGTH_SLOT: usize = Self::DATA_SLOT + 1;

    pub fn new(iv: &[u8], data: &[u8]) -> Result<AesCbcEncryptDataParams> {
        let iv: [u8; 16] = match iv.try_into() {
            Ok(a) => a,
            Err(_) => {
                return Err(Error::invalid_parameter(format!(
                    "the IV must be 16 bytes, got {}",
                    iv.len()
                )))
            }
        };
        if data.is_empty() || data.len() % 16 != 0 {
            return Err(Error::invalid_parameter(format!(
                "data length {} is not a non zero multiple of 16",
                data.len()
            )));
        }
        Ok(AesCbcEncryptDataParams {
            iv: iv,
            data: data.to_vec(),
        })
    }
}

impl MechanismParams for AesCbcEncryptDataParams {
    fn to_block(&self) -> Result<ParamBlock> {
        layout(&[
            Field::Inline(&self.iv),
            Field::Ptr(&self.data),
            Field::Ulong(ulong_len(self.data.len())?),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pointers_are_absolute() {
        let p = GcmParams::new(&[1u8; 12], Some(b"aad"), 128).unwrap();
        let b = p.to_block().unwrap();
        assert_eq!(b.len(), 6 * CK_ULONG_SIZE + 12 + 3);
        assert_eq!(
            b.ulong_at(GcmParams::IV_SLOT).unwrap(),
            (6 * CK_ULONG_SIZE) as CK_ULONG
        );
        assert_eq!(b.data_at(GcmParams::AAD_SLOT, 3).unwrap(), Some(&b"aad"[..]));
    }

    #[test]
    fn empty_data_is_null() {
        let b = GcmParams::new(&[0u8; 16], None, 96).unwrap().to_block().unwrap();
        assert_eq!(b.ulong_at(GcmParams::AAD_SLOT).unwrap(), 0);
        assert_eq!(b.data_at(GcmParams::AAD_SLOT, 0).unwrap(), None);
        assert!(b.inline_at(b.len(), 1).is_err());
    }
}
