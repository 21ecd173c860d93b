// Copyright 2023 Simo Sorce
// See LICENSE.txt file for terms

//! This module provides the attribute registry and the codec that turns
//! safe Rust values ([AttrValue]) into the byte representation the module
//! expects for each attribute, and back.
//!
//! Every attribute known to this crate is listed once in the static
//! registry, together with its PKCS#11 id, its printable name and the
//! data type it holds as described in the [AttrType] enumeration.

use std::cmp::Ordering;
use std::fmt;

use crate::error::{Error, Result};
use crate::misc::CK_ULONG_SIZE;
use crate::pkcs11::*;

use chrono::{Datelike, NaiveDate};

/// List of attribute types we understand
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum AttrType {
    NumType,
    BoolType,
    StringType,
    BytesType,
    DateType,
}

/// Struct to map a PKCS#11 attribute to a type and a printable name
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct AttrDef {
    pub attr: Attr,
    pub id: CK_ATTRIBUTE_TYPE,
    pub name: &'static str,
    pub atype: AttrType,
}

impl PartialOrd for AttrDef {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AttrDef {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

/// Helper macro to declare the [Attr] enumeration and populate the
/// static attributes map in the same order, so that the enum
/// discriminant is the index in the map
macro_rules! attrmap_elements {
    ($($variant:ident = $id:ident, $name:literal as $attrtype:ident;)*) => {
        /// All the attributes this crate knows how to encode
        #[derive(Debug, Clone, Copy, Eq, Hash, PartialEq)]
        pub enum Attr {
            $($variant,)*
        }

        /// The main attributes map, sorted by id
        static ATTRMAP: &[AttrDef] = &[
            $(AttrDef {
                attr: Attr::$variant,
                id: $id,
                name: $name,
                atype: AttrType::$attrtype,
            },)*
        ];
    };
}

attrmap_elements! {
    Class = CKA_CLASS, "class" as NumType;
    Token = CKA_TOKEN, "token" as BoolType;
    Private = CKA_PRIVATE, "private" as BoolType;
    Label = CKA_LABEL, "label" as StringType;
    UniqueId = CKA_UNIQUE_ID, "uniqueId" as StringType;
    Application = CKA_APPLICATION, "application" as StringType;
    Value = CKA_VALUE, "value" as BytesType;
    ObjectId = CKA_OBJECT_ID, "objectId" as BytesType;
    CertificateType = CKA_CERTIFICATE_TYPE, "certificateType" as NumType;
    Issuer = CKA_ISSUER, "issuer" as BytesType;
    SerialNumber = CKA_SERIAL_NUMBER, "serialNumber" as BytesType;
    AcIssuer = CKA_AC_ISSUER, "acIssuer" as BytesType;
    Owner = CKA_OWNER, "owner" as BytesType;
    AttrTypes = CKA_ATTR_TYPES, "attrTypes" as BytesType;
    Trusted = CKA_TRUSTED, "trusted" as BoolType;
    CertificateCategory = CKA_CERTIFICATE_CATEGORY, "certificateCategory" as NumType;
    JavaMidpSecurityDomain = CKA_JAVA_MIDP_SECURITY_DOMAIN, "javaMidpSecurityDomain" as NumType;
    Url = CKA_URL, "url" as StringType;
    HashOfSubjectPublicKey = CKA_HASH_OF_SUBJECT_PUBLIC_KEY, "hashOfSubjectPublicKey" as BytesType;
    HashOfIssuerPublicKey = CKA_HASH_OF_ISSUER_PUBLIC_KEY, "hashOfIssuerPublicKey" as BytesType;
    NameHashAlgorithm = CKA_NAME_HASH_ALGORITHM, "nameHashAlgorithm" as NumType;
    CheckValue = CKA_CHECK_VALUE, "checkValue" as BytesType;
    KeyType = CKA_KEY_TYPE, "keyType" as NumType;
    Subject = CKA_SUBJECT, "subject" as BytesType;
    Id = CKA_ID, "id" as BytesType;
    Sensitive = CKA_SENSITIVE, "sensitive" as BoolType;
    Encrypt = CKA_ENCRYPT, "encrypt" as BoolType;
    Decrypt = CKA_DECRYPT, "decrypt" as BoolType;
    Wrap = CKA_WRAP, "wrap" as BoolType;
    Unwrap = CKA_UNWRAP, "unwrap" as BoolType;
    Sign = CKA_SIGN, "sign" as BoolType;
    SignRecover = CKA_SIGN_RECOVER, "signRecover" as BoolType;
    Verify = CKA_VERIFY, "verify" as BoolType;
    VerifyRecover = CKA_VERIFY_RECOVER, "verifyRecover" as BoolType;
    Derive = CKA_DERIVE, "derive" as BoolType;
    StartDate = CKA_START_DATE, "startDate" as DateType;
    EndDate = CKA_END_DATE, "endDate" as DateType;
    Modulus = CKA_MODULUS, "modulus" as BytesType;
    ModulusBits = CKA_MODULUS_BITS, "modulusBits" as NumType;
    PublicExponent = CKA_PUBLIC_EXPONENT, "publicExponent" as BytesType;
    PrivateExponent = CKA_PRIVATE_EXPONENT, "privateExponent" as BytesType;
    Prime1 = CKA_PRIME_1, "prime1" as BytesType;
    Prime2 = CKA_PRIME_2, "prime2" as BytesType;
    Exponent1 = CKA_EXPONENT_1, "exponent1" as BytesType;
    Exponent2 = CKA_EXPONENT_2, "exponent2" as BytesType;
    Coefficient = CKA_COEFFICIENT, "coefficient" as BytesType;
    PublicKeyInfo = CKA_PUBLIC_KEY_INFO, "publicKeyInfo" as BytesType;
    Prime = CKA_PRIME, "prime" as BytesType;
    Subprime = CKA_SUBPRIME, "subprime" as BytesType;
    Base = CKA_BASE, "base" as BytesType;
    PrimeBits = CKA_PRIME_BITS, "primeBits" as NumType;
    SubprimeBits = CKA_SUBPRIME_BITS, "subprimeBits" as NumType;
    ValueBits = CKA_VALUE_BITS, "valueBits" as NumType;
    ValueLen = CKA_VALUE_LEN, "valueLen" as NumType;
    Extractable = CKA_EXTRACTABLE, "extractable" as BoolType;
    Local = CKA_LOCAL, "local" as BoolType;
    NeverExtractable = CKA_NEVER_EXTRACTABLE, "neverExtractable" as BoolType;
    AlwaysSensitive = CKA_ALWAYS_SENSITIVE, "alwaysSensitive" as BoolType;
    KeyGenMechanism = CKA_KEY_GEN_MECHANISM, "keyGenMechanism" as NumType;
    Modifiable = CKA_MODIFIABLE, "modifiable" as BoolType;
    Copyable = CKA_COPYABLE, "copyable" as BoolType;
    Destroyable = CKA_DESTROYABLE, "destroyable" as BoolType;
    EcParams = CKA_EC_PARAMS, "ecParams" as BytesType;
    EcPoint = CKA_EC_POINT, "ecPoint" as BytesType;
    AlwaysAuthenticate = CKA_ALWAYS_AUTHENTICATE, "alwaysAuthenticate" as BoolType;
    WrapWithTrusted = CKA_WRAP_WITH_TRUSTED, "wrapWithTrusted" as BoolType;
}

impl Attr {
    /// Returns the registry entry for this attribute
    pub fn def(self) -> &'static AttrDef {
        &ATTRMAP[self as usize]
    }

    /// The PKCS#11 attribute id
    pub fn id(self) -> CK_ATTRIBUTE_TYPE {
        self.def().id
    }

    /// The printable name used by the named template API
    pub fn name(self) -> &'static str {
        self.def().name
    }

    /// The kind of value this attribute holds
    pub fn attrtype(self) -> AttrType {
        self.def().atype
    }

    /// Finds an attribute by its printable name
    pub fn from_name(name: &str) -> Result<Attr> {
        match ATTRMAP.iter().find(|a| a.name == name) {
            Some(a) => Ok(a.attr),
            None => Err(Error::unknown_attribute(name)),
        }
    }

    /// Finds an attribute by id
    pub fn from_id(id: CK_ATTRIBUTE_TYPE) -> Result<Attr> {
        match ATTRMAP.binary_search_by(|a| a.id.cmp(&id)) {
            Ok(i) => Ok(ATTRMAP[i].attr),
            Err(_) => Err(Error::unknown_attribute(&format!("{:#x}", id))),
        }
    }

    /// Iterates over every known attribute in id order
    pub fn all() -> impl Iterator<Item = Attr> {
        ATTRMAP.iter().map(|a| a.attr)
    }
}

impl fmt::Display for Attr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A typed attribute value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    Ulong(CK_ULONG),
    Bool(bool),
    String(String),
    Bytes(Vec<u8>),
    Date(NaiveDate),
}

impl AttrValue {
    /// The kind of this value
    pub fn attrtype(&self) -> AttrType {
        match self {
            AttrValue::Ulong(_) => AttrType::NumType,
            AttrValue::Bool(_) => AttrType::BoolType,
            AttrValue::String(_) => AttrType::StringType,
            AttrValue::Bytes(_) => AttrType::BytesType,
            AttrValue::Date(_) => AttrType::DateType,
        }
    }
}

impl From<CK_ULONG> for AttrValue {
    fn from(val: CK_ULONG) -> AttrValue {
        AttrValue::Ulong(val)
    }
}

impl From<bool> for AttrValue {
    fn from(val: bool) -> AttrValue {
        AttrValue::Bool(val)
    }
}

impl From<&str> for AttrValue {
    fn from(val: &str) -> AttrValue {
        AttrValue::String(val.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(val: String) -> AttrValue {
        AttrValue::String(val)
    }
}

impl From<Vec<u8>> for AttrValue {
    fn from(val: Vec<u8>) -> AttrValue {
        AttrValue::Bytes(val)
    }
}

impl From<&[u8]> for AttrValue {
    fn from(val: &[u8]) -> AttrValue {
        AttrValue::Bytes(val.to_vec())
    }
}

impl From<NaiveDate> for AttrValue {
    fn from(val: NaiveDate) -> AttrValue {
        AttrValue::Date(val)
    }
}

const DATE_LEN: usize = 8;

/// Encodes a value for an attribute of kind `atype`
pub fn encode(atype: AttrType, value: &AttrValue) -> Result<Vec<u8>> {
    match (atype, value) {
        (AttrType::NumType, AttrValue::Ulong(v)) => Ok(v.to_le_bytes().to_vec()),
        (AttrType::BoolType, AttrValue::Bool(v)) => {
            Ok(vec![if *v { CK_TRUE } else { CK_FALSE }])
        }
        (AttrType::StringType, AttrValue::String(v)) => Ok(v.as_bytes().to_vec()),
        (AttrType::BytesType, AttrValue::Bytes(v)) => Ok(v.clone()),
        (AttrType::DateType, AttrValue::Date(d)) => {
            if d.year() < 0 || d.year() > 9999 {
                return Err(Error::value_invalid(format!(
                    "year {} does not fit a YYYYMMDD date",
                    d.year()
                )));
            }
            Ok(format!("{:04}{:02}{:02}", d.year(), d.month(), d.day())
                .into_bytes())
        }
        (t, v) => Err(Error::unsupported_kind(format!(
            "cannot encode a {:?} value as {:?}",
            v.attrtype(),
            t
        ))),
    }
}

fn date_field(digits: &[u8]) -> Result<u32> {
    let mut val = 0u32;
    for d in digits {
        if !d.is_ascii_digit() {
            return Err(Error::value_invalid(format!(
                "non digit character {:#04x} in date",
                d
            )));
        }
        val = val * 10 + u32::from(d - b'0');
    }
    Ok(val)
}

/// Decodes the bytes returned for an attribute of kind `atype`
pub fn decode(atype: AttrType, bytes: &[u8]) -> Result<AttrValue> {
    match atype {
        AttrType::NumType => {
            if bytes.len() != CK_ULONG_SIZE {
                return Err(Error::length_mismatch(format!(
                    "expected {} bytes for an integer, got {}",
                    CK_ULONG_SIZE,
                    bytes.len()
                )));
            }
            Ok(AttrValue::Ulong(CK_ULONG::from_le_bytes(bytes.try_into()?)))
        }
        AttrType::BoolType => {
            if bytes.len() != 1 {
                return Err(Error::length_mismatch(format!(
                    "expected 1 byte for a boolean, got {}",
                    bytes.len()
                )));
            }
            Ok(AttrValue::Bool(bytes[0] == CK_TRUE))
        }
        AttrType::StringType => match std::str::from_utf8(bytes) {
            Ok(s) => Ok(AttrValue::String(s.to_string())),
            Err(e) => Err(Error::value_invalid(format!("{}", e))),
        },
        AttrType::BytesType => Ok(AttrValue::Bytes(bytes.to_vec())),
        AttrType::DateType => {
            if bytes.len() != DATE_LEN {
                return Err(Error::length_mismatch(format!(
                    "expected {} bytes for a date, got {}",
                    DATE_LEN,
                    bytes.len()
                )));
            }
            let year = date_field(&bytes[0..4])?;
            let month = date_field(&bytes[4..6])?;
            let day = date_field(&bytes[6..8])?;
            match NaiveDate::from_ymd_opt(i32::try_from(year)?, month, day) {
                Some(d) => Ok(AttrValue::Date(d)),
                None => Err(Error::value_invalid(format!(
                    "{:04}{:02}{:02} is not a calendar date",
                    year, month, day
                ))),
            }
        }
    }
}

/// What an [Attribute] carries
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// No value, a read request
    Probe,
    /// The module returned zero bytes for a kind that cannot be empty
    Empty,
    Value(AttrValue),
}

/// A Rust native, typed attribute that holds the attribute value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    attr: Attr,
    payload: Payload,
}

impl Attribute {
    /// Creates an attribute carrying a value, the value kind must match
    /// the attribute definition
    pub fn new<V: Into<AttrValue>>(attr: Attr, value: V) -> Result<Attribute> {
        let value = value.into();
        if value.attrtype() != attr.attrtype() {
            return Err(Error::unsupported_kind(format!(
                "{} holds {:?} values, got {:?}",
                attr,
                attr.attrtype(),
                value.attrtype()
            )));
        }
        Ok(Attribute {
            attr: attr,
            payload: Payload::Value(value),
        })
    }

    /// Creates a read request for `attr`
    pub fn probe(attr: Attr) -> Attribute {
        Attribute {
            attr: attr,
            payload: Payload::Probe,
        }
    }

    /// Creates an attribute the module reported as present but empty
    pub fn empty(attr: Attr) -> Attribute {
        Attribute {
            attr: attr,
            payload: Payload::Empty,
        }
    }

    pub fn attr(&self) -> Attr {
        self.attr
    }

    pub fn name(&self) -> &'static str {
        self.attr.name()
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn is_probe(&self) -> bool {
        self.payload == Payload::Probe
    }

    pub fn is_empty(&self) -> bool {
        self.payload == Payload::Empty
    }

    /// Returns the value, if any
    pub fn value(&self) -> Option<&AttrValue> {
        match &self.payload {
            Payload::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the bytes that go in the value area of a template buffer.
    /// Probes and empty attributes have no bytes.
    pub fn encoded(&self) -> Result<Vec<u8>> {
        match &self.payload {
            Payload::Value(v) => encode(self.attr.attrtype(), v),
            _ => Ok(Vec::new()),
        }
    }

    fn checked_value(&self, atype: AttrType) -> Result<&AttrValue> {
        if self.attr.attrtype() != atype {
            return Err(Error::unsupported_kind(format!(
                "{} holds {:?} values, not {:?}",
                self.attr,
                self.attr.attrtype(),
                atype
            )));
        }
        match &self.payload {
            Payload::Value(v) => Ok(v),
            Payload::Probe => Err(Error::value_invalid(format!(
                "{} has not been read",
                self.attr
            ))),
            Payload::Empty => Err(Error::value_invalid(format!(
                "{} has an empty value",
                self.attr
            ))),
        }
    }

    /// Returns the value as a boolean
    pub fn to_bool(&self) -> Result<bool> {
        match self.checked_value(AttrType::BoolType)? {
            AttrValue::Bool(b) => Ok(*b),
            v => Err(Error::unsupported_kind(format!("{:?}", v))),
        }
    }

    /// Returns the value as a CK_ULONG
    pub fn to_ulong(&self) -> Result<CK_ULONG> {
        match self.checked_value(AttrType::NumType)? {
            AttrValue::Ulong(u) => Ok(*u),
            v => Err(Error::unsupported_kind(format!("{:?}", v))),
        }
    }

    /// Returns the value as a String
    pub fn to_string(&self) -> Result<String> {
        match self.checked_value(AttrType::StringType)? {
            AttrValue::String(s) => Ok(s.clone()),
            v => Err(Error::unsupported_kind(format!("{:?}", v))),
        }
    }

    /// Returns a copy of the byte value
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        match self.checked_value(AttrType::BytesType)? {
            AttrValue::Bytes(b) => Ok(b.clone()),
            v => Err(Error::unsupported_kind(format!("{:?}", v))),
        }
    }

    /// Returns the value as a calendar date
    pub fn to_date(&self) -> Result<NaiveDate> {
        match self.checked_value(AttrType::DateType)? {
            AttrValue::Date(d) => Ok(*d),
            v => Err(Error::unsupported_kind(format!("{:?}", v))),
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: ", self.attr)?;
        match &self.payload {
            Payload::Probe => write!(f, "<probe>"),
            Payload::Empty => write!(f, "<empty>"),
            Payload::Value(AttrValue::Ulong(u)) => write!(f, "{:#x}", u),
            Payload::Value(AttrValue::Bool(b)) => write!(f, "{}", b),
            Payload::Value(AttrValue::String(s)) => write!(f, "{:?}", s),
            Payload::Value(AttrValue::Bytes(b)) => {
                write!(f, "{}", hex::encode(b))
            }
            Payload::Value(AttrValue::Date(d)) => {
                write!(f, "{}", d.format("%Y-%m-%d"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_order_of_attrmap() {
        let mut copy = ATTRMAP.to_vec();
        copy.sort();
        assert_eq!(ATTRMAP, copy.as_slice());
    }

    #[test]
    fn discriminant_indexes_attrmap() {
        for (i, a) in ATTRMAP.iter().enumerate() {
            assert_eq!(a.attr as usize, i);
            assert_eq!(Attr::from_id(a.id).unwrap(), a.attr);
            assert_eq!(Attr::from_name(a.name).unwrap(), a.attr);
        }
    }

    #[test]
    fn display() {
        let a = Attribute::new(Attr::Id, vec![0xde, 0xad]).unwrap();
        assert_eq!(format!("{}", a), "id: dead");
        let a = Attribute::new(Attr::Label, "test").unwrap();
        assert_eq!(format!("{}", a), "label: \"test\"");
        assert_eq!(format!("{}", Attribute::probe(Attr::Token)), "token: <probe>");
    }
}
