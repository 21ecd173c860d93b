// Copyright 2024 Simo Sorce
// See LICENSE.txt file for terms

//! Templates and their wire form.
//!
//! A [Template] is an ordered list of [Attribute]s. A [TemplateBuffer] is
//! the flat representation handed to a [Backend](crate::backend::Backend):
//! one fixed size header per attribute, each made of three little-endian
//! CK_ULONG values `{type, length, offset}`, followed by a contiguous value
//! area. Offsets are absolute from the start of the buffer, an offset of 0
//! stands for a null pointer (no value area at all, a length query).

use crate::attribute::{decode, Attr, AttrType, AttrValue, Attribute};
use crate::error::{Error, Result};
use crate::misc::{
    get_ulong, put_ulong, set_ulong, ulong_len, usize_len, CK_ULONG_SIZE,
};
use crate::pkcs11::*;

use bitflags::bitflags;

bitflags! {
    /// Key capabilities, expanded to the matching boolean attributes by
    /// [Template::add_usage]
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct KeyUsage: u32 {
        const ENCRYPT = 0x0000_0001;
        const DECRYPT = 0x0000_0002;
        const SIGN    = 0x0000_0004;
        const VERIFY  = 0x0000_0008;
        const WRAP    = 0x0000_0010;
        const UNWRAP  = 0x0000_0020;
        const DERIVE  = 0x0000_0040;
    }
}

const USAGE_ATTRS: [(KeyUsage, Attr); 7] = [
    (KeyUsage::ENCRYPT, Attr::Encrypt),
    (KeyUsage::DECRYPT, Attr::Decrypt),
    (KeyUsage::SIGN, Attr::Sign),
    (KeyUsage::VERIFY, Attr::Verify),
    (KeyUsage::WRAP, Attr::Wrap),
    (KeyUsage::UNWRAP, Attr::Unwrap),
    (KeyUsage::DERIVE, Attr::Derive),
];

/// An ordered list of attributes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Template {
    attrs: Vec<Attribute>,
}

impl Template {
    pub fn new() -> Template {
        Template { attrs: Vec::new() }
    }

    /// A template of read requests for the given attributes
    pub fn probes(attrs: &[Attr]) -> Template {
        Template {
            attrs: attrs.iter().map(|a| Attribute::probe(*a)).collect(),
        }
    }

    pub fn push(&mut self, attr: Attribute) {
        self.attrs.push(attr);
    }

    /// Appends `attr` with a value
    pub fn add<V: Into<AttrValue>>(&mut self, attr: Attr, value: V) -> Result<()> {
        self.attrs.push(Attribute::new(attr, value)?);
        Ok(())
    }

    /// Appends an attribute by name
    pub fn add_named<V: Into<AttrValue>>(
        &mut self,
        name: &str,
        value: V,
    ) -> Result<()> {
        self.add(Attr::from_name(name)?, value)
    }

    /// Appends a read request
    pub fn probe(&mut self, attr: Attr) {
        self.attrs.push(Attribute::probe(attr));
    }

    pub fn probe_named(&mut self, name: &str) -> Result<()> {
        self.probe(Attr::from_name(name)?);
        Ok(())
    }

    /// Appends a `true` boolean for every capability in `usage`
    pub fn add_usage(&mut self, usage: KeyUsage) -> Result<()> {
        for (flag, attr) in USAGE_ATTRS {
            if usage.contains(flag) {
                self.add(attr, true)?;
            }
        }
        Ok(())
    }

    /// The first attribute of type `attr`, if any
    pub fn get(&self, attr: Attr) -> Option<&Attribute> {
        self.attrs.iter().find(|a| a.attr() == attr)
    }

    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Attribute> {
        self.attrs.iter()
    }

    /// The attribute names, in order
    pub fn names(&self) -> Vec<&'static str> {
        self.attrs.iter().map(|a| a.name()).collect()
    }

    pub fn as_slice(&self) -> &[Attribute] {
        &self.attrs
    }

    pub fn into_vec(self) -> Vec<Attribute> {
        self.attrs
    }
}

impl From<Vec<Attribute>> for Template {
    fn from(attrs: Vec<Attribute>) -> Template {
        Template { attrs: attrs }
    }
}

impl<'a> IntoIterator for &'a Template {
    type Item = &'a Attribute;
    type IntoIter = std::slice::Iter<'a, Attribute>;

    fn into_iter(self) -> Self::IntoIter {
        self.attrs.iter()
    }
}

/// Size of one `{type, length, offset}` header
pub const HEADER_SIZE: usize = 3 * CK_ULONG_SIZE;

/// The flat form of a template exchanged with the module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateBuffer {
    count: usize,
    buf: Vec<u8>,
}

impl TemplateBuffer {
    /// Encodes `template` in order; probes get a zero length and a null
    /// offset
    pub fn build(template: &Template) -> Result<TemplateBuffer> {
        let mut values = Vec::<Vec<u8>>::with_capacity(template.len());
        for attr in template {
            values.push(attr.encoded()?);
        }
        let mut headers = Vec::with_capacity(template.len() * HEADER_SIZE);
        let mut offset = template.len() * HEADER_SIZE;
        for (attr, value) in template.iter().zip(values.iter()) {
            put_ulong(&mut headers, attr.attr().id());
            put_ulong(&mut headers, ulong_len(value.len())?);
            if attr.is_probe() {
                put_ulong(&mut headers, 0);
            } else {
                put_ulong(&mut headers, ulong_len(offset)?);
            }
            offset += value.len();
        }
        let mut buf = headers;
        buf.reserve(offset - buf.len());
        for value in values {
            buf.extend_from_slice(&value);
        }
        Ok(TemplateBuffer {
            count: template.len(),
            buf: buf,
        })
    }

    /// Builds the fetch request that follows a length query: same types,
    /// and a value area of exactly the reported length for each entry
    pub fn allocate(probed: &TemplateBuffer) -> Result<TemplateBuffer> {
        let count = probed.count();
        let mut buf = Vec::with_capacity(count * HEADER_SIZE);
        let mut offset = count * HEADER_SIZE;
        for i in 0..count {
            let (atype, len, _) = probed.header(i)?;
            if len == CK_UNAVAILABLE_INFORMATION {
                return Err(Error::protocol(format!(
                    "no length available for attribute {:#x}",
                    atype
                )));
            }
            put_ulong(&mut buf, atype);
            put_ulong(&mut buf, len);
            if len == 0 {
                put_ulong(&mut buf, 0);
            } else {
                put_ulong(&mut buf, ulong_len(offset)?);
            }
            offset = match offset.checked_add(usize_len(len)?) {
                Some(o) => o,
                None => {
                    return Err(Error::protocol(format!(
                        "length {:#x} of attribute {:#x} overflows",
                        len, atype
                    )))
                }
            };
        }
        buf.resize(offset, 0);
        Ok(TemplateBuffer {
            count: count,
            buf: buf,
        })
    }

    /// Wraps raw bytes received from elsewhere, nothing is validated
    /// until the headers are read
    pub fn from_raw(count: usize, buf: Vec<u8>) -> TemplateBuffer {
        TemplateBuffer {
            count: count,
            buf: buf,
        }
    }

    /// Number of headers
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Returns `(type, length, offset)` for entry `idx`
    pub fn header(&self, idx: usize) -> Result<(CK_ULONG, CK_ULONG, CK_ULONG)> {
        if idx >= self.count {
            return Err(Error::protocol(format!(
                "header {} requested from a {} entries template",
                idx, self.count
            )));
        }
        let base = idx * HEADER_SIZE;
        Ok((
            get_ulong(&self.buf, base)?,
            get_ulong(&self.buf, base + CK_ULONG_SIZE)?,
            get_ulong(&self.buf, base + 2 * CK_ULONG_SIZE)?,
        ))
    }

    /// Stores the length reported for entry `idx`
    pub fn set_len(&mut self, idx: usize, len: CK_ULONG) -> Result<()> {
        self.header(idx)?;
        set_ulong(&mut self.buf, idx * HEADER_SIZE + CK_ULONG_SIZE, len)
    }

    fn value_range(&self, idx: usize) -> Result<Option<std::ops::Range<usize>>> {
        let (atype, len, offset) = self.header(idx)?;
        if offset == 0 {
            return Ok(None);
        }
        let start = usize_len(offset)?;
        let end = match usize_len(len).ok().and_then(|l| start.checked_add(l)) {
            Some(e) => e,
            None => {
                return Err(Error::protocol(format!(
                    "length {:#x} of attribute {:#x} overflows",
                    len, atype
                )))
            }
        };
        if start < self.count * HEADER_SIZE || end > self.buf.len() {
            return Err(Error::protocol(format!(
                "value of attribute {:#x} at {}..{} is outside the buffer",
                atype, start, end
            )));
        }
        Ok(Some(start..end))
    }

    /// The value area of entry `idx`, sized by its current length.
    /// Entries with a null offset have no value area.
    pub fn value(&self, idx: usize) -> Result<Option<&[u8]>> {
        Ok(self.value_range(idx)?.map(|r| &self.buf[r]))
    }

    /// Writable value area of entry `idx`
    pub fn value_mut(&mut self, idx: usize) -> Result<Option<&mut [u8]>> {
        match self.value_range(idx)? {
            Some(r) => Ok(Some(&mut self.buf[r])),
            None => Ok(None),
        }
    }

    /// All reported lengths, in order
    pub fn lengths(&self) -> Result<Vec<CK_ULONG>> {
        (0..self.count).map(|i| self.header(i).map(|h| h.1)).collect()
    }
}

/// Decodes a module response against the request it answers
pub fn parse(buffer: &TemplateBuffer, request: &Template) -> Result<Template> {
    if buffer.count() != request.len() {
        return Err(Error::protocol(format!(
            "response has {} entries, {} requested",
            buffer.count(),
            request.len()
        )));
    }
    let mut out = Template::new();
    for (idx, req) in request.iter().enumerate() {
        let attr = req.attr();
        let (atype, len, _) = buffer.header(idx)?;
        if atype != attr.id() {
            return Err(Error::protocol(format!(
                "entry {} is attribute {:#x}, {} was requested",
                idx, atype, attr
            )));
        }
        if len == CK_UNAVAILABLE_INFORMATION {
            return Err(Error::protocol(format!(
                "{} reported as unavailable",
                attr
            )));
        }
        if len == 0 {
            out.push(match attr.attrtype() {
                AttrType::StringType => Attribute::new(attr, "")?,
                AttrType::BytesType => Attribute::new(attr, Vec::new())?,
                _ => Attribute::empty(attr),
            });
            continue;
        }
        let bytes = match buffer.value(idx)? {
            Some(b) => b,
            None => {
                return Err(Error::protocol(format!(
                    "{} has a length but no value",
                    attr
                )))
            }
        };
        let value = decode(attr.attrtype(), bytes)?;
        out.push(Attribute::new(attr, value)?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probes_have_null_offsets() {
        let t = Template::probes(&[Attr::Label, Attr::Value]);
        let b = TemplateBuffer::build(&t).unwrap();
        assert_eq!(b.as_bytes().len(), 2 * HEADER_SIZE);
        assert_eq!(b.header(0).unwrap(), (CKA_LABEL, 0, 0));
        assert_eq!(b.header(1).unwrap(), (CKA_VALUE, 0, 0));
        assert_eq!(b.value(1).unwrap(), None);
        assert!(b.header(2).is_err());
    }

    #[test]
    fn allocate_exact_lengths() {
        let t = Template::probes(&[Attr::Label, Attr::Class, Attr::Id]);
        let mut b = TemplateBuffer::build(&t).unwrap();
        b.set_len(0, 5).unwrap();
        b.set_len(1, CK_ULONG_SIZE as CK_ULONG).unwrap();
        b.set_len(2, 0).unwrap();
        let a = TemplateBuffer::allocate(&b).unwrap();
        assert_eq!(a.lengths().unwrap(), vec![5, CK_ULONG_SIZE as CK_ULONG, 0]);
        assert_eq!(a.as_bytes().len(), 3 * HEADER_SIZE + 5 + CK_ULONG_SIZE);
        assert_eq!(a.value(0).unwrap().unwrap().len(), 5);
        assert_eq!(a.value(2).unwrap(), None);
    }

    #[test]
    fn usage_flags() {
        let mut t = Template::new();
        t.add_usage(KeyUsage::SIGN | KeyUsage::VERIFY).unwrap();
        assert_eq!(t.names(), vec!["sign", "verify"]);
        assert!(t.get(Attr::Sign).unwrap().to_bool().unwrap());
    }
}
