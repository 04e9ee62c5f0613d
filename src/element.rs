//! Fixed-size binary fields.
//!
//! An [`Element`] owns one typed value and a byte length that is fixed when the
//! element is built. It writes and reads exactly that many bytes at a given
//! buffer offset; everything multi-byte is big-endian.

use crate::error::{Error, Result};
use crate::util::span;
use byteorder::{BigEndian, ByteOrder};
use serde::{Deserialize, Serialize};

/// The closed set of field encodings a schema can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    U8,
    U16,
    U24,
    U32,
    /// Array of 16-bit values; length comes from the default.
    U16Array,
    /// Array of 32-bit values; length comes from the default.
    U32Array,
    /// Fixed-length text; length comes from the default string.
    Text,
    /// Zero-filled run; the default is the byte count.
    Padding,
    /// Uninterpreted bytes, kept verbatim.
    Raw,
}

/// A field value as seen by callers and by the schema catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    Uint(u32),
    Array(Vec<u32>),
    /// One char per byte (U+0000..=U+00FF), so non-printable codes survive.
    Text(String),
    #[serde(with = "hex_bytes")]
    Bytes(Vec<u8>),
}

impl Value {
    pub fn as_uint(&self) -> Option<u32> {
        match self {
            Value::Uint(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Uint(v)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<Vec<u32>> for Value {
    fn from(v: Vec<u32>) -> Self {
        Value::Array(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(d)?;
        hex::decode(s).map_err(serde::de::Error::custom)
    }
}

/// Map each byte to the char with the same code point.
pub fn bytes_to_text(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

fn text_to_bytes(kind: ElementKind, s: &str) -> Result<Vec<u8>> {
    s.chars()
        .map(|c| {
            u8::try_from(c as u32)
                .map_err(|_| invalid(kind, format!("char {c:?} is not a single byte")))
        })
        .collect()
}

fn invalid(kind: ElementKind, reason: impl Into<String>) -> Error {
    Error::InvalidValue {
        field: format!("{kind:?}"),
        reason: reason.into(),
    }
}

fn narrow<T: TryFrom<u32>>(kind: ElementKind, v: u32) -> Result<T> {
    T::try_from(v).map_err(|_| invalid(kind, format!("{v:#x} does not fit")))
}

/// `(name, kind, default)` triple describing one field of a box layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementSpec {
    pub name: String,
    pub kind: ElementKind,
    pub default: Value,
}

impl ElementSpec {
    pub fn new(name: &str, kind: ElementKind, default: impl Into<Value>) -> Self {
        Self {
            name: name.to_string(),
            kind,
            default: default.into(),
        }
    }

    /// Instantiate the element holding this spec's default.
    pub fn build(&self) -> Result<Element> {
        Element::new(self.kind, &self.default).map_err(|e| e.for_field(&self.name))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Element {
    U8(u8),
    U16(u16),
    U24(u32),
    U32(u32),
    U16Array(Vec<u16>),
    U32Array(Vec<u32>),
    Text(Vec<u8>),
    Padding(usize),
    Raw(Vec<u8>),
}

impl Element {
    pub fn new(kind: ElementKind, value: &Value) -> Result<Self> {
        let el = match (kind, value) {
            (ElementKind::U8, Value::Uint(v)) => Element::U8(narrow(kind, *v)?),
            (ElementKind::U16, Value::Uint(v)) => Element::U16(narrow(kind, *v)?),
            (ElementKind::U24, Value::Uint(v)) => {
                if *v > 0x00ff_ffff {
                    return Err(invalid(kind, format!("{v:#x} does not fit")));
                }
                Element::U24(*v)
            }
            (ElementKind::U32, Value::Uint(v)) => Element::U32(*v),
            (ElementKind::U16Array, Value::Array(vs)) => Element::U16Array(
                vs.iter()
                    .map(|&v| narrow(kind, v))
                    .collect::<Result<_>>()?,
            ),
            (ElementKind::U32Array, Value::Array(vs)) => Element::U32Array(vs.clone()),
            (ElementKind::Text, Value::Text(s)) => Element::Text(text_to_bytes(kind, s)?),
            (ElementKind::Text, Value::Bytes(b)) => Element::Text(b.clone()),
            (ElementKind::Padding, Value::Uint(n)) => Element::Padding(*n as usize),
            (ElementKind::Raw, Value::Bytes(b)) => Element::Raw(b.clone()),
            (ElementKind::Raw, Value::Uint(n)) => Element::Raw(vec![0; *n as usize]),
            (kind, value) => {
                return Err(invalid(kind, format!("cannot hold {value:?}")));
            }
        };
        Ok(el)
    }

    pub fn kind(&self) -> ElementKind {
        match self {
            Element::U8(_) => ElementKind::U8,
            Element::U16(_) => ElementKind::U16,
            Element::U24(_) => ElementKind::U24,
            Element::U32(_) => ElementKind::U32,
            Element::U16Array(_) => ElementKind::U16Array,
            Element::U32Array(_) => ElementKind::U32Array,
            Element::Text(_) => ElementKind::Text,
            Element::Padding(_) => ElementKind::Padding,
            Element::Raw(_) => ElementKind::Raw,
        }
    }

    pub fn byte_len(&self) -> usize {
        match self {
            Element::U8(_) => 1,
            Element::U16(_) => 2,
            Element::U24(_) => 3,
            Element::U32(_) => 4,
            Element::U16Array(vs) => vs.len() * 2,
            Element::U32Array(vs) => vs.len() * 4,
            Element::Text(b) | Element::Raw(b) => b.len(),
            Element::Padding(n) => *n,
        }
    }

    pub fn value(&self) -> Value {
        match self {
            Element::U8(v) => Value::Uint(u32::from(*v)),
            Element::U16(v) => Value::Uint(u32::from(*v)),
            Element::U24(v) | Element::U32(v) => Value::Uint(*v),
            Element::U16Array(vs) => Value::Array(vs.iter().map(|&v| u32::from(v)).collect()),
            Element::U32Array(vs) => Value::Array(vs.clone()),
            Element::Text(b) => Value::Text(bytes_to_text(b)),
            Element::Padding(n) => Value::Uint(*n as u32),
            Element::Raw(b) => Value::Bytes(b.clone()),
        }
    }

    /// Replace the value. The byte length may not change.
    pub fn set(&mut self, value: &Value) -> Result<()> {
        let next = Element::new(self.kind(), value)?;
        if next.byte_len() != self.byte_len() {
            return Err(invalid(
                self.kind(),
                format!("length {} differs from fixed length {}", next.byte_len(), self.byte_len()),
            ));
        }
        *self = next;
        Ok(())
    }

    /// Write exactly `byte_len()` bytes at `offset`.
    pub fn store(&self, buf: &mut [u8], offset: usize) -> Result<()> {
        let range = span(offset, self.byte_len(), buf.len())?;
        let dst = &mut buf[range];
        match self {
            Element::U8(v) => dst[0] = *v,
            Element::U16(v) => BigEndian::write_u16(dst, *v),
            Element::U24(v) => BigEndian::write_u24(dst, *v),
            Element::U32(v) => BigEndian::write_u32(dst, *v),
            Element::U16Array(vs) => BigEndian::write_u16_into(vs, dst),
            Element::U32Array(vs) => BigEndian::write_u32_into(vs, dst),
            Element::Text(b) | Element::Raw(b) => dst.copy_from_slice(b),
            Element::Padding(_) => dst.fill(0),
        }
        Ok(())
    }

    /// Read exactly `byte_len()` bytes at `offset`, replacing the value.
    pub fn load(&mut self, buf: &[u8], offset: usize) -> Result<()> {
        let src = &buf[span(offset, self.byte_len(), buf.len())?];
        match self {
            Element::U8(v) => *v = src[0],
            Element::U16(v) => *v = BigEndian::read_u16(src),
            Element::U24(v) => *v = BigEndian::read_u24(src),
            Element::U32(v) => *v = BigEndian::read_u32(src),
            Element::U16Array(vs) => BigEndian::read_u16_into(src, vs),
            Element::U32Array(vs) => BigEndian::read_u32_into(src, vs),
            Element::Text(b) | Element::Raw(b) => b.copy_from_slice(src),
            Element::Padding(_) => {}
        }
        Ok(())
    }
}
