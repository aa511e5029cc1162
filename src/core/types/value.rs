//! Typed memory values and the raw-byte codec
//!
//! Converts the engine's raw byte buffers to and from semantic values, and
//! computes how many bytes a given entry needs to be read with.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::ScanError;

/// Semantic type of a watched or scanned value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeTag {
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    String,
    ByteArray,
}

/// Engine type-list tokens mapped onto tags; first recognized token wins
const ENGINE_TYPE_NAMES: &[(&str, TypeTag)] = &[
    ("I8", TypeTag::Int8),
    ("I8s", TypeTag::Int8),
    ("I8u", TypeTag::UInt8),
    ("I16", TypeTag::Int16),
    ("I16s", TypeTag::Int16),
    ("I16u", TypeTag::UInt16),
    ("I32", TypeTag::Int32),
    ("I32s", TypeTag::Int32),
    ("I32u", TypeTag::UInt32),
    ("I64", TypeTag::Int64),
    ("I64s", TypeTag::Int64),
    ("I64u", TypeTag::UInt64),
    ("F32", TypeTag::Float32),
    ("F64", TypeTag::Float64),
    ("bytearray", TypeTag::ByteArray),
    ("string", TypeTag::String),
];

impl TypeTag {
    /// Byte width for fixed-size types, `None` for string/bytearray
    pub const fn fixed_size(&self) -> Option<usize> {
        match self {
            TypeTag::Int8 | TypeTag::UInt8 => Some(1),
            TypeTag::Int16 | TypeTag::UInt16 => Some(2),
            TypeTag::Int32 | TypeTag::UInt32 | TypeTag::Float32 => Some(4),
            TypeTag::Int64 | TypeTag::UInt64 | TypeTag::Float64 => Some(8),
            TypeTag::String | TypeTag::ByteArray => None,
        }
    }

    /// How many bytes to read for a value of this type.
    ///
    /// Variable-length types size themselves from the *previously cached*
    /// display text, not from live memory: a string reads as many bytes as
    /// the old text occupied, a bytearray as many pairs as the old text
    /// held. Shrinking the cached text therefore truncates the next read
    /// until a successful decode re-derives the length.
    pub fn read_size(&self, prior: &str) -> Option<usize> {
        if let Some(n) = self.fixed_size() {
            return Some(n);
        }
        let n = match self {
            TypeTag::String => prior.len(),
            TypeTag::ByteArray => (prior.trim().len() + 1) / 3,
            _ => 0,
        };
        (n > 0).then_some(n)
    }

    /// True for integer tags (signed or unsigned)
    pub const fn is_integer(&self) -> bool {
        matches!(
            self,
            TypeTag::Int8
                | TypeTag::Int16
                | TypeTag::Int32
                | TypeTag::Int64
                | TypeTag::UInt8
                | TypeTag::UInt16
                | TypeTag::UInt32
                | TypeTag::UInt64
        )
    }

    /// True for signed integer tags
    pub const fn is_signed(&self) -> bool {
        matches!(
            self,
            TypeTag::Int8 | TypeTag::Int16 | TypeTag::Int32 | TypeTag::Int64
        )
    }

    /// True for float tags
    pub const fn is_float(&self) -> bool {
        matches!(self, TypeTag::Float32 | TypeTag::Float64)
    }

    /// Bit width for integer tags
    pub const fn bit_width(&self) -> Option<u32> {
        match self.fixed_size() {
            Some(n) if self.is_integer() => Some(n as u32 * 8),
            _ => None,
        }
    }

    /// Maps an engine type list (e.g. `"I32s I16u I8u"`) onto a tag.
    /// The `unknown` sentinel and unrecognized lists yield `None`.
    pub fn from_engine_names(names: &str) -> Option<TypeTag> {
        names
            .split_whitespace()
            .find_map(|tok| ENGINE_TYPE_NAMES.iter().find(|(n, _)| *n == tok))
            .map(|(_, tag)| *tag)
    }

    /// Wire/display name, also used in `write <type> ...` commands
    pub const fn name(&self) -> &'static str {
        match self {
            TypeTag::Int8 => "int8",
            TypeTag::Int16 => "int16",
            TypeTag::Int32 => "int32",
            TypeTag::Int64 => "int64",
            TypeTag::UInt8 => "uint8",
            TypeTag::UInt16 => "uint16",
            TypeTag::UInt32 => "uint32",
            TypeTag::UInt64 => "uint64",
            TypeTag::Float32 => "float32",
            TypeTag::Float64 => "float64",
            TypeTag::String => "string",
            TypeTag::ByteArray => "bytearray",
        }
    }

    /// Placeholder display text for a freshly added entry of this type
    pub fn zero_text(&self, length: usize) -> String {
        match self {
            TypeTag::Float32 | TypeTag::Float64 => "0.0".to_string(),
            TypeTag::String => " ".repeat(length.max(1)),
            TypeTag::ByteArray => {
                let pairs = vec!["00"; length.max(1)];
                pairs.join(" ")
            }
            _ => "0".to_string(),
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TypeTag {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "int8" => Ok(TypeTag::Int8),
            "int16" => Ok(TypeTag::Int16),
            "int32" => Ok(TypeTag::Int32),
            "int64" => Ok(TypeTag::Int64),
            "uint8" => Ok(TypeTag::UInt8),
            "uint16" => Ok(TypeTag::UInt16),
            "uint32" => Ok(TypeTag::UInt32),
            "uint64" => Ok(TypeTag::UInt64),
            "float32" => Ok(TypeTag::Float32),
            "float64" => Ok(TypeTag::Float64),
            "string" => Ok(TypeTag::String),
            "bytearray" => Ok(TypeTag::ByteArray),
            other => Err(ScanError::InvalidValueType(other.to_string())),
        }
    }
}

/// A decoded value, tagged by its semantic type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum ScanValue {
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    Text(String),
    Bytes(Vec<u8>),
}

impl ScanValue {
    /// Decodes a raw buffer as the given type.
    ///
    /// A buffer shorter than the type's width yields `None` — the caller
    /// surfaces that as an unavailable value, never a panic. Strings decode
    /// lossily (undecodable bytes become U+FFFD), bytearrays render as
    /// space-separated lowercase hex pairs.
    pub fn decode(tag: TypeTag, bytes: &[u8]) -> Option<ScanValue> {
        if let Some(width) = tag.fixed_size() {
            if bytes.len() < width {
                return None;
            }
        }
        match tag {
            TypeTag::Int8 => Some(ScanValue::I8(bytes[0] as i8)),
            TypeTag::UInt8 => Some(ScanValue::U8(bytes[0])),
            TypeTag::Int16 => bytes[..2].try_into().ok().map(i16::from_le_bytes).map(ScanValue::I16),
            TypeTag::UInt16 => bytes[..2].try_into().ok().map(u16::from_le_bytes).map(ScanValue::U16),
            TypeTag::Int32 => bytes[..4].try_into().ok().map(i32::from_le_bytes).map(ScanValue::I32),
            TypeTag::UInt32 => bytes[..4].try_into().ok().map(u32::from_le_bytes).map(ScanValue::U32),
            TypeTag::Int64 => bytes[..8].try_into().ok().map(i64::from_le_bytes).map(ScanValue::I64),
            TypeTag::UInt64 => bytes[..8].try_into().ok().map(u64::from_le_bytes).map(ScanValue::U64),
            TypeTag::Float32 => bytes[..4].try_into().ok().map(f32::from_le_bytes).map(ScanValue::F32),
            TypeTag::Float64 => bytes[..8].try_into().ok().map(f64::from_le_bytes).map(ScanValue::F64),
            TypeTag::String => Some(ScanValue::Text(
                String::from_utf8_lossy(bytes).into_owned(),
            )),
            TypeTag::ByteArray => {
                if bytes.is_empty() {
                    return None;
                }
                Some(ScanValue::Bytes(bytes.to_vec()))
            }
        }
    }

    /// Little-endian byte image of the value
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            ScanValue::I8(v) => v.to_le_bytes().to_vec(),
            ScanValue::I16(v) => v.to_le_bytes().to_vec(),
            ScanValue::I32(v) => v.to_le_bytes().to_vec(),
            ScanValue::I64(v) => v.to_le_bytes().to_vec(),
            ScanValue::U8(v) => v.to_le_bytes().to_vec(),
            ScanValue::U16(v) => v.to_le_bytes().to_vec(),
            ScanValue::U32(v) => v.to_le_bytes().to_vec(),
            ScanValue::U64(v) => v.to_le_bytes().to_vec(),
            ScanValue::F32(v) => v.to_le_bytes().to_vec(),
            ScanValue::F64(v) => v.to_le_bytes().to_vec(),
            ScanValue::Text(s) => s.as_bytes().to_vec(),
            ScanValue::Bytes(b) => b.clone(),
        }
    }

    /// Tag of this value
    pub const fn tag(&self) -> TypeTag {
        match self {
            ScanValue::I8(_) => TypeTag::Int8,
            ScanValue::I16(_) => TypeTag::Int16,
            ScanValue::I32(_) => TypeTag::Int32,
            ScanValue::I64(_) => TypeTag::Int64,
            ScanValue::U8(_) => TypeTag::UInt8,
            ScanValue::U16(_) => TypeTag::UInt16,
            ScanValue::U32(_) => TypeTag::UInt32,
            ScanValue::U64(_) => TypeTag::UInt64,
            ScanValue::F32(_) => TypeTag::Float32,
            ScanValue::F64(_) => TypeTag::Float64,
            ScanValue::Text(_) => TypeTag::String,
            ScanValue::Bytes(_) => TypeTag::ByteArray,
        }
    }
}

impl fmt::Display for ScanValue {
    /// Canonical text form; this is exactly what `write` forwards to the
    /// engine, which does its own parsing.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanValue::I8(v) => write!(f, "{}", v),
            ScanValue::I16(v) => write!(f, "{}", v),
            ScanValue::I32(v) => write!(f, "{}", v),
            ScanValue::I64(v) => write!(f, "{}", v),
            ScanValue::U8(v) => write!(f, "{}", v),
            ScanValue::U16(v) => write!(f, "{}", v),
            ScanValue::U32(v) => write!(f, "{}", v),
            ScanValue::U64(v) => write!(f, "{}", v),
            ScanValue::F32(v) => write!(f, "{}", v),
            ScanValue::F64(v) => write!(f, "{}", v),
            ScanValue::Text(s) => f.write_str(s),
            ScanValue::Bytes(b) => {
                for (i, byte) in b.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{:02x}", byte)?;
                }
                Ok(())
            }
        }
    }
}
