use std::fmt;

use num_bigint::BigUint;
use serde::{Serialize, Serializer};

use super::ValueKind;

/// A decoded field value.
///
/// Unsigned integers are narrowed to the smallest signed type able to hold
/// them; anything that does not fit an `i64` is carried as a [`BigUint`].
/// Big values serialize as decimal strings so JSON readers keep every digit,
/// raw bytes serialize as lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Bytes(#[serde(serialize_with = "serialize_hex")] Vec<u8>),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    Big(#[serde(serialize_with = "serialize_decimal")] BigUint),
}

impl FieldValue {
    /// Decodes `bytes` as `kind`.
    ///
    /// Width checks for fixed-size kinds happen before this is called.
    pub(crate) fn decode(kind: ValueKind, bytes: &[u8]) -> Self {
        match kind {
            ValueKind::Ascii => FieldValue::Text(ascii(bytes)),
            ValueKind::Bytes => FieldValue::Bytes(bytes.to_vec()),
            ValueKind::HexByte => FieldValue::Text(joined(bytes, "", |b| format!("0x{b:02X}"))),
            ValueKind::Mac => FieldValue::Text(joined(bytes, ":", |b| format!("{b:02x}"))),
            ValueKind::Ipv4 => FieldValue::Text(joined(bytes, ".", |b| b.to_string())),
            ValueKind::Ipv6 => FieldValue::Text(ipv6(bytes)),
            ValueKind::Unsigned => unsigned(bytes),
        }
    }

    /// Narrows a non-negative accumulator to the smallest signed variant.
    fn narrow(value: i64) -> Self {
        if let Ok(v) = i8::try_from(value) {
            FieldValue::I8(v)
        } else if let Ok(v) = i16::try_from(value) {
            FieldValue::I16(v)
        } else if let Ok(v) = i32::try_from(value) {
            FieldValue::I32(v)
        } else {
            FieldValue::I64(value)
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            FieldValue::I8(v) => Some(i64::from(v)),
            FieldValue::I16(v) => Some(i64::from(v)),
            FieldValue::I32(v) => Some(i64::from(v)),
            FieldValue::I64(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_integer(&self) -> bool {
        !matches!(self, FieldValue::Text(_) | FieldValue::Bytes(_))
    }

    /// Re-encodes an integer value as `width` big-endian bytes.
    ///
    /// Returns `None` for text and byte values, negative integers, and values
    /// that need more than `width` bytes.
    ///
    /// # Examples
    /// ```
    /// use flowshark_core::FieldValue;
    ///
    /// assert_eq!(FieldValue::I16(256).to_be_bytes(4), Some(vec![0, 0, 1, 0]));
    /// assert_eq!(FieldValue::I16(256).to_be_bytes(1), None);
    /// ```
    pub fn to_be_bytes(&self, width: usize) -> Option<Vec<u8>> {
        let magnitude = match self {
            FieldValue::Big(value) => value.to_bytes_be(),
            FieldValue::Text(_) | FieldValue::Bytes(_) => return None,
            other => u64::try_from(other.as_i64()?).ok()?.to_be_bytes().to_vec(),
        };
        let significant = magnitude
            .iter()
            .position(|&byte| byte != 0)
            .map_or(&[][..], |start| &magnitude[start..]);
        if significant.len() > width {
            return None;
        }
        let mut out = vec![0u8; width - significant.len()];
        out.extend_from_slice(significant);
        Some(out)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(text) => f.write_str(text),
            FieldValue::Bytes(bytes) => f.write_str(&hex(bytes)),
            FieldValue::I8(v) => write!(f, "{v}"),
            FieldValue::I16(v) => write!(f, "{v}"),
            FieldValue::I32(v) => write!(f, "{v}"),
            FieldValue::I64(v) => write!(f, "{v}"),
            FieldValue::Big(v) => write!(f, "{v}"),
        }
    }
}

fn unsigned(bytes: &[u8]) -> FieldValue {
    if bytes.len() > 8 {
        return FieldValue::Big(BigUint::from_bytes_be(bytes));
    }
    let mut acc: i64 = 0;
    for &byte in bytes {
        if acc > i64::MAX >> 8 {
            return FieldValue::Big(BigUint::from_bytes_be(bytes));
        }
        acc = (acc << 8) | i64::from(byte);
    }
    FieldValue::narrow(acc)
}

fn ascii(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&byte| {
            if byte.is_ascii() {
                char::from(byte)
            } else {
                char::REPLACEMENT_CHARACTER
            }
        })
        .collect()
}

fn ipv6(bytes: &[u8]) -> String {
    bytes
        .chunks(2)
        .map(hex_upper)
        .collect::<Vec<_>>()
        .join(":")
}

fn joined(bytes: &[u8], separator: &str, render: impl Fn(u8) -> String) -> String {
    bytes
        .iter()
        .map(|&byte| render(byte))
        .collect::<Vec<_>>()
        .join(separator)
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|byte| format!("{byte:02x}")).collect()
}

fn hex_upper(bytes: &[u8]) -> String {
    bytes.iter().map(|byte| format!("{byte:02X}")).collect()
}

fn serialize_hex<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&hex(bytes))
}

fn serialize_decimal<S: Serializer>(value: &BigUint, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}
