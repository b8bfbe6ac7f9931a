//! Field schemes and the semantic interpretation of data records.
//!
//! A [`FieldScheme`] resolves a template field type id to a [`Field`]
//! descriptor (name, nominal length, value kind). [`interpret`] walks a data
//! flowset with its template and turns each byte range into a
//! [`FieldValue`] according to the descriptor's [`ValueKind`]. The
//! interpretation routine is written once and works with any scheme.

mod cisco;
mod interpret;
mod value;

use serde::Serialize;

pub use cisco::{CISCO_FIELDS, CiscoFieldScheme, CiscoLengthScheme};
pub use interpret::{InterpretError, ParsedRecord, interpret, interpret_records};
pub use value::FieldValue;

/// How the bytes of a field are turned into a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    /// US-ASCII text of the exact declared length.
    Ascii,
    /// Uninterpreted bytes.
    Bytes,
    /// A single byte rendered as `0xHH`.
    HexByte,
    Mac,
    Ipv4,
    Ipv6,
    /// Big-endian unsigned integer of any width.
    Unsigned,
}

impl ValueKind {
    /// Byte width a value of this kind must have, if it is fixed.
    pub fn fixed_len(self) -> Option<usize> {
        match self {
            ValueKind::HexByte => Some(1),
            ValueKind::Ipv4 => Some(4),
            ValueKind::Mac => Some(6),
            ValueKind::Ipv6 => Some(16),
            ValueKind::Ascii | ValueKind::Bytes | ValueKind::Unsigned => None,
        }
    }
}

/// Semantic descriptor of a field type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Field {
    pub type_id: u16,
    pub name: &'static str,
    /// Nominal length from the reference table; 0 means variable.
    pub length: u16,
    pub kind: ValueKind,
}

impl Field {
    pub const fn new(type_id: u16, name: &'static str, length: u16, kind: ValueKind) -> Self {
        Self {
            type_id,
            name,
            length,
            kind,
        }
    }
}

/// Resolves field type ids to descriptors.
///
/// # Examples
/// ```
/// use flowshark_core::{CiscoFieldScheme, FieldScheme, ValueKind};
///
/// let field = CiscoFieldScheme.field(8).unwrap();
/// assert_eq!(field.name, "IPV4_SRC_ADDR");
/// assert_eq!(field.kind, ValueKind::Ipv4);
/// assert!(CiscoFieldScheme.field(4000).is_none());
/// ```
pub trait FieldScheme {
    /// Short name used in diagnostics.
    fn name(&self) -> &'static str;

    fn field(&self, type_id: u16) -> Option<&Field>;
}

/// Index of the first entry whose type id differs from its position.
///
/// A table where every entry sits at the index equal to its type id has no
/// gaps and no duplicates.
pub const fn first_misplaced(table: &[Field]) -> Option<usize> {
    let mut index = 0;
    while index < table.len() {
        if table[index].type_id as usize != index {
            return Some(index);
        }
        index += 1;
    }
    None
}
