use thiserror::Error;

use super::layout;

/// A read ran past the end of the buffer it was given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("need {needed} bytes, got {actual}")]
pub struct Truncated {
    pub needed: usize,
    pub actual: usize,
}

/// Structural failures. Any of these aborts the whole datagram.
///
/// # Examples
/// ```
/// use flowshark_core::{NetFlowError, Truncated};
///
/// let err = NetFlowError::MalformedHeader(Truncated { needed: 20, actual: 7 });
/// assert_eq!(err.to_string(), "malformed header: need 20 bytes, got 7");
/// assert_eq!(err.code(), "NFV9-MALFORMED-HEADER");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetFlowError {
    #[error("malformed header: {0}")]
    MalformedHeader(Truncated),
    #[error(
        "malformed template flowset at offset {offset}: body is {body_len} bytes, {field_count} fields need {expected_len}"
    )]
    MalformedTemplate {
        offset: usize,
        field_count: u16,
        body_len: usize,
        expected_len: usize,
    },
    #[error("malformed flowset at offset {offset}: {defect}")]
    MalformedFlowSet { offset: usize, defect: FlowSetDefect },
}

impl NetFlowError {
    /// Stable identifier used in reports.
    pub fn code(&self) -> &'static str {
        match self {
            NetFlowError::MalformedHeader(_) => "NFV9-MALFORMED-HEADER",
            NetFlowError::MalformedTemplate { .. } => "NFV9-MALFORMED-TEMPLATE",
            NetFlowError::MalformedFlowSet { .. } => "NFV9-MALFORMED-FLOWSET",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FlowSetDefect {
    #[error("{0}")]
    Truncated(Truncated),
    #[error(
        "declared length {length} is shorter than the {} byte prefix",
        layout::FLOWSET_PREFIX_LEN
    )]
    LengthBelowPrefix { length: u16 },
}

/// Recoverable conditions. The offending flowset or field is skipped and
/// decoding carries on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Diagnostic {
    #[error(
        "discarded data flowset {flowset_id} ({length} bytes): no template {flowset_id} earlier in the datagram"
    )]
    UnresolvedTemplateReference { flowset_id: u16, length: u16 },
    #[error("unknown field type {type_id} in field scheme {scheme}")]
    UnknownFieldType { type_id: u16, scheme: &'static str },
}

impl Diagnostic {
    pub fn code(&self) -> &'static str {
        match self {
            Diagnostic::UnresolvedTemplateReference { .. } => "NFV9-UNRESOLVED-TEMPLATE",
            Diagnostic::UnknownFieldType { .. } => "NFV9-UNKNOWN-FIELD",
        }
    }
}
