use thiserror::Error;
use tracing::{trace, warn};

use super::{Field, FieldScheme, FieldValue, ValueKind};
use crate::protocols::netflow_v9::{DataFlowSet, Diagnostic, TemplateFlowSet};

/// Why a data record could not be interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InterpretError {
    #[error("field {name} (type {type_id}) holds {kind:?} values of {expected} bytes, template declares {actual}")]
    FieldLengthMismatch {
        name: &'static str,
        type_id: u16,
        kind: ValueKind,
        expected: usize,
        actual: usize,
    },
    #[error("field {name} (type {type_id}) spans bytes {start}..{end}, record holds {actual}")]
    RecordTooShort {
        name: &'static str,
        type_id: u16,
        start: usize,
        end: usize,
        actual: usize,
    },
    #[error("data flowset {flowset_id} has no template")]
    MissingTemplate { flowset_id: u16 },
}

impl InterpretError {
    pub fn code(&self) -> &'static str {
        match self {
            InterpretError::FieldLengthMismatch { .. } => "NFV9-FIELD-LENGTH",
            InterpretError::RecordTooShort { .. } => "NFV9-RECORD-TOO-SHORT",
            InterpretError::MissingTemplate { .. } => "NFV9-MISSING-TEMPLATE",
        }
    }
}

/// Field descriptors paired with decoded values, in template order.
///
/// A descriptor appears at most once; a later occurrence of the same field
/// replaces the earlier value in place.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedRecord<'s> {
    entries: Vec<(&'s Field, FieldValue)>,
    diagnostics: Vec<Diagnostic>,
}

impl<'s> ParsedRecord<'s> {
    fn insert(&mut self, field: &'s Field, value: FieldValue) {
        match self.entries.iter_mut().find(|(known, _)| *known == field) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((field, value)),
        }
    }

    pub fn get(&self, field: &Field) -> Option<&FieldValue> {
        self.entries
            .iter()
            .find(|(known, _)| *known == field)
            .map(|(_, value)| value)
    }

    /// Value of the first field with this name.
    pub fn get_by_name(&self, name: &str) -> Option<&FieldValue> {
        self.entries
            .iter()
            .find(|(field, _)| field.name == name)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'s Field, &FieldValue)> {
        self.entries.iter().map(|(field, value)| (*field, value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fields skipped because the scheme did not know their type id.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

/// Interprets the first record of a data flowset.
///
/// Field types unknown to `scheme` are skipped with a diagnostic. Fixed-width
/// kinds (addresses, hex bytes) must match the template's declared length.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use flowshark_core::{CiscoFieldScheme, DataFlowSet, FieldValue, TemplateFlowSet, interpret};
///
/// let template = Arc::new(TemplateFlowSet::new(0, 256, [(8, 4), (7, 2)]));
/// let data = DataFlowSet::new(256, vec![10, 0, 0, 1, 0x01, 0xbb], template);
/// let record = interpret(&data, &CiscoFieldScheme).unwrap();
/// assert_eq!(record.get_by_name("IPV4_SRC_ADDR").and_then(FieldValue::as_str), Some("10.0.0.1"));
/// assert_eq!(record.get_by_name("L4_SRC_PORT"), Some(&FieldValue::I16(443)));
/// ```
pub fn interpret<'s, S>(data: &DataFlowSet, scheme: &'s S) -> Result<ParsedRecord<'s>, InterpretError>
where
    S: FieldScheme + ?Sized,
{
    let template = data.template().ok_or(InterpretError::MissingTemplate {
        flowset_id: data.flowset_id(),
    })?;
    interpret_record(template, data.data(), scheme)
}

/// Interprets every record of a data flowset.
///
/// The payload is split into template-sized records; a trailing remainder
/// shorter than one record is padding and ignored. Templates with a
/// variable-length field describe a single record spanning the payload.
pub fn interpret_records<'s, S>(
    data: &DataFlowSet,
    scheme: &'s S,
) -> Vec<Result<ParsedRecord<'s>, InterpretError>>
where
    S: FieldScheme + ?Sized,
{
    let Some(template) = data.template() else {
        return vec![Err(InterpretError::MissingTemplate {
            flowset_id: data.flowset_id(),
        })];
    };
    split_records(template, data.data())
        .into_iter()
        .map(|record| interpret_record(template, record, scheme))
        .collect()
}

fn split_records<'a>(template: &TemplateFlowSet, payload: &'a [u8]) -> Vec<&'a [u8]> {
    let record_len = template.record_len();
    if payload.is_empty() {
        return Vec::new();
    }
    if record_len == 0 || template.has_variable_fields() || payload.len() < record_len {
        return vec![payload];
    }
    let chunks = payload.chunks_exact(record_len);
    let padding = chunks.remainder().len();
    if padding > 0 {
        trace!(
            template_id = template.template_id(),
            padding, "ignoring data flowset padding"
        );
    }
    chunks.collect()
}

fn interpret_record<'s, S>(
    template: &TemplateFlowSet,
    record: &[u8],
    scheme: &'s S,
) -> Result<ParsedRecord<'s>, InterpretError>
where
    S: FieldScheme + ?Sized,
{
    let mut parsed = ParsedRecord::default();
    let fields = template.fields();

    for (index, template_field) in fields.iter().enumerate() {
        let type_id = template_field.field_type();
        let Some(field) = scheme.field(type_id) else {
            let diagnostic = Diagnostic::UnknownFieldType {
                type_id,
                scheme: scheme.name(),
            };
            warn!(template_id = template.template_id(), "{diagnostic}");
            parsed.diagnostics.push(diagnostic);
            continue;
        };

        let start = template_field.offset() as usize;
        let end = if !template_field.is_variable() {
            start + usize::from(template_field.length())
        } else if index + 1 == fields.len() {
            record.len().max(start)
        } else {
            start
        };
        let bytes = record.get(start..end).ok_or(InterpretError::RecordTooShort {
            name: field.name,
            type_id,
            start,
            end,
            actual: record.len(),
        })?;

        if let Some(expected) = field.kind.fixed_len() {
            if bytes.len() != expected {
                return Err(InterpretError::FieldLengthMismatch {
                    name: field.name,
                    type_id,
                    kind: field.kind,
                    expected,
                    actual: bytes.len(),
                });
            }
        }

        parsed.insert(field, FieldValue::decode(field.kind, bytes));
    }

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{InterpretError, interpret, interpret_records};
    use crate::fields::{CiscoFieldScheme, CiscoLengthScheme, FieldValue, ValueKind};
    use crate::protocols::netflow_v9::{DataFlowSet, Diagnostic, TemplateFlowSet};

    fn data(fields: &[(u16, u16)], payload: &[u8]) -> DataFlowSet {
        let template = Arc::new(TemplateFlowSet::new(0, 300, fields.iter().copied()));
        DataFlowSet::new(300, payload.to_vec(), template)
    }

    fn text(value: Option<&FieldValue>) -> Option<&str> {
        value.and_then(FieldValue::as_str)
    }

    #[test]
    fn decodes_typed_fields() {
        let flowset = data(
            &[(8, 4), (12, 4), (56, 6), (1, 2), (4, 1)],
            &[
                192, 168, 1, 1, 10, 0, 0, 2, 0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x01, 0x00, 6,
            ],
        );
        let record = interpret(&flowset, &CiscoFieldScheme).unwrap();
        assert_eq!(record.len(), 5);
        assert_eq!(text(record.get_by_name("IPV4_SRC_ADDR")), Some("192.168.1.1"));
        assert_eq!(text(record.get_by_name("IPV4_DST_ADDR")), Some("10.0.0.2"));
        assert_eq!(text(record.get_by_name("SRC_MAC")), Some("00:11:22:33:44:55"));
        assert_eq!(record.get_by_name("IN_BYTES"), Some(&FieldValue::I16(256)));
        assert_eq!(record.get_by_name("PROTOCOL"), Some(&FieldValue::I8(6)));
        assert!(record.diagnostics().is_empty());

        let names: Vec<_> = record.iter().map(|(field, _)| field.name).collect();
        assert_eq!(
            names,
            ["IPV4_SRC_ADDR", "IPV4_DST_ADDR", "SRC_MAC", "IN_BYTES", "PROTOCOL"]
        );
    }

    #[test]
    fn skips_unknown_field_types() {
        let flowset = data(&[(8, 4), (4000, 2), (7, 2)], &[1, 2, 3, 4, 0xde, 0xad, 0, 80]);
        let record = interpret(&flowset, &CiscoFieldScheme).unwrap();
        assert_eq!(record.len(), 2);
        assert_eq!(record.get_by_name("L4_SRC_PORT"), Some(&FieldValue::I8(80)));
        assert_eq!(
            record.diagnostics(),
            [Diagnostic::UnknownFieldType {
                type_id: 4000,
                scheme: "cisco"
            }]
        );
    }

    #[test]
    fn rejects_mismatched_address_width() {
        let flowset = data(&[(8, 2)], &[10, 0]);
        let err = interpret(&flowset, &CiscoFieldScheme).unwrap_err();
        assert_eq!(
            err,
            InterpretError::FieldLengthMismatch {
                name: "IPV4_SRC_ADDR",
                type_id: 8,
                kind: ValueKind::Ipv4,
                expected: 4,
                actual: 2,
            }
        );
        assert_eq!(err.code(), "NFV9-FIELD-LENGTH");

        let raw = interpret(&flowset, &CiscoLengthScheme).unwrap();
        assert_eq!(raw.get_by_name("IPV4_SRC_ADDR"), Some(&FieldValue::Bytes(vec![10, 0])));
    }

    #[test]
    fn rejects_mismatched_fixed_widths() {
        let cases = [
            (56u16, 4u16, ValueKind::Mac, 6usize),
            (27, 8, ValueKind::Ipv6, 16),
            (5, 2, ValueKind::HexByte, 1),
        ];
        for (type_id, length, kind, expected) in cases {
            let flowset = data(&[(type_id, length)], &vec![0xab; usize::from(length)]);
            let err = interpret(&flowset, &CiscoFieldScheme).unwrap_err();
            assert!(
                matches!(
                    err,
                    InterpretError::FieldLengthMismatch { type_id: t, kind: k, expected: e, actual: a, .. }
                        if t == type_id && k == kind && e == expected && a == usize::from(length)
                ),
                "type {type_id}: {err:?}"
            );
        }
    }

    #[test]
    fn short_record_is_an_error() {
        let flowset = data(&[(8, 4), (12, 4)], &[1, 2, 3, 4, 5, 6]);
        let err = interpret(&flowset, &CiscoFieldScheme).unwrap_err();
        assert!(matches!(
            err,
            InterpretError::RecordTooShort {
                type_id: 12,
                start: 4,
                end: 8,
                actual: 6,
                ..
            }
        ));
    }

    #[test]
    fn trailing_variable_field_takes_the_rest() {
        let flowset = data(&[(7, 2), (82, 0)], &[0, 22, b'e', b't', b'h', b'0']);
        let record = interpret(&flowset, &CiscoFieldScheme).unwrap();
        assert_eq!(text(record.get_by_name("IF_NAME")), Some("eth0"));
    }

    #[test]
    fn inner_variable_field_is_empty() {
        let flowset = data(&[(82, 0), (7, 2)], &[0, 22]);
        let record = interpret(&flowset, &CiscoFieldScheme).unwrap();
        assert_eq!(text(record.get_by_name("IF_NAME")), Some(""));
        assert_eq!(record.get_by_name("L4_SRC_PORT"), Some(&FieldValue::I8(22)));
    }

    #[test]
    fn duplicate_fields_keep_the_later_value() {
        let flowset = data(&[(7, 2), (7, 2)], &[0, 1, 0, 2]);
        let record = interpret(&flowset, &CiscoFieldScheme).unwrap();
        assert_eq!(record.len(), 1);
        assert_eq!(record.get_by_name("L4_SRC_PORT"), Some(&FieldValue::I8(2)));
    }

    #[test]
    fn detached_flowset_has_no_template() {
        let flowset = DataFlowSet::detached(300, vec![1, 2, 3]);
        assert_eq!(
            interpret(&flowset, &CiscoFieldScheme),
            Err(InterpretError::MissingTemplate { flowset_id: 300 })
        );
        assert_eq!(interpret_records(&flowset, &CiscoFieldScheme).len(), 1);
    }

    #[test]
    fn splits_records_and_ignores_padding() {
        let flowset = data(&[(7, 2), (4, 1)], &[0, 80, 6, 0, 53, 17, 0, 0]);
        let records: Vec<_> = interpret_records(&flowset, &CiscoFieldScheme)
            .into_iter()
            .map(Result::unwrap)
            .collect();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get_by_name("PROTOCOL"), Some(&FieldValue::I8(6)));
        assert_eq!(records[1].get_by_name("L4_SRC_PORT"), Some(&FieldValue::I8(53)));
    }

    #[test]
    fn empty_payload_has_no_records() {
        let flowset = data(&[(7, 2)], &[]);
        assert!(interpret_records(&flowset, &CiscoFieldScheme).is_empty());
    }
}
