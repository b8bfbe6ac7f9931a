use std::time::Duration;

use tracing::warn;

use super::rfc3339;
use crate::config::{DecodeConfig, RecordMode};
use crate::fields::{InterpretError, interpret, interpret_records};
use crate::protocols::netflow_v9::{Diagnostic, Message, MessageRecord};
use crate::{FieldEntry, MessageReport, RecordReport};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFailure {
    pub flowset_id: u16,
    pub index: usize,
    pub error: InterpretError,
}

#[derive(Debug, Clone, Default)]
pub struct InterpretedRecords {
    pub records: Vec<RecordReport>,
    pub diagnostics: Vec<Diagnostic>,
    pub failures: Vec<RecordFailure>,
}

pub fn interpret_message(message: &Message, config: &DecodeConfig) -> InterpretedRecords {
    let scheme = config.scheme.scheme();
    let mut out = InterpretedRecords::default();

    for data in message.data_flowsets() {
        if data.data().is_empty() {
            continue;
        }
        let results = match config.records {
            RecordMode::None => Vec::new(),
            RecordMode::First => vec![interpret(data, scheme)],
            RecordMode::All => interpret_records(data, scheme),
        };
        for (index, result) in results.into_iter().enumerate() {
            match result {
                Ok(record) => {
                    out.diagnostics.extend_from_slice(record.diagnostics());
                    out.records.push(RecordReport {
                        flowset_id: data.flowset_id(),
                        index,
                        fields: record
                            .iter()
                            .map(|(field, value)| FieldEntry {
                                name: field.name,
                                type_id: field.type_id,
                                value: value.clone(),
                            })
                            .collect(),
                    });
                }
                Err(error) => {
                    warn!(
                        sender = %message.header().sender,
                        flowset_id = data.flowset_id(),
                        index,
                        "{error}"
                    );
                    out.failures.push(RecordFailure {
                        flowset_id: data.flowset_id(),
                        index,
                        error,
                    });
                }
            }
        }
    }

    out
}

pub fn message_report(
    message: &Message,
    records: Vec<RecordReport>,
    captured_at: Option<String>,
) -> MessageReport {
    MessageReport {
        message: MessageRecord::from(message),
        captured_at,
        exported_at: rfc3339(Duration::from_secs(u64::from(message.header().timestamp))),
        records,
    }
}

#[cfg(test)]
mod tests {
    use super::{interpret_message, message_report};
    use crate::config::{DecodeConfig, RecordMode};
    use crate::fields::{FieldValue, InterpretError};
    use crate::protocols::netflow_v9::{DatagramBuilder, Message, decode_message};

    fn message(builder: DatagramBuilder) -> Message {
        decode_message(
            &builder.build().unwrap(),
            "10.0.0.1:50000".parse().unwrap(),
            "10.0.0.2:2055".parse().unwrap(),
        )
        .unwrap()
        .unwrap()
    }

    fn config(records: RecordMode) -> DecodeConfig {
        DecodeConfig {
            records,
            ..DecodeConfig::default()
        }
    }

    #[test]
    fn record_modes() {
        let message = message(
            DatagramBuilder::new()
                .template(256, &[(7, 2)])
                .data(256, &[0, 80, 0, 81, 0, 82])
                .data(256, &[]),
        );
        assert!(interpret_message(&message, &config(RecordMode::None)).records.is_empty());
        assert_eq!(interpret_message(&message, &config(RecordMode::First)).records.len(), 1);

        let all = interpret_message(&message, &config(RecordMode::All));
        assert_eq!(all.records.len(), 3);
        assert_eq!(all.records[2].index, 2);
        assert_eq!(all.records[2].fields[0].value, FieldValue::I8(82));
    }

    #[test]
    fn failures_and_diagnostics_are_collected() {
        let message = message(
            DatagramBuilder::new()
                .template(256, &[(4000, 1), (8, 4)])
                .data(256, &[0, 10, 0, 0, 1])
                .template(257, &[(8, 4)])
                .data(257, &[10, 0]),
        );
        let out = interpret_message(&message, &config(RecordMode::First));
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.diagnostics.len(), 1);
        assert_eq!(out.failures.len(), 1);
        assert_eq!(out.failures[0].flowset_id, 257);
        assert!(matches!(
            out.failures[0].error,
            InterpretError::RecordTooShort { .. }
        ));
    }

    #[test]
    fn report_carries_export_time() {
        let message = message(DatagramBuilder::new().timestamp(86_400));
        let report = message_report(&message, Vec::new(), None);
        assert_eq!(report.exported_at.as_deref(), Some("1970-01-02T00:00:00Z"));
        assert_eq!(report.message.sender.port(), 50000);
    }
}
