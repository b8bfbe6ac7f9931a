use std::collections::BTreeMap;

use crate::Violation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum Severity {
    Error,
    Warning,
}

impl Severity {
    fn as_str(self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        }
    }
}

fn describe(id: &str) -> (Severity, &'static str) {
    match id {
        "NFV9-MALFORMED-HEADER" => (
            Severity::Error,
            "datagram shorter than the 20-byte header",
        ),
        "NFV9-MALFORMED-TEMPLATE" => (
            Severity::Error,
            "template flowset body does not match its field count",
        ),
        "NFV9-MALFORMED-FLOWSET" => (
            Severity::Error,
            "flowset length below 4 or beyond the datagram",
        ),
        "NFV9-UNRESOLVED-TEMPLATE" => (
            Severity::Warning,
            "data flowset discarded: template not defined earlier in the datagram",
        ),
        "NFV9-UNKNOWN-FIELD" => (Severity::Warning, "field type not in the field table"),
        "NFV9-FIELD-LENGTH" => (
            Severity::Error,
            "declared field length does not fit the field's value kind",
        ),
        "NFV9-RECORD-TOO-SHORT" => (Severity::Error, "data record shorter than its template"),
        "NFV9-MISSING-TEMPLATE" => (Severity::Error, "data flowset carries no template"),
        _ => (Severity::Error, "decode failure"),
    }
}

#[derive(Debug)]
struct Entry {
    severity: Severity,
    message: &'static str,
    count: u64,
    examples: Vec<String>,
}

#[derive(Debug)]
pub(crate) struct ViolationLog {
    max_examples: usize,
    entries: BTreeMap<&'static str, Entry>,
}

impl ViolationLog {
    pub(crate) fn new(max_examples: usize) -> Self {
        Self {
            max_examples,
            entries: BTreeMap::new(),
        }
    }

    pub(crate) fn record(&mut self, id: &'static str, example: impl FnOnce() -> String) {
        let entry = self.entries.entry(id).or_insert_with(|| {
            let (severity, message) = describe(id);
            Entry {
                severity,
                message,
                count: 0,
                examples: Vec::new(),
            }
        });
        entry.count += 1;
        if entry.examples.len() < self.max_examples {
            entry.examples.push(example());
        }
    }

    pub(crate) fn into_violations(self) -> Vec<Violation> {
        let mut violations: Vec<_> = self.entries.into_iter().collect();
        violations.sort_by(|(a_id, a), (b_id, b)| {
            a.severity.cmp(&b.severity).then_with(|| a_id.cmp(b_id))
        });
        violations
            .into_iter()
            .map(|(id, entry)| Violation {
                id: id.to_string(),
                severity: entry.severity.as_str().to_string(),
                message: entry.message.to_string(),
                count: entry.count,
                examples: entry.examples,
            })
            .collect()
    }
}
