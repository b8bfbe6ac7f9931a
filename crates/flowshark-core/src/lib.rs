//! flowshark core library: NetFlow v9 decoding and offline capture analysis.
//!
//! The decoder turns one UDP payload into a [`Message`]: the 20-byte header,
//! template flowsets, and data flowsets paired with the template that
//! describes them. Templates are only honoured within the datagram that
//! carries them. Field interpretation is a separate, on-demand step driven
//! by a [`FieldScheme`] table.
//!
//! Around the decoder sit a PCAP/PCAPNG packet source, UDP extraction, and
//! an analysis layer producing a deterministic JSON [`Report`]. Parsing is
//! byte-oriented and side-effect free; all I/O is isolated in `source`.
//!
//! # Examples
//! ```no_run
//! use std::path::Path;
//!
//! use flowshark_core::{DecodeConfig, analyze_pcap_file};
//!
//! let report = analyze_pcap_file(Path::new("capture.pcapng"), &DecodeConfig::default())?;
//! println!("decoded {} messages", report.messages.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Single datagrams decode without any capture around them. Data flowsets
//! whose template did not appear earlier in the same datagram are dropped
//! and reported as diagnostics:
//! ```
//! use flowshark_core::{DatagramBuilder, decode_datagram};
//!
//! let datagram = DatagramBuilder::new()
//!     .source_id(7)
//!     .template(256, &[(8, 4), (7, 2)])
//!     .data(256, &[10, 0, 0, 1, 0x01, 0xbb])
//!     .data(300, &[0; 4])
//!     .build()?;
//! let sender = "192.0.2.1:40000".parse()?;
//! let recipient = "192.0.2.2:2055".parse()?;
//!
//! let decoded = decode_datagram(&datagram, sender, recipient)?.expect("non-empty datagram");
//! assert_eq!(decoded.message.header().source_id, 7);
//! assert_eq!(decoded.message.flowsets().len(), 2);
//! assert_eq!(decoded.diagnostics.len(), 1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use serde::Serialize;

mod analysis;
mod config;
mod fields;
mod protocols;
mod source;

pub use analysis::{
    AnalysisError, InterpretedRecords, RecordFailure, UdpDatagram, UdpError, analyze_pcap_file,
    analyze_source, interpret_message, message_report, parse_udp_datagram,
};
pub use config::{ConfigError, DecodeConfig, RecordMode, SchemeKind};
pub use fields::{
    CISCO_FIELDS, CiscoFieldScheme, CiscoLengthScheme, Field, FieldScheme, FieldValue,
    InterpretError, ParsedRecord, ValueKind, first_misplaced, interpret, interpret_records,
};
pub use protocols::netflow_v9::{
    DataFlowSet, DatagramBuilder, DecodeCase, Decoded, Diagnostic, FixtureError, FlowSet,
    FlowSetDefect, FlowSetRecord, FlowSetType, Header, Message, MessageRecord, NetFlowError,
    TemplateField, TemplateFieldRecord, TemplateFlowSet, TemplateRegistry, Truncated,
    decode_datagram, decode_message,
};
pub use source::{
    CapturedFrame, PacketEvent, PacketSource, PcapFileSource, PcapNgWriter, SourceError,
    build_ipv4_udp_frame, write_pcapng,
};

/// Current report schema version.
pub const REPORT_VERSION: u32 = 1;
/// Default timestamp used when no capture time is available.
pub const DEFAULT_GENERATED_AT: &str = "1970-01-01T00:00:00Z";

/// Analysis report with deterministic ordering.
///
/// # Examples
/// ```
/// use flowshark_core::{DecodeConfig, make_stub_report};
///
/// let report = make_stub_report("capture.pcapng", 123, &DecodeConfig::default());
/// assert_eq!(report.report_version, flowshark_core::REPORT_VERSION);
/// assert!(report.messages.is_empty());
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// Report schema version (not the binary version).
    pub report_version: u32,
    pub tool: ToolInfo,
    /// RFC3339 time of the last captured packet.
    pub generated_at: String,
    pub input: InputInfo,
    /// Settings the capture was decoded with.
    pub config: DecodeConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capture_summary: Option<CaptureSummary>,
    /// Per-exporter summaries ordered by address, then source id.
    pub exporters: Vec<ExporterSummary>,
    /// Decoded messages in capture order.
    pub messages: Vec<MessageReport>,
    /// Datagrams that failed to decode, in capture order.
    pub failures: Vec<DecodeFailure>,
    /// Aggregated violations, errors first, then by id.
    pub violations: Vec<Violation>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolInfo {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct InputInfo {
    /// Input path as provided to the analyzer.
    pub path: String,
    pub bytes: u64,
}

/// Packet counts and capture time bounds.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CaptureSummary {
    pub packets_total: u64,
    pub udp_datagrams: u64,
    /// UDP payloads selected for NetFlow decoding.
    pub netflow_datagrams: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_end: Option<String>,
}

/// Counters for one exporter, identified by address and source id.
#[derive(Debug, Clone, Serialize)]
pub struct ExporterSummary {
    pub address: String,
    pub source_id: u32,
    pub messages: u64,
    pub template_flowsets: u64,
    pub data_flowsets: u64,
    /// Data flowsets discarded because their template was not in the datagram.
    pub dropped_flowsets: u64,
    /// Records interpreted without error.
    pub records: u64,
    /// Jumps forward in the export sequence counter.
    pub sequence_gaps: u64,
    /// Export packets skipped over by those jumps.
    pub missed_sequences: u64,
    /// Packets whose sequence number went backwards or repeated.
    pub out_of_order: u64,
}

/// A decoded message in fixture form, plus timing and interpreted records.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageReport {
    #[serde(flatten)]
    pub message: MessageRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub captured_at: Option<String>,
    /// Header export time as RFC3339.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exported_at: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub records: Vec<RecordReport>,
}

/// One interpreted data record.
#[derive(Debug, Clone, Serialize)]
pub struct RecordReport {
    #[serde(rename = "flowsetID")]
    pub flowset_id: u16,
    /// Position of the record within its flowset.
    pub index: usize,
    pub fields: Vec<FieldEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldEntry {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub type_id: u16,
    pub value: FieldValue,
}

/// A datagram the decoder rejected.
#[derive(Debug, Clone, Serialize)]
pub struct DecodeFailure {
    pub sender: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub captured_at: Option<String>,
    pub code: String,
    pub message: String,
}

/// Aggregated occurrences of one violation id.
///
/// # Examples
/// ```
/// use flowshark_core::Violation;
///
/// let violation = Violation {
///     id: "NFV9-UNKNOWN-FIELD".to_string(),
///     severity: "warning".to_string(),
///     message: "field type not in the field table".to_string(),
///     count: 1,
///     examples: vec!["sender 10.0.0.1:50000 @ 1970-01-01T00:00:00Z".to_string()],
/// };
/// assert_eq!(violation.count, 1);
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct Violation {
    /// Stable identifier such as `NFV9-MALFORMED-HEADER`.
    pub id: String,
    /// `error` or `warning`.
    pub severity: String,
    pub message: String,
    pub count: u64,
    /// First few occurrences, formatted as `sender ip:port @ ts: detail`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<String>,
}

/// Builds a report with base fields filled and empty aggregates.
pub fn make_stub_report(input_path: &str, input_bytes: u64, config: &DecodeConfig) -> Report {
    Report {
        report_version: REPORT_VERSION,
        tool: ToolInfo {
            name: "flowshark".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        generated_at: DEFAULT_GENERATED_AT.to_string(),
        input: InputInfo {
            path: input_path.to_string(),
            bytes: input_bytes,
        },
        config: config.clone(),
        capture_summary: None,
        exporters: Vec::new(),
        messages: Vec::new(),
        failures: Vec::new(),
        violations: Vec::new(),
    }
}
