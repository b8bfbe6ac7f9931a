mod exporters;
mod records;
mod udp;
mod violations;

use std::fmt::Display;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use thiserror::Error;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tracing::{debug, warn};

pub use records::{InterpretedRecords, RecordFailure, interpret_message, message_report};
pub use udp::{UdpDatagram, UdpError, parse_udp_datagram};

use crate::config::DecodeConfig;
use crate::protocols::netflow_v9::{Decoded, Diagnostic, decode_datagram};
use crate::source::{PacketEvent, PacketSource, PcapFileSource, SourceError};
use crate::{
    CaptureSummary, DEFAULT_GENERATED_AT, DecodeFailure, MessageReport, Report, make_stub_report,
};
use exporters::ExporterTable;
use violations::ViolationLog;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("source error: {0}")]
    Source(#[from] SourceError),
}

pub fn analyze_pcap_file(path: &Path, config: &DecodeConfig) -> Result<Report, AnalysisError> {
    let source = PcapFileSource::open(path)?;
    analyze_source(path, source, config)
}

pub fn analyze_source<S: PacketSource>(
    path: &Path,
    mut source: S,
    config: &DecodeConfig,
) -> Result<Report, AnalysisError> {
    let mut analysis = Analysis::new(config);
    while let Some(event) = source.next_packet()? {
        analysis.observe(&event);
    }

    let mut report = make_stub_report(&path.display().to_string(), path.metadata()?.len(), config);
    analysis.finish(&mut report);
    Ok(report)
}

struct Analysis<'c> {
    config: &'c DecodeConfig,
    summary: CaptureSummary,
    first_ts: Option<Duration>,
    last_ts: Option<Duration>,
    exporters: ExporterTable,
    messages: Vec<MessageReport>,
    failures: Vec<DecodeFailure>,
    violations: ViolationLog,
}

impl<'c> Analysis<'c> {
    fn new(config: &'c DecodeConfig) -> Self {
        Self {
            config,
            summary: CaptureSummary::default(),
            first_ts: None,
            last_ts: None,
            exporters: ExporterTable::default(),
            messages: Vec::new(),
            failures: Vec::new(),
            violations: ViolationLog::new(config.max_examples),
        }
    }

    fn observe(&mut self, event: &PacketEvent) {
        self.summary.packets_total += 1;
        if let Some(ts) = event.timestamp {
            self.first_ts = Some(self.first_ts.map_or(ts, |first| first.min(ts)));
            self.last_ts = Some(self.last_ts.map_or(ts, |last| last.max(ts)));
        }

        let datagram = match parse_udp_datagram(event.linktype, &event.data) {
            Ok(Some(datagram)) => datagram,
            Ok(None) => {
                debug!("skipping frame without UDP");
                return;
            }
            Err(err) => {
                debug!(%err, "skipping undecodable frame");
                return;
            }
        };
        self.summary.udp_datagrams += 1;

        if !self
            .config
            .selects(datagram.destination.port(), datagram.payload)
        {
            debug!(destination = %datagram.destination, "skipping non-NetFlow payload");
            return;
        }
        self.summary.netflow_datagrams += 1;

        let captured_at = event.timestamp.and_then(rfc3339);
        match decode_datagram(datagram.payload, datagram.source, datagram.destination) {
            Ok(Some(decoded)) => self.observe_message(decoded, captured_at),
            Ok(None) => debug!(sender = %datagram.source, "empty datagram"),
            Err(err) => {
                warn!(sender = %datagram.source, code = err.code(), "{err}");
                self.violations.record(err.code(), || {
                    example(datagram.source, captured_at.as_deref(), &err)
                });
                self.failures.push(DecodeFailure {
                    sender: datagram.source.to_string(),
                    captured_at,
                    code: err.code().to_string(),
                    message: err.to_string(),
                });
            }
        }
    }

    fn observe_message(&mut self, decoded: Decoded, captured_at: Option<String>) {
        let Decoded {
            message,
            diagnostics,
        } = decoded;
        let sender = message.header().sender;
        let at = captured_at.as_deref();

        let dropped = diagnostics
            .iter()
            .filter(|d| matches!(d, Diagnostic::UnresolvedTemplateReference { .. }))
            .count() as u64;
        self.exporters.observe(&message, dropped);

        let interpreted = interpret_message(&message, self.config);
        for diagnostic in diagnostics.iter().chain(&interpreted.diagnostics) {
            self.violations
                .record(diagnostic.code(), || example(sender, at, diagnostic));
        }
        for failure in &interpreted.failures {
            self.violations
                .record(failure.error.code(), || example(sender, at, &failure.error));
        }
        self.exporters
            .add_records(&message, interpreted.records.len() as u64);

        self.messages
            .push(message_report(&message, interpreted.records, captured_at));
    }

    fn finish(self, report: &mut Report) {
        let mut summary = self.summary;
        summary.time_start = self.first_ts.and_then(rfc3339);
        summary.time_end = self.last_ts.and_then(rfc3339);
        report.generated_at = summary
            .time_end
            .clone()
            .or_else(|| summary.time_start.clone())
            .unwrap_or_else(|| DEFAULT_GENERATED_AT.to_string());
        report.capture_summary = Some(summary);
        report.exporters = self.exporters.into_summaries();
        report.messages = self.messages;
        report.failures = self.failures;
        report.violations = self.violations.into_violations();
    }
}

fn example(sender: SocketAddr, at: Option<&str>, detail: &dyn Display) -> String {
    format!("sender {sender} @ {}: {detail}", at.unwrap_or("unknown time"))
}

fn rfc3339(since_epoch: Duration) -> Option<String> {
    let nanos = i128::try_from(since_epoch.as_nanos()).ok()?;
    OffsetDateTime::from_unix_timestamp_nanos(nanos)
        .ok()?
        .format(&Rfc3339)
        .ok()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{example, rfc3339};

    #[test]
    fn formats_epoch_durations() {
        assert_eq!(
            rfc3339(Duration::from_secs(0)).as_deref(),
            Some("1970-01-01T00:00:00Z")
        );
        assert_eq!(
            rfc3339(Duration::from_millis(1_500)).as_deref(),
            Some("1970-01-01T00:00:01.5Z")
        );
    }

    #[test]
    fn examples_name_sender_and_time() {
        let sender = "10.0.0.1:50000".parse().unwrap();
        assert_eq!(
            example(sender, None, &"boom"),
            "sender 10.0.0.1:50000 @ unknown time: boom"
        );
    }
}
