//! Writes sample NetFlow v9 captures for manual runs of `flowshark pcap decode`.
//!
//! Usage: `pcapng_fixtures [OUT_DIR]` (default `tests/fixtures/captures`).

use std::env;
use std::fs;
use std::net::SocketAddrV4;
use std::path::{Path, PathBuf};
use std::time::Duration;

use flowshark_core::{
    CapturedFrame, DatagramBuilder, FixtureError, build_ipv4_udp_frame, write_pcapng,
};

const EXPORTER: &str = "192.0.2.10:50000";
const COLLECTOR: &str = "192.0.2.1:2055";
const EXPORT_TIME: u32 = 1_700_000_000;

/// IPV4_SRC_ADDR, IPV4_DST_ADDR, L4_SRC_PORT, L4_DST_PORT, PROTOCOL, IN_BYTES, IN_PKTS.
const FLOW_TEMPLATE: [(u16, u16); 7] = [(8, 4), (12, 4), (7, 2), (11, 2), (4, 1), (1, 4), (2, 4)];

fn main() -> Result<(), String> {
    let root = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("tests/fixtures/captures"));
    fs::create_dir_all(&root)
        .map_err(|err| format!("failed to create {}: {}", root.display(), err))?;

    let built = |exports: Result<Vec<Vec<u8>>, FixtureError>| {
        exports.map_err(|err| format!("failed to build datagram: {err}"))
    };
    write_capture(&root.join("templated.pcapng"), &built(templated_exports())?)?;
    write_capture(&root.join("unresolved.pcapng"), &built(unresolved_exports())?)?;
    write_capture(&root.join("malformed.pcapng"), &built(malformed_exports())?)?;
    Ok(())
}

/// Template and data in every datagram, with a skipped sequence number.
fn templated_exports() -> Result<Vec<Vec<u8>>, FixtureError> {
    [1u32, 2, 4]
        .into_iter()
        .map(|sequence| {
            DatagramBuilder::new()
                .timestamp(EXPORT_TIME + sequence)
                .flow_sequence(sequence)
                .source_id(1)
                .template(256, &FLOW_TEMPLATE)
                .data(256, &flow_record(sequence as u8))
                .build()
        })
        .collect()
}

/// Data flowsets whose template only arrives in a later datagram.
fn unresolved_exports() -> Result<Vec<Vec<u8>>, FixtureError> {
    Ok(vec![
        DatagramBuilder::new()
            .timestamp(EXPORT_TIME)
            .flow_sequence(1)
            .data(256, &flow_record(1))
            .build()?,
        DatagramBuilder::new()
            .timestamp(EXPORT_TIME + 1)
            .flow_sequence(2)
            .template(256, &FLOW_TEMPLATE)
            .build()?,
    ])
}

fn malformed_exports() -> Result<Vec<Vec<u8>>, FixtureError> {
    // template 256 declares two fields but carries only one field type
    let short_template = DatagramBuilder::new()
        .timestamp(EXPORT_TIME)
        .raw_flowset(0, &[0x01, 0x00, 0x00, 0x02, 0x00, 0x08])
        .build()?;
    Ok(vec![vec![0x00, 0x09, 0x00, 0x01], short_template])
}

fn flow_record(host: u8) -> Vec<u8> {
    let mut record = Vec::new();
    record.extend_from_slice(&[10, 0, 0, host]);
    record.extend_from_slice(&[10, 0, 1, 1]);
    record.extend_from_slice(&40_000u16.to_be_bytes());
    record.extend_from_slice(&443u16.to_be_bytes());
    record.push(6);
    record.extend_from_slice(&1_500u32.to_be_bytes());
    record.extend_from_slice(&3u32.to_be_bytes());
    record
}

fn write_capture(path: &Path, payloads: &[Vec<u8>]) -> Result<(), String> {
    let exporter: SocketAddrV4 = EXPORTER.parse().map_err(|err| format!("{err}"))?;
    let collector: SocketAddrV4 = COLLECTOR.parse().map_err(|err| format!("{err}"))?;

    let frames = payloads
        .iter()
        .enumerate()
        .map(|(idx, payload)| {
            Ok(CapturedFrame {
                timestamp: Duration::from_secs(u64::from(EXPORT_TIME) + idx as u64),
                data: build_ipv4_udp_frame(exporter, collector, payload)
                    .map_err(|err| format!("failed to build frame: {err}"))?,
            })
        })
        .collect::<Result<Vec<_>, String>>()?;

    write_pcapng(path, &frames).map_err(|err| format!("failed to write {}: {}", path.display(), err))
}
