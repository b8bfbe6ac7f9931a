//! Packet sources feeding the analysis layer.
//!
//! All capture I/O lives here; the rest of the crate only sees
//! [`PacketEvent`]s.

pub mod pcap;

use std::time::Duration;

pub use pcap::{CapturedFrame, PcapFileSource, PcapNgWriter, build_ipv4_udp_frame, write_pcapng};
use pcap_parser::Linktype;
use thiserror::Error;

/// One captured link-layer frame.
#[derive(Debug, Clone)]
pub struct PacketEvent {
    /// Capture time since the Unix epoch, when the format records one.
    pub timestamp: Option<Duration>,
    pub linktype: Linktype,
    pub data: Vec<u8>,
}

pub trait PacketSource {
    fn next_packet(&mut self) -> Result<Option<PacketEvent>, SourceError>;
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("capture parse error ({context}): {message}")]
    Pcap {
        context: &'static str,
        message: String,
    },
}

impl SourceError {
    pub(crate) fn pcap(context: &'static str, err: impl std::fmt::Display) -> Self {
        SourceError::Pcap {
            context,
            message: err.to_string(),
        }
    }
}
