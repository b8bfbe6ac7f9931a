//! PCAP and PCAPNG capture files.
//!
//! [`PcapFileSource`] reads both formats into packet events.
//! [`PcapNgWriter`] produces minimal PCAPNG files for fixtures and tests.

pub mod layout;
pub mod parser;
pub mod reader;
pub mod writer;

pub use parser::PcapFileSource;
pub use writer::{CapturedFrame, PcapNgWriter, build_ipv4_udp_frame, write_pcapng};
