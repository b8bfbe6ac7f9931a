use std::io::{Read, Seek, SeekFrom};
use std::time::Duration;

use pcap_parser::{Block, Linktype, PcapBlockOwned};

use super::layout;
use crate::source::{PacketEvent, SourceError};

/// Container format of a capture file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureFormat {
    Legacy,
    PcapNg,
}

/// Reads the leading magic and rewinds so the format reader starts at 0.
///
/// # Errors
/// Returns `SourceError::Io` when fewer than four bytes can be read.
pub fn sniff_format<R: Read + Seek>(reader: &mut R) -> Result<CaptureFormat, SourceError> {
    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic)?;
    reader.seek(SeekFrom::Start(0))?;
    Ok(if magic == layout::PCAPNG_MAGIC {
        CaptureFormat::PcapNg
    } else {
        CaptureFormat::Legacy
    })
}

/// Timestamp units per second for a PCAPNG `if_tsresol` value.
///
/// The high bit selects a power of two, otherwise a power of ten. Returns
/// `None` when the resolution does not fit in 64 bits.
pub fn units_per_second(tsresol: u8) -> Option<u64> {
    let exponent = u32::from(tsresol & 0x7f);
    if tsresol & 0x80 != 0 {
        1u64.checked_shl(exponent)
    } else {
        10u64.checked_pow(exponent)
    }
}

pub fn units_to_duration(units: u64, per_second: u64) -> Duration {
    let secs = units / per_second;
    let rem = u128::from(units % per_second);
    let nanos = rem * 1_000_000_000 / u128::from(per_second);
    Duration::new(secs, nanos as u32)
}

#[derive(Debug, Clone, Copy)]
struct Interface {
    linktype: Linktype,
    units_per_second: u64,
}

/// Per-file state needed to turn capture blocks into packet events.
#[derive(Debug, Default)]
pub struct BlockState {
    interfaces: Vec<Interface>,
    nanosecond: bool,
}

impl BlockState {
    /// Consumes one block, returning a packet event when it carries a frame.
    pub fn observe(&mut self, block: PcapBlockOwned<'_>) -> Option<PacketEvent> {
        match block {
            PcapBlockOwned::LegacyHeader(header) => {
                self.nanosecond = header.is_nanosecond_precision();
                self.interfaces = vec![Interface {
                    linktype: header.network,
                    units_per_second: 0,
                }];
                None
            }
            PcapBlockOwned::Legacy(packet) => {
                let fraction = if self.nanosecond {
                    packet.ts_usec
                } else {
                    packet.ts_usec.saturating_mul(1_000)
                };
                Some(PacketEvent {
                    timestamp: Some(Duration::new(u64::from(packet.ts_sec), fraction)),
                    linktype: self.linktype(0),
                    data: packet.data.to_vec(),
                })
            }
            PcapBlockOwned::NG(Block::SectionHeader(_)) => {
                self.interfaces.clear();
                None
            }
            PcapBlockOwned::NG(Block::InterfaceDescription(intf)) => {
                self.interfaces.push(Interface {
                    linktype: intf.linktype,
                    units_per_second: units_per_second(intf.if_tsresol).unwrap_or(0),
                });
                None
            }
            PcapBlockOwned::NG(Block::EnhancedPacket(packet)) => {
                let units = (u64::from(packet.ts_high) << 32) | u64::from(packet.ts_low);
                let timestamp = self
                    .interfaces
                    .get(packet.if_id as usize)
                    .map(|intf| intf.units_per_second)
                    .filter(|per_second| *per_second > 0)
                    .map(|per_second| units_to_duration(units, per_second));
                Some(PacketEvent {
                    timestamp,
                    linktype: self.linktype(packet.if_id),
                    data: packet.data.to_vec(),
                })
            }
            PcapBlockOwned::NG(Block::SimplePacket(packet)) => Some(PacketEvent {
                timestamp: None,
                linktype: self.linktype(0),
                data: packet.data.to_vec(),
            }),
            _ => None,
        }
    }

    /// Link type of an interface, Ethernet when it was never described.
    fn linktype(&self, if_id: u32) -> Linktype {
        self.interfaces
            .get(if_id as usize)
            .map_or(Linktype::ETHERNET, |intf| intf.linktype)
    }
}
