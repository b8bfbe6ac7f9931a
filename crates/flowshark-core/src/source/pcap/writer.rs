use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::net::SocketAddrV4;
use std::path::Path;
use std::time::Duration;

use etherparse::PacketBuilder;

use super::layout;

/// A link-layer frame and its capture time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedFrame {
    pub timestamp: Duration,
    pub data: Vec<u8>,
}

/// Writes a single-interface Ethernet PCAPNG stream with microsecond
/// timestamps, in big-endian byte order.
pub struct PcapNgWriter<W: Write> {
    out: W,
}

impl<W: Write> PcapNgWriter<W> {
    /// Writes the section header and interface description blocks.
    pub fn new(mut out: W) -> io::Result<Self> {
        let mut section = Vec::new();
        section.extend_from_slice(&layout::BYTE_ORDER_MAGIC.to_be_bytes());
        section.extend_from_slice(&layout::PCAPNG_VERSION.0.to_be_bytes());
        section.extend_from_slice(&layout::PCAPNG_VERSION.1.to_be_bytes());
        section.extend_from_slice(&layout::SECTION_LENGTH_UNSPECIFIED.to_be_bytes());
        write_block(&mut out, layout::BLOCK_TYPE_SECTION_HEADER, &section)?;

        let mut interface = Vec::new();
        interface.extend_from_slice(&layout::LINKTYPE_ETHERNET.to_be_bytes());
        interface.extend_from_slice(&0u16.to_be_bytes());
        interface.extend_from_slice(&layout::WRITER_SNAPLEN.to_be_bytes());
        write_block(&mut out, layout::BLOCK_TYPE_INTERFACE_DESCRIPTION, &interface)?;

        Ok(Self { out })
    }

    pub fn write_frame(&mut self, frame: &CapturedFrame) -> io::Result<()> {
        let micros = u64::try_from(frame.timestamp.as_micros()).unwrap_or(u64::MAX);
        let len = u32::try_from(frame.data.len())
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "frame too large"))?;

        let mut body = Vec::with_capacity(20 + frame.data.len() + layout::BLOCK_ALIGNMENT);
        body.extend_from_slice(&0u32.to_be_bytes());
        body.extend_from_slice(&((micros >> 32) as u32).to_be_bytes());
        body.extend_from_slice(&(micros as u32).to_be_bytes());
        body.extend_from_slice(&len.to_be_bytes());
        body.extend_from_slice(&len.to_be_bytes());
        body.extend_from_slice(&frame.data);
        body.resize(body.len().next_multiple_of(layout::BLOCK_ALIGNMENT), 0);
        write_block(&mut self.out, layout::BLOCK_TYPE_ENHANCED_PACKET, &body)
    }

    pub fn finish(mut self) -> io::Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}

fn write_block<W: Write>(out: &mut W, block_type: u32, body: &[u8]) -> io::Result<()> {
    let total = u32::try_from(layout::BLOCK_FRAMING_LEN + body.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "block too large"))?;
    out.write_all(&block_type.to_be_bytes())?;
    out.write_all(&total.to_be_bytes())?;
    out.write_all(body)?;
    out.write_all(&total.to_be_bytes())
}

/// Writes `frames` to a new PCAPNG file at `path`.
pub fn write_pcapng(path: &Path, frames: &[CapturedFrame]) -> io::Result<()> {
    let mut writer = PcapNgWriter::new(BufWriter::new(File::create(path)?))?;
    for frame in frames {
        writer.write_frame(frame)?;
    }
    writer.finish()?;
    Ok(())
}

/// Wraps `payload` in Ethernet, IPv4 and UDP headers with valid checksums.
///
/// # Examples
/// ```
/// use flowshark_core::build_ipv4_udp_frame;
///
/// let frame = build_ipv4_udp_frame(
///     "10.0.0.1:50000".parse().unwrap(),
///     "10.0.0.2:2055".parse().unwrap(),
///     &[0, 9],
/// )?;
/// assert_eq!(frame.len(), 14 + 20 + 8 + 2);
/// # Ok::<(), std::io::Error>(())
/// ```
pub fn build_ipv4_udp_frame(
    source: SocketAddrV4,
    destination: SocketAddrV4,
    payload: &[u8],
) -> io::Result<Vec<u8>> {
    let builder = PacketBuilder::ethernet2(layout::FRAME_SOURCE_MAC, layout::FRAME_DESTINATION_MAC)
        .ipv4(
            source.ip().octets(),
            destination.ip().octets(),
            layout::FRAME_TTL,
        )
        .udp(source.port(), destination.port());
    let mut frame = Vec::with_capacity(builder.size(payload.len()));
    builder
        .write(&mut frame, payload)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;
    Ok(frame)
}
