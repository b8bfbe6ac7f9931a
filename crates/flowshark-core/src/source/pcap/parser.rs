use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use pcap_parser::traits::PcapReaderIterator;
use pcap_parser::{LegacyPcapReader, PcapError, PcapNGReader};

use super::layout::PCAP_READER_BUFFER_SIZE;
use super::reader::{BlockState, CaptureFormat, sniff_format};
use crate::source::{PacketEvent, PacketSource, SourceError};

/// Packet source over a legacy PCAP or PCAPNG file.
pub struct PcapFileSource {
    reader: Box<dyn PcapReaderIterator>,
    state: BlockState,
}

impl PcapFileSource {
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let mut file = File::open(path)?;
        let format = sniff_format(&mut file)?;
        let file = BufReader::new(file);
        let reader: Box<dyn PcapReaderIterator> = match format {
            CaptureFormat::PcapNg => Box::new(
                PcapNGReader::new(PCAP_READER_BUFFER_SIZE, file)
                    .map_err(|e| SourceError::pcap("pcapng reader init", e))?,
            ),
            CaptureFormat::Legacy => Box::new(
                LegacyPcapReader::new(PCAP_READER_BUFFER_SIZE, file)
                    .map_err(|e| SourceError::pcap("pcap reader init", e))?,
            ),
        };
        Ok(Self {
            reader,
            state: BlockState::default(),
        })
    }
}

impl PacketSource for PcapFileSource {
    fn next_packet(&mut self) -> Result<Option<PacketEvent>, SourceError> {
        loop {
            match self.reader.next() {
                Ok((offset, block)) => {
                    let event = self.state.observe(block);
                    self.reader.consume(offset);
                    if event.is_some() {
                        return Ok(event);
                    }
                }
                Err(PcapError::Eof) => return Ok(None),
                Err(PcapError::Incomplete(_)) => {
                    self.reader
                        .refill()
                        .map_err(|e| SourceError::pcap("capture refill", e))?;
                }
                Err(e) => return Err(SourceError::pcap("capture block", e)),
            }
        }
    }
}
