use super::error::UdpError;
use super::layout::{UDP_HEADER_LEN, UDP_LENGTH_RANGE};

pub struct UdpReader<'a> {
    segment: &'a [u8],
}

impl<'a> UdpReader<'a> {
    pub fn new(segment: &'a [u8]) -> Self {
        Self { segment }
    }

    // A length of zero (jumbogram) or below the header size means the rest
    // of the segment.
    pub fn payload(&self) -> Result<&'a [u8], UdpError> {
        let header = self
            .segment
            .get(..UDP_HEADER_LEN)
            .ok_or(UdpError::TooShort {
                needed: UDP_HEADER_LEN,
                actual: self.segment.len(),
            })?;
        let declared = usize::from(u16::from_be_bytes([
            header[UDP_LENGTH_RANGE.start],
            header[UDP_LENGTH_RANGE.start + 1],
        ]));
        let end = if declared < UDP_HEADER_LEN {
            self.segment.len()
        } else {
            declared
        };
        self.segment
            .get(UDP_HEADER_LEN..end)
            .ok_or(UdpError::TooShort {
                needed: end,
                actual: self.segment.len(),
            })
    }
}
