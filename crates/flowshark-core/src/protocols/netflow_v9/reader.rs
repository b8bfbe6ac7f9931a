use std::ops::Range;

use super::error::Truncated;

pub struct NetFlowReader<'a> {
    payload: &'a [u8],
    position: usize,
}

impl<'a> NetFlowReader<'a> {
    pub fn new(payload: &'a [u8]) -> Self {
        Self {
            payload,
            position: 0,
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn remaining(&self) -> usize {
        self.payload.len() - self.position
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    pub fn require_remaining(&self, needed: usize) -> Result<(), Truncated> {
        if self.remaining() < needed {
            return Err(Truncated {
                needed: self.position + needed,
                actual: self.payload.len(),
            });
        }
        Ok(())
    }

    pub fn read_u16_be(&mut self) -> Result<u16, Truncated> {
        let bytes = self.read_slice(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_u32_be(&mut self) -> Result<u32, Truncated> {
        let bytes = self.read_slice(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn read_u16_be_at(&self, range: Range<usize>) -> Result<u16, Truncated> {
        let bytes = self.slice_at(range.clone())?;
        let bytes = bytes.try_into().map_err(|_| self.truncated_at(range))?;
        Ok(u16::from_be_bytes(bytes))
    }

    pub fn read_u32_be_at(&self, range: Range<usize>) -> Result<u32, Truncated> {
        let bytes = self.slice_at(range.clone())?;
        let bytes = bytes.try_into().map_err(|_| self.truncated_at(range))?;
        Ok(u32::from_be_bytes(bytes))
    }

    pub fn slice_at(&self, range: Range<usize>) -> Result<&'a [u8], Truncated> {
        self.payload
            .get(range.clone())
            .ok_or_else(|| self.truncated_at(range))
    }

    fn truncated_at(&self, range: Range<usize>) -> Truncated {
        Truncated {
            needed: range.end,
            actual: self.payload.len(),
        }
    }

    pub fn read_slice(&mut self, len: usize) -> Result<&'a [u8], Truncated> {
        self.require_remaining(len)?;
        let start = self.position;
        self.position += len;
        Ok(&self.payload[start..self.position])
    }
}
