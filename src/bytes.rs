//! Little-endian cursor over an index file.

use crate::error::{IndexError, Result};

pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(IndexError::Truncated {
                offset: self.pos,
                needed: n - self.remaining(),
            });
        }
        let out = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub fn read_u24(&mut self) -> Result<u32> {
        let b = self.take(3)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], 0]))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Fails unless every byte has been consumed.
    pub fn finish(self) -> Result<()> {
        match self.remaining() {
            0 => Ok(()),
            count => Err(IndexError::TrailingBytes {
                offset: self.pos,
                count,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_little_endian() {
        let data = [0x2D, 0x4E, 0x00, 0x34, 0x12, 0x07, 1, 0, 0, 0];
        let mut c = ByteCursor::new(&data);
        assert_eq!(c.read_u24().unwrap(), 0x4E2D);
        assert_eq!(c.read_u16().unwrap(), 0x1234);
        assert_eq!(c.read_u8().unwrap(), 7);
        assert_eq!(c.read_u32().unwrap(), 1);
        c.finish().unwrap();
    }

    #[test]
    fn reports_truncation() {
        let data = [1u8, 2];
        let mut c = ByteCursor::new(&data);
        assert!(matches!(
            c.read_u32(),
            Err(IndexError::Truncated {
                offset: 0,
                needed: 2
            })
        ));
    }
}
