//! Bounds-checked reading and writing of legacy transaction primitives.

use crate::error::ParseError;

/// A forward-only cursor over untrusted bytes.
///
/// Every read checks the remaining length first; arithmetic never wraps.
pub struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Current offset from the start of the buffer.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Take the next `n` bytes.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], ParseError> {
        if n > self.remaining() {
            return Err(ParseError::Truncated {
                offset: self.pos,
                needed: n,
                available: self.remaining(),
            });
        }
        let out = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], ParseError> {
        let mut arr = [0u8; N];
        arr.copy_from_slice(self.read_bytes(N)?);
        Ok(arr)
    }

    pub fn read_u8(&mut self) -> Result<u8, ParseError> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_u16_le(&mut self) -> Result<u16, ParseError> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    pub fn read_u32_le(&mut self) -> Result<u32, ParseError> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    pub fn read_u64_le(&mut self) -> Result<u64, ParseError> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    /// Read a Bitcoin compact-size integer (1, 3, 5 or 9 bytes).
    pub fn read_varint(&mut self) -> Result<u64, ParseError> {
        match self.read_u8()? {
            0xfd => Ok(u64::from(self.read_u16_le()?)),
            0xfe => Ok(u64::from(self.read_u32_le()?)),
            0xff => self.read_u64_le(),
            n => Ok(u64::from(n)),
        }
    }

    /// Read a compact-size integer used as a byte length.
    pub fn read_varint_len(&mut self) -> Result<usize, ParseError> {
        let n = self.read_varint()?;
        usize::try_from(n).map_err(|_| ParseError::VarIntOverflow(n))
    }

    /// Read a compact-size length prefix followed by that many bytes.
    pub fn read_var_bytes(&mut self) -> Result<&'a [u8], ParseError> {
        let len = self.read_varint_len()?;
        self.read_bytes(len)
    }
}

/// Append a compact-size integer.
pub fn write_varint(buf: &mut Vec<u8>, n: u64) {
    if n < 0xfd {
        buf.push(n as u8);
    } else if n <= 0xffff {
        buf.push(0xfd);
        buf.extend_from_slice(&(n as u16).to_le_bytes());
    } else if n <= 0xffff_ffff {
        buf.push(0xfe);
        buf.extend_from_slice(&(n as u32).to_le_bytes());
    } else {
        buf.push(0xff);
        buf.extend_from_slice(&n.to_le_bytes());
    }
}

/// Encoded size of a compact-size integer.
pub fn varint_len(n: u64) -> usize {
    match n {
        0..=0xfc => 1,
        0xfd..=0xffff => 3,
        0x1_0000..=0xffff_ffff => 5,
        _ => 9,
    }
}

/// Decode a hex string into bytes, tolerating a `0x` prefix.
pub fn decode_hex(s: &str) -> Result<Vec<u8>, ParseError> {
    let trimmed = s.trim();
    let trimmed = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    hex::decode(trimmed).map_err(|e| ParseError::InvalidHex(e.to_string()))
}
