//! Sequential little-endian reads over a byte slice.
//!
//! [`ByteReader`] is the cursor every Cronos decoder is built on. All
//! multi-byte integers in the format are little-endian, and names are
//! stored as a one-byte length followed by CP1251 text.

use byteorder::{ByteOrder, LittleEndian};

use crate::CroError;

/// A forward-only cursor over a borrowed byte slice.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        ByteReader { data, pos: 0 }
    }

    /// Current offset from the start of the slice.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Number of unread bytes.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Consume exactly `n` bytes, or fail with [`CroError::TruncatedBlob`].
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], CroError> {
        if n > self.remaining() {
            return Err(CroError::TruncatedBlob {
                offset: self.pos,
                needed: n,
                available: self.remaining(),
            });
        }
        let out = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    /// Consume everything that is left.
    pub fn read_rest(&mut self) -> &'a [u8] {
        let out = &self.data[self.pos..];
        self.pos = self.data.len();
        out
    }

    pub fn peek_u8(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    pub fn read_u8(&mut self) -> Result<u8, CroError> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, CroError> {
        Ok(LittleEndian::read_u16(self.read_bytes(2)?))
    }

    pub fn read_u32(&mut self) -> Result<u32, CroError> {
        Ok(LittleEndian::read_u32(self.read_bytes(4)?))
    }

    pub fn read_u64(&mut self) -> Result<u64, CroError> {
        Ok(LittleEndian::read_u64(self.read_bytes(8)?))
    }

    /// Read a length-prefixed name (u8 length, then CP1251 bytes).
    pub fn read_name(&mut self) -> Result<String, CroError> {
        let len = self.read_u8()? as usize;
        let raw = self.read_bytes(len)?;
        Ok(decode_cp1251(raw))
    }

    /// Read up to the next `separator`, consuming the separator.
    ///
    /// When no separator follows, the rest of the slice is returned.
    pub fn read_to_separator(&mut self, separator: u8) -> &'a [u8] {
        let rest = &self.data[self.pos..];
        match rest.iter().position(|&b| b == separator) {
            Some(idx) => {
                self.pos += idx + 1;
                &rest[..idx]
            }
            None => self.read_rest(),
        }
    }
}

/// Decode CP1251 text.
///
/// ASCII maps to itself and `0xC0..=0xFF` maps to the contiguous Cyrillic
/// block U+0410..U+044F. The remaining high bytes are rare in names and are
/// replaced with U+FFFD.
pub fn decode_cp1251(raw: &[u8]) -> String {
    raw.iter()
        .map(|&b| match b {
            0x00..=0x7f => b as char,
            0xc0..=0xff => char::from_u32(0x0410 + (b - 0xc0) as u32).unwrap_or('\u{fffd}'),
            0xa8 => 'Ё',
            0xb8 => 'ё',
            _ => '\u{fffd}',
        })
        .collect()
}
