//! KOD substitution decoding for record payloads.
//!
//! Stores whose header encoding has bit 0 set keep every record payload
//! behind a byte substitution: each byte is mapped through a 256-entry
//! permutation table and then shifted by its position within the record
//! and by the record number. The table itself is not stored in the
//! database, so it is loaded from a 256-byte file supplied by the user.

use std::path::Path;

use crate::CroError;

/// Size of a KOD substitution table.
pub const KOD_TABLE_SIZE: usize = 256;

/// A validated KOD substitution table.
#[derive(Debug, Clone)]
pub struct KodTable {
    table: [u8; KOD_TABLE_SIZE],
}

impl KodTable {
    /// Load a table from a raw 256-byte file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CroError> {
        let path = path.as_ref();
        let data = std::fs::read(path)
            .map_err(|e| CroError::Io(format!("Cannot read KOD table {}: {}", path.display(), e)))?;
        Self::from_bytes(&data)
    }

    /// Build a table from raw bytes, checking it is a permutation of 0..=255.
    pub fn from_bytes(data: &[u8]) -> Result<Self, CroError> {
        if data.len() != KOD_TABLE_SIZE {
            return Err(CroError::Parse(format!(
                "KOD table must be {} bytes, got {}",
                KOD_TABLE_SIZE,
                data.len()
            )));
        }

        let mut seen = [false; KOD_TABLE_SIZE];
        for &b in data {
            if seen[b as usize] {
                return Err(CroError::Parse(format!(
                    "KOD table is not a permutation: 0x{:02x} occurs twice",
                    b
                )));
            }
            seen[b as usize] = true;
        }

        let mut table = [0u8; KOD_TABLE_SIZE];
        table.copy_from_slice(data);
        Ok(KodTable { table })
    }

    /// Decode the payload of record `index` in place.
    pub fn decode(&self, index: u32, data: &mut [u8]) {
        let shift = index as u8;
        for (i, byte) in data.iter_mut().enumerate() {
            *byte = self.table[*byte as usize]
                .wrapping_sub(i as u8)
                .wrapping_sub(shift);
        }
    }

    /// Inverse of [`KodTable::decode`].
    pub fn encode(&self, index: u32, data: &mut [u8]) {
        let mut inverse = [0u8; KOD_TABLE_SIZE];
        for (i, &b) in self.table.iter().enumerate() {
            inverse[b as usize] = i as u8;
        }
        let shift = index as u8;
        for (i, byte) in data.iter_mut().enumerate() {
            *byte = inverse[byte.wrapping_add(i as u8).wrapping_add(shift) as usize];
        }
    }
}
