//! Key/value definition blob decoding.
//!
//! Cronos describes both the whole database and each table with the same
//! self-describing structure: a flat sequence of entries, each a
//! length-prefixed name followed by a 32-bit descriptor. Bit 31 of the
//! descriptor selects between an inline value (the low 31 bits are a byte
//! count and the bytes follow immediately) and a reference (the low 31 bits
//! are a record number in the structure store, whose payload starts with tag
//! byte `0x04`).
//!
//! [`Descriptor`] keeps that rule in one place; [`decode_definition`] walks a
//! blob and resolves references through a caller-supplied closure, so the
//! decoder can be exercised without a record store.

use serde::Serialize;

use crate::cronos::constants::*;
use crate::cronos::diagnostics::{Diagnostic, Diagnostics};
use crate::cronos::reader::ByteReader;
use crate::CroError;

/// Where the value of a definition entry lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Descriptor {
    /// The value is the next `len` bytes of the blob.
    Inline(u32),
    /// The value is the payload of this structure record, minus its tag byte.
    Reference(u32),
}

impl Descriptor {
    /// Classify a raw descriptor word.
    ///
    /// # Examples
    ///
    /// ```
    /// use cro::cronos::definition::Descriptor;
    ///
    /// assert_eq!(Descriptor::from_raw(0x8000_0005), Descriptor::Inline(5));
    /// assert_eq!(Descriptor::from_raw(0x0000_0002), Descriptor::Reference(2));
    /// assert_eq!(Descriptor::Inline(5).to_raw(), 0x8000_0005);
    /// ```
    pub fn from_raw(raw: u32) -> Self {
        if raw & DESCRIPTOR_INLINE_FLAG != 0 {
            Descriptor::Inline(raw & DESCRIPTOR_VALUE_MASK)
        } else {
            Descriptor::Reference(raw & DESCRIPTOR_VALUE_MASK)
        }
    }

    /// Inverse of [`Descriptor::from_raw`] for values that fit in 31 bits.
    pub fn to_raw(self) -> u32 {
        match self {
            Descriptor::Inline(len) => DESCRIPTOR_INLINE_FLAG | (len & DESCRIPTOR_VALUE_MASK),
            Descriptor::Reference(rec) => rec & DESCRIPTOR_VALUE_MASK,
        }
    }
}

/// A decoded definition: field names mapped to raw values, in blob order.
///
/// Lookup is linear; definitions hold a few dozen entries at most.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Definition {
    entries: Vec<DefinitionEntry>,
}

/// One key/value pair of a [`Definition`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DefinitionEntry {
    pub key: String,
    #[serde(serialize_with = "serialize_hex")]
    pub value: Vec<u8>,
}

fn serialize_hex<S: serde::Serializer>(value: &[u8], s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&crate::util::hex::format_bytes(value))
}

impl Definition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite `key`. An overwritten entry keeps its original
    /// position. Returns true when the key was already present.
    pub fn insert(&mut self, key: String, value: Vec<u8>) -> bool {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.key == key) {
            entry.value = value;
            return true;
        }
        self.entries.push(DefinitionEntry { key, value });
        false
    }

    pub fn get(&self, key: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|e| e.key == key)
            .map(|e| e.value.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.entries
            .iter()
            .map(|e| (e.key.as_str(), e.value.as_slice()))
    }

    pub fn entries(&self) -> &[DefinitionEntry] {
        &self.entries
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.key.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Decode a definition blob.
///
/// `resolve_reference` maps a structure record number to its payload
/// (`None` for an absent record); its errors propagate unchanged. Tag
/// mismatches and duplicate keys are pushed to `diagnostics`.
///
/// # Errors
///
/// Returns [`CroError::TruncatedBlob`] when an entry's name, descriptor or
/// inline value runs past the end of `blob`. No partial entry is kept.
///
/// # Examples
///
/// ```
/// use cro::cronos::definition::decode_definition;
/// use cro::cronos::diagnostics::Diagnostics;
///
/// let mut blob = vec![4];
/// blob.extend_from_slice(b"Name");
/// blob.extend_from_slice(&0x8000_0003u32.to_le_bytes());
/// blob.extend_from_slice(b"abc");
///
/// let mut diags = Diagnostics::new();
/// let def = decode_definition(&blob, |_| Ok(None), &mut diags).unwrap();
/// assert_eq!(def.get("Name"), Some(&b"abc"[..]));
/// assert!(diags.is_empty());
/// ```
pub fn decode_definition<F>(
    blob: &[u8],
    mut resolve_reference: F,
    diagnostics: &mut Diagnostics,
) -> Result<Definition, CroError>
where
    F: FnMut(u32) -> Result<Option<Vec<u8>>, CroError>,
{
    let mut rd = ByteReader::new(blob);
    let mut definition = Definition::new();

    while !rd.at_end() {
        let key = rd.read_name()?;
        let descriptor = Descriptor::from_raw(rd.read_u32()?);

        let value = match descriptor {
            Descriptor::Inline(len) => rd.read_bytes(len as usize)?.to_vec(),
            Descriptor::Reference(record) => {
                let data = resolve_reference(record)?.unwrap_or_default();
                let context = format!("referenced record {} for {}", record, key);
                diagnostics.expect_tag(&context, TAG_REFERENCED_VALUE, &data);
                data.get(1..).map(<[u8]>::to_vec).unwrap_or_default()
            }
        };

        if definition.insert(key.clone(), value) {
            diagnostics.push(Diagnostic::DuplicateKey { key });
        }
    }

    Ok(definition)
}
