//! Row decoding for bank records.
//!
//! After the leading table-id byte, a bank record holds one value per field
//! of its table, in field order. Plain values are terminated by `0x1e`.
//! Values that may contain the separator (files, images, long text) are
//! written as `0x1b`, a u32 length, and that many bytes. A record may end
//! before its last fields, which then decode as empty.

use std::fmt;

use serde::Serialize;

use crate::cronos::constants::{COMPLEX_FIELD_MARKER, FIELD_SEPARATOR};
use crate::cronos::reader::{decode_cp1251, ByteReader};
use crate::cronos::table::{FieldDefinition, FieldType};
use crate::util::hex::format_bytes;
use crate::CroError;

/// The value of one field in a decoded row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldValue {
    pub name: String,
    pub field_type: FieldType,
    pub raw: Vec<u8>,
    /// Stored as a length-prefixed `0x1b` value.
    pub complex: bool,
}

impl FieldValue {
    /// Human-readable rendering: CP1251 text for plain values, a size note
    /// for complex ones.
    pub fn display_value(&self) -> String {
        if self.complex {
            format!("<{} bytes>", self.raw.len())
        } else {
            decode_cp1251(&self.raw)
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut st = s.serialize_struct("FieldValue", 3)?;
        st.serialize_field("name", &self.name)?;
        st.serialize_field("type", self.field_type.name())?;
        if self.complex {
            st.serialize_field("hex", &format_bytes(&self.raw))?;
        } else {
            st.serialize_field("text", &decode_cp1251(&self.raw))?;
        }
        st.end()
    }
}

/// A bank record decoded with its table's field layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Row {
    /// Record number in the bank.
    pub index: u32,
    pub values: Vec<FieldValue>,
}

impl Row {
    /// Decode `payload` (the record without its table-id byte).
    ///
    /// # Errors
    ///
    /// Fails with [`CroError::TruncatedBlob`] when a complex value announces
    /// more bytes than the record holds.
    pub fn decode(index: u32, fields: &[FieldDefinition], payload: &[u8]) -> Result<Self, CroError> {
        let mut rd = ByteReader::new(payload);
        let mut values = Vec::with_capacity(fields.len());

        for field in fields {
            let (raw, complex) = if rd.peek_u8() == Some(COMPLEX_FIELD_MARKER) {
                rd.read_u8()?;
                let len = rd.read_u32()? as usize;
                (rd.read_bytes(len)?.to_vec(), true)
            } else {
                (rd.read_to_separator(FIELD_SEPARATOR).to_vec(), false)
            };
            values.push(FieldValue {
                name: field.name.clone(),
                field_type: field.field_type,
                raw,
                complex,
            });
        }

        Ok(Row { index, values })
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values.iter().find(|v| v.name == name)
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:5}:", self.index)?;
        for (i, value) in self.values.iter().enumerate() {
            let sep = if i == 0 { " " } else { " | " };
            write!(f, "{}{}", sep, value.display_value())?;
        }
        Ok(())
    }
}
