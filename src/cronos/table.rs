//! Table and field definitions.
//!
//! Each `Base<digits>` entry of the database definition holds a table
//! definition blob: a small header carrying the table id (the byte that
//! prefixes every bank record of the table), its name and abbreviation,
//! followed by a length-prefixed definition per field.

use std::io::Write;

use serde::Serialize;

use crate::cronos::reader::ByteReader;
use crate::util::hex::format_bytes;
use crate::util::wprintln;
use crate::CroError;

/// A field type code and its display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldType(pub u16);

impl FieldType {
    /// Names of the type codes seen in real databases.
    pub fn name(&self) -> &'static str {
        match self.0 {
            0 => "sysnum",
            1 => "text",
            2 => "number",
            3 => "date",
            4 => "time",
            5 => "datetime",
            6 => "file",
            7 => "image",
            9 => "link",
            10 => "backlink",
            11 => "dictionary",
            16 => "multitext",
            _ => "unknown",
        }
    }
}

/// One field of a table layout.
#[derive(Debug, Clone, Serialize)]
pub struct FieldDefinition {
    pub field_type: FieldType,
    pub index: u32,
    pub name: String,
    pub flags: u32,
    /// Bytes after the flags, not interpreted.
    #[serde(skip)]
    pub extra: Vec<u8>,
}

impl FieldDefinition {
    /// Parse a single field definition.
    pub fn from_bytes(data: &[u8]) -> Result<Self, CroError> {
        let mut rd = ByteReader::new(data);
        let field_type = FieldType(rd.read_u16()?);
        let index = rd.read_u32()?;
        let name = rd.read_name()?;
        let flags = rd.read_u32()?;
        Ok(FieldDefinition {
            field_type,
            index,
            name,
            flags,
            extra: rd.read_rest().to_vec(),
        })
    }
}

/// A decoded table definition.
#[derive(Debug, Clone, Serialize)]
pub struct TableDefinition {
    /// Leading byte of every bank record that belongs to this table.
    pub table_id: u32,
    pub name: String,
    pub abbreviation: String,
    pub version: u8,
    pub fields: Vec<FieldDefinition>,
    /// Bytes after the last field definition.
    #[serde(skip)]
    pub trailer: Vec<u8>,
}

impl TableDefinition {
    /// Parse a table definition blob.
    ///
    /// Layout (little-endian): u16 unknown, u8 version (one padding byte
    /// follows when the version is above 1), two u8 values where a first
    /// value above 5 means an extra u32 follows, u32 unknown, u32 table id,
    /// name, abbreviation, u32 unknown, u32 field count, then a u16 length
    /// and that many bytes per field.
    ///
    /// # Errors
    ///
    /// Fails with [`CroError::TruncatedBlob`] when the blob ends early or
    /// with the error of the first field that does not parse.
    pub fn from_blob(data: &[u8]) -> Result<Self, CroError> {
        let mut rd = ByteReader::new(data);

        let _unknown1 = rd.read_u16()?;
        let version = rd.read_u8()?;
        if version > 1 {
            let _pad = rd.read_u8()?;
        }
        let layout = rd.read_u8()?;
        let _unknown3 = rd.read_u8()?;
        if layout > 5 {
            let _extra = rd.read_u32()?;
        }
        let _unknown4 = rd.read_u32()?;
        let table_id = rd.read_u32()?;
        let name = rd.read_name()?;
        let abbreviation = rd.read_name()?;
        let _unknown7 = rd.read_u32()?;
        let field_count = rd.read_u32()?;

        let mut fields = Vec::new();
        for _ in 0..field_count {
            let len = rd.read_u16()? as usize;
            fields.push(FieldDefinition::from_bytes(rd.read_bytes(len)?)?);
        }

        Ok(TableDefinition {
            table_id,
            name,
            abbreviation,
            version,
            fields,
            trailer: rd.read_rest().to_vec(),
        })
    }

    /// Whether `data` is a bank record of this table.
    pub fn owns(&self, data: &[u8]) -> bool {
        data.first().is_some_and(|&b| b as u32 == self.table_id)
    }

    /// Print the table header and its field list.
    pub fn dump(&self, writer: &mut dyn Write) -> Result<(), CroError> {
        wprintln!(
            writer,
            "table {} ({}), id {}, version {}, {} fields",
            self.name,
            self.abbreviation,
            self.table_id,
            self.version,
            self.fields.len()
        )?;
        for field in &self.fields {
            wprintln!(
                writer,
                "  {:>3}  {:<10} {:<24} flags=0x{:08x}{}",
                field.index,
                field.field_type.name(),
                field.name,
                field.flags,
                if field.extra.is_empty() {
                    String::new()
                } else {
                    format!("  {}", format_bytes(&field.extra))
                }
            )?;
        }
        if !self.trailer.is_empty() {
            wprintln!(writer, "  trailer: {}", format_bytes(&self.trailer))?;
        }
        Ok(())
    }
}
