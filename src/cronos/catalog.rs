//! Table catalog walking.
//!
//! Record #1 of the structure store holds the database definition: tag byte
//! `0x03` followed by a definition blob. Its `Base<digits>` entries are the
//! table definitions; `Base000` is the file/BLOB-storage table, every other
//! suffix an ordinary data table.

use serde::Serialize;

use crate::cronos::constants::*;
use crate::cronos::datafile::RecordStore;
use crate::cronos::definition::{decode_definition, Definition};
use crate::cronos::diagnostics::Diagnostics;
use crate::cronos::table::TableDefinition;
use crate::CroError;

/// Which kind of table a `Base<digits>` entry describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TableKind {
    /// Ordinary data table with a field layout.
    Data,
    /// File/BLOB storage (`Base000`).
    Files,
}

/// Classify a definition key.
///
/// Returns None unless the key is `Base` followed by at least one digit and
/// nothing else.
///
/// # Examples
///
/// ```
/// use cro::cronos::catalog::{table_kind, TableKind};
///
/// assert_eq!(table_kind("Base000"), Some(TableKind::Files));
/// assert_eq!(table_kind("Base012"), Some(TableKind::Data));
/// assert_eq!(table_kind("Base"), None);
/// assert_eq!(table_kind("BaseX1"), None);
/// ```
pub fn table_kind(key: &str) -> Option<TableKind> {
    let suffix = key.strip_prefix(TABLE_KEY_PREFIX)?;
    if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if suffix == FILE_TABLE_SUFFIX {
        Some(TableKind::Files)
    } else {
        Some(TableKind::Data)
    }
}

/// Whether a definition key names a table of either kind.
pub fn is_table_key(key: &str) -> bool {
    table_kind(key).is_some()
}

/// Read and decode the database definition from structure record #1.
///
/// References inside the blob are resolved against the same store.
pub fn read_database_definition<S: RecordStore>(
    stru: &mut S,
    diagnostics: &mut Diagnostics,
) -> Result<Definition, CroError> {
    let record = stru
        .read_record(DATABASE_DEFINITION_RECORD)?
        .ok_or_else(|| {
            CroError::Parse("Structure record 1 (database definition) is deleted".to_string())
        })?;

    diagnostics.expect_tag("database definition", TAG_DATABASE_DEFINITION, &record);
    let blob = record.get(1..).unwrap_or_default();

    decode_definition(blob, |index| stru.read_record(index), diagnostics)
}

/// Lazily parsed table definitions of one kind, in definition order.
///
/// Created by [`enumerate_tables`]. The iterator is finite and cannot be
/// restarted; walk the catalog again for a fresh one.
pub struct TableIter {
    definition: Definition,
    want_files: bool,
    position: usize,
    diagnostics: Diagnostics,
}

impl TableIter {
    /// The full decoded database definition.
    pub fn definition(&self) -> &Definition {
        &self.definition
    }

    /// Warnings raised while decoding the database definition.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }
}

impl Iterator for TableIter {
    type Item = Result<TableDefinition, CroError>;

    fn next(&mut self) -> Option<Self::Item> {
        let wanted = if self.want_files {
            TableKind::Files
        } else {
            TableKind::Data
        };
        let entries = self.definition.entries();
        while self.position < entries.len() {
            let entry = &entries[self.position];
            self.position += 1;
            if table_kind(&entry.key) == Some(wanted) {
                return Some(TableDefinition::from_blob(&entry.value));
            }
        }
        None
    }
}

/// Walk the table definitions in the structure store.
///
/// With `want_files` only the file-storage table (`Base000`) is yielded,
/// otherwise only ordinary tables. Failures decoding the database
/// definition itself are returned here; failures parsing an individual
/// table definition are yielded by the iterator.
pub fn enumerate_tables<S: RecordStore>(stru: &mut S, want_files: bool) -> Result<TableIter, CroError> {
    let mut diagnostics = Diagnostics::new();
    let definition = read_database_definition(stru, &mut diagnostics)?;
    Ok(TableIter {
        definition,
        want_files,
        position: 0,
        diagnostics,
    })
}

/// A `Base<digits>` entry with its parsed definition, for listings.
pub struct TableEntry {
    pub key: String,
    pub kind: TableKind,
    pub table: Result<TableDefinition, CroError>,
}

/// Every table entry of a decoded database definition, of both kinds.
pub fn table_definitions(definition: &Definition) -> Vec<TableEntry> {
    definition
        .iter()
        .filter_map(|(key, value)| {
            table_kind(key).map(|kind| TableEntry {
                key: key.to_string(),
                kind,
                table: TableDefinition::from_blob(value),
            })
        })
        .collect()
}
