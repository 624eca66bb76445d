//! Database directory handling.
//!
//! A Cronos database is a directory holding up to four stores, each a
//! `Cro<Name>.dat` / `Cro<Name>.tad` pair. [`Database::open`] looks the
//! files up case-insensitively and opens whatever is present; operations
//! that need a missing store fail with [`CroError::Argument`].

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::cronos::catalog::{self, TableIter};
use crate::cronos::datafile::{Datafile, DatafileInfo};
use crate::cronos::definition::Definition;
use crate::cronos::diagnostics::{Diagnostic, Diagnostics};
use crate::cronos::kod::KodTable;
use crate::cronos::sweep::{self, FileIter, RecordIter, SweepOptions, SweepReport, SweepStats};
use crate::cronos::table::TableDefinition;
use crate::util::fs::find_store_file;
use crate::CroError;

/// The four stores of a database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// Table and schema definitions.
    Stru,
    Index,
    /// Row and file payloads.
    Bank,
    /// System catalog.
    Sys,
}

impl StoreKind {
    pub const ALL: [StoreKind; 4] = [
        StoreKind::Stru,
        StoreKind::Index,
        StoreKind::Bank,
        StoreKind::Sys,
    ];

    /// File name stem after `Cro`.
    pub fn name(&self) -> &'static str {
        match self {
            StoreKind::Stru => "Stru",
            StoreKind::Index => "Index",
            StoreKind::Bank => "Bank",
            StoreKind::Sys => "Sys",
        }
    }
}

/// How stores are opened.
#[derive(Debug, Clone, Default)]
pub struct OpenOptions {
    /// Memory-map the `.dat` files (buffered reads without the `cli` feature).
    pub mmap: bool,
    /// Substitution table for KOD-encoded stores.
    pub kod: Option<KodTable>,
}

/// An open database directory.
pub struct Database {
    dir: PathBuf,
    stru: Option<Datafile>,
    index: Option<Datafile>,
    bank: Option<Datafile>,
    sys: Option<Datafile>,
}

impl Database {
    /// Open the stores found in `dir` with buffered I/O.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self, CroError> {
        Self::open_with(dir, &OpenOptions::default())
    }

    /// Open the stores found in `dir`.
    ///
    /// A store whose `.dat` or `.tad` file is missing is left out with a
    /// warning. A directory without any store is an error.
    pub fn open_with<P: AsRef<Path>>(dir: P, options: &OpenOptions) -> Result<Self, CroError> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(CroError::Argument(format!(
                "{} is not a directory",
                dir.display()
            )));
        }

        let mut db = Database {
            dir: dir.to_path_buf(),
            stru: None,
            index: None,
            bank: None,
            sys: None,
        };
        for kind in StoreKind::ALL {
            *db.slot_mut(kind) = open_store(dir, kind, options)?;
        }

        if db.stores().next().is_none() {
            return Err(CroError::Argument(format!(
                "No Cronos store (Cro*.dat + Cro*.tad) found in {}",
                dir.display()
            )));
        }
        Ok(db)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn slot_mut(&mut self, kind: StoreKind) -> &mut Option<Datafile> {
        match kind {
            StoreKind::Stru => &mut self.stru,
            StoreKind::Index => &mut self.index,
            StoreKind::Bank => &mut self.bank,
            StoreKind::Sys => &mut self.sys,
        }
    }

    pub fn store(&self, kind: StoreKind) -> Option<&Datafile> {
        match kind {
            StoreKind::Stru => self.stru.as_ref(),
            StoreKind::Index => self.index.as_ref(),
            StoreKind::Bank => self.bank.as_ref(),
            StoreKind::Sys => self.sys.as_ref(),
        }
    }

    pub fn store_mut(&mut self, kind: StoreKind) -> Option<&mut Datafile> {
        self.slot_mut(kind).as_mut()
    }

    /// The store of `kind`, or an error naming the missing file.
    pub fn require(&mut self, kind: StoreKind) -> Result<&mut Datafile, CroError> {
        let dir = self.dir.display().to_string();
        self.slot_mut(kind)
            .as_mut()
            .ok_or_else(|| CroError::Argument(format!("Cro{}.dat not found in {}", kind.name(), dir)))
    }

    /// Present stores in `Stru, Index, Bank, Sys` order.
    pub fn stores(&self) -> impl Iterator<Item = &Datafile> {
        StoreKind::ALL.into_iter().filter_map(|kind| self.store(kind))
    }

    /// Header summaries of the present stores.
    pub fn info(&self) -> Vec<DatafileInfo> {
        self.stores().map(Datafile::info).collect()
    }

    /// Warnings raised while opening the stores.
    pub fn open_diagnostics(&self) -> Vec<&Diagnostic> {
        self.stores().flat_map(|s| s.diagnostics().iter()).collect()
    }

    /// Decode the database definition (structure record #1).
    pub fn read_definition(&mut self) -> Result<(Definition, Diagnostics), CroError> {
        let stru = self.require(StoreKind::Stru)?;
        let mut diagnostics = Diagnostics::new();
        let definition = catalog::read_database_definition(stru, &mut diagnostics)?;
        Ok((definition, diagnostics))
    }

    /// Table definitions from the structure store, see
    /// [`catalog::enumerate_tables`].
    pub fn enumerate_tables(&mut self, want_files: bool) -> Result<TableIter, CroError> {
        catalog::enumerate_tables(self.require(StoreKind::Stru)?, want_files)
    }

    /// Rows of `table` in the bank store.
    pub fn enumerate_records<'a>(
        &'a mut self,
        table: &'a TableDefinition,
    ) -> Result<RecordIter<'a, Datafile>, CroError> {
        Ok(sweep::enumerate_records(self.require(StoreKind::Bank)?, table))
    }

    /// Stored files of `table` in the bank store.
    pub fn enumerate_files(&mut self, table: &TableDefinition) -> Result<FileIter<'_, Datafile>, CroError> {
        Ok(sweep::enumerate_files(self.require(StoreKind::Bank)?, table))
    }

    /// Raw sweep over the store of `kind`.
    pub fn sweep(
        &mut self,
        kind: StoreKind,
        options: &SweepOptions,
        writer: &mut dyn Write,
    ) -> Result<SweepReport, CroError> {
        sweep::sweep(self.require(kind)?, options, SweepStats::new(), writer)
    }
}

fn open_store(dir: &Path, kind: StoreKind, options: &OpenOptions) -> Result<Option<Datafile>, CroError> {
    let dat = find_store_file(dir, kind.name(), "dat")?;
    let tad = find_store_file(dir, kind.name(), "tad")?;

    let (dat, tad) = match (dat, tad) {
        (Some(dat), Some(tad)) => (dat, tad),
        (None, None) => {
            tracing::debug!("Cro{} not present in {}", kind.name(), dir.display());
            return Ok(None);
        }
        (Some(_), None) | (None, Some(_)) => {
            tracing::warn!(
                "Cro{}: .dat and .tad must both be present, skipping the store",
                kind.name()
            );
            return Ok(None);
        }
    };

    let mut store = if options.mmap {
        open_mapped(kind.name(), &dat, &tad)?
    } else {
        Datafile::open(kind.name(), &dat, &tad)?
    };
    if let Some(kod) = &options.kod {
        store.set_kod_table(kod.clone());
    }
    Ok(Some(store))
}

#[cfg(feature = "cli")]
fn open_mapped(name: &str, dat: &Path, tad: &Path) -> Result<Datafile, CroError> {
    Datafile::open_mmap(name, dat, tad)
}

#[cfg(not(feature = "cli"))]
fn open_mapped(name: &str, dat: &Path, tad: &Path) -> Result<Datafile, CroError> {
    Datafile::open(name, dat, tad)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_store(dir: &Path, stem: &str, records: &[&[u8]]) {
        let mut dat = b"CroFile\0\x00\x0001.02\x00\x00\x00\x00".to_vec();
        let mut tad = vec![0u8; 8];
        for rec in records {
            let offset = dat.len() as u32;
            dat.extend_from_slice(rec);
            tad.extend_from_slice(&offset.to_le_bytes());
            tad.extend_from_slice(&(0x1000_0000u32 | rec.len() as u32).to_le_bytes());
            tad.extend_from_slice(&0u32.to_le_bytes());
        }
        std::fs::write(dir.join(format!("{}.dat", stem)), dat).unwrap();
        std::fs::write(dir.join(format!("{}.tad", stem)), tad).unwrap();
    }

    #[test]
    fn test_open_finds_stores_case_insensitively() {
        let dir = TempDir::new().unwrap();
        write_store(dir.path(), "CROBANK", &[b"\x01a"]);
        write_store(dir.path(), "crostru", &[b"\x03"]);

        let db = Database::open(dir.path()).unwrap();
        assert!(db.store(StoreKind::Bank).is_some());
        assert!(db.store(StoreKind::Stru).is_some());
        assert!(db.store(StoreKind::Index).is_none());
        let names: Vec<String> = db.info().into_iter().map(|i| i.name).collect();
        assert_eq!(names, vec!["Stru", "Bank"]);
    }

    #[test]
    fn test_half_store_is_skipped() {
        let dir = TempDir::new().unwrap();
        write_store(dir.path(), "CroBank", &[b"\x01a"]);
        std::fs::write(dir.path().join("CroSys.dat"), b"CroFile\0").unwrap();

        let db = Database::open(dir.path()).unwrap();
        assert!(db.store(StoreKind::Sys).is_none());
    }

    #[test]
    fn test_empty_directory_fails() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            Database::open(dir.path()),
            Err(CroError::Argument(_))
        ));
    }

    #[test]
    fn test_missing_store_is_argument_error() {
        let dir = TempDir::new().unwrap();
        write_store(dir.path(), "CroBank", &[b"\x01a"]);
        let mut db = Database::open(dir.path()).unwrap();
        let err = db.enumerate_tables(false).err().unwrap();
        assert!(err.to_string().contains("CroStru.dat not found"));
    }

    #[test]
    fn test_sweep_bank() {
        let dir = TempDir::new().unwrap();
        write_store(dir.path(), "CroBank", &[b"\x01a", b"\x02bc"]);
        let mut db = Database::open(dir.path()).unwrap();
        let mut out = Vec::new();
        let report = db
            .sweep(StoreKind::Bank, &SweepOptions::default(), &mut out)
            .unwrap();
        assert_eq!(report.processed, 2);
        assert_eq!(String::from_utf8(out).unwrap(), "    1: 0161\n    2: 026263\n");
    }
}
