//! Cronos database file inspection toolkit.
//!
//! The `cronos-utils` crate (library name `cro`) provides Rust types and
//! functions for decoding the on-disk files of the Cronos database engine:
//! the structure store (`CroStru`), the index store (`CroIndex`), the record
//! bank (`CroBank`) and the system catalog (`CroSys`). Each store is a pair
//! of files, `Cro<Name>.dat` holding record payloads and `Cro<Name>.tad`
//! holding the record index.
//!
//! There is no published description of the format. Everything here follows
//! conventions inferred from real databases, so decoding is deliberately
//! permissive: format mismatches become [`Diagnostic`](cronos::diagnostics::Diagnostic)
//! warnings instead of hard errors wherever a best-effort reading exists.
//!
//! # CLI Reference
//!
//! | Command | Purpose |
//! |---------|---------|
//! | [`crodump info`](cli::app::Commands::Info) | Header summary of every store in a database directory |
//! | [`crodump strudump`](cli::app::Commands::Strudump) | Print the database definition and every table definition |
//! | [`crodump recdump`](cli::app::Commands::Recdump) | Raw record sweep with printing, statistics or marker scan |
//! | [`crodump dump`](cli::app::Commands::Dump) | Decode table rows and extract file-table payloads |
//!
//! All subcommands accept `--color <auto|always|never>`, `--output <file>`,
//! `--verbose`, `--mmap` and `--kod <file>`.
//!
//! # Library API
//!
//! ```no_run
//! use cro::cronos::database::Database;
//!
//! let mut db = Database::open("path/to/db").unwrap();
//! let tables: Vec<_> = db.enumerate_tables(false).unwrap().collect();
//! for table in tables {
//!     let table = table.unwrap();
//!     println!("{} (id {})", table.name, table.table_id);
//!     for row in db.enumerate_records(&table).unwrap() {
//!         println!("{}", row);
//!     }
//! }
//! ```
//!
//! ## Module overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`cronos::reader`] | Little-endian byte cursor |
//! | [`cronos::datafile`] | `.dat`/`.tad` record store and the [`RecordStore`](cronos::datafile::RecordStore) trait |
//! | [`cronos::definition`] | Key/value definition blob decoder |
//! | [`cronos::catalog`] | Table catalog walker over the structure store |
//! | [`cronos::table`] | Table and field definitions |
//! | [`cronos::row`] | Row decoding for bank records |
//! | [`cronos::sweep`] | Record enumeration and raw sweeps with statistics |
//! | [`cronos::printer`] | Definition printer |
//! | [`cronos::diagnostics`] | Collected non-fatal warnings |
//! | [`cronos::database`] | Database directory handling |
//! | [`cronos::kod`] | KOD substitution table for encoded stores |
//! | [`cronos::compression`] | Compressed record detection and inflation |
//! | [`cronos::constants`] | Header offsets, tags and separators |
//! | [`util::hex`] | Byte rendering styles |
//! | [`util::fs`] | Case-insensitive store file lookup |

#[cfg(feature = "cli")]
pub mod cli;
pub mod cronos;
pub mod util;

use thiserror::Error;

/// Errors returned by `cro` operations.
#[derive(Error, Debug)]
pub enum CroError {
    /// An I/O error occurred (file open, read, seek, or write failure).
    #[error("I/O error: {0}")]
    Io(String),

    /// A parse error occurred (malformed binary data or unexpected values).
    #[error("Parse error: {0}")]
    Parse(String),

    /// An invalid argument was supplied (missing store, bad option, etc.).
    #[error("Invalid argument: {0}")]
    Argument(String),

    /// A blob ended before a complete token, descriptor or value could be read.
    #[error("Truncated blob: needed {needed} bytes at offset {offset}, {available} available")]
    TruncatedBlob {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// A record number beyond the physical extent of a store.
    #[error("Record {index} out of range (store has {count} records)")]
    OutOfRange { index: u32, count: u32 },
}
