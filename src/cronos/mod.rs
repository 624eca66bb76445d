//! Cronos binary format decoding.
//!
//! This module contains types and functions for reading the on-disk
//! structures used by the Cronos database engine: the `.dat`/`.tad` record
//! stores, the self-describing definition blobs found in the structure store,
//! table and field definitions, and bank records.
//!
//! Start with [`database::Database`] to open a database directory, then use
//! [`catalog::enumerate_tables`] and [`sweep::enumerate_records`] (or the
//! equivalent `Database` methods) to walk its contents.

pub mod catalog;
pub mod compression;
pub mod constants;
pub mod database;
pub mod datafile;
pub mod definition;
pub mod diagnostics;
pub mod kod;
pub mod printer;
pub mod reader;
pub mod row;
pub mod sweep;
pub mod table;
